//! Bounded-depth payload scanning
//!
//! Collects every array in a payload in depth-first order: object keys in
//! definition order (serde_json is built with `preserve_order`), a parent
//! array pushed before its own elements are descended into. The depth
//! bound keeps adversarial or cyclic-looking payloads from recursing away.

use serde_json::Value;

use openibuy_types::{Product, ShippingAddress, Wallet};

/// Maximum nesting depth the scanner descends to.
pub const MAX_SCAN_DEPTH: usize = 6;

/// The entity kinds the extractor can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Address,
    Wallet,
}

/// Collect every array found anywhere in the payload, in traversal order.
pub fn collect_arrays(payload: &Value) -> Vec<&Vec<Value>> {
    let mut out = Vec::new();
    walk(payload, &mut out, 0);
    out
}

fn walk<'a>(node: &'a Value, out: &mut Vec<&'a Vec<Value>>, depth: usize) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    match node {
        Value::Array(items) => {
            out.push(items);
            for item in items {
                walk(item, out, depth + 1);
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                walk(value, out, depth + 1);
            }
        }
        _ => {}
    }
}

/// Locate candidate entities of the requested kind.
///
/// The first array (in traversal order) containing at least one
/// structurally matching element is "the" source list; its matching
/// elements are returned in original order and later arrays are never
/// consulted.
pub fn find_entities(payload: &Value, kind: EntityKind) -> Vec<Value> {
    let matches = |item: &Value| match kind {
        EntityKind::Product => Product::from_value(item).is_some(),
        EntityKind::Address => ShippingAddress::from_value(item).is_some(),
        EntityKind::Wallet => Wallet::from_value(item).is_some(),
    };
    for arr in collect_arrays(payload) {
        let found: Vec<Value> = arr.iter().filter(|v| matches(v)).cloned().collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// First array whose elements parse into `T`; parsed matches in order.
pub(crate) fn first_matching<T>(payload: &Value, parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    for arr in collect_arrays(payload) {
        let found: Vec<T> = arr.iter().filter_map(&parse).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_arrays_depth_first_parent_before_children() {
        let payload = json!({
            "a": [[1, 2], [3]],
            "b": [4],
        });
        let arrays = collect_arrays(&payload);
        assert_eq!(arrays.len(), 4);
        // parent array first, then its element arrays, then the sibling key
        assert_eq!(arrays[0].len(), 2);
        assert_eq!(arrays[1], &vec![json!(1), json!(2)]);
        assert_eq!(arrays[2], &vec![json!(3)]);
        assert_eq!(arrays[3], &vec![json!(4)]);
    }

    #[test]
    fn test_collect_arrays_respects_depth_bound() {
        // build a value nested two levels past the bound
        let mut deep = json!(["leaf"]);
        for _ in 0..(MAX_SCAN_DEPTH + 2) {
            deep = json!({ "next": deep });
        }
        assert!(collect_arrays(&deep).is_empty());
    }

    #[test]
    fn test_find_entities_first_matching_array_wins() {
        let payload = json!({
            "filters": ["red", "blue"],
            "data": {
                "items": [
                    {"item_id": "A", "price": "10.00"},
                    {"item_id": "B", "price": "5.00"},
                    {"note": "not a product"},
                ],
                "related": [
                    {"item_id": "C", "price": "1.00"},
                ],
            },
        });
        let found = find_entities(&payload, EntityKind::Product);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["item_id"], "A");
        assert_eq!(found[1]["item_id"], "B");
    }

    #[test]
    fn test_find_entities_empty_when_nothing_matches() {
        let payload = json!({"data": {"total": 0, "items": []}});
        assert!(find_entities(&payload, EntityKind::Address).is_empty());
    }
}
