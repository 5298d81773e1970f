//! Fixed-path field lookups
//!
//! Unlike whole entities, these fields are named consistently by the
//! service; they just move around between nesting levels depending on
//! which layer wrapped the response. Each lookup tries a fixed priority
//! list of paths and the first non-empty value wins - no free-form
//! scanning here.

use serde_json::Value;

use openibuy_types::{flag_is_set, non_empty_string, TxRequest};

fn value_at<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut node = payload;
    for key in path {
        node = node.get(key)?;
    }
    Some(node)
}

fn string_at(payload: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| value_at(payload, path))
        .find_map(non_empty_string)
}

/// Order number from a `create_order` / proof response.
pub fn order_no(payload: &Value) -> Option<String> {
    string_at(
        payload,
        &[
            &["order_no"],
            &["data", "order_no"],
            &["data", "data", "order_no"],
            &["data", "data", "parent_order_no"],
        ],
    )
}

/// Shipping quote id from an `estimate_shipping` response.
pub fn shipping_quote_id(payload: &Value) -> Option<String> {
    string_at(payload, &[&["shipping_quote_id"], &["data", "shipping_quote_id"]])
}

/// Escrow state from a proof or escrow-stage response.
pub fn escrow_state(payload: &Value) -> Option<String> {
    string_at(
        payload,
        &[
            &["escrow_state"],
            &["proof", "escrow_state"],
            &["data", "escrow_state"],
            &["data", "proof", "escrow_state"],
            &["data", "data", "escrow_state"],
        ],
    )
}

/// Pending transaction request from an escrow-stage response.
pub fn tx_request(payload: &Value) -> Option<TxRequest> {
    [&["tx_request"][..], &["data", "tx_request"][..]]
        .iter()
        .filter_map(|path| value_at(payload, path))
        .find(|v| v.is_object())
        .map(TxRequest::from_value)
}

/// Token-approval transaction request from a `fund_escrow` response.
pub fn approve_tx_request(payload: &Value) -> Option<TxRequest> {
    [&["approve_tx_request"][..], &["data", "approve_tx_request"][..]]
        .iter()
        .filter_map(|path| value_at(payload, path))
        .find(|v| v.is_object())
        .map(TxRequest::from_value)
}

/// Whether `fund_escrow` demands a token approval before funding.
pub fn needs_approval(payload: &Value) -> bool {
    [&["needs_approval"][..], &["data", "needs_approval"][..]]
        .iter()
        .filter_map(|path| value_at(payload, path))
        .any(flag_is_set)
}

/// Operator guidance string escrow stages sometimes attach.
pub fn next_action(payload: &Value) -> Option<String> {
    string_at(payload, &[&["next_action"], &["data", "next_action"]])
}

/// Opaque payment quote from an `estimate_shipping` response.
pub fn payment_quote(payload: &Value) -> Option<Value> {
    [&["payment_quote"][..], &["data", "payment_quote"][..]]
        .iter()
        .filter_map(|path| value_at(payload, path))
        .find(|v| !v.is_null())
        .cloned()
}

/// Shop id from a product-detail payload, case-normalized for the
/// camel/snake variants the detail endpoint is known to emit.
pub fn shop_id_from_detail(payload: &Value) -> Option<String> {
    const FIELDS: [&str; 4] = ["shop_id", "shopId", "seller_id", "sellerId"];
    const NESTS: [&[&str]; 3] = [&[], &["data"], &["data", "data"]];

    for nest in NESTS {
        for field in FIELDS {
            let mut path: Vec<&str> = nest.to_vec();
            path.push(field);
            if let Some(found) = value_at(payload, &path).and_then(non_empty_string) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_no_prefers_shallower_paths() {
        let payload = json!({
            "order_no": "TOP",
            "data": {"order_no": "NESTED"},
        });
        assert_eq!(order_no(&payload).as_deref(), Some("TOP"));
    }

    #[test]
    fn test_order_no_falls_through_to_parent_order_no() {
        let payload = json!({
            "data": {"data": {"parent_order_no": "PARENT-9"}},
        });
        assert_eq!(order_no(&payload).as_deref(), Some("PARENT-9"));
    }

    #[test]
    fn test_order_no_skips_empty_strings() {
        let payload = json!({
            "order_no": "  ",
            "data": {"order_no": "REAL"},
        });
        assert_eq!(order_no(&payload).as_deref(), Some("REAL"));
    }

    #[test]
    fn test_shipping_quote_id_nested() {
        let payload = json!({"data": {"shipping_quote_id": "sq-1"}});
        assert_eq!(shipping_quote_id(&payload).as_deref(), Some("sq-1"));
        assert_eq!(shipping_quote_id(&json!({})), None);
    }

    #[test]
    fn test_escrow_state_proof_nesting() {
        let payload = json!({"data": {"proof": {"escrow_state": "FUNDED"}}});
        assert_eq!(escrow_state(&payload).as_deref(), Some("FUNDED"));
    }

    #[test]
    fn test_tx_request_only_matches_objects() {
        let payload = json!({"tx_request": "0xdead"});
        assert!(tx_request(&payload).is_none());

        let payload = json!({"data": {"tx_request": {"to": "0xabc", "data": "0x01"}}});
        let tx = tx_request(&payload).unwrap();
        assert_eq!(tx.to.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_needs_approval_and_approve_request() {
        let payload = json!({
            "data": {
                "needs_approval": true,
                "approve_tx_request": {"to": "0xtoken", "data": "0xa22cb465ff"},
            },
        });
        assert!(needs_approval(&payload));
        assert_eq!(
            approve_tx_request(&payload).unwrap().to.as_deref(),
            Some("0xtoken")
        );
        assert!(!needs_approval(&json!({})));
    }

    #[test]
    fn test_shop_id_from_detail_tries_all_variants() {
        assert_eq!(
            shop_id_from_detail(&json!({"shopId": "s1"})).as_deref(),
            Some("s1")
        );
        assert_eq!(
            shop_id_from_detail(&json!({"data": {"seller_id": "s2"}})).as_deref(),
            Some("s2")
        );
        assert_eq!(
            shop_id_from_detail(&json!({"data": {"data": {"sellerId": "s3"}}})).as_deref(),
            Some("s3")
        );
        assert_eq!(shop_id_from_detail(&json!({"data": {}})), None);
    }
}
