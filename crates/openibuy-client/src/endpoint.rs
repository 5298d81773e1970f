//! Endpoint and base-URL derivation
//!
//! Operators configure one base URL which may or may not already include
//! the RPC mount point (`/api/mcp` or `/mcp`). The REST surface (detail
//! lookups, auth endpoints) lives at the prefix above that mount.

/// Strip trailing slashes.
pub fn trim_slash(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// REST base URL for a configured base: the prefix above the RPC mount,
/// or the base itself when it carries no mount suffix.
pub fn derive_api_base_url(raw_base: &str) -> String {
    let base = trim_slash(raw_base);
    if let Some(prefix) = base.strip_suffix("/api/mcp") {
        return trim_slash(prefix);
    }
    if let Some(prefix) = base.strip_suffix("/mcp") {
        return trim_slash(prefix);
    }
    base
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve the RPC endpoint from the configured base and an optional
/// explicit endpoint (absolute URL or a path relative to the REST base).
pub fn resolve_rpc_endpoint(raw_base: &str, explicit: Option<&str>) -> String {
    let base = trim_slash(raw_base);
    let mounted = base.ends_with("/api/mcp") || base.ends_with("/mcp");

    if let Some(endpoint) = explicit.map(str::trim).filter(|e| !e.is_empty()) {
        if is_absolute(endpoint) {
            return trim_slash(endpoint);
        }
        let root = if mounted {
            derive_api_base_url(&base)
        } else {
            base
        };
        return if endpoint.starts_with('/') {
            format!("{root}{endpoint}")
        } else {
            format!("{root}/{endpoint}")
        };
    }

    if mounted {
        base
    } else {
        format!("{base}/api/mcp")
    }
}
