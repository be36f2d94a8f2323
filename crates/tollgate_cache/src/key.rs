//! Cache key construction.

use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Join a logical resource name with the request's identifying parameters.
///
/// # Example
///
/// ```
/// use tollgate_cache::cache_key;
///
/// assert_eq!(cache_key("feed", &["user-7", "2025-06-01"]), "feed:user-7:2025-06-01");
/// ```
pub fn cache_key(resource: &str, parts: &[&str]) -> String {
    let capacity = resource.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut key = String::with_capacity(capacity);
    key.push_str(resource);
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}

/// Stable key for requests whose parameters are too large or unstructured to
/// embed, such as a generation prompt. The digest is independent of
/// parameter insertion order and identical across processes.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use std::collections::HashMap;
/// use tollgate_cache::fingerprint;
///
/// let mut params = HashMap::new();
/// params.insert("prompt".to_string(), json!("a lighthouse at dusk"));
/// let key = fingerprint("image", &params);
/// assert!(key.starts_with("image:"));
/// assert_eq!(key.len(), "image:".len() + 64);
/// ```
pub fn fingerprint(resource: &str, params: &HashMap<String, JsonValue>) -> String {
    let mut hasher = Sha256::new();

    let mut sorted_keys: Vec<_> = params.keys().collect();
    sorted_keys.sort();

    for key in sorted_keys {
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(params[key].to_string().as_bytes());
        hasher.update([0u8]);
    }

    format!("{}:{:x}", resource, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_without_parts_is_resource() {
        assert_eq!(cache_key("stats", &[]), "stats");
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let mut a = HashMap::new();
        a.insert("app".to_string(), json!("com.example"));
        a.insert("country".to_string(), json!("us"));

        let mut b = HashMap::new();
        b.insert("country".to_string(), json!("us"));
        b.insert("app".to_string(), json!("com.example"));

        assert_eq!(fingerprint("lookup", &a), fingerprint("lookup", &b));
    }

    #[test]
    fn fingerprint_separates_values() {
        let mut a = HashMap::new();
        a.insert("q".to_string(), json!("ab"));
        let mut b = HashMap::new();
        b.insert("q".to_string(), json!("a"));
        b.insert("b".to_string(), json!(""));
        assert_ne!(fingerprint("lookup", &a), fingerprint("lookup", &b));
    }
}
