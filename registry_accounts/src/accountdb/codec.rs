//! JSON encoding of the auxiliary account columns
//!
//! Stored `roles` and `ext_document` values may be malformed. Decoding them
//! never fails: a bad value reads back as no roles or no document.

use serde_json::Value;

/// Serialize roles for storage, `"[]"` if that fails.
pub(crate) fn encode_roles(roles: &[String]) -> String {
    serde_json::to_string(roles).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a stored roles column; missing, empty or malformed values yield no roles.
pub(crate) fn decode_roles(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Ignoring malformed roles column");
            Vec::new()
        }),
        _ => Vec::new(),
    }
}

/// Decode a stored identity document; JSON `null` counts as absent.
pub(crate) fn decode_document(raw: Option<&str>) -> Option<Value> {
    let raw = raw.filter(|raw| !raw.is_empty())?;

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed identity document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_roles() {
        assert_eq!(encode_roles(&[]), "[]");
        assert_eq!(
            encode_roles(&["admin".to_string(), "publisher".to_string()]),
            r#"["admin","publisher"]"#
        );
    }

    #[test]
    fn test_decode_roles_valid() {
        assert_eq!(
            decode_roles(Some(r#"["admin"]"#)),
            vec!["admin".to_string()]
        );
    }

    #[test]
    fn test_decode_roles_degrades_to_empty() {
        assert!(decode_roles(None).is_empty());
        assert!(decode_roles(Some("")).is_empty());
        assert!(decode_roles(Some("not-json")).is_empty());
        assert!(decode_roles(Some(r#"{"admin":true}"#)).is_empty());
        assert!(decode_roles(Some("[1, 2]")).is_empty());
    }

    #[test]
    fn test_decode_document_valid() {
        assert_eq!(
            decode_document(Some(r#"{"name":"alice","_rev":"1-a"}"#)),
            Some(json!({"name": "alice", "_rev": "1-a"}))
        );
    }

    #[test]
    fn test_decode_document_degrades_to_none() {
        assert_eq!(decode_document(None), None);
        assert_eq!(decode_document(Some("")), None);
        assert_eq!(decode_document(Some("null")), None);
        assert_eq!(decode_document(Some("{broken")), None);
    }
}
