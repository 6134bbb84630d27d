//! Shape checks for digest documents received from outside.

use serde_json::Value;
use thiserror::Error;

use crate::models::{CompanyDigest, DigestRoot};

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("expected a JSON object at {0}")]
    NotAnObject(String),

    #[error("expected an array at {0}")]
    NotAnArray(String),

    #[error("expected a string or null at {0}")]
    NotAString(String),

    #[error("invalid entry at {path}: {source}")]
    InvalidEntry {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Validates a digest document and deserializes it.
pub fn parse_digest_root(value: Value) -> Result<DigestRoot, SchemaError> {
    let Value::Object(mut map) = value else {
        return Err(SchemaError::NotAnObject("root".to_string()));
    };

    let summary = match map.remove("summary") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => return Err(SchemaError::NotAString("summary".to_string())),
    };

    let Some(Value::Array(items)) = map.remove("company_funding_digests") else {
        return Err(SchemaError::NotAnArray("company_funding_digests".to_string()));
    };

    let companies = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<CompanyDigest>(item).map_err(|e| SchemaError::InvalidEntry {
                path: format!("company_funding_digests[{}]", i),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DigestRoot::new(summary, companies))
}

/// Parses a write request: either a bare document or `{data, run_id?}`.
/// A bare document wins when both shapes are present.
///
/// A `run_id` is kept only when it is a non-empty string.
pub fn parse_write_body(value: Value) -> Result<(DigestRoot, Option<String>), SchemaError> {
    let Value::Object(mut map) = value else {
        return Err(SchemaError::NotAnObject("root".to_string()));
    };

    if map.contains_key("company_funding_digests") {
        return Ok((parse_digest_root(Value::Object(map))?, None));
    }

    match map.remove("data") {
        Some(data) => {
            let run_id = match map.remove("run_id") {
                Some(Value::String(id)) if !id.is_empty() => Some(id),
                _ => None,
            };
            let root = parse_digest_root(data).map_err(|e| match e {
                SchemaError::NotAnObject(_) => SchemaError::NotAnObject("data".to_string()),
                other => other,
            })?;
            Ok((root, run_id))
        }
        None => Ok((parse_digest_root(Value::Object(map))?, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_root() {
        let root = parse_digest_root(json!({ "company_funding_digests": [] })).unwrap();
        assert!(root.summary.is_none());
        assert!(root.company_funding_digests.is_empty());
    }

    #[test]
    fn test_parse_full_root() {
        let root = parse_digest_root(json!({
            "summary": "March",
            "company_funding_digests": [{
                "company": { "name": "Acme", "location": { "country": "DK" } },
                "funding_events": [{
                    "round": "seed",
                    "amount": { "as_reported": "€2M", "value": 2000000, "currency": "EUR" },
                    "investors": [{ "name": "Index", "website": null }]
                }],
                "related_links": ["https://acme.io"]
            }]
        }))
        .unwrap();

        assert_eq!(root.summary.as_deref(), Some("March"));
        let company = &root.company_funding_digests[0];
        assert_eq!(company.company.country(), Some("DK"));
        assert_eq!(company.funding_events[0].currency(), Some("EUR"));
        assert_eq!(company.related_links, vec!["https://acme.io".to_string()]);
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(matches!(
            parse_digest_root(json!([1, 2])),
            Err(SchemaError::NotAnObject(_))
        ));
        assert!(matches!(
            parse_digest_root(json!("digest")),
            Err(SchemaError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_rejects_missing_or_scalar_companies() {
        assert!(matches!(
            parse_digest_root(json!({ "summary": "x" })),
            Err(SchemaError::NotAnArray(_))
        ));
        assert!(matches!(
            parse_digest_root(json!({ "company_funding_digests": {} })),
            Err(SchemaError::NotAnArray(_))
        ));
    }

    #[test]
    fn test_rejects_non_string_summary() {
        let err = parse_digest_root(json!({ "summary": 3, "company_funding_digests": [] }))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected a string or null at summary");
    }

    #[test]
    fn test_error_names_offending_entry() {
        let err = parse_digest_root(json!({
            "company_funding_digests": [
                { "company": { "name": "Fine" } },
                { "company": { "name": "Fine too" } },
                { "company": 7 }
            ]
        }))
        .unwrap_err();

        match err {
            SchemaError::InvalidEntry { path, .. } => assert_eq!(path, "company_funding_digests[2]"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_write_body_with_envelope() {
        let (root, run_id) = parse_write_body(json!({
            "data": { "company_funding_digests": [] },
            "run_id": "run-42"
        }))
        .unwrap();

        assert!(root.company_funding_digests.is_empty());
        assert_eq!(run_id.as_deref(), Some("run-42"));
    }

    #[test]
    fn test_write_body_ignores_blank_run_id() {
        let (_, run_id) = parse_write_body(json!({
            "data": { "company_funding_digests": [] },
            "run_id": ""
        }))
        .unwrap();
        assert!(run_id.is_none());

        let (_, run_id) = parse_write_body(json!({
            "data": { "company_funding_digests": [] },
            "run_id": 12
        }))
        .unwrap();
        assert!(run_id.is_none());
    }

    #[test]
    fn test_write_body_bare_root() {
        let (root, run_id) = parse_write_body(json!({
            "summary": "bare",
            "company_funding_digests": []
        }))
        .unwrap();

        assert_eq!(root.summary.as_deref(), Some("bare"));
        assert!(run_id.is_none());
    }

    #[test]
    fn test_write_body_rejects_bad_data() {
        assert!(matches!(
            parse_write_body(json!({ "data": "nope" })),
            Err(SchemaError::NotAnObject(path)) if path == "data"
        ));
        assert!(parse_write_body(json!(null)).is_err());
    }
}
