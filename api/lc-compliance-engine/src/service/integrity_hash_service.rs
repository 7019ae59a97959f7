use crate::module::lc_check::model::{
    CheckResultItem, DocumentSubmission, LcTerms, Verdict,
};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deterministic JSON rendering: object keys sorted, every number emitted as
/// a JSON string so no float formatting ambiguity can enter a hash.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format!("\"{n}\""),
        Value::String(s) => serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string()),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .iter()
                .map(|k| {
                    let key = serde_json::to_string(k).unwrap_or_else(|_| "\"\"".to_string());
                    format!("{key}:{}", canonical_json(&map[*k]))
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
    }
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Content hash of one check: terms, documents, results, and the derived
/// verdict/counts. Position-independent, byte-identical inputs always yield
/// the same hash; the check timestamp is deliberately not part of it.
pub fn compute_integrity_hash(
    terms: &LcTerms,
    documents: &[DocumentSubmission],
    results: &[CheckResultItem],
    verdict: Verdict,
    green: usize,
    amber: usize,
    red: usize,
) -> Result<String, serde_json::Error> {
    let content = CanonicalCheckContent {
        terms,
        documents,
        results,
        verdict: verdict.as_str(),
        green,
        amber,
        red,
    };
    let value = serde_json::to_value(&content)?;
    Ok(sha256_hex(&canonical_json(&value)))
}

pub fn build_check_id(integrity_hash: &str) -> String {
    let short = &integrity_hash[..24];
    format!("chk_{short}")
}

pub fn build_case_id(source_lookup_id: &str) -> String {
    let digest = sha256_hex(source_lookup_id);
    let short = &digest[..24];
    format!("case_{short}")
}

/// Opaque verification token for the public surface; derived, never the raw
/// lookup id.
pub fn build_public_ref(lookup_id: &str, locked_at: i64) -> String {
    let digest = sha256_hex(&format!("{lookup_id}|{locked_at}"));
    let short = &digest[..24];
    format!("twl_{short}")
}

#[derive(Serialize)]
struct CanonicalCheckContent<'a> {
    terms: &'a LcTerms,
    documents: &'a [DocumentSubmission],
    results: &'a [CheckResultItem],
    verdict: &'a str,
    green: usize,
    amber: usize,
    red: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_keys_and_stringifies_numbers() {
        let value = json!({"b": 2, "a": {"d": 1.5, "c": "x"}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":"x","d":"1.5"},"b":"2"}"#
        );
    }

    #[test]
    fn canonical_json_is_stable_across_key_order() {
        let one = serde_json::from_str::<Value>(r#"{"x":1,"y":"a"}"#).expect("parse");
        let two = serde_json::from_str::<Value>(r#"{"y":"a","x":1}"#).expect("parse");
        assert_eq!(canonical_json(&one), canonical_json(&two));
    }
}
