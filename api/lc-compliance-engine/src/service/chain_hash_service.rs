use crate::module::lc_check::model::AuditEventPayload;
use crate::service::integrity_hash_service::{canonical_json, sha256_hex};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("event payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("event payload missing {0}")]
    MalformedPayload(&'static str),
}

/// Split a typed payload into the persisted `(eventType, eventData)` pair.
pub fn payload_parts(payload: &AuditEventPayload) -> Result<(String, Value), ChainError> {
    let rendered = serde_json::to_value(payload)?;
    let event_type = rendered
        .get("eventType")
        .and_then(Value::as_str)
        .ok_or(ChainError::MalformedPayload("eventType"))?
        .to_string();
    let event_data = rendered.get("eventData").cloned().unwrap_or(json!({}));
    Ok((event_type, event_data))
}

/// Hash of one chain entry: canonical content concatenated with the previous
/// event's hash. `createdAt` rides through canonical_json, which renders
/// every number as a string, so there is no float or integer-width ambiguity.
pub fn compute_event_hash(
    event_type: &str,
    event_data: &Value,
    created_at: i64,
    previous_hash: Option<&str>,
) -> String {
    let content = json!({
        "eventType": event_type,
        "eventData": event_data,
        "createdAt": created_at,
        "previousHash": previous_hash,
    });
    sha256_hex(&canonical_json(&content))
}

pub fn build_event_id(event_hash: &str) -> String {
    let short = &event_hash[..24];
    format!("evt_{short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::lc_check::model::TransitEvent;

    #[test]
    fn payload_parts_expose_persisted_shape() {
        let payload = AuditEventPayload::Arrival(TransitEvent {
            port: "Rotterdam".to_string(),
            occurred_at: 1_760_000_000,
        });
        let (event_type, event_data) = payload_parts(&payload).expect("parts");
        assert_eq!(event_type, "arrival");
        assert_eq!(event_data["port"], "Rotterdam");
    }

    #[test]
    fn event_hash_depends_on_previous_hash() {
        let data = serde_json::json!({"port": "Mombasa"});
        let genesis = compute_event_hash("arrival", &data, 100, None);
        let linked = compute_event_hash("arrival", &data, 100, Some(genesis.as_str()));
        assert_ne!(genesis, linked);
        assert_eq!(genesis, compute_event_hash("arrival", &data, 100, None));
    }
}
