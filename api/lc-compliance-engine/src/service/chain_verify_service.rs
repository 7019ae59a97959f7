use crate::module::lc_check::model::AuditEventRecord;
use crate::service::chain_hash_service::compute_event_hash;

#[derive(Debug, Clone)]
pub struct ChainVerification {
    pub valid: bool,
    pub broken_at: Option<usize>,
    pub reason: Option<String>,
}

impl ChainVerification {
    fn intact() -> Self {
        Self {
            valid: true,
            broken_at: None,
            reason: None,
        }
    }

    fn broken(index: usize, reason: String) -> Self {
        Self {
            valid: false,
            broken_at: Some(index),
            reason: Some(reason),
        }
    }
}

/// Recompute every link of a lookup's chain against the stored content and
/// the prior event's *stored* hash. Stops at the first break so the caller
/// learns exactly where tampering (or corruption) starts. Never mutates
/// anything; safe on every read path.
pub fn verify_chain(events: &[AuditEventRecord]) -> ChainVerification {
    let mut prior_hash: Option<&str> = None;

    for (index, event) in events.iter().enumerate() {
        if event.previous_hash.as_deref() != prior_hash {
            return ChainVerification::broken(
                index,
                match prior_hash {
                    Some(expected) => format!(
                        "previousHash does not link to the prior event (expected {expected})"
                    ),
                    None => "first event must carry a null previousHash".to_string(),
                },
            );
        }

        let recomputed = compute_event_hash(
            &event.event_type,
            &event.event_data,
            event.created_at,
            event.previous_hash.as_deref(),
        );
        if recomputed != event.event_hash {
            return ChainVerification::broken(
                index,
                format!("stored eventHash does not match recomputed content hash for {}", event.event_id),
            );
        }

        prior_hash = Some(event.event_hash.as_str());
    }

    ChainVerification::intact()
}
