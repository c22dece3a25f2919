//! Ledger entry types and push-message decoding.
//!
//! Entries arrive in the explorer backend's JSON shape (`type: "block" | "skip"`, flat
//! optional timestamps). Push frames are tagged by `type`; only `update_slot` and
//! `radio_stats` carry data the engine consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Whether a slot produced a block or was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "block")]
    Produced,
    #[serde(rename = "skip")]
    Skipped,
}

/// Lifecycle of an entry. Declaration order is the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Proposed,
    Notarized,
    Finalized,
}

/// One ledger slot outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub slot: u64,
    #[serde(default)]
    pub hash: String,
    /// Producing validator; only meaningful for [EntryKind::Produced].
    #[serde(rename = "producer", default, skip_serializing_if = "Option::is_none")]
    pub producer_id: Option<u32>,
    /// Creation time reported by the backend (ms).
    #[serde(default)]
    pub timestamp: u64,
    #[serde(rename = "proposed_timestamp", default, skip_serializing_if = "Option::is_none")]
    pub proposed_at: Option<u64>,
    #[serde(rename = "finalized_timestamp", default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_slot: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<String>,
    pub status: EntryStatus,
}

impl Entry {
    pub fn is_produced(&self) -> bool {
        self.kind == EntryKind::Produced
    }

    pub fn is_finalized(&self) -> bool {
        self.status == EntryStatus::Finalized
    }

    /// Produced and finalized: the only entries that count toward the finality aggregate.
    pub fn is_finalized_block(&self) -> bool {
        self.is_produced() && self.is_finalized()
    }

    /// Fill fields that are absent here from `older`. Used when a same-kind update
    /// advances an entry so earlier-known details are not dropped.
    pub(crate) fn absorb(&mut self, older: &Entry) {
        if self.hash.is_empty() {
            self.hash.clone_from(&older.hash);
        }
        if self.producer_id.is_none() {
            self.producer_id = older.producer_id;
        }
        if self.timestamp == 0 {
            self.timestamp = older.timestamp;
        }
        if self.proposed_at.is_none() {
            self.proposed_at = older.proposed_at;
        }
        if self.finalized_at.is_none() {
            self.finalized_at = older.finalized_at;
        }
        if self.parent_slot.is_none() {
            self.parent_slot = older.parent_slot;
        }
        if self.parent_hash.is_none() {
            self.parent_hash.clone_from(&older.parent_hash);
        }
    }

    /// Milliseconds an unfinalized entry has been waiting since proposal.
    pub fn pending_for(&self, now_ms: u64) -> Option<u64> {
        if self.is_finalized() {
            return None;
        }
        self.proposed_at.map(|p| now_ms.saturating_sub(p))
    }

    /// `abcdef...wxyz` form for list rows.
    pub fn short_hash(&self) -> String {
        let chars: Vec<char> = self.hash.chars().collect();
        if chars.len() <= 10 {
            return self.hash.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// A validator's externally observed state. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub node_id: u32,
    pub finalized_slot: u64,
}

/// Radio network counters over the trailing two-second window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub packets_sent_2s: u64,
    pub packets_dropped_2s: u64,
    pub packets_transmitted_2s: u64,
    pub packets_queued: u64,
    pub bytes_transmitted_2s: u64,
    pub effective_throughput_bps_2s: f64,
    pub packet_loss_rate_2s: f64,
}

/// Decoded push frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    UpdateSlot(Entry),
    NetworkStats(NetworkStats),
    /// Tagged frame of a type the engine does not consume.
    Other(String),
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed {kind} message: {reason}")]
    Shape { kind: String, reason: String },
}

/// Decode one push text frame.
pub fn decode_push_message(text: &str) -> Result<PushMessage, MessageError> {
    let v: Value = serde_json::from_str(text)?;
    let kind = v
        .get("type")
        .and_then(|t| t.as_str())
        .map(str::to_owned)
        .ok_or_else(|| MessageError::Shape {
            kind: "untagged".into(),
            reason: "missing type".into(),
        })?;
    match kind.as_str() {
        "update_slot" => {
            let payload = v.get("UpdateSlot").cloned().ok_or_else(|| MessageError::Shape {
                kind: kind.clone(),
                reason: "missing UpdateSlot".into(),
            })?;
            let entry: Entry = serde_json::from_value(payload).map_err(|e| MessageError::Shape {
                kind: kind.clone(),
                reason: e.to_string(),
            })?;
            Ok(PushMessage::UpdateSlot(entry))
        }
        "radio_stats" => {
            let stats: NetworkStats =
                serde_json::from_value(v).map_err(|e| MessageError::Shape {
                    kind: kind.clone(),
                    reason: e.to_string(),
                })?;
            Ok(PushMessage::NetworkStats(stats))
        }
        other => Ok(PushMessage::Other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_precedence() {
        assert!(EntryStatus::Pending < EntryStatus::Proposed);
        assert!(EntryStatus::Proposed < EntryStatus::Notarized);
        assert!(EntryStatus::Notarized < EntryStatus::Finalized);
    }

    #[test]
    fn decodes_backend_entry_shape() {
        let e: Entry = serde_json::from_value(json!({
            "type": "block",
            "slot": 42,
            "hash": "0xabc",
            "producer": 3,
            "timestamp": 1000,
            "proposed_timestamp": 1000,
            "parent_slot": 41,
            "parent_hash": "0xabb",
            "status": "notarized"
        }))
        .unwrap();
        assert_eq!(e.kind, EntryKind::Produced);
        assert_eq!(e.producer_id, Some(3));
        assert_eq!(e.finalized_at, None);
        assert_eq!(e.status, EntryStatus::Notarized);

        let skip: Entry =
            serde_json::from_value(json!({"type": "skip", "slot": 43, "status": "finalized"}))
                .unwrap();
        assert_eq!(skip.kind, EntryKind::Skipped);
        assert!(skip.hash.is_empty());
        assert!(!skip.is_finalized_block());
    }

    #[test]
    fn decode_update_slot_frame() {
        let text = r#"{"type":"update_slot","UpdateSlot":{"type":"block","slot":7,"hash":"h7","producer":1,"timestamp":5,"status":"finalized","finalized_timestamp":9}}"#;
        match decode_push_message(text).unwrap() {
            PushMessage::UpdateSlot(e) => {
                assert_eq!(e.slot, 7);
                assert_eq!(e.finalized_at, Some(9));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn decode_radio_stats_frame() {
        let text = r#"{"type":"radio_stats","packets_sent_2s":10,"packets_dropped_2s":1,"packets_transmitted_2s":9,"packets_queued":4,"bytes_transmitted_2s":900,"effective_throughput_bps_2s":3600.5,"packet_loss_rate_2s":10.0}"#;
        match decode_push_message(text).unwrap() {
            PushMessage::NetworkStats(s) => {
                assert_eq!(s.packets_queued, 4);
                assert_eq!(s.packet_loss_rate_2s, 10.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(decode_push_message("not json"), Err(MessageError::Json(_))));
        assert!(matches!(
            decode_push_message(r#"{"UpdateSlot":{}}"#),
            Err(MessageError::Shape { .. })
        ));
        assert!(matches!(
            decode_push_message(r#"{"type":"update_slot","UpdateSlot":{"slot":"x"}}"#),
            Err(MessageError::Shape { .. })
        ));
        assert_eq!(
            decode_push_message(r#"{"type":"heartbeat"}"#).unwrap(),
            PushMessage::Other("heartbeat".into())
        );
    }

    #[test]
    fn short_hash_and_pending() {
        let mut e: Entry = serde_json::from_value(json!({
            "type": "block", "slot": 1, "hash": "0123456789abcdef",
            "proposed_timestamp": 1000, "status": "proposed"
        }))
        .unwrap();
        assert_eq!(e.short_hash(), "012345...cdef");
        assert_eq!(e.pending_for(4000), Some(3000));
        e.status = EntryStatus::Finalized;
        assert_eq!(e.pending_for(4000), None);
        e.hash = "short".into();
        assert_eq!(e.short_hash(), "short");
    }
}
