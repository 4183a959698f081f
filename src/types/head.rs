// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Snapshot of the ledger head (the dynamic global properties object)

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::Payload;

/// Field holding the current head block number
const HEAD_BLOCK_NUMBER_FIELD: &str = "head_block_number";
/// Field holding the head block timestamp
const TIME_FIELD: &str = "time";
/// Timestamp format used by Graphene ledgers (UTC, no zone suffix)
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The payload did not describe a ledger head
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid head snapshot: {0}")]
pub struct InvalidHeadSnapshot(String);

/// Latest known upstream state
///
/// Wraps the ledger's dynamic global properties document. The full payload is
/// kept verbatim; the head block number and time are lifted out because the
/// ingestion path and the range reader need them.
///
/// # Examples
///
/// ```
/// use blockvault::HeadSnapshot;
///
/// let head = HeadSnapshot::from_head_number(1200);
/// assert_eq!(head.head_block_number(), 1200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Payload", into = "Payload")]
pub struct HeadSnapshot {
    head_block_number: u64,
    time: Option<NaiveDateTime>,
    payload: Payload,
}

impl HeadSnapshot {
    /// Minimal snapshot carrying only the head block number
    pub fn from_head_number(head_block_number: u64) -> Self {
        let mut payload = Payload::new();
        payload.insert("id".to_string(), Value::from("2.1.0"));
        payload.insert(
            HEAD_BLOCK_NUMBER_FIELD.to_string(),
            Value::from(head_block_number),
        );
        Self {
            head_block_number,
            time: None,
            payload,
        }
    }

    /// Highest block number that exists upstream
    pub fn head_block_number(&self) -> u64 {
        self.head_block_number
    }

    /// Timestamp of the head block, when the ledger reported a parseable one
    pub fn time(&self) -> Option<NaiveDateTime> {
        self.time
    }

    /// How far the head timestamp trails `now`
    pub fn age(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        self.time.map(|time| now - time)
    }

    /// The full dynamic global properties document
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl TryFrom<Payload> for HeadSnapshot {
    type Error = InvalidHeadSnapshot;

    fn try_from(payload: Payload) -> Result<Self, Self::Error> {
        let head_block_number = payload
            .get(HEAD_BLOCK_NUMBER_FIELD)
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                InvalidHeadSnapshot(format!(
                    "missing or non-integer `{HEAD_BLOCK_NUMBER_FIELD}`"
                ))
            })?;

        // The timestamp is telemetry; an unparseable one is not worth failing for.
        let time = payload
            .get(TIME_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| NaiveDateTime::parse_from_str(raw, TIME_FORMAT).ok());

        Ok(Self {
            head_block_number,
            time,
            payload,
        })
    }
}

impl From<HeadSnapshot> for Payload {
    fn from(snapshot: HeadSnapshot) -> Self {
        snapshot.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn parses_dynamic_global_properties() {
        let head = HeadSnapshot::try_from(payload(json!({
            "id": "2.1.0",
            "head_block_number": 3_214_455,
            "head_block_id": "00310c77d5c0a7b3",
            "time": "2024-05-01T12:00:03",
            "current_witness": "1.6.5",
        })))
        .unwrap();

        assert_eq!(head.head_block_number(), 3_214_455);
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 3)
            .unwrap();
        assert_eq!(head.time(), Some(expected));
        assert_eq!(head.payload()["current_witness"], "1.6.5");
        assert_eq!(
            head.age(expected + TimeDelta::seconds(9)),
            Some(TimeDelta::seconds(9))
        );
    }

    #[test]
    fn rejects_missing_head_number() {
        let err = HeadSnapshot::try_from(payload(json!({ "id": "2.1.0" }))).unwrap_err();
        assert!(err.to_string().contains("head_block_number"));
    }

    #[test]
    fn tolerates_unparseable_time() {
        let head = HeadSnapshot::try_from(payload(json!({
            "head_block_number": 5,
            "time": "yesterday",
        })))
        .unwrap();
        assert_eq!(head.time(), None);
    }

    #[test]
    fn serializes_as_the_raw_document() {
        let head = HeadSnapshot::from_head_number(77);
        let json = serde_json::to_value(&head).unwrap();
        assert_eq!(json, json!({ "id": "2.1.0", "head_block_number": 77 }));

        let back: HeadSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, head);
    }
}
