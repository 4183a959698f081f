// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Header projection of a block

use serde::Serialize;

use super::record::Payload;

/// Fields removed from a block to obtain its header
///
/// These are the large or variable-length parts of a block; everything else
/// (previous id, timestamp, witness, merkle root, extensions, ...) is header.
pub const HEADER_EXCLUDED_FIELDS: &[&str] = &["transactions", "witness_signature"];

/// A block without its body and signature
///
/// # Examples
///
/// ```
/// use blockvault::{RecordHeader, Payload};
/// use serde_json::json;
///
/// let block: Payload = serde_json::from_value(json!({
///     "previous": "0000000a",
///     "timestamp": "2024-05-01T12:00:03",
///     "witness": "1.6.5",
///     "transactions": [],
///     "witness_signature": "1f00",
/// }))
/// .unwrap();
///
/// let header = RecordHeader::from_payload(block);
/// assert!(header.get("transactions").is_none());
/// assert_eq!(header.get("witness").unwrap(), "1.6.5");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordHeader(Payload);

impl RecordHeader {
    /// Project a full block payload onto its header
    pub fn from_payload(mut payload: Payload) -> Self {
        for field in HEADER_EXCLUDED_FIELDS {
            payload.remove(*field);
        }
        Self(payload)
    }

    /// Look up a header field
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    /// The header fields as a JSON object
    pub fn as_payload(&self) -> &Payload {
        &self.0
    }

    /// Unwrap into the underlying JSON object
    pub fn into_payload(self) -> Payload {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_exactly_the_excluded_fields() {
        let payload: Payload = serde_json::from_value(json!({
            "previous": "00000009",
            "timestamp": "2024-05-01T12:00:00",
            "witness": "1.6.2",
            "transaction_merkle_root": "0000",
            "extensions": [],
            "witness_signature": "20ab",
            "transactions": [{ "operations": [] }],
        }))
        .unwrap();

        let header = RecordHeader::from_payload(payload);
        let mut keys: Vec<&str> = header.as_payload().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "extensions",
                "previous",
                "timestamp",
                "transaction_merkle_root",
                "witness"
            ]
        );
    }

    #[test]
    fn missing_excluded_fields_are_fine() {
        let payload: Payload = serde_json::from_value(json!({ "previous": "00" })).unwrap();
        let header = RecordHeader::from_payload(payload.clone());
        assert_eq!(header.into_payload(), payload);
    }
}
