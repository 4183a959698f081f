// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cached ledger records

use serde::{Deserialize, Serialize};

use super::ids::RecordId;

/// Opaque JSON document as produced by the ledger
///
/// Blockvault never interprets payload fields; it only stores and returns them.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One immutable block, keyed by its upstream block number
///
/// The id is assigned by the cache, not read from the payload, so a payload
/// returned to callers never carries the cache's identity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    payload: Payload,
}

impl Record {
    /// Create a record from its id and payload
    pub fn new(id: RecordId, payload: Payload) -> Self {
        Self { id, payload }
    }

    /// Block number
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Block contents
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Drop the cache identity and keep the block contents
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}
