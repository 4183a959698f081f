// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known ledger identifiers and default settings

use std::time::Duration;

use crate::types::ids::ObjectId;

/// The ledger's dynamic global properties object, which carries
/// `head_block_number` and `time`
pub const HEAD_OBJECT_ID: ObjectId = ObjectId::new(2, 1, 0);

/// API name used in the `call` envelope for block and object lookups
pub const DATABASE_API: &str = "database";

/// API name used in the `call` envelope for account history
pub const HISTORY_API: &str = "history";

/// Operation history id that means "no bound" to `get_account_history`
pub const HISTORY_UNBOUNDED_ID: ObjectId = ObjectId::new(1, 11, 0);

pub const ACCOUNT_LIST_DEFAULT_LIMIT: u64 = 100;

/// The node rejects `lookup_accounts` above this
pub const ACCOUNT_LIST_MAX_LIMIT: u64 = 1000;

/// Default and cap for `get_account_history`
pub const ACCOUNT_HISTORY_MAX_LIMIT: u64 = 100;

/// Default and cap for `lookup_witness_accounts`
pub const WITNESS_LIST_MAX_LIMIT: u64 = 1000;

pub const DEFAULT_STORE_PATH: &str = "./data/blocks.jsonl";

/// Newly inserted records between two ingestion status lines
pub const DEFAULT_STATUS_INTERVAL: u64 = 100;

/// Largest `limit` accepted by a range read
pub const DEFAULT_MAX_RANGE_LIMIT: u64 = 100;

/// Slots in the live record broadcast channel before slow receivers lag
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Graphene chains produce a block every 3 seconds by default
pub const DEFAULT_HEAD_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_object_id() {
        assert_eq!(HEAD_OBJECT_ID.to_string(), "2.1.0");
        assert_eq!(HISTORY_UNBOUNDED_ID.to_string(), "1.11.0");
    }
}
