// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for type safety across blockvault.
//!
//! This module provides newtype wrappers for the domain concepts:
//! - Block ids, contiguous id ranges and dotted ledger object ids
//! - Cached records and their opaque payloads
//! - The ledger head snapshot (dynamic global properties)
//! - The header projection of a block
//! - Account references (object id or account name)

pub mod account;
pub mod head;
pub mod header;
pub mod ids;
pub mod record;

// Note: Public types are re-exported from lib.rs, not here
