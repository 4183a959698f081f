// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Account references
//!
//! Account lookups accept either the account's object id (`1.2.17`) or its
//! registered name (`init0`, `proxy.votes`). Names follow the ledger's own
//! rules, so a malformed name is rejected before any call is made.

use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::types::ids::ObjectId;

/// Longest account name the ledger accepts
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 63;

/// An account, by object id or by name
///
/// # Examples
///
/// ```
/// use blockvault::{AccountRef, ObjectId};
///
/// assert_eq!(
///     AccountRef::parse("1.2.17").unwrap(),
///     AccountRef::Id(ObjectId::new(1, 2, 17))
/// );
/// assert_eq!(
///     AccountRef::parse("proxy.votes").unwrap(),
///     AccountRef::Name("proxy.votes".to_string())
/// );
/// assert!(AccountRef::parse("Init0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRef {
    Id(ObjectId),
    Name(String),
}

impl AccountRef {
    /// Parse an externally supplied account id or name
    ///
    /// Anything that parses as an object id is an id; everything else must be
    /// a valid account name.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if let Ok(id) = ObjectId::parse(input) {
            return Ok(Self::Id(id));
        }
        if is_valid_account_name(input) {
            return Ok(Self::Name(input.to_string()));
        }
        Err(ValidationError::InvalidAccount {
            input: input.to_string(),
        })
    }
}

impl FromStr for AccountRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Id(id) => fmt::Display::fmt(id, f),
            AccountRef::Name(name) => f.write_str(name),
        }
    }
}

/// Ledger account name rules
///
/// Between 1 and 63 characters of dot-separated labels. Each label starts with
/// a lowercase letter, ends with a lowercase letter or digit, and otherwise
/// holds lowercase letters, digits and hyphens.
pub fn is_valid_account_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_ACCOUNT_NAME_LENGTH {
        return false;
    }
    name.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let (Some(&first), Some(&last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
