// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Identifier types and their validation
//!
//! Every identifier that arrives from outside the crate is parsed here before
//! any store or ledger call is made:
//!
//! - [`RecordId`]: block number, a non-negative base-10 integer
//! - [`ObjectId`]: ledger object id of the form `space.type.instance`
//! - [`RecordRange`]: the contiguous id range `[start, start + limit)`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Block number assigned by the upstream ledger
///
/// Upstream numbering starts at 1 and is contiguous. Zero parses (it is a
/// syntactically valid id) but never exists upstream.
///
/// # Examples
///
/// ```
/// use blockvault::RecordId;
///
/// let id = RecordId::parse("42").unwrap();
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.next(), Some(RecordId::new(43)));
/// assert!(RecordId::parse("abc").is_err());
/// assert!(RecordId::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// The first block upstream
    pub const FIRST: Self = Self(1);

    /// Wrap a raw block number
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw block number
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The following block id, or `None` at the end of the id space
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Parse an externally supplied block id
    ///
    /// Only ASCII digits are accepted: no sign, no whitespace, no fraction.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_digits(input)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidRecordId {
                input: input.to_string(),
            })
    }
}

impl FromStr for RecordId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger object id, e.g. `1.2.17` for an account or `2.1.0` for the
/// dynamic global properties
///
/// # Examples
///
/// ```
/// use blockvault::ObjectId;
///
/// let id = ObjectId::parse("1.11.10000").unwrap();
/// assert_eq!(id.to_string(), "1.11.10000");
/// assert!(ObjectId::parse("1.11").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    space: u8,
    type_id: u8,
    instance: u64,
}

impl ObjectId {
    /// Build an object id from its parts
    pub const fn new(space: u8, type_id: u8, instance: u64) -> Self {
        Self {
            space,
            type_id,
            instance,
        }
    }

    /// Object space (1 = protocol, 2 = implementation)
    pub const fn space(&self) -> u8 {
        self.space
    }

    /// Object type within the space
    pub const fn type_id(&self) -> u8 {
        self.type_id
    }

    /// Instance number
    pub const fn instance(&self) -> u64 {
        self.instance
    }

    /// Parse an externally supplied object id
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidObjectId {
            input: input.to_string(),
        };

        let mut parts = input.split('.');
        let (Some(space), Some(type_id), Some(instance), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let space = parse_digits(space).and_then(|v| u8::try_from(v).ok());
        let type_id = parse_digits(type_id).and_then(|v| u8::try_from(v).ok());
        let instance = parse_digits(instance);

        match (space, type_id, instance) {
            (Some(space), Some(type_id), Some(instance)) => {
                Ok(Self::new(space, type_id, instance))
            }
            _ => Err(invalid()),
        }
    }
}

impl FromStr for ObjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.type_id, self.instance)
    }
}

/// Contiguous block range `[start, start + limit)`
///
/// Construction guarantees `limit >= 1` and that the last id fits in `u64`.
///
/// # Examples
///
/// ```
/// use blockvault::{RecordId, RecordRange};
///
/// let range = RecordRange::new(RecordId::new(10), 5).unwrap();
/// assert_eq!(range.first(), RecordId::new(10));
/// assert_eq!(range.last(), RecordId::new(14));
/// assert_eq!(range.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRange {
    first: RecordId,
    last: RecordId,
}

impl RecordRange {
    /// Build the range `[start, start + limit)`
    pub fn new(start: RecordId, limit: u64) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::InvalidLimit {
                input: limit.to_string(),
            });
        }
        let last = start
            .get()
            .checked_add(limit - 1)
            .ok_or(ValidationError::RangeOverflow {
                start: start.get(),
                limit,
            })?;
        Ok(Self {
            first: start,
            last: RecordId(last),
        })
    }

    /// First id in the range (inclusive)
    pub fn first(&self) -> RecordId {
        self.first
    }

    /// Last id in the range (inclusive)
    pub fn last(&self) -> RecordId {
        self.last
    }

    /// Number of ids in the range
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.last.0 - self.first.0 + 1
    }

    /// Whether `id` lies inside the range
    pub fn contains(&self, id: RecordId) -> bool {
        self.first <= id && id <= self.last
    }

    /// All ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = RecordId> {
        (self.first.0..=self.last.0).map(RecordId)
    }
}

impl fmt::Display for RecordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}

/// Parse an externally supplied range limit
pub fn parse_limit(input: &str) -> Result<u64, ValidationError> {
    match parse_digits(input) {
        Some(limit) if limit > 0 => Ok(limit),
        _ => Err(ValidationError::InvalidLimit {
            input: input.to_string(),
        }),
    }
}

fn parse_digits(input: &str) -> Option<u64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}
