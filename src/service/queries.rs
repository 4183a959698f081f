// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Uncached account and witness lookups
//!
//! Each operation validates its input, forwards one call to the ledger and
//! hands back the node's answer as-is. Limits are optional: a missing limit
//! takes the operation's default and an oversized one is clamped to its cap.

use serde_json::{json, Value};
use tracing::Instrument;

use super::ExplorerService;
use crate::config::constants::{
    ACCOUNT_HISTORY_MAX_LIMIT, ACCOUNT_LIST_DEFAULT_LIMIT, ACCOUNT_LIST_MAX_LIMIT,
    HISTORY_UNBOUNDED_ID, WITNESS_LIST_MAX_LIMIT,
};
use crate::errors::{ReadError, SourceError};
use crate::source::{LedgerApi, LedgerSource};
use crate::spans;
use crate::types::account::AccountRef;
use crate::types::ids::{parse_limit, ObjectId};

impl ExplorerService {
    /// Accounts ordered by name, starting at `lower_bound`
    ///
    /// `limit` defaults to 100 and is clamped to 1000.
    pub async fn list_accounts(
        &self,
        lower_bound: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Value, ReadError> {
        let limit = clamped_limit(limit, ACCOUNT_LIST_DEFAULT_LIMIT, ACCOUNT_LIST_MAX_LIMIT)?;
        let lower_bound = lower_bound.unwrap_or_default();

        self.query(
            LedgerApi::Database,
            "lookup_accounts",
            json!([lower_bound, limit]),
        )
        .await
    }

    /// Number of registered accounts
    pub async fn account_count(&self) -> Result<u64, ReadError> {
        let count = self
            .query(LedgerApi::Database, "get_account_count", json!([]))
            .await?;
        parse_count("get_account_count", count)
    }

    /// One account, by object id or by name
    pub async fn get_account(&self, id_or_name: &str) -> Result<Value, ReadError> {
        let account = AccountRef::parse(id_or_name)?;

        let found = match &account {
            AccountRef::Id(id) => {
                let accounts = self
                    .query(LedgerApi::Database, "get_accounts", json!([[id.to_string()]]))
                    .await?;
                first_element(accounts)
            }
            AccountRef::Name(name) => {
                self.query(LedgerApi::Database, "get_account_by_name", json!([name]))
                    .await?
            }
        };

        non_null(found).ok_or_else(|| ReadError::not_found("Account", account))
    }

    /// Operation history of an account, newest first
    ///
    /// `start` and `most_recent` are operation history ids (`1.11.x`); both
    /// default to `1.11.0`, which leaves that end unbounded. `limit` defaults
    /// to 100 and is clamped to 100.
    pub async fn get_account_history(
        &self,
        account: &str,
        start: Option<&str>,
        limit: Option<&str>,
        most_recent: Option<&str>,
    ) -> Result<Value, ReadError> {
        let account = ObjectId::parse(account)?;
        let start = history_bound(start)?;
        let most_recent = history_bound(most_recent)?;
        let limit = clamped_limit(limit, ACCOUNT_HISTORY_MAX_LIMIT, ACCOUNT_HISTORY_MAX_LIMIT)?;

        self.query(
            LedgerApi::History,
            "get_account_history",
            json!([
                account.to_string(),
                start.to_string(),
                limit,
                most_recent.to_string()
            ]),
        )
        .await
    }

    /// Balances of an account, optionally restricted to some assets
    ///
    /// `assets` is a comma-separated list of asset ids; all balances are
    /// returned when it is absent or empty.
    pub async fn get_account_balances(
        &self,
        account: &str,
        assets: Option<&str>,
    ) -> Result<Value, ReadError> {
        let account = AccountRef::parse(account)?;
        let assets = parse_asset_list(assets.unwrap_or_default())?;

        let (method, account) = match account {
            AccountRef::Id(id) => ("get_account_balances", id.to_string()),
            AccountRef::Name(name) => ("get_named_account_balances", name),
        };
        self.query(LedgerApi::Database, method, json!([account, assets]))
            .await
    }

    /// Witness accounts ordered by name, starting at `starting_name`
    ///
    /// `limit` defaults to 1000 and is clamped to 1000.
    pub async fn list_witnesses(
        &self,
        starting_name: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Value, ReadError> {
        let limit = clamped_limit(limit, WITNESS_LIST_MAX_LIMIT, WITNESS_LIST_MAX_LIMIT)?;
        let starting_name = starting_name.unwrap_or_default();

        self.query(
            LedgerApi::Database,
            "lookup_witness_accounts",
            json!([starting_name, limit]),
        )
        .await
    }

    /// Number of registered witnesses
    pub async fn witness_count(&self) -> Result<u64, ReadError> {
        let count = self
            .query(LedgerApi::Database, "get_witness_count", json!([]))
            .await?;
        parse_count("get_witness_count", count)
    }

    /// One witness by object id (`1.6.x`)
    pub async fn get_witness(&self, id: &str) -> Result<Value, ReadError> {
        let id = ObjectId::parse(id)?;
        let witnesses = self
            .query(LedgerApi::Database, "get_witnesses", json!([[id.to_string()]]))
            .await?;

        non_null(first_element(witnesses)).ok_or_else(|| ReadError::not_found("Witness", id))
    }

    async fn query(
        &self,
        api: LedgerApi,
        method: &'static str,
        params: Value,
    ) -> Result<Value, ReadError> {
        self.source
            .query(api, method, params)
            .instrument(spans::ledger_query(api, method))
            .await
            .map_err(ReadError::from)
    }
}

/// `None` takes `default`; anything above `max` becomes `max`
fn clamped_limit(input: Option<&str>, default: u64, max: u64) -> Result<u64, ReadError> {
    match input {
        None => Ok(default),
        Some(input) => Ok(parse_limit(input)?.min(max)),
    }
}

fn history_bound(input: Option<&str>) -> Result<ObjectId, ReadError> {
    match input {
        None => Ok(HISTORY_UNBOUNDED_ID),
        Some(input) => Ok(ObjectId::parse(input)?),
    }
}

/// Splits `1.3.0,1.3.121` into ids, ignoring empty entries
fn parse_asset_list(input: &str) -> Result<Vec<String>, ReadError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|asset| !asset.is_empty())
        .map(|asset| {
            ObjectId::parse(asset)
                .map(|id| id.to_string())
                .map_err(ReadError::from)
        })
        .collect()
}

fn first_element(response: Value) -> Value {
    match response {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

fn parse_count(method: &'static str, count: Value) -> Result<u64, ReadError> {
    count.as_u64().ok_or_else(|| {
        SourceError::malformed(method, format!("expected a non-negative count, got {count}"))
            .into()
    })
}
