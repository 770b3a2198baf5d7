//! Core types for capacity derivation
//!
//! All tables are ordered maps so that every iteration over accounts or
//! edges is deterministic across runs.

use crate::{Error, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

/// Token amount. Balances are derived from up to 32-byte magnitudes, so
/// fixed-width integers are not enough.
pub type Amount = BigUint;

/// Length of a raw account address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Raw 20-byte account address as it appears in a binary snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Table key for this address
    pub fn to_account_id(&self) -> AccountId {
        AccountId(self.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Account key used by every table.
///
/// Keys are lowercased on construction so that checksummed and plain
/// renderings of the same address collapse onto one account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Address> for AccountId {
    fn from(address: Address) -> Self {
        address.to_account_id()
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Directed `from -> {to -> value}` table.
///
/// Lookups of absent pairs return `V::default()`, i.e. zero for every
/// numeric value type used here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTable<V> {
    rows: BTreeMap<AccountId, BTreeMap<AccountId, V>>,
}

impl<V> Default for EdgeTable<V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<V: Clone + Default> EdgeTable<V> {
    /// Create empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `(from, to)`, zero when absent
    pub fn get(&self, from: &AccountId, to: &AccountId) -> V {
        self.rows
            .get(from)
            .and_then(|row| row.get(to))
            .cloned()
            .unwrap_or_default()
    }

    /// Set the value for `(from, to)`, overwriting any earlier one
    pub fn insert(&mut self, from: AccountId, to: AccountId, value: V) -> Option<V> {
        self.rows.entry(from).or_default().insert(to, value)
    }

    /// Outgoing entries of `from`
    pub fn row<'a>(
        &'a self,
        from: &AccountId,
    ) -> impl Iterator<Item = (&'a AccountId, &'a V)> + 'a {
        self.rows.get(from).into_iter().flat_map(|row| row.iter())
    }

    /// Accounts with at least one outgoing entry
    pub fn sources(&self) -> impl Iterator<Item = &AccountId> {
        self.rows.keys()
    }

    /// All `(from, to, value)` triples in key order
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &AccountId, &V)> {
        self.rows
            .iter()
            .flat_map(|(from, row)| row.iter().map(move |(to, value)| (from, to, value)))
    }

    /// Every account appearing as either endpoint
    pub fn accounts(&self) -> BTreeSet<&AccountId> {
        let mut accounts = BTreeSet::new();
        for (from, row) in &self.rows {
            accounts.insert(from);
            accounts.extend(row.keys());
        }
        accounts
    }

    /// Number of stored pairs
    pub fn edge_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// True when no pair is stored
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(BTreeMap::is_empty)
    }
}

impl<V: Clone + Default + AddAssign> EdgeTable<V> {
    /// Add `value` onto whatever is stored for `(from, to)`
    pub fn accumulate(&mut self, from: AccountId, to: AccountId, value: V) {
        *self.rows.entry(from).or_default().entry(to).or_default() += value;
    }
}

/// `truster -> {trustee -> percent}`
pub type TrustTable = EdgeTable<u8>;

/// `holder -> {token_owner -> amount}`
pub type BalanceTable = EdgeTable<Amount>;

/// Generic directed amount table fed to the CoFi transformer
pub type AmountTable = EdgeTable<Amount>;
