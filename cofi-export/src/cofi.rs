//! CoFi debt-netting format
//!
//! Turns a directed amount table into `debtor,creditor,amount` rows for the
//! set-off solver.
//!
//! # Edge semantics
//!
//! A capacity edge "A can pay B" becomes a debt edge "A owes B". Unused
//! payment capacity is treated as a contingent liability, so opposing
//! capacities along a cycle net out the same way mutual debts do.
//!
//! # Example
//!
//! ```text
//! Amount table (raw units):
//!   0xaa -> 0xbb: 250_000_000
//!   0xbb -> 0xaa:  99_999_999   (below one netting unit, dropped)
//!   0xbb -> 0xbb: 500_000_000   (self-loop, skipped)
//!
//! Account index:
//!   0 = 0xaa, 1 = 0xbb
//!
//! CoFi rows:
//!   debtor,creditor,amount
//!   0,1,2
//! ```

use crate::Result;
use capacity_core::{AccountId, Amount, AmountTable};
use num_traits::Zero;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::io::Write;

/// Raw token units per netting unit
pub const RESCALE_DIVISOR: u64 = 100_000_000;

/// Header of the CoFi CSV
pub const COFI_HEADER: [&str; 3] = ["debtor", "creditor", "amount"];

/// Header of the account index CSV
pub const INDEX_HEADER: [&str; 2] = ["index", "address"];

/// Dense zero-based account numbering, ordered by account key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountIndex {
    accounts: Vec<AccountId>,
    positions: HashMap<AccountId, usize>,
}

impl AccountIndex {
    /// Number every account appearing as either endpoint of `table`
    pub fn from_table(table: &AmountTable) -> Self {
        // BTreeSet iteration is already lexicographic
        let accounts: Vec<AccountId> = table.accounts().into_iter().cloned().collect();
        let positions = accounts
            .iter()
            .enumerate()
            .map(|(idx, account)| (account.clone(), idx))
            .collect();
        Self {
            accounts,
            positions,
        }
    }

    /// Index of an account
    pub fn index_of(&self, account: &AccountId) -> Option<usize> {
        self.positions.get(account).copied()
    }

    /// Indices of both endpoints, if both are indexed
    pub fn index_pair(&self, from: &AccountId, to: &AccountId) -> Option<(usize, usize)> {
        Some((self.index_of(from)?, self.index_of(to)?))
    }

    /// Account at an index
    pub fn account(&self, index: usize) -> Option<&AccountId> {
        self.accounts.get(index)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no account is indexed
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// `(index, account)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AccountId)> {
        self.accounts.iter().enumerate()
    }
}

/// One CoFi row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NettingRow {
    /// Index of the paying side
    pub debtor: usize,
    /// Index of the receiving side
    pub creditor: usize,
    /// Amount in netting units, always positive
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Amount,
}

fn serialize_amount<S: Serializer>(
    amount: &Amount,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
}

/// Counters collected while transforming
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Edges in the input table
    pub input_edges: usize,
    /// `from == to` edges skipped
    pub self_loops_skipped: usize,
    /// Edges whose rescaled amount was zero
    pub dropped_below_unit: usize,
}

/// Transformer output
#[derive(Debug, Clone, Default)]
pub struct NettingBatch {
    /// Account numbering used by `rows`
    pub index: AccountIndex,
    /// CoFi rows in `(debtor, creditor)` key order
    pub rows: Vec<NettingRow>,
    /// Counters
    pub stats: TransformStats,
}

/// Convert raw token units to netting units (floor division)
pub fn rescale(amount: &Amount) -> Amount {
    amount / RESCALE_DIVISOR
}

/// Build CoFi rows from a pre-aggregated amount table
pub fn transform(table: &AmountTable) -> NettingBatch {
    let index = AccountIndex::from_table(table);
    let mut rows = Vec::new();
    let mut stats = TransformStats::default();

    for (from, to, amount) in table.iter() {
        stats.input_edges += 1;

        if from == to {
            stats.self_loops_skipped += 1;
            continue;
        }

        let amount = rescale(amount);
        if amount.is_zero() {
            stats.dropped_below_unit += 1;
            continue;
        }

        // Both endpoints come from the table the index was built from
        if let Some((debtor, creditor)) = index.index_pair(from, to) {
            rows.push(NettingRow {
                debtor,
                creditor,
                amount,
            });
        }
    }

    tracing::info!(
        "Transformed {} edges into {} CoFi rows over {} accounts",
        stats.input_edges,
        rows.len(),
        index.len()
    );
    tracing::debug!(
        "Skipped {} self-loops, dropped {} edges below one netting unit",
        stats.self_loops_skipped,
        stats.dropped_below_unit
    );

    NettingBatch { index, rows, stats }
}

/// Write CoFi rows with the `debtor,creditor,amount` header
pub fn write_rows<W: Write>(rows: &[NettingRow], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(COFI_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the `index,address` table
pub fn write_index<W: Write>(index: &AccountIndex, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(INDEX_HEADER)?;
    for (idx, account) in index.iter() {
        writer.serialize((idx, account))?;
    }
    writer.flush()?;
    Ok(())
}
