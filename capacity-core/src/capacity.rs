//! Transfer capacity between two accounts
//!
//! # Algorithm
//!
//! For a transfer `from -> to` under trust percentage `p`:
//!
//! 1. `from == to`, or `to` is an organization: the sender's own-token
//!    balance.
//! 2. `held = balance[to][from]`, the receiver's holding of `from` tokens.
//! 3. `max_trusted = balance[to][to] * p / 100`.
//! 4. `held > max_trusted`: trust limit already exceeded, capacity 0.
//! 5. Otherwise `min(max_trusted - held * (100 - p) / 100, balance[from][from])`.
//!
//! All divisions floor.

use crate::{
    snapshot::{Snapshot, MAX_TRUST_PERCENT},
    types::{AccountId, Amount, AmountTable},
};
use num_traits::Zero;
use std::collections::BTreeSet;

/// Capacity engine over a decoded snapshot
#[derive(Debug, Clone, Copy)]
pub struct CapacityEngine<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> CapacityEngine<'a> {
    /// Create engine borrowing the snapshot tables
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Own-token balance of `account`
    pub fn own_balance(&self, account: &AccountId) -> Amount {
        self.snapshot.balances.get(account, account)
    }

    /// Maximum amount `from` can currently transfer to `to`.
    ///
    /// `trust_percent` is clamped to 100.
    pub fn transfer_limit(&self, from: &AccountId, to: &AccountId, trust_percent: u8) -> Amount {
        let sender_own = self.own_balance(from);
        if from == to || self.snapshot.is_organization(to) {
            return sender_own;
        }

        let percent = u32::from(trust_percent.min(MAX_TRUST_PERCENT));
        let hundred = u32::from(MAX_TRUST_PERCENT);

        let receiver_balance = self.snapshot.balances.get(to, from);
        let scaled_receiver_balance = &receiver_balance * (hundred - percent) / hundred;
        let max_trusted = self.own_balance(to) * percent / hundred;

        if max_trusted < receiver_balance {
            return Amount::zero();
        }

        // max_trusted >= receiver_balance >= scaled_receiver_balance
        assert!(
            max_trusted >= scaled_receiver_balance,
            "negative capacity for {} -> {}",
            from,
            to
        );
        let headroom = max_trusted - scaled_receiver_balance;
        headroom.min(sender_own)
    }

    /// Counterparties considered for `from`: trust and balance entries,
    /// excluding `from` itself.
    pub fn counterparties(&self, from: &AccountId) -> BTreeSet<&'a AccountId> {
        let snapshot = self.snapshot;
        snapshot
            .trust
            .row(from)
            .map(|(to, _)| to)
            .chain(snapshot.balances.row(from).map(|(to, _)| to))
            .filter(|to| *to != from)
            .collect()
    }

    /// Accounts that appear as a source in either table
    pub fn sources(&self) -> BTreeSet<&'a AccountId> {
        let snapshot = self.snapshot;
        snapshot
            .trust
            .sources()
            .chain(snapshot.balances.sources())
            .collect()
    }

    /// Positive capacities for every `(from, to)` pair of the graph
    /// enumeration, ready for the CoFi transformer.
    pub fn capacity_table(&self) -> AmountTable {
        let mut table = AmountTable::new();
        for from in self.sources() {
            for to in self.counterparties(from) {
                let trust = self.snapshot.trust.get(from, to);
                let capacity = self.transfer_limit(from, to, trust);
                if !capacity.is_zero() {
                    table.insert(from.clone(), to.clone(), capacity);
                }
            }
        }
        tracing::info!("Derived {} positive capacities", table.edge_count());
        table
    }
}
