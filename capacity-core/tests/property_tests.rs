//! Property-based tests for capacity invariants
//!
//! These tests use proptest to verify:
//! - Self transfers and transfers to organizations yield the own balance
//! - Zero trust yields zero
//! - Full trust yields min(receiver own, sender own) when not exceeded
//! - Capacity never exceeds the sender's own balance
//! - Sweeping trust 0..=100 is zero below a single breakpoint and
//!   non-decreasing above it

use capacity_core::{AccountId, Amount, CapacityEngine, Snapshot};
use num_traits::Zero;
use proptest::prelude::*;

/// Strategy for balances; mixes small values with ones wider than u128
fn amount_strategy() -> impl Strategy<Value = Amount> {
    prop_oneof![
        (0u64..10_000u64).prop_map(Amount::from),
        any::<u128>().prop_map(|v| Amount::from(v) * Amount::from(1_000_000u64)),
    ]
}

/// (sender own, receiver own, receiver holding of sender tokens)
fn balances_strategy() -> impl Strategy<Value = (Amount, Amount, Amount)> {
    (amount_strategy(), amount_strategy(), amount_strategy())
}

fn sender() -> AccountId {
    AccountId::new("0xaaaa")
}

fn receiver() -> AccountId {
    AccountId::new("0xbbbb")
}

fn build_snapshot(sender_own: &Amount, receiver_own: &Amount, held: &Amount) -> Snapshot {
    let mut snapshot = Snapshot::default();
    snapshot.balances.insert(sender(), sender(), sender_own.clone());
    snapshot.balances.insert(receiver(), receiver(), receiver_own.clone());
    snapshot.balances.insert(receiver(), sender(), held.clone());
    snapshot
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: transfer_limit(a, a, p) == balance[a][a]
    #[test]
    fn prop_self_transfer_is_own_balance(
        (own, other, held) in balances_strategy(),
        percent in 0u8..=100,
    ) {
        let snapshot = build_snapshot(&own, &other, &held);
        let engine = CapacityEngine::new(&snapshot);

        prop_assert_eq!(engine.transfer_limit(&sender(), &sender(), percent), own);
    }

    /// Property: transfer_limit(a, org, p) == balance[a][a]
    #[test]
    fn prop_organization_receiver_is_own_balance(
        (own, other, held) in balances_strategy(),
        percent in 0u8..=100,
    ) {
        let mut snapshot = build_snapshot(&own, &other, &held);
        snapshot.organizations.insert(receiver());
        let engine = CapacityEngine::new(&snapshot);

        prop_assert_eq!(engine.transfer_limit(&sender(), &receiver(), percent), own);
    }

    /// Property: zero trust always yields zero
    #[test]
    fn prop_zero_trust_yields_zero((own, other, held) in balances_strategy()) {
        let snapshot = build_snapshot(&own, &other, &held);
        let engine = CapacityEngine::new(&snapshot);

        prop_assert!(engine.transfer_limit(&sender(), &receiver(), 0).is_zero());
    }

    /// Property: full trust yields min(receiver own, sender own) unless exceeded
    #[test]
    fn prop_full_trust((own, other, held) in balances_strategy()) {
        let snapshot = build_snapshot(&own, &other, &held);
        let engine = CapacityEngine::new(&snapshot);

        let limit = engine.transfer_limit(&sender(), &receiver(), 100);
        if other >= held {
            prop_assert_eq!(limit, other.min(own));
        } else {
            prop_assert!(limit.is_zero());
        }
    }

    /// Property: capacity never exceeds the sender's own balance
    #[test]
    fn prop_bounded_by_sender_balance(
        (own, other, held) in balances_strategy(),
        percent in 0u8..=100,
    ) {
        let snapshot = build_snapshot(&own, &other, &held);
        let engine = CapacityEngine::new(&snapshot);

        prop_assert!(engine.transfer_limit(&sender(), &receiver(), percent) <= own);
    }

    /// Property: sweeping 0..=100 gives zero up to the first percent where
    /// floor(receiver_own * p / 100) >= held, then a non-decreasing curve
    #[test]
    fn prop_percent_sweep((own, other, held) in balances_strategy()) {
        let snapshot = build_snapshot(&own, &other, &held);
        let engine = CapacityEngine::new(&snapshot);

        let breakpoint = (0u32..=100).find(|p| &other * *p / 100u32 >= held);
        let mut previous = Amount::zero();
        for percent in 0u8..=100 {
            let limit = engine.transfer_limit(&sender(), &receiver(), percent);
            match breakpoint {
                Some(bp) if u32::from(percent) >= bp => {
                    prop_assert!(limit >= previous, "decreased at {}%", percent);
                }
                _ => prop_assert!(limit.is_zero(), "non-zero below breakpoint at {}%", percent),
            }
            previous = limit;
        }
    }
}

#[test]
fn test_sweep_breakpoints_for_fixed_balances() {
    // receiver own 200, holds 50 of sender: exceeded until 200 * p / 100 >= 50, i.e. p = 25
    let snapshot = build_snapshot(
        &Amount::from(1_000u32),
        &Amount::from(200u32),
        &Amount::from(50u32),
    );
    let engine = CapacityEngine::new(&snapshot);

    let limits: Vec<Amount> = (0u8..=100)
        .map(|p| engine.transfer_limit(&sender(), &receiver(), p))
        .collect();

    assert!(limits[..25].iter().all(Zero::is_zero));
    // p = 25: 50 - 50 * 75 / 100 = 50 - 37 = 13
    assert_eq!(limits[25], Amount::from(13u32));
    // p = 50: 100 - 25 = 75
    assert_eq!(limits[50], Amount::from(75u32));
    // p = 100: min(200, 1000)
    assert_eq!(limits[100], Amount::from(200u32));
}
