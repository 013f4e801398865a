use proptest::prelude::*;

use pledge_nullables::{NullClock, NullTokenLedger};
use pledge_staking::{
    compute_payout, select_fine_tier, FineDestination, FineTier, StakeProgram, StakingEngine,
};
use pledge_types::{Address, Amount, SECS_PER_DAY};

fn tiers_strategy() -> impl Strategy<Value = Vec<FineTier>> {
    prop::collection::vec(
        (0u64..400 * SECS_PER_DAY, 0u8..=100).prop_map(|(threshold_secs, fine_percent)| {
            FineTier {
                threshold_secs,
                fine_percent,
            }
        }),
        1..8,
    )
}

proptest! {
    /// The selected tier is the first one whose threshold is still ahead,
    /// falling back to the last tier.
    #[test]
    fn tier_selection_matches_first_pending_threshold(
        tiers in tiers_strategy(),
        elapsed in 0u64..500 * SECS_PER_DAY,
    ) {
        let expected = tiers
            .iter()
            .position(|t| elapsed < t.threshold_secs)
            .unwrap_or(tiers.len() - 1);
        prop_assert_eq!(select_fine_tier(&tiers, elapsed), Some(expected));
    }

    /// Before maturity nobody receives more than they staked.
    #[test]
    fn early_exit_never_exceeds_principal(
        tiers in tiers_strategy(),
        amount in 1u128..1_000_000_000_000_000_000_000,
        period_days in 1u64..400,
        apy in 0u32..10_000,
        elapsed_frac in 0u64..=1000,
    ) {
        let period_secs = period_days * SECS_PER_DAY;
        let program = StakeProgram {
            fine_tiers: tiers,
            ..StakeProgram::new(0, period_secs, apy)
        };
        let elapsed = period_secs * elapsed_frac / 1000;
        let payout = compute_payout(Amount::new(amount), &program, elapsed).unwrap();
        prop_assert!(!payout.is_matured());
        prop_assert!(payout.amount.raw() <= amount);
        prop_assert_eq!(payout.fine().raw() + payout.amount.raw(), amount);
    }

    /// Once matured, the payout is never below the principal and grows with apy.
    #[test]
    fn matured_payout_monotonic_in_apy(
        amount in 1u128..1_000_000_000_000_000_000_000,
        period_days in 1u64..400,
        apy in 0u32..10_000,
        bump in 1u32..100,
    ) {
        let period_secs = period_days * SECS_PER_DAY;
        let low = StakeProgram::new(0, period_secs, apy);
        let high = StakeProgram::new(0, period_secs, apy + bump);
        let a = compute_payout(Amount::new(amount), &low, period_secs + 1).unwrap();
        let b = compute_payout(Amount::new(amount), &high, period_secs + 1).unwrap();
        prop_assert!(a.is_matured());
        prop_assert!(a.amount.raw() >= amount);
        prop_assert!(b.amount >= a.amount);
    }

    /// Tokens are conserved across any interleaving of deposits, time and
    /// withdrawals, and the ledger totals stay in step with the positions.
    #[test]
    fn random_flows_conserve_tokens(
        ops in prop::collection::vec((0u8..3, 0u8..3, 1u128..10_000, 0u64..100), 1..40),
    ) {
        let owner = Address::new("owner");
        let pool = Address::new("pool");
        let stakers = [Address::new("a"), Address::new("b"), Address::new("c")];
        let mut token = NullTokenLedger::new(pool.clone());
        token.mint(&pool, Amount::new(10_000_000));
        for s in &stakers {
            token.mint(s, Amount::new(1_000_000));
            token.approve(s, Amount::new(1_000_000));
        }
        let supply = token.total_supply();
        let mut engine = StakingEngine::new(owner.clone(), token, NullClock::new(0));
        engine.configure_default(&owner, FineDestination::Pool).unwrap();

        for (who, program, amount, days) in ops {
            let staker = &stakers[who as usize];
            let count = engine.staker(staker).position_count;
            if days % 2 == 0 || count == 0 {
                engine
                    .deposit(staker, u32::from(program), Amount::new(amount))
                    .unwrap();
            } else {
                let index = (amount % u128::from(count)) as u32;
                let reserve = engine.reserve_balance();
                let quote = engine.quote(staker, index).unwrap();
                match engine.withdraw(staker, index) {
                    Ok(paid) => {
                        prop_assert_eq!(paid, quote.amount);
                    }
                    Err(_) => {
                        prop_assert_eq!(engine.reserve_balance(), reserve);
                    }
                }
            }
            engine.clock().advance_days(days);
            prop_assert_eq!(engine.token().total_supply(), supply);
        }

        prop_assert!(engine.ledger().is_consistent());
        for s in &stakers {
            let account = engine.staker(s);
            let open: u128 = engine
                .staker_positions(s)
                .iter()
                .filter(|p| !p.closed)
                .map(|p| p.amount.raw())
                .sum();
            let closed_in: u128 = engine
                .staker_positions(s)
                .iter()
                .filter(|p| p.closed)
                .map(|p| p.amount.raw())
                .sum();
            prop_assert_eq!(account.total_deposited.raw(), open + closed_in);
            prop_assert_eq!(
                engine.token().balance_of(s).raw(),
                1_000_000 - account.total_deposited.raw() + account.total_after.raw()
            );
        }
    }
}
