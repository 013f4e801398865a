//! The staking engine: catalog administration, deposits and withdrawals.

use crate::catalog::ProgramCatalog;
use crate::error::StakingError;
use crate::events::StakingEvent;
use crate::guard::AdminGuard;
use crate::ledger::StakerLedger;
use crate::payout::{compute_payout, Payout};
use crate::position::{PositionIndex, StakePosition, StakerAccount};
use crate::program::{default_programs, ProgramId, StakeProgram};
use crate::store::{StakingStore, StoreError};
use crate::transfer::{FineDestination, ValueTransfer};
use pledge_types::{Address, Amount, Clock};

/// The staking engine.
///
/// Every entry point takes `&mut self` and either applies all of its effects
/// or none: validation and checked arithmetic run first, token transfers next,
/// and ledger changes are committed last.
pub struct StakingEngine<T, C> {
    guard: AdminGuard,
    catalog: ProgramCatalog,
    ledger: StakerLedger,
    fine_destination: FineDestination,
    events: Vec<StakingEvent>,
    token: T,
    clock: C,
}

impl<T: ValueTransfer, C: Clock> StakingEngine<T, C> {
    /// An unconfigured engine owned by `owner`, with an empty catalog.
    pub fn new(owner: Address, token: T, clock: C) -> Self {
        Self {
            guard: AdminGuard::new(owner),
            catalog: ProgramCatalog::new(),
            ledger: StakerLedger::new(),
            fine_destination: FineDestination::Pool,
            events: Vec::new(),
            token,
            clock,
        }
    }

    // ── Configuration ──────────────────────────────────────────────────

    /// One-time initialisation: install `programs` and pick the fine destination.
    pub fn configure(
        &mut self,
        caller: &Address,
        programs: Vec<StakeProgram>,
        fine_destination: FineDestination,
    ) -> Result<(), StakingError> {
        self.guard.ensure_owner(caller)?;
        self.guard.ensure_not_configured()?;
        let mut catalog = self.catalog.clone();
        catalog.install(programs)?;
        self.catalog = catalog;
        self.fine_destination = fine_destination;
        self.guard.mark_configured();
        tracing::info!(
            programs = self.catalog.count(),
            fine_wallet = ?self.fine_destination.wallet(),
            "staking engine configured"
        );
        Ok(())
    }

    /// [`configure`](Self::configure) with the stock catalog.
    pub fn configure_default(
        &mut self,
        caller: &Address,
        fine_destination: FineDestination,
    ) -> Result<(), StakingError> {
        self.configure(caller, default_programs(), fine_destination)
    }

    pub fn add_stake_type(
        &mut self,
        caller: &Address,
        period_secs: u64,
        apy: u32,
    ) -> Result<ProgramId, StakingError> {
        self.guard.ensure_owner(caller)?;
        let id = self.catalog.add(period_secs, apy)?;
        tracing::info!(program = id, period_secs, apy, "stake type added");
        Ok(id)
    }

    pub fn add_stake_type_with_fines(
        &mut self,
        caller: &Address,
        period_secs: u64,
        apy: u32,
        thresholds: &[u64],
        fine_percents: &[u8],
    ) -> Result<ProgramId, StakingError> {
        self.guard.ensure_owner(caller)?;
        let id = self
            .catalog
            .add_with_fines(period_secs, apy, thresholds, fine_percents)?;
        tracing::info!(
            program = id,
            period_secs,
            apy,
            tiers = thresholds.len(),
            "stake type with fines added"
        );
        Ok(id)
    }

    pub fn set_stake_type_fines(
        &mut self,
        caller: &Address,
        id: ProgramId,
        thresholds: &[u64],
        fine_percents: &[u8],
    ) -> Result<(), StakingError> {
        self.guard.ensure_owner(caller)?;
        self.catalog.set_fines(id, thresholds, fine_percents)?;
        tracing::info!(program = id, tiers = thresholds.len(), "fine schedule replaced");
        Ok(())
    }

    pub fn change_stake_type(
        &mut self,
        caller: &Address,
        id: ProgramId,
        active: bool,
        period_secs: u64,
        apy: u32,
    ) -> Result<(), StakingError> {
        self.guard.ensure_owner(caller)?;
        self.catalog.change(id, active, period_secs, apy)?;
        tracing::info!(program = id, active, period_secs, apy, "stake type changed");
        Ok(())
    }

    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> Result<(), StakingError> {
        self.guard.set_paused(caller, paused)?;
        tracing::info!(paused, "pause flag set");
        Ok(())
    }

    pub fn set_fine_destination(
        &mut self,
        caller: &Address,
        destination: FineDestination,
    ) -> Result<(), StakingError> {
        self.guard.ensure_owner(caller)?;
        self.fine_destination = destination;
        tracing::info!(fine_wallet = ?self.fine_destination.wallet(), "fine destination set");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), StakingError> {
        self.guard.transfer_ownership(caller, new_owner)?;
        tracing::info!(owner = %self.guard.owner(), "ownership transferred");
        Ok(())
    }

    // ── Deposits ───────────────────────────────────────────────────────

    /// Stake `amount` from `caller` into `program_id`; returns the new position index.
    pub fn deposit(
        &mut self,
        caller: &Address,
        program_id: ProgramId,
        amount: Amount,
    ) -> Result<PositionIndex, StakingError> {
        self.guard.ensure_not_paused()?;
        if amount.is_zero() {
            return Err(StakingError::ZeroAmount);
        }
        self.catalog.get_active(program_id)?;
        let now = self.clock.now();
        let staged = self.ledger.stage_open(caller, program_id, amount, now)?;
        self.token.debit(caller, amount)?;
        let index = self.ledger.commit_open(staged);

        tracing::info!(
            staker = %caller,
            %amount,
            program = program_id,
            index,
            "deposit"
        );
        self.events.push(StakingEvent::Deposit {
            staker: caller.clone(),
            amount,
            program_id,
            index,
        });
        Ok(index)
    }

    // ── Withdrawals ────────────────────────────────────────────────────

    /// What withdrawing position `index` of `staker` would pay right now.
    pub fn quote(&self, staker: &Address, index: PositionIndex) -> Result<Payout, StakingError> {
        let position = self.ledger.position(staker, index)?;
        let program = self.catalog.get(position.program_id)?;
        compute_payout(
            position.amount,
            program,
            position.elapsed_secs(self.clock.now()),
        )
    }

    /// Close one of the caller's own positions and pay it out to the caller.
    pub fn withdraw(
        &mut self,
        caller: &Address,
        index: PositionIndex,
    ) -> Result<Amount, StakingError> {
        self.close_and_pay(caller, index, caller)
    }

    /// Owner override: close `staker`'s position and pay it out to `target`.
    pub fn admin_withdraw(
        &mut self,
        caller: &Address,
        target: &Address,
        staker: &Address,
        index: PositionIndex,
    ) -> Result<Amount, StakingError> {
        self.guard.ensure_owner(caller)?;
        self.close_and_pay(staker, index, target)
    }

    fn close_and_pay(
        &mut self,
        staker: &Address,
        index: PositionIndex,
        recipient: &Address,
    ) -> Result<Amount, StakingError> {
        self.guard.ensure_not_paused()?;
        let now = self.clock.now();
        let staged = self.ledger.stage_close(staker, index)?;
        let position = staged.position();
        let program_id = position.program_id;
        let payout = compute_payout(
            position.amount,
            self.catalog.get(program_id)?,
            position.elapsed_secs(now),
        )?;

        let mut payments = Vec::with_capacity(2);
        if !payout.amount.is_zero() {
            payments.push((recipient.clone(), payout.amount));
        }
        if let Some(wallet) = self.fine_destination.wallet() {
            if !payout.fine().is_zero() {
                payments.push((wallet.clone(), payout.fine()));
            }
        }
        let outflow = payments
            .iter()
            .try_fold(Amount::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(StakingError::Overflow)?;

        let settled = staged.settle(payout.amount, now)?;

        let available = self.token.reserve_balance();
        if available < outflow {
            tracing::warn!(
                staker = %staker,
                index,
                needed = %outflow,
                %available,
                "withdrawal rejected: pool reserve too low"
            );
            return Err(StakingError::InsufficientReserve {
                needed: outflow.raw(),
                available: available.raw(),
            });
        }

        if !payments.is_empty() {
            self.token.credit_all(&payments)?;
        }
        self.ledger.commit_close(settled);

        tracing::info!(
            staker = %staker,
            recipient = %recipient,
            index,
            program = program_id,
            payout = %payout.amount,
            fine = %payout.fine(),
            matured = payout.is_matured(),
            "withdraw"
        );
        self.events.push(StakingEvent::Withdraw {
            staker: staker.clone(),
            payout: payout.amount,
            program_id,
            index,
        });
        Ok(payout.amount)
    }

    /// Emergency drain: move the whole pool reserve to `target`.
    ///
    /// Ignores open positions and the pause flag.
    pub fn withdraw_all(&mut self, caller: &Address, target: &Address) -> Result<Amount, StakingError> {
        self.guard.ensure_owner(caller)?;
        let reserve = self.token.reserve_balance();
        if !reserve.is_zero() {
            self.token.credit(target, reserve)?;
        }
        tracing::warn!(to = %target, amount = %reserve, "pool reserve swept");
        Ok(reserve)
    }

    /// Move exactly `amount` of the pool reserve to `target`. Ignores the pause flag.
    pub fn withdraw_specified(
        &mut self,
        caller: &Address,
        target: &Address,
        amount: Amount,
    ) -> Result<(), StakingError> {
        self.guard.ensure_owner(caller)?;
        let available = self.token.reserve_balance();
        if available < amount {
            return Err(StakingError::InsufficientReserve {
                needed: amount.raw(),
                available: available.raw(),
            });
        }
        self.token.credit(target, amount)?;
        tracing::info!(to = %target, %amount, "pool reserve withdrawn");
        Ok(())
    }

    // ── Read accessors ─────────────────────────────────────────────────

    pub fn staker(&self, address: &Address) -> StakerAccount {
        self.ledger.account(address)
    }

    pub fn staker_stake_params(
        &self,
        address: &Address,
        index: PositionIndex,
    ) -> Result<&StakePosition, StakingError> {
        self.ledger.position(address, index)
    }

    pub fn staker_positions(&self, address: &Address) -> &[StakePosition] {
        self.ledger.positions(address)
    }

    pub fn stakers_addresses_count(&self) -> usize {
        self.ledger.staker_count()
    }

    pub fn staker_address(&self, i: usize) -> Option<&Address> {
        self.ledger.staker_at(i)
    }

    pub fn stake_type(&self, id: ProgramId) -> Result<&StakeProgram, StakingError> {
        self.catalog.get(id)
    }

    pub fn count_of_stake_types(&self) -> usize {
        self.catalog.count()
    }

    pub fn stake_type_fine_period_and_fine(
        &self,
        id: ProgramId,
        tier_index: usize,
    ) -> Result<(u64, u8), StakingError> {
        self.catalog.fine_period_and_fine(id, tier_index)
    }

    pub fn catalog(&self) -> &ProgramCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &StakerLedger {
        &self.ledger
    }

    pub fn owner(&self) -> &Address {
        self.guard.owner()
    }

    pub fn is_paused(&self) -> bool {
        self.guard.is_paused()
    }

    pub fn is_configured(&self) -> bool {
        self.guard.is_configured()
    }

    pub fn fine_destination(&self) -> &FineDestination {
        &self.fine_destination
    }

    pub fn reserve_balance(&self) -> Amount {
        self.token.reserve_balance()
    }

    /// The audit log, oldest first.
    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }

    /// Hand the audit log to a consumer, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    /// Direct access to the token ledger, e.g. for the owner topping up the pool.
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

const KEY_GUARD: &[u8] = b"guard";
const KEY_CATALOG: &[u8] = b"catalog";
const KEY_LEDGER: &[u8] = b"ledger";
const KEY_FINE_DESTINATION: &[u8] = b"fine_destination";
const KEY_EVENTS: &[u8] = b"events";

fn encode<S: serde::Serialize>(value: &S) -> Result<Vec<u8>, StakingError> {
    bincode::serialize(value).map_err(|e| StakingError::Other(e.to_string()))
}

fn decode<D: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<D, StakingError> {
    bincode::deserialize(bytes).map_err(|e| StakingError::Other(e.to_string()))
}

impl<T: ValueTransfer, C: Clock> StakingEngine<T, C> {
    /// Persist all engine state to a staking store.
    ///
    /// Token balances live in the value-transfer ledger and are not saved.
    pub fn save_to_store(&self, store: &dyn StakingStore) -> Result<(), StakingError> {
        store.put_meta(KEY_GUARD, &encode(&self.guard)?)?;
        store.put_meta(KEY_CATALOG, &encode(&self.catalog)?)?;
        store.put_meta(KEY_LEDGER, &encode(&self.ledger)?)?;
        store.put_meta(KEY_FINE_DESTINATION, &encode(&self.fine_destination)?)?;
        store.put_meta(KEY_EVENTS, &encode(&self.events)?)?;
        Ok(())
    }

    /// Restore engine state from a staking store, reattaching the token
    /// ledger and clock.
    pub fn load_from_store(
        store: &dyn StakingStore,
        token: T,
        clock: C,
    ) -> Result<Self, StakingError> {
        let guard = match store.get_meta(KEY_GUARD)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(StoreError::NotFound("guard".to_string()).into()),
        };
        let catalog = match store.get_meta(KEY_CATALOG)? {
            Some(bytes) => decode(&bytes)?,
            None => ProgramCatalog::default(),
        };
        let ledger = match store.get_meta(KEY_LEDGER)? {
            Some(bytes) => decode(&bytes)?,
            None => StakerLedger::default(),
        };
        let fine_destination = match store.get_meta(KEY_FINE_DESTINATION)? {
            Some(bytes) => decode(&bytes)?,
            None => FineDestination::default(),
        };
        let events = match store.get_meta(KEY_EVENTS)? {
            Some(bytes) => decode(&bytes)?,
            None => Vec::new(),
        };
        Ok(Self {
            guard,
            catalog,
            ledger,
            fine_destination,
            events,
            token,
            clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferError;
    use pledge_types::Timestamp;
    use std::cell::Cell;

    /// Pool that accepts every debit and pays credits from its balance.
    struct OpenPool {
        reserve: u128,
    }

    impl ValueTransfer for OpenPool {
        fn debit(&mut self, _from: &Address, amount: Amount) -> Result<(), TransferError> {
            self.reserve += amount.raw();
            Ok(())
        }

        fn credit(&mut self, _to: &Address, amount: Amount) -> Result<(), TransferError> {
            if amount.raw() > self.reserve {
                return Err(TransferError::InsufficientFunds {
                    needed: amount.raw(),
                    available: self.reserve,
                });
            }
            self.reserve -= amount.raw();
            Ok(())
        }

        fn credit_all(&mut self, payments: &[(Address, Amount)]) -> Result<(), TransferError> {
            let total: u128 = payments.iter().map(|(_, a)| a.raw()).sum();
            self.credit(&Address::new("pool"), Amount::new(total))
        }

        fn reserve_balance(&self) -> Amount {
            Amount::new(self.reserve)
        }
    }

    struct FixedClock(Cell<u64>);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0.get())
        }
    }

    fn owner() -> Address {
        Address::new("owner")
    }

    fn engine() -> StakingEngine<OpenPool, FixedClock> {
        let mut engine = StakingEngine::new(
            owner(),
            OpenPool { reserve: 0 },
            FixedClock(Cell::new(1_000)),
        );
        engine
            .configure_default(&owner(), FineDestination::Pool)
            .unwrap();
        engine
    }

    #[test]
    fn configure_twice_fails() {
        let mut engine = engine();
        assert_eq!(
            engine
                .configure_default(&owner(), FineDestination::Pool)
                .unwrap_err(),
            StakingError::AlreadyConfigured
        );
        assert_eq!(engine.count_of_stake_types(), 3);
    }

    #[test]
    fn configure_by_stranger_leaves_engine_unconfigured() {
        let mut engine = StakingEngine::new(
            owner(),
            OpenPool { reserve: 0 },
            FixedClock(Cell::new(0)),
        );
        let stranger = Address::new("stranger");
        assert!(matches!(
            engine.configure_default(&stranger, FineDestination::Pool),
            Err(StakingError::NotOwner(_))
        ));
        assert!(!engine.is_configured());
        assert_eq!(engine.count_of_stake_types(), 0);
    }

    #[test]
    fn zero_deposit_is_rejected() {
        let mut engine = engine();
        let err = engine
            .deposit(&Address::new("alice"), 0, Amount::ZERO)
            .unwrap_err();
        assert_eq!(err, StakingError::ZeroAmount);
    }

    #[test]
    fn immediate_withdraw_on_single_tier_program_pays_nothing() {
        let mut engine = engine();
        let alice = Address::new("alice");
        let index = engine.deposit(&alice, 0, Amount::new(500)).unwrap();
        assert_eq!(engine.withdraw(&alice, index).unwrap(), Amount::ZERO);
        assert_eq!(engine.reserve_balance(), Amount::new(500));
        assert_eq!(engine.events().len(), 2);
    }

    #[test]
    fn quote_does_not_mutate() {
        let mut engine = engine();
        let alice = Address::new("alice");
        engine.deposit(&alice, 1, Amount::new(100)).unwrap();
        engine.clock().0.set(1_000 + 40 * 86_400);
        let quote = engine.quote(&alice, 0).unwrap();
        assert_eq!(quote.amount, Amount::new(50));
        assert!(!engine.staker_stake_params(&alice, 0).unwrap().closed);
    }
}
