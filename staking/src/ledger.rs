//! The staker ledger: positions per staker plus their running totals.
//!
//! Every mutation goes through a stage/commit pair. Staging validates and does
//! all checked arithmetic on copies of the one position and the one account it
//! touches; committing writes them back and cannot fail. The engine moves
//! tokens between the two steps, so a rejected transfer leaves the ledger
//! untouched. A staged change must be committed against the ledger it was
//! staged from, with no other commit in between.

use crate::error::StakingError;
use crate::position::{PositionIndex, StakePosition, StakerAccount};
use crate::program::ProgramId;
use pledge_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StakerRecord {
    account: StakerAccount,
    positions: Vec<StakePosition>,
}

impl StakerRecord {
    fn new(address: Address) -> Self {
        Self {
            account: StakerAccount::empty(address),
            positions: Vec::new(),
        }
    }
}

/// A validated deposit waiting to be committed.
#[must_use]
#[derive(Debug)]
pub struct StagedOpen {
    account: StakerAccount,
    position: StakePosition,
    first_deposit: bool,
}

/// An open position picked for closing, before its payout is known.
#[must_use]
#[derive(Debug)]
pub struct StagedClose {
    account: StakerAccount,
    position: StakePosition,
}

impl StagedClose {
    /// The position as it stands before closing.
    pub fn position(&self) -> &StakePosition {
        &self.position
    }

    /// Fix the payout and close time, checking the staker's new total.
    pub fn settle(mut self, payout: Amount, now: Timestamp) -> Result<SettledClose, StakingError> {
        self.account.total_after = self
            .account
            .total_after
            .checked_add(payout)
            .ok_or(StakingError::Overflow)?;
        self.position.closed = true;
        self.position.finished_time = now;
        self.position.amount_after = payout;
        Ok(SettledClose {
            account: self.account,
            position: self.position,
        })
    }
}

/// A close with its payout fixed, waiting to be committed.
#[must_use]
#[derive(Debug)]
pub struct SettledClose {
    account: StakerAccount,
    position: StakePosition,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StakerLedger {
    stakers: HashMap<Address, StakerRecord>,
    /// Stakers in order of first deposit.
    order: Vec<Address>,
}

impl StakerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a new position for `staker` without touching the ledger.
    pub fn stage_open(
        &self,
        staker: &Address,
        program_id: ProgramId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<StagedOpen, StakingError> {
        let (mut account, first_deposit) = match self.stakers.get(staker) {
            Some(record) => (record.account.clone(), false),
            None => (StakerAccount::empty(staker.clone()), true),
        };
        let index = account.position_count;
        account.position_count = index.checked_add(1).ok_or(StakingError::Overflow)?;
        account.total_deposited = account
            .total_deposited
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        account.exists = true;
        Ok(StagedOpen {
            account,
            position: StakePosition::open(staker.clone(), index, program_id, amount, now),
            first_deposit,
        })
    }

    pub fn commit_open(&mut self, staged: StagedOpen) -> PositionIndex {
        let address = staged.account.address.clone();
        let index = staged.position.index;
        if staged.first_deposit {
            self.order.push(address.clone());
        }
        let record = self
            .stakers
            .entry(address)
            .or_insert_with_key(|a| StakerRecord::new(a.clone()));
        record.account = staged.account;
        record.positions.push(staged.position);
        index
    }

    /// Pick position `index` of `staker` for closing; it must exist and be open.
    pub fn stage_close(
        &self,
        staker: &Address,
        index: PositionIndex,
    ) -> Result<StagedClose, StakingError> {
        let not_found = || StakingError::PositionNotFound {
            staker: staker.clone(),
            index,
        };
        let record = self.stakers.get(staker).ok_or_else(not_found)?;
        let position = record.positions.get(index as usize).ok_or_else(not_found)?;
        if position.closed {
            return Err(StakingError::AlreadyClosed {
                staker: staker.clone(),
                index,
            });
        }
        Ok(StagedClose {
            account: record.account.clone(),
            position: position.clone(),
        })
    }

    pub fn commit_close(&mut self, settled: SettledClose) {
        let Some(record) = self.stakers.get_mut(&settled.account.address) else {
            return;
        };
        if let Some(slot) = record.positions.get_mut(settled.position.index as usize) {
            *slot = settled.position;
            record.account = settled.account;
        }
    }

    /// Stage and commit a new position in one step.
    #[cfg(test)]
    pub(crate) fn open_position(
        &mut self,
        staker: &Address,
        program_id: ProgramId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<PositionIndex, StakingError> {
        let staged = self.stage_open(staker, program_id, amount, now)?;
        Ok(self.commit_open(staged))
    }

    /// Stage, settle and commit a close in one step.
    #[cfg(test)]
    pub(crate) fn close_position(
        &mut self,
        staker: &Address,
        index: PositionIndex,
        payout: Amount,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        let settled = self.stage_close(staker, index)?.settle(payout, now)?;
        self.commit_close(settled);
        Ok(())
    }

    /// The staker's totals; a zeroed account for addresses that never deposited.
    pub fn account(&self, staker: &Address) -> StakerAccount {
        self.stakers
            .get(staker)
            .map(|r| r.account.clone())
            .unwrap_or_else(|| StakerAccount::empty(staker.clone()))
    }

    pub fn position(
        &self,
        staker: &Address,
        index: PositionIndex,
    ) -> Result<&StakePosition, StakingError> {
        self.stakers
            .get(staker)
            .and_then(|r| r.positions.get(index as usize))
            .ok_or_else(|| StakingError::PositionNotFound {
                staker: staker.clone(),
                index,
            })
    }

    /// All positions of a staker, oldest first.
    pub fn positions(&self, staker: &Address) -> &[StakePosition] {
        self.stakers
            .get(staker)
            .map(|r| r.positions.as_slice())
            .unwrap_or(&[])
    }

    pub fn staker_count(&self) -> usize {
        self.order.len()
    }

    /// The `i`-th staker by order of first deposit.
    pub fn staker_at(&self, i: usize) -> Option<&Address> {
        self.order.get(i)
    }

    /// Check every staker's totals against its position list.
    pub fn is_consistent(&self) -> bool {
        self.stakers.values().all(|record| {
            let deposited = record
                .positions
                .iter()
                .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.amount));
            let after = record
                .positions
                .iter()
                .filter(|p| p.closed)
                .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.amount_after));
            record.account.exists == !record.positions.is_empty()
                && record.account.position_count as usize == record.positions.len()
                && deposited == Some(record.account.total_deposited)
                && after == Some(record.account.total_after)
                && record
                    .positions
                    .iter()
                    .enumerate()
                    .all(|(i, p)| p.index as usize == i && p.owner == record.account.address)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("alice")
    }

    #[test]
    fn first_deposit_creates_account() {
        let mut ledger = StakerLedger::new();
        let idx = ledger
            .open_position(&alice(), 0, Amount::new(100), Timestamp::new(10))
            .unwrap();
        assert_eq!(idx, 0);
        let account = ledger.account(&alice());
        assert!(account.exists);
        assert_eq!(account.position_count, 1);
        assert_eq!(account.total_deposited, Amount::new(100));
        assert_eq!(account.total_after, Amount::ZERO);
        assert_eq!(ledger.staker_count(), 1);
        assert_eq!(ledger.staker_at(0), Some(&alice()));

        let position = ledger.position(&alice(), 0).unwrap();
        assert!(!position.closed);
        assert_eq!(position.start_time, Timestamp::new(10));
        assert!(position.finished_time.is_epoch());
    }

    #[test]
    fn indices_are_sequential_and_stakers_listed_once() {
        let mut ledger = StakerLedger::new();
        for expected in 0..3 {
            let idx = ledger
                .open_position(&alice(), 1, Amount::new(5), Timestamp::new(1))
                .unwrap();
            assert_eq!(idx, expected);
        }
        assert_eq!(ledger.staker_count(), 1);
        assert_eq!(ledger.positions(&alice()).len(), 3);
        assert_eq!(ledger.account(&alice()).total_deposited, Amount::new(15));
    }

    #[test]
    fn close_sets_terminal_fields() {
        let mut ledger = StakerLedger::new();
        ledger
            .open_position(&alice(), 0, Amount::new(100), Timestamp::new(10))
            .unwrap();
        ledger
            .close_position(&alice(), 0, Amount::new(40), Timestamp::new(99))
            .unwrap();
        let position = ledger.position(&alice(), 0).unwrap();
        assert!(position.closed);
        assert_eq!(position.finished_time, Timestamp::new(99));
        assert_eq!(position.amount_after, Amount::new(40));
        assert_eq!(ledger.account(&alice()).total_after, Amount::new(40));
        assert!(ledger.is_consistent());
    }

    #[test]
    fn second_close_is_rejected_without_change() {
        let mut ledger = StakerLedger::new();
        ledger
            .open_position(&alice(), 0, Amount::new(100), Timestamp::new(10))
            .unwrap();
        ledger
            .close_position(&alice(), 0, Amount::new(40), Timestamp::new(99))
            .unwrap();
        let err = ledger
            .close_position(&alice(), 0, Amount::new(70), Timestamp::new(200))
            .unwrap_err();
        assert_eq!(
            err,
            StakingError::AlreadyClosed {
                staker: alice(),
                index: 0
            }
        );
        assert_eq!(ledger.account(&alice()).total_after, Amount::new(40));
        assert_eq!(
            ledger.position(&alice(), 0).unwrap().finished_time,
            Timestamp::new(99)
        );
    }

    #[test]
    fn missing_positions_are_not_found() {
        let mut ledger = StakerLedger::new();
        assert!(matches!(
            ledger.close_position(&alice(), 0, Amount::ZERO, Timestamp::new(1)),
            Err(StakingError::PositionNotFound { .. })
        ));
        ledger
            .open_position(&alice(), 0, Amount::new(1), Timestamp::new(1))
            .unwrap();
        assert!(matches!(
            ledger.position(&alice(), 1),
            Err(StakingError::PositionNotFound { index: 1, .. })
        ));
    }

    #[test]
    fn dropped_stage_leaves_ledger_untouched() {
        let mut ledger = StakerLedger::new();
        let staged = ledger
            .stage_open(&alice(), 0, Amount::new(100), Timestamp::new(10))
            .unwrap();
        drop(staged);
        assert!(!ledger.account(&alice()).exists);
        assert_eq!(ledger.staker_count(), 0);

        ledger
            .open_position(&alice(), 0, Amount::new(100), Timestamp::new(10))
            .unwrap();
        let staged = ledger.stage_close(&alice(), 0).unwrap();
        assert!(!staged.position().closed);
        let settled = staged.settle(Amount::new(1), Timestamp::new(20)).unwrap();
        drop(settled);
        assert!(!ledger.position(&alice(), 0).unwrap().closed);
        assert_eq!(ledger.account(&alice()).total_after, Amount::ZERO);
    }

    #[test]
    fn total_overflow_is_rejected() {
        let mut ledger = StakerLedger::new();
        ledger
            .open_position(&alice(), 0, Amount::new(u128::MAX), Timestamp::new(1))
            .unwrap();
        let err = ledger
            .open_position(&alice(), 0, Amount::new(1), Timestamp::new(1))
            .unwrap_err();
        assert_eq!(err, StakingError::Overflow);
        assert_eq!(ledger.account(&alice()).position_count, 1);
    }

    #[test]
    fn settle_rejects_total_overflow() {
        let mut ledger = StakerLedger::new();
        ledger
            .open_position(&alice(), 0, Amount::new(1), Timestamp::new(1))
            .unwrap();
        ledger
            .open_position(&alice(), 0, Amount::new(1), Timestamp::new(1))
            .unwrap();
        ledger
            .close_position(&alice(), 0, Amount::new(u128::MAX), Timestamp::new(2))
            .unwrap();
        let err = ledger
            .close_position(&alice(), 1, Amount::new(1), Timestamp::new(3))
            .unwrap_err();
        assert_eq!(err, StakingError::Overflow);
        assert!(!ledger.position(&alice(), 1).unwrap().closed);
        assert!(ledger.is_consistent());
    }

    #[test]
    fn unknown_address_has_empty_account() {
        let ledger = StakerLedger::new();
        let account = ledger.account(&alice());
        assert!(!account.exists);
        assert_eq!(account.position_count, 0);
        assert!(ledger.positions(&alice()).is_empty());
    }
}
