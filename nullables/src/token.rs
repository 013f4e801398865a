//! Nullable token ledger: in-memory balances and allowances.

use pledge_staking::{TransferError, ValueTransfer};
use pledge_types::{Address, Amount};
use std::collections::{HashMap, HashSet};

/// An in-memory token ledger with one designated pool account.
///
/// Mirrors allowance-based token semantics: stakers `approve` the pool, the
/// pool pulls deposits with `debit`, and pays out with `credit`. Every
/// operation checks before it mutates, so a failed call changes nothing.
pub struct NullTokenLedger {
    pool: Address,
    balances: HashMap<Address, u128>,
    /// Allowance each holder has granted the pool.
    allowances: HashMap<Address, u128>,
    /// Recipients whose incoming credits are refused.
    blocked: HashSet<Address>,
}

impl NullTokenLedger {
    pub fn new(pool: Address) -> Self {
        Self {
            pool,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            blocked: HashSet::new(),
        }
    }

    pub fn pool(&self) -> &Address {
        &self.pool
    }

    /// Create `amount` new tokens in `to`'s balance.
    pub fn mint(&mut self, to: &Address, amount: Amount) {
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = balance.saturating_add(amount.raw());
    }

    /// Set the allowance `holder` grants the pool.
    pub fn approve(&mut self, holder: &Address, amount: Amount) {
        self.allowances.insert(holder.clone(), amount.raw());
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        Amount::new(self.balances.get(holder).copied().unwrap_or(0))
    }

    pub fn allowance(&self, holder: &Address) -> Amount {
        Amount::new(self.allowances.get(holder).copied().unwrap_or(0))
    }

    pub fn total_supply(&self) -> Amount {
        Amount::new(self.balances.values().sum())
    }

    /// Refuse all future credits to `recipient`.
    pub fn block_recipient(&mut self, recipient: &Address) {
        self.blocked.insert(recipient.clone());
    }

    pub fn unblock_recipient(&mut self, recipient: &Address) {
        self.blocked.remove(recipient);
    }

    /// Plain transfer between two holders, e.g. topping up the pool.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if self.blocked.contains(to) {
            return Err(TransferError::Backend(format!("recipient {to} is blocked")));
        }
        let available = self.balance_of(from).raw();
        if available < amount.raw() {
            return Err(TransferError::InsufficientFunds {
                needed: amount.raw(),
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        self.balances.insert(from.clone(), available - amount.raw());
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = balance.saturating_add(amount.raw());
        Ok(())
    }
}

impl ValueTransfer for NullTokenLedger {
    fn debit(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        let allowed = self.allowance(from).raw();
        if allowed < amount.raw() {
            return Err(TransferError::InsufficientAllowance {
                needed: amount.raw(),
                allowed,
            });
        }
        let pool = self.pool.clone();
        self.transfer(from, &pool, amount)?;
        self.allowances.insert(from.clone(), allowed - amount.raw());
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let pool = self.pool.clone();
        self.transfer(&pool, to, amount)
    }

    fn credit_all(&mut self, payments: &[(Address, Amount)]) -> Result<(), TransferError> {
        if let Some((to, _)) = payments.iter().find(|(to, _)| self.blocked.contains(to)) {
            return Err(TransferError::Backend(format!("recipient {to} is blocked")));
        }
        let needed = payments
            .iter()
            .try_fold(0u128, |acc, (_, amount)| acc.checked_add(amount.raw()))
            .ok_or_else(|| TransferError::Backend("payment total overflows".to_string()))?;
        let available = self.reserve_balance().raw();
        if available < needed {
            return Err(TransferError::InsufficientFunds { needed, available });
        }
        let pool = self.pool.clone();
        for (to, amount) in payments {
            self.transfer(&pool, to, *amount)?;
        }
        Ok(())
    }

    fn reserve_balance(&self) -> Amount {
        self.balance_of(&self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> NullTokenLedger {
        NullTokenLedger::new(Address::new("pool"))
    }

    #[test]
    fn debit_requires_allowance() {
        let mut token = ledger();
        let alice = Address::new("alice");
        token.mint(&alice, Amount::new(1_000));
        let err = token.debit(&alice, Amount::new(100)).unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientAllowance {
                needed: 100,
                allowed: 0
            }
        );
        token.approve(&alice, Amount::new(50));
        assert!(token.debit(&alice, Amount::new(100)).is_err());
        assert_eq!(token.balance_of(&alice), Amount::new(1_000));
    }

    #[test]
    fn debit_spends_allowance_and_moves_funds() {
        let mut token = ledger();
        let alice = Address::new("alice");
        token.mint(&alice, Amount::new(1_000));
        token.approve(&alice, Amount::new(300));
        token.debit(&alice, Amount::new(100)).unwrap();
        assert_eq!(token.balance_of(&alice), Amount::new(900));
        assert_eq!(token.reserve_balance(), Amount::new(100));
        assert_eq!(token.allowance(&alice), Amount::new(200));
    }

    #[test]
    fn debit_beyond_balance_keeps_allowance() {
        let mut token = ledger();
        let alice = Address::new("alice");
        token.mint(&alice, Amount::new(10));
        token.approve(&alice, Amount::new(300));
        let err = token.debit(&alice, Amount::new(100)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds { .. }));
        assert_eq!(token.allowance(&alice), Amount::new(300));
    }

    #[test]
    fn credit_pays_from_pool() {
        let mut token = ledger();
        let bob = Address::new("bob");
        token.mint(&Address::new("pool"), Amount::new(40));
        assert!(token.credit(&bob, Amount::new(50)).is_err());
        token.credit(&bob, Amount::new(40)).unwrap();
        assert_eq!(token.balance_of(&bob), Amount::new(40));
        assert_eq!(token.reserve_balance(), Amount::ZERO);
        assert_eq!(token.total_supply(), Amount::new(40));
    }

    #[test]
    fn credit_all_is_all_or_nothing() {
        let mut token = ledger();
        let bob = Address::new("bob");
        let treasury = Address::new("treasury");
        token.mint(&Address::new("pool"), Amount::new(100));
        token.block_recipient(&treasury);
        let payments = [(bob.clone(), Amount::new(60)), (treasury.clone(), Amount::new(40))];

        assert!(matches!(
            token.credit_all(&payments),
            Err(TransferError::Backend(_))
        ));
        assert_eq!(token.balance_of(&bob), Amount::ZERO);
        assert_eq!(token.reserve_balance(), Amount::new(100));

        token.unblock_recipient(&treasury);
        let too_much = [(bob.clone(), Amount::new(60)), (treasury.clone(), Amount::new(41))];
        assert_eq!(
            token.credit_all(&too_much),
            Err(TransferError::InsufficientFunds {
                needed: 101,
                available: 100
            })
        );
        assert_eq!(token.balance_of(&bob), Amount::ZERO);

        token.credit_all(&payments).unwrap();
        assert_eq!(token.balance_of(&bob), Amount::new(60));
        assert_eq!(token.balance_of(&treasury), Amount::new(40));
        assert_eq!(token.reserve_balance(), Amount::ZERO);
    }

    #[test]
    fn blocked_recipient_refuses_credit() {
        let mut token = ledger();
        let bob = Address::new("bob");
        token.mint(&Address::new("pool"), Amount::new(40));
        token.block_recipient(&bob);
        assert!(matches!(
            token.credit(&bob, Amount::new(1)),
            Err(TransferError::Backend(_))
        ));
        token.unblock_recipient(&bob);
        token.credit(&bob, Amount::new(1)).unwrap();
    }
}
