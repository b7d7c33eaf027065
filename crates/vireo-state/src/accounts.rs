//! Account balance ledger.
//!
//! A thin CRUD view over owner→token-amount cells. This is bookkeeping
//! for the layers above consensus; header validation never touches it.

use crate::error::StateError;
use crate::store::{BalanceKey, BalanceStore};
use vireo_core::{Amount, KeyId, TokenAmount, TokenId};

/// Balance ledger over a pluggable storage backing.
pub struct Accounts<S: BalanceStore> {
    store: S,
}

impl<S: BalanceStore> Accounts<S> {
    /// Wrap a storage backing.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Balance an owner holds in one token (zero when absent).
    pub fn get_balance(&self, owner: &KeyId, token: TokenId) -> Result<TokenAmount, StateError> {
        let amount = self
            .store
            .get(&BalanceKey { owner: *owner, token })?
            .unwrap_or(Amount::zero());
        Ok(TokenAmount { token, amount })
    }

    /// Credit an owner. Crediting zero is a no-op.
    pub fn add_balance(&mut self, owner: &KeyId, value: TokenAmount) -> Result<(), StateError> {
        if value.amount == Amount::zero() {
            return Ok(());
        }
        let current = self.get_balance(owner, value.token)?.amount;
        let updated = current
            .checked_add(value.amount)
            .map_err(|_| StateError::AmountOverflow)?;
        self.set_balance(owner, TokenAmount { token: value.token, amount: updated })
    }

    /// Debit an owner; fails when the balance does not cover the amount.
    pub fn sub_balance(&mut self, owner: &KeyId, value: TokenAmount) -> Result<(), StateError> {
        if value.amount == Amount::zero() {
            return Ok(());
        }
        let current = self.get_balance(owner, value.token)?.amount;
        if current < value.amount {
            return Err(StateError::InsufficientBalance);
        }
        let updated = current
            .checked_sub(value.amount)
            .map_err(|_| StateError::AmountOverflow)?;
        self.set_balance(owner, TokenAmount { token: value.token, amount: updated })
    }

    /// Visit every balance in key order; stop when the callback returns `false`.
    pub fn for_each_balance(
        &self,
        mut f: impl FnMut(&KeyId, TokenAmount) -> bool,
    ) -> Result<(), StateError> {
        self.store.for_each(&mut |key, amount| {
            f(&key.owner, TokenAmount { token: key.token, amount })
        })
    }

    // Zero balances are erased rather than stored, keeping scans and
    // storage proportional to funded cells.
    fn set_balance(&mut self, owner: &KeyId, value: TokenAmount) -> Result<(), StateError> {
        let key = BalanceKey { owner: *owner, token: value.token };
        if value.amount == Amount::zero() {
            self.store.erase(&key)
        } else {
            self.store.set(key, value.amount)
        }
    }
}
