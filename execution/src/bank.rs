//! Value custody boundary between the ledger and its host.
//!
//! The host holds all real value; the ledger only accounts for it. `collect` moves a
//! transaction's attached value into custody before the instruction runs, `transfer` pays
//! custody out, and `refund` returns attached value when an instruction reverts. Refusals
//! are reported as `false` rather than errors: a refused payout is a domain outcome, not
//! an infrastructure failure.

use anyhow::Result;
use commonware_cryptography::ed25519::PublicKey;
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use std::collections::{HashMap, HashSet};

pub trait Bank {
    /// Total value currently held in custody for the ledger.
    fn held(&self) -> impl Future<Output = Result<u64>>;

    /// Debit `amount` from `from` and add it to custody. Returns false (and moves
    /// nothing) if the debit cannot be covered.
    fn collect(&mut self, from: &PublicKey, amount: u64) -> impl Future<Output = Result<bool>>;

    /// Pay `amount` out of custody to `to`. Returns false (and moves nothing) if the
    /// recipient refuses or custody cannot cover it.
    fn transfer(&mut self, to: &PublicKey, amount: u64) -> impl Future<Output = Result<bool>>;

    /// Return previously collected value to `to`. Unconditional: the host guarantees the
    /// revert path of a collected amount always succeeds.
    fn refund(&mut self, to: &PublicKey, amount: u64) -> impl Future<Output = Result<()>>;
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct MockBank {
    held: u64,
    accounts: HashMap<PublicKey, u64>,
    refusing: HashSet<PublicKey>,
}

#[cfg(any(test, feature = "mocks"))]
impl MockBank {
    /// Seed an external account with spendable value.
    pub fn credit(&mut self, public: &PublicKey, amount: u64) {
        let balance = self.accounts.entry(public.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// External balance of `public` (value outside custody).
    pub fn balance(&self, public: &PublicKey) -> u64 {
        self.accounts.get(public).copied().unwrap_or_default()
    }

    /// Make future transfers to `public` fail, like a recipient that rejects payment.
    pub fn refuse(&mut self, public: &PublicKey) {
        self.refusing.insert(public.clone());
    }

    /// Undo a previous [`MockBank::refuse`].
    pub fn accept(&mut self, public: &PublicKey) {
        self.refusing.remove(public);
    }

    /// Grow custody without debiting any account, like value forced in from outside.
    pub fn force_custody(&mut self, amount: u64) {
        self.held = self.held.saturating_add(amount);
    }
}

#[cfg(any(test, feature = "mocks"))]
impl Bank for MockBank {
    async fn held(&self) -> Result<u64> {
        Ok(self.held)
    }

    async fn collect(&mut self, from: &PublicKey, amount: u64) -> Result<bool> {
        if amount == 0 {
            return Ok(true);
        }
        let Some(balance) = self.accounts.get_mut(from) else {
            return Ok(false);
        };
        if *balance < amount {
            return Ok(false);
        }
        *balance -= amount;
        self.held += amount;
        Ok(true)
    }

    async fn transfer(&mut self, to: &PublicKey, amount: u64) -> Result<bool> {
        if self.refusing.contains(to) || self.held < amount {
            return Ok(false);
        }
        self.held -= amount;
        let balance = self.accounts.entry(to.clone()).or_default();
        *balance = balance.saturating_add(amount);
        Ok(true)
    }

    async fn refund(&mut self, to: &PublicKey, amount: u64) -> Result<()> {
        self.held = self.held.saturating_sub(amount);
        let balance = self.accounts.entry(to.clone()).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}
