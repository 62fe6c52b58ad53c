use std::{collections::HashSet, time::Instant};

use chrono::Duration;
use tracing::{debug, info};

use crate::{
    Account, AccountKind, EngineError, Money, Profile, ProfileUpdate, ResultEngine,
    pin::verify_pin,
    store::{BlobKey, BlobStore},
    util::{normalize_account_name, now_millis, unique_name_key},
};

use super::Engine;

/// Account created by [`Engine::complete_setup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpeningAccount {
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
}

impl OpeningAccount {
    pub fn new(name: impl Into<String>, kind: AccountKind, balance: Money) -> Self {
        Self {
            name: name.into(),
            kind,
            balance,
        }
    }

    /// The `Cash` and `Bank` pair every new ledger starts with.
    pub fn defaults(cash: Money, bank: Money) -> Vec<Self> {
        vec![
            Self::new("Cash", AccountKind::Cash, cash),
            Self::new("Bank", AccountKind::Bank, bank),
        ]
    }
}

impl<S: BlobStore> Engine<S> {
    pub fn profile(&self) -> &Profile {
        &self.ledger.profile
    }

    /// Validates and applies a profile update. Without a new PIN the stored
    /// verifier is kept.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> ResultEngine<&Profile> {
        let updated = update.apply_to(&self.ledger.profile)?;
        self.ledger.profile = updated;
        debug!("profile updated");
        self.flush(&[BlobKey::Profile]).await;
        Ok(&self.ledger.profile)
    }

    pub async fn remove_pin(&mut self) {
        self.ledger.profile.pin = None;
        self.authenticated_at = None;
        info!("pin removed");
        self.flush(&[BlobKey::Profile]).await;
    }

    /// First run: stores the profile, marks setup as complete and creates the
    /// opening accounts (`Cash` and `Bank` when `accounts` is empty).
    pub async fn complete_setup(
        &mut self,
        update: ProfileUpdate,
        accounts: Vec<OpeningAccount>,
    ) -> ResultEngine<()> {
        let profile = update.setup_complete(true).apply_to(&self.ledger.profile)?;
        let accounts = if accounts.is_empty() {
            OpeningAccount::defaults(Money::ZERO, Money::ZERO)
        } else {
            accounts
        };

        let mut seen = HashSet::new();
        let mut created = Vec::with_capacity(accounts.len());
        // Distinct timestamps keep the opening order.
        let start = now_millis();
        for (offset, opening) in (0_i64..).zip(accounts) {
            let name = normalize_account_name(&opening.name)?;
            self.ensure_unique_name(&name, None)?;
            if !seen.insert(unique_name_key(&name)) {
                return Err(EngineError::DuplicateName(name));
            }
            created.push(Account::new(
                name,
                opening.kind,
                opening.balance,
                start + Duration::milliseconds(offset),
            ));
        }

        self.ledger.profile = profile;
        for account in created {
            self.ledger.accounts.insert(account.id.clone(), account);
        }
        info!(accounts = self.ledger.accounts.len(), "setup completed");
        self.flush(&[BlobKey::Profile, BlobKey::Accounts]).await;
        Ok(())
    }

    /// Checks `pin` against the stored verifier.
    ///
    /// Never fails: a missing verifier or a mismatch is `false`. On success
    /// the session stays open for the configured TTL.
    pub fn authenticate(&mut self, pin: &str) -> bool {
        let ok = self
            .ledger
            .profile
            .pin
            .as_deref()
            .is_some_and(|verifier| verify_pin(pin, verifier));
        if ok {
            self.authenticated_at = Some(Instant::now());
        }
        debug!(success = ok, "authentication attempt");
        ok
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated_at
            .is_some_and(|at| at.elapsed() < self.session_ttl)
    }

    /// Closes the session.
    pub fn lock(&mut self) {
        self.authenticated_at = None;
    }
}
