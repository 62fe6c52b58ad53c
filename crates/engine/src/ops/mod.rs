use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::{
    Account, AccountId, EngineError, Money, Profile, ResultEngine, Transaction,
    backup::{AccountsDocument, legacy},
    store::{BlobKey, BlobStore},
    util::now_millis,
};

mod accounts;
mod backup;
mod profile;
mod stats;
mod transactions;

pub use profile::OpeningAccount;

/// Default lifetime of a successful `authenticate`.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// In-memory ledger state.
#[derive(Clone, Debug, Default)]
pub(crate) struct Ledger {
    pub(crate) profile: Profile,
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) transactions: Vec<Transaction>,
}

/// The ledger engine.
///
/// Owns the profile, the accounts and the transactions. Every mutation is
/// applied to the in-memory state first and then flushed to the store; a
/// failed flush is logged and the in-memory state stands.
#[derive(Debug)]
pub struct Engine<S: BlobStore> {
    store: S,
    ledger: Ledger,
    session_ttl: Duration,
    authenticated_at: Option<Instant>,
}

impl<S: BlobStore> Engine<S> {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder<S> {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Net effect of the transaction log on each account.
    ///
    /// `balance - effect` is the opening balance of an account; it does not
    /// move when transactions are edited or deleted.
    pub fn balance_effects(&self) -> BTreeMap<AccountId, Money> {
        let mut out: BTreeMap<AccountId, Money> = BTreeMap::new();
        for tx in &self.ledger.transactions {
            for (account, delta) in tx.effects() {
                *out.entry(account.clone()).or_default() += delta;
            }
        }
        out
    }

    /// Wipes the store and resets every piece of state, session included.
    pub async fn clear_all(&mut self) -> ResultEngine<()> {
        self.ledger = Ledger::default();
        self.authenticated_at = None;
        self.store.clear().await?;
        info!("ledger cleared");
        Ok(())
    }

    async fn load(&mut self) {
        let profile: Option<Profile> = self.read_blob(BlobKey::Profile).await;
        let accounts: Option<AccountsDocument> = self.read_blob(BlobKey::Accounts).await;
        let transactions: Option<Vec<Transaction>> = self.read_blob(BlobKey::Transactions).await;

        self.ledger.profile = profile.unwrap_or_default();
        let rebuilt = legacy::rebuild(
            accounts.unwrap_or_default(),
            transactions.unwrap_or_default(),
            now_millis(),
        );
        self.ledger.accounts = rebuilt.accounts;
        self.ledger.transactions = rebuilt.transactions;

        if rebuilt.migrated {
            info!("legacy accounts migrated, writing back");
            self.flush(&[BlobKey::Accounts, BlobKey::Transactions]).await;
        }

        info!(
            accounts = self.ledger.accounts.len(),
            transactions = self.ledger.transactions.len(),
            "ledger loaded"
        );
    }

    /// Reads and parses one blob. A failed read or unparseable content is
    /// logged and the blob falls back to its default.
    async fn read_blob<T: DeserializeOwned>(&self, key: BlobKey) -> Option<T> {
        let text = match self.store.get(key).await {
            Ok(text) => text?,
            Err(err) => {
                error!(blob = %key, %err, "failed to read blob, using defaults");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(blob = %key, %err, "unreadable blob, using defaults");
                None
            }
        }
    }

    fn encode_blob(&self, key: BlobKey) -> ResultEngine<String> {
        let text = match key {
            BlobKey::Profile => serde_json::to_string(&self.ledger.profile)?,
            BlobKey::Accounts => serde_json::to_string(&self.ledger.accounts)?,
            BlobKey::Transactions => serde_json::to_string(&self.ledger.transactions)?,
        };
        Ok(text)
    }

    /// Writes the given blobs. Failures are logged, never returned.
    pub(crate) async fn flush(&self, keys: &[BlobKey]) {
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.encode_blob(*key) {
                Ok(text) => entries.push((*key, text)),
                Err(err) => {
                    error!(blob = %key, %err, "failed to encode ledger state");
                    return;
                }
            }
        }

        let result = match entries.len() {
            0 => Ok(()),
            1 => {
                let (key, text) = entries.remove(0);
                self.store.set(key, text).await
            }
            _ => self.store.set_many(entries).await,
        };
        if let Err(err) = result {
            error!(blobs = ?keys, %err, "failed to persist ledger state");
        }
    }

    pub(crate) fn account_ref(&self, id: &AccountId) -> ResultEngine<&Account> {
        self.ledger
            .accounts
            .get(id)
            .ok_or_else(|| EngineError::AccountNotFound(id.to_string()))
    }

    /// Adds `sign * effect` of `tx` to the referenced balances. References to
    /// unknown accounts (possible after an import) are skipped.
    pub(crate) fn apply_effects(&mut self, tx: &Transaction, reverse: bool) {
        for (account_id, delta) in tx.effects() {
            let delta = if reverse { -delta } else { delta };
            match self.ledger.accounts.get_mut(account_id) {
                Some(account) => account.apply_change(delta),
                None => warn!(
                    transaction = %tx.id,
                    account = %account_id,
                    "balance effect on unknown account skipped"
                ),
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Debug)]
pub struct EngineBuilder<S> {
    store: Option<S>,
    session_ttl: Duration,
}

impl<S> Default for EngineBuilder<S> {
    fn default() -> Self {
        Self {
            store: None,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl<S: BlobStore> EngineBuilder<S> {
    /// Pass the required store
    pub fn store(mut self, store: S) -> EngineBuilder<S> {
        self.store = Some(store);
        self
    }

    /// How long a successful `authenticate` keeps the session open.
    pub fn session_ttl(mut self, ttl: Duration) -> EngineBuilder<S> {
        self.session_ttl = ttl;
        self
    }

    /// Construct `Engine` and load the persisted state.
    pub async fn build(self) -> ResultEngine<Engine<S>> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Store("missing store".to_string()))?;
        let mut engine = Engine {
            store,
            ledger: Ledger::default(),
            session_ttl: self.session_ttl,
            authenticated_at: None,
        };
        engine.load().await;
        Ok(engine)
    }
}
