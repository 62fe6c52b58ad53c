use tracing::debug;

use crate::{
    Account, AccountId, AccountKind, AccountPatch, EngineError, Money, ResultEngine,
    store::{BlobKey, BlobStore},
    util::{name_key, normalize_account_name, now_millis, unique_name_key},
};

use super::Engine;

impl<S: BlobStore> Engine<S> {
    /// Return an account snapshot.
    pub fn account(&self, id: &AccountId) -> ResultEngine<&Account> {
        self.ledger
            .accounts
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Finds an account by name, ignoring case, accents and spacing.
    ///
    /// When accents are all that tells two accounts apart, the one spelled
    /// like `name` wins.
    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        let exact = unique_name_key(name);
        let key = name_key(name);
        let mut accounts = self.ledger.accounts.values();
        accounts
            .clone()
            .find(|account| unique_name_key(&account.name) == exact)
            .or_else(|| accounts.find(|account| name_key(&account.name) == key))
    }

    /// All accounts, oldest first.
    pub fn accounts_list(&self) -> Vec<&Account> {
        let mut out: Vec<&Account> = self.ledger.accounts.values().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn total_balance(&self) -> Money {
        self.ledger.accounts.values().map(|a| a.balance).sum()
    }

    /// Same figure as [`Engine::total_balance`], as reported in backups.
    pub fn net_worth(&self) -> Money {
        self.total_balance()
    }

    pub(crate) fn ensure_unique_name(
        &self,
        name: &str,
        except: Option<&AccountId>,
    ) -> ResultEngine<()> {
        let key = unique_name_key(name);
        let taken = self
            .ledger
            .accounts
            .values()
            .any(|a| Some(&a.id) != except && unique_name_key(&a.name) == key);
        if taken {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Add a new account with its opening balance.
    pub async fn add_account(
        &mut self,
        name: &str,
        kind: AccountKind,
        initial_balance: Money,
    ) -> ResultEngine<AccountId> {
        let name = normalize_account_name(name)?;
        self.ensure_unique_name(&name, None)?;

        let account = Account::new(name, kind, initial_balance, now_millis());
        let id = account.id.clone();
        debug!(account = %id, kind = %kind, "account added");
        self.ledger.accounts.insert(id.clone(), account);

        self.flush(&[BlobKey::Accounts]).await;
        Ok(id)
    }

    /// Shallow merge of `patch` onto an existing account.
    pub async fn update_account(
        &mut self,
        id: &AccountId,
        patch: AccountPatch,
    ) -> ResultEngine<Account> {
        let mut updated = self.account(id)?.clone();

        if let Some(name) = &patch.name {
            let name = normalize_account_name(name)?;
            self.ensure_unique_name(&name, Some(id))?;
            updated.name = name;
        }
        if let Some(kind) = patch.kind {
            updated.kind = kind;
        }
        if let Some(balance) = patch.balance {
            updated.balance = balance;
        }

        debug!(account = %id, "account updated");
        self.ledger.accounts.insert(id.clone(), updated.clone());
        self.flush(&[BlobKey::Accounts]).await;
        Ok(updated)
    }

    /// Removes an account no transaction references.
    pub async fn delete_account(&mut self, id: &AccountId) -> ResultEngine<()> {
        self.account(id)?;
        let in_use = self
            .ledger
            .transactions
            .iter()
            .filter(|tx| tx.references(id))
            .count();
        if in_use > 0 {
            return Err(EngineError::AccountInUse(format!(
                "{id} is referenced by {in_use} transaction(s)"
            )));
        }

        self.ledger.accounts.remove(id);
        debug!(account = %id, "account deleted");
        self.flush(&[BlobKey::Accounts]).await;
        Ok(())
    }
}
