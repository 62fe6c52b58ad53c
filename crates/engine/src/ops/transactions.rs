use tracing::debug;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionDraft, TransactionId, TransactionKind,
    TransactionPatch,
    stats::TransactionFilter,
    store::{BlobKey, BlobStore},
    util::{normalize_optional_text, now_millis},
};

use super::Engine;

impl<S: BlobStore> Engine<S> {
    /// Return a transaction snapshot.
    pub fn transaction(&self, id: &TransactionId) -> ResultEngine<&Transaction> {
        self.ledger
            .transactions
            .iter()
            .find(|tx| &tx.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.ledger.transactions
    }

    /// History view: newest date first, then newest creation.
    pub fn list_transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut out: Vec<&Transaction> = self
            .ledger
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .collect();
        out.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        out
    }

    /// Records a transaction and applies its balance effect.
    ///
    /// Fails without touching any state when the draft is invalid:
    /// - [`EngineError::InvalidAmount`] for a non positive amount;
    /// - [`EngineError::InvalidTransaction`] for a missing category,
    ///   counterparty or destination, or a destination on a non transfer;
    /// - [`EngineError::AccountNotFound`] for an unknown account;
    /// - [`EngineError::InsufficientFunds`] for a transfer larger than the
    ///   source balance (credit accounts excepted).
    pub async fn add_transaction(&mut self, draft: TransactionDraft) -> ResultEngine<TransactionId> {
        if draft.kind != TransactionKind::Transfer && draft.to_account.is_some() {
            return Err(EngineError::InvalidTransaction(format!(
                "{} transactions have no destination account",
                draft.kind
            )));
        }

        let tx = Transaction {
            id: TransactionId::generate(),
            kind: draft.kind,
            category: draft.category,
            amount: draft.amount,
            account: draft.account,
            to_account: draft.to_account,
            date: draft.date,
            notes: draft.notes,
            settled: false,
            created_at: now_millis(),
            counterparty: draft.counterparty,
        };
        let tx = self.prepare(tx, None)?;
        let id = tx.id.clone();

        self.apply_effects(&tx, false);
        debug!(transaction = %id, kind = %tx.kind, amount = %tx.amount, "transaction added");
        let touches_balances = !tx.effects().is_empty();
        self.ledger.transactions.push(tx);

        if touches_balances {
            self.flush(&[BlobKey::Accounts, BlobKey::Transactions]).await;
        } else {
            self.flush(&[BlobKey::Transactions]).await;
        }
        Ok(id)
    }

    /// Edits a transaction. The old balance effect is reversed and the new
    /// one applied, so balances stay consistent with the log.
    pub async fn update_transaction(
        &mut self,
        id: &TransactionId,
        mut patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        let index = self.position(id)?;
        let old = self.ledger.transactions[index].clone();

        if patch.kind.is_some_and(|k| k != TransactionKind::Transfer) && patch.to_account.is_none()
        {
            patch.to_account = Some(None);
        }
        let candidate = patch.apply_to(&old);
        if candidate.kind != TransactionKind::Transfer && candidate.to_account.is_some() {
            return Err(EngineError::InvalidTransaction(format!(
                "{} transactions have no destination account",
                candidate.kind
            )));
        }
        let updated = self.prepare(candidate, Some(&old))?;

        self.apply_effects(&old, true);
        self.apply_effects(&updated, false);
        self.ledger.transactions[index] = updated.clone();
        debug!(transaction = %id, "transaction updated");

        self.flush(&[BlobKey::Accounts, BlobKey::Transactions]).await;
        Ok(updated)
    }

    /// Removes a transaction and reverses its balance effect.
    pub async fn delete_transaction(&mut self, id: &TransactionId) -> ResultEngine<Transaction> {
        let index = self.position(id)?;
        let removed = self.ledger.transactions.remove(index);
        self.apply_effects(&removed, true);
        debug!(transaction = %id, "transaction deleted");

        self.flush(&[BlobKey::Accounts, BlobKey::Transactions]).await;
        Ok(removed)
    }

    /// Marks a borrow or lend as settled. Balances are not touched.
    pub async fn settle_borrow_lend(&mut self, id: &TransactionId) -> ResultEngine<()> {
        self.set_settled(id, true).await
    }

    /// Sets the settled flag of a borrow or lend either way.
    pub async fn set_settled(&mut self, id: &TransactionId, settled: bool) -> ResultEngine<()> {
        let index = self.position(id)?;
        let tx = &mut self.ledger.transactions[index];
        if !tx.kind.is_debt() {
            return Err(EngineError::InvalidTransaction(format!(
                "{} transactions cannot be settled",
                tx.kind
            )));
        }
        tx.settled = settled;
        debug!(transaction = %id, settled, "settlement changed");

        self.flush(&[BlobKey::Transactions]).await;
        Ok(())
    }

    fn position(&self, id: &TransactionId) -> ResultEngine<usize> {
        self.ledger
            .transactions
            .iter()
            .position(|tx| &tx.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Validates `tx` against the current state and normalizes its fields.
    ///
    /// `previous` is the version being replaced: its effect is taken out of
    /// the available funds check.
    fn prepare(
        &self,
        mut tx: Transaction,
        previous: Option<&Transaction>,
    ) -> ResultEngine<Transaction> {
        if !tx.amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be > 0, got {}",
                tx.amount
            )));
        }

        tx.category = tx.category.trim().to_string();
        tx.notes = tx.notes.trim().to_string();
        tx.counterparty = normalize_optional_text(tx.counterparty.as_deref());

        if tx.kind != TransactionKind::Transfer && tx.category.is_empty() {
            return Err(EngineError::InvalidTransaction(
                "category must not be empty".to_string(),
            ));
        }
        if tx.kind.is_debt() {
            if tx.counterparty.is_none() {
                return Err(EngineError::InvalidTransaction(format!(
                    "{} requires a counterparty",
                    tx.kind
                )));
            }
        } else {
            tx.counterparty = None;
            tx.settled = false;
        }

        let source = self.account_ref(&tx.account)?;

        if tx.kind == TransactionKind::Transfer {
            let Some(to) = tx.to_account.clone() else {
                return Err(EngineError::InvalidTransaction(
                    "transfer requires a destination account".to_string(),
                ));
            };
            if to == tx.account {
                return Err(EngineError::InvalidTransaction(
                    "transfer source and destination must differ".to_string(),
                ));
            }
            let destination = self.account_ref(&to)?;

            let mut available = source.balance;
            if let Some(previous) = previous {
                for (account, delta) in previous.effects() {
                    if account == &source.id {
                        available -= delta;
                    }
                }
            }
            if !source.kind.allows_overdraft() && tx.amount > available {
                return Err(EngineError::InsufficientFunds(format!(
                    "{} has {available}, transfer needs {}",
                    source.name, tx.amount
                )));
            }

            if tx.category.is_empty() {
                tx.category = format!("Transfer from {} to {}", source.name, destination.name);
            }
        } else {
            tx.to_account = None;
        }

        Ok(tx)
    }
}
