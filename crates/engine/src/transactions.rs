//! Transaction primitives.
//!
//! A `Transaction` is a recorded financial event touching zero, one or two
//! accounts. Income, expenses and transfers move account balances; borrow and
//! lend only feed the cashflow statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccountId, EngineError, Money};

/// Identifier of a transaction.
///
/// Freshly generated ids are UUIDv7 strings, so they sort in creation order.
/// Imported ids are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Borrow,
    Lend,
    Transfer,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 5] = [
        Self::Income,
        Self::Expense,
        Self::Borrow,
        Self::Lend,
        Self::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Borrow => "borrow",
            Self::Lend => "lend",
            Self::Transfer => "transfer",
        }
    }

    /// Borrow and lend are informal debts with a counterparty.
    pub fn is_debt(self) -> bool {
        matches!(self, Self::Borrow | Self::Lend)
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "borrow" => Ok(Self::Borrow),
            "lend" => Ok(Self::Lend),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: String,
    pub amount: Money,
    pub account: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account: Option<AccountId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub settled: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "person", default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl Transaction {
    /// Signed balance changes this transaction applies, per account.
    pub fn effects(&self) -> Vec<(&AccountId, Money)> {
        match self.kind {
            TransactionKind::Income => vec![(&self.account, self.amount)],
            TransactionKind::Expense => vec![(&self.account, -self.amount)],
            TransactionKind::Transfer => match &self.to_account {
                Some(to) => vec![(&self.account, -self.amount), (to, self.amount)],
                None => Vec::new(),
            },
            TransactionKind::Borrow | TransactionKind::Lend => Vec::new(),
        }
    }

    /// Returns `true` if the transaction names `account` as source or destination.
    pub fn references(&self, account: &AccountId) -> bool {
        &self.account == account || self.to_account.as_ref() == Some(account)
    }
}

/// Input of `Engine::add_transaction`.
///
/// Use the per-kind constructors, then the builder methods for the optional
/// fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Money,
    pub account: AccountId,
    pub to_account: Option<AccountId>,
    pub date: NaiveDate,
    pub notes: String,
    pub counterparty: Option<String>,
}

impl TransactionDraft {
    #[must_use]
    pub fn new(kind: TransactionKind, account: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self {
            kind,
            category: String::new(),
            amount,
            account,
            to_account: None,
            date,
            notes: String::new(),
            counterparty: None,
        }
    }

    #[must_use]
    pub fn income(account: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Income, account, amount, date)
    }

    #[must_use]
    pub fn expense(account: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Expense, account, amount, date)
    }

    #[must_use]
    pub fn transfer(from: AccountId, to: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Transfer, from, amount, date).to_account(to)
    }

    #[must_use]
    pub fn borrow(
        account: AccountId,
        amount: Money,
        date: NaiveDate,
        counterparty: impl Into<String>,
    ) -> Self {
        Self::new(TransactionKind::Borrow, account, amount, date).counterparty(counterparty)
    }

    #[must_use]
    pub fn lend(
        account: AccountId,
        amount: Money,
        date: NaiveDate,
        counterparty: impl Into<String>,
    ) -> Self {
        Self::new(TransactionKind::Lend, account, amount, date).counterparty(counterparty)
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn to_account(mut self, to: AccountId) -> Self {
        self.to_account = Some(to);
        self
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }
}

/// Shallow set of transaction fields to overwrite.
///
/// `to_account` and `counterparty` are doubly optional: `Some(None)` clears
/// the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub account: Option<AccountId>,
    pub to_account: Option<Option<AccountId>>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub counterparty: Option<Option<String>>,
    pub settled: Option<bool>,
}

impl TransactionPatch {
    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub fn to_account(mut self, to: Option<AccountId>) -> Self {
        self.to_account = Some(to);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty: Option<String>) -> Self {
        self.counterparty = Some(counterparty);
        self
    }

    #[must_use]
    pub fn settled(mut self, settled: bool) -> Self {
        self.settled = Some(settled);
        self
    }

    /// Merge the patch into a copy of `tx`.
    pub(crate) fn apply_to(&self, tx: &Transaction) -> Transaction {
        let mut out = tx.clone();
        if let Some(kind) = self.kind {
            out.kind = kind;
        }
        if let Some(category) = &self.category {
            out.category = category.clone();
        }
        if let Some(amount) = self.amount {
            out.amount = amount;
        }
        if let Some(account) = &self.account {
            out.account = account.clone();
        }
        if let Some(to) = &self.to_account {
            out.to_account = to.clone();
        }
        if let Some(date) = self.date {
            out.date = date;
        }
        if let Some(notes) = &self.notes {
            out.notes = notes.clone();
        }
        if let Some(counterparty) = &self.counterparty {
            out.counterparty = counterparty.clone();
        }
        if let Some(settled) = self.settled {
            out.settled = settled;
        }
        out
    }
}
