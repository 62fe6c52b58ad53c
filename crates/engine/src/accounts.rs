//! The module contains `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

/// Stable identifier for an account.
///
/// Generated once at creation and never changed, so an account can be
/// renamed without breaking the references held by transactions. Documents
/// written by older versions may carry plain names (`"cash"`, `"bank"`) here;
/// the legacy import remaps those.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Cash,
    Bank,
    Savings,
    Credit,
    Investment,
    #[default]
    Other,
}

impl AccountKind {
    pub const ALL: [AccountKind; 6] = [
        Self::Cash,
        Self::Bank,
        Self::Savings,
        Self::Credit,
        Self::Investment,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Investment => "investment",
            Self::Other => "other",
        }
    }

    /// Credit accounts are allowed to run a negative balance.
    pub fn allows_overdraft(self) -> bool {
        matches!(self, Self::Credit)
    }
}

impl core::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "savings" => Ok(Self::Savings),
            "credit" => Ok(Self::Credit),
            "investment" => Ok(Self::Investment),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidAccount(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

/// An account.
///
/// An account is a named pool of money: a wallet, a bank account, a credit
/// card. Its balance is a cache of the effects of the transactions applied
/// to it, on top of the initial balance it was created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AccountKind,
    pub balance: Money,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, kind: AccountKind, balance: Money, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::generate(),
            name,
            kind,
            balance,
            created_at,
        }
    }

    pub fn with_id(
        id: AccountId,
        name: String,
        kind: AccountKind,
        balance: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            balance,
            created_at,
        }
    }

    pub(crate) fn apply_change(&mut self, delta: Money) {
        self.balance += delta;
    }
}

/// Shallow set of account fields to overwrite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    /// Manual balance adjustment.
    pub balance: Option<Money>,
}

impl AccountPatch {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn balance(mut self, balance: Money) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.balance.is_none()
    }
}
