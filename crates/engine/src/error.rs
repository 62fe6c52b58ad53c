//! The module contains the error the engine can throw.
//!
//! The main ones are:
//!
//! - [`DuplicateName`] thrown when an account name is already taken.
//! - [`NotFound`] thrown when an account or a transaction id is unknown.
//! - [`AccountNotFound`] thrown when a transaction references a missing account.
//! - [`AccountInUse`] thrown when deleting an account still referenced by
//!   transactions.
//! - [`InvalidAccount`] thrown for an empty account name or an unknown type.
//! - [`Decode`] thrown when a backup cannot be read back.
//!
//!  [`DuplicateName`]: EngineError::DuplicateName
//!  [`NotFound`]: EngineError::NotFound
//!  [`AccountNotFound`]: EngineError::AccountNotFound
//!  [`AccountInUse`]: EngineError::AccountInUse
//!  [`InvalidAccount`]: EngineError::InvalidAccount
//!  [`Decode`]: EngineError::Decode
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" already present!")]
    DuplicateName(String),
    #[error("\"{0}\" key not found!")]
    NotFound(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("account in use: {0}")]
    AccountInUse(String),
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Unsupported backup file: {0}")]
    UnsupportedBackup(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::AccountInUse(a), Self::AccountInUse(b)) => a == b,
            (Self::InvalidAccount(a), Self::InvalidAccount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::InvalidProfile(a), Self::InvalidProfile(b)) => a == b,
            (Self::Decode(a), Self::Decode(b)) => a == b,
            (Self::UnsupportedBackup(a), Self::UnsupportedBackup(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind() && a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
