//! Ledger engine of a single-user personal finance tracker.
//!
//! The engine owns a profile, a set of named accounts and the list of
//! transactions recorded against them. It keeps account balances consistent
//! with the transactions, computes monthly and period statistics, and reads
//! and writes backups. State lives in memory and is flushed to a
//! [`BlobStore`] after each mutation.
//!
//! ```no_run
//! use engine::{AccountKind, Engine, MemoryStore, Money, TransactionDraft};
//!
//! # async fn demo() -> Result<(), engine::EngineError> {
//! let mut engine = Engine::builder().store(MemoryStore::new()).build().await?;
//! let cash = engine
//!     .add_account("Cash", AccountKind::Cash, Money::new(100_00))
//!     .await?;
//! let today = chrono::Local::now().date_naive();
//! engine
//!     .add_transaction(
//!         TransactionDraft::expense(cash.clone(), Money::new(30_00), today).category("Food"),
//!     )
//!     .await?;
//! assert_eq!(engine.account(&cash)?.balance, Money::new(70_00));
//! # Ok(())
//! # }
//! ```

pub use accounts::{Account, AccountId, AccountKind, AccountPatch};
pub use auto_backup::AutoBackup;
pub use backup::{
    AccountsDocument, BackupDocument, BackupFileKind, LegacyAccounts, auto_backup_file_name,
    backup_file_name, cipher,
};
pub use categories::suggested_categories;
pub use error::EngineError;
pub use money::Money;
pub use ops::{DEFAULT_SESSION_TTL, Engine, EngineBuilder, OpeningAccount};
pub use pin::{is_valid_pin, pin_verifier, verify_pin};
pub use profile::{Profile, ProfileUpdate, Theme};
pub use stats::{BudgetStatus, CategoryTotal, DateRange, MonthlyStats, RangeStats, TransactionFilter};
pub use store::{BlobKey, BlobStore, MemoryStore, SqliteStore};
pub use transactions::{
    Transaction, TransactionDraft, TransactionId, TransactionKind, TransactionPatch,
};

mod accounts;
mod auto_backup;
pub mod backup;
mod blobs;
mod categories;
mod error;
mod money;
mod ops;
pub mod pin;
mod profile;
pub mod stats;
pub mod store;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
