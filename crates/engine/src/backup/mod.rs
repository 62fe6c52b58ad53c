//! Backup documents and backup files.
//!
//! A backup is the whole ledger (profile, accounts, transactions) plus a few
//! derived figures, written as pretty-printed JSON. Manual and automatic
//! backups obfuscate that JSON with [`cipher::obfuscate`]; very old exports
//! are the plain JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Account, AccountId, EngineError, Money, Profile, ResultEngine, Transaction};
use crate::stats::MonthlyStats;

pub mod cipher;
pub(crate) mod legacy;

pub const BACKUP_VERSION: &str = "1.0";
/// Password used for automatic backups when none is configured.
pub const DEFAULT_AUTO_BACKUP_PASSWORD: &str = "mvault123";

const MANUAL_MARKER: &str = "mvault_backup";
const AUTO_MARKER: &str = "mvault_auto_backup";

/// The two balances kept by the earliest versions.
///
/// Either key may be missing, but not both: a document without any of them
/// is read as an (empty) dynamic map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LegacyAccountsFields")]
pub struct LegacyAccounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<Money>,
}

#[derive(Deserialize)]
struct LegacyAccountsFields {
    #[serde(default)]
    cash: Option<Money>,
    #[serde(default)]
    bank: Option<Money>,
}

impl TryFrom<LegacyAccountsFields> for LegacyAccounts {
    type Error = &'static str;

    fn try_from(fields: LegacyAccountsFields) -> Result<Self, Self::Error> {
        if fields.cash.is_none() && fields.bank.is_none() {
            return Err("neither cash nor bank balance");
        }
        Ok(Self {
            cash: fields.cash,
            bank: fields.bank,
        })
    }
}

/// Accounts as found in a blob or a backup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountsDocument {
    Legacy(LegacyAccounts),
    Dynamic(BTreeMap<AccountId, Account>),
}

impl Default for AccountsDocument {
    fn default() -> Self {
        Self::Dynamic(BTreeMap::new())
    }
}

impl AccountsDocument {
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub accounts: AccountsDocument,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_stats: Option<MonthlyStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_transactions: usize,
    #[serde(default)]
    pub net_worth: Money,
}

fn default_version() -> String {
    BACKUP_VERSION.to_string()
}

impl BackupDocument {
    pub fn to_pretty_json(&self) -> ResultEngine<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> ResultEngine<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// `<profile name>_mvault_backup_<date>.txt`
pub fn backup_file_name(profile_name: &str, date: NaiveDate) -> String {
    let name: String = profile_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{name}_{MANUAL_MARKER}_{}.txt", date.format("%Y-%m-%d"))
}

/// `mvault_auto_backup_<date>.txt`
pub fn auto_backup_file_name(date: NaiveDate) -> String {
    format!("{AUTO_MARKER}_{}.txt", date.format("%Y-%m-%d"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupFileKind {
    /// Obfuscated `.txt` backup, needs the password.
    Obfuscated,
    /// Plain JSON export.
    LegacyJson,
}

impl BackupFileKind {
    /// Recognizes a backup by its file name.
    pub fn detect(file_name: &str) -> ResultEngine<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".txt") && (lower.contains(MANUAL_MARKER) || lower.contains(AUTO_MARKER))
        {
            return Ok(Self::Obfuscated);
        }
        if lower.ends_with(".json") {
            return Ok(Self::LegacyJson);
        }
        Err(EngineError::UnsupportedBackup(file_name.to_string()))
    }
}
