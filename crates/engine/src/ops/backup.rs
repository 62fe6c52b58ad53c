use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use crate::{
    EngineError, ResultEngine,
    backup::{
        AccountsDocument, BACKUP_VERSION, BackupDocument, BackupFileKind, backup_file_name,
        cipher::{self, DECODE_FAILURE},
        legacy,
    },
    store::{BlobKey, BlobStore},
    util::now_millis,
};

use super::{Engine, Ledger};

impl<S: BlobStore> Engine<S> {
    /// Snapshot of the whole ledger, PIN verifier included.
    pub fn export_snapshot(&self) -> BackupDocument {
        BackupDocument {
            version: BACKUP_VERSION.to_string(),
            profile: self.ledger.profile.clone(),
            accounts: AccountsDocument::Dynamic(self.ledger.accounts.clone()),
            transactions: self.ledger.transactions.clone(),
            monthly_stats: Some(self.monthly_stats()),
            export_date: Some(Utc::now()),
            total_transactions: self.ledger.transactions.len(),
            net_worth: self.net_worth(),
        }
    }

    /// Export serialized and obfuscated with `password`.
    pub fn encode_backup(&self, password: &str) -> ResultEngine<String> {
        ensure_password(password)?;
        let json = self.export_snapshot().to_pretty_json()?;
        Ok(cipher::obfuscate(&json, password))
    }

    /// Writes `<name>_mvault_backup_<date>.txt` into `dir`.
    pub async fn write_backup(
        &self,
        dir: &Path,
        password: &str,
        today: NaiveDate,
    ) -> ResultEngine<PathBuf> {
        let path = dir.join(backup_file_name(&self.ledger.profile.name, today));
        self.write_backup_to(&path, password).await?;
        Ok(path)
    }

    pub(crate) async fn write_backup_to(&self, path: &Path, password: &str) -> ResultEngine<()> {
        let text = self.encode_backup(password)?;
        tokio::fs::write(path, text).await?;
        info!(path = %path.display(), "backup written");
        Ok(())
    }

    /// Reverses [`Engine::encode_backup`] and imports the result.
    pub async fn restore_backup(&mut self, text: &str, password: &str) -> ResultEngine<()> {
        ensure_password(password)?;
        let json = cipher::deobfuscate(text, password)?;
        let doc = BackupDocument::from_json(&json)
            .map_err(|_| EngineError::Decode(DECODE_FAILURE.to_string()))?;
        self.import_snapshot(doc).await
    }

    /// Reads a backup file, obfuscated or plain JSON depending on its name.
    pub async fn restore_backup_file(&mut self, path: &Path, password: &str) -> ResultEngine<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = BackupFileKind::detect(&name)?;
        let text = tokio::fs::read_to_string(path).await?;
        match kind {
            BackupFileKind::Obfuscated => self.restore_backup(&text, password).await,
            BackupFileKind::LegacyJson => {
                let doc = BackupDocument::from_json(&text)?;
                self.import_snapshot(doc).await
            }
        }
    }

    /// Replaces the whole ledger with `doc`.
    ///
    /// The PIN verifier is dropped: whoever imports sets their own. Balances
    /// are taken from the document as they are, transaction effects are not
    /// replayed.
    pub async fn import_snapshot(&mut self, doc: BackupDocument) -> ResultEngine<()> {
        let was_legacy = doc.accounts.is_legacy();
        let rebuilt = legacy::rebuild(doc.accounts, doc.transactions, now_millis());

        self.ledger = Ledger {
            profile: doc.profile.without_pin(),
            accounts: rebuilt.accounts,
            transactions: rebuilt.transactions,
        };
        self.authenticated_at = None;

        if let Err(err) = self.store.clear().await {
            error!(%err, "failed to clear store before import");
        }
        self.flush(&BlobKey::ALL).await;
        info!(
            legacy = was_legacy,
            accounts = self.ledger.accounts.len(),
            transactions = self.ledger.transactions.len(),
            "backup imported"
        );
        Ok(())
    }
}

fn ensure_password(password: &str) -> ResultEngine<()> {
    if password.is_empty() {
        return Err(EngineError::InvalidProfile(
            "backup password must not be empty".to_string(),
        ));
    }
    Ok(())
}
