//! Throttled automatic backups.
//!
//! The last run is only kept in memory, so a restart allows a new backup
//! right away.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::{Engine, ResultEngine, backup::auto_backup_file_name, store::BlobStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoBackup {
    interval: Duration,
    last_run: Option<DateTime<Utc>>,
}

impl Default for AutoBackup {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl AutoBackup {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_run
            .is_none_or(|last| now.signed_duration_since(last) >= self.interval)
    }

    /// Writes `mvault_auto_backup_<date>.txt` into `dir` when due and the
    /// ledger went through setup. Returns the written path.
    pub async fn run<S: BlobStore>(
        &mut self,
        engine: &Engine<S>,
        dir: &Path,
        password: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<PathBuf>> {
        if !self.is_due(now) {
            debug!("auto backup not due");
            return Ok(None);
        }
        if !engine.profile().is_setup_complete {
            debug!("auto backup skipped, setup incomplete");
            return Ok(None);
        }

        let path = dir.join(auto_backup_file_name(now.date_naive()));
        engine.write_backup_to(&path, password).await?;
        self.last_run = Some(now);
        info!(path = %path.display(), "auto backup written");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn due_once_per_interval() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut auto = AutoBackup::default();
        assert!(auto.is_due(t0));

        auto.last_run = Some(t0);
        assert!(!auto.is_due(t0 + Duration::hours(23)));
        assert!(auto.is_due(t0 + Duration::hours(24)));
    }
}
