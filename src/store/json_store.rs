use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::coordinator::rebuild_from_history;
use crate::error::EngineError;
use crate::store::schema::{EXPORT_VERSION, ExportData, UserProgress};

const PROGRESS_FILE: &str = "progress.json";

/// What `JsonStore::check_interrupted_import` found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportRecovery {
    Clean,
    DiscardedBackup,
    RestoredBackup,
}

/// File-backed store for one learner's progress.
///
/// Writers must be serialized by the caller; each save replaces the file
/// atomically so readers never observe a partial record.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating data dir {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the progress record, repairing whatever cannot be read.
    ///
    /// A missing file yields a fresh record. An unreadable or malformed file
    /// never fails the load: damaged fields fall back to defaults and each
    /// repair is returned alongside the record.
    pub fn load_progress(&self) -> (UserProgress, Vec<EngineError>) {
        let path = self.file_path(PROGRESS_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no progress file, starting fresh");
            return (UserProgress::default(), Vec::new());
        }

        let value = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .unwrap_or(Value::Null);
        let (progress, issues) = UserProgress::from_json_value(&value);
        for issue in &issues {
            warn!(path = %path.display(), "{issue}");
        }
        (progress, issues)
    }

    pub fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        self.save(PROGRESS_FILE, progress)?;
        debug!(tests = progress.test_history.len(), "progress saved");
        Ok(())
    }

    pub fn export_all(&self, config: &Config) -> ExportData {
        let (progress, _) = self.load_progress();
        ExportData {
            wordup_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            progress,
        }
    }

    /// Replace the stored progress with an export.
    ///
    /// The current file is moved to `.bak` before the new one is renamed
    /// into place and restored if that rename fails. Derived totals are
    /// recomputed from the imported history before anything is written.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.wordup_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.wordup_export_version,
                EXPORT_VERSION
            );
        }

        let mut progress = data.progress.clone();
        rebuild_from_history(&mut progress);
        for issue in progress.sanitize() {
            warn!("import: {issue}");
        }

        let json = serde_json::to_string_pretty(&progress)?;
        let final_path = self.file_path(PROGRESS_FILE);
        let tmp_path = final_path.with_extension("json.tmp");
        let bak_path = final_path.with_extension("json.bak");

        let staged = (|| -> Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            Ok(())
        })();
        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp_path);
            bail!("Import failed during staging: {e}");
        }

        let had_original = final_path.exists();
        if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
            let _ = fs::remove_file(&tmp_path);
            bail!("Import failed during commit (backup): {e}");
        }

        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            if had_original {
                let _ = fs::rename(&bak_path, &final_path);
            }
            let _ = fs::remove_file(&tmp_path);
            bail!("Import failed during commit (rename): {e}");
        }

        if had_original {
            let _ = fs::remove_file(&bak_path);
        }
        Ok(())
    }

    /// Deal with a backup left by an interrupted import. The backup is
    /// restored when the progress file is missing and discarded otherwise.
    pub fn check_interrupted_import(&self) -> Result<ImportRecovery> {
        let final_path = self.file_path(PROGRESS_FILE);
        let bak_path = final_path.with_extension("json.bak");
        if !bak_path.exists() {
            return Ok(ImportRecovery::Clean);
        }
        if final_path.exists() {
            warn!(path = %bak_path.display(), "removing backup from interrupted import");
            fs::remove_file(&bak_path)
                .with_context(|| format!("removing {}", bak_path.display()))?;
            Ok(ImportRecovery::DiscardedBackup)
        } else {
            warn!(path = %bak_path.display(), "restoring progress from interrupted import");
            fs::rename(&bak_path, &final_path)
                .with_context(|| format!("restoring {}", bak_path.display()))?;
            Ok(ImportRecovery::RestoredBackup)
        }
    }
}
