//! JSON persistence for the ledger with a single-slot rotating backup
//!
//! The on-disk format is a UTF-8 JSON object with `income` and `expenses`
//! arrays; dates are `YYYY-MM-DD` strings. The backup file carries the same
//! schema at the `_backup`-suffixed path, and exactly one backup generation
//! is ever retained: backing up deletes the previous backup, then renames
//! the live file into its place.
//!
//! Every operation opens, uses, and releases its file within the call;
//! nothing is pooled or held open.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{ExpenseEntry, IncomeEntry, Transaction};

/// Fire-and-forget user-visible notifications.
///
/// The core reports validation failures and load/save outcomes through
/// this; the presentation layer decides how (dialog, stdout, log line).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default notifier that routes messages to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("{}", message);
    }
}

/// Interactive backup confirmation supplied by a presentation layer.
/// Without one, the core never backs up on save.
pub trait ConfirmBackup {
    fn confirm_backup(&self) -> bool;
}

/// On-disk shape of the ledger file
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    income: Vec<IncomeEntry>,
    #[serde(default)]
    expenses: Vec<ExpenseEntry>,
}

/// Serialize the ledger to `path`, overwriting any existing file.
///
/// When a confirmer is supplied and answers yes, the current live file is
/// rotated into the backup slot first.
pub fn save(ledger: &Ledger, path: &Path, confirmer: Option<&dyn ConfirmBackup>) -> Result<()> {
    if confirmer.map(|c| c.confirm_backup()).unwrap_or(false) {
        backup(path, &backup_path_for(path))?;
    }
    write_ledger(ledger, path)
}

/// Save without ever consulting a confirmer. Used by automated pipelines
/// where interactive confirmation is impossible.
pub fn save_quietly(ledger: &Ledger, path: &Path) -> Result<()> {
    write_ledger(ledger, path)
}

fn write_ledger(ledger: &Ledger, path: &Path) -> Result<()> {
    let file = LedgerFile {
        income: ledger.income().to_vec(),
        expenses: ledger.expenses().to_vec(),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(&file)?)?;
    info!(
        path = %path.display(),
        income = file.income.len(),
        expenses = file.expenses.len(),
        "ledger saved"
    );
    Ok(())
}

/// Read `path` and replace the in-memory ledger wholesale.
///
/// A missing file is first-run state: the ledger is emptied and the
/// notifier told, with no error. Malformed content is reported and
/// returned as an error, leaving the in-memory ledger untouched.
pub fn load(ledger: &mut Ledger, path: &Path, notifier: &dyn Notifier) -> Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            ledger.replace(Vec::new(), Vec::new());
            notifier.notify("No previous data found. Starting fresh.");
            return Ok(());
        }
        Err(e) => {
            notifier.notify(&format!("Could not read saved data: {}", e));
            return Err(e.into());
        }
    };

    match serde_json::from_str::<LedgerFile>(&raw) {
        Ok(file) => {
            let (n_income, n_expenses) = (file.income.len(), file.expenses.len());
            ledger.replace(file.income, file.expenses);
            notifier.notify(&format!(
                "Loaded {} income entries and {} expense entries",
                n_income, n_expenses
            ));
            Ok(())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed ledger file");
            notifier.notify("Saved data is malformed; keeping current entries.");
            Err(Error::MalformedData(e))
        }
    }
}

/// Rotate the live file into the single backup slot.
///
/// Deletes any existing backup, then renames `path` to `backup_path`.
/// When there is no live file yet this is a no-op.
pub fn backup(path: &Path, backup_path: &Path) -> Result<()> {
    if backup_path.exists() {
        fs::remove_file(backup_path)?;
        debug!(path = %backup_path.display(), "previous backup deleted");
    }
    if path.exists() {
        fs::rename(path, backup_path)?;
        info!(path = %backup_path.display(), "backup created");
    } else {
        debug!(path = %path.display(), "nothing to back up");
    }
    Ok(())
}

/// Conventional backup location: `budget_data.json` → `budget_data_backup.json`
pub fn backup_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{}_backup", stem);
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

/// Read the persisted file into the unified transaction projection without
/// touching any live ledger. A missing file is an empty projection.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let file: LedgerFile = serde_json::from_str(&raw)?;

    let mut scratch = Ledger::new();
    scratch.replace(file.income, file.expenses);
    Ok(scratch.transactions())
}

/// Platform-conventional location of the ledger file
pub fn default_data_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("penny")
        .join("budget_data.json")
}
