//! Penny Core Library
//!
//! Record-keeping engine for the Penny budget tracker, shared by every
//! front end:
//! - Amount/date validation
//! - In-memory ledger with aggregation queries and a next-month forecast
//! - JSON persistence with a single-slot rotating backup
//! - Unified transaction projection for display and id-based deletion
//! - Classification oracle adapter (OpenAI-compatible, with a mock)
//! - Concurrent statement-import pipeline
//!
//! Presentation layers (GUI, web API, text menu) are external: they call
//! the plain operations here and plug in through the `Notifier` and
//! `ConfirmBackup` collaborator traits.

pub mod ai;
pub mod error;
pub mod import;
pub mod ledger;
pub mod models;
pub mod statement;
pub mod store;
pub mod validate;

/// Test utilities including the mock advisor server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AiClient, MockBackend, OpenAiBackend, Oracle};
pub use error::{Error, Result};
pub use import::{ImportSummary, Importer, DEFAULT_MAX_IN_FLIGHT};
pub use ledger::Ledger;
pub use models::{
    Category, Classification, ClearScope, EntryId, ExpenseEntry, IncomeEntry, Transaction,
};
pub use statement::{read_csv_rows, rows_to_candidates, Candidate, RawRow, StatementParser};
pub use store::{
    backup, backup_path_for, default_data_path, load, load_transactions, save, save_quietly,
    ConfirmBackup, LogNotifier, Notifier,
};
pub use validate::{validate_amount, validate_date, SignRule};
