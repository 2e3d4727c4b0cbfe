//! Concurrent statement-import pipeline
//!
//! One classification task per candidate, bounded by a semaphore so a big
//! statement cannot open an unbounded number of oracle calls. The
//! classification calls run unsynchronized in parallel; every ledger
//! append goes through the shared lock, one at a time. The batch is
//! awaited to completion, then persisted quietly and announced exactly
//! once; durability is per-file, not per-transaction.
//!
//! There is no cancellation: a stuck oracle call stalls only its own task.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::ai::AiClient;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::statement::{Candidate, StatementParser};
use crate::store::{self, Notifier};

/// Default ceiling on simultaneous oracle calls
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Outcome of one import batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Candidates classified and appended to the ledger
    pub imported: usize,
    /// Candidates rejected by validation or lost to a task failure
    pub failed: usize,
}

/// Statement-import driver
pub struct Importer {
    client: AiClient,
    max_in_flight: usize,
}

impl Importer {
    pub fn new(client: AiClient) -> Self {
        Self {
            client,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Override the concurrency ceiling (clamped to at least 1)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Tokenize statement text and import the resulting candidates
    pub async fn import_text(
        &self,
        text: &str,
        ledger: &Arc<Mutex<Ledger>>,
        data_path: &Path,
        notifier: &dyn Notifier,
    ) -> Result<ImportSummary> {
        let candidates = StatementParser::new().parse_lines(text.lines());
        self.run(candidates, ledger, data_path, notifier).await
    }

    /// Import a batch of candidates: concurrent classification, serialized
    /// appends, then one quiet save and one notification.
    ///
    /// A candidate that fails to classify gets category `other`; one that
    /// fails validation is dropped and counted. Neither aborts the batch.
    pub async fn run(
        &self,
        candidates: Vec<Candidate>,
        ledger: &Arc<Mutex<Ledger>>,
        data_path: &Path,
        notifier: &dyn Notifier,
    ) -> Result<ImportSummary> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut handles = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let semaphore = Arc::clone(&semaphore);
            let client = self.client.clone();
            let ledger = Arc::clone(ledger);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::Import("import semaphore closed".into()))?;

                let category = client.categorize_lenient(&candidate.description).await;
                debug!(
                    description = %candidate.description,
                    category = %category,
                    "candidate classified"
                );

                // Classification ran unsynchronized; the append is the one
                // serialized step.
                let mut ledger = ledger.lock().await;
                ledger.add_transaction(
                    &candidate.description,
                    candidate.amount,
                    None,
                    Some(&candidate.date.to_string()),
                    Some(category.as_str()),
                )
            }));
        }

        let mut imported = 0usize;
        let mut failed = 0usize;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => imported += 1,
                Ok(Err(e)) => {
                    warn!(error = %e, "candidate rejected, continuing batch");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "import task failed, continuing batch");
                    failed += 1;
                }
            }
        }

        // Exactly one persist and one refresh per batch
        {
            let ledger = ledger.lock().await;
            store::save_quietly(&ledger, data_path)?;
        }
        notifier.notify(&format!("{} transactions imported successfully.", imported));

        info!(imported, failed, "statement import complete");
        Ok(ImportSummary { imported, failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::today;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingNotifier(AtomicUsize);
    impl Notifier for CountingNotifier {
        fn notify(&self, _message: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn candidate(description: &str, amount: f64) -> Candidate {
        Candidate {
            date: today(),
            description: description.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn test_run_routes_by_sign_and_classifies() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget_data.json");
        let ledger = Arc::new(Mutex::new(Ledger::new()));
        let notifier = CountingNotifier(AtomicUsize::new(0));

        let importer = Importer::new(AiClient::mock());
        let summary = importer
            .run(
                vec![
                    candidate("COFFEE SHOP", -4.50),
                    candidate("ACME PAYROLL", 2000.0),
                ],
                &ledger,
                &path,
                &notifier,
            )
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { imported: 2, failed: 0 });
        let ledger = ledger.lock().await;
        assert_eq!(ledger.expenses().len(), 1);
        assert_eq!(ledger.expenses()[0].amount, 4.50);
        assert_eq!(ledger.expenses()[0].category, "food");
        assert_eq!(ledger.income().len(), 1);
        assert_eq!(ledger.income()[0].category, "salary");
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_run_isolates_bad_candidates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget_data.json");
        let ledger = Arc::new(Mutex::new(Ledger::new()));
        let notifier = CountingNotifier(AtomicUsize::new(0));

        let importer = Importer::new(AiClient::mock());
        let summary = importer
            .run(
                vec![
                    candidate("Zero amount", 0.0),
                    candidate("Fine", -10.00),
                ],
                &ledger,
                &path,
                &notifier,
            )
            .await
            .unwrap();

        // The zero-amount candidate fails the sign check; the batch continues
        assert_eq!(summary, ImportSummary { imported: 1, failed: 1 });
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_import_text_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget_data.json");
        let ledger = Arc::new(Mutex::new(Ledger::new()));
        let notifier = CountingNotifier(AtomicUsize::new(0));

        let importer = Importer::new(AiClient::mock());
        let summary = importer
            .import_text("01/15/2024\nCoffee Shop\n-4.50\n", &ledger, &path, &notifier)
            .await
            .unwrap();

        assert_eq!(summary.imported, 1);
        let ledger = ledger.lock().await;
        assert_eq!(ledger.expenses().len(), 1);
        assert_eq!(ledger.expenses()[0].date.to_string(), "2024-01-15");
        assert_eq!(ledger.expenses()[0].amount, 4.50);
    }
}
