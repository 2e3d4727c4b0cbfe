//! In-memory ledger store and aggregation queries
//!
//! The ledger owns the two entry lists. It is a plain value passed to
//! whichever front end drives it (no process-wide singleton); callers that
//! mutate it concurrently must wrap it in their own lock, as the import
//! pipeline does.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    Classification, ClearScope, EntryId, ExpenseEntry, IncomeEntry, Transaction,
};
use crate::validate::{check_sign, validate_amount, validate_date, SignRule};

/// The authoritative in-memory collection of income and expense entries.
///
/// Both lists store positive magnitudes; whether an amount counts toward
/// income or expenses is decided by which list it lives in. Lists keep
/// insertion order, not date order.
#[derive(Debug, Default)]
pub struct Ledger {
    income: Vec<IncomeEntry>,
    expenses: Vec<ExpenseEntry>,
    next_id: EntryId,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> EntryId {
        self.next_id += 1;
        self.next_id
    }

    /// Validate and append an income entry.
    ///
    /// `amount` is raw text from the caller; `date` defaults to today and
    /// `category` to `"general"` when absent. The stored entry is returned.
    pub fn add_income(
        &mut self,
        amount: &str,
        source: &str,
        date: Option<&str>,
        category: Option<&str>,
    ) -> Result<IncomeEntry> {
        let amount = validate_amount(amount, SignRule::Positive)?;
        let date = validate_date(date)?;
        self.insert_income(amount, date, source, category)
    }

    /// Validate and append an expense entry. Amounts are magnitudes and
    /// must be positive; the expense direction is the list itself.
    pub fn add_expense(
        &mut self,
        amount: &str,
        category: &str,
        date: Option<&str>,
    ) -> Result<ExpenseEntry> {
        let amount = validate_amount(amount, SignRule::Positive)?;
        let date = validate_date(date)?;
        self.insert_expense(amount, date, category)
    }

    /// Route a transaction to the income or expense list.
    ///
    /// `classification` accepts `"income"` / `"expense"`; anything else is
    /// an `UnknownClassification` error. When absent it is inferred from
    /// the sign of `amount` (positive is income, non-positive is expense).
    /// The magnitude is stored either way.
    pub fn add_transaction(
        &mut self,
        description: &str,
        amount: f64,
        classification: Option<&str>,
        date: Option<&str>,
        category: Option<&str>,
    ) -> Result<Transaction> {
        let classification = match classification {
            Some(raw) => raw
                .parse::<Classification>()
                .map_err(Error::UnknownClassification)?,
            None => Classification::from_sign(amount),
        };
        let date = validate_date(date)?;
        let magnitude = check_sign(amount.abs(), SignRule::Positive)?;

        match classification {
            Classification::Income => {
                let entry = self.insert_income(magnitude, date, description, category)?;
                Ok(Transaction::from_income(&entry))
            }
            Classification::Expense => {
                let category = category.unwrap_or(description);
                let entry = self.insert_expense(magnitude, date, category)?;
                Ok(Transaction::from_expense(&entry))
            }
        }
    }

    fn insert_income(
        &mut self,
        amount: f64,
        date: chrono::NaiveDate,
        source: &str,
        category: Option<&str>,
    ) -> Result<IncomeEntry> {
        let entry = IncomeEntry {
            id: self.next_id(),
            amount,
            date,
            source: source.to_string(),
            category: category.unwrap_or("general").to_string(),
        };
        debug!(id = entry.id, amount, %date, "income entry added");
        self.income.push(entry.clone());
        Ok(entry)
    }

    fn insert_expense(
        &mut self,
        amount: f64,
        date: chrono::NaiveDate,
        category: &str,
    ) -> Result<ExpenseEntry> {
        let entry = ExpenseEntry {
            id: self.next_id(),
            amount,
            date,
            category: category.to_string(),
        };
        debug!(id = entry.id, amount, %date, "expense entry added");
        self.expenses.push(entry.clone());
        Ok(entry)
    }

    pub fn total_income(&self) -> f64 {
        self.income.iter().map(|e| e.amount).sum()
    }

    pub fn total_expense(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    pub fn balance(&self) -> f64 {
        self.total_income() - self.total_expense()
    }

    /// Per-month average amounts, keyed `YYYY-MM`, for income and expenses.
    /// Months without entries are absent from the map.
    pub fn monthly_averages(&self) -> (BTreeMap<String, f64>, BTreeMap<String, f64>) {
        let income = monthly_average(self.income.iter().map(|e| (e.date, e.amount)));
        let expenses = monthly_average(self.expenses.iter().map(|e| (e.date, e.amount)));
        (income, expenses)
    }

    /// Current balance plus the expected net of a typical month.
    ///
    /// The expected month is the average of the per-month income averages
    /// minus the average of the per-month expense averages. With no
    /// history at all this is the current balance unchanged, not zero.
    pub fn forecast_next_month_balance(&self) -> f64 {
        let (income, expenses) = self.monthly_averages();
        let next_income = mean(income.values());
        let next_expenses = mean(expenses.values());
        self.balance() + next_income - next_expenses
    }

    /// Wipe one or both lists. In-memory only until the next save.
    pub fn clear(&mut self, scope: ClearScope) {
        match scope {
            ClearScope::Income => self.income.clear(),
            ClearScope::Expenses => self.expenses.clear(),
            ClearScope::Both => {
                self.income.clear();
                self.expenses.clear();
            }
        }
    }

    /// Remove the entry with the given id from whichever list holds it.
    /// Returns the removed entry as a transaction for display.
    pub fn remove(&mut self, id: EntryId) -> Result<Transaction> {
        if let Some(pos) = self.income.iter().position(|e| e.id == id) {
            let entry = self.income.remove(pos);
            return Ok(Transaction::from_income(&entry));
        }
        if let Some(pos) = self.expenses.iter().position(|e| e.id == id) {
            let entry = self.expenses.remove(pos);
            return Ok(Transaction::from_expense(&entry));
        }
        Err(Error::NotFound(format!("no entry with id {}", id)))
    }

    pub fn income(&self) -> &[IncomeEntry] {
        &self.income
    }

    pub fn expenses(&self) -> &[ExpenseEntry] {
        &self.expenses
    }

    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.expenses.is_empty()
    }

    /// The unified transaction projection, sorted by date (stable, so
    /// same-day entries keep insertion order with income first).
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut all: Vec<Transaction> = self
            .income
            .iter()
            .map(Transaction::from_income)
            .chain(self.expenses.iter().map(Transaction::from_expense))
            .collect();
        all.sort_by_key(|t| t.date);
        all
    }

    /// Replace both lists wholesale (a load, not a merge), assigning fresh
    /// ids since the persisted schema carries none.
    pub(crate) fn replace(&mut self, income: Vec<IncomeEntry>, expenses: Vec<ExpenseEntry>) {
        self.income = income;
        self.expenses = expenses;
        self.next_id = 0;
        for entry in &mut self.income {
            self.next_id += 1;
            entry.id = self.next_id;
        }
        for entry in &mut self.expenses {
            self.next_id += 1;
            entry.id = self.next_id;
        }
    }
}

fn monthly_average(entries: impl Iterator<Item = (chrono::NaiveDate, f64)>) -> BTreeMap<String, f64> {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (date, amount) in entries {
        buckets
            .entry(date.format("%Y-%m").to_string())
            .or_default()
            .push(amount);
    }
    buckets
        .into_iter()
        .map(|(month, amounts)| {
            let avg = amounts.iter().sum::<f64>() / amounts.len() as f64;
            (month, avg)
        })
        .collect()
}

fn mean<'a>(values: impl ExactSizeIterator<Item = &'a f64>) -> f64 {
    let len = values.len();
    if len == 0 {
        return 0.0;
    }
    values.sum::<f64>() / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_income_reflects_in_total() {
        let mut ledger = Ledger::new();
        ledger
            .add_income("1000", "Paycheck", Some("2024-01-05"), None)
            .unwrap();
        ledger
            .add_income("250.50", "Freelance", Some("01/20/2024"), Some("salary"))
            .unwrap();
        assert_eq!(ledger.total_income(), 1250.50);
    }

    #[test]
    fn test_add_income_defaults() {
        let mut ledger = Ledger::new();
        let entry = ledger.add_income("100", "Gift", None, None).unwrap();
        assert_eq!(entry.category, "general");
        assert_eq!(entry.date, crate::validate::today());
        assert_eq!(entry.id, 1);
    }

    #[test]
    fn test_add_income_rejects_bad_input() {
        let mut ledger = Ledger::new();
        assert!(ledger.add_income("lots", "Paycheck", None, None).is_err());
        assert!(ledger
            .add_income("100", "Paycheck", Some("not-a-date"), None)
            .is_err());
        // Rejected entries never become visible
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_expense_rejects_non_positive() {
        let mut ledger = Ledger::new();
        for raw in ["-4.50", "0", "-0.0"] {
            assert!(matches!(
                ledger.add_expense(raw, "food", None),
                Err(Error::SignViolation(_))
            ));
        }
        assert_eq!(ledger.total_expense(), 0.0);
    }

    #[test]
    fn test_balance() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.balance(), 0.0);
        ledger.add_income("1000", "Paycheck", None, None).unwrap();
        ledger.add_expense("300", "rent", None).unwrap();
        assert_eq!(ledger.balance(), 700.0);
    }

    #[test]
    fn test_add_transaction_routes_by_sign() {
        let mut ledger = Ledger::new();
        let tx = ledger
            .add_transaction("Paycheck", 2000.0, None, Some("2024-01-01"), Some("salary"))
            .unwrap();
        assert_eq!(tx.classification, Classification::Income);

        let tx = ledger
            .add_transaction("Coffee Shop", -4.50, None, Some("2024-01-15"), Some("food"))
            .unwrap();
        assert_eq!(tx.classification, Classification::Expense);
        // Stored as a magnitude
        assert_eq!(tx.amount, 4.50);
        assert_eq!(ledger.expenses()[0].amount, 4.50);
    }

    #[test]
    fn test_add_transaction_explicit_classification() {
        let mut ledger = Ledger::new();
        // Refund recorded as income despite how a caller might sign it
        let tx = ledger
            .add_transaction("Refund", 25.0, Some("income"), None, None)
            .unwrap();
        assert_eq!(tx.classification, Classification::Income);

        assert!(matches!(
            ledger.add_transaction("Mystery", 10.0, Some("refund"), None, None),
            Err(Error::UnknownClassification(_))
        ));
    }

    #[test]
    fn test_add_transaction_zero_amount_rejected() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            ledger.add_transaction("Void", 0.0, None, None, None),
            Err(Error::SignViolation(_))
        ));
    }

    #[test]
    fn test_monthly_averages() {
        let mut ledger = Ledger::new();
        ledger
            .add_income("100", "A", Some("2024-01-05"), None)
            .unwrap();
        ledger
            .add_income("300", "B", Some("2024-01-20"), None)
            .unwrap();
        let (income, expenses) = ledger.monthly_averages();
        assert_eq!(income.get("2024-01"), Some(&200.0));
        assert_eq!(income.len(), 1);
        assert!(expenses.is_empty());
    }

    #[test]
    fn test_monthly_averages_multiple_months() {
        let mut ledger = Ledger::new();
        ledger
            .add_income("100", "A", Some("2024-01-05"), None)
            .unwrap();
        ledger
            .add_income("200", "B", Some("2024-02-10"), None)
            .unwrap();
        ledger.add_expense("50", "food", Some("2024-02-14")).unwrap();
        let (income, expenses) = ledger.monthly_averages();
        assert_eq!(income.get("2024-01"), Some(&100.0));
        assert_eq!(income.get("2024-02"), Some(&200.0));
        assert_eq!(expenses.get("2024-02"), Some(&50.0));
        assert!(expenses.get("2024-01").is_none());
    }

    #[test]
    fn test_forecast_with_history() {
        let mut ledger = Ledger::new();
        ledger
            .add_income("1000", "A", Some("2024-01-05"), None)
            .unwrap();
        ledger
            .add_income("2000", "B", Some("2024-02-05"), None)
            .unwrap();
        ledger.add_expense("500", "rent", Some("2024-01-01")).unwrap();
        // balance 2500, avg monthly income (1000+2000)/2 = 1500, avg expense 500
        assert_eq!(ledger.forecast_next_month_balance(), 2500.0 + 1500.0 - 500.0);
    }

    #[test]
    fn test_forecast_without_history_is_balance() {
        let ledger = Ledger::new();
        assert_eq!(ledger.forecast_next_month_balance(), 0.0);
    }

    #[test]
    fn test_clear_scopes() {
        let mut ledger = Ledger::new();
        ledger.add_income("100", "A", None, None).unwrap();
        ledger.add_expense("50", "food", None).unwrap();

        ledger.clear(ClearScope::Income);
        assert!(ledger.income().is_empty());
        assert_eq!(ledger.expenses().len(), 1);

        ledger.add_income("100", "A", None, None).unwrap();
        ledger.clear(ClearScope::Both);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_by_id() {
        let mut ledger = Ledger::new();
        let a = ledger.add_income("100", "A", None, None).unwrap();
        let b = ledger.add_expense("50", "food", None).unwrap();
        // Duplicate values, distinct ids
        let c = ledger.add_expense("50", "food", None).unwrap();

        let removed = ledger.remove(b.id).unwrap();
        assert_eq!(removed.id, b.id);
        assert_eq!(ledger.expenses().len(), 1);
        assert_eq!(ledger.expenses()[0].id, c.id);

        ledger.remove(a.id).unwrap();
        assert!(matches!(ledger.remove(a.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_transactions_projection_sorted_by_date() {
        let mut ledger = Ledger::new();
        ledger
            .add_expense("20", "food", Some("2024-03-10"))
            .unwrap();
        ledger
            .add_income("100", "Paycheck", Some("2024-01-05"), None)
            .unwrap();
        ledger
            .add_expense("30", "gas", Some("2024-02-01"))
            .unwrap();

        let txs = ledger.transactions();
        let dates: Vec<String> = txs.iter().map(|t| t.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-05", "2024-02-01", "2024-03-10"]);
        // Expense description comes from its category
        assert_eq!(txs[1].description, "gas");
        // Income description comes from its source
        assert_eq!(txs[0].description, "Paycheck");
    }

    #[test]
    fn test_replace_reassigns_ids() {
        let mut ledger = Ledger::new();
        ledger.add_income("1", "old", None, None).unwrap();

        let income = vec![IncomeEntry {
            id: 0,
            amount: 9.0,
            date: crate::validate::today(),
            source: "new".into(),
            category: "general".into(),
        }];
        ledger.replace(income, Vec::new());
        assert_eq!(ledger.income().len(), 1);
        assert_eq!(ledger.income()[0].id, 1);

        // Ids keep increasing after a replace
        let next = ledger.add_income("2", "x", None, None).unwrap();
        assert_eq!(next.id, 2);
    }
}
