//! Domain models for Penny

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Entry identifier, assigned by the ledger at creation time.
///
/// Ids increase monotonically and are shared across the income and expense
/// lists, so an id names exactly one entry. They are session-local handles:
/// the persisted file carries no ids and a `load` assigns fresh ones.
pub type EntryId = u64;

fn default_income_category() -> String {
    "general".to_string()
}

/// A recorded income entry. Amount is a positive magnitude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeEntry {
    #[serde(skip)]
    pub id: EntryId,
    pub amount: f64,
    pub date: NaiveDate,
    pub source: String,
    #[serde(default = "default_income_category")]
    pub category: String,
}

/// A recorded expense entry. Amount is a positive magnitude; the expense
/// direction is carried by list membership, never by the stored sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseEntry {
    #[serde(skip)]
    pub id: EntryId,
    pub amount: f64,
    pub date: NaiveDate,
    pub category: String,
}

/// Whether a transaction routes to the income or expense list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Income,
    Expense,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Infer the classification from a signed statement amount
    pub fn from_sign(amount: f64) -> Self {
        if amount > 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl std::str::FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown classification: {}", s)),
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified display-oriented view over income and expense entries.
///
/// Derived on demand; never persisted in this shape.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: EntryId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub classification: Classification,
}

impl Transaction {
    pub(crate) fn from_income(entry: &IncomeEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            description: entry.source.clone(),
            amount: entry.amount,
            category: entry.category.clone(),
            classification: Classification::Income,
        }
    }

    pub(crate) fn from_expense(entry: &ExpenseEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            description: entry.category.clone(),
            amount: entry.amount,
            category: entry.category.clone(),
            classification: Classification::Expense,
        }
    }
}

/// The closed spending-category taxonomy.
///
/// This is the only vocabulary the classification oracle is allowed to
/// produce; anything else collapses to `Other` at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Groceries,
    Gas,
    Utilities,
    Entertainment,
    Salary,
    Shopping,
    Travel,
    Fees,
    Health,
    Gifts,
    Transfer,
    Education,
    Family,
    Other,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Food,
        Category::Groceries,
        Category::Gas,
        Category::Utilities,
        Category::Entertainment,
        Category::Salary,
        Category::Shopping,
        Category::Travel,
        Category::Fees,
        Category::Health,
        Category::Gifts,
        Category::Transfer,
        Category::Education,
        Category::Family,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Groceries => "groceries",
            Self::Gas => "gas",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Salary => "salary",
            Self::Shopping => "shopping",
            Self::Travel => "travel",
            Self::Fees => "fees",
            Self::Health => "health",
            Self::Gifts => "gifts",
            Self::Transfer => "transfer",
            Self::Education => "education",
            Self::Family => "family",
            Self::Other => "other",
        }
    }

    /// Exact (case-insensitive) match against the taxonomy
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Lenient parse: anything outside the taxonomy collapses to `Other`
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which ledger list a `clear` wipes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Income,
    Expenses,
    Both,
}
