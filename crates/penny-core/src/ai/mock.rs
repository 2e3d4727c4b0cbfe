//! Mock backend for testing
//!
//! Deterministic keyword classification with optional artificial latency,
//! useful for unit tests and for exercising the concurrent import pipeline
//! without a running model server.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;

use super::Oracle;

/// Mock oracle backend
///
/// Classifies by keyword lookup. Can be made unhealthy to test failure
/// absorption, and given a latency ceiling to test concurrency.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether calls succeed and health_check returns true
    pub healthy: bool,
    /// Per-call sleep ceiling; actual delay varies by description
    latency: Option<Duration>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            latency: None,
        }
    }

    /// Create an unhealthy mock backend; every call fails
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            latency: None,
        }
    }

    /// Add an artificial latency ceiling to each call
    pub fn with_latency(mut self, ceiling: Duration) -> Self {
        self.latency = Some(ceiling);
        self
    }

    async fn simulate_latency(&self, description: &str) {
        if let Some(ceiling) = self.latency {
            // Pseudo-random but reproducible: derive the delay from the text
            let hash: u64 = description
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let millis = ceiling.as_millis() as u64;
            if millis > 0 {
                tokio::time::sleep(Duration::from_millis(hash % millis)).await;
            }
        }
    }
}

#[async_trait]
impl Oracle for MockBackend {
    async fn categorize(&self, description: &str) -> Result<Category> {
        self.simulate_latency(description).await;
        if !self.healthy {
            return Err(Error::Oracle("mock backend is unhealthy".to_string()));
        }

        let d = description.to_uppercase();
        let category = if d.contains("COFFEE") || d.contains("RESTAURANT") || d.contains("PIZZA") {
            Category::Food
        } else if d.contains("GROCER") || d.contains("MARKET") || d.contains("WHOLE FOODS") {
            Category::Groceries
        } else if d.contains("SHELL") || d.contains("CHEVRON") || d.contains("FUEL") {
            Category::Gas
        } else if d.contains("ELECTRIC") || d.contains("WATER") || d.contains("INTERNET") {
            Category::Utilities
        } else if d.contains("NETFLIX") || d.contains("SPOTIFY") || d.contains("CINEMA") {
            Category::Entertainment
        } else if d.contains("PAYROLL") || d.contains("PAYCHECK") || d.contains("SALARY") {
            Category::Salary
        } else if d.contains("AMAZON") || d.contains("TARGET") {
            Category::Shopping
        } else if d.contains("AIRLINE") || d.contains("HOTEL") || d.contains("UBER") {
            Category::Travel
        } else if d.contains("FEE") || d.contains("INTEREST CHARGE") {
            Category::Fees
        } else if d.contains("PHARMACY") || d.contains("CLINIC") {
            Category::Health
        } else if d.contains("GIFT") {
            Category::Gifts
        } else if d.contains("TRANSFER") || d.contains("ZELLE") || d.contains("VENMO") {
            Category::Transfer
        } else if d.contains("TUITION") || d.contains("SCHOOL") {
            Category::Education
        } else if d.contains("DAYCARE") || d.contains("CHILDCARE") {
            Category::Family
        } else {
            Category::Other
        };

        Ok(category)
    }

    async fn advise(&self, total_income: f64, total_expenses: f64) -> Result<String> {
        if !self.healthy {
            return Err(Error::Oracle("mock backend is unhealthy".to_string()));
        }
        Ok(format!(
            "With ${:.2} coming in and ${:.2} going out, keep doing what works.",
            total_income, total_expenses
        ))
    }

    async fn draft_budget(&self, total_income: f64, total_expenses: f64) -> Result<String> {
        if !self.healthy {
            return Err(Error::Oracle("mock backend is unhealthy".to_string()));
        }
        Ok(format!(
            "Mock budget: save ${:.2} of ${:.2} income.",
            (total_income - total_expenses).max(0.0),
            total_income
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_categorize_keywords() {
        let mock = MockBackend::new();
        assert_eq!(
            mock.categorize("COFFEE SHOP #42").await.unwrap(),
            Category::Food
        );
        assert_eq!(
            mock.categorize("ACME PAYROLL DEPOSIT").await.unwrap(),
            Category::Salary
        );
        assert_eq!(
            mock.categorize("TOTALLY UNKNOWN").await.unwrap(),
            Category::Other
        );
    }

    #[tokio::test]
    async fn test_mock_unhealthy_fails() {
        let mock = MockBackend::unhealthy();
        assert!(mock.categorize("COFFEE").await.is_err());
        assert!(!mock.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_latency_still_classifies() {
        let mock = MockBackend::new().with_latency(Duration::from_millis(5));
        assert_eq!(
            mock.categorize("SHELL OIL").await.unwrap(),
            Category::Gas
        );
    }

    #[tokio::test]
    async fn test_mock_advice_is_opaque_text() {
        let mock = MockBackend::new();
        let advice = mock.advise(1000.0, 400.0).await.unwrap();
        assert!(advice.contains("1000.00"));
        assert!(mock.draft_budget(1000.0, 400.0).await.is_ok());
    }
}
