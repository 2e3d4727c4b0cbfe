//! Input validation for amounts and dates

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Sign constraint applied when validating an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignRule {
    /// Amount must be strictly positive (stored magnitudes)
    Positive,
    /// Any parsable amount is accepted (signed statement values)
    Any,
}

/// Parse a decimal amount from text and enforce a sign constraint
pub fn validate_amount(raw: &str, rule: SignRule) -> Result<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAmount(format!("not a number: {:?}", raw)))?;

    if !amount.is_finite() {
        return Err(Error::InvalidAmount(format!("not finite: {:?}", raw)));
    }

    check_sign(amount, rule)?;
    Ok(amount)
}

/// Enforce a sign constraint on an already-numeric amount
pub fn check_sign(amount: f64, rule: SignRule) -> Result<f64> {
    match rule {
        // `!(> 0.0)` rather than `<= 0.0` so NaN also fails the constraint
        SignRule::Positive if !(amount > 0.0) => Err(Error::SignViolation(format!(
            "amount must be positive, got {}",
            amount
        ))),
        _ => Ok(amount),
    }
}

/// Accepted date formats, tried in order. First match wins, so an ambiguous
/// input like `03/04/2024` resolves as month/day.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date from text, defaulting to today when empty or absent.
///
/// Successful parses always normalize to a calendar date rendered as
/// `YYYY-MM-DD` by the serialization layer.
pub fn validate_date(raw: Option<&str>) -> Result<NaiveDate> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Ok(today()),
    };

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }

    Err(Error::InvalidDate(format!(
        "unrecognized date {:?}, expected YYYY-MM-DD or MM/DD/YYYY",
        raw
    )))
}

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
