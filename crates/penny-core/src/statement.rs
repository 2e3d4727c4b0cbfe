//! Statement tokenizer: raw lines or rows into candidate transactions
//!
//! Bank statements arrive either as a flat text stream (one token per
//! line, the usual shape of extracted PDF text) or as structured rows with
//! explicit description/amount columns. Both paths end at [`Candidate`];
//! decoding of heavier container formats happens upstream.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use regex::Regex;
use std::io::Read;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::validate::validate_date;

/// A parsed statement transaction awaiting classification.
/// `amount` keeps the statement's sign: positive credits, negative debits.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// One structured statement row (description/amount columns, optional date)
#[derive(Debug, Clone)]
pub struct RawRow {
    pub description: String,
    pub amount: String,
    pub date: Option<String>,
}

/// Line-stream tokenizer.
///
/// A record is a date token, one or more description lines, then an amount
/// token. An amount arriving with no buffered date and description is a
/// malformed record: it is logged and dropped, never fatal.
pub struct StatementParser {
    date_re: Regex,
    amount_re: Regex,
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser {
    pub fn new() -> Self {
        Self {
            // MM/DD/YY or MM/DD/YYYY
            date_re: Regex::new(r"^\d{2}/\d{2}/(\d{2}|\d{4})$").unwrap(),
            // optional minus, optional $, thousands groups, exactly two decimals
            amount_re: Regex::new(r"^-?\$?\d[\d,]*\.\d{2}$").unwrap(),
        }
    }

    /// Run the state machine over a line stream and collect candidates
    pub fn parse_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut date: Option<NaiveDate> = None;
        let mut description: Vec<&str> = Vec::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if self.date_re.is_match(line) {
                // A date token starts a fresh record; anything buffered
                // without an amount is abandoned.
                match parse_statement_date(line) {
                    Some(d) => date = Some(d),
                    None => {
                        warn!(line, "date token is not a calendar date, skipped");
                        date = None;
                    }
                }
                description.clear();
            } else if self.amount_re.is_match(line) {
                match (date.take(), description.is_empty()) {
                    (Some(d), false) => match clean_amount(line) {
                        Some(amount) => {
                            debug!(date = %d, amount, "statement candidate emitted");
                            candidates.push(Candidate {
                                date: d,
                                description: description.join(" "),
                                amount,
                            });
                        }
                        None => warn!(line, "unparsable amount, candidate discarded"),
                    },
                    _ => warn!(line, "amount with no buffered date/description, discarded"),
                }
                description.clear();
            } else {
                description.push(line);
            }
        }

        debug!(count = candidates.len(), "statement lines tokenized");
        candidates
    }
}

/// Map structured rows directly to candidates, bypassing the state machine.
/// Rows with an unparsable amount or date are dropped with a warning.
pub fn rows_to_candidates(rows: &[RawRow]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for row in rows {
        let description = row.description.trim();
        if description.is_empty() {
            warn!("row with empty description, discarded");
            continue;
        }
        let amount = match clean_amount(row.amount.trim()) {
            Some(amount) => amount,
            None => {
                warn!(amount = %row.amount, "row with unparsable amount, discarded");
                continue;
            }
        };
        let date = match validate_date(row.date.as_deref()) {
            Ok(date) => date,
            Err(e) => {
                warn!(error = %e, "row with unparsable date, discarded");
                continue;
            }
        };
        candidates.push(Candidate {
            date,
            description: description.to_string(),
            amount,
        });
    }

    candidates
}

/// Read `Description`/`Amount` (and optional `Date`) columns from CSV data
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let desc_col = find("Description")
        .ok_or_else(|| Error::Import("missing Description column".into()))?;
    let amount_col =
        find("Amount").ok_or_else(|| Error::Import("missing Amount column".into()))?;
    let date_col = find("Date");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(RawRow {
            description: record.get(desc_col).unwrap_or("").to_string(),
            amount: record.get(amount_col).unwrap_or("").to_string(),
            date: date_col
                .and_then(|c| record.get(c))
                .map(|s| s.to_string())
                .filter(|s| !s.trim().is_empty()),
        });
    }

    debug!(count = rows.len(), "statement rows read");
    Ok(rows)
}

/// Strip `$` and thousands separators, then parse. The sign survives.
fn clean_amount(raw: &str) -> Option<f64> {
    raw.replace(['$', ','], "").parse().ok()
}

fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%y"))
        .ok()
}
