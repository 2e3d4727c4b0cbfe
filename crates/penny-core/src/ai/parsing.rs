//! Response parsing for oracle backends
//!
//! Chat models rarely answer with the bare token they were asked for, so
//! the category is extracted by scanning the response for the first word
//! that belongs to the taxonomy.

use crate::error::{Error, Result};
use crate::models::Category;

/// Extract a category from a model response.
///
/// Tries the whole trimmed response first, then individual words. A
/// response with no recognizable category token is a malformed-response
/// error; the lenient boundary upstream turns that into `Other`.
pub fn parse_category(response: &str) -> Result<Category> {
    let trimmed = response.trim();

    if let Some(category) = Category::parse(trimmed) {
        return Ok(category);
    }

    for token in trimmed.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if let Some(category) = Category::parse(token) {
            return Ok(category);
        }
    }

    // Truncate long responses for the error message
    let raw = if trimmed.len() > 200 {
        format!("{}...", &trimmed[..200])
    } else {
        trimmed.to_string()
    };
    Err(Error::OracleResponse(format!(
        "no category token in response: {:?}",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_token() {
        assert_eq!(parse_category("groceries").unwrap(), Category::Groceries);
        assert_eq!(parse_category("  Food \n").unwrap(), Category::Food);
    }

    #[test]
    fn test_token_inside_chatter() {
        assert_eq!(
            parse_category("This transaction is best described as \"entertainment\".").unwrap(),
            Category::Entertainment
        );
        assert_eq!(
            parse_category("Category: salary").unwrap(),
            Category::Salary
        );
    }

    #[test]
    fn test_first_known_token_wins() {
        assert_eq!(
            parse_category("either travel or food").unwrap(),
            Category::Travel
        );
    }

    #[test]
    fn test_no_token_is_error() {
        assert!(matches!(
            parse_category("I cannot classify this."),
            Err(Error::OracleResponse(_))
        ));
        assert!(matches!(parse_category(""), Err(Error::OracleResponse(_))));
    }
}
