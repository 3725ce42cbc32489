//! Free-text search query parsing

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_POSITION: &str = "Software Engineer";
pub const DEFAULT_ROUND: &str = "Technical";

/// Trailing words that name an interview round
static ROUND_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(technical|behavioral|manager|hr|phone|coding|design|onsite|final)$").unwrap()
});

static WORD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());

/// The (company, position, round) triple a search resolves to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchTarget {
    pub company: String,
    pub position: String,
    pub round: String,
}

impl SearchTarget {
    pub fn new(
        company: impl Into<String>,
        position: impl Into<String>,
        round: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            position: position.into(),
            round: round.into(),
        }
    }

    /// Canonical query string for this target, as shown in the search box
    pub fn query(&self) -> String {
        format!("{}, {}, {}", self.company, self.position, self.round)
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.company, self.position, self.round)
    }
}

/// Maps loose round wording onto one of the known interview rounds
pub fn normalize_round(round: &str) -> String {
    let lower = round.trim().to_lowercase();

    let normalized = if ["hr", "phone", "recruiter"].iter().any(|k| lower.contains(k)) {
        "Recruiter Screen"
    } else if ["behav", "cultur", "fit"].iter().any(|k| lower.contains(k)) {
        "Behavioral"
    } else if lower.contains("manager") || lower == "hm" {
        "Hiring Manager"
    } else if lower.contains("design") || lower.contains("arch") {
        "System Design"
    } else if lower.contains("site") || lower.contains("final") {
        "Onsite"
    } else {
        DEFAULT_ROUND
    };

    normalized.to_string()
}

/// Parses queries like `"Google, Senior SWE, behavioral"` or `"Stripe backend design"`.
///
/// Comma-separated input is read positionally. Otherwise the first word is the
/// company, a trailing round keyword sets the round, and the words in between
/// form the position.
pub fn parse_search_query(query: &str) -> Result<SearchTarget, DomainError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(DomainError::validation("Search query is empty"));
    }

    if query.contains(',') {
        let parts: Vec<&str> = query
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        match parts.as_slice() {
            [company, position, round, ..] => {
                return Ok(SearchTarget::new(*company, *position, normalize_round(round)));
            }
            [company, position] => {
                return Ok(SearchTarget::new(*company, *position, DEFAULT_ROUND));
            }
            _ => {}
        }
    }

    let words: Vec<&str> = WORD_SEPARATOR
        .split(query)
        .filter(|word| !word.is_empty())
        .collect();

    let Some((company, rest)) = words.split_first() else {
        return Err(DomainError::validation("Search query is empty"));
    };

    let (position_words, round) = match rest.split_last() {
        Some((last, middle)) if ROUND_KEYWORD.is_match(last) => {
            (middle, normalize_round(last))
        }
        _ => (rest, DEFAULT_ROUND.to_string()),
    };

    let position = if position_words.is_empty() {
        DEFAULT_POSITION.to_string()
    } else {
        position_words.join(" ")
    };

    Ok(SearchTarget::new(*company, position, round))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated_query() {
        let target = parse_search_query("Google, Senior SWE, behavioral").unwrap();
        assert_eq!(target, SearchTarget::new("Google", "Senior SWE", "Behavioral"));
    }

    #[test]
    fn test_two_part_query_defaults_round() {
        let target = parse_search_query("Stripe,  Backend Engineer ").unwrap();
        assert_eq!(target.round, "Technical");
        assert_eq!(target.position, "Backend Engineer");
    }

    #[test]
    fn test_words_with_round_keyword() {
        let target = parse_search_query("Meta product manager phone").unwrap();
        assert_eq!(
            target,
            SearchTarget::new("Meta", "product manager", "Recruiter Screen")
        );
    }

    #[test]
    fn test_words_without_round_keyword() {
        let target = parse_search_query("Netflix data engineer").unwrap();
        assert_eq!(target, SearchTarget::new("Netflix", "data engineer", "Technical"));
    }

    #[test]
    fn test_company_and_round_only() {
        let target = parse_search_query("Amazon onsite").unwrap();
        assert_eq!(target, SearchTarget::new("Amazon", "Software Engineer", "Onsite"));
    }

    #[test]
    fn test_single_word_query() {
        let target = parse_search_query("  Airbnb ").unwrap();
        assert_eq!(
            target,
            SearchTarget::new("Airbnb", "Software Engineer", "Technical")
        );
    }

    #[test]
    fn test_empty_query_is_validation_error() {
        assert!(matches!(
            parse_search_query("   "),
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            parse_search_query(" , , "),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_normalize_round() {
        assert_eq!(normalize_round("HR screen"), "Recruiter Screen");
        assert_eq!(normalize_round("culture fit"), "Behavioral");
        assert_eq!(normalize_round("hm"), "Hiring Manager");
        assert_eq!(normalize_round("Architecture"), "System Design");
        assert_eq!(normalize_round("final loop"), "Onsite");
        assert_eq!(normalize_round("coding"), "Technical");
    }

    #[test]
    fn test_target_query_round_trips() {
        let target = SearchTarget::new("Google", "SWE", "Behavioral");
        assert_eq!(parse_search_query(&target.query()).unwrap(), target);
    }
}
