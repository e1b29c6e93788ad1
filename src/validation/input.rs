use super::{MAX_QUERY_LENGTH, MIN_QUERY_LENGTH};
use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::RegexSet;

/// Same substance as data_validator.py's `DANGEROUS_PATTERNS`: script
/// tags, `javascript:`, inline event handlers, `data:text/html`.
static DANGEROUS_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)on\w+\s*=",
        r"(?i)data:text/html",
    ])
    .expect("static pattern set is valid")
});

/// Phase A: validate the search request itself before dispatch, query
/// length and content, plus that every requested engine is known. A
/// failure here is the one caller-visible whole-request error;
/// everything past this point degrades to partial success.
pub fn validate_search_input(query: &str, engines: &[String], known_engines: &[String]) -> Result<(), AppError> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_LENGTH {
        return Err(AppError::InvalidInput {
            message: format!("query must be at least {MIN_QUERY_LENGTH} characters"),
        });
    }
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        return Err(AppError::InvalidInput {
            message: format!("query must be at most {MAX_QUERY_LENGTH} characters"),
        });
    }
    if DANGEROUS_PATTERNS.is_match(trimmed) {
        return Err(AppError::InvalidInput {
            message: "query contains disallowed content".to_string(),
        });
    }
    for engine in engines {
        if !known_engines.iter().any(|e| e == engine) {
            return Err(AppError::InvalidInput {
                message: format!("unknown engine: {engine}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_query() {
        let err = validate_search_input("a", &[], &[]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_script_tag() {
        let err = validate_search_input("<script>alert(1)</script>", &[], &[]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_unknown_engine() {
        let known = vec!["musicbrainz".to_string()];
        let err = validate_search_input("daft punk", &["not-an-engine".to_string()], &known).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }

    #[test]
    fn accepts_reasonable_query() {
        let known = vec!["musicbrainz".to_string()];
        assert!(validate_search_input("daft punk", &["musicbrainz".to_string()], &known).is_ok());
    }
}
