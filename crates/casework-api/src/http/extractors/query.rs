//! Query parameter extractors.

use serde::Deserialize;

use casework_types::case::CaseId;

use crate::http::error::AppError;

/// `?case_id=<uuid>` on the chat lookup endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct CaseQuery {
    pub case_id: Option<String>,
}

impl CaseQuery {
    /// No `case_id` given, or only whitespace.
    pub fn is_missing(&self) -> bool {
        self.case_id.as_deref().is_none_or(|s| s.trim().is_empty())
    }

    /// The parsed case id; missing or malformed ids are validation errors.
    pub fn case_id(&self) -> Result<CaseId, AppError> {
        let raw = self
            .case_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("case_id is required".to_string()))?;
        raw.parse()
            .map_err(|_| AppError::Validation(format!("invalid case_id '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        assert!(CaseQuery::default().is_missing());
        assert!(CaseQuery { case_id: Some("  ".into()) }.is_missing());
        assert!(!CaseQuery { case_id: Some("abc".into()) }.is_missing());
    }

    #[test]
    fn test_case_id_parses() {
        let id = CaseId::new();
        let query = CaseQuery {
            case_id: Some(id.to_string()),
        };
        assert_eq!(query.case_id().unwrap(), id);
    }

    #[test]
    fn test_missing_and_malformed_case_id_rejected() {
        for case_id in [None, Some(""), Some("not-a-uuid")] {
            let query = CaseQuery {
                case_id: case_id.map(str::to_string),
            };
            assert!(matches!(query.case_id(), Err(AppError::Validation(_))));
        }
    }
}
