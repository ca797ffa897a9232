//! Turning raw assessor output into a validated report.

pub mod extract;
pub mod summary;

use casework_types::assessment::AssessmentReport;
use casework_types::error::AssessmentError;

pub use extract::extract_json_object;
pub use summary::{format_score, render_summary};

/// Extract and validate the assessment JSON from model output.
///
/// Surrounding prose is ignored. Anything that is not a complete report
/// is an error; there is no partial credit.
pub fn parse_report(raw: &str) -> Result<AssessmentReport, AssessmentError> {
    let json = extract_json_object(raw).ok_or(AssessmentError::NoJson)?;
    let report: AssessmentReport =
        serde_json::from_str(json).map_err(|e| AssessmentError::Schema(e.to_string()))?;
    report.validate().map_err(AssessmentError::Schema)?;
    Ok(report)
}
