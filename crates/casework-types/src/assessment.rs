//! Rubric assessment types and the score classifier.
//!
//! `AssessmentReport` is the fixed schema the assessor model must answer with.
//! `classify` maps its percentage onto one of three terminal chat statuses.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chat::ChatStatus;

/// Scores strictly below this are `not_passed`.
pub const NOT_PASSED_BELOW: f64 = 20.0;

/// Scores strictly above this are `passed`.
pub const PASSED_ABOVE: f64 = 70.0;

/// Outcome of an assessment, derived only from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentOutcome {
    NotPassed,
    CanBeImproved,
    Passed,
}

impl AssessmentOutcome {
    /// Human-readable label used in the assessment summary ("CAN BE IMPROVED").
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentOutcome::NotPassed => "NOT PASSED",
            AssessmentOutcome::CanBeImproved => "CAN BE IMPROVED",
            AssessmentOutcome::Passed => "PASSED",
        }
    }
}

impl From<AssessmentOutcome> for ChatStatus {
    fn from(outcome: AssessmentOutcome) -> Self {
        match outcome {
            AssessmentOutcome::NotPassed => ChatStatus::NotPassed,
            AssessmentOutcome::CanBeImproved => ChatStatus::CanBeImproved,
            AssessmentOutcome::Passed => ChatStatus::Passed,
        }
    }
}

impl fmt::Display for AssessmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ChatStatus::from(*self).as_str())
    }
}

/// Clamp a raw percentage into `[0, 100]`. NaN counts as 0.
pub fn clamp_percentage(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

/// Map an assessment percentage to its outcome.
///
/// The score is clamped first. `< 20` is not passed, `20..=70` can be
/// improved, `> 70` is passed.
pub fn classify(score: f64) -> AssessmentOutcome {
    let score = clamp_percentage(score);
    if score < NOT_PASSED_BELOW {
        AssessmentOutcome::NotPassed
    } else if score <= PASSED_ABOVE {
        AssessmentOutcome::CanBeImproved
    } else {
        AssessmentOutcome::Passed
    }
}

/// Qualitative feedback sections of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedFeedback {
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub growth_points: Vec<String>,
    pub reached_goals: Vec<String>,
    pub overall_performance: String,
}

/// Score and feedback for a single rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAnalysis {
    pub score_percentage: f64,
    pub feedback: String,
}

/// The structured answer expected from the assessor model.
///
/// Every field is required; a response missing any of them is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub assessment_percentage: f64,
    pub detailed_feedback: DetailedFeedback,
    pub criteria_analysis: BTreeMap<String, CriterionAnalysis>,
    pub recommendations: Vec<String>,
    pub assessment_rationale: String,
}

impl AssessmentReport {
    /// Check the numeric fields are usable.
    ///
    /// Out-of-range percentages are clamped later, but NaN/infinite values
    /// mean the model produced garbage.
    pub fn validate(&self) -> Result<(), String> {
        if !self.assessment_percentage.is_finite() {
            return Err("assessment_percentage must be a finite number".to_string());
        }
        for (name, criterion) in &self.criteria_analysis {
            if !criterion.score_percentage.is_finite() {
                return Err(format!(
                    "criteria_analysis.{name}.score_percentage must be a finite number"
                ));
            }
        }
        Ok(())
    }
}

/// Request body for submitting a case for assessment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCaseRequest {
    #[serde(default)]
    pub final_reflection: Option<String>,
}

/// Result returned to the caller after a successful assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub success: bool,
    pub assessment_percentage: f64,
    pub status: ChatStatus,
    pub detailed_feedback: DetailedFeedback,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0.0), AssessmentOutcome::NotPassed);
        assert_eq!(classify(19.999), AssessmentOutcome::NotPassed);
        assert_eq!(classify(20.0), AssessmentOutcome::CanBeImproved);
        assert_eq!(classify(45.5), AssessmentOutcome::CanBeImproved);
        assert_eq!(classify(70.0), AssessmentOutcome::CanBeImproved);
        assert_eq!(classify(70.001), AssessmentOutcome::Passed);
        assert_eq!(classify(100.0), AssessmentOutcome::Passed);
    }

    #[test]
    fn test_classify_clamps_out_of_range() {
        assert_eq!(classify(-15.0), AssessmentOutcome::NotPassed);
        assert_eq!(classify(250.0), AssessmentOutcome::Passed);
        assert_eq!(classify(f64::NAN), AssessmentOutcome::NotPassed);
    }

    #[test]
    fn test_classify_matches_thresholds_for_every_integer_score() {
        for s in -10..=110 {
            let score = s as f64;
            let outcome = classify(score);
            let clamped = clamp_percentage(score);
            assert_eq!(outcome == AssessmentOutcome::NotPassed, clamped < 20.0, "score {s}");
            assert_eq!(outcome == AssessmentOutcome::Passed, clamped > 70.0, "score {s}");
        }
    }

    #[test]
    fn test_clamp_percentage() {
        assert_eq!(clamp_percentage(-1.0), 0.0);
        assert_eq!(clamp_percentage(101.0), 100.0);
        assert_eq!(clamp_percentage(55.5), 55.5);
        assert_eq!(clamp_percentage(f64::INFINITY), 100.0);
        assert_eq!(clamp_percentage(f64::NAN), 0.0);
    }

    #[test]
    fn test_outcome_into_chat_status() {
        assert_eq!(ChatStatus::from(AssessmentOutcome::Passed), ChatStatus::Passed);
        assert_eq!(
            ChatStatus::from(AssessmentOutcome::CanBeImproved),
            ChatStatus::CanBeImproved
        );
        assert_eq!(AssessmentOutcome::NotPassed.to_string(), "not_passed");
        assert_eq!(AssessmentOutcome::CanBeImproved.label(), "CAN BE IMPROVED");
    }

    #[test]
    fn test_report_requires_all_fields() {
        let missing_rationale = serde_json::json!({
            "assessment_percentage": 80,
            "detailed_feedback": {
                "strengths": [],
                "areas_for_improvement": [],
                "growth_points": [],
                "reached_goals": [],
                "overall_performance": "ok"
            },
            "criteria_analysis": {},
            "recommendations": []
        });
        assert!(serde_json::from_value::<AssessmentReport>(missing_rationale).is_err());
    }

    #[test]
    fn test_submit_request_accepts_empty_body() {
        let req: SubmitCaseRequest = serde_json::from_str("{}").unwrap();
        assert!(req.final_reflection.is_none());
        let req: SubmitCaseRequest =
            serde_json::from_str(r#"{"finalReflection":"I learned a lot"}"#).unwrap();
        assert_eq!(req.final_reflection.as_deref(), Some("I learned a lot"));
    }
}
