//! Markdown summary appended to a chat once it has been assessed.

use casework_types::assessment::{AssessmentOutcome, AssessmentReport};

/// Format a percentage the way learners see it: `85`, `72.5`.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the assessment summary message.
pub fn render_summary(report: &AssessmentReport, score: f64, outcome: AssessmentOutcome) -> String {
    let feedback = &report.detailed_feedback;
    format!(
        "## Assessment Complete! 🎓\n\n\
         **Overall Score: {score}%**\n\
         **Status: {status}**\n\n\
         ### Strengths:\n{strengths}\n\n\
         ### Areas for Improvement:\n{improvements}\n\n\
         ### Growth Points:\n{growth}\n\n\
         ### Overall Performance:\n{overall}\n\n\
         ### Recommendations:\n{recommendations}",
        score = format_score(score),
        status = outcome.label(),
        strengths = bullets(&feedback.strengths),
        improvements = bullets(&feedback.areas_for_improvement),
        growth = bullets(&feedback.growth_points),
        overall = feedback.overall_performance,
        recommendations = bullets(&report.recommendations),
    )
}
