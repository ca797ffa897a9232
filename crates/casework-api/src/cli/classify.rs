//! `casework classify` - show the outcome a score maps to.

use anyhow::Result;
use console::style;

use casework_types::assessment::{clamp_percentage, classify, AssessmentOutcome};

pub fn classify_score(score: f64, json: bool) -> Result<()> {
    let clamped = clamp_percentage(score);
    let outcome = classify(score);

    if json {
        let out = serde_json::json!({
            "score": clamped,
            "status": outcome.to_string(),
            "label": outcome.label(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let label = match outcome {
        AssessmentOutcome::Passed => style(outcome.label()).green().bold(),
        AssessmentOutcome::CanBeImproved => style(outcome.label()).yellow().bold(),
        AssessmentOutcome::NotPassed => style(outcome.label()).red().bold(),
    };
    println!();
    println!("  {:.1}% {} {}", clamped, style("->").dim(), label);
    println!("  {}", style(format!("status: {outcome}")).dim());
    println!();
    Ok(())
}
