//! Case catalogue CLI commands: import, list.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use casework_core::service::case::Catalog;

use crate::state::AppState;

/// Import agents and cases from a TOML catalogue.
///
/// ```toml
/// [[agents]]
/// name = "Dana"
/// position = "Head of Procurement"
/// prompt = "Skeptical, numbers-driven."
///
/// [[cases]]
/// slug = "supplier-negotiation"
/// title = "Supplier negotiation"
/// agent = "Dana"
/// ```
pub async fn import_catalog(state: &AppState, path: &Path, json: bool) -> Result<()> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let catalog = Catalog::from_toml(&source)?;
    let summary = state.case_service.import(&catalog).await?;

    if json {
        let out = serde_json::json!({
            "agents": summary.agents,
            "cases": summary.cases,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Imported {} agent(s) and {} case(s) from {}",
        style("✓").green().bold(),
        style(summary.agents).cyan(),
        style(summary.cases).cyan(),
        style(path.display()).dim()
    );
    println!();
    Ok(())
}

/// List every case in catalogue order.
pub async fn list_cases(state: &AppState, json: bool) -> Result<()> {
    let cases = state.case_service.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cases)?);
        return Ok(());
    }

    if cases.is_empty() {
        println!();
        println!(
            "  {} No cases found. Import some with: {}",
            style("i").blue().bold(),
            style("casework import <catalogue.toml>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Slug").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Difficulty").fg(Color::White),
        Cell::new("Tags").fg(Color::White),
        Cell::new("Visibility").fg(Color::White),
    ]);

    for case in &cases {
        let visibility = if case.is_public {
            Cell::new("● public").fg(Color::Green)
        } else {
            Cell::new("○ hidden").fg(Color::DarkGrey)
        };
        let difficulty = case
            .difficulty
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&case.slug).fg(Color::Cyan),
            Cell::new(truncate(case.title.as_deref().unwrap_or(""), 50)),
            Cell::new(difficulty),
            Cell::new(case.tags.join(", ")),
            visibility,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} case(s)", cases.len());
    println!();
    Ok(())
}

/// Shorten to at most `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
