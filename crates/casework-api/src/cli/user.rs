//! User CLI commands.

use anyhow::Result;
use console::style;

use crate::http::extractors::auth::{generate_token, hash_token};
use crate::state::AppState;

/// Create a user on the free plan and print its token once.
pub async fn create_user(state: &AppState, email: Option<String>, json: bool) -> Result<()> {
    let token = generate_token();
    let user = state
        .user_service
        .register(email.as_deref(), &hash_token(&token))
        .await?;

    if json {
        let out = serde_json::json!({
            "id": user.id,
            "email": user.email,
            "token": token,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {}",
        style("✓").green().bold(),
        style(user.email.as_deref().unwrap_or("(no email)")).cyan()
    );
    println!("  {}", style(format!("id: {}", user.id)).dim());
    println!();
    println!(
        "  {} Access token (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();
    Ok(())
}
