//! Casework CLI and REST API entry point.
//!
//! Binary name: `casework`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use casework_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use cli::{Cli, Commands, ListResource, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    init_tracing(otel, verbosity_filter(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Commands that don't need app state
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "casework", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Classify { score } => return cli::classify::classify_score(*score, cli.json),
        _ => {}
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::User { action } => match action {
            UserCommand::Create { email } => {
                cli::user::create_user(&state, email, cli.json).await?;
            }
        },

        Commands::Import { file } => {
            cli::case::import_catalog(&state, &file, cli.json).await?;
        }

        Commands::List { resource } => match resource {
            ListResource::Cases => {
                cli::case::list_cases(&state, cli.json).await?;
            }
        },

        Commands::Serve { port, host, .. } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(%addr, data_dir = %state.data_dir.display(), "server listening");
            if !cli.quiet {
                println!(
                    "  {} Casework API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            shutdown_tracing();
            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } | Commands::Classify { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
