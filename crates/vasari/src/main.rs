//! Vasari CLI binary.
//!
//! Command-line access to the research-to-publish orchestrator: start
//! workflows, watch their progress, resolve the approval gate, and manage
//! past runs.

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    use cli::{Cli, build_engine, exit_code, handle_command};
    use vasari::VasariConfig;

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Credentials come from the environment; .env is a convenience.
    dotenvy::dotenv().ok();

    let result = async {
        let config = VasariConfig::load()?;
        let engine = build_engine(&config).await?;
        handle_command(&engine, cli.command).await
    }
    .await;

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::from(exit_code(&e))
        }
    }
}
