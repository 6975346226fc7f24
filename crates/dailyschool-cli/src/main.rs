//! Daily School - a terminal client for school announcements.
//!
//! Sign in against the school API, post announcements, browse them by
//! category and read today's newsletter. Tokens are kept in the OS keychain
//! unless `--ephemeral` is given.

mod app;
mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dailyschool_core::Config;

use app::App;
use commands::{Cli, Command};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing();
    info!("Daily School starting");

    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);

    let mut app = App::new(config, cli.ephemeral)?;
    app.start().await?;

    let result = match cli.command.unwrap_or(Command::Shell) {
        Command::Signup { email, name } => app.sign_up(email, name).await,
        Command::Login { email } => app.login(email).await,
        Command::Logout => app.logout(),
        Command::Whoami => app.whoami(),
        Command::Post {
            title,
            content,
            category,
        } => app.post(title, content, category).await,
        Command::Shell => app.run_shell().await,
    };

    app.stop();
    info!("Daily School shutting down");
    result
}
