use anyhow::Context;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quiz_app::{
    config::Config,
    platform::QuizPlatform,
    terminal::{Flow, HELP, Terminal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting TechQuiz...");

    let platform = QuizPlatform::open(&config)
        .await
        .with_context(|| format!("Failed to open record store at {}", config.database_url))?;
    let mut terminal = Terminal::new(platform);

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = terminal.timer_deadline();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if terminal.handle_line(&line).await == Flow::Quit {
                    break;
                }
            }
            _ = countdown(deadline) => {
                terminal.on_timer().await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Goodbye.");
    Ok(())
}

/// Resolves at the deadline; never resolves without one.
async fn countdown(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
