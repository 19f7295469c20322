use anyhow::Result;
use clap::Parser;
use std::io::Write;
use tracing::info;

use coverdeck::config::Config;
use coverdeck::display::{self, Outcome};

#[derive(Parser, Debug)]
#[command(name = "coverdeck")]
#[command(author, version, about = "Companion client for a media-control server")]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Server address (overrides the stored one)
    #[arg(short, long)]
    server: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Now-playing poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coverdeck=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    if let Some(server) = &args.server {
        config.server.address = server.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(interval) = args.interval_ms {
        config.display.refresh_interval_ms = interval;
    }

    if !config.has_address() {
        config.server.address = prompt_address("Enter server address: ")?;
        config.save_to_default_path()?;
    }

    loop {
        info!("starting UI against {}", config.server.address);
        match display::terminal::run(config.clone()).await? {
            Outcome::Quit => break,
            Outcome::ReenterAddress => {
                config.server.address = prompt_address("Enter new server address: ")?;
                config.save_to_default_path()?;
            }
        }
    }

    Ok(())
}

/// Blocking stdin prompt, used before the terminal UI takes over the
/// screen. Loops until a non-empty line comes in.
fn prompt_address(prompt: &str) -> Result<String> {
    loop {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}
