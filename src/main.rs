use anyhow::Result;
use std::io;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // --- Parse config + command ---
    let (cfg, command) = config::AppConfig::from_env_and_args()?;

    tracing::debug!("Starting stored-object with config: {:?}", cfg);

    if !cfg.storage_dir.is_dir() {
        tracing::warn!(
            "Storage directory {} does not exist",
            cfg.storage_dir.display()
        );
    }

    let stdout = io::stdout();
    commands::run(&cfg, command, &mut stdout.lock())
}
