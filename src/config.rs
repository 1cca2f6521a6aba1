use crate::commands::Command;
use anyhow::{Result, bail};
use clap::Parser;
use std::{
    env,
    path::{Component, Path, PathBuf},
};
use stored_object::models::stored_object::PROPERTIES_PREFIX;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const DEFAULT_STORAGE_DIR: &str = "./data/objects";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_dir: PathBuf,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and manage locally stored objects")]
pub struct Args {
    /// Directory where objects are stored (overrides OBJECT_STORE_STORAGE_DIR)
    #[arg(long, global = true)]
    pub storage_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        let args = Args::parse();
        let cfg = Self::resolve(args.storage_dir, env::var("OBJECT_STORE_STORAGE_DIR").ok());
        Ok((cfg, args.command))
    }

    /// CLI value wins over the environment, which wins over the default.
    fn resolve(cli_storage: Option<String>, env_storage: Option<String>) -> Self {
        let storage_dir = cli_storage
            .or(env_storage)
            .unwrap_or_else(|| DEFAULT_STORAGE_DIR.into());
        Self {
            storage_dir: PathBuf::from(storage_dir),
        }
    }

    /// Map an object key like `photos/2025/img.jpg` to its content path
    /// beneath the storage directory.
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        ensure_key_safe(key)?;
        Ok(self.storage_dir.join(key))
    }
}

/// Reject keys that could escape the storage directory or collide with a
/// metadata sidecar.
fn ensure_key_safe(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        bail!("invalid object key `{}`: must be 1 to {} bytes", key, MAX_OBJECT_KEY_LEN);
    }
    if key.starts_with('/') || key.contains("..") {
        bail!("invalid object key `{}`: must be relative without `..`", key);
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        bail!("invalid object key `{}`: contains control characters", key);
    }
    let path = Path::new(key);
    if !path.components().all(|c| matches!(c, Component::Normal(_))) {
        bail!("invalid object key `{}`: unexpected path component", key);
    }
    if path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(PROPERTIES_PREFIX))
    {
        bail!("invalid object key `{}`: reserved for metadata files", key);
    }
    Ok(())
}
