//! Subcommands of the `stored-object` binary.
//! Each one resolves a key to a [`StoredObject`] and delegates to it; no
//! storage logic lives here.

use crate::config::AppConfig;
use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use clap::Subcommand;
use std::{fs, io::Write, path::PathBuf};
use stored_object::{Properties, StoredObject};
use tracing::info;

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_MD5: &str = "Content-MD5";
const USER_META_PREFIX: &str = "x-amz-meta-";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show size, timestamps and checksum of an object
    Stat {
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the MD5 of an object's content (empty if unreadable)
    Hash { key: String },
    /// Print the stored metadata of an object
    Props { key: String },
    /// Replace the stored metadata of an object
    SetProps {
        key: String,
        /// Entries as KEY=VALUE
        #[arg(value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },
    /// Copy a local file into the store and record its metadata
    Put {
        key: String,
        source: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
        /// User metadata as NAME=VALUE, stored as x-amz-meta-NAME
        #[arg(long = "meta", value_parser = parse_pair)]
        meta: Vec<(String, String)>,
    },
    /// Delete an object and its metadata
    Delete { key: String },
}

fn parse_pair(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got `{}`", raw))?;
    if key.is_empty() {
        return Err(anyhow!("empty key in `{}`", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Execute `command`, writing its report to `out`.
pub fn run(cfg: &AppConfig, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Stat { key, json } => {
            let summary = open(cfg, &key)?.summary();
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            } else {
                writeln!(out, "name:          {}", summary.name)?;
                writeln!(out, "size:          {}", summary.size)?;
                writeln!(out, "last modified: {}", summary.last_modified)?;
                writeln!(out, "iso8601:       {}", summary.last_modified_iso8601)?;
                writeln!(out, "md5:           {}", summary.content_md5)?;
                writeln!(out, "exists:        {}", summary.exists)?;
                writeln!(out, "properties:    {}", summary.has_properties)?;
            }
        }
        Command::Hash { key } => {
            writeln!(out, "{}", open(cfg, &key)?.content_hash())?;
        }
        Command::Props { key } => {
            let object = open(cfg, &key)?;
            let properties = match object.properties() {
                Ok(properties) => properties,
                Err(err) if err.is_not_found() => {
                    info!("no metadata stored for `{}`", key);
                    Properties::new()
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("reading metadata of `{}`", key));
                }
            };
            for (name, value) in &properties {
                writeln!(out, "{}={}", name, value)?;
            }
        }
        Command::SetProps { key, pairs } => {
            let object = open(cfg, &key)?;
            let properties: Properties = pairs.into_iter().collect();
            object
                .store_properties(&properties)
                .with_context(|| format!("writing metadata of `{}`", key))?;
            info!("stored {} properties for `{}`", properties.len(), key);
        }
        Command::Put {
            key,
            source,
            content_type,
            meta,
        } => {
            let object = open(cfg, &key)?;
            if let Some(parent) = object.path().parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
            let copied = fs::copy(&source, object.path())
                .with_context(|| format!("copying {} into the store", source.display()))?;
            let digest = object
                .content_digest()
                .with_context(|| format!("hashing `{}`", key))?;

            let mut properties = Properties::new();
            if let Some(content_type) = content_type {
                properties.insert(CONTENT_TYPE.into(), content_type);
            }
            properties.insert(CONTENT_MD5.into(), general_purpose::STANDARD.encode(digest.0));
            for (name, value) in meta {
                properties.insert(format!("{}{}", USER_META_PREFIX, name), value);
            }
            object
                .store_properties(&properties)
                .with_context(|| format!("writing metadata of `{}`", key))?;

            info!("stored `{}` ({} bytes)", key, copied);
            writeln!(out, "{:x}", digest)?;
        }
        Command::Delete { key } => {
            open(cfg, &key)?.delete();
            info!("deleted `{}`", key);
        }
    }
    Ok(())
}

fn open(cfg: &AppConfig, key: &str) -> Result<StoredObject> {
    Ok(StoredObject::new(cfg.object_path(key)?))
}
