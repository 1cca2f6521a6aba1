//! Represents an object (file) stored in a bucket directory, together with
//! its metadata sidecar.

use crate::{
    errors::ObjectResult,
    format::{format_iso8601, format_size, format_user_time},
    models::properties::{Properties, read_properties, write_properties},
};
use chrono::{DateTime, Utc};
use md5::{Context, Digest};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{self, ErrorKind, Read},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Filename prefix of the metadata sidecar. Part of the on-disk format.
pub const PROPERTIES_PREFIX: &str = "__ninja_";
/// Filename suffix of the metadata sidecar.
pub const PROPERTIES_SUFFIX: &str = ".properties";

const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// A single object: a content file plus a `__ninja_<name>.properties`
/// sidecar in the same directory holding its metadata
/// (`Content-Type`, `Content-MD5`, `x-amz-meta-*` headers).
///
/// The value holds nothing but the content path. Every accessor looks at the
/// filesystem at call time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    path: PathBuf,
}

/// Snapshot of the display accessors of an object.
#[derive(Serialize, Clone, Debug)]
pub struct ObjectSummary {
    pub name: String,
    pub size: String,
    pub size_bytes: u64,
    pub last_modified: String,
    pub last_modified_iso8601: String,
    pub content_md5: String,
    pub exists: bool,
    pub has_properties: bool,
}

impl StoredObject {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The content file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last segment of the content path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Content length in bytes; 0 when the file cannot be stat'ed.
    pub fn len(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// True when the content is missing or has zero length.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable content size, `"0 bytes"` for a missing file.
    pub fn size(&self) -> String {
        format_size(self.len())
    }

    /// Content modification time; the Unix epoch when unavailable.
    pub fn modified(&self) -> DateTime<Utc> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn last_modified(&self) -> String {
        format_user_time(self.modified())
    }

    pub fn last_modified_iso8601(&self) -> String {
        format_iso8601(self.modified())
    }

    /// Lowercase hex MD5 of the content, streamed in fixed-size chunks.
    ///
    /// Returns an empty string if the content cannot be read.
    pub fn content_hash(&self) -> String {
        match self.content_digest() {
            Ok(digest) => format!("{:x}", digest),
            Err(err) => {
                debug!("cannot hash {}: {}", self.path.display(), err);
                String::new()
            }
        }
    }

    /// Raw MD5 of the content. Unlike [`Self::content_hash`] this reports
    /// read failures.
    pub fn content_digest(&self) -> io::Result<Digest> {
        let mut file = File::open(&self.path)?;
        let mut context = Context::new();
        let mut buf = [0u8; HASH_CHUNK_SIZE];
        loop {
            let read = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            context.consume(&buf[..read]);
        }
        Ok(context.compute())
    }

    /// True iff the content file is present. The sidecar is not consulted.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Remove the content file and the sidecar.
    ///
    /// Both removals are attempted; failures are logged and never returned,
    /// so deleting an already deleted object is a no-op.
    pub fn delete(&self) {
        remove_quietly(&self.path);
        remove_quietly(&self.properties_path());
    }

    /// Sidecar location: `<dir>/__ninja_<name>.properties`.
    pub fn properties_path(&self) -> PathBuf {
        let file_name = format!("{}{}{}", PROPERTIES_PREFIX, self.name(), PROPERTIES_SUFFIX);
        match self.path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    pub fn has_properties(&self) -> bool {
        self.properties_path().is_file()
    }

    /// Load all metadata stored for this object.
    ///
    /// Fails with an I/O `NotFound` error when no sidecar has been written
    /// yet; callers decide whether that means "no properties".
    pub fn properties(&self) -> ObjectResult<Properties> {
        let file = File::open(self.properties_path())?;
        read_properties(file)
    }

    /// Replace the stored metadata with `properties`. No merge with what was
    /// stored before.
    pub fn store_properties(&self, properties: &Properties) -> ObjectResult<()> {
        let path = self.properties_path();
        let file = File::create(&path)?;
        write_properties(file, properties)?;
        debug!(
            "stored {} properties in {}",
            properties.len(),
            path.display()
        );
        Ok(())
    }

    pub fn summary(&self) -> ObjectSummary {
        let modified = self.modified();
        let size_bytes = self.len();
        ObjectSummary {
            name: self.name(),
            size: format_size(size_bytes),
            size_bytes,
            last_modified: format_user_time(modified),
            last_modified_iso8601: format_iso8601(modified),
            content_md5: self.content_hash(),
            exists: self.exists(),
            has_properties: self.has_properties(),
        }
    }
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(_) => debug!("removed {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("file {} already missing", path.display());
        }
        Err(err) => warn!("could not remove {}: {}", path.display(), err),
    }
}
