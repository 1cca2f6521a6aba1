//! Local-filesystem object storage entries.
//!
//! A [`StoredObject`] is a content file plus a `__ninja_<name>.properties`
//! sidecar carrying its metadata (content type, upload MD5, `x-amz-meta-*`
//! headers). Display accessors such as [`StoredObject::content_hash`] never
//! fail; metadata access returns [`ObjectResult`].

pub mod errors;
pub mod format;
pub mod models;

pub use errors::{ObjectError, ObjectResult};
pub use models::{
    properties::Properties,
    stored_object::{ObjectSummary, StoredObject},
};
