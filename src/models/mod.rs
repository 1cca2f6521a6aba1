//! Core data model: a stored object and the properties format of its
//! metadata sidecar.
//!
//! Objects are plain values wrapping a content path; nothing is cached, every
//! accessor reads the filesystem when called.

pub mod properties;
pub mod stored_object;
