//! Artifact location, retrieval, and unpacking.
//!
//! # Sub-modules
//!
//! - [`locator`]: URL synthesis and version derivation (`ArtifactLocator`).
//! - [`download`]: Fetching remote artifacts and copying local ones.
//! - [`extraction`]: Tarball and zip extraction with path traversal protection.

pub mod download;
pub mod extraction;
pub mod locator;
