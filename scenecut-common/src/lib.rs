//! # scenecut common library
//!
//! Programmatic FCPXML authoring:
//! - Frame-exact rational timing over the fixed 24,000 timebase
//! - Deterministic media UIDs and text-style identifiers
//! - A typed document model with one flat resource-ID namespace
//! - Registry/transaction machinery for atomic resource creation
//! - Spine assembly with chronological ordering guarantees
//! - An XML serializer/parser for the on-disk interchange format

pub mod bookmark;
pub mod config;
pub mod edits;
pub mod error;
pub mod ids;
pub mod model;
pub mod probe;
pub mod registry;
pub mod timeline;
pub mod timing;
pub mod transaction;
pub mod xml;

pub use error::{Error, Result};
