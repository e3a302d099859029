//! GMA addon parsing and extraction.
//!
//! A GMA file bundles addon metadata and any number of named files into
//! one blob. This module decodes the metadata and file table, then
//! writes the files out concurrently.
//!
//! ## Architecture
//!
//! - [`structures`]: the addon, its file entries and the type/tag vocabularies
//! - [`description`]: the description field, plain text or JSON metadata
//! - [`parser`]: single-pass decoding from any [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: concurrent extraction to a directory tree
//!
//! ## Format Versions
//!
//! - Version 1: no required-content list
//! - Versions 2 and 3: required-content strings after the timestamp
//!
//! ## Limitations
//!
//! - CRCs are stored but not verified
//! - Each file is buffered whole in memory while it is written
//! - No writing of GMA files

pub mod description;
pub mod extractor;
pub mod parser;
pub mod structures;

pub use description::Description;
pub use extractor::AddonExtractor;
pub use parser::{parse_addon, AddonParser};
pub use structures::*;
