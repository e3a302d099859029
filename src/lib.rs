//! # rgma
//!
//! A Rust extractor for GMA addon files with HTTP URL support using Range requests.
//!
//! A GMA file is a flat container: a header with addon metadata, a table
//! of file entries terminated by a zero id, then every file's bytes
//! concatenated in table order. This crate decodes the header and table
//! in one pass and extracts the files concurrently, reading each payload
//! with a positional read so no task shares a cursor with another.
//!
//! ## Features
//!
//! - Read GMA format versions 1 through 3
//! - Decode both plain-text and JSON descriptions (type and tags)
//! - Extract from local files or HTTP/HTTPS URLs using Range requests
//! - One extraction task per file, all joined before returning
//! - Optional confinement of entry paths to the destination directory
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use rgma::{AddonExtractor, LocalFileReader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new(Path::new("addon.gma"))?);
//!     let extractor = AddonExtractor::new(reader);
//!
//!     let addon = extractor.parse().await?;
//!     println!("{} by {}", addon.name, addon.author);
//!
//!     extractor.extract(&addon, Path::new("out")).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod gma;
pub mod io;

pub use cli::Cli;
pub use error::{GmaError, Result};
pub use gma::{parse_addon, Addon, AddonExtractor, AddonTag, AddonType, FileEntry};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt, SourceCursor};
