//! MapServer mapfile reading.
//!
//! This crate provides the pieces of mapfile handling the viewer needs:
//! - a tokenizer and tolerant block parser, with `INCLUDE` expansion
//! - [`MapDescription`]: the map-level settings and layer list
//! - [`MapDocument`]: source text with extent and connection overrides
//! - concatenation of mapfile fragments into one file

pub mod concat;
pub mod description;
pub mod document;
pub mod error;
mod include;
pub mod lexer;
mod parser;

pub use concat::{concatenate_files, concatenate_sources, ConcatenatedMapfile};
pub use description::{LayerInfo, MapDescription};
pub use document::MapDocument;
pub use error::MapfileError;
pub use include::MAX_INCLUDE_DEPTH;
