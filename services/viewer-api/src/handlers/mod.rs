//! HTTP request handlers.
//!
//! - `viewer`: the HTML viewer page
//! - `static_files`: assets under the configured static root
//! - `ows`: the render proxy
//! - `common`: plain-text responses and path redaction

pub mod common;
pub mod ows;
pub mod static_files;
pub mod viewer;

pub use common::{error_response, plain_text, redact_paths};
pub use ows::ows_handler;
pub use static_files::static_handler;
pub use viewer::viewer_handler;
