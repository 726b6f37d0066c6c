//! Common types and utilities shared across the mapfile viewer crates.

pub mod error;
pub mod extent;
pub mod projection;
pub mod units;

pub use error::{ViewerError, ViewerResult};
pub use extent::{Extent, ExtentParseError};
pub use projection::{ProjectionCode, FALLBACK_PROJECTION};
pub use units::{resolutions, ScaleList, UnitKind};
