//! OGC web service request handling for the render proxy.
//!
//! Only the parameters the proxy must inspect are typed; everything else is
//! passed through to the rendering engine as received.

pub mod error;
pub mod request;

pub use error::{OwsError, OwsResult};
pub use request::{encode_query, RenderRequest, RequestKind, DEFAULT_LEGEND_FORMAT};
