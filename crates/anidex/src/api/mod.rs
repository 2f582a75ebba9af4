//! Jikan API v4 access.
//!
//! Every outbound call goes through a single [`RequestQueue`] that spaces
//! dispatches by a fixed interval, so the upstream per-second limit is never
//! exceeded no matter how many callers are waiting.

pub mod client;
pub mod error;
pub mod queue;
pub mod transport;
pub mod types;

pub use client::JikanClient;
pub use error::{JikanError, QueueError, TransportError};
pub use queue::{RawResponse, RequestQueue, RequestSpec};
pub use transport::{HttpTransport, Transport};
pub use types::*;
