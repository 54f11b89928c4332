//! Middleware module providing request processing layers.
//!
//! Available middleware:
//! - `mock` - Mock rule interception
//! - `request_id` - Request tracing

pub mod mock;
pub mod request_id;

pub use mock::apply_mock;
