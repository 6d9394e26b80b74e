//! Request middleware.
//!
//! Outermost first, as assembled in `main` and [`crate::app`]: Sentry,
//! `TraceLayer`, request ID, then the shopper session.

pub mod request_id;
pub mod session;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::create_session_layer;
