//! HTTP boundary over the health-check engine.
//!
//! # Data Flow
//! ```text
//! GET {prefix}/{path}
//!     → request.rs (request ID, path → identifier)
//!     → auth.rs (optional bearer token, 403 on mismatch)
//!     → server.rs (HealthChecks::invoke)
//!     → response.rs (classification → status code, JSON body)
//! ```
//!
//! # Design Decisions
//! - The boundary holds no state of its own beyond the engine handle
//! - "No checks installed" (204) is distinct from healthy (200)
//! - Machinery faults (500) are distinct from unhealthy checks (503)

pub mod auth;
pub mod request;
pub mod response;
pub mod server;
pub mod tls;

pub use request::X_REQUEST_ID;
pub use response::{health_response, status_code, JSON_CONTENT_TYPE};
pub use server::HealthServer;
