//! Hierarchical health-check registry and execution engine.
//!
//! Procedures are registered under dot-separated identifiers and form a
//! tree. Invoking any node runs every procedure below it concurrently and
//! folds the verdicts into a single [`CheckResult`] tree.
//!
//! ```no_run
//! use health_tree::{HealthChecks, Procedure, Status};
//!
//! # async fn demo() -> Result<(), health_tree::CheckError> {
//! let checks = HealthChecks::new();
//! checks.register("db", Procedure::constant(Status::up()))?;
//! let result = checks.invoke("").await?;
//! assert!(result.is_up());
//! # Ok(())
//! # }
//! ```

// Engine
pub mod checks;
pub mod probes;

// Boundary
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use checks::{
    CheckError, CheckResult, Classification, HealthChecks, Outcome, Procedure, Promise, Status,
};
pub use config::ServiceConfig;
pub use http::HealthServer;
pub use lifecycle::Shutdown;
