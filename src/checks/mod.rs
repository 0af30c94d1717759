//! Health-check engine.
//!
//! # Data Flow
//! ```text
//! register(id, timeout, procedure)
//!     → registry.rs (copy-on-write tree, ancestors created implicitly)
//!
//! invoke(id)
//!     → registry.rs (point-in-time subtree snapshot)
//!     → aggregator.rs (fan out, join, fold bottom-up)
//!         → executor.rs (one bounded run per procedure)
//!             → promise.rs (single-fulfillment completion)
//!     → result.rs (CheckResult tree, classification)
//! ```
//!
//! # Design Decisions
//! - A node is UP iff its own procedure is up and every child is UP
//! - Faults and timeouts become DOWN data at the faulting node only
//! - Registries are explicit values; there is no process-wide instance

pub mod aggregator;
pub mod error;
pub mod executor;
pub mod identifier;
pub mod procedure;
pub mod promise;
pub mod registry;
pub mod result;
pub mod status;

pub use aggregator::HealthChecks;
pub use error::{CheckError, ProcedureFault};
pub use identifier::Identifier;
pub use procedure::Procedure;
pub use promise::Promise;
pub use registry::{Node, Registry, DEFAULT_TIMEOUT};
pub use result::{CheckResult, Classification, Outcome};
pub use status::{Data, Status, EXECUTION_FAILURE};
