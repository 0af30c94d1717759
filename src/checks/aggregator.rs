//! Subtree invocation and bottom-up aggregation.
//!
//! # Data Flow
//! ```text
//! invoke(id)
//!     → registry snapshot of the subtree (NotFound if absent)
//!     → pre-order walk collecting every procedure-bearing node
//!     → join_all(executor::run ...)      all procedures concurrently
//!     → pre-order fold of the statuses    children before parent verdict
//!     → CheckResult tree
//! ```
//!
//! # Design Decisions
//! - The join is a barrier: every procedure finishes or times out
//! - Wall-clock cost is bounded by the largest timeout in the subtree
//! - Results keep the registry's child order

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::checks::error::{CheckError, ProcedureFault};
use crate::checks::executor;
use crate::checks::identifier::Identifier;
use crate::checks::procedure::Procedure;
use crate::checks::registry::{Node, Registration, Registry};
use crate::checks::result::CheckResult;
use crate::checks::status::Status;
use crate::observability::{self, metrics};

/// Health-check engine: a registry plus the invocation logic over it.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct HealthChecks {
    registry: Arc<Registry>,
}

impl HealthChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(timeout: Duration) -> Self {
        Self {
            registry: Arc::new(Registry::with_default_timeout(timeout)),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// See [`Registry::register`].
    pub fn register(&self, id: &str, procedure: Procedure) -> Result<&Self, CheckError> {
        self.registry.register(id, procedure)?;
        Ok(self)
    }

    /// See [`Registry::register_with_timeout`].
    pub fn register_with_timeout(
        &self,
        id: &str,
        timeout: Duration,
        procedure: Procedure,
    ) -> Result<&Self, CheckError> {
        self.registry.register_with_timeout(id, timeout, procedure)?;
        Ok(self)
    }

    /// See [`Registry::unregister`].
    pub fn unregister(&self, id: &str) -> bool {
        self.registry.unregister(id)
    }

    /// Run every procedure below `id` and aggregate the verdicts.
    pub async fn invoke(&self, id: &str) -> Result<CheckResult, CheckError> {
        let identifier =
            Identifier::parse(id).map_err(|_| CheckError::NotFound(id.to_string()))?;
        let subtree = self.registry.resolve(&identifier)?;

        let started = Instant::now();
        let mut pending = Vec::new();
        collect(&subtree, &mut pending);

        let statuses = join_all(
            pending
                .iter()
                .map(|registration| executor::run(&registration.procedure, registration.timeout)),
        )
        .await;

        let mut statuses = statuses.into_iter();
        let result = fold(identifier.leaf(), &subtree, &mut statuses);

        tracing::debug!(
            id = %identifier,
            procedures = pending.len(),
            outcome = result.outcome().as_str(),
            elapsed_ms = observability::millis(started.elapsed()),
            "Health checks invoked"
        );
        metrics::record_invocation(result.outcome(), started);

        Ok(result)
    }
}

/// Pre-order list of the registrations in `node`'s subtree.
fn collect<'a>(node: &'a Node, out: &mut Vec<&'a Registration>) {
    if let Some(registration) = node.registration() {
        out.push(registration);
    }
    for (_, child) in node.children() {
        collect(child, out);
    }
}

/// Rebuild the tree from statuses produced in [`collect`] order.
fn fold(id: &str, node: &Node, statuses: &mut impl Iterator<Item = Status>) -> CheckResult {
    let own = node.has_procedure().then(|| {
        statuses
            .next()
            .unwrap_or_else(|| Status::failure(&ProcedureFault::Abandoned))
    });
    let checks = node
        .children()
        .map(|(segment, child)| fold(segment, child, statuses))
        .collect();
    CheckResult::aggregate(id, own, checks)
}
