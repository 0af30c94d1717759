//! Registry of health procedures, organized as a tree.
//!
//! # Responsibilities
//! - Own the node tree and its registration/removal lifecycle
//! - Hand out point-in-time snapshots of any subtree
//!
//! # Design Decisions
//! - The tree is persistent: nodes are immutable and shared through `Arc`
//! - Writers rebuild only the path they touch and publish the new root with
//!   `ArcSwap::rcu`, so concurrent writers retry against each other while
//!   readers never block
//! - Children keep insertion order; results are reported in that order
//! - Implicit ancestors that lose their last descendant are pruned

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::checks::error::CheckError;
use crate::checks::identifier::Identifier;
use crate::checks::procedure::Procedure;
use crate::observability::metrics;

/// Timeout applied when a procedure is registered without one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// A procedure bound to a node.
#[derive(Debug, Clone)]
pub struct Registration {
    pub procedure: Procedure,
    pub timeout: Duration,
}

/// Immutable registry tree node.
#[derive(Debug, Clone, Default)]
pub struct Node {
    registration: Option<Registration>,
    children: Vec<(String, Arc<Node>)>,
    procedures: usize,
}

impl Node {
    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub fn has_procedure(&self) -> bool {
        self.registration.is_some()
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Arc<Node>)> {
        self.children.iter().map(|(segment, node)| (segment.as_str(), node))
    }

    pub fn child(&self, segment: &str) -> Option<&Arc<Node>> {
        self.children
            .iter()
            .find(|(s, _)| s == segment)
            .map(|(_, node)| node)
    }

    /// No procedure here and no children below.
    pub fn is_empty(&self) -> bool {
        self.registration.is_none() && self.children.is_empty()
    }

    /// Number of procedures in this subtree, this node included.
    pub fn procedure_count(&self) -> usize {
        self.procedures
    }

    fn recount(&mut self) {
        self.procedures = usize::from(self.has_procedure())
            + self
                .children
                .iter()
                .map(|(_, child)| child.procedures)
                .sum::<usize>();
    }

    /// Copy of this node with `registration` bound at `path` below it.
    fn with_registered(&self, path: &[String], registration: Registration) -> Node {
        let mut node = self.clone();
        match path.split_first() {
            None => node.registration = Some(registration),
            Some((head, rest)) => match node.children.iter().position(|(s, _)| s == head) {
                Some(pos) => {
                    let child = node.children[pos].1.with_registered(rest, registration);
                    node.children[pos].1 = Arc::new(child);
                }
                None => node.children.push((
                    head.clone(),
                    Arc::new(Node::default().with_registered(rest, registration)),
                )),
            },
        }
        node.recount();
        node
    }

    /// Copy of this node with the subtree at `path` removed, or `None` if
    /// `path` addresses nothing.
    fn without(&self, path: &[String]) -> Option<Node> {
        let (head, rest) = path.split_first()?;
        let pos = self.children.iter().position(|(s, _)| s == head)?;

        let mut node = self.clone();
        if rest.is_empty() {
            node.children.remove(pos);
        } else {
            let pruned = self.children[pos].1.without(rest)?;
            if pruned.is_empty() {
                node.children.remove(pos);
            } else {
                node.children[pos].1 = Arc::new(pruned);
            }
        }
        node.recount();
        Some(node)
    }

    fn collect_identifiers(&self, at: &Identifier, out: &mut Vec<Identifier>) {
        if self.has_procedure() {
            out.push(at.clone());
        }
        for (segment, child) in self.children() {
            child.collect_identifiers(&at.child(segment), out);
        }
    }
}

/// Change in procedure count between two published roots.
fn count_delta(before: &Node, after: &Node) -> i64 {
    after.procedures as i64 - before.procedures as i64
}

/// Concurrent registry of health procedures.
#[derive(Debug)]
pub struct Registry {
    root: ArcSwap<Node>,
    default_timeout: Duration,
}

impl Registry {
    /// Create an empty registry with the stock default timeout.
    pub fn new() -> Self {
        Self::with_default_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an empty registry whose procedures default to `timeout`.
    pub fn with_default_timeout(timeout: Duration) -> Self {
        Self {
            root: ArcSwap::from_pointee(Node::default()),
            default_timeout: timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Register `procedure` at `id` with the default timeout.
    pub fn register(&self, id: &str, procedure: Procedure) -> Result<(), CheckError> {
        self.register_with_timeout(id, self.default_timeout, procedure)
    }

    /// Register `procedure` at `id`, creating missing ancestors. An existing
    /// procedure at `id` is replaced; its children are kept.
    pub fn register_with_timeout(
        &self,
        id: &str,
        timeout: Duration,
        procedure: Procedure,
    ) -> Result<(), CheckError> {
        let identifier = Identifier::parse(id)?;
        if identifier.is_root() {
            return Err(CheckError::InvalidIdentifier(id.to_string()));
        }
        if timeout.is_zero() {
            return Err(CheckError::InvalidTimeout(id.to_string()));
        }

        let registration = Registration { procedure, timeout };
        let mut delta = 0;
        self.root.rcu(|current| {
            let next = current.with_registered(identifier.segments(), registration.clone());
            delta = count_delta(current, &next);
            Arc::new(next)
        });

        tracing::debug!(id = %identifier, timeout = ?timeout, "Health procedure registered");
        metrics::adjust_registered_procedures(delta);
        Ok(())
    }

    /// Remove the node at `id` and everything below it.
    ///
    /// Returns `false` when `id` addresses nothing; that case is a no-op.
    /// Unregistering the root clears the registry.
    pub fn unregister(&self, id: &str) -> bool {
        let Ok(identifier) = Identifier::parse(id) else {
            return false;
        };

        let mut delta = 0;
        let removed = if identifier.is_root() {
            let previous = self.root.swap(Arc::new(Node::default()));
            delta = count_delta(&previous, &Node::default());
            !previous.is_empty()
        } else {
            let mut removed = false;
            self.root.rcu(|current| match current.without(identifier.segments()) {
                Some(next) => {
                    removed = true;
                    delta = count_delta(current, &next);
                    Arc::new(next)
                }
                None => {
                    removed = false;
                    delta = 0;
                    current.clone()
                }
            });
            removed
        };

        if removed {
            tracing::debug!(id = %identifier, "Health procedure subtree unregistered");
            metrics::adjust_registered_procedures(delta);
        } else {
            tracing::debug!(id = %identifier, "Unregister ignored: identifier not registered");
        }
        removed
    }

    /// Snapshot of the subtree at `id`. The root always resolves.
    pub fn resolve_subtree(&self, id: &str) -> Result<Arc<Node>, CheckError> {
        let identifier =
            Identifier::parse(id).map_err(|_| CheckError::NotFound(id.to_string()))?;
        self.resolve(&identifier)
    }

    pub(crate) fn resolve(&self, identifier: &Identifier) -> Result<Arc<Node>, CheckError> {
        let mut node = self.root.load_full();
        for segment in identifier.segments() {
            node = node
                .child(segment)
                .cloned()
                .ok_or_else(|| CheckError::NotFound(identifier.to_string()))?;
        }
        Ok(node)
    }

    /// Snapshot of the whole tree.
    pub fn snapshot(&self) -> Arc<Node> {
        self.root.load_full()
    }

    /// Number of registered procedures.
    pub fn len(&self) -> usize {
        self.root.load().procedure_count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.load().is_empty()
    }

    /// Full identifiers of every registered procedure, in tree order.
    pub fn identifiers(&self) -> Vec<Identifier> {
        let mut out = Vec::new();
        self.root.load().collect_identifiers(&Identifier::root(), &mut out);
        out
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
