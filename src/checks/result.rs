//! Aggregated result trees.
//!
//! A [`CheckResult`] is produced fresh for every invocation. It serializes to
//! nested objects carrying `id`, `status`, `outcome`, an optional `data`
//! object and an ordered `checks` array. `status` and `outcome` are synonyms;
//! both are written, and either one is enough when reading.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::checks::status::{has_execution_failure, Data, Status};

/// Aggregated verdict of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Up,
    Down,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Up => "UP",
            Outcome::Down => "DOWN",
        }
    }
}

/// How a boundary layer should report an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// UP with at least one procedure in the subtree.
    Healthy,
    /// UP because the subtree holds no procedure at all.
    NoChecks,
    /// DOWN, every procedure reported on its own.
    Unhealthy,
    /// DOWN, and the check machinery failed somewhere in the subtree.
    Faulted,
    /// The identifier addressed nothing.
    NotFound,
}

/// Per-node result of an invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCheckResult")]
pub struct CheckResult {
    id: String,
    outcome: Outcome,
    data: Option<Data>,
    checks: Vec<CheckResult>,
    procedure: bool,
}

impl CheckResult {
    /// Merge a node's own status (if it has a procedure) with its children.
    /// The node is UP iff its own status is up and every child is UP.
    pub fn aggregate(id: impl Into<String>, own: Option<Status>, checks: Vec<CheckResult>) -> Self {
        let own_up = own.as_ref().map_or(true, Status::is_up);
        let outcome = if own_up && checks.iter().all(CheckResult::is_up) {
            Outcome::Up
        } else {
            Outcome::Down
        };

        Self {
            id: id.into(),
            outcome,
            procedure: own.is_some(),
            data: own.and_then(Status::into_data),
            checks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_up(&self) -> bool {
        self.outcome == Outcome::Up
    }

    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    /// Child results in registration order.
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// Whether this node's own procedure ran.
    pub fn has_procedure(&self) -> bool {
        self.procedure
    }

    /// True when no procedure ran anywhere in this tree.
    pub fn is_empty(&self) -> bool {
        !self.procedure && self.checks.iter().all(CheckResult::is_empty)
    }

    /// Number of procedures that ran in this tree.
    pub fn procedure_count(&self) -> usize {
        usize::from(self.procedure)
            + self
                .checks
                .iter()
                .map(CheckResult::procedure_count)
                .sum::<usize>()
    }

    /// True when the execution-failure flag is set on any node.
    pub fn has_execution_failure(&self) -> bool {
        has_execution_failure(self.data.as_ref())
            || self.checks.iter().any(CheckResult::has_execution_failure)
    }

    pub fn classify(&self) -> Classification {
        match self.outcome {
            Outcome::Up if self.is_empty() => Classification::NoChecks,
            Outcome::Up => Classification::Healthy,
            Outcome::Down if self.has_execution_failure() => Classification::Faulted,
            Outcome::Down => Classification::Unhealthy,
        }
    }
}

impl Serialize for CheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.data.is_some() { 5 } else { 4 };
        let mut state = serializer.serialize_struct("CheckResult", fields)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("status", &self.outcome)?;
        state.serialize_field("outcome", &self.outcome)?;
        if let Some(data) = &self.data {
            state.serialize_field("data", data)?;
        } else {
            state.skip_field("data")?;
        }
        state.serialize_field("checks", &self.checks)?;
        state.end()
    }
}

/// Wire shape accepted when reading results back; legacy producers may send
/// only `status` or only `outcome`.
#[derive(Deserialize)]
struct RawCheckResult {
    #[serde(default)]
    id: String,
    status: Option<Outcome>,
    outcome: Option<Outcome>,
    data: Option<Data>,
    #[serde(default)]
    checks: Vec<CheckResult>,
}

impl TryFrom<RawCheckResult> for CheckResult {
    type Error = String;

    fn try_from(raw: RawCheckResult) -> Result<Self, Self::Error> {
        let outcome = raw
            .outcome
            .or(raw.status)
            .ok_or_else(|| format!("check '{}' has neither 'outcome' nor 'status'", raw.id))?;

        // The wire format does not say which nodes ran a procedure; leaves
        // other than the root are taken to be procedures.
        let procedure = raw.data.is_some() || (raw.checks.is_empty() && !raw.id.is_empty());

        Ok(Self {
            id: raw.id,
            outcome,
            data: raw.data,
            checks: raw.checks,
            procedure,
        })
    }
}
