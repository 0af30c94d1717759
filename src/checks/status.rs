//! Status reported by a single procedure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checks::error::ProcedureFault;

/// Data key marking a DOWN status produced by the check machinery itself.
pub const EXECUTION_FAILURE: &str = "procedure-execution-failure";

/// Data key carrying the fault description for synthetic failures.
pub const CAUSE: &str = "cause";

/// Structured diagnostic payload.
pub type Data = Map<String, Value>;

/// Up/down verdict plus optional diagnostic data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Data>,
}

impl Status {
    pub fn up() -> Self {
        Self { up: true, data: None }
    }

    pub fn down() -> Self {
        Self { up: false, data: None }
    }

    /// Synthetic DOWN status for a procedure that did not report on its own.
    pub fn failure(fault: &ProcedureFault) -> Self {
        Self::down()
            .with_entry(EXECUTION_FAILURE, true)
            .with_entry(CAUSE, fault.to_string())
    }

    /// Replace the data payload.
    pub fn with_data(mut self, data: Data) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a single data entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Data> {
        self.data
    }

    /// True when the data carries the execution-failure flag.
    pub fn is_execution_failure(&self) -> bool {
        has_execution_failure(self.data.as_ref())
    }
}

pub(crate) fn has_execution_failure(data: Option<&Data>) -> bool {
    data.and_then(|d| d.get(EXECUTION_FAILURE))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
