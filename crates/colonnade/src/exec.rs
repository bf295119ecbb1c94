use crate::{
    query::{
        options::{Consistency, ProfileDefaults},
        plan::StatementPlan,
    },
    value::Value,
};
use thiserror::Error as ThisError;

///
/// ExecuteError
///
/// Session-layer failures passed through verbatim. The core neither retries
/// nor suppresses these; retry selection travels in the effective options.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ExecuteError {
    #[error("request timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("not enough replicas available: required {required}, alive {alive}")]
    Unavailable { required: u32, alive: u32 },

    #[error("consistency '{consistency}' could not be satisfied")]
    ConsistencyFailed { consistency: Consistency },

    #[error("store failure: {message}")]
    Failure { message: String },
}

///
/// Row
///
/// Named-column record produced by the execution collaborator. Projected
/// queries populate only the requested columns.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

///
/// RowCursor
///
/// Forward row stream over one executed statement plan.
///

pub trait RowCursor {
    /// Pull the next row; `None` once the cursor is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, ExecuteError>;

    /// Store-private continuation payload positioned after the last
    /// delivered row. `None` once no further rows exist.
    fn resume_token(&self) -> Option<Vec<u8>>;

    /// Release store-side resources. Must be idempotent.
    fn release(&mut self) {}
}

///
/// StatementExecutor
///
/// Execution collaborator seam: owns the session, wire format, and retry
/// machinery. Supplied by construction, never through an ambient registry.
///

pub trait StatementExecutor {
    fn execute(&self, plan: &StatementPlan) -> Result<Box<dyn RowCursor>, ExecuteError>;

    /// Process-wide option defaults.
    fn defaults(&self) -> ProfileDefaults;
}
