//! Shared fixtures for unit and integration tests.

use crate::{
    exec::{ExecuteError, Row, RowCursor, StatementExecutor},
    query::{
        options::{Consistency, ProfileDefaults, RetryPolicy},
        plan::StatementPlan,
    },
    schema::{PropertyPath, SortDirection, TableSchema},
    value::ValueFamily,
};
use std::{cell::Cell, rc::Rc};

///
/// UsersSchema
///
/// Fixed mapping for a `users` table:
/// - `user_id` partition key (text)
/// - `created_at` clustering position 0, declared descending (temporal)
/// - `score` clustering position 1, declared ascending (numeric)
/// - `email`, `age`, `active`, `tags`, `last_sign_in` secondary-indexed
/// - `nickname` mapped but unindexed
/// - `city` nested in the `address` column, secondary-indexed
///

pub(crate) struct UsersSchema;

impl TableSchema for UsersSchema {
    fn table(&self) -> &str {
        "users"
    }

    fn resolve(&self, name: &str) -> Option<PropertyPath> {
        match name {
            "user_id" | "created_at" | "score" | "email" | "age" | "active" | "tags"
            | "nickname" | "last_sign_in" => Some(PropertyPath::column(name)),
            "city" => Some(PropertyPath::nested("address", "city")),
            _ => None,
        }
    }

    fn family(&self, property: &PropertyPath) -> Option<ValueFamily> {
        match (property.column.as_str(), property.field.as_deref()) {
            ("user_id" | "email" | "nickname", None) | ("address", Some("city")) => {
                Some(ValueFamily::Text)
            }
            ("score" | "age", None) => Some(ValueFamily::Numeric),
            ("created_at" | "last_sign_in", None) => Some(ValueFamily::Temporal),
            ("active", None) => Some(ValueFamily::Boolean),
            ("tags", None) => Some(ValueFamily::Collection),
            _ => None,
        }
    }

    fn is_primary_key(&self, property: &PropertyPath) -> bool {
        property.field.is_none()
            && matches!(property.column.as_str(), "user_id" | "created_at" | "score")
    }

    fn is_indexed(&self, property: &PropertyPath) -> bool {
        matches!(
            (property.column.as_str(), property.field.as_deref()),
            ("email" | "age" | "active" | "tags" | "last_sign_in", None)
                | ("address", Some("city"))
        )
    }

    fn clustering_order(&self, property: &PropertyPath) -> Option<(usize, SortDirection)> {
        if property.field.is_some() {
            return None;
        }
        match property.column.as_str() {
            "created_at" => Some((0, SortDirection::Desc)),
            "score" => Some((1, SortDirection::Asc)),
            _ => None,
        }
    }
}

///
/// ExecutorStats
///
/// Shared observation point for cursor lifecycle assertions.
///

#[derive(Debug, Default)]
pub(crate) struct ExecutorStats {
    pub executions: Cell<u32>,
    pub cursors_opened: Cell<u32>,
    pub cursors_released: Cell<u32>,
}

///
/// ScriptedExecutor
///
/// Serves a fixed row script. Honors `fetch_size` as the page limit and
/// interprets the resume payload as a little-endian u32 row offset, which is
/// exactly what its cursors emit.
///

pub(crate) struct ScriptedExecutor {
    rows: Vec<Row>,
    defaults: ProfileDefaults,
    fail_with: Option<ExecuteError>,
    pub stats: Rc<ExecutorStats>,
}

impl ScriptedExecutor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            defaults: ProfileDefaults {
                fetch_size: 5000,
                consistency: Consistency::One,
                retry_policy: RetryPolicy::Default,
            },
            fail_with: None,
            stats: Rc::new(ExecutorStats::default()),
        }
    }

    pub fn failing_with(mut self, err: ExecuteError) -> Self {
        self.fail_with = Some(err);
        self
    }

    pub const fn with_defaults(mut self, defaults: ProfileDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

impl StatementExecutor for ScriptedExecutor {
    fn execute(&self, plan: &StatementPlan) -> Result<Box<dyn RowCursor>, ExecuteError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.stats.executions.set(self.stats.executions.get() + 1);

        let offset = plan.resume.as_deref().map_or(0, decode_offset);
        let limit = plan.fetch_size as usize;
        let page: Vec<Row> = self.rows.iter().skip(offset).take(limit).cloned().collect();

        let after = offset + page.len();
        let token = (after < self.rows.len()).then(|| encode_offset(after));

        self.stats.cursors_opened.set(self.stats.cursors_opened.get() + 1);
        Ok(Box::new(ScriptedCursor {
            rows: page,
            served: 0,
            token,
            released: false,
            stats: Rc::clone(&self.stats),
        }))
    }

    fn defaults(&self) -> ProfileDefaults {
        self.defaults
    }
}

struct ScriptedCursor {
    rows: Vec<Row>,
    served: usize,
    token: Option<Vec<u8>>,
    released: bool,
    stats: Rc<ExecutorStats>,
}

impl RowCursor for ScriptedCursor {
    fn next_row(&mut self) -> Result<Option<Row>, ExecuteError> {
        if self.served >= self.rows.len() {
            return Ok(None);
        }
        let row = self.rows[self.served].clone();
        self.served += 1;
        Ok(Some(row))
    }

    fn resume_token(&self) -> Option<Vec<u8>> {
        self.token.clone()
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stats
                .cursors_released
                .set(self.stats.cursors_released.get() + 1);
        }
    }
}

fn encode_offset(offset: usize) -> Vec<u8> {
    u32::try_from(offset).unwrap_or(u32::MAX).to_le_bytes().to_vec()
}

fn decode_offset(bytes: &[u8]) -> usize {
    match <[u8; 4]>::try_from(bytes) {
        Ok(raw) => u32::from_le_bytes(raw) as usize,
        Err(_) => 0,
    }
}

/// `n` rows with ascending integer ids.
pub(crate) fn user_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new()
                .with("user_id", format!("u-{i}"))
                .with("seq", i as i64)
        })
        .collect()
}
