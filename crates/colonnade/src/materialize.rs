//! Result materialization over executor cursors.
//!
//! Every function here owns the cursor it is handed and releases it on all
//! exits, error paths included. Only [`RowStream`] holds a cursor open past
//! the call, and its `Drop` closes it.
#![allow(clippy::cast_possible_truncation)]

use crate::{
    error::QueryError,
    exec::{Row, RowCursor},
    obs::sink::{self, MetricsEvent},
    paging::{PagingState, Slice},
    query::plan::PlanSignature,
};
use thiserror::Error as ThisError;

///
/// MultiplicityError
///
/// A single-result query matched more rows than its shape allows. Zero rows
/// is not an error; absence is an ordinary answer.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MultiplicityError {
    #[error("expected at most one row, found more")]
    MoreThanOne,
}

fn release(cursor: &mut dyn RowCursor) {
    cursor.release();
    sink::record(MetricsEvent::CursorReleased);
}

/// Drain the cursor into a fully materialized row list.
pub(crate) fn collect_rows(mut cursor: Box<dyn RowCursor>) -> Result<Vec<Row>, QueryError> {
    let mut rows = Vec::new();
    let outcome = loop {
        match cursor.next_row() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    release(cursor.as_mut());
    outcome?;

    sink::record(MetricsEvent::RowsMaterialized {
        rows: rows.len() as u64,
    });
    Ok(rows)
}

/// At most one row. A second row is a contract breach surfaced as
/// [`MultiplicityError::MoreThanOne`]; zero rows yields `None`.
pub(crate) fn collect_one(mut cursor: Box<dyn RowCursor>) -> Result<Option<Row>, QueryError> {
    let outcome = match cursor.next_row() {
        Ok(None) => Ok(None),
        Ok(Some(first)) => match cursor.next_row() {
            Ok(None) => Ok(Some(first)),
            Ok(Some(_)) => Err(MultiplicityError::MoreThanOne.into()),
            Err(err) => Err(QueryError::from(err)),
        },
        Err(err) => Err(QueryError::from(err)),
    };
    release(cursor.as_mut());

    let row = outcome?;
    sink::record(MetricsEvent::RowsMaterialized {
        rows: u64::from(row.is_some()),
    });
    Ok(row)
}

/// One forward page of at most `size` rows. The cursor's resume token, if
/// any, is sealed under the plan signature so it can only resume this exact
/// query shape.
pub(crate) fn collect_slice(
    mut cursor: Box<dyn RowCursor>,
    size: u32,
    signature: PlanSignature,
) -> Result<Slice<Row>, QueryError> {
    let mut rows = Vec::new();
    let outcome = loop {
        if rows.len() >= size as usize {
            break Ok(());
        }
        match cursor.next_row() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    let token = cursor.resume_token();
    release(cursor.as_mut());
    outcome?;

    let paging_state = match token {
        Some(resume) => Some(PagingState::seal(signature, resume).map_err(QueryError::from)?),
        None => None,
    };

    sink::record(MetricsEvent::PageServed {
        rows: rows.len() as u64,
        terminal: paging_state.is_none(),
    });
    Ok(Slice::new(rows, paging_state))
}

///
/// RowStream
///
/// Lazily pulled row iterator. Holds the cursor open between pulls; closing
/// happens on exhaustion, on the first error, on [`Self::close`], or on drop,
/// whichever comes first. After any of those the stream is fused.
///

pub struct RowStream {
    cursor: Option<Box<dyn RowCursor>>,
}

impl RowStream {
    pub(crate) fn new(cursor: Box<dyn RowCursor>) -> Self {
        Self {
            cursor: Some(cursor),
        }
    }

    /// Release the underlying cursor early. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            release(cursor.as_mut());
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }
}

impl Iterator for RowStream {
    type Item = Result<Row, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        match cursor.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.close();
                None
            }
            Err(err) => {
                self.close();
                Some(Err(err.into()))
            }
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.close();
    }
}

///
/// TESTS
///
