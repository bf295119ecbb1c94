//! Declarative query derivation for a wide-column store: snake_case method
//! names parse into predicate trees at registration, invocations compile
//! into executor-ready statement plans, and results materialize through
//! shape-specific accessors over a forward-only paging protocol.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod error;
pub mod exec;
pub mod materialize;
pub mod obs;
pub mod paging;
pub mod query;
pub mod repository;
pub mod schema;
pub(crate) mod serialize;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, serializers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        paging::{PageRequest, PagingState, Slice},
        query::{
            options::QueryOptions,
            parser::{MethodSpec, ParamSpec},
            predicate::{ResultShape, SortSpec},
        },
        repository::{Call, MethodId, Outcome, Repository},
        schema::{PropertyPath, SortDirection, TableSchema},
        value::{Value, ValueFamily},
    };
}
