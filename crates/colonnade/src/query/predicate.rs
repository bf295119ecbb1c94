use crate::{
    query::keyword::Operator,
    schema::{PropertyPath, SortDirection},
};
use derive_more::Display;

///
/// PredicateClause
///
/// One property/operator unit of a derived query. Argument arity is fixed by
/// the operator; values are bound at compile time, never stored here.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PredicateClause {
    pub property: PropertyPath,
    /// Property name as written in the method signature.
    pub name: String,
    pub operator: Operator,
}

impl PredicateClause {
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.operator.arity()
    }
}

///
/// PredicateTree
///
/// Ordered conjunction of predicate clauses, created once at registration
/// and shared read-only across invocations. No disjunctive node exists in
/// this type; the parser rejects `or` joiners outright, so disjunction is
/// not representable.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PredicateTree {
    clauses: Vec<PredicateClause>,
}

impl PredicateTree {
    pub(crate) const fn new(clauses: Vec<PredicateClause>) -> Self {
        Self { clauses }
    }

    #[must_use]
    pub fn clauses(&self) -> &[PredicateClause] {
        &self.clauses
    }

    /// An all-records query: no predicate portion at all.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Total number of method parameters the predicate portion consumes.
    #[must_use]
    pub fn bound_arity(&self) -> usize {
        self.clauses.iter().map(PredicateClause::arity).sum()
    }
}

///
/// SortSpec
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SortSpec {
    pub fields: Vec<(String, SortDirection)>,
}

impl SortSpec {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append an ascending sort key.
    #[must_use]
    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), SortDirection::Asc));
        self
    }

    /// Append a descending sort key.
    #[must_use]
    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), SortDirection::Desc));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

///
/// ProjectionSpec
/// Named subset of returned columns; omitted fields take the mapping
/// collaborator's absent-value semantics.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectionSpec {
    pub columns: Vec<String>,
}

///
/// ResultShape
///
/// Caller-visible result shape, fixed at registration from the method's
/// declared return marker.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ResultShape {
    #[display("list")]
    List,
    #[display("single")]
    Single,
    #[display("stream")]
    Stream,
    #[display("slice")]
    Slice,
}

///
/// QueryModifiers
///
/// Trailing signature modifiers: static sort, projection, result shape.
/// Created once at registration alongside the predicate tree.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryModifiers {
    pub sort: Option<SortSpec>,
    pub projection: Option<ProjectionSpec>,
    pub shape: ResultShape,
}
