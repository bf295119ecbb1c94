//! Signature parsing for derived repository methods.
//!
//! Parsing ownership contract:
//! - this module owns registration-time signature semantics and emits
//!   `ParseError`; every failure here surfaces during startup, never at
//!   invocation time.
//! - store capability rules (index backing, clustering order) depend on live
//!   schema flags and are owned by `query::plan`.

use crate::{
    query::{
        keyword::{self, Operator},
        options::QueryOptions,
        predicate::{
            PredicateClause, PredicateTree, ProjectionSpec, QueryModifiers, ResultShape, SortSpec,
        },
    },
    schema::{SortDirection, TableSchema},
    value::ValueFamily,
};
use thiserror::Error as ThisError;

const ACTIONS: &[&str] = &["find", "get", "read", "query"];
const CONJUNCTION: &str = "_and_";
const DISJUNCTION: &str = "_or_";
const ORDER_MARKER: &str = "_order_by_";

///
/// ParseError
///
/// Registration-time signature failures. Fatal to registration of that
/// method; callers should refuse to start rather than defer to first use.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseError {
    #[error("method name '{name}' has no recognized action marker")]
    UnknownAction { name: String },

    #[error("unknown keyword '{token}' in method name")]
    UnknownKeyword { token: String },

    #[error("disjunction is not supported: clauses may only be joined with 'and'")]
    Disjunction,

    #[error("property '{name}' does not resolve against table '{table}'")]
    UnknownProperty { name: String, table: String },

    #[error("empty predicate: '{name}' declares a by-clause with no properties")]
    EmptyPredicate { name: String },

    #[error("predicate binds {required} argument(s) but the method declares {declared}")]
    ArityMismatch { required: usize, declared: usize },

    #[error("operator '{operator}' on property '{property}' does not accept {family} arguments")]
    ArgumentTypeMismatch {
        property: String,
        operator: Operator,
        family: ValueFamily,
    },

    #[error("operator '{operator}' requires a boolean property, '{property}' is not")]
    BooleanOperatorOnNonBoolean {
        property: String,
        operator: Operator,
    },

    #[error("{kind} parameter is misplaced: predicate arguments come first, options last")]
    MisplacedParameter { kind: &'static str },

    #[error("single-result methods cannot declare a page parameter")]
    SingleResultPage,

    #[error("projection column '{name}' does not resolve against table '{table}'")]
    UnknownProjection { name: String, table: String },
}

///
/// ParamSpec
///
/// Declared parameter kinds of a repository method, in declaration order.
/// Registration receives these as data; no runtime introspection exists.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamSpec {
    /// Predicate-bound value argument with its declared family.
    Argument(ValueFamily),
    /// Dynamic sort argument, consumed by the query modifiers.
    Sort,
    /// Page request argument, consumed by the paging protocol.
    Page,
    /// Per-call options argument; excluded from predicate binding entirely.
    Options,
}

///
/// MethodSpec
///
/// Registration input for one repository method: name, declared parameter
/// kinds, return-shape marker, optional projection and static options.
///

#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub shape: ResultShape,
    pub projection: Option<Vec<String>>,
    pub options: Option<QueryOptions>,
}

impl MethodSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ResultShape) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            shape,
            projection: None,
            options: None,
        }
    }

    /// Append one declared parameter.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Restrict returned columns to a named subset.
    #[must_use]
    pub fn projection(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Attach static per-method options.
    #[must_use]
    pub const fn options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }
}

///
/// ParsedSignature
///
/// Parse-once product for one method; immutable after registration.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ParsedSignature {
    pub tree: PredicateTree,
    pub modifiers: QueryModifiers,
    pub arg_families: Vec<ValueFamily>,
    pub takes_sort: bool,
    pub takes_page: bool,
    pub takes_options: bool,
}

/// Parse one method signature against the table schema.
pub(crate) fn parse(
    schema: &dyn TableSchema,
    spec: &MethodSpec,
) -> Result<ParsedSignature, ParseError> {
    let (rest, has_predicate) = strip_action(&spec.name)?;

    let (predicate_part, order_part) = split_order(rest, has_predicate)?;

    if predicate_part.contains(DISJUNCTION) {
        return Err(ParseError::Disjunction);
    }

    let table = schema.table().to_string();

    let tree = if has_predicate {
        if predicate_part.is_empty() {
            return Err(ParseError::EmptyPredicate {
                name: spec.name.clone(),
            });
        }
        let clauses = predicate_part
            .split(CONJUNCTION)
            .map(|segment| parse_clause(schema, segment, &table))
            .collect::<Result<Vec<_>, _>>()?;
        PredicateTree::new(clauses)
    } else {
        PredicateTree::default()
    };

    let sort = order_part
        .map(|part| parse_sort(schema, part, &table))
        .transpose()?;

    let (arg_families, takes_sort, takes_page, takes_options) = check_params(&spec.params)?;

    // Paging never makes sense for an at-most-one result; refuse it here so
    // the declaration cannot sit dormant until first use.
    if spec.shape == ResultShape::Single && takes_page {
        return Err(ParseError::SingleResultPage);
    }

    let required = tree.bound_arity();
    if required != arg_families.len() {
        return Err(ParseError::ArityMismatch {
            required,
            declared: arg_families.len(),
        });
    }

    check_clause_families(schema, &tree, &arg_families)?;

    let projection = spec
        .projection
        .as_ref()
        .map(|names| resolve_projection(schema, names, &table))
        .transpose()?;

    Ok(ParsedSignature {
        tree,
        modifiers: QueryModifiers {
            sort,
            projection,
            shape: spec.shape,
        },
        arg_families,
        takes_sort,
        takes_page,
        takes_options,
    })
}

// Strip the leading action marker; `true` means a predicate portion follows.
fn strip_action(name: &str) -> Result<(&str, bool), ParseError> {
    for action in ACTIONS {
        if let Some(tail) = name.strip_prefix(action) {
            if tail == "_all" {
                return Ok(("", false));
            }
            if let Some(rest) = tail.strip_prefix("_all_") {
                return Ok((rest, false));
            }
            if let Some(rest) = tail.strip_prefix("_by_") {
                return Ok((rest, true));
            }
        }
    }

    Err(ParseError::UnknownAction {
        name: name.to_string(),
    })
}

// Detach the trailing order-by modifier, if any.
fn split_order(rest: &str, has_predicate: bool) -> Result<(&str, Option<&str>), ParseError> {
    if has_predicate {
        return Ok(match rest.find(ORDER_MARKER) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + ORDER_MARKER.len()..])),
            None => (rest, None),
        });
    }

    if rest.is_empty() {
        return Ok(("", None));
    }

    // All-records form: only an order-by modifier may follow.
    rest.strip_prefix("order_by_").map_or_else(
        || {
            Err(ParseError::UnknownKeyword {
                token: rest.to_string(),
            })
        },
        |order| Ok(("", Some(order))),
    )
}

// One clause: longest keyword suffix from the right, whole-segment `Equals`
// fallback when the remainder is not a property but the full segment is.
fn parse_clause(
    schema: &dyn TableSchema,
    segment: &str,
    table: &str,
) -> Result<PredicateClause, ParseError> {
    if segment.is_empty() {
        return Err(ParseError::UnknownKeyword {
            token: "and".to_string(),
        });
    }

    if let Some((name, operator)) = keyword::split_keyword_suffix(segment) {
        if let Some(property) = schema.resolve(name) {
            return Ok(PredicateClause {
                property,
                name: name.to_string(),
                operator,
            });
        }

        if let Some(property) = schema.resolve(segment) {
            return Ok(PredicateClause {
                property,
                name: segment.to_string(),
                operator: Operator::Equals,
            });
        }

        return Err(ParseError::UnknownProperty {
            name: name.to_string(),
            table: table.to_string(),
        });
    }

    schema.resolve(segment).map_or_else(
        || {
            Err(ParseError::UnknownProperty {
                name: segment.to_string(),
                table: table.to_string(),
            })
        },
        |property| {
            Ok(PredicateClause {
                property,
                name: segment.to_string(),
                operator: Operator::Equals,
            })
        },
    )
}

// Sort fields joined by the conjunction token; direction suffix defaults to
// ascending.
fn parse_sort(schema: &dyn TableSchema, part: &str, table: &str) -> Result<SortSpec, ParseError> {
    let mut spec = SortSpec::new();

    for item in part.split(CONJUNCTION) {
        let (field, direction) = if let Some(field) = item.strip_suffix("_desc") {
            (field, SortDirection::Desc)
        } else if let Some(field) = item.strip_suffix("_asc") {
            (field, SortDirection::Asc)
        } else {
            (item, SortDirection::Asc)
        };

        if field.is_empty() {
            return Err(ParseError::UnknownKeyword {
                token: item.to_string(),
            });
        }
        if schema.resolve(field).is_none() {
            return Err(ParseError::UnknownProperty {
                name: field.to_string(),
                table: table.to_string(),
            });
        }

        spec.fields.push((field.to_string(), direction));
    }

    Ok(spec)
}

// Parameter discipline: predicate arguments first, then sort/page, options
// last; at most one of each modifier kind.
fn check_params(
    params: &[ParamSpec],
) -> Result<(Vec<ValueFamily>, bool, bool, bool), ParseError> {
    let mut arg_families = Vec::new();
    let mut takes_sort = false;
    let mut takes_page = false;
    let mut takes_options = false;

    for param in params {
        match param {
            ParamSpec::Argument(family) => {
                if takes_sort || takes_page || takes_options {
                    return Err(ParseError::MisplacedParameter { kind: "argument" });
                }
                arg_families.push(*family);
            }
            ParamSpec::Sort => {
                if takes_sort || takes_options {
                    return Err(ParseError::MisplacedParameter { kind: "sort" });
                }
                takes_sort = true;
            }
            ParamSpec::Page => {
                if takes_page || takes_options {
                    return Err(ParseError::MisplacedParameter { kind: "page" });
                }
                takes_page = true;
            }
            ParamSpec::Options => {
                if takes_options {
                    return Err(ParseError::MisplacedParameter { kind: "options" });
                }
                takes_options = true;
            }
        }
    }

    Ok((arg_families, takes_sort, takes_page, takes_options))
}

// Declared argument families must be acceptable to each clause operator, in
// left-to-right binding order; zero-arity operators require a boolean
// property instead.
fn check_clause_families(
    schema: &dyn TableSchema,
    tree: &PredicateTree,
    arg_families: &[ValueFamily],
) -> Result<(), ParseError> {
    let mut index = 0;

    for clause in tree.clauses() {
        if clause.arity() == 0 {
            if schema.family(&clause.property) != Some(ValueFamily::Boolean) {
                return Err(ParseError::BooleanOperatorOnNonBoolean {
                    property: clause.name.clone(),
                    operator: clause.operator,
                });
            }
            continue;
        }

        let family = arg_families[index];
        index += 1;

        if !clause.operator.accepts(family) {
            return Err(ParseError::ArgumentTypeMismatch {
                property: clause.name.clone(),
                operator: clause.operator,
                family,
            });
        }
    }

    Ok(())
}

fn resolve_projection(
    schema: &dyn TableSchema,
    names: &[String],
    table: &str,
) -> Result<ProjectionSpec, ParseError> {
    let mut columns = Vec::with_capacity(names.len());

    for name in names {
        match schema.resolve(name) {
            Some(path) => columns.push(path.column),
            None => {
                return Err(ParseError::UnknownProjection {
                    name: name.clone(),
                    table: table.to_string(),
                });
            }
        }
    }

    Ok(ProjectionSpec { columns })
}

///
/// TESTS
///
