//! Statement compilation for parsed signatures.
//!
//! Validation ownership contract:
//! - `query::parser` owns registration-time signature semantics.
//! - this module owns compile-time store capability rules (index backing,
//!   clustering order, paging legality), because they depend on live schema
//!   flags supplied by the mapping collaborator.
#![allow(clippy::cast_possible_truncation)]

use crate::{
    error::QueryError,
    paging::PageState,
    query::{
        keyword::Operator,
        options::{Consistency, EffectiveOptions, RetryPolicy},
        predicate::{PredicateTree, QueryModifiers, ResultShape, SortSpec},
    },
    schema::{PropertyPath, SortDirection, TableSchema},
    value::Value,
};
use sha2::{Digest, Sha256};
use thiserror::Error as ThisError;

///
/// CapabilityError
///
/// Compile-time store-legality failures. These indicate that a plan cannot
/// be executed against the current schema, not that parsing was wrong.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CapabilityError {
    #[error(
        "predicate on '{property}' requires a secondary index: it is not a primary-key column and no index backs it"
    )]
    UnindexedProperty { property: String },

    #[error("sort on '{property}' is not a clustering column")]
    NonClusteringOrder { property: String },

    #[error("sort columns must follow clustering positions from the first: '{property}' is out of place")]
    ClusteringPositionMismatch { property: String },

    #[error("sort directions must match the declared clustering order or its exact reverse")]
    UnsupportedOrderDirection,

    #[error("single-result methods cannot be paged")]
    SingleResultPaging,
}

///
/// ArgumentError
///
/// Per-invocation binding misuse: wrong argument count, runtime value
/// families an operator cannot accept, or result-shape accessor mismatch.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ArgumentError {
    #[error("expected {expected} bound argument(s), got {found}")]
    Count { expected: usize, found: usize },

    #[error("argument {index} bound to '{property}' is {found}, which '{operator}' does not accept")]
    Family {
        index: usize,
        property: String,
        operator: Operator,
        found: &'static str,
    },

    #[error("method was registered as {registered}, not {requested}")]
    ShapeMismatch {
        registered: ResultShape,
        requested: ResultShape,
    },

    #[error("sort column '{column}' appears more than once")]
    DuplicateSortColumn { column: String },

    #[error("sort column '{column}' does not resolve")]
    UnknownSortColumn { column: String },

    #[error("method does not take a dynamic sort argument")]
    UnexpectedSort,

    #[error("method does not take a page request")]
    UnexpectedPage,

    #[error("method does not take a per-call options argument")]
    UnexpectedOptions,

    #[error("no method registered under id {id}")]
    UnknownMethod { id: usize },
}

///
/// Restriction
///
/// One property/operator/value triple of a compiled plan.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Restriction {
    pub property: PropertyPath,
    pub operator: Operator,
    pub value: Value,
}

///
/// StatementPlan
///
/// Executor-ready statement. Its concrete serialization is the execution
/// collaborator's concern; nothing here is wire format.
///

#[derive(Clone, Debug, PartialEq)]
pub struct StatementPlan {
    pub table: String,
    pub restrictions: Vec<Restriction>,
    pub order: Vec<(String, SortDirection)>,
    pub projection: Option<Vec<String>>,
    pub fetch_size: u32,
    pub consistency: Consistency,
    pub retry_policy: RetryPolicy,
    /// Store-private resume payload recovered from a paging state token.
    pub resume: Option<Vec<u8>>,
}

impl StatementPlan {
    /// Stable signature binding paging state to one query shape.
    ///
    /// Included: table, restrictions (with bound values), order, projection.
    /// Excluded: fetch size, consistency, retry policy, resume state.
    /// Resuming with different argument values is a different query, so the
    /// bound values are part of the shape.
    #[must_use]
    pub fn signature(&self) -> PlanSignature {
        let mut hasher = Sha256::new();
        hasher.update(b"plansig:v1");
        update_frame(&mut hasher, self.table.as_bytes());

        hasher.update((self.restrictions.len() as u64).to_le_bytes());
        for restriction in &self.restrictions {
            update_frame(&mut hasher, restriction.property.column.as_bytes());
            match &restriction.property.field {
                Some(field) => update_frame(&mut hasher, field.as_bytes()),
                None => hasher.update([0u8]),
            }
            hasher.update([restriction.operator.tag()]);
            hash_value(&mut hasher, &restriction.value);
        }

        hasher.update((self.order.len() as u64).to_le_bytes());
        for (field, direction) in &self.order {
            update_frame(&mut hasher, field.as_bytes());
            hasher.update([match direction {
                SortDirection::Asc => 0u8,
                SortDirection::Desc => 1u8,
            }]);
        }

        match &self.projection {
            Some(columns) => {
                hasher.update((columns.len() as u64).to_le_bytes());
                for column in columns {
                    update_frame(&mut hasher, column.as_bytes());
                }
            }
            None => hasher.update([0xffu8]),
        }

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        PlanSignature::from_bytes(out)
    }
}

///
/// PlanSignature
///
/// Deterministic hash of continuation-relevant plan semantics.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PlanSignature([u8; 32]);

impl PlanSignature {
    pub(crate) const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub(crate) const fn into_bytes(self) -> [u8; 32] {
        self.0
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for PlanSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

fn update_frame(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

// Structural value hashing: tag byte plus canonical payload per variant.
fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update([0u8]),
        Value::Bool(b) => hasher.update([1u8, u8::from(*b)]),
        Value::Int(i) => {
            hasher.update([2u8]);
            hasher.update(i.to_le_bytes());
        }
        Value::Double(f) => {
            hasher.update([3u8]);
            hasher.update(f.to_bits().to_le_bytes());
        }
        Value::Text(s) => {
            hasher.update([4u8]);
            update_frame(hasher, s.as_bytes());
        }
        Value::Bytes(b) => {
            hasher.update([5u8]);
            update_frame(hasher, b);
        }
        Value::Timestamp(t) => {
            hasher.update([6u8]);
            hasher.update(t.timestamp_micros().to_le_bytes());
        }
        Value::List(items) => {
            hasher.update([7u8]);
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
    }
}

///
/// CompileRequest
///
/// Per-invocation compiler input; invocation-local, discarded after use.
///

pub(crate) struct CompileRequest<'a> {
    pub tree: &'a PredicateTree,
    pub modifiers: &'a QueryModifiers,
    pub args: &'a [Value],
    pub dynamic_sort: Option<&'a SortSpec>,
    pub options: EffectiveOptions,
    pub page_size: Option<u32>,
    pub page_state: Option<&'a PageState>,
}

/// Compile one invocation into an executor-ready statement plan.
pub(crate) fn compile(
    schema: &dyn TableSchema,
    request: &CompileRequest<'_>,
) -> Result<StatementPlan, QueryError> {
    let restrictions = bind_arguments(request.tree, request.args)?;

    for restriction in &restrictions {
        if !schema.is_primary_key(&restriction.property)
            && !schema.is_indexed(&restriction.property)
        {
            return Err(CapabilityError::UnindexedProperty {
                property: restriction.property.to_string(),
            }
            .into());
        }
    }

    let order = combine_sort(request.modifiers.sort.as_ref(), request.dynamic_sort)?;
    check_clustering_order(schema, &order)?;

    let paging_requested = request.page_size.is_some()
        || matches!(request.page_state, Some(PageState::Resume(_)));
    if request.modifiers.shape == ResultShape::Single && paging_requested {
        return Err(CapabilityError::SingleResultPaging.into());
    }

    let mut plan = StatementPlan {
        table: schema.table().to_string(),
        restrictions,
        order,
        projection: request
            .modifiers
            .projection
            .as_ref()
            .map(|p| p.columns.clone()),
        fetch_size: request.page_size.unwrap_or(request.options.fetch_size),
        consistency: request.options.consistency,
        retry_policy: request.options.retry_policy,
        resume: None,
    };

    if let Some(PageState::Resume(state)) = request.page_state {
        let resume = state
            .unseal(plan.signature())
            .map_err(QueryError::from)?;
        plan.resume = Some(resume);
    }

    Ok(plan)
}

// Bind runtime values to clauses left-to-right; zero-arity operators lower
// to an equality on the boolean column.
fn bind_arguments(tree: &PredicateTree, args: &[Value]) -> Result<Vec<Restriction>, QueryError> {
    let expected = tree.bound_arity();
    if args.len() != expected {
        return Err(ArgumentError::Count {
            expected,
            found: args.len(),
        }
        .into());
    }

    let mut restrictions = Vec::with_capacity(tree.clauses().len());
    let mut index = 0;

    for clause in tree.clauses() {
        if clause.arity() == 0 {
            restrictions.push(Restriction {
                property: clause.property.clone(),
                operator: Operator::Equals,
                value: Value::Bool(clause.operator == Operator::IsTrue),
            });
            continue;
        }

        let value = args[index].clone();
        if let Some(family) = value.family()
            && !clause.operator.accepts(family)
        {
            return Err(ArgumentError::Family {
                index,
                property: clause.name.clone(),
                operator: clause.operator,
                found: value.type_name(),
            }
            .into());
        }
        index += 1;

        restrictions.push(Restriction {
            property: clause.property.clone(),
            operator: clause.operator,
            value,
        });
    }

    Ok(restrictions)
}

// Static (name-derived) sort first, then the dynamic sort argument; a column
// may appear only once across both.
fn combine_sort(
    static_sort: Option<&SortSpec>,
    dynamic_sort: Option<&SortSpec>,
) -> Result<Vec<(String, SortDirection)>, QueryError> {
    let mut fields: Vec<(String, SortDirection)> = Vec::new();

    let sources = static_sort
        .into_iter()
        .chain(dynamic_sort)
        .flat_map(|spec| spec.fields.iter());

    for (field, direction) in sources {
        if fields.iter().any(|(existing, _)| existing == field) {
            return Err(ArgumentError::DuplicateSortColumn {
                column: field.clone(),
            }
            .into());
        }
        fields.push((field.clone(), *direction));
    }

    Ok(fields)
}

// Store-side sorting is only possible along the clustering prefix, either in
// the declared direction of every column or the exact reverse of every
// column.
fn check_clustering_order(
    schema: &dyn TableSchema,
    order: &[(String, SortDirection)],
) -> Result<(), QueryError> {
    if order.is_empty() {
        return Ok(());
    }

    let mut resolved = Vec::with_capacity(order.len());
    for (field, requested) in order {
        let Some(path) = schema.resolve(field) else {
            return Err(ArgumentError::UnknownSortColumn {
                column: field.clone(),
            }
            .into());
        };
        let Some((position, declared)) = schema.clustering_order(&path) else {
            return Err(CapabilityError::NonClusteringOrder {
                property: field.clone(),
            }
            .into());
        };
        resolved.push((field, position, declared, *requested));
    }

    for (index, (field, position, _, _)) in resolved.iter().enumerate() {
        if *position != index {
            return Err(CapabilityError::ClusteringPositionMismatch {
                property: (*field).clone(),
            }
            .into());
        }
    }

    let forward = resolved
        .iter()
        .all(|(_, _, declared, requested)| requested == declared);
    let reverse = resolved
        .iter()
        .all(|(_, _, declared, requested)| *requested == declared.reversed());

    if forward || reverse {
        Ok(())
    } else {
        Err(CapabilityError::UnsupportedOrderDirection.into())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        paging::{PagingState, PagingStateError},
        query::{
            parser::{self, MethodSpec, ParamSpec, ParsedSignature},
            predicate::ResultShape,
        },
        test_support::UsersSchema,
        value::ValueFamily,
    };

    const OPTIONS: EffectiveOptions = EffectiveOptions {
        fetch_size: 5000,
        consistency: Consistency::One,
        retry_policy: RetryPolicy::Default,
    };

    fn parsed(spec: &MethodSpec) -> ParsedSignature {
        parser::parse(&UsersSchema, spec).expect("signature must parse")
    }

    fn compile_simple(signature: &ParsedSignature, args: &[Value]) -> Result<StatementPlan, QueryError> {
        compile(
            &UsersSchema,
            &CompileRequest {
                tree: &signature.tree,
                modifiers: &signature.modifiers,
                args,
                dynamic_sort: None,
                options: OPTIONS,
                page_size: None,
                page_state: None,
            },
        )
    }

    #[test]
    fn unindexed_non_key_property_fails_at_compile_not_parse() {
        let spec = MethodSpec::new("find_by_nickname", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));

        // Parsing succeeds: index capability is not a parse concern.
        let signature = parsed(&spec);

        let err = compile_simple(&signature, &[Value::from("zed")]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Capability(boxed)
                if matches!(*boxed, CapabilityError::UnindexedProperty { .. })
        ));
    }

    #[test]
    fn primary_key_predicate_needs_no_index() {
        let spec = MethodSpec::new("find_by_user_id", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let plan = compile_simple(&signature, &[Value::from("u-1")]).unwrap();
        assert_eq!(plan.restrictions.len(), 1);
        assert_eq!(plan.table, "users");
    }

    #[test]
    fn boolean_marker_lowers_to_equality() {
        let spec = MethodSpec::new("find_by_active_is_false", ResultShape::List);
        let signature = parsed(&spec);

        let plan = compile_simple(&signature, &[]).unwrap();
        assert_eq!(plan.restrictions[0].operator, Operator::Equals);
        assert_eq!(plan.restrictions[0].value, Value::Bool(false));
    }

    #[test]
    fn argument_count_is_checked_per_invocation() {
        let spec = MethodSpec::new("find_by_email", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let err = compile_simple(&signature, &[]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Arguments(boxed)
                if matches!(*boxed, ArgumentError::Count { expected: 1, found: 0 })
        ));
    }

    #[test]
    fn runtime_value_family_is_checked_against_the_operator() {
        let spec = MethodSpec::new("find_by_created_at_after", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Temporal));
        let signature = parsed(&spec);

        let err = compile_simple(&signature, &[Value::Int(7)]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Arguments(boxed)
                if matches!(*boxed, ArgumentError::Family { .. })
        ));
    }

    #[test]
    fn declared_clustering_order_is_accepted() {
        let spec = MethodSpec::new(
            "find_by_user_id_order_by_created_at_desc_and_score",
            ResultShape::List,
        )
        .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let plan = compile_simple(&signature, &[Value::from("u-1")]).unwrap();
        assert_eq!(plan.order.len(), 2);
    }

    #[test]
    fn reversed_clustering_order_is_accepted() {
        let spec = MethodSpec::new(
            "find_by_user_id_order_by_created_at_asc_and_score_desc",
            ResultShape::List,
        )
        .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        assert!(compile_simple(&signature, &[Value::from("u-1")]).is_ok());
    }

    #[test]
    fn mixed_sort_directions_are_rejected() {
        let spec = MethodSpec::new(
            "find_by_user_id_order_by_created_at_desc_and_score_desc",
            ResultShape::List,
        )
        .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let err = compile_simple(&signature, &[Value::from("u-1")]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Capability(boxed)
                if matches!(*boxed, CapabilityError::UnsupportedOrderDirection)
        ));
    }

    #[test]
    fn sort_on_non_clustering_column_is_rejected() {
        let spec = MethodSpec::new("find_by_user_id_order_by_email", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let err = compile_simple(&signature, &[Value::from("u-1")]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Capability(boxed)
                if matches!(*boxed, CapabilityError::NonClusteringOrder { .. })
        ));
    }

    #[test]
    fn sort_must_start_at_the_first_clustering_position() {
        let spec = MethodSpec::new("find_by_user_id_order_by_score", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let err = compile_simple(&signature, &[Value::from("u-1")]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Capability(boxed)
                if matches!(*boxed, CapabilityError::ClusteringPositionMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_sort_columns_across_sources_are_rejected() {
        let spec = MethodSpec::new(
            "find_by_user_id_order_by_created_at_desc",
            ResultShape::List,
        )
        .param(ParamSpec::Argument(ValueFamily::Text))
        .param(ParamSpec::Sort);
        let signature = parsed(&spec);

        let dynamic = SortSpec::new().desc("created_at");
        let err = compile(
            &UsersSchema,
            &CompileRequest {
                tree: &signature.tree,
                modifiers: &signature.modifiers,
                args: &[Value::from("u-1")],
                dynamic_sort: Some(&dynamic),
                options: OPTIONS,
                page_size: None,
                page_state: None,
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            QueryError::Arguments(boxed)
                if matches!(*boxed, ArgumentError::DuplicateSortColumn { .. })
        ));
    }

    #[test]
    fn single_result_methods_reject_paging() {
        let spec = MethodSpec::new("find_by_email", ResultShape::Single)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let err = compile(
            &UsersSchema,
            &CompileRequest {
                tree: &signature.tree,
                modifiers: &signature.modifiers,
                args: &[Value::from("a@b")],
                dynamic_sort: None,
                options: OPTIONS,
                page_size: Some(10),
                page_state: None,
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            QueryError::Capability(boxed)
                if matches!(*boxed, CapabilityError::SingleResultPaging)
        ));
    }

    #[test]
    fn page_size_overrides_the_effective_fetch_size() {
        let spec = MethodSpec::new("find_all", ResultShape::Slice);
        let signature = parsed(&spec);

        let plan = compile(
            &UsersSchema,
            &CompileRequest {
                tree: &signature.tree,
                modifiers: &signature.modifiers,
                args: &[],
                dynamic_sort: None,
                options: OPTIONS,
                page_size: Some(25),
                page_state: None,
            },
        )
        .unwrap();

        assert_eq!(plan.fetch_size, 25);
    }

    #[test]
    fn signature_is_deterministic_and_value_sensitive() {
        let spec = MethodSpec::new("find_by_email", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let plan_a = compile_simple(&signature, &[Value::from("a@b")]).unwrap();
        let plan_b = compile_simple(&signature, &[Value::from("a@b")]).unwrap();
        let plan_c = compile_simple(&signature, &[Value::from("c@d")]).unwrap();

        assert_eq!(plan_a.signature(), plan_b.signature());
        assert_ne!(plan_a.signature(), plan_c.signature());
    }

    #[test]
    fn signature_excludes_fetch_size_and_resume_state() {
        let spec = MethodSpec::new("find_by_email", ResultShape::List)
            .param(ParamSpec::Argument(ValueFamily::Text));
        let signature = parsed(&spec);

        let mut plan_a = compile_simple(&signature, &[Value::from("a@b")]).unwrap();
        let mut plan_b = plan_a.clone();
        plan_a.fetch_size = 10;
        plan_b.fetch_size = 99;
        plan_b.resume = Some(vec![1, 2, 3]);

        assert_eq!(plan_a.signature(), plan_b.signature());
    }

    #[test]
    fn foreign_paging_state_is_rejected_at_compile() {
        let by_email = parsed(
            &MethodSpec::new("find_by_email", ResultShape::Slice)
                .param(ParamSpec::Argument(ValueFamily::Text))
                .param(ParamSpec::Page),
        );
        let by_age = parsed(
            &MethodSpec::new("find_by_age", ResultShape::Slice)
                .param(ParamSpec::Argument(ValueFamily::Numeric))
                .param(ParamSpec::Page),
        );

        let email_plan = compile_simple(&by_email, &[Value::from("a@b")]).unwrap();
        let token = PagingState::seal(email_plan.signature(), vec![0, 0, 0, 10]).unwrap();
        let state = PageState::Resume(token);

        let err = compile(
            &UsersSchema,
            &CompileRequest {
                tree: &by_age.tree,
                modifiers: &by_age.modifiers,
                args: &[Value::Int(30)],
                dynamic_sort: None,
                options: OPTIONS,
                page_size: Some(10),
                page_state: Some(&state),
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            QueryError::PagingState(boxed)
                if matches!(*boxed, PagingStateError::ForeignToken { .. })
        ));
    }
}
