//! Derived-method registry and invocation surface.
//!
//! Signatures are parsed exactly once, at registration; invocation reuses
//! the parse product and pays only for binding, capability checks, and plan
//! compilation.

use crate::{
    error::QueryError,
    exec::{Row, StatementExecutor},
    materialize::{self, RowStream},
    obs::sink::{self, MetricsEvent},
    paging::{PageRequest, Slice},
    query::{
        options::{EffectiveOptions, QueryOptions},
        parser::{self, MethodSpec, ParsedSignature},
        plan::{self, ArgumentError, CompileRequest, StatementPlan},
        predicate::{ResultShape, SortSpec},
    },
    schema::TableSchema,
    value::Value,
};

///
/// MethodId
///
/// Registration handle for one derived method. Valid only against the
/// repository that issued it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MethodId(usize);

///
/// CompiledMethod
///

struct CompiledMethod {
    name: String,
    signature: ParsedSignature,
    options: Option<QueryOptions>,
}

///
/// Call
///
/// Per-invocation inputs: predicate arguments in binding order plus the
/// optional trailing modifiers the method declared.
///

#[derive(Clone, Debug, Default)]
pub struct Call {
    args: Vec<Value>,
    sort: Option<SortSpec>,
    page: Option<PageRequest>,
    options: Option<QueryOptions>,
}

impl Call {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            args: Vec::new(),
            sort: None,
            page: None,
            options: None,
        }
    }

    /// Append one predicate argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub const fn options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }
}

///
/// Outcome
///
/// Tagged result of shape-dispatched invocation via [`Repository::invoke`].
///

pub enum Outcome {
    Rows(Vec<Row>),
    One(Option<Row>),
    Stream(RowStream),
    Slice(Slice<Row>),
}

///
/// Repository
///
/// Owns the table schema and the execution collaborator; both arrive by
/// construction. Methods register up front and are invoked by handle through
/// the shape-specific accessors.
///

pub struct Repository<S: TableSchema, X: StatementExecutor> {
    schema: S,
    executor: X,
    methods: Vec<CompiledMethod>,
}

impl<S: TableSchema, X: StatementExecutor> Repository<S, X> {
    pub const fn new(schema: S, executor: X) -> Self {
        Self {
            schema,
            executor,
            methods: Vec::new(),
        }
    }

    /// Register one derived method. Any signature defect surfaces here, not
    /// at first use.
    pub fn register(&mut self, spec: MethodSpec) -> Result<MethodId, QueryError> {
        let signature = parser::parse(&self.schema, &spec)?;
        sink::record(MetricsEvent::MethodRegistered {
            shape: signature.modifiers.shape,
        });

        self.methods.push(CompiledMethod {
            name: spec.name,
            signature,
            options: spec.options,
        });
        Ok(MethodId(self.methods.len() - 1))
    }

    /// Dispatch on the registered shape, wrapping the result in a tagged
    /// [`Outcome`]. The shape-specific accessors are the checked equivalents
    /// for callers that know the shape statically.
    pub fn invoke(&self, id: MethodId, call: &Call) -> Result<Outcome, QueryError> {
        match self.method(id)?.signature.modifiers.shape {
            ResultShape::List => self.rows(id, call).map(Outcome::Rows),
            ResultShape::Single => self.one(id, call).map(Outcome::One),
            ResultShape::Stream => self.stream(id, call).map(Outcome::Stream),
            ResultShape::Slice => self.page(id, call).map(Outcome::Slice),
        }
    }

    /// Registered name of a method handle.
    pub fn method_name(&self, id: MethodId) -> Result<&str, QueryError> {
        self.method(id).map(|m| m.name.as_str())
    }

    /// Fully materialized list invocation.
    pub fn rows(&self, id: MethodId, call: &Call) -> Result<Vec<Row>, QueryError> {
        let method = self.checked(id, ResultShape::List, call)?;
        let plan = self.compile(method, call, None)?;
        let cursor = self.executor.execute(&plan).map_err(QueryError::from)?;
        materialize::collect_rows(cursor)
    }

    /// At-most-one invocation; absence is `None`, a second row is an error.
    pub fn one(&self, id: MethodId, call: &Call) -> Result<Option<Row>, QueryError> {
        let method = self.checked(id, ResultShape::Single, call)?;
        let plan = self.compile(method, call, None)?;
        let cursor = self.executor.execute(&plan).map_err(QueryError::from)?;
        materialize::collect_one(cursor)
    }

    /// Lazy invocation; the returned stream holds the cursor until it is
    /// exhausted, closed, or dropped.
    pub fn stream(&self, id: MethodId, call: &Call) -> Result<RowStream, QueryError> {
        let method = self.checked(id, ResultShape::Stream, call)?;
        let plan = self.compile(method, call, None)?;
        let cursor = self.executor.execute(&plan).map_err(QueryError::from)?;
        Ok(RowStream::new(cursor))
    }

    /// One forward page. Without an explicit page request the first page uses
    /// the effective fetch size; an exhausted request yields an empty
    /// terminal slice without touching the store.
    pub fn page(&self, id: MethodId, call: &Call) -> Result<Slice<Row>, QueryError> {
        let method = self.checked(id, ResultShape::Slice, call)?;

        let effective = self.effective_options(method, call);
        let request = match &call.page {
            Some(request) => request.clone(),
            None => PageRequest::first(effective.fetch_size),
        };

        if request.is_exhausted() {
            sink::record(MetricsEvent::PageServed {
                rows: 0,
                terminal: true,
            });
            return Ok(Slice::empty());
        }

        let plan = self.compile(method, call, Some(&request))?;
        let cursor = self.executor.execute(&plan).map_err(QueryError::from)?;
        materialize::collect_slice(cursor, request.size(), plan.signature())
    }

    fn method(&self, id: MethodId) -> Result<&CompiledMethod, QueryError> {
        self.methods
            .get(id.0)
            .ok_or_else(|| ArgumentError::UnknownMethod { id: id.0 }.into())
    }

    // Handle lookup, shape gate, and declared-modifier gate in one step.
    fn checked(
        &self,
        id: MethodId,
        requested: ResultShape,
        call: &Call,
    ) -> Result<&CompiledMethod, QueryError> {
        let method = self.method(id)?;
        let signature = &method.signature;

        let registered = signature.modifiers.shape;
        if registered != requested {
            return Err(ArgumentError::ShapeMismatch {
                registered,
                requested,
            }
            .into());
        }

        if call.sort.is_some() && !signature.takes_sort {
            return Err(ArgumentError::UnexpectedSort.into());
        }
        if call.page.is_some() && !signature.takes_page {
            return Err(ArgumentError::UnexpectedPage.into());
        }
        if call.options.is_some() && !signature.takes_options {
            return Err(ArgumentError::UnexpectedOptions.into());
        }

        Ok(method)
    }

    fn effective_options(&self, method: &CompiledMethod, call: &Call) -> EffectiveOptions {
        EffectiveOptions::resolve(
            call.options.as_ref(),
            method.options.as_ref(),
            &self.executor.defaults(),
        )
    }

    fn compile(
        &self,
        method: &CompiledMethod,
        call: &Call,
        page: Option<&PageRequest>,
    ) -> Result<StatementPlan, QueryError> {
        let plan = plan::compile(
            &self.schema,
            &CompileRequest {
                tree: &method.signature.tree,
                modifiers: &method.signature.modifiers,
                args: &call.args,
                dynamic_sort: call.sort.as_ref(),
                options: self.effective_options(method, call),
                page_size: page.map(PageRequest::size),
                page_state: page.map(PageRequest::state),
            },
        )?;

        sink::record(MetricsEvent::PlanCompiled {
            restrictions: plan.restrictions.len(),
        });
        Ok(plan)
    }
}

///
/// TESTS
///
