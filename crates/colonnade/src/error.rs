use crate::{
    exec::ExecuteError,
    materialize::MultiplicityError,
    paging::PagingStateError,
    query::{
        parser::ParseError,
        plan::{ArgumentError, CapabilityError},
    },
};
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Top-level error for the derivation layer. Each variant carries one error
/// family; larger families are boxed to keep the enum small on the stack.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum QueryError {
    #[error(transparent)]
    Parse(Box<ParseError>),

    #[error(transparent)]
    Capability(Box<CapabilityError>),

    #[error(transparent)]
    Arguments(Box<ArgumentError>),

    #[error(transparent)]
    Multiplicity(MultiplicityError),

    #[error(transparent)]
    PagingState(Box<PagingStateError>),

    #[error(transparent)]
    Execute(ExecuteError),
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self::Parse(Box::new(err))
    }
}

impl From<CapabilityError> for QueryError {
    fn from(err: CapabilityError) -> Self {
        Self::Capability(Box::new(err))
    }
}

impl From<ArgumentError> for QueryError {
    fn from(err: ArgumentError) -> Self {
        Self::Arguments(Box::new(err))
    }
}

impl From<MultiplicityError> for QueryError {
    fn from(err: MultiplicityError) -> Self {
        Self::Multiplicity(err)
    }
}

impl From<PagingStateError> for QueryError {
    fn from(err: PagingStateError) -> Self {
        Self::PagingState(Box::new(err))
    }
}

impl From<ExecuteError> for QueryError {
    fn from(err: ExecuteError) -> Self {
        Self::Execute(err)
    }
}
