use crate::value::ValueFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

///
/// PropertyPath
///
/// Dot-free column reference resolved against the mapping collaborator:
/// either a top-level column or one named field inside a UDT-style column.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PropertyPath {
    pub column: String,
    pub field: Option<String>,
}

impl PropertyPath {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            column: name.into(),
            field: None,
        }
    }

    #[must_use]
    pub fn nested(column: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            field: Some(field.into()),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{field}", self.column),
            None => f.write_str(&self.column),
        }
    }
}

///
/// TableSchema
///
/// Entity-mapping collaborator seam. The core consults it at registration
/// (property resolution) and at compile time (index and clustering
/// capability flags); its internals are out of scope.
///

pub trait TableSchema {
    /// Store table this schema maps onto.
    fn table(&self) -> &str;

    /// Resolve a signature property name to a column reference.
    fn resolve(&self, name: &str) -> Option<PropertyPath>;

    /// Value family of a resolved property.
    fn family(&self, property: &PropertyPath) -> Option<ValueFamily>;

    /// Whether the property is part of the primary key (partition or
    /// clustering component).
    fn is_primary_key(&self, property: &PropertyPath) -> bool;

    /// Whether a secondary index backs the property.
    fn is_indexed(&self, property: &PropertyPath) -> bool;

    /// Declared clustering position and on-disk direction, if the property
    /// is a clustering column.
    fn clustering_order(&self, property: &PropertyPath) -> Option<(usize, SortDirection)>;
}
