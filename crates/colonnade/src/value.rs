use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// ValueFamily
///
/// Coarse type classes for store column values. Operator acceptance checks
/// and registration-time argument validation work at this granularity; exact
/// column-type conversion belongs to the mapping collaborator.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ValueFamily {
    #[display("boolean")]
    Boolean,
    #[display("numeric")]
    Numeric,
    #[display("temporal")]
    Temporal,
    #[display("text")]
    Text,
    #[display("collection")]
    Collection,
    #[display("bytes")]
    Bytes,
}

///
/// Value
///
/// Runtime column value bound into a statement plan.
///
/// `Null` carries no family; family checks skip it and leave null-handling
/// semantics to the mapping collaborator.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    /// Ordered list of values. Used for `in` argument transport; list order
    /// is preserved for plan signatures.
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn family(&self) -> Option<ValueFamily> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueFamily::Boolean),
            Self::Int(_) | Self::Double(_) => Some(ValueFamily::Numeric),
            Self::Text(_) => Some(ValueFamily::Text),
            Self::Bytes(_) => Some(ValueFamily::Bytes),
            Self::Timestamp(_) => Some(ValueFamily::Temporal),
            Self::List(_) => Some(ValueFamily::Collection),
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_classify_every_variant() {
        assert_eq!(Value::Bool(true).family(), Some(ValueFamily::Boolean));
        assert_eq!(Value::Int(1).family(), Some(ValueFamily::Numeric));
        assert_eq!(Value::Double(1.5).family(), Some(ValueFamily::Numeric));
        assert_eq!(Value::from("x").family(), Some(ValueFamily::Text));
        assert_eq!(Value::Bytes(vec![1]).family(), Some(ValueFamily::Bytes));
        assert_eq!(
            Value::Timestamp(Utc::now()).family(),
            Some(ValueFamily::Temporal)
        );
        assert_eq!(Value::List(vec![]).family(), Some(ValueFamily::Collection));
        assert_eq!(Value::Null.family(), None);
    }
}
