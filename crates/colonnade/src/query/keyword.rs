use crate::value::ValueFamily;
use derive_more::Display;

///
/// Operator
///
/// Closed predicate-operator set. Every keyword in [`KEYWORDS`] maps to
/// exactly one operator; each operator has a fixed argument arity and a
/// fixed set of accepted value families. A bare property name with no
/// keyword suffix parses as `Equals`.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[repr(u8)]
pub enum Operator {
    #[display("equals")]
    Equals = 0x01,
    #[display("after")]
    After = 0x02,
    #[display("before")]
    Before = 0x03,
    #[display("greater_than")]
    GreaterThan = 0x04,
    #[display("greater_than_equal")]
    GreaterThanEqual = 0x05,
    #[display("less_than")]
    LessThan = 0x06,
    #[display("less_than_equal")]
    LessThanEqual = 0x07,
    #[display("in")]
    In = 0x08,
    #[display("like")]
    Like = 0x09,
    #[display("starts_with")]
    StartsWith = 0x0a,
    #[display("ends_with")]
    EndsWith = 0x0b,
    #[display("contains")]
    Contains = 0x0c,
    #[display("is_true")]
    IsTrue = 0x0d,
    #[display("is_false")]
    IsFalse = 0x0e,
}

impl Operator {
    /// Number of method parameters one clause with this operator consumes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::IsTrue | Self::IsFalse => 0,
            _ => 1,
        }
    }

    /// Whether this operator accepts an argument of the given family.
    ///
    /// Zero-arity operators accept no argument at all; `contains` stays open
    /// across families because the argument is one element of a collection
    /// column (or a fragment of a text column).
    #[must_use]
    pub const fn accepts(self, family: ValueFamily) -> bool {
        match self {
            Self::Equals | Self::Contains => true,
            Self::After | Self::Before => matches!(family, ValueFamily::Temporal),
            Self::GreaterThan | Self::GreaterThanEqual | Self::LessThan | Self::LessThanEqual => {
                matches!(
                    family,
                    ValueFamily::Numeric | ValueFamily::Temporal | ValueFamily::Text
                )
            }
            Self::In => matches!(family, ValueFamily::Collection),
            Self::Like | Self::StartsWith | Self::EndsWith => {
                matches!(family, ValueFamily::Text)
            }
            Self::IsTrue | Self::IsFalse => false,
        }
    }

    pub(crate) const fn tag(self) -> u8 {
        self as u8
    }
}

///
/// KEYWORDS
///
/// Method-name token table, longest token first so suffix scans take the
/// longest match (`greater_than_equal` wins over `greater_than`). `equals`
/// has no token on purpose: it is the default for a bare property segment.
///

pub const KEYWORDS: &[(&str, Operator)] = &[
    ("greater_than_equal", Operator::GreaterThanEqual),
    ("less_than_equal", Operator::LessThanEqual),
    ("greater_than", Operator::GreaterThan),
    ("starts_with", Operator::StartsWith),
    ("less_than", Operator::LessThan),
    ("ends_with", Operator::EndsWith),
    ("contains", Operator::Contains),
    ("is_false", Operator::IsFalse),
    ("is_true", Operator::IsTrue),
    ("before", Operator::Before),
    ("after", Operator::After),
    ("like", Operator::Like),
    ("in", Operator::In),
];

/// Split a clause segment into `(property, operator)` by matching the
/// longest keyword suffix at an `_` boundary. `None` means the whole
/// segment is a property with the default `Equals`.
pub(crate) fn split_keyword_suffix(segment: &str) -> Option<(&str, Operator)> {
    for (token, operator) in KEYWORDS {
        if let Some(rest) = segment.strip_suffix(token)
            && let Some(property) = rest.strip_suffix('_')
            && !property.is_empty()
        {
            return Some((property, *operator));
        }
    }

    None
}

///
/// TESTS
///
