//! Value classification
//!
//! Stored attribute values and query operands are both classified with the
//! same rule, so a numeric operand only ever meets numeric stored values.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Classification of an attribute value or operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ValueKind {
    /// The whole string parsed as a base-10 `i64`
    #[display("numeric({_0})")]
    Numeric(i64),
    /// Anything else, compared byte-wise
    #[display("text")]
    Text,
}

impl ValueKind {
    /// Classify a raw value
    ///
    /// Integers outside the `i64` range are text.
    pub fn classify(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Text,
        }
    }

    /// The parsed integer, if numeric
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Text => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }
}
