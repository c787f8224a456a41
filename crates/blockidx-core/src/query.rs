//! Compiled query conditions
//!
//! A query is an ordered list of [`Condition`]s that are ANDed together.
//! Parsing a query language into conditions happens elsewhere.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::event::BLOCK_HEIGHT_FIELD;
use crate::value::ValueKind;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Operator {
    #[display("=")]
    Eq,
    #[display("<")]
    Lt,
    #[display("<=")]
    Lte,
    #[display(">")]
    Gt,
    #[display(">=")]
    Gte,
    #[display("CONTAINS")]
    Contains,
}

impl Operator {
    /// Whether this operator compares by numeric order
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte)
    }
}

/// A single `field op operand` condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("{field} {op} {operand}")]
pub struct Condition {
    /// Composite field name, e.g. `begin_event.proposer`
    pub field: String,
    pub op: Operator,
    /// Raw operand, classified with the same rule as stored values
    pub operand: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Operator, operand: impl ToString) -> Self {
        Self {
            field: field.into(),
            op,
            operand: operand.to_string(),
        }
    }

    pub fn eq(field: impl Into<String>, operand: impl ToString) -> Self {
        Self::new(field, Operator::Eq, operand)
    }

    pub fn lt(field: impl Into<String>, operand: impl ToString) -> Self {
        Self::new(field, Operator::Lt, operand)
    }

    pub fn lte(field: impl Into<String>, operand: impl ToString) -> Self {
        Self::new(field, Operator::Lte, operand)
    }

    pub fn gt(field: impl Into<String>, operand: impl ToString) -> Self {
        Self::new(field, Operator::Gt, operand)
    }

    pub fn gte(field: impl Into<String>, operand: impl ToString) -> Self {
        Self::new(field, Operator::Gte, operand)
    }

    pub fn contains(field: impl Into<String>, operand: impl ToString) -> Self {
        Self::new(field, Operator::Contains, operand)
    }

    /// Whether the condition targets the `block.height` pseudo-field
    pub fn is_height(&self) -> bool {
        self.field == BLOCK_HEIGHT_FIELD
    }

    /// Classification of the operand
    pub fn operand_kind(&self) -> ValueKind {
        ValueKind::classify(&self.operand)
    }
}
