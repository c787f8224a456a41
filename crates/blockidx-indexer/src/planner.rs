//! Query planning
//!
//! Validates a conjunction of conditions and orders it for evaluation.
//! Height conditions are evaluated before attribute conditions.

use blockidx_core::Condition;

use crate::error::{IndexError, IndexResult};

/// Validated evaluation order for one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    height: Vec<Condition>,
    fields: Vec<Condition>,
}

impl QueryPlan {
    /// Conditions on `block.height`, in query order
    pub fn height_conditions(&self) -> &[Condition] {
        &self.height
    }

    /// Conditions on event attributes, in query order
    pub fn field_conditions(&self) -> &[Condition] {
        &self.fields
    }

    /// Every condition in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.height.iter().chain(self.fields.iter())
    }

    pub fn len(&self) -> usize {
        self.height.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate `conditions` and partition them into a [`QueryPlan`]
///
/// Rejects, before anything is scanned:
/// - an empty condition list
/// - a condition with an empty field name
/// - a range operator whose operand is not an integer
pub fn plan(conditions: &[Condition]) -> IndexResult<QueryPlan> {
    if conditions.is_empty() {
        return Err(IndexError::invalid_query("query has no conditions"));
    }

    let mut height = Vec::new();
    let mut fields = Vec::new();
    for condition in conditions {
        validate(condition)?;
        if condition.is_height() {
            height.push(condition.clone());
        } else {
            fields.push(condition.clone());
        }
    }

    Ok(QueryPlan { height, fields })
}

fn validate(condition: &Condition) -> IndexResult<()> {
    if condition.field.is_empty() {
        return Err(IndexError::invalid_query(format!(
            "condition `{condition}` has no field"
        )));
    }

    if condition.op.is_range() && !condition.operand_kind().is_numeric() {
        return Err(IndexError::invalid_query(format!(
            "operator {} requires an integer operand, got {:?}",
            condition.op, condition.operand
        )));
    }

    Ok(())
}
