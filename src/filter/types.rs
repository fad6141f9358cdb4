use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::is_identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "eq")] Eq,
    #[serde(rename = "neq")] Neq,
    #[serde(rename = "in")] In,
    #[serde(rename = "is")] Is,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::In => "in",
            FilterOp::Is => "is",
        }
    }
}

/// One predicate on a collection column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { column: column.into(), operator: FilterOp::Eq, data: value.into() }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { column: column.into(), operator: FilterOp::Neq, data: value.into() }
    }

    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self { column: column.into(), operator: FilterOp::In, data: Value::Array(values) }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self { column: column.into(), operator: FilterOp::Is, data: Value::Null }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if !is_identifier(&self.column) {
            return Err(FilterError::InvalidColumn(self.column.clone()));
        }
        match (self.operator, &self.data) {
            (FilterOp::In, Value::Array(_)) => Ok(()),
            (FilterOp::In, _) => Err(FilterError::InvalidOperatorData("in requires an array".to_string())),
            (FilterOp::Is, Value::Null | Value::Bool(_)) => Ok(()),
            (FilterOp::Is, _) => Err(FilterError::InvalidOperatorData("is accepts null, true or false".to_string())),
            (_, Value::Array(_) | Value::Object(_)) => Err(FilterError::InvalidOperatorData(format!(
                "{} requires a scalar value",
                self.operator.as_str()
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Conditions, ordering and limit for a single-collection read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    pub order: Vec<FilterOrderInfo>,
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::eq(column, value));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append ordering from a `"created_at desc, name"` style string.
    pub fn order(mut self, spec: &str) -> Self {
        self.order.extend(FilterOrder::parse(spec));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        for condition in &self.conditions {
            condition.validate()?;
        }
        for info in &self.order {
            if !is_identifier(&info.column) {
                return Err(FilterError::InvalidOrder(info.column.clone()));
            }
        }
        Ok(())
    }
}
