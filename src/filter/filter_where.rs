use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{Condition, FilterOp};

/// Renders conditions as PostgREST query pairs and evaluates them against JSON rows.
pub struct FilterWhere;

impl FilterWhere {
    /// `[eq(id, "L1"), eq(created_by, "u1")]` → `[("id", "eq.L1"), ("created_by", "eq.u1")]`
    pub fn to_query_pairs(conditions: &[Condition]) -> Result<Vec<(String, String)>, FilterError> {
        let mut pairs = Vec::with_capacity(conditions.len());
        for condition in conditions {
            condition.validate()?;
            let rendered = match condition.operator {
                FilterOp::Eq | FilterOp::Neq => {
                    format!("{}.{}", condition.operator.as_str(), Self::value_text(&condition.data))
                }
                FilterOp::Is => format!("is.{}", Self::value_text(&condition.data)),
                FilterOp::In => {
                    let items: Vec<String> = condition
                        .data
                        .as_array()
                        .map(|values| values.iter().map(Self::quote_list_item).collect())
                        .unwrap_or_default();
                    format!("in.({})", items.join(","))
                }
            };
            pairs.push((condition.column.clone(), rendered));
        }
        Ok(pairs)
    }

    /// A row matches when every condition holds.
    pub fn matches(row: &Map<String, Value>, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| Self::matches_one(row, condition))
    }

    fn matches_one(row: &Map<String, Value>, condition: &Condition) -> bool {
        let field = row.get(&condition.column).unwrap_or(&Value::Null);
        match condition.operator {
            FilterOp::Eq => !field.is_null() && Self::values_equal(field, &condition.data),
            FilterOp::Neq => !field.is_null() && !Self::values_equal(field, &condition.data),
            FilterOp::Is => field == &condition.data,
            FilterOp::In => condition
                .data
                .as_array()
                .map(|values| values.iter().any(|v| Self::values_equal(field, v)))
                .unwrap_or(false),
        }
    }

    /// Compare the way the store does: by textual representation.
    fn values_equal(a: &Value, b: &Value) -> bool {
        a == b || Self::value_text(a) == Self::value_text(b)
    }

    pub fn value_text(value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn quote_list_item(value: &Value) -> String {
        let text = Self::value_text(value);
        if text.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | ':' | ' ')) {
            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            text
        }
    }
}
