//! List queries: field filters, ordering and limits.
//!
//! Filters are evaluated against a record's serialized JSON form, so the same
//! query works for any [`Resource`](crate::resources::Resource) and for rows
//! pushed by the change transport.

use crate::resources::{TaskCategory, TaskStatus};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    Gte,
    Lte,
}

/// `field <op> value`, e.g. `venue_id = "v1"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Whether `row` satisfies the filter. A missing field never matches.
    pub fn matches(&self, row: &Value) -> bool {
        let Some(actual) = row.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Neq => actual != &self.value,
            FilterOp::Gte => {
                matches!(compare_values(actual, &self.value), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOp::Lte => {
                matches!(compare_values(actual, &self.value), Some(Ordering::Less | Ordering::Equal))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

/// Parameters of a `list` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filters: Vec<FieldFilter>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn neq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Neq, value)
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    pub fn order_by(mut self, field: &str, ascending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn for_venue(self, venue_id: &str) -> Self {
        self.eq("venue_id", venue_id)
    }

    // --- Typed queries ---

    /// Bookings with `start <= date <= end` (ISO dates), ordered by date.
    pub fn bookings_between(start: &str, end: &str) -> Self {
        Self::new()
            .gte("date", start)
            .lte("date", end)
            .order_by("date", true)
    }

    /// Active inventory items ordered by name.
    pub fn active_items() -> Self {
        Self::new().eq("is_active", true).order_by("name", true)
    }

    /// Active employees ordered by first name.
    pub fn active_employees() -> Self {
        Self::new().eq("is_active", true).order_by("first_name", true)
    }

    /// Shifts still clocked in, newest first.
    pub fn active_shifts() -> Self {
        Self::new().eq("status", "active").order_by("clock_in", false)
    }

    pub fn shift_history(params: &ShiftHistoryQuery) -> Self {
        let mut query = Self::new().order_by("clock_in", false);
        if let Some(start) = params.start {
            query = query.gte("clock_in", start.0);
        }
        if let Some(end) = params.end {
            query = query.lte("clock_in", end.0);
        }
        if let Some(employee) = &params.employee_id {
            query = query.eq("employee_id", employee.as_str());
        }
        if let Some(limit) = params.limit {
            query = query.limit(limit);
        }
        query
    }

    pub fn tasks(params: &TaskQuery) -> Self {
        let mut query = Self::new().order_by("created_at", false);
        if let Some(status) = params.status {
            query = query.eq("status", enum_value(&status));
        }
        if let Some(category) = params.category {
            query = query.eq("category", enum_value(&category));
        }
        if let Some(assignee) = &params.assigned_to {
            query = query.eq("assigned_to", assignee.as_str());
        }
        query
    }

    /// Whether a serialized row passes every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Filter, order and truncate `rows` (pairs of record and its JSON form).
    pub fn apply<R>(&self, rows: Vec<(R, Value)>) -> Vec<R> {
        let mut rows: Vec<(R, Value)> = rows.into_iter().filter(|(_, v)| self.matches(v)).collect();

        if let Some(order) = &self.order_by {
            rows.sort_by(|(_, a), (_, b)| {
                let ord = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let limit = self.limit.unwrap_or(usize::MAX);
        rows.into_iter().take(limit).map(|(r, _)| r).collect()
    }
}

/// Filters of the shift history view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShiftHistoryQuery {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub employee_id: Option<String>,
    pub limit: Option<usize>,
}

/// Filters of the task list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub assigned_to: Option<String>,
}

fn enum_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Numbers compare numerically, strings lexically (ISO dates sort correctly),
/// booleans false < true. Mixed types are incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
