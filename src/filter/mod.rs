//! Filter predicate engine.
//!
//! A report's filters form a flat, ordered list. The first filter seeds the
//! result and every later filter is folded in with its *own* join type:
//!
//! ```text
//! acc = eval(f0)
//! acc = acc AND eval(f1)   -- f1.join_type == and
//! acc = acc OR  eval(f2)   -- f2.join_type == or
//! ```
//!
//! There is no grouping or precedence; `a or b and c` folds as
//! `(a or b) and c`. Every term is evaluated, none short-circuit.

use serde_json::Value;
use tracing::debug;

use crate::model::{ColumnFilter, FilterCondition, JoinType, Record};

/// Evaluate a single filter against a mapped record.
///
/// A key missing from the record never matches. `greaterThan` and
/// `lessThan` never match either; ordering comparisons are not supported.
pub fn evaluate_one(filter: &ColumnFilter, record: &Record) -> bool {
    let Some(field) = record.get(&filter.column_key) else {
        return false;
    };
    let Some(condition) = filter.filter_condition else {
        return false;
    };

    let field = display_value(field);
    let operand = filter.filter_value.to_string();

    match condition {
        FilterCondition::Equals => field == operand,
        FilterCondition::Contains => field.contains(&operand),
        FilterCondition::StartsWith => field.starts_with(&operand),
        FilterCondition::EndsWith => field.ends_with(&operand),
        FilterCondition::GreaterThan | FilterCondition::LessThan => false,
    }
}

/// Fold a filter list over one record.
pub fn matches(filters: &[ColumnFilter], record: &Record) -> bool {
    let mut terms = filters.iter();
    let Some(first) = terms.next() else {
        return true;
    };

    terms.fold(evaluate_one(first, record), |acc, filter| {
        let current = evaluate_one(filter, record);
        match filter.join_type {
            JoinType::And => acc && current,
            JoinType::Or => acc || current,
        }
    })
}

/// Build a reusable predicate over mapped records.
pub fn build_predicate(filters: &[ColumnFilter]) -> impl Fn(&Record) -> bool + '_ {
    move |record: &Record| matches(filters, record)
}

/// Keep the records accepted by `filters`, preserving order.
pub fn apply(filters: &[ColumnFilter], records: Vec<Record>) -> Vec<Record> {
    let before = records.len();
    let predicate = build_predicate(filters);
    let kept: Vec<Record> = records.into_iter().filter(|r| predicate(r)).collect();
    debug!(
        filters = filters.len(),
        before,
        kept = kept.len(),
        "applied column filters"
    );
    kept
}

/// Unique display values of one column in first-seen order.
///
/// Offered as operands for `equals` filters. Records lacking the key are
/// skipped.
pub fn distinct_values(records: &[Record], column_key: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter_map(|r| r.get(column_key))
        .map(display_value)
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// String form of a cell value as filters compare it.
///
/// Null becomes the empty string, integral floats drop their fraction,
/// arrays join their elements with `,` and objects collapse to
/// `[object Object]`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                n.as_f64().map(number_text).unwrap_or_else(|| n.to_string())
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}
