//! Field-level validation of catalog entities.
//!
//! Errors are collected rather than returned on first failure, keyed by
//! entity field, by column key, or by filter id, so a caller can annotate
//! every offending input at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::layout::validate_widths;
use crate::model::{Query, Renderer, Report};
use crate::render::RenderEngine;

/// Validation failures of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    /// Entity field name to message.
    pub fields: BTreeMap<String, String>,
    /// Column key to column field to message.
    pub columns: BTreeMap<String, BTreeMap<String, String>>,
    /// Filter id to filter field to message.
    pub filters: BTreeMap<String, BTreeMap<String, String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.columns.is_empty() && self.filters.is_empty()
    }

    /// Total number of individual messages.
    pub fn len(&self) -> usize {
        self.fields.len()
            + self.columns.values().map(BTreeMap::len).sum::<usize>()
            + self.filters.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn field(&mut self, field: &str, message: impl Into<String>) {
        self.fields.insert(field.to_string(), message.into());
    }

    pub fn column(&mut self, key: &str, field: &str, message: impl Into<String>) {
        self.columns
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), message.into());
    }

    pub fn filter(&mut self, id: &str, field: &str, message: impl Into<String>) {
        self.filters
            .entry(id.to_string())
            .or_default()
            .insert(field.to_string(), message.into());
    }

    pub fn field_message(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn column_message(&self, key: &str, field: &str) -> Option<&str> {
        self.columns.get(key)?.get(field).map(String::as_str)
    }

    pub fn filter_message(&self, id: &str, field: &str) -> Option<&str> {
        self.filters.get(id)?.get(field).map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::with_capacity(self.len());
        for (field, message) in &self.fields {
            lines.push(format!("{}: {}", field, message));
        }
        for (key, errors) in &self.columns {
            for (field, message) in errors {
                lines.push(format!("columns[{}].{}: {}", key, field, message));
            }
        }
        for (id, errors) in &self.filters {
            for (field, message) in errors {
                lines.push(format!("columnFilters[{}].{}: {}", id, field, message));
            }
        }
        f.write_str(&lines.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a renderer before it is saved.
pub fn validate_renderer(renderer: &Renderer, engine: &RenderEngine) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if renderer.name.trim().is_empty() {
        errors.field("name", "Name is mandatory");
    }
    if renderer.description.trim().is_empty() {
        errors.field("description", "Description is mandatory");
    }
    if renderer.format_expression.trim().is_empty() {
        errors.field("formatExpression", "Render function is mandatory");
    } else if let Err(e) = engine.compile(&renderer.format_expression) {
        errors.field("formatExpression", e.to_string());
    }

    errors.into_result()
}

/// Validate a query before it is saved or run.
pub fn validate_query(query: &Query, renderers: &[Renderer]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if query.name.trim().is_empty() {
        errors.field("name", "Name is required");
    }
    if query.sql_text.trim().is_empty() {
        errors.field("sqlText", "SQL Query is required");
    } else if let Some(message) = check_statement(&query.sql_text) {
        errors.field("sqlText", message);
    }

    for column in query.enabled_columns() {
        if column.display_name.trim().is_empty() {
            errors.column(&column.key, "displayName", "Name is required");
        }
        let Some(renderer_id) = column.renderer_id.as_deref() else {
            errors.column(&column.key, "rendererId", "Renderer is required");
            continue;
        };
        match renderers.iter().find(|r| r.id == renderer_id) {
            None => errors.column(
                &column.key,
                "rendererId",
                format!("Renderer '{}' does not exist", renderer_id),
            ),
            Some(renderer) if !renderer.accepts(column.semantic_type()) => errors.column(
                &column.key,
                "rendererId",
                format!(
                    "Renderer '{}' formats {} values, not {}",
                    renderer.name, renderer.type_of, column.source_type
                ),
            ),
            Some(_) => {}
        }
    }

    errors.into_result()
}

/// Reject SQL that parses as something other than a single query.
///
/// Text the generic dialect cannot parse is left for the database to judge.
fn check_statement(sql: &str) -> Option<String> {
    let statements = match Parser::parse_sql(&GenericDialect {}, sql) {
        Ok(statements) => statements,
        Err(e) => {
            debug!("deferring SQL check to the database: {}", e);
            return None;
        }
    };

    match statements.as_slice() {
        [Statement::Query(_)] => None,
        [_] => Some("SQL Query must be a SELECT statement".to_string()),
        [] => Some("SQL Query is required".to_string()),
        _ => Some("SQL Query must be a single statement".to_string()),
    }
}

/// Validate a report before it is saved: content plus the width invariant.
pub fn validate_report(report: &Report, queries: &[Query]) -> Result<(), ValidationErrors> {
    let mut errors = report_content_errors(report, queries);
    if let Err(mismatch) = validate_widths(report) {
        errors.field("paperSize", mismatch.to_string());
    }
    errors.into_result()
}

/// Validate what a report needs to be materialized for preview: its name,
/// its query reference and its filters. Column widths are not checked.
pub fn validate_report_content(report: &Report, queries: &[Query]) -> Result<(), ValidationErrors> {
    report_content_errors(report, queries).into_result()
}

fn report_content_errors(report: &Report, queries: &[Query]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if report.name.trim().is_empty() {
        errors.field("name", "Name must not be empty");
    }

    let query = if report.query_id.is_empty() {
        errors.field("queryId", "Query Id must not be empty");
        None
    } else {
        let found = queries.iter().find(|q| q.id == report.query_id);
        if found.is_none() {
            errors.field(
                "queryId",
                format!("Query '{}' does not exist", report.query_id),
            );
        }
        found
    };

    for filter in &report.column_filters {
        if filter.filter_condition.is_none() {
            errors.filter(&filter.id, "filterCondition", "Filter condition required");
        }
        if filter.filter_value.is_empty() {
            errors.filter(&filter.id, "filterValue", "Filter value required");
        }
        if filter.column_key.is_empty() {
            errors.filter(&filter.id, "columnKey", "Column key required");
        } else if let Some(query) = query {
            let known = query
                .column(&filter.column_key)
                .is_some_and(|c| c.enabled);
            if !known {
                errors.filter(
                    &filter.id,
                    "columnKey",
                    format!("Column '{}' is not enabled on the query", filter.column_key),
                );
            }
        }
    }

    errors
}
