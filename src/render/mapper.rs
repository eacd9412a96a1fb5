//! Row mapping: raw SQL records to display-ready records.
//!
//! A [`RowMapper`] binds a column set to the renderer catalog once, then
//! renders every enabled column of each row. Disabled columns are dropped
//! from the mapped record entirely.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    BatchScope, CompiledRenderer, RenderEngine, RenderError, RenderResult, ERROR_MARKER,
};
use crate::model::{Column, Record, Renderer};

/// A cell whose renderer failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellError {
    pub row_index: usize,
    pub column_key: String,
    pub message: String,
}

/// A column whose renderer could not be used; it renders as identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedRenderer {
    pub column_key: String,
    pub renderer_id: String,
    pub reason: String,
}

/// One mapped record plus the failures encountered while rendering it.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub record: Record,
    pub errors: Vec<CellError>,
}

/// A mapped batch in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRows {
    pub records: Vec<Record>,
    pub errors: Vec<CellError>,
}

struct BoundColumn {
    key: String,
    name: String,
    renderer: Result<CompiledRenderer, RenderError>,
}

/// Renders every enabled column of a row through its renderer.
pub struct RowMapper<'e> {
    engine: &'e RenderEngine,
    columns: Vec<BoundColumn>,
    unresolved: Vec<UnresolvedRenderer>,
    context: Record,
}

impl<'e> RowMapper<'e> {
    /// Resolve and compile the renderers of all enabled columns.
    ///
    /// A missing renderer, or one declared for another semantic type than
    /// the column's, falls back to identity and is reported through
    /// [`RowMapper::unresolved`]. A renderer that does not compile makes
    /// every cell of its column an error cell.
    pub fn new(engine: &'e RenderEngine, columns: &[Column], renderers: &[Renderer]) -> Self {
        let mut unresolved = Vec::new();
        let bound = columns
            .iter()
            .filter(|c| c.enabled)
            .map(|column| {
                let source = resolve_source(column, renderers, &mut unresolved);
                BoundColumn {
                    key: column.key.clone(),
                    name: column.title().to_string(),
                    renderer: engine.compile(source),
                }
            })
            .collect();

        for issue in &unresolved {
            warn!(
                column = %issue.column_key,
                renderer = %issue.renderer_id,
                "{}; rendering as identity",
                issue.reason
            );
        }

        Self {
            engine,
            columns: bound,
            unresolved,
            context: Record::new(),
        }
    }

    /// Supply the `ctx` table passed to every renderer.
    pub fn with_context(mut self, context: Record) -> Self {
        self.context = context;
        self
    }

    pub fn unresolved(&self) -> &[UnresolvedRenderer] {
        &self.unresolved
    }

    /// Keys present in every mapped record, in column order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Map a single raw record.
    pub fn map_row(
        &self,
        raw: &Record,
        row_index: usize,
        all_rows: &[Record],
    ) -> RenderResult<MappedRow> {
        let scope = self.engine.scope(all_rows, &self.context)?;
        let mut errors = Vec::new();
        let record = self.render_row(&scope, raw, row_index, &mut errors)?;
        Ok(MappedRow { record, errors })
    }

    /// Map every record of a result set, preserving order.
    pub fn map_all(&self, raw_rows: &[Record]) -> RenderResult<MappedRows> {
        let scope = self.engine.scope(raw_rows, &self.context)?;
        let mut mapped = MappedRows {
            records: Vec::with_capacity(raw_rows.len()),
            errors: Vec::new(),
        };
        for (row_index, raw) in raw_rows.iter().enumerate() {
            let record = self.render_row(&scope, raw, row_index, &mut mapped.errors)?;
            mapped.records.push(record);
        }

        debug!(
            rows = mapped.records.len(),
            columns = self.columns.len(),
            failed_cells = mapped.errors.len(),
            "mapped result set"
        );
        Ok(mapped)
    }

    fn render_row(
        &self,
        scope: &BatchScope,
        raw: &Record,
        row_index: usize,
        errors: &mut Vec<CellError>,
    ) -> RenderResult<Record> {
        let row = self.engine.row(raw)?;
        let mut record = Record::with_capacity(self.columns.len());

        for column in &self.columns {
            let cell_value = raw.get(&column.key).unwrap_or(&Value::Null);
            let rendered = column.renderer.as_ref().map_err(Clone::clone).and_then(|renderer| {
                self.engine.call(
                    renderer,
                    scope,
                    &row,
                    cell_value,
                    row_index,
                    &column.key,
                    &column.name,
                )
            });

            let value = match rendered {
                Ok(value) => value,
                Err(err) => {
                    warn!(row = row_index, column = %column.key, "cell render failed: {}", err);
                    errors.push(CellError {
                        row_index,
                        column_key: column.key.clone(),
                        message: err.to_string(),
                    });
                    Value::String(ERROR_MARKER.to_string())
                }
            };
            record.insert(column.key.clone(), value);
        }

        Ok(record)
    }
}

fn resolve_source<'r>(
    column: &Column,
    renderers: &'r [Renderer],
    unresolved: &mut Vec<UnresolvedRenderer>,
) -> &'r str {
    let Some(renderer_id) = column.renderer_id.as_deref() else {
        return "";
    };

    match renderers.iter().find(|r| r.id == renderer_id) {
        Some(renderer) if renderer.accepts(column.semantic_type()) => &renderer.format_expression,
        Some(renderer) => {
            unresolved.push(UnresolvedRenderer {
                column_key: column.key.clone(),
                renderer_id: renderer_id.to_string(),
                reason: format!(
                    "renderer '{}' formats {} values but the column is {}",
                    renderer.name,
                    renderer.type_of,
                    column
                        .semantic_type()
                        .map(|t| t.to_string())
                        .unwrap_or_default()
                ),
            });
            ""
        }
        None => {
            unresolved.push(UnresolvedRenderer {
                column_key: column.key.clone(),
                renderer_id: renderer_id.to_string(),
                reason: format!("renderer '{}' does not exist", renderer_id),
            });
            ""
        }
    }
}
