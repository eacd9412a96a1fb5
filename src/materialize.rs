//! Report materialization.
//!
//! ```text
//! runner.query(sql) -> RowMapper::map_all -> filter::apply -> layout_columns -> paginate
//!        async                    synchronous over the fetched rows
//! ```
//!
//! The catalog is read once per run. Executing the SQL is the only
//! suspension point; mapping, filtering and pagination run to completion on
//! the fetched rows.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::filter;
use crate::layout::validate_widths;
use crate::model::{Query, Record, Renderer, Report, ResultColumn};
use crate::paginate::{layout_columns, paginate, RowHeightMeasurer};
use crate::print::PrintJob;
use crate::render::{
    CellError, RenderEngine, RenderError, RenderLimits, RowMapper, UnresolvedRenderer,
};
use crate::runner::{QueryResult, QueryRunner, RunnerError};
use crate::store::Catalog;
use crate::validation::{validate_report_content, ValidationErrors};

/// Errors that abort a materialization.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("invalid report: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("query execution failed: {0}")]
    Runner(#[from] RunnerError),

    #[error("renderer engine failed: {0}")]
    Render(#[from] RenderError),
}

pub type MaterializeResult<T> = Result<T, MaterializeError>;

/// The filtered, display-ready records of one report run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Materialized {
    pub report_id: String,
    /// Columns as returned by the database.
    pub columns: Vec<ResultColumn>,
    /// Mapped records that passed the filters, in source order.
    pub records: Vec<Record>,
    #[serde(skip)]
    pub raw_records: Vec<Record>,
    pub cell_errors: Vec<CellError>,
    pub unresolved: Vec<UnresolvedRenderer>,
}

impl Materialized {
    pub fn raw_count(&self) -> usize {
        self.raw_records.len()
    }

    /// Lay the records out on sheets for printing.
    ///
    /// Fails when the report's column widths do not fill the printable
    /// width.
    pub fn print_job<M: RowHeightMeasurer>(
        &self,
        report: &Report,
        measurer: &M,
    ) -> MaterializeResult<PrintJob> {
        if let Err(mismatch) = validate_widths(report) {
            let mut errors = ValidationErrors::new();
            errors.field("paperSize", mismatch.to_string());
            return Err(errors.into());
        }

        let geometry = report.geometry();
        let columns = layout_columns(
            &report.columns,
            report.width_unit,
            geometry.content().width_mm,
        );
        let sheets = paginate(&self.records, &columns, &geometry, measurer);

        Ok(PrintJob {
            title: report.name.clone(),
            geometry,
            columns,
            sheets,
            records: self.records.clone(),
        })
    }
}

/// Run a report's query and produce its filtered, rendered records.
pub async fn materialize<R: QueryRunner + ?Sized>(
    report: &Report,
    catalog: &Catalog,
    runner: &R,
    limits: RenderLimits,
) -> MaterializeResult<Materialized> {
    validate_report_content(report, &catalog.queries)?;
    let query = catalog.query(&report.query_id).ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        errors.field("queryId", format!("Query '{}' does not exist", report.query_id));
        MaterializeError::Invalid(errors)
    })?;

    let result = runner.query(&query.sql_text).await?;
    debug!(
        report = %report.name,
        rows = result.record_set.len(),
        "fetched report rows"
    );

    let engine = RenderEngine::with_limits(limits)?;
    let materialized = map_and_filter(report, query, &catalog.renderers, &engine, result)?;

    info!(
        report = %report.name,
        fetched = materialized.raw_count(),
        kept = materialized.records.len(),
        failed_cells = materialized.cell_errors.len(),
        "materialized report"
    );
    Ok(materialized)
}

/// Map and filter an already fetched result.
///
/// Rows are mapped through the query's columns; the report's filters are
/// then applied to the mapped records.
pub fn map_and_filter(
    report: &Report,
    query: &Query,
    renderers: &[Renderer],
    engine: &RenderEngine,
    result: QueryResult,
) -> MaterializeResult<Materialized> {
    let mapper = RowMapper::new(engine, &query.columns, renderers)
        .with_context(render_context(report, query));
    let mapped = mapper.map_all(&result.record_set)?;
    let records = filter::apply(&report.column_filters, mapped.records);

    Ok(Materialized {
        report_id: report.id.clone(),
        columns: result.columns,
        records,
        raw_records: result.record_set,
        cell_errors: mapped.errors,
        unresolved: mapper.unresolved().to_vec(),
    })
}

/// The `ctx` table handed to renderers.
fn render_context(report: &Report, query: &Query) -> Record {
    let mut context = Record::new();
    context.insert("reportId".to_string(), Value::from(report.id.as_str()));
    context.insert("reportName".to_string(), Value::from(report.name.as_str()));
    context.insert("queryId".to_string(), Value::from(query.id.as_str()));
    context.insert("queryName".to_string(), Value::from(query.name.as_str()));
    context
}

/// Execute a query and rebuild its column list from the result.
///
/// Existing columns keep their settings; new ones arrive disabled.
pub async fn refresh_query<R: QueryRunner + ?Sized>(
    query: &mut Query,
    runner: &R,
) -> MaterializeResult<QueryResult> {
    let result = runner.query(&query.sql_text).await?;
    query.refresh_columns(&result.columns);
    debug!(
        query = %query.name,
        columns = query.columns.len(),
        "refreshed query columns"
    );
    Ok(result)
}
