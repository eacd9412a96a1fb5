//! # Folio
//!
//! SQL-backed report materialization and print pagination.
//!
//! ## Architecture
//!
//! Operators define queries, attach a renderer to each result column, and
//! compose reports that filter, order, size and paginate query results:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           Catalog (renderers, queries, reports)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [runner]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Raw records + vendor column type names            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [render::mapper + model::types]
//! ┌─────────────────────────────────────────────────────────┐
//! │       Mapped records (sandboxed Lua renderers)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [filter]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Filtered records                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [layout + paginate]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Sheets sized to the paper geometry             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [print]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Printable HTML                           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod filter;
pub mod layout;
pub mod materialize;
pub mod model;
pub mod paginate;
pub mod print;
pub mod render;
pub mod runner;
pub mod store;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::filter::{apply, build_predicate, distinct_values, evaluate_one};
    pub use crate::layout::{expected_width, validate_widths, ColumnLayout, Direction};
    pub use crate::materialize::{map_and_filter, materialize, refresh_query, Materialized};
    pub use crate::model::{
        coerce, Column, ColumnFilter, FilterCondition, FilterValue, JoinType, PaperSize, Query,
        Record, Renderer, Report, SemanticType, WidthUnit,
    };
    pub use crate::paginate::{paginate, LayoutColumn, RowHeightMeasurer, Sheet, TextMeasurer};
    pub use crate::print::PrintJob;
    pub use crate::render::{RenderEngine, RenderLimits, RowMapper};
    pub use crate::runner::{QueryResult, QueryRunner, SqliteRunner};
    pub use crate::store::{Catalog, JsonFileStore, MemoryStore, Repository, Store};
    pub use crate::validation::ValidationErrors;
}
