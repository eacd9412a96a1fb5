//! Report catalog data model.
//!
//! Three persisted entity kinds make up the catalog:
//!
//! - [`Renderer`]: a user-authored formatting function for one semantic type
//! - [`Query`]: a SQL statement plus per-column enablement and renderer mapping
//! - [`Report`]: a filtered, ordered, sized presentation over one query
//!
//! Records flowing through the pipeline are JSON objects keyed by column key
//! with insertion order preserved.

pub mod paper;
pub mod query;
pub mod renderer;
pub mod report;
pub mod types;

pub use paper::{PaperDimensions, PaperSize, SheetGeometry};
pub use query::{Column, Query, ResultColumn};
pub use renderer::{candidates, default_renderers, Renderer};
pub use report::{ColumnFilter, FilterCondition, FilterValue, JoinType, Report, WidthUnit};
pub use types::{coerce, SemanticType};

/// A raw or mapped result row.
pub type Record = serde_json::Map<String, serde_json::Value>;
