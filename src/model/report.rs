// src/model/report.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use super::paper::{PaperSize, SheetGeometry};
use super::query::{Column, Query};

/// A presentation over one query's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub query_id: String,
    /// Recorded for the host application; not enforced here.
    #[serde(default)]
    pub security_code: Vec<String>,
    /// Report-local copy of the query columns, in display order.
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub column_filters: Vec<ColumnFilter>,
    #[serde(default)]
    pub paper_size: PaperSize,
    #[serde(default)]
    pub is_landscape: bool,
    /// Page padding in millimetres.
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default)]
    pub width_unit: WidthUnit,
}

fn default_padding() -> f64 {
    5.0
}

impl Default for Report {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            query_id: String::new(),
            security_code: Vec::new(),
            columns: Vec::new(),
            column_filters: Vec::new(),
            paper_size: PaperSize::default(),
            is_landscape: false,
            padding: default_padding(),
            width_unit: WidthUnit::default(),
        }
    }
}

impl Report {
    /// Start a report over `query`, copying its enabled columns inactive and
    /// without width.
    pub fn from_query(name: impl Into<String>, query: &Query) -> Self {
        Self {
            name: name.into(),
            query_id: query.id.clone(),
            columns: query
                .enabled_columns()
                .map(|c| Column {
                    active: false,
                    width: 0.0,
                    ..c.clone()
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn geometry(&self) -> SheetGeometry {
        SheetGeometry::new(self.paper_size, self.is_landscape, self.padding)
    }

    /// Columns that are visible and printed, in display order.
    pub fn shown_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_shown())
    }
}

/// Unit of `Column::width` within a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidthUnit {
    /// Physical millimetres; widths must fill the printable width.
    #[default]
    #[serde(rename = "mm")]
    Millimeters,
    /// Percent of the printable width; widths must total 100.
    Percent,
}

impl WidthUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            WidthUnit::Millimeters => "mm",
            WidthUnit::Percent => "%",
        }
    }
}

/// Boolean operator joining a filter to the running result.
///
/// Anything other than `and` in a stored document reads as `or`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    And,
    #[serde(other)]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterCondition {
    Contains,
    StartsWith,
    EndsWith,
    Equals,
    GreaterThan,
    LessThan,
}

impl FilterCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCondition::Contains => "contains",
            FilterCondition::StartsWith => "startsWith",
            FilterCondition::EndsWith => "endsWith",
            FilterCondition::Equals => "equals",
            FilterCondition::GreaterThan => "greaterThan",
            FilterCondition::LessThan => "lessThan",
        }
    }
}

/// Comparison operand of a column filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::One(String::new())
    }
}

impl FilterValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::One(s) => s.is_empty(),
            FilterValue::Many(v) => v.is_empty(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::One(s.to_string())
    }
}

impl fmt::Display for FilterValue {
    /// Lists render comma-joined.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::One(s) => f.write_str(s),
            FilterValue::Many(v) => f.write_str(&v.join(",")),
        }
    }
}

/// One term of a report's flat filter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    pub id: String,
    /// Ignored on the first filter of a list.
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub column_key: String,
    #[serde(default)]
    pub filter_condition: Option<FilterCondition>,
    #[serde(default)]
    pub filter_value: FilterValue,
}

impl ColumnFilter {
    pub fn new(
        id: impl Into<String>,
        join_type: JoinType,
        column_key: impl Into<String>,
        condition: FilterCondition,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            id: id.into(),
            join_type,
            column_key: column_key.into(),
            filter_condition: Some(condition),
            filter_value: value.into(),
        }
    }
}
