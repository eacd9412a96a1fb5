// src/model/query.rs
use serde::{Deserialize, Deserializer, Serialize};

use super::types::{coerce, SemanticType};

/// A named SQL statement plus the configuration of its result columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "sqlQuery")]
    pub sql_text: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// One result column of a query, or a report-local copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub key: String,
    /// Vendor type name reported by the database driver.
    #[serde(default, alias = "type")]
    pub source_type: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub renderer_id: Option<String>,
    /// Part of the query's result projection.
    #[serde(default)]
    pub enabled: bool,
    /// Shown and printed by a report.
    #[serde(default)]
    pub active: bool,
    /// Millimetres or percent, depending on the report's width unit.
    #[serde(default)]
    pub width: f64,
}

/// Column description returned by the SQL execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ResultColumn {
    pub fn new(key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            type_name: type_name.into(),
        }
    }
}

impl Column {
    pub fn new(key: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source_type: source_type.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn rendered_by(mut self, renderer_id: impl Into<String>) -> Self {
        self.renderer_id = Some(renderer_id.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Coerced semantic type of the column, if the vendor type is known.
    pub fn semantic_type(&self) -> Option<SemanticType> {
        coerce(&self.source_type)
    }

    /// Header title: the display name, or the key when no name was given.
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.key
        } else {
            &self.display_name
        }
    }

    /// Visible and printed by a report.
    pub fn is_shown(&self) -> bool {
        self.active && self.enabled
    }
}

impl Query {
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn enabled_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.enabled)
    }

    /// Rebuild the column list from a fresh execution result.
    ///
    /// Columns that still exist keep their configuration; new columns are
    /// added disabled, unnamed and without a renderer. Columns no longer
    /// returned by the query are dropped.
    pub fn refresh_columns(&mut self, result_columns: &[ResultColumn]) {
        let previous = std::mem::take(&mut self.columns);
        self.columns = result_columns
            .iter()
            .map(|rc| {
                previous
                    .iter()
                    .find(|c| c.key == rc.key)
                    .cloned()
                    .unwrap_or_else(|| Column::new(&rc.key, &rc.type_name))
            })
            .collect();
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
