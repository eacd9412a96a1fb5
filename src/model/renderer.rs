// src/model/renderer.rs
use serde::{Deserialize, Serialize};

use super::types::{coerce, SemanticType};

/// A named, user-authored cell formatting function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Renderer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Semantic type of the values this renderer formats.
    #[serde(default)]
    pub type_of: SemanticType,
    /// Lua function expression called with
    /// `(value, row, index, rows, key, name, ctx)`.
    #[serde(default, alias = "rendererFunction")]
    pub format_expression: String,
}

impl Renderer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        type_of: SemanticType,
        format_expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            type_of,
            format_expression: format_expression.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this renderer may format a column with the given semantic type.
    ///
    /// `Any` on either side, or a column of unknown type, is always compatible.
    pub fn accepts(&self, column_type: Option<SemanticType>) -> bool {
        match column_type {
            None | Some(SemanticType::Any) => true,
            Some(t) => self.type_of == SemanticType::Any || self.type_of == t,
        }
    }
}

/// Renderers offered for a column of the given raw database type.
///
/// Only renderers whose `type_of` equals the coerced type qualify; an unknown
/// type name yields no candidates.
pub fn candidates<'a>(source_type: &str, renderers: &'a [Renderer]) -> Vec<&'a Renderer> {
    match coerce(source_type) {
        Some(t) => renderers.iter().filter(|r| r.type_of == t).collect(),
        None => Vec::new(),
    }
}

/// Renderers created on first load when the catalog lacks them.
pub fn default_renderers() -> Vec<Renderer> {
    vec![
        Renderer::new(
            "DefaultBooleanRenderer",
            "Boolean Renderer",
            SemanticType::Boolean,
            "function(value) return fmt.yes_no(value) end",
        )
        .with_description("Default renderer for boolean, returns YES / NO"),
        Renderer::new(
            "DefaultNumberRenderer",
            "Number Renderer",
            SemanticType::Number,
            "function(value) return fmt.thousands(value) end",
        )
        .with_description("Default number renderer, inserts thousands separators"),
        Renderer::new(
            "DefaultStringRenderer",
            "String Renderer",
            SemanticType::String,
            "function(value) return value end",
        )
        .with_description("Default string renderer, returns the value as is"),
        Renderer::new(
            "DefaultDateRenderer",
            "DD-MMM-YYYY Renderer",
            SemanticType::Date,
            "function(value) return fmt.date(value, '%d-%b-%Y', true) end",
        )
        .with_description("Default date renderer"),
        Renderer::new(
            "DefaultDateTimeRenderer",
            "DD-MMM-YYYY HH:MM Renderer",
            SemanticType::Date,
            "function(value) return fmt.date(value, '%d-%b-%Y %H:%M', true) end",
        )
        .with_description("Default date and time renderer"),
    ]
}
