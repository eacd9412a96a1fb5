//! Semantic types and the database type coercion table.
//!
//! Database drivers report vendor type names (`NVarChar`, `DateTime2`,
//! `INTEGER`, ...). Renderers declare which *semantic* type they format, so
//! column types are coerced into the small closed set below before a renderer
//! can be matched against them.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Semantic value type used for renderer compatibility matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Boolean,
    Number,
    String,
    Date,
    Buffer,
    Object,
    Null,
    #[default]
    Any,
}

impl SemanticType {
    pub const ALL: [SemanticType; 8] = [
        SemanticType::Boolean,
        SemanticType::Number,
        SemanticType::String,
        SemanticType::Date,
        SemanticType::Buffer,
        SemanticType::Object,
        SemanticType::Null,
        SemanticType::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Boolean => "boolean",
            SemanticType::Number => "number",
            SemanticType::String => "string",
            SemanticType::Date => "date",
            SemanticType::Buffer => "buffer",
            SemanticType::Object => "object",
            SemanticType::Null => "null",
            SemanticType::Any => "any",
        }
    }

    /// Parse a semantic type name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lower)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static COERCION_TABLE: Lazy<HashMap<&'static str, SemanticType>> = Lazy::new(|| {
    use SemanticType::*;

    HashMap::from([
        // SQL Server driver type names
        ("bit", Boolean),
        ("tinyint", Number),
        ("smallint", Number),
        ("int", Number),
        // 64-bit integers lose precision as doubles, keep them textual
        ("bigint", String),
        ("numeric", Number),
        ("decimal", Number),
        ("smallmoney", Number),
        ("money", Number),
        ("float", Number),
        ("real", Number),
        ("smalldatetime", Date),
        ("datetime", Date),
        ("datetime2", Date),
        ("datetimeoffset", Date),
        ("time", Date),
        ("date", Date),
        ("char", String),
        ("varchar", String),
        ("text", String),
        ("nchar", String),
        ("nvarchar", String),
        ("ntext", String),
        ("binary", Buffer),
        ("varbinary", Buffer),
        ("image", Buffer),
        ("null", Null),
        ("tvp", Object),
        ("udt", Buffer),
        ("uniqueidentifier", String),
        ("variant", Any),
        ("xml", String),
        // ANSI / SQLite declared types
        ("integer", Number),
        ("double", Number),
        ("boolean", Boolean),
        ("bool", Boolean),
        ("timestamp", Date),
        ("blob", Buffer),
        ("json", Object),
        ("uuid", String),
    ])
});

/// Coerce a raw database type name into a semantic type.
///
/// Matching is case-insensitive and ignores a trailing parameter list, so
/// `NVarChar`, `nvarchar` and `NVARCHAR(50)` all resolve to `string`.
/// Unknown names return `None`, which callers treat as "no type constraint".
pub fn coerce(raw_type_name: &str) -> Option<SemanticType> {
    let trimmed = raw_type_name.trim();
    let base = match trimmed.find('(') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    COERCION_TABLE
        .get(base.trim().to_ascii_lowercase().as_str())
        .copied()
}
