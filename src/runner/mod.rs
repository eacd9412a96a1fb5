//! SQL execution.
//!
//! A [`QueryRunner`] executes a query's SQL text and returns the column
//! descriptions plus the raw records. Column types are vendor type names;
//! they are only interpreted through the coercion table.

mod sqlite;

pub use sqlite::SqliteRunner;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{DatabaseSettings, Driver, SettingsError};
use crate::model::{Record, ResultColumn};

/// Errors raised while executing SQL.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    #[error("Query task failed: {0}")]
    Task(String),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Columns and raw records of one execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<ResultColumn>,
    pub record_set: Vec<Record>,
}

/// Executes SQL text against a database.
///
/// Failures are reported once and never retried.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn query(&self, sql: &str) -> RunnerResult<QueryResult>;
}

/// Build the runner selected by the database settings.
pub fn from_settings(settings: &DatabaseSettings) -> RunnerResult<Box<dyn QueryRunner>> {
    let connection = settings.connection()?;
    match connection.driver {
        Driver::Sqlite => Ok(Box::new(SqliteRunner::open(&connection)?)),
    }
}
