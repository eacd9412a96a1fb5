use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};
use tracing::debug;

use super::{QueryResult, QueryRunner, RunnerError, RunnerResult};
use crate::config::ConnectionConfig;
use crate::model::{Record, ResultColumn};

/// Type name reported for expression columns without a declared type.
const UNDECLARED_TYPE: &str = "Variant";

/// Runs queries on a SQLite database from the blocking thread pool.
#[derive(Clone)]
pub struct SqliteRunner {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRunner {
    pub fn open(config: &ConnectionConfig) -> RunnerResult<Self> {
        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> RunnerResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run statements that return no rows, such as schema setup.
    pub fn execute_batch(&self, sql: &str) -> RunnerResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RunnerError::Task("connection lock poisoned".to_string()))?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl QueryRunner for SqliteRunner {
    async fn query(&self, sql: &str) -> RunnerResult<QueryResult> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| RunnerError::Task("connection lock poisoned".to_string()))?;
            run(&conn, &sql)
        })
        .await
        .map_err(|e| RunnerError::Task(e.to_string()))?
    }
}

fn run(conn: &Connection, sql: &str) -> RunnerResult<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<ResultColumn> = stmt
        .columns()
        .iter()
        .map(|c| ResultColumn::new(c.name(), c.decl_type().unwrap_or(UNDECLARED_TYPE)))
        .collect();

    let mut rows = stmt.query([])?;
    let mut record_set = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            record.insert(column.key.clone(), to_json(row.get_ref(idx)?));
        }
        record_set.push(record);
    }

    debug!(
        columns = columns.len(),
        rows = record_set.len(),
        "query executed"
    );
    Ok(QueryResult {
        columns,
        record_set,
    })
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}
