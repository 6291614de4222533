//! `rusqlite`-backed connection and cursor.

use std::collections::BTreeSet;
use std::path::Path;

use oxide_sqllib::{Connection, Cursor, DriverError, Params, Row, SqlValue};
use rusqlite::types::{Value, ValueRef};
use tracing::trace;

/// A SQLite database connection usable by an `oxide-sqllib` library.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the `rusqlite` error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        rusqlite::Connection::open(path).map(Self::from)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns the `rusqlite` error if the database cannot be opened.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        rusqlite::Connection::open_in_memory().map(Self::from)
    }

    /// Returns the underlying `rusqlite` connection.
    #[must_use]
    pub const fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Consumes the wrapper and returns the `rusqlite` connection.
    #[must_use]
    pub fn into_inner(self) -> rusqlite::Connection {
        self.conn
    }
}

impl From<rusqlite::Connection> for SqliteConnection {
    fn from(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }
}

impl Connection for SqliteConnection {
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>, DriverError> {
        Ok(Box::new(SqliteCursor {
            conn: &self.conn,
            rows: Vec::new(),
        }))
    }
}

/// A cursor that buffers the rows of its last execution.
#[derive(Debug)]
pub struct SqliteCursor<'c> {
    conn: &'c rusqlite::Connection,
    rows: Vec<Row>,
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<(), DriverError> {
        let mut stmt = self.conn.prepare(sql)?;

        let mut bound = BTreeSet::new();
        for (idx, value) in params.positional().iter().enumerate() {
            stmt.raw_bind_parameter(idx + 1, to_rusqlite(value))?;
            bound.insert(idx + 1);
        }
        for (name, value) in params.named() {
            let idx = named_index(&stmt, name)?
                .ok_or_else(|| rusqlite::Error::InvalidParameterName(name.clone()))?;
            stmt.raw_bind_parameter(idx, to_rusqlite(value))?;
            bound.insert(idx);
        }

        // Every placeholder must be bound.
        let expected = stmt.parameter_count();
        if bound.len() != expected {
            return Err(rusqlite::Error::InvalidParameterCount(bound.len(), expected).into());
        }

        let column_count = stmt.column_count();
        let mut rows = Vec::new();
        let mut query_rows = stmt.raw_query();
        while let Some(row) = query_rows.next()? {
            let values = (0..column_count)
                .map(|idx| row.get_ref(idx).map(from_rusqlite))
                .collect::<rusqlite::Result<Row>>()?;
            rows.push(values);
        }

        trace!(rows = rows.len(), "SQLite statement executed");
        self.rows = rows;
        Ok(())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError> {
        Ok(std::mem::take(&mut self.rows))
    }
}

/// Finds the index of a named placeholder, accepting the `:`, `@` and `$`
/// prefixes SQLite understands.
fn named_index(stmt: &rusqlite::Statement<'_>, name: &str) -> rusqlite::Result<Option<usize>> {
    if name.starts_with(|c| matches!(c, ':' | '@' | '$')) {
        return stmt.parameter_index(name);
    }
    for prefix in [':', '@', '$'] {
        if let Some(idx) = stmt.parameter_index(&format!("{prefix}{name}"))? {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

fn to_rusqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Int(n) => Value::Integer(*n),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Blob(b) => Value::Blob(b.clone()),
    }
}

fn from_rusqlite(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Int(n),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(s) => SqlValue::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}
