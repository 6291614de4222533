//! Libraries of named SQL operations.
//!
//! A [`Library`] is built from a parsed [`Document`]: every block becomes an
//! [`Operation`] that runs the block's SQL against the library's connection.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::connection::{Connection, ConnectionSlot};
use crate::error::{LibraryError, Result};
use crate::paramstyle::{self, ParamStyle};
use crate::parser::{self, Block, Document};
use crate::value::{Params, Row};

/// A callable SQL statement bound to a library's connection.
///
/// Cloning an operation is cheap and the clone shares the library's
/// connection. A clone keeps its SQL when the library is reloaded.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    sql: String,
    params: Vec<String>,
    param_style: Option<ParamStyle>,
    connection: ConnectionSlot,
}

impl Operation {
    fn bind(block: &Block, connection: ConnectionSlot) -> Self {
        let sql = block.body();
        let param_style = paramstyle::detect(&sql);
        debug!(
            name = %block.name,
            params = ?block.params,
            style = ?param_style,
            "Binding operation"
        );
        Self {
            name: block.name.clone(),
            sql,
            params: block.params.clone(),
            param_style,
            connection,
        }
    }

    /// Returns the operation name (the block name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the SQL text exactly as it appeared in the source.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameter names declared in the block header.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns whether the block header declared any parameters.
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }

    /// Returns the placeholder convention detected in the SQL, if any.
    #[must_use]
    pub const fn param_style(&self) -> Option<ParamStyle> {
        self.param_style
    }

    /// Executes the operation with bind parameters and returns every row.
    ///
    /// A fresh cursor is opened on the current connection for each call.
    /// Parameters are forwarded as given; their count is not checked
    /// against the declared parameter names.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::NotConnected`] if the library has no
    /// connection, or [`LibraryError::Driver`] with the driver's own error.
    pub fn call(&self, params: &Params) -> Result<Vec<Row>> {
        debug!(
            name = %self.name,
            sql = %self.sql,
            positional = params.positional().len(),
            named = params.named().len(),
            "Running operation"
        );

        let connection = self.connection.get().ok_or(LibraryError::NotConnected)?;
        let mut cursor = connection.cursor()?;
        cursor.execute(&self.sql, params)?;
        let rows = cursor.fetch_all()?;

        debug!(name = %self.name, rows = rows.len(), "Operation finished");
        Ok(rows)
    }

    /// Executes the operation without parameters.
    ///
    /// # Errors
    ///
    /// See [`Operation::call`].
    pub fn run(&self) -> Result<Vec<Row>> {
        self.call(&Params::new())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Where a file-backed library was loaded from.
#[derive(Debug, Clone)]
struct Source {
    path: PathBuf,
    modified: DateTime<Utc>,
}

impl Source {
    fn modified_at(path: &Path) -> Result<DateTime<Utc>> {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|e| LibraryError::io(path, e))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn read(path: &Path) -> Result<(Document, DateTime<Utc>)> {
        // The recorded time must not postdate the contents read.
        let modified = Self::modified_at(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| LibraryError::io(path, e))?;
        Ok((parser::parse(parser::split_lines_inclusive(&text)), modified))
    }
}

/// A named collection of SQL operations sharing one connection.
///
/// # Example
///
/// ```
/// use oxide_sqllib::Library;
///
/// let lib = Library::from_string(
///     "Greeting queries.\n\n[greeting_by_id:id]\nselect * from greetings where id = $1\n",
/// );
/// assert_eq!(lib.description(), "Greeting queries.\n\n\n");
///
/// let op = lib.operation("greeting_by_id").unwrap();
/// assert_eq!(op.params(), ["id"]);
/// assert!(op.run().unwrap_err().is_not_connected());
/// ```
#[derive(Debug)]
pub struct Library {
    description: String,
    operations: BTreeMap<String, Operation>,
    connection: ConnectionSlot,
    source: Option<Source>,
}

impl Library {
    /// Creates a library from an already parsed document.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let mut library = Self {
            description: String::new(),
            operations: BTreeMap::new(),
            connection: ConnectionSlot::new(),
            source: None,
        };
        library.load(document);
        library
    }

    /// Creates a library from document lines.
    #[must_use]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(parser::parse(lines))
    }

    /// Creates a library from document text.
    ///
    /// Every line is re-terminated with `\n` before parsing.
    #[must_use]
    pub fn from_string(text: &str) -> Self {
        Self::from_lines(parser::split_lines(text))
    }

    /// Creates a library from a file, remembering its path and modification
    /// time so it can be reloaded.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (document, modified) = Source::read(path)?;
        let mut library = Self::new(document);
        library.source = Some(Source {
            path: path.to_path_buf(),
            modified,
        });
        Ok(library)
    }

    /// Replaces the description and every operation with those of `document`.
    fn load(&mut self, document: Document) {
        self.description = document.preface;
        self.operations = document
            .blocks
            .values()
            .map(|block| {
                (
                    block.name.clone(),
                    Operation::bind(block, self.connection.clone()),
                )
            })
            .collect();
    }

    /// Attaches a database connection, replacing any previous one.
    ///
    /// All operations of this library see the new connection immediately.
    pub fn connect(&self, connection: impl Connection + 'static) {
        self.connection.set(Box::new(connection));
    }

    /// Detaches and returns the current connection.
    pub fn disconnect(&self) -> Option<Box<dyn Connection>> {
        self.connection.take()
    }

    /// Returns whether a connection is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_set()
    }

    /// Re-reads the source file and rebuilds every operation.
    ///
    /// Operations missing from the new contents are dropped. The connection
    /// is kept. Does nothing for libraries not created with
    /// [`Library::from_path`].
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be read. The library
    /// is left unchanged in that case.
    pub fn reload(&mut self) -> Result<()> {
        let Some(source) = &self.source else {
            return Ok(());
        };
        let (document, modified) = Source::read(&source.path)?;
        info!(
            path = %source.path.display(),
            blocks = document.blocks.len(),
            "Reloading library"
        );
        self.load(document);
        if let Some(source) = &mut self.source {
            source.modified = modified;
        }
        Ok(())
    }

    /// Returns whether the source file changed since it was last read.
    ///
    /// Always `false` for libraries without a source file.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file's metadata cannot be read.
    pub fn is_stale(&self) -> Result<bool> {
        match &self.source {
            Some(source) => Ok(Source::modified_at(&source.path)? != source.modified),
            None => Ok(false),
        }
    }

    /// Reloads only if the source file changed, returning whether it did.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be read.
    pub fn reload_if_modified(&mut self) -> Result<bool> {
        if !self.is_stale()? {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    /// Returns the preface text of the document.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the operation with the given name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Returns whether an operation with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Looks up an operation by name and executes it.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownOperation`] if no such operation
    /// exists, otherwise whatever [`Operation::call`] returns.
    pub fn call(&self, name: &str, params: &Params) -> Result<Vec<Row>> {
        self.operation(name)
            .ok_or_else(|| LibraryError::UnknownOperation(name.to_string()))?
            .call(params)
    }

    /// Returns operation names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Returns all operations, sorted by name.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns whether the library has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the source file path for file-backed libraries.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.source.as_ref().map(|s| s.path.as_path())
    }

    /// Returns the source file's modification time when it was last read.
    #[must_use]
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.source.as_ref().map(|s| s.modified)
    }
}

impl FromStr for Library {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_string(s))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::connection::{Cursor, DriverError};
    use crate::value::SqlValue;
    use crate::{named_params, params};

    #[derive(Debug, Default)]
    struct Log {
        cursors: usize,
        executed: Vec<(String, Params)>,
    }

    /// Records what it is asked to run and answers with canned rows.
    struct RecordingConnection {
        log: Rc<RefCell<Log>>,
        rows: Vec<Row>,
    }

    struct RecordingCursor<'a> {
        conn: &'a RecordingConnection,
        executed: bool,
    }

    impl Connection for RecordingConnection {
        fn cursor(&self) -> std::result::Result<Box<dyn Cursor + '_>, DriverError> {
            self.log.borrow_mut().cursors += 1;
            Ok(Box::new(RecordingCursor {
                conn: self,
                executed: false,
            }))
        }
    }

    impl Cursor for RecordingCursor<'_> {
        fn execute(&mut self, sql: &str, params: &Params) -> std::result::Result<(), DriverError> {
            if sql.contains("syntax error") {
                return Err("near \"syntax\": syntax error".into());
            }
            self.conn
                .log
                .borrow_mut()
                .executed
                .push((sql.to_string(), params.clone()));
            self.executed = true;
            Ok(())
        }

        fn fetch_all(&mut self) -> std::result::Result<Vec<Row>, DriverError> {
            if !self.executed {
                return Err("fetch before execute".into());
            }
            Ok(self.conn.rows.clone())
        }
    }

    fn recording(rows: Vec<Row>) -> (RecordingConnection, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (
            RecordingConnection {
                log: Rc::clone(&log),
                rows,
            },
            log,
        )
    }

    const SIMPLE: &str = "\npreface\n\n[sym]\nselect 1\n\n";

    #[test]
    fn test_library_from_string() {
        let lib = Library::from_string(SIMPLE);
        assert_eq!(lib.description(), "\n\npreface\n\n\n");
        assert_eq!(lib.len(), 1);

        let sym = lib.operation("sym").unwrap();
        assert_eq!(sym.name(), "sym");
        assert_eq!(sym.sql(), "select 1\n\n");
        assert_eq!(sym.to_string(), "select 1\n\n");
        assert!(!sym.is_parameterized());
        assert_eq!(sym.param_style(), None);
    }

    #[test]
    fn test_from_str_matches_from_string() {
        let lib: Library = SIMPLE.parse().unwrap();
        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["sym"]);
        assert!(lib.path().is_none());
        assert!(lib.modified().is_none());
    }

    #[test]
    fn test_not_connected() {
        let lib = Library::from_string(SIMPLE);
        assert!(!lib.is_connected());
        let err = lib.operation("sym").unwrap().run().unwrap_err();
        assert!(matches!(err, LibraryError::NotConnected));
    }

    #[test]
    fn test_run_without_params() {
        let lib = Library::from_string(SIMPLE);
        let (conn, log) = recording(vec![vec![SqlValue::Int(1)]]);
        lib.connect(conn);

        let rows = lib.operation("sym").unwrap().run().unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Int(1)]]);

        let log = log.borrow();
        assert_eq!(log.executed.len(), 1);
        assert_eq!(log.executed[0].0, "select 1\n\n");
        assert!(log.executed[0].1.is_empty());
    }

    #[test]
    fn test_call_forwards_params() {
        let lib = Library::from_string("[onearg:id]\nselect * from greetings where id = $1\n");
        let (conn, log) = recording(Vec::new());
        lib.connect(conn);

        let op = lib.operation("onearg").unwrap();
        assert_eq!(op.params(), ["id"]);
        assert_eq!(op.param_style(), Some(ParamStyle::Numeric));

        op.call(&params![1]).unwrap();
        op.call(&named_params! { "id" => 2 }).unwrap();

        let log = log.borrow();
        assert_eq!(log.executed[0].1.positional(), &[SqlValue::Int(1)]);
        assert_eq!(log.executed[1].1.named()["id"], SqlValue::Int(2));
    }

    #[test]
    fn test_fresh_cursor_per_call() {
        let lib = Library::from_string(SIMPLE);
        let (conn, log) = recording(Vec::new());
        lib.connect(conn);

        for _ in 0..3 {
            lib.call("sym", &Params::new()).unwrap();
        }
        assert_eq!(log.borrow().cursors, 3);
    }

    #[test]
    fn test_connect_replaces_connection_for_existing_operations() {
        let lib = Library::from_string(SIMPLE);
        let op = lib.operation("sym").unwrap().clone();

        let (first, first_log) = recording(vec![vec![SqlValue::Int(1)]]);
        lib.connect(first);
        assert_eq!(op.run().unwrap(), vec![vec![SqlValue::Int(1)]]);

        let (second, second_log) = recording(vec![vec![SqlValue::Int(2)]]);
        lib.connect(second);
        assert_eq!(op.run().unwrap(), vec![vec![SqlValue::Int(2)]]);

        assert_eq!(first_log.borrow().cursors, 1);
        assert_eq!(second_log.borrow().cursors, 1);
    }

    #[test]
    fn test_disconnect() {
        let lib = Library::from_string(SIMPLE);
        let (conn, _log) = recording(Vec::new());
        lib.connect(conn);
        assert!(lib.disconnect().is_some());
        assert!(lib.call("sym", &Params::new()).unwrap_err().is_not_connected());
    }

    #[test]
    fn test_driver_error_propagates() {
        let lib = Library::from_string("[broken]\nthis is a syntax error\n");
        let (conn, _log) = recording(Vec::new());
        lib.connect(conn);

        let err = lib.call("broken", &Params::new()).unwrap_err();
        assert!(matches!(err, LibraryError::Driver(_)));
        assert_eq!(err.to_string(), "near \"syntax\": syntax error");
    }

    #[test]
    fn test_unknown_operation() {
        let lib = Library::from_string(SIMPLE);
        let err = lib.call("missing", &Params::new()).unwrap_err();
        assert!(matches!(err, LibraryError::UnknownOperation(ref name) if name == "missing"));
    }

    #[test]
    fn test_operations_share_slot() {
        let lib = Library::from_string("[a]\nselect 1\n[b]\nselect 2\n");
        let ops: Vec<_> = lib.operations().collect();
        assert_eq!(ops.len(), 2);
        assert!(ops[0].connection.ptr_eq(&ops[1].connection));
        assert!(ops[0].connection.ptr_eq(&lib.connection));
    }

    #[test]
    fn test_empty_block_name_is_an_operation() {
        let lib = Library::from_lines(["[]", "select 1"]);
        assert!(lib.contains(""));
        assert_eq!(lib.operation("").unwrap().sql(), "select 1");
    }

    #[test]
    fn test_reload_without_source_is_noop() {
        let mut lib = Library::from_string(SIMPLE);
        lib.reload().unwrap();
        assert!(lib.contains("sym"));
        assert!(!lib.is_stale().unwrap());
        assert!(!lib.reload_if_modified().unwrap());
    }

    #[test]
    fn test_source_read_records_mtime_seen_before_reading() {
        use std::fs::{File, FileTimes};
        use std::time::{Duration, SystemTime};

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("queries.sql");
        std::fs::write(&path, "[one]\nselect 1\n").unwrap();
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_times(FileTimes::new().set_modified(at))
            .unwrap();

        let (document, modified) = Source::read(&path).unwrap();
        assert_eq!(modified, DateTime::<Utc>::from(at));
        assert!(document.blocks.contains_key("one"));

        std::fs::write(&path, "[two]\nselect 2\n").unwrap();
        assert_ne!(Source::modified_at(&path).unwrap(), modified);
    }

    #[test]
    fn test_empty_library() {
        let lib = Library::from_string("just some notes\n");
        assert!(lib.is_empty());
        assert_eq!(lib.description(), "just some notes\n");
    }
}
