//! # oxide-sqllib-sqlite
//!
//! SQLite connection for `oxide-sqllib`, built on [`rusqlite`].
//!
//! SQLite accepts every placeholder form a library block is likely to use
//! except the printf-style ones:
//!
//! - `?` and `?NNN` bind positional values in order
//! - `$1`, `:1` bind positional values by order of first appearance
//! - `:name`, `@name`, `$name` bind named values; names may be given with
//!   or without the prefix
//!
//! Every call prepares the statement anew and buffers all rows before
//! returning them.
//!
//! ## Example
//!
//! ```rust
//! use oxide_sqllib::{params, Library, SqlValue};
//! use oxide_sqllib_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_in_memory().unwrap();
//! conn.inner()
//!     .execute_batch(
//!         "create table greetings (id int, text text);
//!          insert into greetings values (1, 'hello');",
//!     )
//!     .unwrap();
//!
//! let lib = Library::from_string("[by_id:id]\nselect text from greetings where id = $1\n");
//! lib.connect(conn);
//!
//! let rows = lib.call("by_id", &params![1]).unwrap();
//! assert_eq!(rows, vec![vec![SqlValue::Text("hello".into())]]);
//! ```

mod connection;

pub use connection::{SqliteConnection, SqliteCursor};
