//! # oxide-sqllib
//!
//! Keeps SQL out of Rust code by loading it from plain-text libraries.
//!
//! A library file is split into named blocks by bracketed headers. Each block
//! becomes an [`Operation`] that executes the block's SQL, verbatim, against
//! the connection attached to its [`Library`].
//!
//! This crate provides:
//! - A line-oriented block parser ([`parser`])
//! - Placeholder convention detection ([`paramstyle`])
//! - Libraries binding every block to a shared, replaceable connection
//!
//! SQL text is never parsed or validated here; errors from the database are
//! returned to the caller as the driver reported them.
//!
//! ## Example
//!
//! ```rust
//! use oxide_sqllib::{params, Library};
//!
//! let lib = Library::from_string(
//!     r"Queries for the greetings table.
//!
//! [all_greetings]
//! select * from greetings
//!
//! [greeting_by_id:id]
//! select * from greetings where id = ?
//! ",
//! );
//!
//! assert!(lib.contains("all_greetings"));
//! let op = lib.operation("greeting_by_id").unwrap();
//! assert_eq!(op.sql(), "select * from greetings where id = ?\n");
//!
//! // Nothing runs until a connection is attached with `lib.connect(...)`.
//! assert!(op.call(&params![1]).is_err());
//! ```
//!
//! ## Logging
//!
//! Binding, invocation and reloads emit [`tracing`] events. Nothing is
//! printed unless the application installs a subscriber.

pub mod connection;
pub mod error;
pub mod library;
pub mod paramstyle;
pub mod parser;
pub mod value;

pub use connection::{Connection, ConnectionSlot, Cursor, DriverError};
pub use error::{LibraryError, Result};
pub use library::{Library, Operation};
pub use paramstyle::{detect as detect_paramstyle, ParamStyle};
pub use parser::{parse, Block, Document};
pub use value::{Params, Row, SqlValue, ToSqlValue};
