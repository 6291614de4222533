//! Database connection collaborators.
//!
//! The library never talks to a database driver directly. Callers supply a
//! [`Connection`]; each operation call opens a fresh [`Cursor`] on it,
//! executes its SQL and fetches every row.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::value::{Params, Row};

/// Error type produced by connection collaborators.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// A database connection that can hand out cursors.
pub trait Connection {
    /// Opens a new cursor on this connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if no cursor can be opened.
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>, DriverError>;
}

/// A single-use statement cursor.
pub trait Cursor {
    /// Executes `sql` with the given bind parameters.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for invalid SQL, bad bindings or
    /// execution failures.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<(), DriverError>;

    /// Returns every remaining row of the last execution.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if reading rows fails.
    fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError>;
}

/// Shared, reassignable holder for a library's connection.
///
/// Every operation bound by a library holds a clone of the same slot, so
/// replacing the connection is visible to all of them at once. The slot is
/// single-threaded (`!Send`); callers needing concurrent access should give
/// each thread its own library.
#[derive(Clone, Default)]
pub struct ConnectionSlot {
    inner: Rc<RefCell<Option<Box<dyn Connection>>>>,
}

impl ConnectionSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `connection`, dropping whatever was held before.
    pub fn set(&self, connection: Box<dyn Connection>) {
        *self.inner.borrow_mut() = Some(connection);
    }

    /// Removes and returns the held connection.
    pub fn take(&self) -> Option<Box<dyn Connection>> {
        self.inner.borrow_mut().take()
    }

    /// Returns whether a connection is held.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Borrows the current connection, if any.
    pub(crate) fn get(&self) -> Option<Ref<'_, Box<dyn Connection>>> {
        Ref::filter_map(self.inner.borrow(), Option::as_ref).ok()
    }

    /// Returns whether two slots share the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ConnectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSlot")
            .field("connected", &self.is_set())
            .finish()
    }
}
