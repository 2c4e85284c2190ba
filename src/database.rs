//! Database handle: the SQLite file a turn runs against.
//!
//! A handle is only a validated path. Connections are opened by the
//! operation that needs one and dropped before that operation returns.

use crate::query::AccessMode;
use crate::types::{AskError, Result};
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::{Path, PathBuf};

/// Path to an SQLite database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHandle {
    path: PathBuf,
}

impl DatabaseHandle {
    /// Wrap a path without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Wrap a path and check that it points at an existing file.
    ///
    /// `~` is expanded. The file is not created if missing.
    ///
    /// # Errors
    ///
    /// Returns `AskError::SchemaIntrospection` if the path is not a file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref().to_string_lossy();
        let handle = Self::new(shellexpand::tilde(&raw).to_string());
        handle.validate()?;
        Ok(handle)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the handle still points at a regular file.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(AskError::SchemaIntrospection(format!(
                "database file not found: {}",
                self.path.display()
            )))
        }
    }

    /// Open a fresh connection.
    ///
    /// Never creates the file: `ReadWrite` opens an existing database for
    /// writing, `ReadOnly` refuses any write at the SQLite level.
    pub fn connect(&self, mode: AccessMode) -> rusqlite::Result<Connection> {
        let access = match mode {
            AccessMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            AccessMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        };
        let flags = access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags)
    }
}

impl fmt::Display for DatabaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
