//! Database connection management with WAL mode support
//!
//! Wraps a single SQLite connection behind a mutex, configured for either
//! local (WAL) or cloud-safe (DELETE journal) operation.

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;

use super::functions::register_trigram_functions;
use super::migrations::run_migrations;
use crate::error::Result;
use crate::types::{StorageConfig, StorageMode};

/// Path fragments of folders that sync files to the cloud
const CLOUD_FOLDER_MARKERS: &[&str] = &["dropbox", "onedrive", "icloud", "google drive"];

/// Club platform store over one shared SQLite connection
#[derive(Clone)]
pub struct Storage {
    config: StorageConfig,
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Open or create a database with the given configuration
    pub fn open(config: StorageConfig) -> Result<Self> {
        let conn = Self::create_connection(&config)?;

        run_migrations(&conn)?;

        Ok(Self {
            config,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database with trigram functions (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open(StorageConfig::default())
    }

    /// In-memory database without the SQL trigram functions
    pub fn open_in_memory_without_trigram() -> Result<Self> {
        Self::open(StorageConfig {
            trigram_functions: false,
            ..StorageConfig::default()
        })
    }

    /// Create a new connection with appropriate pragmas
    fn create_connection(config: &StorageConfig) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if config.db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(&config.db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open_with_flags(&config.db_path, flags)?
        };

        Self::configure_pragmas(&conn, config.storage_mode)?;

        if config.trigram_functions {
            register_trigram_functions(&conn)?;
        }

        Ok(conn)
    }

    /// Journal settings per storage mode.
    ///
    /// Local databases use WAL; cloud-synced folders need a single file, so
    /// they fall back to a rollback journal with full syncs.
    fn configure_pragmas(conn: &Connection, mode: StorageMode) -> Result<()> {
        let (journal_mode, synchronous, cache_kib) = match mode {
            StorageMode::Local => ("WAL", "NORMAL", 64_000),
            StorageMode::CloudSafe => ("DELETE", "FULL", 32_000),
        };

        conn.execute_batch(&format!(
            "PRAGMA journal_mode={journal_mode};
             PRAGMA synchronous={synchronous};
             PRAGMA busy_timeout=30000;
             PRAGMA cache_size=-{cache_kib};
             PRAGMA temp_store=MEMORY;
             PRAGMA foreign_keys=ON;"
        ))?;
        Ok(())
    }

    /// Execute a function with the connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a function with a transaction
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Get current storage mode
    pub fn storage_mode(&self) -> StorageMode {
        self.config.storage_mode
    }

    /// Get database path
    pub fn db_path(&self) -> &str {
        &self.config.db_path
    }

    /// Whether the database path looks like a synced cloud folder
    pub fn is_in_cloud_folder(&self) -> bool {
        let path = self.config.db_path.to_lowercase();
        CLOUD_FOLDER_MARKERS
            .iter()
            .any(|marker| path.contains(marker))
    }

    /// Get warning if storage mode doesn't match folder type
    pub fn storage_mode_warning(&self) -> Option<String> {
        if self.is_in_cloud_folder() && self.config.storage_mode == StorageMode::Local {
            Some(format!(
                "WARNING: Database '{}' appears to be in a cloud-synced folder. \
                WAL mode may cause corruption. Consider:\n\
                1. Set CLUBHUB_STORAGE_MODE=cloud-safe\n\
                2. Move database to a local folder with backup sync",
                self.config.db_path
            ))
        } else {
            None
        }
    }

    /// Get configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}
