use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, params};
use stepwise_common::{Error, Result};
use stepwise_config::SqliteConfig;
use stepwise_core::{Backend, Migration, MigrationId};
use tracing::{debug, info, warn};

/// Migration backend storing the last applied id in a one-row SQLite table.
///
/// Each step runs in its own transaction together with the bookkeeping
/// update. The backend owns a single connection: `before_migration` hands it
/// to the step and `after_migration` takes it back.
pub struct SqliteBackend {
    conn: Option<Connection>,
    table: String,
}

impl SqliteBackend {
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::from_config(&SqliteConfig {
            path: Some(db_path.to_path_buf()),
            ..SqliteConfig::default()
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_config(&SqliteConfig::default())
    }

    pub fn from_config(config: &SqliteConfig) -> Result<Self> {
        validate_table_name(&config.table)?;

        let conn = match &config.path {
            Some(path) => {
                info!("opening migration database at {}", path.display());
                Connection::open(path)
                    .map_err(|e| Error::Database(format!("failed to open database: {e}")))?
            }
            None => Connection::open_in_memory().map_err(|e| {
                Error::Database(format!("failed to open in-memory database: {e}"))
            })?,
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| Error::Database(format!("failed to set busy timeout: {e}")))?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode={}; PRAGMA foreign_keys={};",
            config.journal_mode.as_str(),
            if config.foreign_keys { "ON" } else { "OFF" },
        ))
        .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Some(conn),
            table: config.table.clone(),
        })
    }

    /// Wrap an already configured connection.
    pub fn from_connection(conn: Connection, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            conn: Some(conn),
            table,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The idle connection. Fails while a migration step holds it.
    pub fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::Backend("connection is checked out by a running migration".into()))
    }

    pub fn into_connection(self) -> Option<Connection> {
        self.conn
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    type Context = Connection;

    async fn initialize(&mut self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY,
                last INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            INSERT OR IGNORE INTO {table} (id, last) VALUES (0, 0);",
            table = self.table,
        ))
        .map_err(|e| Error::Database(format!("failed to initialize {}: {e}", self.table)))?;

        debug!(table = %self.table, "bookkeeping table ready");
        Ok(())
    }

    async fn last_applied(&mut self) -> Result<MigrationId> {
        let conn = self.connection()?;
        conn.query_row(
            &format!("SELECT last FROM {} WHERE id = 0", self.table),
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::Database(format!("failed to read last applied migration: {e}")))
    }

    async fn before_migration(&mut self) -> Result<Connection> {
        self.conn
            .take()
            .ok_or_else(|| Error::Backend("connection is already checked out".into()))
    }

    async fn migrate(
        &mut self,
        conn: &mut Connection,
        migration: &Migration<Connection>,
    ) -> Result<()> {
        conn.execute_batch("BEGIN")
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        migration.run(conn).await?;

        conn.execute(
            &format!(
                "UPDATE {} SET last = ?1, updated_at = datetime('now') WHERE id = 0",
                self.table
            ),
            params![migration.id()],
        )
        .map_err(|e| Error::Database(format!("failed to record migration: {e}")))?;

        conn.execute_batch("COMMIT")
            .map_err(|e| Error::Database(format!("failed to commit migration: {e}")))?;
        Ok(())
    }

    async fn cancel(&mut self, conn: &mut Connection) -> Result<()> {
        // SQLite already rolled back on some errors; a second ROLLBACK would fail.
        if conn.is_autocommit() {
            return Ok(());
        }
        warn!("rolling back failed migration");
        conn.execute_batch("ROLLBACK")
            .map_err(|e| Error::Database(format!("failed to roll back migration: {e}")))
    }

    async fn after_migration(&mut self, conn: Connection) -> Result<()> {
        self.conn = Some(conn);
        Ok(())
    }
}

/// Table names are spliced into SQL, so only plain identifiers are allowed.
fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::Config(format!("invalid table name: {table:?}")));
    }
    Ok(())
}
