use rusqlite::Connection;
use stepwise_common::Error;
use stepwise_core::{Migration, MigrationId};

/// A migration that is a single batch of SQL.
///
/// Declared as a `const` next to its SQL and converted into a
/// [`Migration`] when handed to the migrator.
#[derive(Debug, Clone, Copy)]
pub struct SqlMigration {
    pub id: MigrationId,
    pub name: &'static str,
    pub sql: &'static str,
}

impl From<SqlMigration> for Migration<Connection> {
    fn from(m: SqlMigration) -> Self {
        let SqlMigration { id, name, sql } = m;
        Migration::new(id, move |conn: &mut Connection| {
            Box::pin(async move {
                conn.execute_batch(sql).map_err(|e| Error::Migration {
                    id,
                    reason: e.to_string(),
                })
            })
        })
        .with_name(name)
    }
}
