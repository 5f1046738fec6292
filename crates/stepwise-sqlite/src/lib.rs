pub mod backend;
pub mod migrations;

pub use backend::SqliteBackend;
pub use migrations::SqlMigration;
pub use rusqlite;
