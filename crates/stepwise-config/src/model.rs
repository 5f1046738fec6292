use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root of a stepwise config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepwiseConfig {
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

/// Settings for the SQLite backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file. `None` opens a private in-memory database.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Bookkeeping table holding the last applied migration id.
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default)]
    pub journal_mode: JournalMode,

    #[serde(default = "default_true")]
    pub foreign_keys: bool,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            table: default_table(),
            journal_mode: JournalMode::default(),
            foreign_keys: default_true(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

fn default_table() -> String {
    "migrations".to_string()
}

fn default_true() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}
