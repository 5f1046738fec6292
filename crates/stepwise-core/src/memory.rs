use std::sync::Arc;

use async_trait::async_trait;
use stepwise_common::Result;
use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::migration::{Migration, MigrationId};

/// Backend that keeps the last-applied id in process memory.
///
/// Clones share the same state, so a second migrator built from a clone sees
/// what the first one applied.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    last: Arc<Mutex<MigrationId>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that reports `last` as already applied.
    pub fn starting_at(last: MigrationId) -> Self {
        Self {
            last: Arc::new(Mutex::new(last)),
        }
    }

    pub async fn last(&self) -> MigrationId {
        *self.last.lock().await
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type Context = ();

    async fn last_applied(&mut self) -> Result<MigrationId> {
        Ok(self.last().await)
    }

    async fn before_migration(&mut self) -> Result<()> {
        Ok(())
    }

    async fn migrate(&mut self, context: &mut (), migration: &Migration<()>) -> Result<()> {
        migration.run(context).await?;
        *self.last.lock().await = migration.id();
        Ok(())
    }
}
