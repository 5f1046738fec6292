use async_trait::async_trait;
use stepwise_common::Result;

use crate::migration::{Migration, MigrationId};

/// Storage-specific behavior plugged into a [`Migrator`](crate::Migrator).
///
/// The migrator calls the hooks in a fixed order:
///
/// 1. [`initialize`](Backend::initialize) once per `apply`
/// 2. [`last_applied`](Backend::last_applied) once per `apply`
/// 3. for every pending migration, in ascending id order:
///    [`before_migration`](Backend::before_migration), then
///    [`migrate`](Backend::migrate), then [`cancel`](Backend::cancel) if
///    `migrate` failed, then [`after_migration`](Backend::after_migration)
///
/// No two hooks are ever in flight at the same time.
#[async_trait]
pub trait Backend: Send {
    /// Per-step execution context, e.g. a connection with an open transaction.
    /// Produced by `before_migration` and consumed by `after_migration`.
    type Context: Send;

    /// Provision bookkeeping storage. Must be idempotent: it runs on every
    /// `apply` and must not reset an existing last-applied id.
    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Id of the last durably applied migration, or `0` if none.
    async fn last_applied(&mut self) -> Result<MigrationId>;

    /// Acquire the context for one migration step.
    async fn before_migration(&mut self) -> Result<Self::Context>;

    /// Run `migration` and record its id as last applied, as one unit of work.
    async fn migrate(
        &mut self,
        context: &mut Self::Context,
        migration: &Migration<Self::Context>,
    ) -> Result<()>;

    /// Discard the partial effects of a failed `migrate`.
    async fn cancel(&mut self, _context: &mut Self::Context) -> Result<()> {
        Ok(())
    }

    /// Release the step context. Runs whether or not `migrate` succeeded.
    async fn after_migration(&mut self, _context: Self::Context) -> Result<()> {
        Ok(())
    }
}
