use stepwise_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::migration::{Migration, MigrationId};

/// Lowest id a migration may carry.
const MIN_MIGRATION_ID: MigrationId = 1;

/// Applies pending migrations through a [`Backend`], one at a time, in
/// ascending id order.
pub struct Migrator<B: Backend> {
    backend: B,
    migrations: Vec<Migration<B::Context>>,
}

impl<B: Backend> Migrator<B> {
    /// Take ownership of `migrations` and sort them by id.
    ///
    /// Fails if the set is non-empty and its smallest id is below 1. Duplicate
    /// ids and gaps are not checked; equal ids keep their input order.
    pub fn new<I>(backend: B, migrations: I) -> Result<Self>
    where
        I: IntoIterator<Item = Migration<B::Context>>,
    {
        let mut migrations: Vec<_> = migrations.into_iter().collect();
        migrations.sort_by_key(Migration::id);

        if let Some(first) = migrations.first() {
            if first.id() < MIN_MIGRATION_ID {
                return Err(Error::InvalidMigrations(format!(
                    "migration ids must be >= {MIN_MIGRATION_ID}, found {}",
                    first.id()
                )));
            }
        }

        Ok(Self {
            backend,
            migrations,
        })
    }

    /// All migrations, sorted by id.
    pub fn migrations(&self) -> &[Migration<B::Context>] {
        &self.migrations
    }

    /// Migrations that would run if the backend reported `last` as applied.
    pub fn pending(&self, last: MigrationId) -> &[Migration<B::Context>] {
        unapplied(&self.migrations, last)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Apply every migration newer than the backend's last-applied id.
    ///
    /// Stops at the first failing migration and returns its error. Later
    /// migrations are not attempted. Running again after a success is a no-op.
    pub async fn apply(&mut self) -> Result<()> {
        debug!("initializing migration backend");
        self.backend.initialize().await?;

        let last = self.backend.last_applied().await?;
        let pending = unapplied(&self.migrations, last);
        if pending.is_empty() {
            info!(last_applied = last, "no pending migrations");
            return Ok(());
        }

        info!(
            last_applied = last,
            pending = pending.len(),
            "applying migrations"
        );
        for migration in pending {
            run_step(&mut self.backend, migration).await?;
        }

        info!(
            last_applied = pending.last().map(Migration::id).unwrap_or(last),
            "migrations applied"
        );
        Ok(())
    }
}

fn unapplied<C>(migrations: &[Migration<C>], last: MigrationId) -> &[Migration<C>] {
    let start = migrations.partition_point(|m| m.id() <= last);
    &migrations[start..]
}

/// One migration: acquire, migrate, cancel on failure, always release.
///
/// A step error stays the returned error. Failures from `cancel` or
/// `after_migration` that follow it are attached with [`Error::suppress`].
async fn run_step<B: Backend>(backend: &mut B, migration: &Migration<B::Context>) -> Result<()> {
    let label = migration.label();
    let mut context = backend.before_migration().await?;

    info!(migration = %label, "running migration");
    let outcome = match backend.migrate(&mut context, migration).await {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(migration = %label, error = %err, "migration failed, cancelling");
            match backend.cancel(&mut context).await {
                Ok(()) => Err(err),
                Err(cancel_err) => {
                    warn!(migration = %label, error = %cancel_err, "cancel failed");
                    Err(err.suppress(cancel_err))
                }
            }
        }
    };

    let released = backend.after_migration(context).await;
    match (outcome, released) {
        (Ok(()), Ok(())) => {
            debug!(migration = %label, "migration committed");
            Ok(())
        }
        (Ok(()), Err(release_err)) => {
            warn!(
                migration = %label,
                error = %release_err,
                "migration committed but releasing its context failed"
            );
            Err(release_err)
        }
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            warn!(migration = %label, error = %release_err, "releasing context failed");
            Err(err.suppress(release_err))
        }
    }
}
