use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use stepwise_common::Result;

/// Identifier of a migration. Ids order the migrations and must be positive.
pub type MigrationId = i64;

type Step<C> = dyn for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<()>> + Send + Sync;

/// A single forward-only change, run against a backend-supplied context `C`.
///
/// The step is shared behind an `Arc`, so cloning a migration is cheap and the
/// clone runs the same code.
pub struct Migration<C> {
    id: MigrationId,
    name: Option<String>,
    step: Arc<Step<C>>,
}

impl<C> Migration<C> {
    pub fn new<F>(id: MigrationId, step: F) -> Self
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self {
            id,
            name: None,
            step: Arc::new(step),
        }
    }

    /// Attach a human-readable name, used only in log output.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> MigrationId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if one was given, otherwise `#<id>`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("#{} {}", self.id, name),
            None => format!("#{}", self.id),
        }
    }

    /// Run the step against `context`.
    pub fn run<'a>(&self, context: &'a mut C) -> BoxFuture<'a, Result<()>> {
        (self.step)(context)
    }
}

impl<C> Clone for Migration<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            step: Arc::clone(&self.step),
        }
    }
}

impl<C> fmt::Debug for Migration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
