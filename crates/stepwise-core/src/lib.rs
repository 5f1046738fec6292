pub mod backend;
pub mod memory;
pub mod migration;
pub mod migrator;

pub use backend::Backend;
pub use memory::MemoryBackend;
pub use migration::{Migration, MigrationId};
pub use migrator::Migrator;
pub use stepwise_common::{Error, Result};
