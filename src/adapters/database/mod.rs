//! Export record storage
//!
//! [`ExportStore`] is implemented by [`InMemoryExportStore`] for single-process
//! runs and tests, and by
//! [`PostgresExportStore`](crate::adapters::postgresql::PostgresExportStore) for
//! records that must survive the process.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_export_store;
pub use memory::InMemoryExportStore;
pub use traits::ExportStore;
