//! Adapters for external systems
//!
//! - [`spotify`] - Catalog API client
//! - [`database`] - Export record store trait, in-memory backend and factory
//! - [`postgresql`] - PostgreSQL export store

pub mod database;
pub mod postgresql;
pub mod spotify;
