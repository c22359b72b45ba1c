//! Core persistence logic for the record store.
//! This crate owns the record identity contract and its storage backends.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{open_store, ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, RecordId, RecordState, RecordValidationError};
pub use repo::memory_repo::InMemoryRecordRepository;
pub use repo::record_repo::{
    RecordListQuery, RecordRepository, RepoError, RepoResult, SqliteRecordRepository,
};
pub use service::record_service::RecordService;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
