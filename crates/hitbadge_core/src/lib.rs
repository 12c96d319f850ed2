//! Core counter storage for the hit-counter badge service.
//! This crate owns every invariant of the persisted counts.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use model::counter::{
    is_valid_identifier, CounterKey, KeyPart, KeyValidationError, RepoCount, UserRepoCount,
    IDENTIFIER_PATTERN,
};
pub use repo::counter_repo::{CounterRepository, SqliteCounterRepository, StoreError, StoreResult};
pub use service::stats_service::{group_by_user, StatsDocument, StatsService, UserStats};
pub use store::{CounterStore, DEFAULT_POOL_SIZE};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
