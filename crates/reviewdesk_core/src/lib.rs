//! Core domain logic for reviewdesk: validated performance reviews persisted
//! to SQLite through an identity-mapped session.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::employee::{Employee, EmployeeId};
pub use model::review::{PersistState, Review, ReviewId, ReviewValidationError, MAX_YEAR, MIN_YEAR};
pub use repo::employee_repo::{EmployeeDirectory, SqliteEmployeeDirectory};
pub use repo::identity_map::{IdentityMap, ReviewRef};
pub use repo::review_repo::{ReviewRow, ReviewStore, WriteOutcome};
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
