//! Persistence layer for reviews.
//!
//! # Responsibility
//! - Map `Review` values to and from the `reviews` table.
//! - Own the per-session identity map that keeps one live instance per row.
//! - Resolve employee references for field validation.
//!
//! # Invariants
//! - Every statement is parameterized; values are never interpolated.
//! - Backend errors are wrapped once and otherwise passed through untouched.

use crate::db::DbError;
use crate::model::review::{ReviewId, ReviewValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod employee_repo;
pub mod identity_map;
pub mod review_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for review persistence, hydration and validation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReviewValidationError),
    Db(DbError),
    /// No `reviews` row matched the id of a persisted review.
    NotFound(ReviewId),
    /// A persisted review was deleted without being the instance the
    /// session's identity map holds for its id.
    NotInIdentityMap(ReviewId),
    /// The live instance for this id is borrowed by the caller and cannot be
    /// written to.
    Borrowed(ReviewId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "review not found: {id}"),
            Self::NotInIdentityMap(id) => {
                write!(f, "review {id} is not registered in this session's identity map")
            }
            Self::Borrowed(id) => write!(f, "review {id} is borrowed and cannot be modified"),
            Self::InvalidData(message) => write!(f, "invalid persisted review data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::NotInIdentityMap(_)
            | Self::Borrowed(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ReviewValidationError> for RepoError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
