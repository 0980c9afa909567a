//! Review domain model.
//!
//! # Responsibility
//! - Hold one performance review and enforce its field contracts.
//! - Track whether the review has been assigned a primary key.
//!
//! # Invariants
//! - `year` is within `MIN_YEAR..=MAX_YEAR`.
//! - `summary` is non-empty after trimming; the raw value is kept as given.
//! - `employee_id` resolved through an `EmployeeDirectory` when it was set.
//!   Later removal of that employee is not tracked.
//! - A failed setter leaves the review unchanged.

use crate::model::employee::EmployeeId;
use crate::repo::employee_repo::EmployeeDirectory;
use crate::repo::RepoResult;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key of a row in `reviews`.
pub type ReviewId = i64;

pub const MIN_YEAR: i64 = 2000;
pub const MAX_YEAR: i64 = 2100;

/// Persistence lifecycle of a review.
///
/// Serialized as the nullable `id` column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "Option<ReviewId>")]
pub enum PersistState {
    /// Not yet inserted, or deleted since.
    Transient,
    /// Backed by the `reviews` row with this id.
    Persisted(ReviewId),
}

impl PersistState {
    pub fn id(self) -> Option<ReviewId> {
        match self {
            Self::Transient => None,
            Self::Persisted(id) => Some(id),
        }
    }

    pub fn is_persisted(self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

impl From<PersistState> for Option<ReviewId> {
    fn from(value: PersistState) -> Self {
        value.id()
    }
}

/// Field contract violation raised at assignment time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    YearOutOfRange(i64),
    EmptySummary,
    UnknownEmployee(EmployeeId),
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearOutOfRange(year) => write!(
                f,
                "year must be an integer between {MIN_YEAR} and {MAX_YEAR}, got {year}"
            ),
            Self::EmptySummary => write!(f, "summary must be a non-empty string"),
            Self::UnknownEmployee(id) => {
                write!(f, "employee id {id} does not reference an existing employee")
            }
        }
    }
}

impl Error for ReviewValidationError {}

/// A performance review for one employee and one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    #[serde(rename = "id")]
    state: PersistState,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Creates a transient review after validating every field.
    ///
    /// # Errors
    /// - `RepoError::Validation` for any field contract violation.
    /// - `RepoError::Db` when the directory lookup itself fails.
    pub fn new<D>(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        directory: &D,
    ) -> RepoResult<Self>
    where
        D: EmployeeDirectory + ?Sized,
    {
        Self::with_state(
            PersistState::Transient,
            year,
            summary,
            employee_id,
            directory,
        )
    }

    /// Creates a review that already carries a primary key.
    ///
    /// Used by hydration paths. The review is not registered in any identity
    /// map by this constructor.
    pub fn with_id<D>(
        id: ReviewId,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        directory: &D,
    ) -> RepoResult<Self>
    where
        D: EmployeeDirectory + ?Sized,
    {
        Self::with_state(
            PersistState::Persisted(id),
            year,
            summary,
            employee_id,
            directory,
        )
    }

    fn with_state<D>(
        state: PersistState,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        directory: &D,
    ) -> RepoResult<Self>
    where
        D: EmployeeDirectory + ?Sized,
    {
        let year = checked_year(year)?;
        let summary = checked_summary(summary.into())?;
        ensure_employee_exists(employee_id, directory)?;
        Ok(Self {
            state,
            year,
            summary,
            employee_id,
        })
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.state.id()
    }

    pub fn state(&self) -> PersistState {
        self.state
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    pub fn set_year(&mut self, value: i64) -> Result<(), ReviewValidationError> {
        self.year = checked_year(value)?;
        Ok(())
    }

    pub fn set_summary(&mut self, value: impl Into<String>) -> Result<(), ReviewValidationError> {
        self.summary = checked_summary(value.into())?;
        Ok(())
    }

    /// Reassigns the reviewed employee after checking it exists in `directory`.
    ///
    /// # Side effects
    /// - Performs one read against the directory.
    pub fn set_employee_id<D>(&mut self, value: EmployeeId, directory: &D) -> RepoResult<()>
    where
        D: EmployeeDirectory + ?Sized,
    {
        ensure_employee_exists(value, directory)?;
        self.employee_id = value;
        Ok(())
    }

    pub(crate) fn mark_persisted(&mut self, id: ReviewId) {
        self.state = PersistState::Persisted(id);
    }

    pub(crate) fn mark_transient(&mut self) {
        self.state = PersistState::Transient;
    }

    /// Copies the domain fields of an already validated review, keeping state.
    pub(crate) fn refresh_from(&mut self, fresh: Review) {
        self.year = fresh.year;
        self.summary = fresh.summary;
        self.employee_id = fresh.employee_id;
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self
            .id()
            .map_or_else(|| "None".to_string(), |id| id.to_string());
        write!(
            f,
            "<Review {id}: Year {}, Summary: {}, Employee ID: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

fn checked_year(value: i64) -> Result<i64, ReviewValidationError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&value) {
        Ok(value)
    } else {
        Err(ReviewValidationError::YearOutOfRange(value))
    }
}

fn checked_summary(value: String) -> Result<String, ReviewValidationError> {
    if value.trim().is_empty() {
        return Err(ReviewValidationError::EmptySummary);
    }
    Ok(value)
}

fn ensure_employee_exists<D>(id: EmployeeId, directory: &D) -> RepoResult<()>
where
    D: EmployeeDirectory + ?Sized,
{
    match directory.find_by_id(id)? {
        Some(_) => Ok(()),
        None => Err(ReviewValidationError::UnknownEmployee(id).into()),
    }
}
