//! Review persistence session.
//!
//! # Responsibility
//! - Provide create-once/update/delete over the `reviews` table.
//! - Hydrate rows into the session identity map so repeated lookups of one
//!   row yield the same `ReviewRef`.
//! - Own `reviews` table setup and teardown.
//!
//! # Invariants
//! - A review persisted or hydrated by this store is registered in its
//!   identity map under its id until deleted through this store.
//! - Writes run in their own transaction and are committed before returning.
//! - Read paths reject NULL or out-of-domain persisted values instead of
//!   masking them.

use crate::model::employee::EmployeeId;
use crate::model::review::{PersistState, Review, ReviewId};
use crate::repo::employee_repo::EmployeeDirectory;
use crate::repo::identity_map::{IdentityMap, ReviewRef};
use crate::repo::{RepoError, RepoResult};
use log::{debug, info, warn};
use rusqlite::types::FromSql;
use rusqlite::{params, Connection, Row};
use std::cell::RefCell;
use std::rc::Rc;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    year INTEGER,
    summary TEXT,
    employee_id INTEGER,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);";

const REVIEW_SELECT_SQL: &str = "SELECT id, year, summary, employee_id FROM reviews";

/// Result of a state-dependent write.
#[must_use = "a skipped write leaves storage untouched"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The statement ran and was committed for this id.
    Applied(ReviewId),
    /// The review was in a state where the write does not apply.
    Skipped(PersistState),
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Raw `reviews` row, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub year: i64,
    pub summary: String,
    pub employee_id: EmployeeId,
}

impl ReviewRow {
    fn from_sql_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: required(row, "id")?,
            year: required(row, "year")?,
            summary: required(row, "summary")?,
            employee_id: required(row, "employee_id")?,
        })
    }
}

/// Session over one connection: identity map plus review persistence.
///
/// Handles returned by this store are only meaningful within it; a second
/// store over the same connection keeps its own identity map.
pub struct ReviewStore<'conn, D: EmployeeDirectory> {
    conn: &'conn Connection,
    directory: D,
    identity: IdentityMap,
}

impl<'conn, D: EmployeeDirectory> ReviewStore<'conn, D> {
    pub fn new(conn: &'conn Connection, directory: D) -> Self {
        Self {
            conn,
            directory,
            identity: IdentityMap::new(),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Returns the live instance for `id` without touching storage.
    pub fn cached(&self, id: ReviewId) -> Option<ReviewRef> {
        self.identity.get(id)
    }

    pub fn identity_map_len(&self) -> usize {
        self.identity.len()
    }

    /// Creates `reviews` if it does not exist yet.
    pub fn create_table(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(CREATE_TABLE_SQL)?;
        tx.commit()?;
        info!("event=table_create module=repo status=ok table=reviews");
        Ok(())
    }

    /// Drops `reviews` if it exists. Live handles keep their state.
    pub fn drop_table(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS reviews;")?;
        tx.commit()?;
        info!("event=table_drop module=repo status=ok table=reviews");
        Ok(())
    }

    /// Builds a validated transient review. Nothing is written.
    pub fn build(
        &self,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewRef> {
        let review = Review::new(year, summary, employee_id, &self.directory)?;
        Ok(Rc::new(RefCell::new(review)))
    }

    /// Builds and saves a review in one step.
    pub fn create(
        &mut self,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewRef> {
        let review = self.build(year, summary, employee_id)?;
        let outcome = self.save(&review)?;
        debug_assert!(outcome.is_applied());
        Ok(review)
    }

    /// Reassigns the reviewed employee using this session's directory.
    pub fn set_employee(&self, review: &ReviewRef, employee_id: EmployeeId) -> RepoResult<()> {
        review
            .borrow_mut()
            .set_employee_id(employee_id, &self.directory)
    }

    /// Inserts a transient review and registers it in the identity map.
    ///
    /// Already persisted reviews are skipped: no insert, id unchanged. If the
    /// backend reuses the id of a row removed behind this session's back, the
    /// instance cached under that id is reset to transient, so only one live
    /// instance claims the row.
    ///
    /// # Errors
    /// - `RepoError::Borrowed` when `review` or the instance it displaces is
    ///   borrowed by the caller. The insert is rolled back in that case.
    pub fn save(&mut self, review: &ReviewRef) -> RepoResult<WriteOutcome> {
        let current = review.borrow();
        if let PersistState::Persisted(_) = current.state() {
            return Ok(WriteOutcome::Skipped(current.state()));
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
            params![current.year(), current.summary(), current.employee_id()],
        )?;
        let id = tx.last_insert_rowid();
        drop(current);

        let displaced = self
            .identity
            .get(id)
            .filter(|cached| !Rc::ptr_eq(cached, review));
        let mut target = review
            .try_borrow_mut()
            .map_err(|_| RepoError::Borrowed(id))?;
        let stale = match &displaced {
            Some(cached) => Some(
                cached
                    .try_borrow_mut()
                    .map_err(|_| RepoError::Borrowed(id))?,
            ),
            None => None,
        };
        tx.commit()?;

        target.mark_persisted(id);
        if let Some(mut stale) = stale {
            stale.mark_transient();
            warn!("event=review_save module=repo status=displaced_stale review_id={id}");
        }
        drop(target);

        self.identity.insert(id, Rc::clone(review));
        info!("event=review_save module=repo status=ok review_id={id}");
        Ok(WriteOutcome::Applied(id))
    }

    /// Writes the current field values of a persisted review.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no row carries the review's id.
    pub fn update(&self, review: &ReviewRef) -> RepoResult<WriteOutcome> {
        let current = review.borrow();
        let id = match current.state() {
            PersistState::Transient => return Ok(WriteOutcome::Skipped(PersistState::Transient)),
            PersistState::Persisted(id) => id,
        };

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE reviews SET year = ?1, summary = ?2, employee_id = ?3 WHERE id = ?4;",
            params![current.year(), current.summary(), current.employee_id(), id],
        )?;
        tx.commit()?;

        if changed == 0 {
            warn!("event=review_update module=repo status=not_found review_id={id}");
            return Err(RepoError::NotFound(id));
        }
        info!("event=review_update module=repo status=ok review_id={id}");
        Ok(WriteOutcome::Applied(id))
    }

    /// Deletes a persisted review, evicts it and resets it to transient.
    ///
    /// # Errors
    /// - `RepoError::NotInIdentityMap` when `review` is not the instance this
    ///   session holds for its id.
    /// - `RepoError::Borrowed` when the caller still borrows `review`.
    ///
    /// Storage is not touched when either check fails.
    pub fn delete(&mut self, review: &ReviewRef) -> RepoResult<WriteOutcome> {
        let id = match review.borrow().state() {
            PersistState::Transient => return Ok(WriteOutcome::Skipped(PersistState::Transient)),
            PersistState::Persisted(id) => id,
        };
        if !self.identity.holds(id, review) {
            return Err(RepoError::NotInIdentityMap(id));
        }
        let mut target = review
            .try_borrow_mut()
            .map_err(|_| RepoError::Borrowed(id))?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM reviews WHERE id = ?1;", [id])?;
        tx.commit()?;

        self.identity.remove(id);
        target.mark_transient();
        if changed == 0 {
            warn!("event=review_delete module=repo status=missing_row review_id={id}");
        } else {
            info!("event=review_delete module=repo status=ok review_id={id}");
        }
        Ok(WriteOutcome::Applied(id))
    }

    /// Turns a raw row into the session's live instance for that id.
    ///
    /// A cached instance is refreshed in place only after all row values pass
    /// validation, so a bad row leaves it untouched.
    ///
    /// # Errors
    /// - `RepoError::Borrowed` when the caller still borrows the cached
    ///   instance for this id.
    pub fn hydrate_row(&mut self, row: ReviewRow) -> RepoResult<ReviewRef> {
        let id = row.id;
        let fresh = Review::with_id(id, row.year, row.summary, row.employee_id, &self.directory)?;

        if let Some(cached) = self.identity.get(id) {
            cached
                .try_borrow_mut()
                .map_err(|_| RepoError::Borrowed(id))?
                .refresh_from(fresh);
            debug!("event=review_hydrate module=repo status=ok cache=hit review_id={id}");
            return Ok(cached);
        }

        let review = Rc::new(RefCell::new(fresh));
        self.identity.insert(id, Rc::clone(&review));
        debug!("event=review_hydrate module=repo status=ok cache=miss review_id={id}");
        Ok(review)
    }

    /// Hydrates every row in storage order.
    pub fn get_all(&mut self) -> RepoResult<Vec<ReviewRef>> {
        let rows = self.select_rows(&format!("{REVIEW_SELECT_SQL};"), [])?;
        rows.into_iter().map(|row| self.hydrate_row(row)).collect()
    }

    /// Returns the live instance for `id`, or `None` when no row matches.
    pub fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<ReviewRef>> {
        let mut rows = self.select_rows(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"), [id])?;
        match rows.pop() {
            Some(row) => self.hydrate_row(row).map(Some),
            None => Ok(None),
        }
    }

    fn select_rows<P: rusqlite::Params>(&self, sql: &str, params: P) -> RepoResult<Vec<ReviewRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ReviewRow::from_sql_row(row)?);
        }
        Ok(out)
    }
}

fn required<T: FromSql>(row: &Row<'_>, column: &str) -> RepoResult<T> {
    row.get::<_, Option<T>>(column)?
        .ok_or_else(|| RepoError::InvalidData(format!("NULL value in reviews.{column}")))
}
