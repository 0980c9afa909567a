//! Employee lookups used for referential validation.
//!
//! Employees are written by another part of the system; this module only
//! reads them.

use crate::model::employee::{Employee, EmployeeId};
use crate::repo::RepoResult;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;

/// Resolves employee ids to employees.
pub trait EmployeeDirectory {
    /// Returns `Ok(None)` when no employee has this id.
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
}

impl<T: EmployeeDirectory + ?Sized> EmployeeDirectory for &T {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        (**self).find_by_id(id)
    }
}

/// Fixed in-memory directory, keyed by id.
impl EmployeeDirectory for BTreeMap<EmployeeId, Employee> {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        Ok(self.get(&id).cloned())
    }
}

/// Directory backed by the `employees` table.
pub struct SqliteEmployeeDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeDirectory for SqliteEmployeeDirectory<'_> {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let employee = self
            .conn
            .query_row(
                "SELECT id, name, job_title FROM employees WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Employee {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        job_title: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(employee)
    }
}
