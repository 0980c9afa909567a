//! Employee read model.

use serde::{Deserialize, Serialize};

/// Primary key of a row in `employees`.
pub type EmployeeId = i64;

/// Employee as resolved through an `EmployeeDirectory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub job_title: String,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>, job_title: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            job_title: job_title.into(),
        }
    }
}
