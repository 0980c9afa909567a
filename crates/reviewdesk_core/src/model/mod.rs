//! Domain model for performance reviews and the employees they reference.
//!
//! # Invariants
//! - A `Review` never holds an out-of-domain year, a blank summary, or an
//!   employee id that did not resolve at assignment time.
//! - `Employee` is a read model; its persistence lives outside this crate.

pub mod employee;
pub mod review;
