//! Domain model for employee records.
//!
//! # Responsibility
//! - Define the canonical employee shape used by store, service and console.
//!
//! # Invariants
//! - Every persisted employee is identified by a storage-assigned `EmployeeId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod employee;
