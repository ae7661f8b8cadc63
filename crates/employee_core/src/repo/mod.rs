//! Repository layer for employee records.
//!
//! # Responsibility
//! - Define the data access contract used by service and console code.
//! - Isolate SQLite query details from orchestration.
//!
//! # Invariants
//! - Repository writes enforce `validate()` before persistence.
//! - Backend failures carry the operation name that produced them.

pub mod employee_repo;
