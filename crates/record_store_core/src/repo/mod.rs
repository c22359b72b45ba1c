//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow data access contract for records.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Only repositories assign record ids.
//! - Repository APIs return semantic errors (`NotFound`, `Transient`,
//!   `AlreadyPersisted`) in addition to DB transport errors.

pub mod memory_repo;
pub mod record_repo;
