//! Domain model for persisted records.
//!
//! # Responsibility
//! - Define the canonical record shape used by repositories and services.
//!
//! # Invariants
//! - Identity is assigned by the backing store, never by callers.
//! - Deletion is a hard delete; there are no tombstones.

pub mod record;
