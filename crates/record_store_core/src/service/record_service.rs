//! Record use-case service.
//!
//! # Responsibility
//! - Provide create/save/fetch/rename/delete entry points for callers.
//! - Delegate persistence to any `RecordRepository` backend.
//!
//! # Invariants
//! - Service APIs never bypass repository identity rules.
//! - Deleting through the service consumes the in-memory record.

use crate::model::record::{Record, RecordId};
use crate::repo::record_repo::{RecordListQuery, RecordRepository, RepoError, RepoResult};

/// Use-case service wrapper for record persistence.
pub struct RecordService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> RecordService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Inserts a new record and returns it in persisted state.
    pub fn create(&self, name: Option<String>) -> RepoResult<Record> {
        let mut record = Record::new();
        record.set_name(name);
        self.repo.insert(&mut record)?;
        Ok(record)
    }

    /// Persists the record: insert while transient, update once persisted.
    ///
    /// Returns the record id, which is stable across repeated saves.
    pub fn save(&self, record: &mut Record) -> RepoResult<RecordId> {
        match record.id() {
            None => self.repo.insert(record),
            Some(id) => {
                self.repo.update(record)?;
                Ok(id)
            }
        }
    }

    /// Fetches one record by id; `None` when the store does not hold it.
    pub fn get(&self, id: RecordId) -> RepoResult<Option<Record>> {
        self.repo.find_by_id(id)
    }

    /// Returns whether the store currently holds this id.
    pub fn exists(&self, id: RecordId) -> RepoResult<bool> {
        Ok(self.repo.find_by_id(id)?.is_some())
    }

    /// Loads a record, replaces its name and writes it back.
    ///
    /// # Errors
    /// - `NotFound` when no record has this id.
    pub fn rename(&self, id: RecordId, name: Option<String>) -> RepoResult<Record> {
        let mut record = self.repo.find_by_id(id)?.ok_or(RepoError::NotFound(id))?;
        record.set_name(name);
        self.repo.update(&record)?;
        Ok(record)
    }

    /// Deletes a persisted record.
    ///
    /// # Errors
    /// - `Transient` when the record was never persisted.
    /// - `NotFound` when the store no longer holds it.
    pub fn delete(&self, record: Record) -> RepoResult<()> {
        let id = record.id().ok_or(RepoError::Transient)?;
        self.repo.delete(id)
    }

    /// Deletes by id without an in-memory record; `NotFound` when absent.
    pub fn delete_by_id(&self, id: RecordId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    /// Lists records ordered by id using pagination options.
    pub fn list(&self, query: &RecordListQuery) -> RepoResult<Vec<Record>> {
        self.repo.list(query)
    }

    /// Returns the number of stored records.
    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count()
    }
}
