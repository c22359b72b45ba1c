//! In-process record repository.
//!
//! # Responsibility
//! - Implement `RecordRepository` without SQLite, for embedding and tests.
//!
//! # Invariants
//! - Ids start at 1, increase strictly and are never reused after delete.
//! - All operations are serialized behind one mutex.

use crate::model::record::{Record, RecordId};
use crate::repo::record_repo::{
    stored_record, RecordListQuery, RecordRepository, RepoError, RepoResult,
};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: RecordId,
    rows: BTreeMap<RecordId, Option<String>>,
}

/// Map-backed repository with store-assigned monotonic ids.
#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRecordRepository {
    /// Creates an empty store whose first assigned id is 1.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Every mutation is a single map operation, so a poisoned guard still
        // holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordRepository for InMemoryRecordRepository {
    fn insert(&self, record: &mut Record) -> RepoResult<RecordId> {
        if let Some(id) = record.id() {
            return Err(RepoError::AlreadyPersisted(id));
        }

        let mut state = self.lock();
        let id = state.last_id.checked_add(1).ok_or_else(|| {
            RepoError::InvalidData("record id sequence exhausted".to_string())
        })?;
        state.last_id = id;
        state.rows.insert(id, record.name().map(str::to_owned));
        drop(state);

        record.assign_id(id);
        debug!("event=record_insert module=repo status=ok backend=memory id={id}");
        Ok(id)
    }

    fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        let state = self.lock();
        state
            .rows
            .get(&id)
            .map(|name| stored_record(id, name.clone()))
            .transpose()
    }

    fn update(&self, record: &Record) -> RepoResult<()> {
        let id = record.id().ok_or(RepoError::Transient)?;
        record.validate()?;

        let mut state = self.lock();
        let slot = state.rows.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        *slot = record.name().map(str::to_owned);
        drop(state);

        debug!("event=record_update module=repo status=ok backend=memory id={id}");
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        if self.lock().rows.remove(&id).is_none() {
            return Err(RepoError::NotFound(id));
        }

        debug!("event=record_delete module=repo status=ok backend=memory id={id}");
        Ok(())
    }

    fn list(&self, query: &RecordListQuery) -> RepoResult<Vec<Record>> {
        let state = self.lock();
        let limit = query.limit.map_or(usize::MAX, |limit| limit as usize);

        state
            .rows
            .iter()
            .skip(query.offset as usize)
            .take(limit)
            .map(|(id, name)| stored_record(*id, name.clone()))
            .collect()
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.lock().rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryRecordRepository;
    use crate::model::record::Record;
    use crate::repo::record_repo::{RecordListQuery, RecordRepository, RepoError};

    #[test]
    fn ids_are_not_reused_after_delete() {
        let repo = InMemoryRecordRepository::new();
        let mut first = Record::new();
        let mut second = Record::new();

        let first_id = repo.insert(&mut first).unwrap();
        repo.delete(first_id).unwrap();
        let second_id = repo.insert(&mut second).unwrap();

        assert!(second_id > first_id);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn list_applies_offset_before_limit() {
        let repo = InMemoryRecordRepository::new();
        for name in ["a", "b", "c", "d"] {
            repo.insert(&mut Record::with_name(name)).unwrap();
        }

        let page = repo
            .list(&RecordListQuery {
                limit: Some(2),
                offset: 1,
            })
            .unwrap();
        let names: Vec<_> = page.iter().map(|record| record.name()).collect();
        assert_eq!(names, vec![Some("b"), Some("c")]);
    }

    #[test]
    fn invalid_stored_id_is_reported_as_invalid_data() {
        let repo = InMemoryRecordRepository::new();
        repo.lock().rows.insert(-5, Some("bad".to_string()));

        let err = repo.find_by_id(-5).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));

        let err = repo.list(&RecordListQuery::default()).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
