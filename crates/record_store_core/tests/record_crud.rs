use record_store_core::db::migrations::latest_version;
use record_store_core::db::open_db_in_memory;
use record_store_core::{
    InMemoryRecordRepository, Record, RecordListQuery, RecordRepository, RepoError,
    SqliteRecordRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn unnamed_record_roundtrip(repo: &dyn RecordRepository) {
    let mut record = Record::new();
    let id = repo.insert(&mut record).unwrap();
    assert_eq!(record.id(), Some(id));

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.id(), Some(id));
    assert_eq!(loaded.name(), None);
}

fn rename_keeps_identity(repo: &dyn RecordRepository) {
    let mut record = Record::with_name("alpha");
    let id = repo.insert(&mut record).unwrap();

    record.set_name(Some("beta".to_string()));
    repo.update(&record).unwrap();

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.name(), Some("beta"));
    assert_eq!(loaded.id(), Some(id));
}

fn unsaved_changes_stay_in_memory(repo: &dyn RecordRepository) {
    let mut record = Record::with_name("stored");
    let id = repo.insert(&mut record).unwrap();

    record.set_name(Some("local only".to_string()));
    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.name(), Some("stored"));
}

fn ids_are_unique_and_stable(repo: &dyn RecordRepository) {
    let mut ids = HashSet::new();
    for index in 0..20 {
        let mut record = Record::with_name(format!("record {index}"));
        let id = repo.insert(&mut record).unwrap();
        assert!(id > 0);
        assert!(ids.insert(id), "duplicate id {id}");
    }

    for id in &ids {
        let first = repo.find_by_id(*id).unwrap().unwrap();
        let second = repo.find_by_id(*id).unwrap().unwrap();
        assert_eq!(first.id(), Some(*id));
        assert_eq!(first, second);
    }
}

fn delete_then_find_returns_none(repo: &dyn RecordRepository) {
    let mut record = Record::with_name("short lived");
    let id = repo.insert(&mut record).unwrap();

    repo.delete(id).unwrap();
    assert!(repo.find_by_id(id).unwrap().is_none());

    let err = repo.delete(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));

    let err = repo.update(&record).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

fn deleted_ids_are_not_reused(repo: &dyn RecordRepository) {
    let mut first = Record::new();
    let first_id = repo.insert(&mut first).unwrap();
    repo.delete(first_id).unwrap();

    let mut second = Record::new();
    let second_id = repo.insert(&mut second).unwrap();
    assert!(second_id > first_id);
}

fn identity_misuse_is_rejected(repo: &dyn RecordRepository) {
    let transient = Record::with_name("never saved");
    assert!(matches!(
        repo.update(&transient).unwrap_err(),
        RepoError::Transient
    ));

    let mut record = Record::new();
    let id = repo.insert(&mut record).unwrap();
    let err = repo.insert(&mut record).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyPersisted(existing) if existing == id));
    assert_eq!(repo.count().unwrap(), 1);
}

fn list_is_ordered_and_paginated(repo: &dyn RecordRepository) {
    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let mut record = Record::with_name(name);
        ids.push(repo.insert(&mut record).unwrap());
    }

    let all = repo.list(&RecordListQuery::default()).unwrap();
    let all_ids: Vec<_> = all.iter().filter_map(Record::id).collect();
    assert_eq!(all_ids, ids);

    let page = repo
        .list(&RecordListQuery {
            limit: Some(2),
            offset: 1,
        })
        .unwrap();
    let page_names: Vec<_> = page.iter().map(Record::name).collect();
    assert_eq!(page_names, vec![Some("b"), Some("c")]);

    let tail = repo
        .list(&RecordListQuery {
            limit: None,
            offset: 3,
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].name(), Some("d"));

    assert_eq!(repo.count().unwrap(), 4);
}

macro_rules! backend_tests {
    ($module:ident, $backend:expr, [$($check:ident),* $(,)?]) => {
        mod $module {
            use super::Backend;

            $(
                #[test]
                fn $check() {
                    super::with_repo($backend, super::$check);
                }
            )*
        }
    };
}

#[derive(Debug, Clone, Copy)]
enum Backend {
    Sqlite,
    Memory,
}

fn with_repo(backend: Backend, check: fn(&dyn RecordRepository)) {
    match backend {
        Backend::Sqlite => {
            let conn = open_db_in_memory().unwrap();
            let repo = SqliteRecordRepository::try_new(&conn).unwrap();
            check(&repo);
        }
        Backend::Memory => check(&InMemoryRecordRepository::new()),
    }
}

backend_tests!(
    sqlite,
    Backend::Sqlite,
    [
        unnamed_record_roundtrip,
        rename_keeps_identity,
        unsaved_changes_stay_in_memory,
        ids_are_unique_and_stable,
        delete_then_find_returns_none,
        deleted_ids_are_not_reused,
        identity_misuse_is_rejected,
        list_is_ordered_and_paginated,
    ]
);

backend_tests!(
    memory,
    Backend::Memory,
    [
        unnamed_record_roundtrip,
        rename_keeps_identity,
        unsaved_changes_stay_in_memory,
        ids_are_unique_and_stable,
        delete_then_find_returns_none,
        deleted_ids_are_not_reused,
        identity_misuse_is_rejected,
        list_is_ordered_and_paginated,
    ]
);

#[test]
fn sqlite_ids_survive_reopen_without_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.sqlite3");

    let deleted_id = {
        let conn = record_store_core::db::open_db(&path).unwrap();
        let repo = SqliteRecordRepository::try_new(&conn).unwrap();
        let mut record = Record::with_name("gone");
        let id = repo.insert(&mut record).unwrap();
        repo.delete(id).unwrap();
        id
    };

    let conn = record_store_core::db::open_db(&path).unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();
    let mut record = Record::new();
    assert!(repo.insert(&mut record).unwrap() > deleted_id);
}

#[test]
fn sqlite_rejects_invalid_persisted_id() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO records (id, name) VALUES (-5, 'bad');", [])
        .unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let err = repo.find_by_id(-5).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteRecordRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_records_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRecordRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("records"))
    ));
}

#[test]
fn repository_rejects_connection_missing_name_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE records (id INTEGER PRIMARY KEY AUTOINCREMENT);")
        .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRecordRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "records",
            column: "name"
        })
    ));
}
