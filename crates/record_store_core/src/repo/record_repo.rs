//! Record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/find/update/delete over the `records` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `insert` assigns the store-generated id to the caller's record in place.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Record names are never written to logs.

use crate::db::migrations::{current_version, latest_version};
use crate::db::schema::{SchemaMismatch, RECORDS_TABLE};
use crate::db::DbError;
use crate::model::record::{Record, RecordId, RecordValidationError};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT id, name FROM records";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(RecordId),
    AlreadyPersisted(RecordId),
    Transient,
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::AlreadyPersisted(id) => write!(f, "record {id} is already persisted"),
            Self::Transient => write!(f, "record has not been persisted yet"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaMismatch> for RepoError {
    fn from(value: SchemaMismatch) -> Self {
        match value {
            SchemaMismatch::MissingTable(table) => Self::MissingRequiredTable(table),
            SchemaMismatch::MissingColumn { table, column } => {
                Self::MissingRequiredColumn { table, column }
            }
        }
    }
}

/// Pagination options for listing records. Results are ordered by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Storage-agnostic repository interface for records.
pub trait RecordRepository {
    /// Persists a transient record and assigns its id in place.
    fn insert(&self, record: &mut Record) -> RepoResult<RecordId>;
    fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Record>>;
    /// Writes the in-memory name of a persisted record back to the store.
    fn update(&self, record: &Record) -> RepoResult<()>;
    fn delete(&self, id: RecordId) -> RepoResult<()>;
    fn list(&self, query: &RecordListQuery) -> RepoResult<Vec<Record>>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the live
    ///   schema does not expose the declared `records` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        if let Some(mismatch) = RECORDS_TABLE.find_mismatch(conn)? {
            return Err(mismatch.into());
        }

        Ok(Self { conn })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert(&self, record: &mut Record) -> RepoResult<RecordId> {
        if let Some(id) = record.id() {
            return Err(RepoError::AlreadyPersisted(id));
        }

        self.conn
            .execute("INSERT INTO records (name) VALUES (?1);", [record.name()])?;
        let id = self.conn.last_insert_rowid();
        record.assign_id(id);

        debug!("event=record_insert module=repo status=ok backend=sqlite id={id}");
        Ok(id)
    }

    fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE id = ?1;"))?;

        let columns = stmt.query_row([id], read_columns).optional()?;
        columns.map(parse_record_columns).transpose()
    }

    fn update(&self, record: &Record) -> RepoResult<()> {
        let id = record.id().ok_or(RepoError::Transient)?;
        record.validate()?;

        let changed = self.conn.execute(
            "UPDATE records SET name = ?1 WHERE id = ?2;",
            params![record.name(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!("event=record_update module=repo status=ok backend=sqlite id={id}");
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!("event=record_delete module=repo status=ok backend=sqlite id={id}");
        Ok(())
    }

    fn list(&self, query: &RecordListQuery) -> RepoResult<Vec<Record>> {
        let mut sql = format!("{RECORD_SELECT_SQL} ORDER BY id ASC");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_columns(read_columns(row)?)?);
        }

        Ok(records)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn read_columns(row: &Row<'_>) -> rusqlite::Result<(i64, Option<String>)> {
    Ok((row.get("id")?, row.get("name")?))
}

fn parse_record_columns((id, name): (i64, Option<String>)) -> RepoResult<Record> {
    stored_record(id, name)
}

/// Rebuilds a record read from any backend.
///
/// Invalid stored ids surface as `InvalidData` regardless of backend.
pub(crate) fn stored_record(id: RecordId, name: Option<String>) -> RepoResult<Record> {
    Record::from_stored(id, name)
        .map_err(|err| RepoError::InvalidData(format!("{err} in records.id")))
}
