//! Explicit table definitions for persisted entities.
//!
//! # Responsibility
//! - Describe each table's columns, SQL types and nullability as data.
//! - Check that an open connection exposes the declared shape.
//!
//! # Invariants
//! - `RECORDS_TABLE` must stay in sync with the migration that creates it.

use rusqlite::Connection;

/// SQLite storage class for a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
        }
    }
}

/// One declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: ColumnType,
    pub nullable: bool,
    /// Primary key whose value is generated by the store on insert.
    pub generated_key: bool,
}

/// One declared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

/// Storage shape of [`crate::model::record::Record`].
pub const RECORDS_TABLE: TableSpec = TableSpec {
    name: "records",
    columns: &[
        ColumnSpec {
            name: "id",
            sql_type: ColumnType::Integer,
            nullable: false,
            generated_key: true,
        },
        ColumnSpec {
            name: "name",
            sql_type: ColumnType::Text,
            nullable: true,
            generated_key: false,
        },
    ],
};

/// Mismatch between a declared table and the live database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMismatch {
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl TableSpec {
    /// Returns the declared column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.name)
    }

    /// Checks that the table and every declared column exist.
    ///
    /// Returns `Ok(None)` when the shape matches.
    pub fn find_mismatch(&self, conn: &Connection) -> rusqlite::Result<Option<SchemaMismatch>> {
        let table_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [self.name],
            |row| row.get(0),
        )?;
        if table_exists == 0 {
            return Ok(Some(SchemaMismatch::MissingTable(self.name)));
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let live_columns = stmt
            .query_map([], |row| row.get::<_, String>("name"))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let missing = self
            .column_names()
            .find(|declared| !live_columns.iter().any(|live| live.as_str() == *declared));

        Ok(missing.map(|column| SchemaMismatch::MissingColumn {
            table: self.name,
            column,
        }))
    }
}
