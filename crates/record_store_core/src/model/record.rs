//! Record domain model.
//!
//! # Responsibility
//! - Define the single persisted entity: a store-assigned id and an
//!   optional name.
//! - Expose explicit accessors; `id` is read-only to callers.
//!
//! # Invariants
//! - `id` is `None` while transient and `Some` once persisted.
//! - Once assigned, `id` never changes for the lifetime of the value.
//! - Store-assigned ids are strictly positive.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate identifier assigned by the backing store on insert.
pub type RecordId = i64;

/// Lifecycle state derived from identity presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Constructed in memory, never written to a store.
    Transient,
    /// Written at least once; carries a store-assigned id.
    Persisted,
}

/// Validation failures for record invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    NonPositiveId(RecordId),
    /// An id arrived from outside the store, e.g. in deserialized input.
    CallerAssignedId(RecordId),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "record id must be positive, got {id}"),
            Self::CallerAssignedId(id) => write!(
                f,
                "record id {id} was supplied by the caller; ids are assigned by the store"
            ),
        }
    }
}

impl Error for RecordValidationError {}

/// One row of persisted data.
///
/// Deserialized input always yields a transient record; a present `id` is
/// rejected. Fields are private so that identity can only be assigned by the
/// repository layer. `name` is freely mutable through [`Record::set_name`],
/// but changes stay in memory until written back through a repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct Record {
    id: Option<RecordId>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct RecordWire {
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<RecordWire> for Record {
    type Error = RecordValidationError;

    fn try_from(value: RecordWire) -> Result<Self, Self::Error> {
        match value.id {
            Some(id) => Err(RecordValidationError::CallerAssignedId(id)),
            None => Ok(Self {
                id: None,
                name: value.name,
            }),
        }
    }
}

impl Record {
    /// Creates a transient record with no name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transient record with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    /// Rebuilds a persisted record from stored column values.
    ///
    /// Only repository implementations call this; it validates the id.
    pub(crate) fn from_stored(
        id: RecordId,
        name: Option<String>,
    ) -> Result<Self, RecordValidationError> {
        let record = Self { id: Some(id), name };
        record.validate()?;
        Ok(record)
    }

    /// Returns the store-assigned id, or `None` before first persistence.
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns the current name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Replaces the in-memory name. Has no durable effect on its own.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Returns `Persisted` once a store has assigned an id.
    pub fn state(&self) -> RecordState {
        match self.id {
            Some(_) => RecordState::Persisted,
            None => RecordState::Transient,
        }
    }

    /// Shorthand for `state() == RecordState::Persisted`.
    pub fn is_persisted(&self) -> bool {
        self.state() == RecordState::Persisted
    }

    /// Checks record invariants.
    ///
    /// # Errors
    /// - `NonPositiveId` when an id is present but `<= 0`.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        match self.id {
            Some(id) if id <= 0 => Err(RecordValidationError::NonPositiveId(id)),
            _ => Ok(()),
        }
    }

    /// Transitions `Transient -> Persisted`.
    ///
    /// Callers must have checked that the record is still transient.
    pub(crate) fn assign_id(&mut self, id: RecordId) {
        debug_assert!(self.id.is_none(), "record id is assigned exactly once");
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, RecordState, RecordValidationError};

    #[test]
    fn assign_id_moves_record_to_persisted() {
        let mut record = Record::with_name("alpha");
        assert_eq!(record.state(), RecordState::Transient);

        record.assign_id(7);
        assert_eq!(record.state(), RecordState::Persisted);
        assert_eq!(record.id(), Some(7));
        assert_eq!(record.name(), Some("alpha"));
    }

    #[test]
    fn from_stored_rejects_non_positive_id() {
        let err = Record::from_stored(0, None).unwrap_err();
        assert_eq!(err, RecordValidationError::NonPositiveId(0));
    }
}
