//! Storage behind the ledger.
//!
//! The engine only talks to [`LedgerStore`]; which backend sits behind it is
//! decided once by the process entry point. Every method is a single
//! bounded call that either commits fully or returns an error, and nothing
//! is retried here.

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::schemas::{NewPerson, NewRecord, Person, PersonId, Record, RecordId};

pub mod mongo;
pub mod sqlite;

pub use mongo::MongoStore;
pub use sqlite::SqliteStore;

/// People and records read from the same committed state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub people: Vec<Person>,
    pub records: Vec<Record>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_person(&self, person: NewPerson) -> Result<Person, LedgerError>;

    /// Returns `false` when no person has this id.
    async fn update_person(
        &self,
        id: PersonId,
        name: &str,
        color: &str,
    ) -> Result<bool, LedgerError>;

    async fn person_exists(&self, id: PersonId) -> Result<bool, LedgerError>;

    /// All people, ordered by id.
    async fn list_people(&self) -> Result<Vec<Person>, LedgerError>;

    /// Stores a new unpaid record.
    async fn insert_record(&self, record: NewRecord) -> Result<Record, LedgerError>;

    /// Overwrites everything but the paid flag. Returns `false` when no record has this id.
    async fn update_record(&self, id: RecordId, record: NewRecord) -> Result<bool, LedgerError>;

    /// Returns `false` when no record has this id.
    async fn delete_record(&self, id: RecordId) -> Result<bool, LedgerError>;

    /// Flips the paid flag relative to its stored value and returns the new
    /// value, or `None` when no record has this id.
    async fn toggle_paid(&self, id: RecordId) -> Result<Option<bool>, LedgerError>;

    /// All records, ordered by id.
    async fn list_records(&self) -> Result<Vec<Record>, LedgerError>;

    async fn snapshot(&self) -> Result<Snapshot, LedgerError>;

    /// Releases the underlying handle. Calls made afterwards fail with a storage error.
    async fn close(&self) -> Result<(), LedgerError>;
}
