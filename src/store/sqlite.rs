use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{LedgerStore, Snapshot};
use crate::error::LedgerError;
use crate::schemas::{NewPerson, NewRecord, Person, PersonId, Record, RecordId};

const SCHEMA: &str = r"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS person (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        color TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS record (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount REAL NOT NULL,
        fromId INTEGER NOT NULL REFERENCES person(id),
        toId INTEGER NOT NULL REFERENCES person(id),
        date TEXT NOT NULL,
        memo TEXT NOT NULL,
        isPaid INTEGER NOT NULL DEFAULT 0
    );
";

/// SQLite-backed store. One connection, shared behind a mutex, so every
/// call is serialized the same way the single-writer model expects.
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sqlite store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Runs `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| LedgerError::Storage("sqlite connection lock poisoned".into()))?;
            let conn = guard
                .as_mut()
                .ok_or_else(|| LedgerError::Storage("sqlite store is closed".into()))?;
            f(conn)
        })
        .await?
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        amount: row.get(1)?,
        from_id: row.get(2)?,
        to_id: row.get(3)?,
        date: row.get(4)?,
        memo: row.get(5)?,
        is_paid: row.get::<_, i64>(6)? != 0,
    })
}

fn read_people(conn: &Connection) -> Result<Vec<Person>, LedgerError> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM person ORDER BY id")?;
    let people = stmt
        .query_map([], person_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(people)
}

fn read_records(conn: &Connection) -> Result<Vec<Record>, LedgerError> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, fromId, toId, date, memo, isPaid FROM record ORDER BY id",
    )?;
    let records = stmt
        .query_map([], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn insert_person(&self, person: NewPerson) -> Result<Person, LedgerError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO person (name, color) VALUES (?1, ?2)",
                params![person.name, person.color],
            )?;
            Ok(Person {
                id: conn.last_insert_rowid(),
                name: person.name,
                color: person.color,
            })
        })
        .await
    }

    async fn update_person(
        &self,
        id: PersonId,
        name: &str,
        color: &str,
    ) -> Result<bool, LedgerError> {
        let (name, color) = (name.to_string(), color.to_string());
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE person SET name = ?1, color = ?2 WHERE id = ?3",
                params![name, color, id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn person_exists(&self, id: PersonId) -> Result<bool, LedgerError> {
        self.with_conn(move |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM person WHERE id = ?1)",
                [id],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(exists != 0)
        })
        .await
    }

    async fn list_people(&self) -> Result<Vec<Person>, LedgerError> {
        self.with_conn(|conn| read_people(conn)).await
    }

    async fn insert_record(&self, record: NewRecord) -> Result<Record, LedgerError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO record (amount, fromId, toId, date, memo) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.amount,
                    record.from_id,
                    record.to_id,
                    record.date,
                    record.memo
                ],
            )?;
            Ok(Record {
                id: conn.last_insert_rowid(),
                amount: record.amount,
                from_id: record.from_id,
                to_id: record.to_id,
                date: record.date,
                memo: record.memo,
                is_paid: false,
            })
        })
        .await
    }

    async fn update_record(&self, id: RecordId, record: NewRecord) -> Result<bool, LedgerError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE record SET amount = ?1, fromId = ?2, toId = ?3, date = ?4, memo = ?5 \
                 WHERE id = ?6",
                params![
                    record.amount,
                    record.from_id,
                    record.to_id,
                    record.date,
                    record.memo,
                    id
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_record(&self, id: RecordId) -> Result<bool, LedgerError> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM record WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn toggle_paid(&self, id: RecordId) -> Result<Option<bool>, LedgerError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let current = tx
                .query_row("SELECT isPaid FROM record WHERE id = ?1", [id], |row| {
                    row.get::<_, i64>(0)
                })
                .optional()?;
            let Some(current) = current else {
                return Ok(None);
            };
            let is_paid = current == 0;
            tx.execute(
                "UPDATE record SET isPaid = ?1 WHERE id = ?2",
                params![i64::from(is_paid), id],
            )?;
            tx.commit()?;
            Ok(Some(is_paid))
        })
        .await
    }

    async fn list_records(&self) -> Result<Vec<Record>, LedgerError> {
        self.with_conn(|conn| read_records(conn)).await
    }

    async fn snapshot(&self) -> Result<Snapshot, LedgerError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let snapshot = Snapshot {
                people: read_people(&tx)?,
                records: read_records(&tx)?,
            };
            tx.commit()?;
            Ok(snapshot)
        })
        .await
    }

    async fn close(&self) -> Result<(), LedgerError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::Storage("sqlite connection lock poisoned".into()))?
            .take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, err)| LedgerError::from(err))?;
        }
        Ok(())
    }
}
