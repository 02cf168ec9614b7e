use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use tracing::debug;

use super::{LedgerStore, Snapshot};
use crate::error::LedgerError;
use crate::schemas::{NewPerson, NewRecord, Person, PersonId, Record, RecordId};

/// MongoDB-backed store.
///
/// Documents mirror the relational layout: a `person` and a `record`
/// collection keyed by a numeric `id`, with ids handed out from a
/// `counters` collection so they stay small and increasing.
pub struct MongoStore {
    db: Database,
    closed: AtomicBool,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, LedgerError> {
        let client = Client::with_uri_str(uri).await?;
        debug!(database, "connected to mongodb");
        Ok(Self {
            db: client.database(database),
            closed: AtomicBool::new(false),
        })
    }

    fn database(&self) -> Result<&Database, LedgerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LedgerError::Storage("mongodb store is closed".into()));
        }
        Ok(&self.db)
    }

    fn people(&self) -> Result<Collection<Person>, LedgerError> {
        Ok(self.database()?.collection("person"))
    }

    fn records(&self) -> Result<Collection<Record>, LedgerError> {
        Ok(self.database()?.collection("record"))
    }

    async fn next_id(&self, name: &str) -> Result<i64, LedgerError> {
        let counters = self.database()?.collection::<Document>("counters");
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } }, options)
            .await?
            .ok_or_else(|| LedgerError::Storage(format!("counter {name} was not created")))?;
        counter
            .get_i64("seq")
            .map_err(|err| LedgerError::Storage(err.to_string()))
    }

    fn by_id() -> FindOptions {
        FindOptions::builder().sort(doc! { "id": 1 }).build()
    }
}

#[async_trait]
impl LedgerStore for MongoStore {
    async fn insert_person(&self, person: NewPerson) -> Result<Person, LedgerError> {
        let person = Person {
            id: self.next_id("person").await?,
            name: person.name,
            color: person.color,
        };
        self.people()?.insert_one(&person, None).await?;
        Ok(person)
    }

    async fn update_person(
        &self,
        id: PersonId,
        name: &str,
        color: &str,
    ) -> Result<bool, LedgerError> {
        let result = self
            .people()?
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "name": name, "color": color } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn person_exists(&self, id: PersonId) -> Result<bool, LedgerError> {
        let count = self
            .people()?
            .count_documents(doc! { "id": id }, None)
            .await?;
        Ok(count > 0)
    }

    async fn list_people(&self) -> Result<Vec<Person>, LedgerError> {
        let cursor = self.people()?.find(doc! {}, Self::by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_record(&self, record: NewRecord) -> Result<Record, LedgerError> {
        let record = Record {
            id: self.next_id("record").await?,
            amount: record.amount,
            from_id: record.from_id,
            to_id: record.to_id,
            date: record.date,
            memo: record.memo,
            is_paid: false,
        };
        self.records()?.insert_one(&record, None).await?;
        Ok(record)
    }

    async fn update_record(&self, id: RecordId, record: NewRecord) -> Result<bool, LedgerError> {
        let result = self
            .records()?
            .update_one(
                doc! { "id": id },
                doc! { "$set": {
                    "amount": record.amount,
                    "fromId": record.from_id,
                    "toId": record.to_id,
                    "date": record.date,
                    "memo": record.memo,
                } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_record(&self, id: RecordId) -> Result<bool, LedgerError> {
        let result = self
            .records()?
            .delete_one(doc! { "id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn toggle_paid(&self, id: RecordId) -> Result<Option<bool>, LedgerError> {
        // An update pipeline negates the stored value server side, in one document write.
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let record = self
            .records()?
            .find_one_and_update(
                doc! { "id": id },
                vec![doc! { "$set": { "isPaid": { "$not": ["$isPaid"] } } }],
                options,
            )
            .await?;
        Ok(record.map(|record| record.is_paid))
    }

    async fn list_records(&self) -> Result<Vec<Record>, LedgerError> {
        let cursor = self.records()?.find(doc! {}, Self::by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn snapshot(&self) -> Result<Snapshot, LedgerError> {
        // Multi-document transactions need a replica set; with a single
        // writer, acknowledged writes are already visible to both reads.
        Ok(Snapshot {
            people: self.list_people().await?,
            records: self.list_records().await?,
        })
    }

    async fn close(&self) -> Result<(), LedgerError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
