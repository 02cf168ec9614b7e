use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::balance::{compute_balances, Balance};
use crate::color::generate_dark_color;
use crate::error::{EntityKind, LedgerError};
use crate::exchange::{get_settlement_plan, Exchange};
use crate::schemas::{
    required_text, NewPerson, NewRecord, Person, PersonId, Record, RecordId, RecordView,
};
use crate::store::LedgerStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonBalance {
    pub id: PersonId,
    pub name: String,
    pub color: String,
    pub amount: f64,
}

/// Everything the ledger page shows, read from one snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overview {
    pub people: Vec<Person>,
    pub balances: Vec<PersonBalance>,
    pub records: Vec<RecordView>,
    pub settlements: Vec<Exchange>,
}

/// Owns every mutation of the ledger and every figure derived from it.
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn create_person(&self, name: &str) -> Result<Person, LedgerError> {
        let name = required_text("name", name)?;
        let person = self
            .store
            .insert_person(NewPerson {
                name,
                color: generate_dark_color(),
            })
            .await?;
        info!(id = person.id, name = %person.name, "person added");
        Ok(person)
    }

    pub async fn update_person(
        &self,
        id: PersonId,
        name: &str,
        color: &str,
    ) -> Result<(), LedgerError> {
        let name = required_text("name", name)?;
        let color = required_text("color", color)?;
        if !self.store.update_person(id, &name, &color).await? {
            return Err(LedgerError::not_found(EntityKind::Person, id));
        }
        info!(id, "person updated");
        Ok(())
    }

    pub async fn list_people(&self) -> Result<Vec<Person>, LedgerError> {
        self.store.list_people().await
    }

    async fn check_parties(&self, record: &NewRecord) -> Result<(), LedgerError> {
        for id in [record.from_id, record.to_id] {
            if !self.store.person_exists(id).await? {
                debug!(id, "record names an unknown person");
                return Err(LedgerError::Reference(id));
            }
        }
        Ok(())
    }

    pub async fn create_record(&self, record: NewRecord) -> Result<Record, LedgerError> {
        self.check_parties(&record).await?;
        let record = self.store.insert_record(record).await?;
        info!(
            id = record.id,
            from = record.from_id,
            to = record.to_id,
            amount = record.amount,
            "record added"
        );
        Ok(record)
    }

    /// Replaces parties, amount, date and memo. The paid flag is left alone.
    pub async fn update_record(&self, id: RecordId, record: NewRecord) -> Result<(), LedgerError> {
        self.check_parties(&record).await?;
        if !self.store.update_record(id, record).await? {
            return Err(LedgerError::not_found(EntityKind::Record, id));
        }
        info!(id, "record updated");
        Ok(())
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<(), LedgerError> {
        if !self.store.delete_record(id).await? {
            return Err(LedgerError::not_found(EntityKind::Record, id));
        }
        info!(id, "record deleted");
        Ok(())
    }

    /// Flips the paid flag and returns its new value.
    pub async fn toggle_paid(&self, id: RecordId) -> Result<bool, LedgerError> {
        let is_paid = self
            .store
            .toggle_paid(id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Record, id))?;
        info!(id, is_paid, "record paid flag toggled");
        Ok(is_paid)
    }

    pub async fn list_records_with_people(&self) -> Result<Vec<RecordView>, LedgerError> {
        let snapshot = self.store.snapshot().await?;
        Ok(join_records(&snapshot.people, snapshot.records))
    }

    pub async fn balances(&self) -> Result<Balance, LedgerError> {
        let snapshot = self.store.snapshot().await?;
        Ok(compute_balances(&snapshot.people, &snapshot.records))
    }

    pub async fn overview(&self) -> Result<Overview, LedgerError> {
        let snapshot = self.store.snapshot().await?;
        let balance = compute_balances(&snapshot.people, &snapshot.records);
        let settlements = get_settlement_plan(&balance, &snapshot.records);
        let balances = snapshot
            .people
            .iter()
            .map(|person| PersonBalance {
                id: person.id,
                name: person.name.clone(),
                color: person.color.clone(),
                amount: balance.get(&person.id).copied().unwrap_or(0.0),
            })
            .collect();
        let records = join_records(&snapshot.people, snapshot.records);
        Ok(Overview {
            people: snapshot.people,
            balances,
            records,
            settlements,
        })
    }

    pub async fn close(&self) -> Result<(), LedgerError> {
        self.store.close().await
    }
}

/// Pairs each record with both of its people, keeping record order.
fn join_records(people: &[Person], records: Vec<Record>) -> Vec<RecordView> {
    let people: BTreeMap<PersonId, &Person> =
        people.iter().map(|person| (person.id, person)).collect();
    records
        .into_iter()
        .filter_map(|record| {
            match (people.get(&record.from_id), people.get(&record.to_id)) {
                (Some(from), Some(to)) => Some(RecordView::join(record, from, to)),
                _ => {
                    warn!(id = record.id, "record refers to a missing person, skipped");
                    None
                }
            }
        })
        .collect()
}
