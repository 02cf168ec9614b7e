use serde::{Deserialize, Serialize};

pub type PersonId = i64;
pub type RecordId = i64;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub color: String,
}

/// A directed obligation: `from_id` handed `amount` over to `to_id`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub amount: f64,
    pub from_id: PersonId,
    pub to_id: PersonId,
    pub date: String,
    pub memo: String,
    pub is_paid: bool,
}

/// A record joined with the display data of both parties.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: RecordId,
    pub amount: f64,
    pub from_id: PersonId,
    pub to_id: PersonId,
    pub from_name: String,
    pub to_name: String,
    pub from_color: String,
    pub to_color: String,
    pub date: String,
    pub memo: String,
    pub is_paid: bool,
}

impl RecordView {
    pub fn join(record: Record, from: &Person, to: &Person) -> Self {
        Self {
            id: record.id,
            amount: record.amount,
            from_id: record.from_id,
            to_id: record.to_id,
            from_name: from.name.clone(),
            to_name: to.name.clone(),
            from_color: from.color.clone(),
            to_color: to.color.clone(),
            date: record.date,
            memo: record.memo,
            is_paid: record.is_paid,
        }
    }
}

/// Validated input for creating a person. The color is filled in by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPerson {
    pub name: String,
    pub color: String,
}

/// Largest amount a single record may carry.
pub const MAX_AMOUNT: f64 = 1e12;

/// Validated input for creating or editing a record.
///
/// Construction goes through [`NewRecord::new`], so a value of this type
/// always has a positive 3-decimal amount, a well-formed date, a non-empty
/// memo and two distinct parties. Whether the parties exist is checked by
/// the engine against the store.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRecord {
    pub from_id: PersonId,
    pub to_id: PersonId,
    pub amount: f64,
    pub date: String,
    pub memo: String,
}

impl NewRecord {
    pub fn new(
        from_id: PersonId,
        to_id: PersonId,
        amount: f64,
        date: &str,
        memo: &str,
    ) -> Result<Self, crate::error::LedgerError> {
        use crate::error::LedgerError;

        if !amount.is_finite() {
            return Err(LedgerError::Validation("amount must be a number".into()));
        }
        if amount > MAX_AMOUNT {
            return Err(LedgerError::Validation(format!(
                "amount must not exceed {MAX_AMOUNT}"
            )));
        }
        let amount = crate::balance::round_to_3_decimals(amount);
        if amount <= 0.0 {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }
        if from_id == to_id {
            return Err(LedgerError::Validation(
                "a record needs two different people".into(),
            ));
        }
        let date = date.trim();
        if date.is_empty() {
            return Err(LedgerError::Validation("date is required".into()));
        }
        if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(LedgerError::Validation(format!(
                "malformed date {date:?}, expected YYYY-MM-DD"
            )));
        }
        let memo = memo.trim();
        if memo.is_empty() {
            return Err(LedgerError::Validation("memo is required".into()));
        }

        Ok(Self {
            from_id,
            to_id,
            amount,
            date: date.to_string(),
            memo: memo.to_string(),
        })
    }
}

/// Trims `value` and rejects it when nothing is left.
pub fn required_text(field: &str, value: &str) -> Result<String, crate::error::LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(crate::error::LedgerError::Validation(format!(
            "{field} is required"
        )));
    }
    Ok(value.to_string())
}
