//! Request payloads as they arrive from the browser.
//!
//! HTML forms post every field as a string, scripted clients post numbers.
//! Each form accepts both, and is turned into a typed input exactly once,
//! here, so the engine never sees a half-parsed payload.

use serde::Deserialize;

use crate::error::LedgerError;
use crate::schemas::{required_text, NewRecord, PersonId};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FormValue {
    Number(f64),
    Text(String),
}

impl FormValue {
    fn as_id(&self, field: &str) -> Result<PersonId, LedgerError> {
        let invalid = || LedgerError::Validation(format!("{field} must be an integer id"));
        match self {
            // `i64::MAX as f64` is 2^63, one past the largest id.
            FormValue::Number(n)
                if n.is_finite()
                    && n.fract() == 0.0
                    && *n >= PersonId::MIN as f64
                    && *n < PersonId::MAX as f64 =>
            {
                Ok(*n as PersonId)
            }
            FormValue::Number(_) => Err(invalid()),
            FormValue::Text(s) => s.trim().parse().map_err(|_| invalid()),
        }
    }

    fn as_amount(&self) -> Result<f64, LedgerError> {
        match self {
            FormValue::Number(n) => Ok(*n),
            FormValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| LedgerError::Validation(format!("amount {s:?} is not a number"))),
        }
    }

    fn as_text(&self) -> String {
        match self {
            FormValue::Number(n) => n.to_string(),
            FormValue::Text(s) => s.clone(),
        }
    }
}

fn require<'a, T>(field: &str, value: &'a Option<T>) -> Result<&'a T, LedgerError> {
    value
        .as_ref()
        .ok_or_else(|| LedgerError::Validation(format!("{field} is required")))
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PersonForm {
    #[serde(default)]
    pub name: Option<String>,
}

impl PersonForm {
    pub fn validate(&self) -> Result<String, LedgerError> {
        required_text("name", require("name", &self.name)?)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PersonEditForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl PersonEditForm {
    pub fn validate(&self) -> Result<(String, String), LedgerError> {
        let name = required_text("name", require("name", &self.name)?)?;
        let color = required_text("color", require("color", &self.color)?)?;
        Ok((name, color))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordForm {
    #[serde(default)]
    pub from_id: Option<FormValue>,
    #[serde(default)]
    pub to_id: Option<FormValue>,
    #[serde(default)]
    pub amount: Option<FormValue>,
    #[serde(default)]
    pub date: Option<FormValue>,
    #[serde(default)]
    pub memo: Option<FormValue>,
}

impl RecordForm {
    pub fn validate(&self) -> Result<NewRecord, LedgerError> {
        let from_id = require("fromId", &self.from_id)?.as_id("fromId")?;
        let to_id = require("toId", &self.to_id)?.as_id("toId")?;
        let amount = require("amount", &self.amount)?.as_amount()?;
        let date = require("date", &self.date)?.as_text();
        let memo = require("memo", &self.memo)?.as_text();
        NewRecord::new(from_id, to_id, amount, &date, &memo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_form(value: serde_json::Value) -> RecordForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn record_form_accepts_html_strings() {
        let form = record_form(json!({
            "fromId": "1", "toId": "2", "amount": "12.5",
            "date": "2024-01-01", "memo": "dinner"
        }));
        let record = form.validate().unwrap();
        assert_eq!((record.from_id, record.to_id), (1, 2));
        assert_eq!(record.amount, 12.5);
    }

    #[test]
    fn record_form_accepts_json_numbers() {
        let form = record_form(json!({
            "fromId": 3, "toId": 1, "amount": 7,
            "date": "2024-03-09", "memo": "taxi"
        }));
        let record = form.validate().unwrap();
        assert_eq!((record.from_id, record.to_id, record.amount), (3, 1, 7.0));
    }

    #[test]
    fn record_form_reports_missing_fields() {
        let form = record_form(json!({ "fromId": 1, "toId": 2, "amount": 1 }));
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid input: date is required");
    }

    #[test]
    fn record_form_rejects_garbage_numbers() {
        let bad_id = record_form(json!({
            "fromId": "abc", "toId": 2, "amount": 1, "date": "2024-01-01", "memo": "m"
        }));
        assert!(matches!(bad_id.validate(), Err(LedgerError::Validation(_))));

        let fractional_id = record_form(json!({
            "fromId": 1.5, "toId": 2, "amount": 1, "date": "2024-01-01", "memo": "m"
        }));
        assert!(matches!(fractional_id.validate(), Err(LedgerError::Validation(_))));

        let huge_id = record_form(json!({
            "fromId": 1e300, "toId": 2, "amount": 1, "date": "2024-01-01", "memo": "m"
        }));
        assert!(matches!(huge_id.validate(), Err(LedgerError::Validation(_))));

        let bad_amount = record_form(json!({
            "fromId": 1, "toId": 2, "amount": "", "date": "2024-01-01", "memo": "m"
        }));
        assert!(matches!(bad_amount.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn person_forms_trim_and_require_fields() {
        let form: PersonForm = serde_json::from_value(json!({ "name": "  Alice " })).unwrap();
        assert_eq!(form.validate().unwrap(), "Alice");

        let empty: PersonForm = serde_json::from_value(json!({ "name": "" })).unwrap();
        assert!(empty.validate().is_err());

        let edit: PersonEditForm = serde_json::from_value(json!({ "name": "Bob" })).unwrap();
        assert_eq!(
            edit.validate().unwrap_err().to_string(),
            "invalid input: color is required"
        );
    }
}
