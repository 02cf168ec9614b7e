use std::collections::BTreeMap;

use crate::schemas::{Person, PersonId, Record};

pub type Balance = BTreeMap<PersonId, f64>;

/// Net position of every person: total sent minus total received.
///
/// All records count, paid or not. People without records end up at zero,
/// records naming unknown people are ignored.
pub fn compute_balances(people: &[Person], records: &[Record]) -> Balance {
    let mut balance: Balance = people.iter().map(|person| (person.id, 0.0)).collect();
    for record in records {
        if let Some(sent) = balance.get_mut(&record.from_id) {
            *sent += record.amount;
        }
        if let Some(received) = balance.get_mut(&record.to_id) {
            *received -= record.amount;
        }
    }
    for amount in balance.values_mut() {
        *amount = round_to_3_decimals(*amount);
    }
    balance
}

/// Rounds half away from zero and folds `-0.0` into `0.0`.
pub fn round_to_3_decimals(n: f64) -> f64 {
    let rounded = (n * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: PersonId) -> Person {
        Person {
            id,
            name: format!("p{id}"),
            color: "hsl(0, 60%, 35%)".into(),
        }
    }

    fn record(id: i64, from_id: PersonId, to_id: PersonId, amount: f64, is_paid: bool) -> Record {
        Record {
            id,
            amount,
            from_id,
            to_id,
            date: "2024-01-01".into(),
            memo: "memo".into(),
            is_paid,
        }
    }

    #[test]
    fn person_without_records_has_zero_balance() {
        let balance = compute_balances(&[person(1), person(2)], &[]);
        assert_eq!(balance[&1], 0.0);
        assert_eq!(balance[&2], 0.0);
    }

    #[test]
    fn sender_is_credited_and_receiver_debited() {
        let people = [person(1), person(2), person(3)];
        let records = [record(1, 1, 2, 100.0, false), record(2, 2, 3, 30.0, false)];
        let balance = compute_balances(&people, &records);
        assert_eq!(balance[&1], 100.0);
        assert_eq!(balance[&2], -70.0);
        assert_eq!(balance[&3], -30.0);
    }

    #[test]
    fn paid_records_still_count() {
        let people = [person(1), person(2)];
        let unpaid = compute_balances(&people, &[record(1, 1, 2, 5.5, false)]);
        let paid = compute_balances(&people, &[record(1, 1, 2, 5.5, true)]);
        assert_eq!(unpaid, paid);
    }

    #[test]
    fn rounding_removes_float_noise() {
        let people = [person(1), person(2)];
        let records = [
            record(1, 1, 2, 0.1, false),
            record(2, 1, 2, 0.2, false),
            record(3, 2, 1, 0.3, false),
        ];
        let balance = compute_balances(&people, &records);
        assert_eq!(balance[&1], 0.0);
        assert_eq!(balance[&2], 0.0);
        assert!(balance[&1].is_sign_positive());
    }

    #[test]
    fn round_to_3_decimals_goes_half_away_from_zero() {
        assert_eq!(round_to_3_decimals(2.0625), 2.063);
        assert_eq!(round_to_3_decimals(-2.0625), -2.063);
        assert_eq!(round_to_3_decimals(-2.5), -2.5);
        assert_eq!(round_to_3_decimals(-0.0004), 0.0);
        assert_eq!(round_to_3_decimals(33.33333), 33.333);
    }
}
