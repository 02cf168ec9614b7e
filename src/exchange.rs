use std::collections::BTreeMap;

use serde::Serialize;

use crate::balance::Balance;
use crate::schemas::{PersonId, Record};

/// Balances are settled in thousandths so the matching below is exact.
/// Wide enough that summing any number of capped amounts cannot overflow.
type Millis = i128;

#[derive(Clone, Debug, PartialEq, Eq)]
struct PersonalBalance {
    id: PersonId,
    balance: Millis,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Exchange {
    pub payer: PersonId,
    pub receiver: PersonId,
    pub amount: f64,
}

fn to_millis(amount: f64) -> Millis {
    (amount * 1000.0).round() as Millis
}

fn from_millis(millis: Millis) -> f64 {
    millis as f64 / 1000.0
}

// The exchanges that will be made if no simplification happens: every pair
// of people settles whatever is left between the two of them.
fn get_naive_exchanges(records: &[Record]) -> Vec<Exchange> {
    // Keyed by (lower id, higher id). Positive means the higher id owes the lower one.
    let mut balances_between_people: BTreeMap<(PersonId, PersonId), Millis> = BTreeMap::new();

    for record in records {
        let amount = to_millis(record.amount);
        let (pair, amount) = if record.from_id < record.to_id {
            ((record.from_id, record.to_id), amount)
        } else {
            ((record.to_id, record.from_id), amount.saturating_neg())
        };
        let net = balances_between_people.entry(pair).or_insert(0);
        *net = net.saturating_add(amount);
    }

    balances_between_people
        .into_iter()
        .filter(|(_, balance)| *balance != 0)
        .map(|((low, high), balance)| {
            let (payer, receiver) = if balance > 0 { (high, low) } else { (low, high) };
            Exchange {
                payer,
                receiver,
                amount: from_millis(balance.saturating_abs()),
            }
        })
        .collect()
}

// Tries to simplify the number of exchanges by always matching the biggest
// debtor with the biggest creditor.
fn get_simplified_exchanges(
    mut payers: Vec<PersonalBalance>,
    mut receivers: Vec<PersonalBalance>,
) -> Vec<Exchange> {
    let by_balance = |a: &PersonalBalance, b: &PersonalBalance| {
        a.balance.cmp(&b.balance).then(b.id.cmp(&a.id))
    };
    payers.sort_by(by_balance);
    receivers.sort_by(by_balance);

    let mut exchanges: Vec<Exchange> = Vec::new();

    while let (Some(payer), Some(receiver)) = (payers.last_mut(), receivers.last_mut()) {
        let amount = payer.balance.min(receiver.balance);
        exchanges.push(Exchange {
            payer: payer.id,
            receiver: receiver.id,
            amount: from_millis(amount),
        });
        payer.balance -= amount;
        receiver.balance -= amount;
        if payer.balance == 0 {
            payers.pop();
        }
        if receiver.balance == 0 {
            receivers.pop();
        }
    }
    exchanges
}

/// Transfers that would bring every balance back to zero.
///
/// People with a negative balance pay, people with a positive balance
/// receive. Both the pairwise and the simplified plan are computed and the
/// shorter one is returned.
pub fn get_settlement_plan(balance: &Balance, records: &[Record]) -> Vec<Exchange> {
    // Divide people into payers and receivers
    let mut payers = Vec::new();
    let mut receivers = Vec::new();

    for (&id, &amount) in balance {
        let millis = to_millis(amount);
        let person = PersonalBalance {
            id,
            balance: millis.saturating_abs(),
        };
        if millis < 0 {
            payers.push(person);
        } else if millis > 0 {
            receivers.push(person);
        }
    }

    let naive_exchanges = get_naive_exchanges(records);
    let simplified_exchanges = get_simplified_exchanges(payers, receivers);

    // We ensure the simplification didn't accidentally end up being
    // more complicated than the naive exchanges
    if simplified_exchanges.len() < naive_exchanges.len() {
        simplified_exchanges
    } else {
        naive_exchanges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::compute_balances;
    use crate::schemas::Person;

    fn people(n: i64) -> Vec<Person> {
        (1..=n)
            .map(|id| Person {
                id,
                name: format!("p{id}"),
                color: "hsl(10, 60%, 35%)".into(),
            })
            .collect()
    }

    fn record(id: i64, from_id: PersonId, to_id: PersonId, amount: f64) -> Record {
        Record {
            id,
            amount,
            from_id,
            to_id,
            date: "2024-01-01".into(),
            memo: "memo".into(),
            is_paid: false,
        }
    }

    fn plan(n: i64, records: &[Record]) -> Vec<Exchange> {
        get_settlement_plan(&compute_balances(&people(n), records), records)
    }

    #[test]
    fn empty_ledger_needs_no_exchanges() {
        assert!(plan(3, &[]).is_empty());
    }

    #[test]
    fn single_record_is_paid_back_by_the_receiver() {
        let exchanges = plan(2, &[record(1, 1, 2, 100.0)]);
        assert_eq!(
            exchanges,
            vec![Exchange {
                payer: 2,
                receiver: 1,
                amount: 100.0
            }]
        );
    }

    #[test]
    fn opposite_records_are_netted() {
        let exchanges = plan(2, &[record(1, 1, 2, 100.0), record(2, 2, 1, 40.0)]);
        assert_eq!(
            exchanges,
            vec![Exchange {
                payer: 2,
                receiver: 1,
                amount: 60.0
            }]
        );
    }

    #[test]
    fn chains_are_simplified() {
        // 1 lent to 2, 2 lent to 3: 3 can pay 1 directly.
        let exchanges = plan(3, &[record(1, 1, 2, 10.0), record(2, 2, 3, 10.0)]);
        assert_eq!(
            exchanges,
            vec![Exchange {
                payer: 3,
                receiver: 1,
                amount: 10.0
            }]
        );
    }

    #[test]
    fn huge_balances_do_not_overflow() {
        let records = [record(1, 1, 2, 5.0e15), record(2, 1, 2, 5.0e15)];
        let exchanges = plan(2, &records);
        assert_eq!(
            exchanges,
            vec![Exchange {
                payer: 2,
                receiver: 1,
                amount: 1.0e16
            }]
        );

        let extreme = [record(1, 1, 2, f64::MAX), record(2, 2, 1, f64::MAX)];
        let _ = plan(2, &extreme);
    }

    #[test]
    fn fractional_amounts_settle_exactly() {
        let records = [
            record(1, 1, 2, 0.1),
            record(2, 1, 3, 0.2),
            record(3, 2, 3, 0.333),
        ];
        let exchanges = plan(3, &records);
        let balance = compute_balances(&people(3), &records);

        let mut settled = balance.clone();
        for exchange in &exchanges {
            *settled.get_mut(&exchange.payer).unwrap() += exchange.amount;
            *settled.get_mut(&exchange.receiver).unwrap() -= exchange.amount;
        }
        for amount in settled.values() {
            assert!(amount.abs() < 1e-9, "{settled:?}");
        }
    }
}
