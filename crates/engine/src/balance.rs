//! Net balance computation for a group of participants.
//!
//! Every expense is paid by exactly one participant and shared equally by
//! all participants, so each participant's net position is what they paid
//! minus their share of the total. Positive means they are owed money,
//! negative means they owe.

use std::collections::{HashMap, HashSet};

use crate::{EngineError, Expense, MoneyCents, ResultEngine};

/// Computes the net balance of every participant.
///
/// For each listed participant the balance is
/// `paid - total / participants`, rounded half away from zero in cents.
/// A payer that does not appear in `participants` is still credited with
/// everything they paid (money is never dropped) but is not deducted a
/// share.
///
/// Pure and deterministic; asking to split among an empty participant set
/// is a caller bug and fails with [`EngineError::NoParticipants`].
pub fn compute_balances(
    expenses: &[Expense],
    participants: &HashSet<String>,
) -> ResultEngine<HashMap<String, MoneyCents>> {
    if participants.is_empty() {
        return Err(EngineError::NoParticipants(
            "participant set is empty".to_string(),
        ));
    }

    let total: MoneyCents = expenses.iter().map(|e| e.amount).sum();
    let count = participants.len() as i64;

    let mut paid_by: HashMap<&str, MoneyCents> = HashMap::new();
    for expense in expenses {
        *paid_by
            .entry(expense.payer_id.as_str())
            .or_insert(MoneyCents::ZERO) += expense.amount;
    }

    let mut balances = HashMap::with_capacity(participants.len());
    for id in participants {
        let paid = paid_by.get(id.as_str()).copied().unwrap_or(MoneyCents::ZERO);
        // paid - total / count, computed as one division so the only
        // rounding step is the final half-up.
        let scaled = MoneyCents::new(paid.cents() * count) - total;
        balances.insert(id.clone(), scaled.div_round_half_up(count));
    }

    // Payers outside the participant set keep full credit, no share.
    for (payer, paid) in paid_by {
        if !participants.contains(payer) {
            balances.insert(payer.to_string(), paid);
        }
    }

    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn expense(payer: &str, cents: i64) -> Expense {
        Expense::new(payer, MoneyCents::new(cents), "test", Utc::now()).unwrap()
    }

    fn participants(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_payer_three_members() {
        let expenses = vec![expense("a", 9000), expense("b", 0), expense("c", 0)];
        let balances = compute_balances(&expenses, &participants(&["a", "b", "c"])).unwrap();

        assert_eq!(balances["a"], MoneyCents::new(6000));
        assert_eq!(balances["b"], MoneyCents::new(-3000));
        assert_eq!(balances["c"], MoneyCents::new(-3000));
    }

    #[test]
    fn equal_payers_balance_out() {
        let expenses = vec![expense("a", 5000), expense("b", 5000)];
        let balances = compute_balances(&expenses, &participants(&["a", "b"])).unwrap();

        assert_eq!(balances["a"], MoneyCents::ZERO);
        assert_eq!(balances["b"], MoneyCents::ZERO);
    }

    #[test]
    fn sum_stays_within_rounding_noise() {
        // 100.00 across three members does not divide evenly.
        let expenses = vec![expense("a", 10000)];
        let balances = compute_balances(&expenses, &participants(&["a", "b", "c"])).unwrap();

        let sum: i64 = balances.values().map(|b| b.cents()).sum();
        assert!(sum.abs() <= balances.len() as i64, "sum drifted: {sum}");
    }

    #[test]
    fn outside_payer_is_credited_without_share() {
        let expenses = vec![expense("guest", 3000)];
        let balances = compute_balances(&expenses, &participants(&["a", "b"])).unwrap();

        assert_eq!(balances["guest"], MoneyCents::new(3000));
        assert_eq!(balances["a"], MoneyCents::new(-1500));
        assert_eq!(balances["b"], MoneyCents::new(-1500));
    }

    #[test]
    fn empty_participants_is_an_error() {
        let err = compute_balances(&[], &HashSet::new()).unwrap_err();
        assert!(matches!(err, EngineError::NoParticipants(_)));
    }

    #[test]
    fn no_expenses_yields_all_zero() {
        let balances = compute_balances(&[], &participants(&["a", "b"])).unwrap();
        assert!(balances.values().all(|b| b.is_zero()));
    }
}
