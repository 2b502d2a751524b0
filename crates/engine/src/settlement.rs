//! Greedy settlement of net balances into pairwise transfers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::MoneyCents;

/// A recommended payment from one participant to another.
///
/// Transfers are recomputed wholesale every time the balances change and
/// are never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: MoneyCents,
}

/// Produces a settlement for the given net balances: repeatedly matches the
/// largest debtor against the largest creditor until one side runs out.
///
/// The result is not globally minimal (that problem is NP-hard) but is
/// minimal under this heuristic and fully deterministic: equal magnitudes
/// are ordered by participant id.
///
/// An empty or already balanced input yields an empty list. Residues below
/// one cent are rounding noise and are not settled.
pub fn settle(balances: &HashMap<String, MoneyCents>) -> Vec<Transfer> {
    let mut creditors: Vec<(&str, MoneyCents)> = balances
        .iter()
        .filter(|(_, b)| b.is_positive())
        .map(|(id, b)| (id.as_str(), *b))
        .collect();
    let mut debtors: Vec<(&str, MoneyCents)> = balances
        .iter()
        .filter(|(_, b)| b.is_negative())
        .map(|(id, b)| (id.as_str(), -*b))
        .collect();

    creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut settlement = Vec::new();
    let mut ci = 0;
    let mut di = 0;

    while di < debtors.len() && ci < creditors.len() {
        let (debtor_id, debtor_amt) = debtors[di];
        let (creditor_id, creditor_amt) = creditors[ci];

        let settle_amt = debtor_amt.min(creditor_amt);
        if settle_amt.is_positive() {
            settlement.push(Transfer {
                from: debtor_id.to_string(),
                to: creditor_id.to_string(),
                amount: settle_amt,
            });
        }

        let remaining_debtor = debtor_amt - settle_amt;
        let remaining_creditor = creditor_amt - settle_amt;

        if remaining_debtor.is_positive() {
            debtors[di].1 = remaining_debtor;
        } else {
            di += 1;
        }

        if remaining_creditor.is_positive() {
            creditors[ci].1 = remaining_creditor;
        } else {
            ci += 1;
        }
    }

    settlement
}
