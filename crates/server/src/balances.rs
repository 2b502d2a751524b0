//! Balance API endpoints

use std::collections::{BTreeMap, HashSet};

use api_types::balance::{BalancesRequest, BalancesResponse};
use api_types::expense::ExpenseNew;
use axum::Json;
use chrono::Utc;

use crate::ServerError;
use engine::{Expense, MoneyCents};

pub(crate) fn parse_expenses(input: Vec<ExpenseNew>) -> Result<Vec<Expense>, ServerError> {
    input
        .into_iter()
        .map(|e| {
            Expense::new(
                e.payer_id,
                MoneyCents::new(e.amount_minor),
                e.description.unwrap_or_default(),
                e.occurred_at.unwrap_or_else(Utc::now),
            )
            .map_err(ServerError::from)
        })
        .collect()
}

pub(crate) fn parse_participants(ids: Vec<String>) -> HashSet<String> {
    ids.into_iter().collect()
}

/// Handle requests for computing net balances from an expense list.
pub async fn compute(
    Json(payload): Json<BalancesRequest>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let expenses = parse_expenses(payload.expenses)?;
    let participants = parse_participants(payload.participants);

    let balances = engine::compute_balances(&expenses, &participants)?;

    let balances: BTreeMap<String, i64> = balances
        .into_iter()
        .map(|(id, amount)| (id, amount.cents()))
        .collect();

    Ok(Json(BalancesResponse { balances }))
}
