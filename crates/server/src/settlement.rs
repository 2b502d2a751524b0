//! Settlement API endpoints

use std::collections::HashMap;

use api_types::settlement::{SettleRequest, SettleResponse, TransferView};
use axum::Json;

use crate::{
    ServerError,
    balances::{parse_expenses, parse_participants},
};
use engine::MoneyCents;

/// Handle requests for settling a group.
///
/// Clients post either pre-computed balances or a raw expense list with the
/// participant set; the settlement is recomputed wholesale either way.
pub async fn compute(
    Json(payload): Json<SettleRequest>,
) -> Result<Json<SettleResponse>, ServerError> {
    let balances: HashMap<String, MoneyCents> = match (payload.balances, payload.expenses) {
        (Some(balances), None) => balances
            .into_iter()
            .map(|(id, cents)| (id, MoneyCents::new(cents)))
            .collect(),
        (None, Some(expenses)) => {
            let participants = payload
                .participants
                .ok_or_else(|| ServerError::Generic("participants required".to_string()))?;
            let expenses = parse_expenses(expenses)?;
            engine::compute_balances(&expenses, &parse_participants(participants))?
        }
        _ => {
            return Err(ServerError::Generic(
                "either balances or expenses required".to_string(),
            ));
        }
    };

    let transfers = engine::settle(&balances)
        .into_iter()
        .map(|t| TransferView {
            from: t.from,
            to: t.to,
            amount_minor: t.amount.cents(),
        })
        .collect();

    Ok(Json(SettleResponse { transfers }))
}
