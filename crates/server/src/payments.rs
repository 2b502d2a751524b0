//! Payment API endpoints

use api_types::payment::{
    EffectiveStateView, FinalizeRequest, PaymentList, PaymentView, ToggleRequest, ToggleResponse,
};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    ServerError,
    balances::{parse_expenses, parse_participants},
    server::ServerState,
};
use engine::{Notifier, PaymentStore, Toggle};

fn map_view(view: engine::PaymentView) -> PaymentView {
    PaymentView {
        id: view.payment.id,
        from_user: view.payment.from_user,
        to_user: view.payment.to_user,
        amount_minor: view.payment.amount.cents(),
        is_paid: view.payment.is_paid,
        pending: view.pending,
        failed: view.failed,
        created_at: view.payment.created_at,
    }
}

/// Handle requests for finalizing a group's bill into payment records.
pub async fn finalize<S: PaymentStore, N: Notifier>(
    State(state): State<ServerState<S, N>>,
    Path(group_id): Path<String>,
    Json(payload): Json<FinalizeRequest>,
) -> Result<Json<PaymentList>, ServerError> {
    let expenses = parse_expenses(payload.expenses)?;
    let participants = parse_participants(payload.participants);

    let payments = state
        .engine
        .finalize_bill(&group_id, &expenses, &participants)
        .await?;

    let payments = payments
        .into_iter()
        .map(|payment| {
            map_view(engine::PaymentView {
                payment,
                pending: false,
                failed: false,
            })
        })
        .collect();

    Ok(Json(PaymentList { payments }))
}

/// Handle requests for reopening a bill (drops the group's payments).
pub async fn reopen<S: PaymentStore, N: Notifier>(
    State(state): State<ServerState<S, N>>,
    Path(group_id): Path<String>,
) -> Result<Json<()>, ServerError> {
    state.engine.reopen_bill(&group_id).await?;
    Ok(Json(()))
}

/// Handle requests for the merged payment list of a group.
pub async fn list<S: PaymentStore, N: Notifier>(
    State(state): State<ServerState<S, N>>,
    Path(group_id): Path<String>,
) -> Result<Json<PaymentList>, ServerError> {
    let payments = state
        .engine
        .payments(&group_id)
        .await?
        .into_iter()
        .map(map_view)
        .collect();

    Ok(Json(PaymentList { payments }))
}

/// Handle requests for the effective state of a single payment.
pub async fn effective_state<S: PaymentStore, N: Notifier>(
    State(state): State<ServerState<S, N>>,
    Path((group_id, payment_id)): Path<(String, String)>,
) -> Result<Json<EffectiveStateView>, ServerError> {
    let effective = state.engine.effective_state(&group_id, &payment_id).await?;

    Ok(Json(EffectiveStateView {
        is_paid: effective.is_paid,
        pending: effective.pending,
        failed: effective.failed,
    }))
}

/// Handle requests for toggling a payment's paid flag.
///
/// Responds immediately: the reconciliation itself runs in the background
/// and its outcome reaches clients through the merged payment state.
pub async fn toggle<S: PaymentStore, N: Notifier>(
    State(state): State<ServerState<S, N>>,
    Path((group_id, payment_id)): Path<(String, String)>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ServerError> {
    let response = match state
        .engine
        .toggle_paid(&group_id, &payment_id, payload.desired_is_paid)
    {
        Toggle::Scheduled { op_id, .. } => ToggleResponse {
            scheduled: true,
            op_id: Some(op_id),
        },
        Toggle::AlreadyInFlight => ToggleResponse {
            scheduled: false,
            op_id: None,
        },
    };

    Ok(Json(response))
}

/// Handle requests for dismissing a surfaced sync failure.
pub async fn dismiss<S: PaymentStore, N: Notifier>(
    State(state): State<ServerState<S, N>>,
    Path(payment_id): Path<String>,
) -> Result<Json<()>, ServerError> {
    state.engine.dismiss_failure(&payment_id);
    Ok(Json(()))
}
