use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{balances, payments, settlement};
use engine::{Notifier, PaymentStore, SyncEngine};

/// Shared handler state: the reconciliation engine behind an `Arc`.
pub struct ServerState<S, N> {
    pub engine: Arc<SyncEngine<S, N>>,
}

impl<S, N> Clone for ServerState<S, N> {
    fn clone(&self) -> Self {
        ServerState {
            engine: Arc::clone(&self.engine),
        }
    }
}

pub fn router<S, N>(state: ServerState<S, N>) -> Router
where
    S: PaymentStore,
    N: Notifier,
{
    Router::new()
        .route("/balances", post(balances::compute))
        .route("/settlement", post(settlement::compute))
        .route("/groups/{group_id}/finalize", post(payments::finalize))
        .route("/groups/{group_id}/reopen", post(payments::reopen))
        .route("/groups/{group_id}/payments", get(payments::list))
        .route(
            "/groups/{group_id}/payments/{payment_id}",
            get(payments::effective_state),
        )
        .route(
            "/groups/{group_id}/payments/{payment_id}/toggle",
            post(payments::toggle),
        )
        .route("/payments/{payment_id}/dismiss", post(payments::dismiss))
        .with_state(state)
}

pub async fn run<S, N>(engine: SyncEngine<S, N>)
where
    S: PaymentStore,
    N: Notifier,
{
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener<S, N>(
    engine: SyncEngine<S, N>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error>
where
    S: PaymentStore,
    N: Notifier,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener<S, N>(
    engine: SyncEngine<S, N>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error>
where
    S: PaymentStore,
    N: Notifier,
{
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
