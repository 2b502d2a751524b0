use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{LogNotifier, MemoryStore, SyncEngine};
use server::ServerState;

fn test_router() -> (Router, Arc<SyncEngine<MemoryStore, LogNotifier>>) {
    let engine = Arc::new(SyncEngine::builder(MemoryStore::new(), LogNotifier).build());
    let router = server::router(ServerState {
        engine: Arc::clone(&engine),
    });
    (router, engine)
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn balances_route_computes_net_positions() {
    let (router, _engine) = test_router();

    let (status, body) = post_json(
        &router,
        "/balances",
        json!({
            "expenses": [
                {"payer_id": "alice", "amount_minor": 9000},
                {"payer_id": "bob", "amount_minor": 0},
                {"payer_id": "carol", "amount_minor": 0}
            ],
            "participants": ["alice", "bob", "carol"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balances"]["alice"], 6000);
    assert_eq!(body["balances"]["bob"], -3000);
    assert_eq!(body["balances"]["carol"], -3000);
}

#[tokio::test]
async fn balances_route_rejects_empty_participants() {
    let (router, _engine) = test_router();

    let (status, _) = post_json(
        &router,
        "/balances",
        json!({"expenses": [], "participants": []}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn settlement_route_accepts_precomputed_balances() {
    let (router, _engine) = test_router();

    let (status, body) = post_json(
        &router,
        "/settlement",
        json!({"balances": {"alice": 6000, "bob": -3000, "carol": -3000}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let transfers = body["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.iter().all(|t| t["to"] == "alice"));
    assert!(transfers.iter().all(|t| t["amount_minor"] == 3000));
}

#[tokio::test]
async fn settlement_route_requires_an_input() {
    let (router, _engine) = test_router();

    let (status, _) = post_json(&router, "/settlement", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn finalize_then_toggle_then_list_roundtrip() {
    let (router, _engine) = test_router();

    let (status, body) = post_json(
        &router,
        "/groups/g1/finalize",
        json!({
            "expenses": [{"payer_id": "alice", "amount_minor": 9000}],
            "participants": ["alice", "bob", "carol"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let payments = body["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    let payment_id = payments[0]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &router,
        &format!("/groups/g1/payments/{payment_id}/toggle"),
        json!({"desired_is_paid": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scheduled"], true);

    // The optimistic override is visible immediately, whatever the state of
    // the background work.
    let (status, body) = get(&router, &format!("/groups/g1/payments/{payment_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_paid"], true);

    let (status, body) = get(&router, "/groups/g1/payments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_payment_state_is_404() {
    let (router, _engine) = test_router();

    let (status, _) = get(&router, "/groups/g1/payments/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reopen_clears_the_group() {
    let (router, _engine) = test_router();

    let (status, _) = post_json(
        &router,
        "/groups/g1/finalize",
        json!({
            "expenses": [{"payer_id": "alice", "amount_minor": 5000}],
            "participants": ["alice", "bob"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(&router, "/groups/g1/reopen", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&router, "/groups/g1/payments").await;
    assert!(body["payments"].as_array().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dismiss_clears_a_failure_flag() {
    let (router, engine) = test_router();

    let (_, body) = post_json(
        &router,
        "/groups/g1/finalize",
        json!({
            "expenses": [{"payer_id": "alice", "amount_minor": 5000}],
            "participants": ["alice", "bob"]
        }),
    )
    .await;
    let payment_id = body["payments"][0]["id"].as_str().unwrap().to_string();

    // Force a terminal failure through the engine, then dismiss it over
    // the API.
    engine.store().fail_next_updates(2);
    match engine.toggle_paid("g1", &payment_id, true) {
        engine::Toggle::Scheduled { done, .. } => {
            assert_eq!(done.await.unwrap(), engine::WorkOutcome::Failed);
        }
        engine::Toggle::AlreadyInFlight => panic!("expected scheduled work"),
    }
    let (_, body) = get(&router, &format!("/groups/g1/payments/{payment_id}")).await;
    assert_eq!(body["failed"], true);

    let (status, _) = post_json(&router, &format!("/payments/{payment_id}/dismiss"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&router, &format!("/groups/g1/payments/{payment_id}")).await;
    assert_eq!(body["failed"], false);
}
