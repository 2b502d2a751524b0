use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod balances;
mod payments;
mod server;
mod settlement;

pub mod types {
    pub mod balance {
        pub use api_types::balance::{BalancesRequest, BalancesResponse};
    }

    pub mod settlement {
        pub use api_types::settlement::{SettleRequest, SettleResponse, TransferView};
    }

    pub mod payment {
        pub use api_types::payment::{
            EffectiveStateView, FinalizeRequest, PaymentList, PaymentView, ToggleRequest,
            ToggleResponse,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Remote(_) => StatusCode::BAD_GATEWAY,
        EngineError::NoParticipants(_) | EngineError::InvalidAmount(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Remote(remote_err) => {
            tracing::error!("remote store error: {remote_err}");
            "remote store unavailable".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::RemoteError;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res =
            ServerError::from(EngineError::NoParticipants("empty".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn remote_error_maps_to_502() {
        let res = ServerError::from(EngineError::Remote(RemoteError::Unavailable(
            "down".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
