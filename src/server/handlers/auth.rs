//! Storage authorization endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::super::AppState;
use super::helpers::message_response;
use crate::cloud::AuthError;

/// Query params the provider sends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Authorization status response.
#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub authorized: bool,
}

/// Redirect to the provider's consent page.
pub async fn authorize(State(state): State<AppState>) -> Response {
    match state.auth.begin_login().await {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e @ AuthError::NotConfigured(_)) => {
            message_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => message_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Finish the login started by [`authorize`].
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = params.error {
        return message_response(
            StatusCode::BAD_REQUEST,
            format!("Authorization denied: {}", error),
        );
    }

    let (Some(code), Some(login_state)) = (params.code, params.state) else {
        return message_response(StatusCode::BAD_REQUEST, "Missing authorization code.");
    };

    match state.auth.complete_login(&code, &login_state).await {
        Ok(()) => message_response(StatusCode::OK, "Authentication successful!"),
        Err(e @ AuthError::UnknownState) => {
            message_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => message_response(
            StatusCode::BAD_GATEWAY,
            format!("Authentication failed: {}", e),
        ),
    }
}

pub async fn auth_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(AuthStatusResponse {
        authorized: state.auth.is_authorized().await,
    })
}

/// Forget the current storage authorization.
pub async fn logout(State(state): State<AppState>) -> Response {
    state.auth.logout().await;
    message_response(StatusCode::OK, "Logged out.")
}
