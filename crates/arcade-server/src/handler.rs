use std::any::Any;
use std::sync::Arc;

use arcade_types::{SafeView, UserInput};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<SafeView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub message: &'static str,
    pub user: SafeView,
}

/// `GET /users`: every record, favourite numbers stripped.
pub async fn list_users(State(state): State<Arc<AppState>>) -> ServerResult<Json<UsersResponse>> {
    let users = state.registry.list_safe().await?;
    info!("returning {} users", users.len());
    Ok(Json(UsersResponse {
        count: users.len(),
        users,
    }))
}

/// `POST /users`: validate and append one record.
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<UserCreatedResponse>)> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::MissingBody);
    }
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| ServerError::MalformedRequest(e.to_string()))?;
    if !value.is_object() {
        return Err(ServerError::MalformedRequest("body is not a JSON object".into()));
    }
    let input: UserInput =
        serde_json::from_value(value).map_err(|e| ServerError::MalformedRequest(e.to_string()))?;

    let user = state.registry.append(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User added successfully",
            user,
        }),
    ))
}

/// Browser preflight: always 200 with an empty body.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Unmatched method on `/users`.
pub async fn route_not_found() -> ServerError {
    ServerError::RouteNotFound
}

/// Unmatched method on the asset endpoints.
pub async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}

/// Response for a handler that panicked.
pub fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    ServerError::Internal("handler panicked".into()).into_response()
}

/// Unmatched path: preflight for `OPTIONS`, 404 otherwise.
pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        ServerError::RouteNotFound.into_response()
    }
}
