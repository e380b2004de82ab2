use arcade_crypto::SignerError;
use arcade_registry::RegistryError;
use arcade_types::RequiredField;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Request body is required")]
    MissingBody,

    #[error("Invalid JSON in request body")]
    MalformedRequest(String),

    #[error("Missing required field: {missing}")]
    Validation { missing: RequiredField },

    #[error("Endpoint not found")]
    RouteNotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("signed url rejected: {0}")]
    Forbidden(SignerError),

    #[error("signing failed: {0}")]
    Signing(SignerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(RegistryError),

    #[error("store error: {0}")]
    Store(#[from] arcade_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<RegistryError> for ServerError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Validation { missing } => Self::Validation { missing },
            other => Self::Registry(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingBody | Self::MalformedRequest(_) | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::RouteNotFound | Self::AssetNotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Signing(_)
            | Self::Config(_)
            | Self::Registry(_)
            | Self::Store(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation { .. } => json!({
                "error": self.to_string(),
                "requiredFields": RequiredField::names(),
            }),
            Self::MalformedRequest(detail) => {
                debug!(%detail, "rejecting malformed request body");
                json!({ "error": self.to_string() })
            }
            Self::AssetNotFound(_) => json!({ "error": "Asset not found" }),
            Self::Forbidden(_) => json!({ "error": "Invalid or expired signature" }),
            _ if status.is_server_error() => {
                error!(error = %self, "error processing request");
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
