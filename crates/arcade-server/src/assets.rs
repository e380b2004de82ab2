//! Pre-signed image URLs and the retrieval endpoint they point at.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use arcade_crypto::SignerError;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrlsResponse {
    pub image_urls: BTreeMap<String, String>,
    pub expires_in: u64,
}

/// `GET /images`: a signed URL for each configured asset that exists.
pub async fn issue_urls(State(state): State<Arc<AppState>>) -> Json<ImageUrlsResponse> {
    Json(signed_image_urls(&state).await)
}

/// Sign every configured image key.
///
/// Assets that are missing or fail individually are logged and left out;
/// the result still holds whatever could be signed.
pub async fn signed_image_urls(state: &AppState) -> ImageUrlsResponse {
    let expires_in = state.config.url_expires_secs;
    let expires_at = state
        .clock
        .now()
        .timestamp()
        .saturating_add(i64::try_from(expires_in).unwrap_or(i64::MAX));

    let mut image_urls = BTreeMap::new();
    for key in &state.config.image_keys {
        match presign_one(state, key, expires_at).await {
            Ok(url) => {
                info!(key = %key, "generated signed url");
                image_urls.insert(key.clone(), url);
            }
            Err(e) => warn!(key = %key, error = %e, "failed to generate signed url, skipping"),
        }
    }

    ImageUrlsResponse {
        image_urls,
        expires_in,
    }
}

async fn presign_one(state: &AppState, key: &str, expires_at: i64) -> ServerResult<String> {
    if !state.store.exists(key).await? {
        return Err(ServerError::AssetNotFound(key.to_string()));
    }
    let signed = state
        .signer
        .presign(
            &state.config.public_base_url(),
            &state.config.bucket,
            key,
            expires_at,
        )
        .map_err(ServerError::Signing)?;
    Ok(signed.url)
}

#[derive(Debug, Default, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<String>,
    pub signature: Option<String>,
}

/// `GET /assets/*key`: serve an asset to the holder of a valid signed URL.
pub async fn fetch_asset(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> ServerResult<Response> {
    let key = key.trim_start_matches('/').to_string();
    let expires_at = query
        .expires
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(ServerError::Forbidden(SignerError::BadSignature))?;
    let signature = query
        .signature
        .as_deref()
        .ok_or(ServerError::Forbidden(SignerError::BadSignature))?;

    let now = state.clock.now().timestamp();
    state
        .signer
        .verify(&state.config.bucket, &key, expires_at, signature, now)
        .map_err(ServerError::Forbidden)?;

    let bytes = state
        .store
        .fetch(&key)
        .await?
        .ok_or_else(|| ServerError::AssetNotFound(key.clone()))?;
    info!(key = %key, bytes = bytes.len(), "serving asset");
    Ok(([(CONTENT_TYPE, content_type_for(&key))], bytes).into_response())
}

/// Content type from the file extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
