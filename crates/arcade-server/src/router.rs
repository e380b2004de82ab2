use std::sync::Arc;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::assets;
use crate::error::{ServerError, ServerResult};
use crate::handler;
use crate::state::AppState;

const USER_METHODS: &str = "GET, POST, OPTIONS";
const ASSET_METHODS: &str = "GET, OPTIONS";

/// Build the axum router with all arcade endpoints.
///
/// Every response, including errors, preflights and handler panics, carries
/// the same cross-origin headers naming the one configured origin.
pub fn build_router(state: Arc<AppState>) -> ServerResult<Router> {
    let origin = HeaderValue::from_str(&state.config.allowed_origin)
        .map_err(|e| ServerError::Config(format!("allowed origin: {e}")))?;
    let asset_methods = SetResponseHeaderLayer::overriding(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ASSET_METHODS),
    );

    let router = Router::new()
        .route(
            "/users",
            get(handler::list_users)
                .post(handler::add_user)
                .options(handler::preflight)
                .fallback(handler::route_not_found),
        )
        .route(
            "/images",
            get(assets::issue_urls)
                .options(handler::preflight)
                .fallback(handler::method_not_allowed)
                .layer(asset_methods.clone()),
        )
        .route(
            "/assets/*key",
            get(assets::fetch_asset)
                .options(handler::preflight)
                .fallback(handler::method_not_allowed)
                .layer(asset_methods),
        )
        .fallback(handler::fallback)
        .layer(CatchPanicLayer::custom(handler::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(ACCESS_CONTROL_ALLOW_ORIGIN, origin))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(USER_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("false"),
        ))
        .with_state(state);
    Ok(router)
}
