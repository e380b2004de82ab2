//! HTTP server for arcade.
//!
//! Serves the user registry (`/users`), pre-signed image URLs (`/images`),
//! and the signed asset retrieval they point at (`/assets/*key`). Every
//! response carries fixed cross-origin headers for a single allowed origin.

pub mod assets;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use assets::{signed_image_urls, ImageUrlsResponse};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::ArcadeServer;
pub use state::AppState;
