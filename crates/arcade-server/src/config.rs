use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use arcade_crypto::UrlSigner;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://edfenergy-adameaton.github.io";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_URL_EXPIRES_SECS: u64 = 3600;

#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bucket holding the user document and image assets.
    pub bucket: String,
    /// Key of the user document inside the bucket.
    pub document_key: String,
    /// The single origin allowed to call the API from a browser.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Directory under which buckets live on disk.
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,
    /// Asset keys offered by `GET /images`.
    #[serde(default = "default_image_keys")]
    pub image_keys: Vec<String>,
    #[serde(default = "default_url_expires_secs")]
    pub url_expires_secs: u64,
    /// Externally reachable base URL used in signed links.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// 64 hex characters. A random secret is used when absent.
    #[serde(default)]
    pub signing_secret: Option<String>,
}

fn default_allowed_origin() -> String {
    DEFAULT_ALLOWED_ORIGIN.to_string()
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_image_keys() -> Vec<String> {
    vec!["chess.png".into(), "frog.png".into()]
}

fn default_url_expires_secs() -> u64 {
    DEFAULT_URL_EXPIRES_SECS
}

impl ServerConfig {
    /// Config with the given bucket and document key, everything else default.
    pub fn new(bucket: impl Into<String>, document_key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            document_key: document_key.into(),
            allowed_origin: default_allowed_origin(),
            bind_addr: default_bind_addr(),
            store_root: default_store_root(),
            image_keys: default_image_keys(),
            url_expires_secs: default_url_expires_secs(),
            public_base_url: None,
            signing_secret: None,
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> ServerResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name)
                .ok_or_else(|| ServerError::Config(format!("{name} environment variable not set")))
        };

        let mut config = Self::new(required("S3_BUCKET")?, required("DB_KEY")?);

        match var("CORS_ORIGIN") {
            Some(origin) => config.allowed_origin = origin,
            None => info!("CORS_ORIGIN not set, using default: {DEFAULT_ALLOWED_ORIGIN}"),
        }
        if let Some(addr) = var("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("invalid BIND_ADDR {addr:?}: {e}")))?;
        }
        if let Some(root) = var("STORE_ROOT") {
            config.store_root = PathBuf::from(root);
        }
        if let Some(keys) = var("IMAGE_KEYS") {
            config.image_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(secs) = var("URL_EXPIRES_SECS") {
            config.url_expires_secs = secs
                .parse()
                .map_err(|e| {
                    ServerError::Config(format!("invalid URL_EXPIRES_SECS {secs:?}: {e}"))
                })?;
        }
        config.public_base_url = var("PUBLIC_BASE_URL");
        config.signing_secret = var("URL_SIGNING_SECRET");

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| ServerError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Reject configs that cannot serve requests.
    pub fn validate(&self) -> ServerResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(ServerError::Config("bucket must not be empty".into()));
        }
        arcade_store::validate_key(&self.document_key)
            .map_err(|e| ServerError::Config(format!("document key: {e}")))?;
        for key in &self.image_keys {
            arcade_store::validate_key(key)
                .map_err(|e| ServerError::Config(format!("image key: {e}")))?;
        }
        if self.allowed_origin.trim().is_empty() {
            return Err(ServerError::Config("allowed origin must not be empty".into()));
        }
        if self.url_expires_secs == 0 {
            return Err(ServerError::Config("url expiry must be positive".into()));
        }
        Ok(())
    }

    /// Base URL for signed asset links.
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind_addr),
        }
    }

    /// Build the URL signer from the configured secret, or a random one.
    pub fn signer(&self) -> ServerResult<UrlSigner> {
        match &self.signing_secret {
            Some(secret) => UrlSigner::from_hex(secret)
                .map_err(|e| ServerError::Config(format!("URL_SIGNING_SECRET: {e}"))),
            None => {
                warn!("no signing secret configured, signed urls will not survive a restart");
                Ok(UrlSigner::generate())
            }
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bucket", &self.bucket)
            .field("document_key", &self.document_key)
            .field("allowed_origin", &self.allowed_origin)
            .field("bind_addr", &self.bind_addr)
            .field("store_root", &self.store_root)
            .field("image_keys", &self.image_keys)
            .field("url_expires_secs", &self.url_expires_secs)
            .field("public_base_url", &self.public_base_url)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
