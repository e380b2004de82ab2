use rand::RngCore;

/// Domain tag prepended to every signed message.
const DOMAIN: &str = "arcade-url-v1";

/// Issues and checks time-limited retrieval URLs.
pub struct UrlSigner {
    secret: [u8; 32],
}

/// A signed URL and the UNIX time (seconds) it stops working.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: i64,
}

impl UrlSigner {
    /// Create from a raw 32-byte secret.
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Generate a signer with a random secret.
    ///
    /// URLs signed by it stop verifying once the process exits.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { secret }
    }

    /// Parse a secret given as 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(s.trim()).map_err(|_| SignerError::InvalidSecret)?;
        let secret: [u8; 32] = bytes.try_into().map_err(|_| SignerError::InvalidSecret)?;
        Ok(Self { secret })
    }

    fn mac(&self, bucket: &str, key: &str, expires_at: i64) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.secret);
        hasher.update(DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(bucket.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires_at.to_string().as_bytes());
        hasher.finalize()
    }

    /// Hex signature for `bucket/key` valid until `expires_at`.
    pub fn sign(&self, bucket: &str, key: &str, expires_at: i64) -> String {
        self.mac(bucket, key, expires_at).to_hex().to_string()
    }

    /// Build `{base_url}/assets/{key}?expires=..&signature=..`.
    pub fn presign(
        &self,
        base_url: &str,
        bucket: &str,
        key: &str,
        expires_at: i64,
    ) -> Result<PresignedUrl, SignerError> {
        if key.is_empty() {
            return Err(SignerError::Malformed("empty key".into()));
        }
        let base = base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(SignerError::Malformed("empty base url".into()));
        }
        let signature = self.sign(bucket, key, expires_at);
        Ok(PresignedUrl {
            url: format!(
                "{base}/assets/{}?expires={expires_at}&signature={signature}",
                encode_key_path(key)
            ),
            expires_at,
        })
    }

    /// Check a signature presented at time `now` (UNIX seconds).
    ///
    /// The comparison is constant-time.
    pub fn verify(
        &self,
        bucket: &str,
        key: &str,
        expires_at: i64,
        signature: &str,
        now: i64,
    ) -> Result<(), SignerError> {
        let presented = hex::decode(signature)
            .ok()
            .and_then(|b| <[u8; 32]>::try_from(b).ok())
            .ok_or(SignerError::BadSignature)?;
        if self.mac(bucket, key, expires_at) != blake3::Hash::from(presented) {
            return Err(SignerError::BadSignature);
        }
        if now >= expires_at {
            return Err(SignerError::Expired { expires_at });
        }
        Ok(())
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UrlSigner(<redacted>)")
    }
}

/// Percent-encode a `/`-separated key for use in a URL path.
///
/// Unreserved characters and `/` pass through.
pub fn encode_key_path(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Errors from URL signing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing secret must be 64 hex characters")]
    InvalidSecret,
    #[error("cannot sign: {0}")]
    Malformed(String),
    #[error("signature does not match")]
    BadSignature,
    #[error("signed url expired at {expires_at}")]
    Expired { expires_at: i64 },
}
