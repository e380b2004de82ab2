//! URL signing for arcade asset retrieval.
//!
//! A pre-signed URL grants read access to one object in one bucket until
//! an expiry time. The grant is a keyed BLAKE3 MAC over the bucket, key,
//! and expiry, so the server that issued it can check it without storing
//! anything.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod signer;

pub use signer::{encode_key_path, PresignedUrl, SignerError, UrlSigner};
