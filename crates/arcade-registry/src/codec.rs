//! Conversion between stored bytes and [`Document`].

use arcade_types::Document;
use bytes::Bytes;

/// Errors from converting between stored bytes and a document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("stored document is not decodable: {0}")]
    Malformed(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Decode stored bytes into a document.
///
/// Absent or blank input is an empty document. Anything else must be a JSON
/// object whose `users` (if present) is an array; individual entries never
/// fail, see [`arcade_types::StoredUser`].
pub fn decode(data: Option<&[u8]>) -> Result<Document, CodecError> {
    let Some(data) = data else {
        return Ok(Document::empty());
    };
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::empty());
    }
    serde_json::from_slice(data).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Encode a document as pretty-printed JSON.
pub fn encode(doc: &Document) -> Result<Bytes, CodecError> {
    serde_json::to_vec_pretty(doc)
        .map(Bytes::from)
        .map_err(|e| CodecError::Serialization(e.to_string()))
}
