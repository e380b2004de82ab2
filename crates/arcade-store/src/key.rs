use crate::error::{StoreError, StoreResult};

/// Check that `key` names an object inside the bucket.
///
/// Keys are `/`-separated relative paths: non-empty, no leading slash,
/// no empty, `.` or `..` segments, no NUL bytes.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let invalid = |reason| {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason,
        })
    };
    if key.is_empty() {
        return invalid("empty key");
    }
    if key.starts_with('/') {
        return invalid("absolute key");
    }
    if key.contains('\0') {
        return invalid("NUL byte");
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return invalid("empty or relative path segment");
    }
    Ok(())
}
