use arcade_types::RequiredField;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Missing required field: {missing}")]
    Validation { missing: RequiredField },

    #[error("codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    #[error("store error: {0}")]
    Store(#[from] arcade_store::StoreError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
