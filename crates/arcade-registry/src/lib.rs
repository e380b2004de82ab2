//! User registry service for arcade.
//!
//! Every record lives in one JSON document in the backing store. Listing
//! reads that document and strips favourite numbers; appending reads it,
//! adds one record at the end, and writes the whole document back.
//!
//! The append is a plain read-modify-write with no version check: two
//! concurrent appends can race and the later write wins.

pub mod codec;
pub mod error;
pub mod registry;

pub use codec::CodecError;
pub use error::{RegistryError, RegistryResult};
pub use registry::UserRegistry;

// Re-export key types
pub use arcade_types::{Document, Record, RequiredField, SafeView, StoredUser, UserInput};
