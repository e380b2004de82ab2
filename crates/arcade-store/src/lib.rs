//! Whole-object blob storage for the arcade user registry.
//!
//! A store holds named objects in a single bucket. Every call reads or
//! replaces one whole object; there are no partial reads, appends, or
//! conditional writes.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsDocumentStore`] -- one directory per bucket, one file per key
//!
//! # Design Rules
//!
//! 1. An absent object is `Ok(None)`, never an error.
//! 2. Every other failure is returned as-is; nothing is masked as empty.
//! 3. A write replaces the whole object or leaves the old one in place.
//! 4. The store never interprets object contents.

pub mod error;
pub mod fs;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsDocumentStore;
pub use key::validate_key;
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
