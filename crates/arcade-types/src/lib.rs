//! Foundation types for the arcade user registry.
//!
//! This crate provides the data model shared by the store, registry, and
//! server crates. Every other arcade crate depends on `arcade-types`.
//!
//! # Key Types
//!
//! - [`Record`]: One submitted personal-information entry, immutable once stored
//! - [`SafeView`]: A record without its favourite number, the only shape ever returned
//! - [`UserInput`]: Unvalidated submission payload
//! - [`Document`]: The single JSON blob holding every record
//! - [`StoredUser`]: One entry of the document, typed or kept verbatim
//! - [`RecordId`]: Millisecond-based record identifier
//! - [`Clock`]: Injectable wall clock used for ids and creation timestamps

pub mod document;
pub mod record;
pub mod temporal;

pub use document::{Document, StoredUser};
pub use record::{Record, RequiredField, SafeView, UserInput};
pub use temporal::{format_timestamp, Clock, FixedClock, RecordId, SystemClock};
