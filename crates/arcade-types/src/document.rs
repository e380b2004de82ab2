use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{Record, SafeView};
use crate::temporal::RecordId;

/// The single JSON blob holding every record.
///
/// Stored layout: `{ "users": [...], "schema"?: ..., "created_at"?: ... }`.
/// Unknown top-level keys are kept in `extra` and written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Entries in insertion order.
    #[serde(default)]
    pub users: Vec<StoredUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the `users` array.
///
/// Entries in the canonical shape decode as a [`Record`]. Anything else
/// (a string favourite number, a missing `createdAt`, a numeric id) is kept
/// verbatim so rewriting the document never loses or alters it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredUser {
    Record(Record),
    Raw(Value),
}

impl StoredUser {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Raw(_) => None,
        }
    }

    /// The entry's id, rendered as text when stored as another type.
    pub fn id(&self) -> Option<RecordId> {
        match self {
            Self::Record(record) => Some(record.id.clone()),
            Self::Raw(value) => match value.get("id")? {
                Value::String(s) => Some(RecordId::new(s.clone())),
                Value::Null => None,
                other => Some(RecordId::new(other.to_string())),
            },
        }
    }

    pub fn safe_view(&self) -> SafeView {
        match self {
            Self::Record(record) => record.safe_view(),
            Self::Raw(value) => SafeView::from_raw(value),
        }
    }
}

impl From<Record> for StoredUser {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl Document {
    /// An empty document with no records and no annotations.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Ids of every entry that has one, in insertion order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.users.iter().filter_map(StoredUser::id).collect()
    }

    /// Append a record at the end, leaving existing entries untouched.
    pub fn push(&mut self, record: Record) {
        self.users.push(record.into());
    }

    /// Safe views of every entry, in insertion order.
    pub fn safe_views(&self) -> Vec<SafeView> {
        self.users.iter().map(StoredUser::safe_view).collect()
    }
}
