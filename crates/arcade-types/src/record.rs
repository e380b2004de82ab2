use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::temporal::RecordId;

/// One submitted personal-information entry.
///
/// Records are created only by appending to the [`Document`](crate::Document)
/// and are never mutated or removed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub first_name: String,
    pub surname: String,
    /// Calendar date as submitted, e.g. `2000-01-01`. Not parsed.
    pub birthday: String,
    /// Chosen from a fixed palette client-side; not checked here.
    pub favourite_colour: String,
    /// Constrained to 1..=1000 client-side; not checked here.
    /// Never leaves the server once stored.
    pub favourite_number: i64,
    pub created_at: String,
    /// Keys written by other tooling, kept as stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Project to the externally visible shape.
    pub fn safe_view(&self) -> SafeView {
        SafeView::from(self)
    }
}

/// A stored entry with the favourite number stripped.
///
/// This is the only representation handed back to callers. Keys beyond the
/// known ones pass through in `extra`; empty fields are left out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeView {
    #[serde(default, skip_serializing_if = "RecordId::is_empty")]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub surname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub birthday: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub favourite_colour: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SafeView {
    /// Safe view of a stored entry that is not in the [`Record`] shape.
    ///
    /// Known fields are rendered as text whatever their stored type; a
    /// non-object entry gives an empty view.
    pub fn from_raw(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        let mut extra = object.clone();
        extra.remove("favouriteNumber");
        let id = take_text(&mut extra, "id");
        let first_name = take_text(&mut extra, "firstName");
        let surname = take_text(&mut extra, "surname");
        let birthday = take_text(&mut extra, "birthday");
        let favourite_colour = take_text(&mut extra, "favouriteColour");
        let created_at = take_text(&mut extra, "createdAt");
        Self {
            id: RecordId::new(id),
            first_name,
            surname,
            birthday,
            favourite_colour,
            created_at,
            extra,
        }
    }
}

fn take_text(object: &mut Map<String, Value>, key: &str) -> String {
    match object.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl From<&Record> for SafeView {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            first_name: record.first_name.clone(),
            surname: record.surname.clone(),
            birthday: record.birthday.clone(),
            favourite_colour: record.favourite_colour.clone(),
            created_at: record.created_at.clone(),
            extra: record.extra.clone(),
        }
    }
}

/// Submission payload for a new record, as received.
///
/// Every field is optional here; presence is checked by the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub favourite_colour: Option<String>,
    #[serde(default)]
    pub favourite_number: Option<i64>,
}

impl UserInput {
    /// The first required field that is absent, blank, or zero.
    pub fn first_missing(&self) -> Option<RequiredField> {
        RequiredField::ALL.into_iter().find(|field| !self.has(*field))
    }

    fn has(&self, field: RequiredField) -> bool {
        let text = |value: &Option<String>| value.as_deref().is_some_and(|s| !s.trim().is_empty());
        match field {
            RequiredField::FirstName => text(&self.first_name),
            RequiredField::Surname => text(&self.surname),
            RequiredField::Birthday => text(&self.birthday),
            RequiredField::FavouriteColour => text(&self.favourite_colour),
            RequiredField::FavouriteNumber => self.favourite_number.is_some_and(|n| n != 0),
        }
    }
}

/// Fields a submission must carry, in validation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequiredField {
    FirstName,
    Surname,
    Birthday,
    FavouriteColour,
    FavouriteNumber,
}

impl RequiredField {
    pub const ALL: [RequiredField; 5] = [
        Self::FirstName,
        Self::Surname,
        Self::Birthday,
        Self::FavouriteColour,
        Self::FavouriteNumber,
    ];

    /// Wire name of the field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::Surname => "surname",
            Self::Birthday => "birthday",
            Self::FavouriteColour => "favouriteColour",
            Self::FavouriteNumber => "favouriteNumber",
        }
    }

    /// Wire names of every required field, in order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(RequiredField::as_str).collect()
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
