//! Job records and the collections built from them.
//!
//! A [`Record`] is identified by its `id` alone; every other field is
//! informational. [`Snapshot`] is everything known at one point in time and
//! [`Delta`] is the part of a snapshot that was not known before.

use serde::{Deserialize, Serialize};

/// One job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Record {
    /// Identifier assigned by the source system
    pub id: String,

    pub title: String,

    pub location: String,

    pub category: String,

    /// Posting time, already in canonical display form
    pub date: String,

    /// Link to the full posting
    pub url: String,
}

impl Record {
    /// Create a record, trimming surrounding whitespace from every field.
    pub fn new(
        id: impl AsRef<str>,
        title: impl AsRef<str>,
        location: impl AsRef<str>,
        category: impl AsRef<str>,
        date: impl AsRef<str>,
        url: impl AsRef<str>,
    ) -> Self {
        Self {
            id: id.as_ref().trim().to_string(),
            title: title.as_ref().trim().to_string(),
            location: location.as_ref().trim().to_string(),
            category: category.as_ref().trim().to_string(),
            date: date.as_ref().trim().to_string(),
            url: url.as_ref().trim().to_string(),
        }
    }
}

/// All jobs known to exist at one point in time.
///
/// Serialized as a bare JSON array of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<Record>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.0
    }

    /// Ids in snapshot order (duplicates included).
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|r| r.id.as_str())
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.0.iter().any(|r| r.id == id)
    }

    pub fn push(&mut self, record: Record) {
        self.0.push(record);
    }
}

impl From<Vec<Record>> for Snapshot {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl FromIterator<Record> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Snapshot {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Records of the current snapshot whose id was absent from the stored one.
///
/// Produced fresh every run and never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta(Vec<Record>);

impl Delta {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.0
    }
}

impl From<Vec<Record>> for Delta {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl FromIterator<Record> for Delta {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
