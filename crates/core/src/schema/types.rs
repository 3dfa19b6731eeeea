use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapping::{MappingError, Result};

/// Scalar attribute types a key attribute may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl ScalarAttributeType {
    /// The single-letter wire code (`S`, `N` or `B`).
    pub fn code(self) -> &'static str {
        match self {
            ScalarAttributeType::String => "S",
            ScalarAttributeType::Number => "N",
            ScalarAttributeType::Binary => "B",
        }
    }
}

impl fmt::Display for ScalarAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The sort-key half of a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeKey {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: ScalarAttributeType,
}

/// Partition key plus optional sort key.
///
/// An empty `hash_key` means the key was declared without a hash key; the
/// mapping validation reports it as missing instead of rejecting it here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub hash_key: String,
    pub hash_key_type: ScalarAttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_key: Option<RangeKey>,
}

impl PrimaryKey {
    /// A hash-only key.
    pub fn new(hash_key: impl Into<String>, hash_key_type: ScalarAttributeType) -> Self {
        Self {
            hash_key: hash_key.into(),
            hash_key_type,
            range_key: None,
        }
    }

    /// A composite hash + range key.
    pub fn with_range(
        hash_key: impl Into<String>,
        hash_key_type: ScalarAttributeType,
        range_key: impl Into<String>,
        range_key_type: ScalarAttributeType,
    ) -> Self {
        Self {
            hash_key: hash_key.into(),
            hash_key_type,
            range_key: Some(RangeKey {
                name: range_key.into(),
                key_type: range_key_type,
            }),
        }
    }

    pub fn has_hash_key(&self) -> bool {
        !self.hash_key.is_empty()
    }

    pub fn range_key_name(&self) -> Option<&str> {
        self.range_key.as_ref().map(|rk| rk.name.as_str())
    }

    pub fn range_key_type(&self) -> Option<ScalarAttributeType> {
        self.range_key.as_ref().map(|rk| rk.key_type)
    }
}

/// Secondary index flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    /// Global secondary index.
    Gsi,
    /// Local secondary index; shares the table's hash key.
    Lsi,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Gsi => f.write_str("GSI"),
            IndexKind::Lsi => f.write_str("LSI"),
        }
    }
}

/// An alternate key schema declared on a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondaryIndex {
    pub name: String,
    pub kind: IndexKind,
    primary_key: PrimaryKey,
}

impl SecondaryIndex {
    pub fn new(name: impl Into<String>, kind: IndexKind, primary_key: PrimaryKey) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key,
        }
    }

    /// Returns the index key, failing when the index was declared without a
    /// hash key.
    pub fn primary_key(&self) -> Result<&PrimaryKey> {
        if !self.primary_key.has_hash_key() {
            return Err(MappingError::MissingKey(format!(
                "hash key is required on {} {}",
                self.kind, self.name
            )));
        }
        Ok(&self.primary_key)
    }

    /// The declared key without the consistency check. Physical-table
    /// self-validation needs the raw declaration to report the observed type.
    pub fn declared_primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }
}

/// A table: name, primary key and ordered secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub primary_key: PrimaryKey,
    #[serde(default)]
    pub secondary_indexes: Vec<SecondaryIndex>,
}

impl TableDescription {
    pub fn builder(name: impl Into<String>) -> TableDescriptionBuilder {
        TableDescriptionBuilder::new(name)
    }

    /// Looks up a secondary index of either kind by name.
    pub fn secondary_index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.secondary_indexes.iter().find(|si| si.name == name)
    }

    pub fn gsi(&self, name: &str) -> Option<&SecondaryIndex> {
        self.secondary_index(name)
            .filter(|si| si.kind == IndexKind::Gsi)
    }

    pub fn lsi(&self, name: &str) -> Option<&SecondaryIndex> {
        self.secondary_index(name)
            .filter(|si| si.kind == IndexKind::Lsi)
    }

    pub fn gsis(&self) -> impl Iterator<Item = &SecondaryIndex> {
        self.secondary_indexes
            .iter()
            .filter(|si| si.kind == IndexKind::Gsi)
    }

    pub fn lsis(&self) -> impl Iterator<Item = &SecondaryIndex> {
        self.secondary_indexes
            .iter()
            .filter(|si| si.kind == IndexKind::Lsi)
    }
}

/// Fluent construction of a [`TableDescription`].
#[derive(Debug, Clone)]
pub struct TableDescriptionBuilder {
    name: String,
    primary_key: Option<PrimaryKey>,
    secondary_indexes: Vec<SecondaryIndex>,
}

impl TableDescriptionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            secondary_indexes: Vec::new(),
        }
    }

    /// Sets a hash-only table key.
    pub fn hash_key(mut self, name: impl Into<String>, key_type: ScalarAttributeType) -> Self {
        self.primary_key = Some(PrimaryKey::new(name, key_type));
        self
    }

    /// Sets a composite table key.
    pub fn hash_and_range_key(
        mut self,
        hash_key: impl Into<String>,
        hash_key_type: ScalarAttributeType,
        range_key: impl Into<String>,
        range_key_type: ScalarAttributeType,
    ) -> Self {
        self.primary_key = Some(PrimaryKey::with_range(
            hash_key,
            hash_key_type,
            range_key,
            range_key_type,
        ));
        self
    }

    pub fn primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    pub fn add_secondary_index(
        mut self,
        name: impl Into<String>,
        kind: IndexKind,
        primary_key: PrimaryKey,
    ) -> Self {
        self.secondary_indexes
            .push(SecondaryIndex::new(name, kind, primary_key));
        self
    }

    /// Builds the description. A builder without a key yields an empty hash
    /// key of type S, which mapping validation reports as missing.
    pub fn build(self) -> TableDescription {
        TableDescription {
            name: self.name,
            primary_key: self
                .primary_key
                .unwrap_or_else(|| PrimaryKey::new("", ScalarAttributeType::String)),
            secondary_indexes: self.secondary_indexes,
        }
    }
}
