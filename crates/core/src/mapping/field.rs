use serde::Serialize;

use crate::schema::ScalarAttributeType;

/// An attribute name together with its scalar type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: ScalarAttributeType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: ScalarAttributeType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Whether a mapping serves the table's own key or a secondary index's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexContext {
    Table,
    SecondaryIndex,
}

/// One virtual-to-physical field correspondence.
///
/// For [`IndexContext::Table`] the index names are the virtual and physical
/// table names; otherwise they are the secondary index names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldMapping {
    source: Field,
    target: Field,
    virtual_index_name: String,
    physical_index_name: String,
    index_context: IndexContext,
    is_context_hash_key: bool,
}

impl FieldMapping {
    pub(crate) fn new(
        source: Field,
        target: Field,
        virtual_index_name: impl Into<String>,
        physical_index_name: impl Into<String>,
        index_context: IndexContext,
        is_context_hash_key: bool,
    ) -> Self {
        Self {
            source,
            target,
            virtual_index_name: virtual_index_name.into(),
            physical_index_name: physical_index_name.into(),
            index_context,
            is_context_hash_key,
        }
    }

    /// The virtual field.
    pub fn source(&self) -> &Field {
        &self.source
    }

    /// The physical field.
    pub fn target(&self) -> &Field {
        &self.target
    }

    pub fn virtual_index_name(&self) -> &str {
        &self.virtual_index_name
    }

    pub fn physical_index_name(&self) -> &str {
        &self.physical_index_name
    }

    pub fn index_context(&self) -> IndexContext {
        self.index_context
    }

    /// True when the field is the hash key of its context (table or index).
    pub fn is_context_hash_key(&self) -> bool {
        self.is_context_hash_key
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::mapping;
    use super::*;
    use crate::schema::ScalarAttributeType::{Number as N, String as S};

    #[test]
    fn test_equality_covers_every_field() {
        let base = mapping(("v", S), ("p", S), "vt", "pt", IndexContext::Table, true);
        assert_eq!(
            base,
            mapping(("v", S), ("p", S), "vt", "pt", IndexContext::Table, true)
        );
        assert_ne!(
            base,
            mapping(("v", S), ("p", S), "vt", "pt", IndexContext::Table, false)
        );
        assert_ne!(
            base,
            mapping(("v", S), ("p", S), "vt", "pt", IndexContext::SecondaryIndex, true)
        );
        assert_ne!(
            base,
            mapping(("v", N), ("p", S), "vt", "pt", IndexContext::Table, true)
        );
        assert_ne!(
            base,
            mapping(("v", S), ("p", S), "vi", "pt", IndexContext::Table, true)
        );
    }
}
