//! Translation of whole items between virtual and physical form.
//!
//! Mapped attributes move to their physical names, hash-key values gain the
//! `<context><d><table><d>` qualifier. Unmapped attributes keep their names,
//! except that a name colliding with a physical key attribute, or already
//! starting with [`ESCAPE_PREFIX`], gets one extra `~` in front.

use crate::attribute::{AttributeValue, Item};
use crate::request::{AttributeUpdate, UpdateAction};

use super::field::{FieldMapping, IndexContext};
use super::table::TableMapping;
use super::{MappingError, Result};

/// Prepended to unmapped attribute names that would otherwise be ambiguous.
pub const ESCAPE_PREFIX: char = '~';

/// Borrowed view translating items through a [`TableMapping`].
#[derive(Debug, Clone, Copy)]
pub struct ItemMapper<'a> {
    mapping: &'a TableMapping,
}

impl<'a> ItemMapper<'a> {
    pub fn new(mapping: &'a TableMapping) -> Self {
        Self { mapping }
    }

    /// Virtual item to physical item for the given tenant context.
    pub fn apply(&self, context: &str, item: &Item) -> Result<Item> {
        self.check_context(context)?;
        let field_mappings = self.mapping.all_virtual_to_physical_field_mappings();

        let mut physical = Item::with_capacity(item.len());
        for (name, value) in item {
            match field_mappings.get(name) {
                Some(mappings) => {
                    for mapping in mappings {
                        let mapped = self.apply_field(context, mapping, value)?;
                        physical.insert(mapping.target().name.clone(), mapped);
                    }
                }
                None => {
                    physical.insert(self.escape(name), value.clone());
                }
            }
        }
        Ok(physical)
    }

    /// Virtual primary key to physical primary key.
    ///
    /// Only the table key mappings apply; every virtual key attribute must be
    /// present and no other attribute is allowed.
    pub fn apply_key(&self, context: &str, key: &Item) -> Result<Item> {
        self.check_context(context)?;

        let mut physical = Item::with_capacity(key.len());
        for mapping in self.mapping.table_field_mappings() {
            let source = &mapping.source().name;
            let value = key.get(source).ok_or_else(|| {
                MappingError::Codec(format!("key is missing attribute {source}"))
            })?;
            physical.insert(
                mapping.target().name.clone(),
                self.apply_field(context, mapping, value)?,
            );
        }

        if let Some(extra) = key.keys().find(|name| {
            !self
                .mapping
                .table_field_mappings()
                .any(|mapping| &mapping.source().name == *name)
        }) {
            return Err(MappingError::Codec(format!(
                "attribute {extra} is not part of the key of table {}",
                self.mapping.virtual_table().name
            )));
        }
        Ok(physical)
    }

    /// Rewrites attribute updates. Mapped attributes fan out to every physical
    /// target; table key attributes cannot be updated.
    pub fn apply_updates(
        &self,
        context: &str,
        updates: &[AttributeUpdate],
    ) -> Result<Vec<AttributeUpdate>> {
        self.check_context(context)?;
        let field_mappings = self.mapping.all_virtual_to_physical_field_mappings();

        let mut physical = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(mappings) = field_mappings.get(&update.attribute) else {
                physical.push(AttributeUpdate {
                    attribute: self.escape(&update.attribute),
                    action: update.action.clone(),
                });
                continue;
            };
            if mappings
                .iter()
                .any(|mapping| mapping.index_context() == IndexContext::Table)
            {
                return Err(MappingError::Codec(format!(
                    "key attribute {} of table {} cannot be updated",
                    update.attribute,
                    self.mapping.virtual_table().name
                )));
            }
            for mapping in mappings {
                let action = match &update.action {
                    UpdateAction::Put(value) => {
                        UpdateAction::Put(self.apply_field(context, mapping, value)?)
                    }
                    UpdateAction::Delete => UpdateAction::Delete,
                };
                physical.push(AttributeUpdate {
                    attribute: mapping.target().name.clone(),
                    action,
                });
            }
        }
        Ok(physical)
    }

    /// Physical item back to the virtual item.
    pub fn reverse(&self, item: &Item) -> Result<Item> {
        let mut virtual_item = Item::with_capacity(item.len());

        for (name, mapping) in self.mapping.all_virtual_to_physical_field_mappings_deduped() {
            if let Some(value) = item.get(&mapping.target().name) {
                virtual_item.insert(name.clone(), self.reverse_field(mapping, value)?);
            }
        }

        for (name, value) in item {
            if self.mapping.is_reserved_physical_field(name) {
                continue;
            }
            virtual_item.insert(unescape(name).to_string(), value.clone());
        }
        Ok(virtual_item)
    }

    pub(crate) fn apply_field(
        &self,
        context: &str,
        mapping: &FieldMapping,
        value: &AttributeValue,
    ) -> Result<AttributeValue> {
        if !mapping.is_context_hash_key() {
            return Ok(value.clone());
        }
        let raw = value.as_s().ok_or_else(|| {
            MappingError::Codec(format!(
                "attribute {} must be of type S to be used as a hash key, found {}",
                mapping.source().name,
                value.type_code()
            ))
        })?;
        Ok(AttributeValue::S(self.mapping.field_prefix().qualify(
            context,
            &self.mapping.virtual_table().name,
            raw,
        )))
    }

    fn reverse_field(&self, mapping: &FieldMapping, value: &AttributeValue) -> Result<AttributeValue> {
        if !mapping.is_context_hash_key() {
            return Ok(value.clone());
        }
        let qualified = value.as_s().ok_or_else(|| {
            MappingError::Codec(format!(
                "physical attribute {} must be of type S, found {}",
                mapping.target().name,
                value.type_code()
            ))
        })?;
        let parsed = self.mapping.field_prefix().parse(qualified)?;
        Ok(AttributeValue::S(parsed.value.to_string()))
    }

    pub(crate) fn escape(&self, name: &str) -> String {
        if self.mapping.is_reserved_physical_field(name) || name.starts_with(ESCAPE_PREFIX) {
            format!("{ESCAPE_PREFIX}{name}")
        } else {
            name.to_string()
        }
    }

    fn check_context(&self, context: &str) -> Result<()> {
        self.mapping
            .field_prefix()
            .check_name("tenant context", context)
    }
}

fn unescape(name: &str) -> &str {
    name.strip_prefix(ESCAPE_PREFIX).unwrap_or(name)
}
