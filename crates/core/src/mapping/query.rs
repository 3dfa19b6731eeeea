//! Rewriting of query and scan requests into physical form.

use crate::attribute::{AttributeValue, Condition, ComparisonOperator, Item};
use crate::request::{QueryRequest, ScanRequest};

use super::field::{FieldMapping, IndexContext};
use super::item::ItemMapper;
use super::prefix::FieldPrefix;
use super::table::TableMapping;
use super::{MappingError, Result};

/// Default output column carrying the tenant context of a cross-tenant row.
pub const DEFAULT_SCAN_TENANT_KEY: &str = "mt:context";

/// Default output column carrying the virtual table name of a cross-tenant row.
pub const DEFAULT_SCAN_VIRTUAL_TABLE_KEY: &str = "mt:tableName";

/// Names of the extra columns attached to rows of cross-tenant scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanColumns {
    pub context_column: String,
    pub table_column: String,
}

impl ScanColumns {
    pub fn new(context_column: impl Into<String>, table_column: impl Into<String>) -> Self {
        Self {
            context_column: context_column.into(),
            table_column: table_column.into(),
        }
    }
}

impl Default for ScanColumns {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_TENANT_KEY, DEFAULT_SCAN_VIRTUAL_TABLE_KEY)
    }
}

/// Tenant context and virtual table a physical row belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOwner {
    pub context: String,
    pub table: String,
}

/// Reads the owner of a physical row from its qualified hash-key value.
pub fn row_owner(row: &Item, physical_hash_key: &str, delimiter: char) -> Result<RowOwner> {
    let value = row
        .get(physical_hash_key)
        .and_then(AttributeValue::as_s)
        .ok_or_else(|| {
            MappingError::Codec(format!(
                "row has no string hash key attribute {physical_hash_key}"
            ))
        })?;
    let parsed = FieldPrefix::new(delimiter).parse(value)?;
    Ok(RowOwner {
        context: parsed.context.to_string(),
        table: parsed.table.to_string(),
    })
}

/// Borrowed view translating queries and scans through a [`TableMapping`].
#[derive(Debug, Clone, Copy)]
pub struct QueryAndScanMapper<'a> {
    mapping: &'a TableMapping,
    items: ItemMapper<'a>,
}

impl<'a> QueryAndScanMapper<'a> {
    pub fn new(mapping: &'a TableMapping) -> Self {
        Self {
            mapping,
            items: ItemMapper::new(mapping),
        }
    }

    /// Rewrites a virtual query for the given tenant.
    ///
    /// The request must carry an `EQ` condition on the hash key of the table
    /// or index it targets.
    pub fn apply_query(&self, context: &str, query: &QueryRequest) -> Result<QueryRequest> {
        let virtual_table = &self.mapping.virtual_table().name;
        let (index_name, key_mappings): (Option<String>, Vec<&FieldMapping>) =
            match &query.index_name {
                Some(virtual_index) => {
                    let physical = self
                        .mapping
                        .physical_secondary_index(virtual_index)
                        .ok_or_else(|| {
                            MappingError::IndexNotFound(format!(
                                "index {virtual_index} not found on virtual table {virtual_table}"
                            ))
                        })?;
                    (
                        Some(physical.name.clone()),
                        self.mapping.index_field_mappings(virtual_index).collect(),
                    )
                }
                None => (
                    None,
                    self.mapping
                        .all_virtual_to_physical_field_mappings_deduped()
                        .values()
                        .filter(|mapping| mapping.index_context() == IndexContext::Table)
                        .collect(),
                ),
            };

        let target = query.index_name.as_deref().unwrap_or(virtual_table);
        let mut has_hash_key_condition = false;
        let mut key_conditions = Vec::with_capacity(query.key_conditions.len());
        for condition in &query.key_conditions {
            let mapping = key_mappings
                .iter()
                .find(|mapping| mapping.source().name == condition.attribute)
                .ok_or_else(|| {
                    MappingError::Codec(format!(
                        "attribute {} is not a key attribute of {target}",
                        condition.attribute
                    ))
                })?;
            if mapping.is_context_hash_key() {
                if condition.operator != ComparisonOperator::Eq {
                    return Err(MappingError::Codec(format!(
                        "hash key condition on {} must use EQ, found {}",
                        condition.attribute, condition.operator
                    )));
                }
                has_hash_key_condition = true;
            }
            key_conditions.push(self.map_condition(context, mapping, condition)?);
        }

        if !has_hash_key_condition {
            return Err(MappingError::Codec(format!(
                "query on {target} requires an EQ condition on its hash key"
            )));
        }

        Ok(QueryRequest {
            table_name: self.mapping.physical_table().name.clone(),
            index_name,
            key_conditions,
            filter: self.map_filter(context, &query.filter)?,
            exclusive_start_key: self.map_start_key(context, query.exclusive_start_key.as_ref())?,
            limit: query.limit,
        })
    }

    /// Rewrites a virtual scan for the given tenant, restricting it to rows
    /// of this tenant's virtual table.
    pub fn apply_scan(&self, context: &str, scan: &ScanRequest) -> Result<ScanRequest> {
        let index_name = scan
            .index_name
            .as_deref()
            .map(|virtual_index| {
                self.mapping
                    .physical_secondary_index(virtual_index)
                    .map(|si| si.name.clone())
                    .ok_or_else(|| {
                        MappingError::IndexNotFound(format!(
                            "index {virtual_index} not found on virtual table {}",
                            self.mapping.virtual_table().name
                        ))
                    })
            })
            .transpose()?;

        let mut filter = self.map_filter(context, &scan.filter)?;
        filter.push(Condition::begins_with(
            self.mapping.physical_hash_key(),
            AttributeValue::S(
                self.mapping
                    .field_prefix()
                    .prefix(context, &self.mapping.virtual_table().name),
            ),
        ));

        Ok(ScanRequest {
            table_name: self.mapping.physical_table().name.clone(),
            index_name,
            filter,
            exclusive_start_key: self.map_start_key(context, scan.exclusive_start_key.as_ref())?,
            limit: scan.limit,
        })
    }

    /// Physical result row back to a virtual item.
    pub fn reverse_row(&self, row: &Item) -> Result<Item> {
        self.items.reverse(row)
    }

    /// Decodes a row of a cross-tenant scan and tags it with its owner.
    pub fn annotate_cross_tenant_row(&self, row: &Item, columns: &ScanColumns) -> Result<Item> {
        let owner = row_owner(
            row,
            self.mapping.physical_hash_key(),
            self.mapping.delimiter(),
        )?;
        if owner.table != self.mapping.virtual_table().name {
            return Err(MappingError::Codec(format!(
                "row belongs to virtual table {}, not {}",
                owner.table,
                self.mapping.virtual_table().name
            )));
        }

        let mut item = self.items.reverse(row)?;
        item.insert(columns.context_column.clone(), AttributeValue::S(owner.context));
        item.insert(columns.table_column.clone(), AttributeValue::S(owner.table));
        Ok(item)
    }

    fn map_condition(
        &self,
        context: &str,
        mapping: &FieldMapping,
        condition: &Condition,
    ) -> Result<Condition> {
        let values = condition
            .values
            .iter()
            .map(|value| self.items.apply_field(context, mapping, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Condition::new(
            mapping.target().name.clone(),
            condition.operator,
            values,
        ))
    }

    fn map_filter(&self, context: &str, filter: &[Condition]) -> Result<Vec<Condition>> {
        let deduped = self.mapping.all_virtual_to_physical_field_mappings_deduped();
        filter
            .iter()
            .map(|condition| match deduped.get(&condition.attribute) {
                Some(mapping) => self.map_condition(context, mapping, condition),
                None => Ok(Condition::new(
                    self.items.escape(&condition.attribute),
                    condition.operator,
                    condition.values.clone(),
                )),
            })
            .collect()
    }

    fn map_start_key(&self, context: &str, key: Option<&Item>) -> Result<Option<Item>> {
        key.map(|key| self.items.apply(context, key)).transpose()
    }
}
