use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::schema::{IndexKind, PrimaryKey, ScalarAttributeType, SecondaryIndex, TableDescription};

use super::compat::check_compatible_primary_key;
use super::field::{Field, FieldMapping, IndexContext};
use super::index::SecondaryIndexMapper;
use super::item::{ItemMapper, ESCAPE_PREFIX};
use super::prefix::FieldPrefix;
use super::provider::PhysicalSchemaProvider;
use super::query::QueryAndScanMapper;
use super::{MappingError, Result};

/// Virtual field name to every mapping it takes part in.
pub type FieldMappings = BTreeMap<String, Vec<FieldMapping>>;

/// Virtual field name to its representative mapping.
pub type DedupedFieldMappings = BTreeMap<String, FieldMapping>;

/// The validated correspondence between a virtual table and the physical
/// table hosting it.
///
/// Built once by [`TableMapping::new`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    virtual_table: TableDescription,
    physical_table: TableDescription,
    delimiter: char,
    secondary_index_map: BTreeMap<String, SecondaryIndex>,
    ordered_field_mappings: Vec<FieldMapping>,
    field_mappings: FieldMappings,
    deduped_field_mappings: DedupedFieldMappings,
    reserved_physical_fields: BTreeSet<String>,
}

impl TableMapping {
    /// Validates `virtual_table` against the physical table supplied by
    /// `schema_provider` and builds the field mappings.
    ///
    /// Fails on the first violated invariant; no partial mapping is returned.
    pub fn new(
        virtual_table: TableDescription,
        schema_provider: &dyn PhysicalSchemaProvider,
        index_mapper: &dyn SecondaryIndexMapper,
        seed: Option<&str>,
        delimiter: char,
    ) -> Result<Self> {
        let physical_table = schema_provider.physical_table(&virtual_table, seed)?;

        Self::validate_compatible_primary_key(
            &virtual_table.primary_key,
            &physical_table.primary_key,
        )?;
        Self::validate_physical_table(&physical_table)?;
        let secondary_index_map =
            build_secondary_index_map(&virtual_table, &physical_table, index_mapper)?;

        let prefix = FieldPrefix::new(delimiter);
        prefix.check_name("virtual table name", &virtual_table.name)?;
        for si in &virtual_table.secondary_indexes {
            prefix.check_name("virtual secondary index name", &si.name)?;
        }

        let reserved_physical_fields = reserved_physical_fields(&physical_table)?;
        let ordered_field_mappings =
            build_field_mappings(&virtual_table, &physical_table, &secondary_index_map)?;

        let mut field_mappings = FieldMappings::new();
        let mut deduped_field_mappings = DedupedFieldMappings::new();
        for mapping in &ordered_field_mappings {
            let name = mapping.source().name.clone();
            field_mappings
                .entry(name.clone())
                .or_default()
                .push(mapping.clone());
            deduped_field_mappings
                .entry(name)
                .or_insert_with(|| mapping.clone());
        }

        Ok(Self {
            virtual_table,
            physical_table,
            delimiter,
            secondary_index_map,
            ordered_field_mappings,
            field_mappings,
            deduped_field_mappings,
            reserved_physical_fields,
        })
    }

    pub fn virtual_table(&self) -> &TableDescription {
        &self.virtual_table
    }

    pub fn physical_table(&self) -> &TableDescription {
        &self.physical_table
    }

    /// Delimiter used when packing qualified hash-key values.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Every mapping, keyed by virtual field name. A field serving several
    /// contexts owns one mapping per context.
    pub fn all_virtual_to_physical_field_mappings(&self) -> &FieldMappings {
        &self.field_mappings
    }

    /// One representative mapping per virtual field: the first one in
    /// table-then-index declaration order.
    pub fn all_virtual_to_physical_field_mappings_deduped(&self) -> &DedupedFieldMappings {
        &self.deduped_field_mappings
    }

    /// Mappings of a virtual secondary index's key, hash key first.
    pub fn index_primary_key_field_mappings(
        &self,
        secondary_index: &SecondaryIndex,
    ) -> Vec<FieldMapping> {
        self.index_field_mappings(&secondary_index.name)
            .cloned()
            .collect()
    }

    /// Mappings of the virtual table's own primary key.
    pub fn build_virtual_to_physical_key_field_mappings(&self) -> FieldMappings {
        let mut key_mappings = FieldMappings::new();
        for mapping in &self.ordered_field_mappings {
            if mapping.index_context() == IndexContext::Table {
                key_mappings
                    .entry(mapping.source().name.clone())
                    .or_default()
                    .push(mapping.clone());
            }
        }
        key_mappings
    }

    /// The physical index hosting the named virtual secondary index.
    pub fn physical_secondary_index(&self, virtual_index_name: &str) -> Option<&SecondaryIndex> {
        self.secondary_index_map.get(virtual_index_name)
    }

    /// Checks that `physical_key` can host `virtual_key`.
    pub fn validate_compatible_primary_key(
        virtual_key: &PrimaryKey,
        physical_key: &PrimaryKey,
    ) -> Result<()> {
        check_compatible_primary_key(virtual_key, physical_key)
    }

    /// Checks that the physical table and all of its secondary indexes have
    /// string hash keys.
    pub fn validate_physical_table(physical_table: &TableDescription) -> Result<()> {
        let hash_key_type = physical_table.primary_key.hash_key_type;
        if hash_key_type != ScalarAttributeType::String {
            return Err(MappingError::SchemaInvalid(format!(
                "physical table {}'s primary-key hash key must be type S, encountered type {}",
                physical_table.name, hash_key_type
            )));
        }

        for si in &physical_table.secondary_indexes {
            let hash_key_type = si.declared_primary_key().hash_key_type;
            if hash_key_type != ScalarAttributeType::String {
                return Err(MappingError::SchemaInvalid(format!(
                    "physical table {}'s {} {}'s primary-key hash key must be type S, encountered type {}",
                    physical_table.name, si.kind, si.name, hash_key_type
                )));
            }
        }

        Ok(())
    }

    /// Checks that every virtual secondary index resolves to its own physical
    /// index.
    pub fn validate_secondary_indexes(
        virtual_table: &TableDescription,
        physical_table: &TableDescription,
        index_mapper: &dyn SecondaryIndexMapper,
    ) -> Result<()> {
        build_secondary_index_map(virtual_table, physical_table, index_mapper).map(|_| ())
    }

    pub fn item_mapper(&self) -> ItemMapper<'_> {
        ItemMapper::new(self)
    }

    pub fn query_and_scan_mapper(&self) -> QueryAndScanMapper<'_> {
        QueryAndScanMapper::new(self)
    }

    pub(crate) fn field_prefix(&self) -> FieldPrefix {
        FieldPrefix::new(self.delimiter)
    }

    pub(crate) fn index_field_mappings<'a>(
        &'a self,
        virtual_index_name: &'a str,
    ) -> impl Iterator<Item = &'a FieldMapping> + 'a {
        self.ordered_field_mappings.iter().filter(move |mapping| {
            mapping.index_context() == IndexContext::SecondaryIndex
                && mapping.virtual_index_name() == virtual_index_name
        })
    }

    pub(crate) fn table_field_mappings(&self) -> impl Iterator<Item = &FieldMapping> {
        self.ordered_field_mappings
            .iter()
            .filter(|mapping| mapping.index_context() == IndexContext::Table)
    }

    /// True for every key attribute declared on the physical table or its
    /// indexes. Unmapped virtual attributes never land on these names.
    pub(crate) fn is_reserved_physical_field(&self, name: &str) -> bool {
        self.reserved_physical_fields.contains(name)
    }

    /// Name of the physical table's hash key.
    pub(crate) fn physical_hash_key(&self) -> &str {
        &self.physical_table.primary_key.hash_key
    }
}

fn build_secondary_index_map(
    virtual_table: &TableDescription,
    physical_table: &TableDescription,
    index_mapper: &dyn SecondaryIndexMapper,
) -> Result<BTreeMap<String, SecondaryIndex>> {
    let mut secondary_index_map = BTreeMap::new();
    let mut claimed: HashMap<&str, &str> = HashMap::new();

    for virtual_si in &virtual_table.secondary_indexes {
        if secondary_index_map.contains_key(&virtual_si.name) {
            return Err(MappingError::Duplicate(format!(
                "Duplicate key {}",
                virtual_si.name
            )));
        }

        let physical_si = index_mapper.lookup_physical_secondary_index(virtual_si, physical_table)?;
        let virtual_key = virtual_si.primary_key()?;
        if virtual_si.kind == IndexKind::Lsi
            && virtual_key.hash_key != virtual_table.primary_key.hash_key
        {
            return Err(MappingError::StructuralMismatch(format!(
                "LSI {}'s hash key {} must be the table's hash key {}",
                virtual_si.name, virtual_key.hash_key, virtual_table.primary_key.hash_key
            )));
        }

        if let Some(previous) = claimed.insert(physical_si.name.as_str(), virtual_si.name.as_str()) {
            return Err(MappingError::Duplicate(format!(
                "Duplicate key {} (attempted mapping virtual indexes {} and {})",
                physical_si.name, previous, virtual_si.name
            )));
        }
        secondary_index_map.insert(virtual_si.name.clone(), physical_si.clone());
    }

    Ok(secondary_index_map)
}

fn key_field_mappings(
    virtual_key: &PrimaryKey,
    physical_key: &PrimaryKey,
    virtual_index_name: &str,
    physical_index_name: &str,
    index_context: IndexContext,
) -> Vec<FieldMapping> {
    let mut mappings = vec![FieldMapping::new(
        Field::new(virtual_key.hash_key.clone(), virtual_key.hash_key_type),
        Field::new(physical_key.hash_key.clone(), physical_key.hash_key_type),
        virtual_index_name,
        physical_index_name,
        index_context,
        true,
    )];

    if let (Some(virtual_rk), Some(physical_rk)) = (&virtual_key.range_key, &physical_key.range_key)
    {
        mappings.push(FieldMapping::new(
            Field::new(virtual_rk.name.clone(), virtual_rk.key_type),
            Field::new(physical_rk.name.clone(), physical_rk.key_type),
            virtual_index_name,
            physical_index_name,
            index_context,
            false,
        ));
    }

    mappings
}

fn build_field_mappings(
    virtual_table: &TableDescription,
    physical_table: &TableDescription,
    secondary_index_map: &BTreeMap<String, SecondaryIndex>,
) -> Result<Vec<FieldMapping>> {
    let mut mappings = key_field_mappings(
        &virtual_table.primary_key,
        &physical_table.primary_key,
        &virtual_table.name,
        &physical_table.name,
        IndexContext::Table,
    );

    for virtual_si in &virtual_table.secondary_indexes {
        let Some(physical_si) = secondary_index_map.get(&virtual_si.name) else {
            continue;
        };
        mappings.extend(key_field_mappings(
            virtual_si.primary_key()?,
            physical_si.primary_key()?,
            &virtual_si.name,
            &physical_si.name,
            IndexContext::SecondaryIndex,
        ));
    }

    check_distinct_targets(&mappings)?;
    Ok(mappings)
}

/// A physical field holds the value of at most one virtual field.
fn check_distinct_targets(mappings: &[FieldMapping]) -> Result<()> {
    let mut sources: HashMap<&str, &str> = HashMap::new();
    for mapping in mappings {
        let source = mapping.source().name.as_str();
        let target = mapping.target().name.as_str();
        if let Some(previous) = sources.insert(target, source) {
            if previous != source {
                return Err(MappingError::StructuralMismatch(format!(
                    "physical field {target} is mapped from virtual fields {previous} and {source}"
                )));
            }
        }
    }
    Ok(())
}

fn reserved_physical_fields(physical_table: &TableDescription) -> Result<BTreeSet<String>> {
    let mut reserved = BTreeSet::new();
    let keys = std::iter::once(&physical_table.primary_key).chain(
        physical_table
            .secondary_indexes
            .iter()
            .map(SecondaryIndex::declared_primary_key),
    );
    for key in keys {
        reserved.insert(key.hash_key.clone());
        if let Some(rk) = &key.range_key {
            reserved.insert(rk.name.clone());
        }
    }

    if let Some(name) = reserved.iter().find(|name| name.starts_with(ESCAPE_PREFIX)) {
        return Err(MappingError::SchemaInvalid(format!(
            "physical table {}'s key attribute {} must not begin with '{}'",
            physical_table.name, name, ESCAPE_PREFIX
        )));
    }
    Ok(reserved)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::mapping::{IndexMapperByKind, SingletonSchemaProvider};
    use crate::schema::ScalarAttributeType::{Number as N, String as S};

    pub const DELIMITER: char = '.';

    pub fn default_virtual_builder() -> crate::schema::TableDescriptionBuilder {
        TableDescription::builder("virtualTableName").hash_and_range_key("virtualhk", S, "virtualrk", N)
    }

    pub fn default_virtual_builder_with_gsi() -> crate::schema::TableDescriptionBuilder {
        default_virtual_builder().add_secondary_index(
            "virtualgsi",
            IndexKind::Gsi,
            PrimaryKey::with_range("virtualgsihk", S, "virtualgsirk", N),
        )
    }

    pub fn virtual_table() -> TableDescription {
        default_virtual_builder_with_gsi().build()
    }

    pub fn physical_table() -> TableDescription {
        TableDescription::builder("physicalTableName")
            .hash_and_range_key("physicalhk", S, "physicalrk", N)
            .add_secondary_index(
                "physicalgsi",
                IndexKind::Gsi,
                PrimaryKey::with_range("physicalgsihk", S, "physicalgsirk", N),
            )
            .build()
    }

    pub fn table_mapping() -> TableMapping {
        TableMapping::new(
            virtual_table(),
            &SingletonSchemaProvider::new(physical_table()),
            &IndexMapperByKind,
            None,
            DELIMITER,
        )
        .unwrap()
    }
}
