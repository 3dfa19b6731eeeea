use crate::schema::TableDescription;

use super::{MappingError, Result};

/// Supplies the physical table a virtual table should be stored in.
pub trait PhysicalSchemaProvider: Send + Sync {
    /// Returns the physical table for `virtual_table`.
    ///
    /// `seed` is an opaque hint from the caller; providers that have no use
    /// for it ignore it.
    fn physical_table(
        &self,
        virtual_table: &TableDescription,
        seed: Option<&str>,
    ) -> Result<TableDescription>;
}

/// Always returns the same physical table.
#[derive(Debug, Clone)]
pub struct SingletonSchemaProvider {
    table: TableDescription,
}

impl SingletonSchemaProvider {
    pub fn new(table: TableDescription) -> Self {
        Self { table }
    }
}

impl PhysicalSchemaProvider for SingletonSchemaProvider {
    fn physical_table(
        &self,
        _virtual_table: &TableDescription,
        _seed: Option<&str>,
    ) -> Result<TableDescription> {
        Ok(self.table.clone())
    }
}

/// Picks the first table of a catalog whose range key has the same type as the
/// virtual table's range key (or that has none when the virtual table has
/// none).
///
/// Hash-key types are left for [`TableMapping`](super::TableMapping) to
/// validate so the caller gets the usual type-mismatch error.
#[derive(Debug, Clone)]
pub struct ByKeyTypeSchemaProvider {
    tables: Vec<TableDescription>,
}

impl ByKeyTypeSchemaProvider {
    pub fn new(tables: Vec<TableDescription>) -> Self {
        Self { tables }
    }
}

impl PhysicalSchemaProvider for ByKeyTypeSchemaProvider {
    fn physical_table(
        &self,
        virtual_table: &TableDescription,
        _seed: Option<&str>,
    ) -> Result<TableDescription> {
        let virtual_key = &virtual_table.primary_key;
        self.tables
            .iter()
            .find(|table| table.primary_key.range_key_type() == virtual_key.range_key_type())
            .cloned()
            .ok_or_else(|| {
                let shape = match virtual_key.range_key_type() {
                    Some(rk) => format!("{}/{}", virtual_key.hash_key_type, rk),
                    None => virtual_key.hash_key_type.to_string(),
                };
                MappingError::StructuralMismatch(format!(
                    "no physical table can host virtual table {} with key type {}",
                    virtual_table.name, shape
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarAttributeType::{Number as N, String as S};
    use crate::schema::{shared_table_catalog, DEFAULT_TABLE_PREFIX};

    #[test]
    fn test_singleton_ignores_input() {
        let physical = TableDescription::builder("p").hash_key("hk", S).build();
        let provider = SingletonSchemaProvider::new(physical.clone());
        let virtual_table = TableDescription::builder("v").hash_key("id", N).build();
        assert_eq!(
            provider.physical_table(&virtual_table, Some("seed")).unwrap(),
            physical
        );
    }

    #[test]
    fn test_by_key_type_picks_matching_shape() {
        let provider = ByKeyTypeSchemaProvider::new(shared_table_catalog(DEFAULT_TABLE_PREFIX));

        let hash_only = TableDescription::builder("v").hash_key("id", S).build();
        assert_eq!(
            provider.physical_table(&hash_only, None).unwrap().name,
            "mt_sharedtable_s"
        );

        let with_number_range = TableDescription::builder("v")
            .hash_and_range_key("id", S, "ts", N)
            .build();
        assert_eq!(
            provider.physical_table(&with_number_range, None).unwrap().name,
            "mt_sharedtable_s_n"
        );
    }

    #[test]
    fn test_by_key_type_leaves_hash_type_to_table_mapping() {
        let provider = ByKeyTypeSchemaProvider::new(shared_table_catalog(DEFAULT_TABLE_PREFIX));
        let numeric_hash = TableDescription::builder("v").hash_key("id", N).build();
        assert_eq!(
            provider.physical_table(&numeric_hash, None).unwrap().name,
            "mt_sharedtable_s"
        );
    }

    #[test]
    fn test_by_key_type_rejects_unhostable_key() {
        let provider = ByKeyTypeSchemaProvider::new(vec![TableDescription::builder("only")
            .hash_key("hk", S)
            .build()]);
        let ranged = TableDescription::builder("v")
            .hash_and_range_key("id", S, "ts", N)
            .build();
        let err = provider.physical_table(&ranged, None).unwrap_err();
        assert!(matches!(err, MappingError::StructuralMismatch(_)));
        assert_eq!(
            err.to_string(),
            "no physical table can host virtual table v with key type S/N"
        );
    }
}
