//! Registry of virtual tables and their built mappings.
//!
//! Descriptions are kept per `(context, table)`. Built [`TableMapping`]s are
//! cached in an LRU and rebuilt from the description after eviction.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, info};

use mtdynamo_core::mapping::{PhysicalSchemaProvider, SecondaryIndexMapper, TableMapping};
use mtdynamo_core::schema::TableDescription;
use mtdynamo_core::store::{Result, StoreError};

/// Identifies a virtual table of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub context: String,
    pub table: String,
}

impl TableKey {
    pub fn new(context: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            table: table.into(),
        }
    }
}

/// Thread-safe registry shared by every clone.
#[derive(Clone)]
pub struct TableRegistry {
    schema_provider: Arc<dyn PhysicalSchemaProvider>,
    index_mapper: Arc<dyn SecondaryIndexMapper>,
    delimiter: char,
    descriptions: Arc<RwLock<HashMap<TableKey, TableDescription>>>,
    mappings: Arc<RwLock<LruCache<TableKey, Arc<TableMapping>>>>,
}

impl TableRegistry {
    /// Creates an empty registry. A `max_cached_mappings` of 0 is treated as 1.
    pub fn new(
        schema_provider: Arc<dyn PhysicalSchemaProvider>,
        index_mapper: Arc<dyn SecondaryIndexMapper>,
        delimiter: char,
        max_cached_mappings: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(max_cached_mappings).unwrap_or(NonZeroUsize::MIN);
        Self {
            schema_provider,
            index_mapper,
            delimiter,
            descriptions: Arc::new(RwLock::new(HashMap::new())),
            mappings: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Validates and registers a virtual table.
    pub async fn register(
        &self,
        context: &str,
        description: TableDescription,
    ) -> Result<Arc<TableMapping>> {
        let key = TableKey::new(context, &description.name);
        let mapping = Arc::new(self.build(&key, description.clone())?);

        let mut descriptions = self.descriptions.write().await;
        if descriptions.contains_key(&key) {
            return Err(StoreError::TableAlreadyExists(key.table));
        }
        descriptions.insert(key.clone(), description);
        drop(descriptions);

        info!(
            context = %key.context,
            table = %key.table,
            physical_table = %mapping.physical_table().name,
            "Registered virtual table"
        );
        self.mappings.write().await.put(key, mapping.clone());
        Ok(mapping)
    }

    /// Returns the virtual table description.
    pub async fn describe(&self, context: &str, table: &str) -> Result<TableDescription> {
        self.descriptions
            .read()
            .await
            .get(&TableKey::new(context, table))
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    /// Returns the built mapping, building it again after cache eviction.
    pub async fn mapping(&self, context: &str, table: &str) -> Result<Arc<TableMapping>> {
        let key = TableKey::new(context, table);
        if let Some(mapping) = self.mappings.write().await.get(&key) {
            return Ok(mapping.clone());
        }

        let description = self.describe(context, table).await?;
        let mapping = Arc::new(self.build(&key, description)?);
        self.mappings.write().await.put(key, mapping.clone());
        Ok(mapping)
    }

    /// Removes a virtual table and returns its description.
    pub async fn remove(&self, context: &str, table: &str) -> Result<TableDescription> {
        let key = TableKey::new(context, table);
        let description = self
            .descriptions
            .write()
            .await
            .remove(&key)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        self.mappings.write().await.pop(&key);
        info!(context = %key.context, table = %key.table, "Removed virtual table");
        Ok(description)
    }

    /// Names of the tenant's virtual tables, sorted.
    #[cfg(test)]
    pub(crate) async fn table_names(&self, context: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .descriptions
            .read()
            .await
            .keys()
            .filter(|key| key.context == context)
            .map(|key| key.table.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of mappings currently cached.
    pub async fn cached_mappings(&self) -> usize {
        self.mappings.read().await.len()
    }

    fn build(&self, key: &TableKey, description: TableDescription) -> Result<TableMapping> {
        let mapping = TableMapping::new(
            description,
            self.schema_provider.as_ref(),
            self.index_mapper.as_ref(),
            None,
            self.delimiter,
        )
        .map_err(|err| {
            debug!(
                context = %key.context,
                table = %key.table,
                kind = err.kind(),
                error = %err,
                "Table mapping rejected"
            );
            err
        })?;
        debug!(
            context = %key.context,
            table = %key.table,
            physical_table = %mapping.physical_table().name,
            fields = mapping.all_virtual_to_physical_field_mappings().len(),
            "Built table mapping"
        );
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtdynamo_core::mapping::{ByKeyTypeSchemaProvider, IndexMapperByKind, MappingError};
    use mtdynamo_core::schema::{shared_table_catalog, ScalarAttributeType, DEFAULT_TABLE_PREFIX};

    fn registry(max_cached_mappings: usize) -> TableRegistry {
        TableRegistry::new(
            Arc::new(ByKeyTypeSchemaProvider::new(shared_table_catalog(
                DEFAULT_TABLE_PREFIX,
            ))),
            Arc::new(IndexMapperByKind),
            '.',
            max_cached_mappings,
        )
    }

    fn orders() -> TableDescription {
        TableDescription::builder("orders")
            .hash_and_range_key(
                "customer",
                ScalarAttributeType::String,
                "placed",
                ScalarAttributeType::Number,
            )
            .build()
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = registry(8);
        let mapping = registry.register("t1", orders()).await.unwrap();
        assert_eq!(mapping.physical_table().name, "mt_sharedtable_s_n");

        assert_eq!(registry.describe("t1", "orders").await.unwrap(), orders());
        assert!(Arc::ptr_eq(
            &registry.mapping("t1", "orders").await.unwrap(),
            &mapping
        ));
        assert_eq!(registry.table_names("t1").await, vec!["orders"]);
        assert!(registry.table_names("t2").await.is_empty());
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let registry = registry(8);
        registry.register("t1", orders()).await.unwrap();
        registry.register("t2", orders()).await.unwrap();

        assert!(matches!(
            registry.register("t1", orders()).await,
            Err(StoreError::TableAlreadyExists(_))
        ));
        assert!(matches!(
            registry.describe("t3", "orders").await,
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_table_is_not_registered() {
        let registry = registry(8);
        let numeric_hash = TableDescription::builder("bad")
            .hash_key("id", ScalarAttributeType::Number)
            .build();

        let err = registry.register("t1", numeric_hash).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Mapping(MappingError::TypeMismatch(
                "hash key must be of type S".to_string()
            ))
        );
        assert!(registry.table_names("t1").await.is_empty());
    }

    #[tokio::test]
    async fn test_evicted_mapping_is_rebuilt() {
        let registry = registry(1);
        let first = registry.register("t1", orders()).await.unwrap();
        registry.register("t2", orders()).await.unwrap();
        assert_eq!(registry.cached_mappings().await, 1);

        let rebuilt = registry.mapping("t1", "orders").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(*first, *rebuilt);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = registry(8);
        registry.register("t1", orders()).await.unwrap();
        assert_eq!(registry.remove("t1", "orders").await.unwrap(), orders());
        assert!(registry.mapping("t1", "orders").await.is_err());
        assert!(registry.remove("t1", "orders").await.is_err());
    }
}
