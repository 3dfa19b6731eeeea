//! Shared-table mode.
//!
//! Every tenant's virtual tables live in a small pool of physical tables.
//! Hash-key values carry `<context><d><table><d>` so that rows of different
//! tenants and tables never collide, and queries and scans are rewritten to
//! stay inside the caller's prefix.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use mtdynamo_core::attribute::Item;
use mtdynamo_core::mapping::{
    row_owner, ByKeyTypeSchemaProvider, IndexMapperByKind, ScanColumns, TableMapping,
};
use mtdynamo_core::request::{AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage};
use mtdynamo_core::schema::{shared_table_catalog, TableDescription};
use mtdynamo_core::store::{
    list_owned_tables, BackingStore, ContextProvider, Operation, Result, StoreError,
};

use crate::config::Config;
use crate::registry::TableRegistry;

/// Virtualizes tables per tenant on top of shared physical tables.
#[derive(Clone)]
pub struct SharedTableStore {
    inner: Arc<dyn BackingStore>,
    context: Arc<dyn ContextProvider>,
    registry: TableRegistry,
    scan_columns: ScanColumns,
    table_prefix: String,
}

impl SharedTableStore {
    pub fn new(
        inner: Arc<dyn BackingStore>,
        context: Arc<dyn ContextProvider>,
        registry: TableRegistry,
        scan_columns: ScanColumns,
        table_prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            context,
            registry,
            scan_columns,
            table_prefix: table_prefix.into(),
        }
    }

    /// Uses the standard shared-table catalog and kind-based index mapping.
    pub fn from_config(
        inner: Arc<dyn BackingStore>,
        context: Arc<dyn ContextProvider>,
        config: &Config,
    ) -> Self {
        let registry = TableRegistry::new(
            Arc::new(ByKeyTypeSchemaProvider::new(shared_table_catalog(
                &config.table_prefix,
            ))),
            Arc::new(IndexMapperByKind),
            config.delimiter,
            config.mapping_cache_max_entries,
        );
        Self::new(
            inner,
            context,
            registry,
            config.scan_columns(),
            config.table_prefix.clone(),
        )
    }

    fn require_context(&self) -> Result<String> {
        self.context.context().ok_or(StoreError::MissingContext)
    }

    async fn resolve(&self, table_name: &str) -> Result<(String, Arc<TableMapping>)> {
        let context = self.require_context()?;
        let mapping = self.registry.mapping(&context, table_name).await?;
        Ok((context, mapping))
    }

    /// Deletes every physical row of one tenant's virtual table.
    async fn purge(&self, context: &str, mapping: &TableMapping) -> Result<usize> {
        let physical = mapping.physical_table();
        let key_names: Vec<&str> = std::iter::once(physical.primary_key.hash_key.as_str())
            .chain(physical.primary_key.range_key_name())
            .collect();

        let mut request = mapping
            .query_and_scan_mapper()
            .apply_scan(context, &ScanRequest::new(&mapping.virtual_table().name))?;
        let mut deleted = 0;
        loop {
            let page = self.inner.scan(&request).await?;
            for row in &page.items {
                let key: Item = key_names
                    .iter()
                    .filter_map(|name| row.get(*name).map(|v| (name.to_string(), v.clone())))
                    .collect();
                self.inner.delete_item(&physical.name, &key).await?;
                deleted += 1;
            }
            match page.last_evaluated_key {
                Some(key) => request.exclusive_start_key = Some(key),
                None => return Ok(deleted),
            }
        }
    }

    /// Scans a physical table across all tenants, tagging each row with its
    /// owner. Rows whose owner has no registered table are skipped.
    async fn scan_all_tenants(&self, request: &ScanRequest) -> Result<ItemPage> {
        let physical = self.inner.describe_table(&request.table_name).await?;
        let hash_key = physical.primary_key.hash_key.as_str();
        let delimiter = self.registry.delimiter();
        let page = self.inner.scan(request).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for row in &page.items {
            let owner = match row_owner(row, hash_key, delimiter) {
                Ok(owner) => owner,
                Err(err) => {
                    warn!(table = %request.table_name, error = %err, "Skipping row without owner");
                    continue;
                }
            };
            let mapping = match self.registry.mapping(&owner.context, &owner.table).await {
                Ok(mapping) => mapping,
                Err(err) => {
                    warn!(
                        context = %owner.context,
                        table = %owner.table,
                        error = %err,
                        "Skipping row of unknown virtual table"
                    );
                    continue;
                }
            };
            items.push(
                mapping
                    .query_and_scan_mapper()
                    .annotate_cross_tenant_row(row, &self.scan_columns)?,
            );
        }

        Ok(ItemPage {
            items,
            last_evaluated_key: page.last_evaluated_key,
        })
    }
}

#[async_trait]
impl BackingStore for SharedTableStore {
    async fn create_table(&self, table: &TableDescription) -> Result<TableDescription> {
        let context = self.require_context()?;
        let mapping = self.registry.register(&context, table.clone()).await?;

        let physical = mapping.physical_table();
        match self.inner.create_table(physical).await {
            Ok(_) => info!(table = %physical.name, "Created shared table"),
            Err(StoreError::TableAlreadyExists(_)) => {}
            Err(err) => {
                self.registry.remove(&context, &table.name).await?;
                return Err(err);
            }
        }
        Ok(table.clone())
    }

    async fn delete_table(&self, table_name: &str) -> Result<TableDescription> {
        let (context, mapping) = self.resolve(table_name).await?;
        let deleted = self.purge(&context, &mapping).await?;
        let description = self.registry.remove(&context, table_name).await?;
        debug!(context = %context, table = %table_name, rows = deleted, "Purged virtual table");
        Ok(description)
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let context = self.require_context()?;
        self.registry.describe(&context, table_name).await
    }

    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<&str>,
        limit: usize,
    ) -> Result<TableNamePage> {
        if let Some(context) = self.context.context() {
            warn!(context = %context, "Table listing is not available inside a tenant context");
            return Err(StoreError::UnsupportedOperation(Operation::ListTables));
        }
        let prefix = self.table_prefix.as_str();
        list_owned_tables(
            self.inner.as_ref(),
            exclusive_start_table_name,
            limit,
            |name: &str| name.starts_with(prefix),
        )
        .await
    }

    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>> {
        let (context, mapping) = self.resolve(table_name).await?;
        let items = mapping.item_mapper();
        let key = items.apply_key(&context, key)?;

        let row = self
            .inner
            .get_item(&mapping.physical_table().name, &key)
            .await?;
        Ok(row.map(|row| items.reverse(&row)).transpose()?)
    }

    async fn put_item(&self, table_name: &str, item: &Item) -> Result<()> {
        let (context, mapping) = self.resolve(table_name).await?;
        let item = mapping.item_mapper().apply(&context, item)?;
        self.inner
            .put_item(&mapping.physical_table().name, &item)
            .await
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: &Item,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        let (context, mapping) = self.resolve(table_name).await?;
        let items = mapping.item_mapper();
        let key = items.apply_key(&context, key)?;
        let updates = items.apply_updates(&context, updates)?;
        self.inner
            .update_item(&mapping.physical_table().name, &key, &updates)
            .await
    }

    async fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
        let (context, mapping) = self.resolve(table_name).await?;
        let key = mapping.item_mapper().apply_key(&context, key)?;
        self.inner
            .delete_item(&mapping.physical_table().name, &key)
            .await
    }

    async fn query(&self, request: &QueryRequest) -> Result<ItemPage> {
        let (context, mapping) = self.resolve(&request.table_name).await?;
        let mapper = mapping.query_and_scan_mapper();
        let page = self.inner.query(&mapper.apply_query(&context, request)?).await?;

        Ok(ItemPage {
            items: page
                .items
                .iter()
                .map(|row| mapper.reverse_row(row))
                .collect::<std::result::Result<_, _>>()?,
            last_evaluated_key: page
                .last_evaluated_key
                .as_ref()
                .map(|key| mapper.reverse_row(key))
                .transpose()?,
        })
    }

    /// With a tenant context, `request.table_name` names a virtual table.
    /// Without one, it names a physical table and rows of every tenant are
    /// returned, annotated with their owner.
    async fn scan(&self, request: &ScanRequest) -> Result<ItemPage> {
        let Some(context) = self.context.context() else {
            return self.scan_all_tenants(request).await;
        };

        let mapping = self.registry.mapping(&context, &request.table_name).await?;
        let mapper = mapping.query_and_scan_mapper();
        let page = self.inner.scan(&mapper.apply_scan(&context, request)?).await?;

        Ok(ItemPage {
            items: page
                .items
                .iter()
                .map(|row| mapper.reverse_row(row))
                .collect::<std::result::Result<_, _>>()?,
            last_evaluated_key: page
                .last_evaluated_key
                .as_ref()
                .map(|key| mapper.reverse_row(key))
                .transpose()?,
        })
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::context::{with_context, TaskLocalContext};
    use crate::facade::doubles::CountingStore;
    use crate::facade::dispatch;
    use crate::storage::InMemoryStore;
    use mtdynamo_core::store::StoreRequest;
    use mtdynamo_core::attribute::{AttributeValue, Condition};
    use mtdynamo_core::schema::ScalarAttributeType::{Number as N, String as S};
    use mtdynamo_core::schema::{IndexKind, PrimaryKey};

    const PHYSICAL: &str = "mt_sharedtable_s_n";

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: &str) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    fn orders() -> TableDescription {
        TableDescription::builder("orders")
            .hash_and_range_key("customer", S, "placed", N)
            .add_secondary_index("by_status", IndexKind::Gsi, PrimaryKey::new("status", S))
            .build()
    }

    fn order(customer: &str, placed: &str, status: &str) -> Item {
        Item::from([
            ("customer".to_string(), s(customer)),
            ("placed".to_string(), n(placed)),
            ("status".to_string(), s(status)),
        ])
    }

    fn key(customer: &str, placed: &str) -> Item {
        Item::from([
            ("customer".to_string(), s(customer)),
            ("placed".to_string(), n(placed)),
        ])
    }

    fn shared(inner: Arc<dyn BackingStore>) -> SharedTableStore {
        SharedTableStore::from_config(inner, Arc::new(TaskLocalContext), &Config::default())
    }

    async fn seeded() -> (SharedTableStore, InMemoryStore) {
        let backing = InMemoryStore::new();
        let store = shared(Arc::new(backing.clone()));
        for (tenant, status) in [("t1", "open"), ("t2", "shipped")] {
            let store = store.clone();
            with_context(tenant, async move {
                store.create_table(&orders()).await.unwrap();
                store.put_item("orders", &order("c1", "1", status)).await.unwrap();
                store.put_item("orders", &order("c1", "2", status)).await.unwrap();
            })
            .await;
        }
        (store, backing)
    }

    #[tokio::test]
    async fn test_tenants_with_same_table_name_are_isolated() {
        let (store, backing) = seeded().await;
        assert_eq!(backing.item_count(PHYSICAL).await.unwrap(), 4);

        let got = with_context("t1", store.get_item("orders", &key("c1", "1"))).await;
        assert_eq!(got.unwrap(), Some(order("c1", "1", "open")));

        let query = QueryRequest::new("orders", vec![Condition::eq("customer", s("c1"))]);
        let page = with_context("t2", store.query(&query)).await.unwrap();
        assert_eq!(
            page.items,
            vec![order("c1", "1", "shipped"), order("c1", "2", "shipped")]
        );

        let scanned = with_context("t1", store.scan(&ScanRequest::new("orders")))
            .await
            .unwrap();
        assert_eq!(scanned.items.len(), 2);
        assert!(scanned.items.iter().all(|item| item["status"] == s("open")));

        let missing = with_context("t3", store.get_item("orders", &key("c1", "1"))).await;
        assert_eq!(missing, Err(StoreError::TableNotFound("orders".to_string())));
    }

    #[tokio::test]
    async fn test_physical_rows_are_qualified() {
        let (_store, backing) = seeded().await;
        let rows = backing.items(PHYSICAL).await.unwrap();
        assert_eq!(rows[0]["hk"], s("t1.orders.c1"));
        assert_eq!(rows[0]["rk"], n("1"));
        assert_eq!(rows[0]["gsi_s_hk"], s("t1.orders.open"));
        assert!(!rows[0].contains_key("customer"));
    }

    #[tokio::test]
    async fn test_query_on_secondary_index() {
        let (store, _backing) = seeded().await;
        let query = QueryRequest::new("orders", vec![Condition::eq("status", s("shipped"))])
            .with_index("by_status");

        let t1 = with_context("t1", store.query(&query)).await.unwrap();
        assert!(t1.items.is_empty());

        let t2 = with_context("t2", store.query(&query)).await.unwrap();
        assert_eq!(t2.items.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_item() {
        let (store, _backing) = seeded().await;
        with_context("t1", async {
            store
                .update_item(
                    "orders",
                    &key("c1", "1"),
                    &[
                        AttributeUpdate::put("status", s("closed")),
                        AttributeUpdate::put("note", s("late")),
                    ],
                )
                .await
                .unwrap();
            let item = store.get_item("orders", &key("c1", "1")).await.unwrap().unwrap();
            assert_eq!(item["status"], s("closed"));
            assert_eq!(item["note"], s("late"));

            store.delete_item("orders", &key("c1", "1")).await.unwrap();
            assert_eq!(store.get_item("orders", &key("c1", "1")).await.unwrap(), None);
        })
        .await;

        let other = with_context("t2", store.get_item("orders", &key("c1", "1"))).await;
        assert!(other.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_item_calls_require_context() {
        let (store, _backing) = seeded().await;
        assert_eq!(
            store.put_item("orders", &order("c2", "1", "open")).await,
            Err(StoreError::MissingContext)
        );
    }

    #[tokio::test]
    async fn test_scan_without_context_spans_tenants() {
        let (store, _backing) = seeded().await;
        let page = store.scan(&ScanRequest::new(PHYSICAL)).await.unwrap();

        assert_eq!(page.items.len(), 4);
        let mut owners: Vec<(String, String)> = page
            .items
            .iter()
            .map(|item| {
                (
                    item["mt:context"].as_s().unwrap_or_default().to_string(),
                    item["mt:tableName"].as_s().unwrap_or_default().to_string(),
                )
            })
            .collect();
        owners.dedup();
        assert_eq!(
            owners,
            vec![
                ("t1".to_string(), "orders".to_string()),
                ("t2".to_string(), "orders".to_string()),
            ]
        );
        assert!(page.items.iter().all(|item| item.contains_key("customer")));
    }

    #[tokio::test]
    async fn test_delete_table_purges_only_its_rows() {
        let (store, backing) = seeded().await;
        let deleted = with_context("t1", store.delete_table("orders")).await.unwrap();
        assert_eq!(deleted, orders());

        assert_eq!(backing.item_count(PHYSICAL).await.unwrap(), 2);
        assert_eq!(
            with_context("t1", store.describe_table("orders")).await,
            Err(StoreError::TableNotFound("orders".to_string()))
        );
        assert_eq!(
            with_context("t2", store.describe_table("orders")).await.unwrap(),
            orders()
        );
    }

    #[tokio::test]
    async fn test_list_tables() {
        let (store, backing) = seeded().await;
        backing
            .create_table(
                &TableDescription::builder("unrelated")
                    .hash_key("id", S)
                    .build(),
            )
            .await
            .unwrap();

        let page = store.list_tables(None, 10).await.unwrap();
        assert_eq!(page.table_names, vec![PHYSICAL]);
        assert_eq!(page.last_evaluated_table_name, None);

        assert_eq!(
            with_context("t1", store.list_tables(None, 10)).await,
            Err(StoreError::UnsupportedOperation(Operation::ListTables))
        );
    }

    #[tokio::test]
    async fn test_unsupported_operations_do_not_reach_backing_store() {
        let inner = Arc::new(CountingStore::new(Arc::new(InMemoryStore::new())));
        let store = shared(inner.clone());

        for operation in [Operation::BatchWriteItem, Operation::UpdateTimeToLive] {
            let result = with_context(
                "t1",
                dispatch(&store, StoreRequest::Other { name: operation }),
            )
            .await;
            assert_eq!(result, Err(StoreError::UnsupportedOperation(operation)));
        }
        assert_eq!(inner.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_purge_keeps_table_registered() {
        let inner = Arc::new(CountingStore::new(Arc::new(InMemoryStore::new())));
        let store = shared(inner.clone());
        with_context("t1", async {
            store.create_table(&orders()).await.unwrap();
            store.put_item("orders", &order("c1", "1", "open")).await.unwrap();

            inner.fail(Some(Operation::DeleteItem));
            assert!(matches!(
                store.delete_table("orders").await,
                Err(StoreError::Backend(_))
            ));
            assert_eq!(store.describe_table("orders").await.unwrap(), orders());

            inner.fail(None);
            assert_eq!(store.delete_table("orders").await.unwrap(), orders());
            assert_eq!(
                store.describe_table("orders").await,
                Err(StoreError::TableNotFound("orders".to_string()))
            );
        })
        .await;
    }
}
