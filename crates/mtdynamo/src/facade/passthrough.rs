use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use mtdynamo_core::attribute::Item;
use mtdynamo_core::request::{AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage};
use mtdynamo_core::schema::TableDescription;
use mtdynamo_core::store::{
    list_owned_tables, BackingStore, ContextProvider, Operation, Result, StoreError,
};


/// Forwards the served operations to the backing store unchanged.
///
/// Table listing only reports tables whose names start with `table_prefix`;
/// an empty prefix owns every table.
#[derive(Clone)]
pub struct PassThroughStore {
    inner: Arc<dyn BackingStore>,
    context: Arc<dyn ContextProvider>,
    table_prefix: String,
}

impl PassThroughStore {
    pub fn new(
        inner: Arc<dyn BackingStore>,
        context: Arc<dyn ContextProvider>,
        table_prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            context,
            table_prefix: table_prefix.into(),
        }
    }
}

#[async_trait]
impl BackingStore for PassThroughStore {
    async fn create_table(&self, table: &TableDescription) -> Result<TableDescription> {
        self.inner.create_table(table).await
    }

    async fn delete_table(&self, table_name: &str) -> Result<TableDescription> {
        self.inner.delete_table(table_name).await
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        self.inner.describe_table(table_name).await
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
        self.inner.get_item(table_name, key).await
    }

    async fn put_item(&self, table_name: &str, item: &Item) -> Result<()> {
        self.inner.put_item(table_name, item).await
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: &Item,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        self.inner.update_item(table_name, key, updates).await
    }

    async fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
        self.inner.delete_item(table_name, key).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<ItemPage> {
        self.inner.query(request).await
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ItemPage> {
        self.inner.scan(request).await
    }
}
