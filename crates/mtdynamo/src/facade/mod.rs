//! Store facades.
//!
//! Both facades implement [`BackingStore`] themselves, so callers hold a
//! `dyn BackingStore` whichever mode is configured:
//!
//! - [`PassThroughStore`] forwards every served call unchanged.
//! - [`SharedTableStore`] packs each tenant's virtual tables into the shared
//!   physical tables.
//!
//! Requests routed by operation go through [`dispatch`], which rejects
//! operations outside the served subset before the store is touched.
//!
//! [`BackingStore`]: mtdynamo_core::store::BackingStore

mod passthrough;
mod shared;

pub use passthrough::PassThroughStore;
pub use shared::SharedTableStore;

use mtdynamo_core::store::{
    ensure_supported, BackingStore, Operation, Result, StoreError, StoreRequest, StoreResponse,
};
use tracing::warn;

/// Admits served operations and rejects the rest with
/// [`StoreError::UnsupportedOperation`].
pub fn authorize(operation: Operation) -> Result<()> {
    ensure_supported(operation).inspect_err(|_| {
        warn!(operation = %operation, "Rejected unsupported operation");
    })
}

/// Runs `request` against `store` after checking its operation is served.
pub async fn dispatch(store: &dyn BackingStore, request: StoreRequest) -> Result<StoreResponse> {
    authorize(request.operation())?;

    match request {
        StoreRequest::GetItem { table_name, key } => {
            store.get_item(&table_name, &key).await.map(StoreResponse::Item)
        }
        StoreRequest::PutItem { table_name, item } => {
            store.put_item(&table_name, &item).await?;
            Ok(StoreResponse::Done)
        }
        StoreRequest::UpdateItem {
            table_name,
            key,
            updates,
        } => {
            store.update_item(&table_name, &key, &updates).await?;
            Ok(StoreResponse::Done)
        }
        StoreRequest::DeleteItem { table_name, key } => {
            store.delete_item(&table_name, &key).await?;
            Ok(StoreResponse::Done)
        }
        StoreRequest::Query(query) => store.query(&query).await.map(StoreResponse::Items),
        StoreRequest::Scan(scan) => store.scan(&scan).await.map(StoreResponse::Items),
        StoreRequest::CreateTable(table) => {
            store.create_table(&table).await.map(StoreResponse::Table)
        }
        StoreRequest::DeleteTable { table_name } => {
            store.delete_table(&table_name).await.map(StoreResponse::Table)
        }
        StoreRequest::DescribeTable { table_name } => {
            store.describe_table(&table_name).await.map(StoreResponse::Table)
        }
        StoreRequest::ListTables {
            exclusive_start_table_name,
            limit,
        } => store
            .list_tables(exclusive_start_table_name.as_deref(), limit)
            .await
            .map(StoreResponse::TableNames),
        StoreRequest::Other { name } => Err(StoreError::InvalidRequest(format!(
            "{name} needs its typed request"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod doubles {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use mtdynamo_core::attribute::Item;
    use mtdynamo_core::request::{
        AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage,
    };
    use mtdynamo_core::schema::TableDescription;
    use mtdynamo_core::store::{BackingStore, Operation, Result, StoreError};

    /// Forwards to an inner store and counts every call. Calls of the
    /// operation set with [`CountingStore::fail`] error instead.
    pub struct CountingStore {
        inner: Arc<dyn BackingStore>,
        calls: AtomicUsize,
        failing: Mutex<Option<Operation>>,
    }

    impl CountingStore {
        pub fn new(inner: Arc<dyn BackingStore>) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                failing: Mutex::new(None),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn fail(&self, operation: Option<Operation>) {
            *self.failing.lock().unwrap() = operation;
        }

        fn count(&self, operation: Operation) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.failing.lock().unwrap() == Some(operation) {
                return Err(StoreError::Backend(format!("{operation} failed")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BackingStore for CountingStore {
        async fn create_table(&self, table: &TableDescription) -> Result<TableDescription> {
            self.count(Operation::CreateTable)?;
            self.inner.create_table(table).await
        }

        async fn delete_table(&self, table_name: &str) -> Result<TableDescription> {
            self.count(Operation::DeleteTable)?;
            self.inner.delete_table(table_name).await
        }

        async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
            self.count(Operation::DescribeTable)?;
            self.inner.describe_table(table_name).await
        }

        async fn list_tables(
            &self,
            exclusive_start_table_name: Option<&str>,
            limit: usize,
        ) -> Result<TableNamePage> {
            self.count(Operation::ListTables)?;
            self.inner
                .list_tables(exclusive_start_table_name, limit)
                .await
        }

        async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>> {
            self.count(Operation::GetItem)?;
            self.inner.get_item(table_name, key).await
        }

        async fn put_item(&self, table_name: &str, item: &Item) -> Result<()> {
            self.count(Operation::PutItem)?;
            self.inner.put_item(table_name, item).await
        }

        async fn update_item(
            &self,
            table_name: &str,
            key: &Item,
            updates: &[AttributeUpdate],
        ) -> Result<()> {
            self.count(Operation::UpdateItem)?;
            self.inner.update_item(table_name, key, updates).await
        }

        async fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
            self.count(Operation::DeleteItem)?;
            self.inner.delete_item(table_name, key).await
        }

        async fn query(&self, request: &QueryRequest) -> Result<ItemPage> {
            self.count(Operation::Query)?;
            self.inner.query(request).await
        }

        async fn scan(&self, request: &ScanRequest) -> Result<ItemPage> {
            self.count(Operation::Scan)?;
            self.inner.scan(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize() {
        for operation in Operation::ALL {
            let result = authorize(operation);
            if operation.is_supported() {
                assert!(result.is_ok(), "{operation} should be served");
            } else {
                assert_eq!(result, Err(StoreError::UnsupportedOperation(operation)));
            }
        }
    }

    #[cfg(feature = "inmemory")]
    mod routing {
        use std::sync::Arc;

        use super::*;
        use crate::context::StaticContext;
        use crate::facade::doubles::CountingStore;
        use crate::facade::PassThroughStore;
        use crate::storage::InMemoryStore;
        use mtdynamo_core::schema::{ScalarAttributeType, TableDescription};

        fn counted() -> (Arc<CountingStore>, PassThroughStore) {
            let inner = Arc::new(CountingStore::new(Arc::new(InMemoryStore::new())));
            let store = PassThroughStore::new(inner.clone(), Arc::new(StaticContext::none()), "");
            (inner, store)
        }

        #[tokio::test]
        async fn test_unsupported_operations_never_reach_the_store() {
            let (inner, store) = counted();
            for operation in Operation::ALL.into_iter().filter(|op| !op.is_supported()) {
                let result = dispatch(&store, StoreRequest::Other { name: operation }).await;
                assert_eq!(result, Err(StoreError::UnsupportedOperation(operation)));
            }
            assert_eq!(inner.calls(), 0);
        }

        #[tokio::test]
        async fn test_served_operations_are_forwarded() {
            let (inner, store) = counted();
            let table = TableDescription::builder("users")
                .hash_key("id", ScalarAttributeType::String)
                .build();

            let created = dispatch(&store, StoreRequest::CreateTable(table.clone())).await;
            assert_eq!(created, Ok(StoreResponse::Table(table.clone())));
            let described = dispatch(
                &store,
                StoreRequest::DescribeTable {
                    table_name: "users".to_string(),
                },
            )
            .await;
            assert_eq!(described, Ok(StoreResponse::Table(table)));
            assert_eq!(inner.calls(), 2);
        }

        #[tokio::test]
        async fn test_served_operation_without_typed_request_is_invalid() {
            let (inner, store) = counted();
            let result = dispatch(
                &store,
                StoreRequest::Other {
                    name: Operation::GetItem,
                },
            )
            .await;
            assert!(matches!(result, Err(StoreError::InvalidRequest(_))));
            assert_eq!(inner.calls(), 0);
        }
    }
}
