use async_trait::async_trait;

use crate::attribute::Item;
use crate::request::{AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage};
use crate::schema::TableDescription;

use super::Result;

/// A DynamoDB-style store: the backing store itself, or a facade in front of
/// one.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Creates a table.
    async fn create_table(&self, table: &TableDescription) -> Result<TableDescription>;

    /// Deletes a table and returns its last description.
    async fn delete_table(&self, table_name: &str) -> Result<TableDescription>;

    /// Describes a table.
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription>;

    /// Lists table names in name order, starting after
    /// `exclusive_start_table_name`.
    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<&str>,
        limit: usize,
    ) -> Result<TableNamePage>;

    /// Gets an item by its primary key.
    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>>;

    /// Writes an item, replacing any item with the same key.
    async fn put_item(&self, table_name: &str, item: &Item) -> Result<()>;

    /// Applies attribute updates to the item with the given key, creating it
    /// if absent.
    async fn update_item(
        &self,
        table_name: &str,
        key: &Item,
        updates: &[AttributeUpdate],
    ) -> Result<()>;

    /// Deletes an item by its primary key.
    async fn delete_item(&self, table_name: &str, key: &Item) -> Result<()>;

    /// Runs a key-condition query.
    async fn query(&self, request: &QueryRequest) -> Result<ItemPage>;

    /// Runs a scan.
    async fn scan(&self, request: &ScanRequest) -> Result<ItemPage>;
}

/// Supplies the tenant context of the current request, if any.
pub trait ContextProvider: Send + Sync {
    fn context(&self) -> Option<String>;
}
