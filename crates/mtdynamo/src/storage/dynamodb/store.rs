//! DynamoDB backing store.
//!
//! Implements [`BackingStore`] from `mtdynamo_core::store` on a real DynamoDB
//! endpoint. Conditions and updates are sent as expressions.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue as SdkValue, BillingMode};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use mtdynamo_core::attribute::Item;
use mtdynamo_core::request::{AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage};
use mtdynamo_core::schema::TableDescription;
use mtdynamo_core::store::{BackingStore, Result, StoreError};

use super::client::{create_client, AwsConfig};
use super::conversions::{create_table_parts, from_sdk_item, from_sdk_table, to_sdk_item};
use super::error::{
    map_create_table_error, map_delete_item_error, map_delete_table_error,
    map_describe_table_error, map_get_item_error, map_list_tables_error, map_put_item_error,
    map_query_error, map_scan_error, map_update_item_error,
};
use super::expression::ExpressionBuilder;

/// Largest page DynamoDB accepts for ListTables.
const MAX_LIST_TABLES_LIMIT: usize = 100;

fn sdk_limit(limit: Option<usize>) -> Option<i32> {
    limit.map(|limit| i32::try_from(limit).unwrap_or(i32::MAX))
}

fn items_page(
    items: &[HashMap<String, SdkValue>],
    last_evaluated_key: Option<&HashMap<String, SdkValue>>,
) -> Result<ItemPage> {
    Ok(ItemPage {
        items: items.iter().map(from_sdk_item).collect::<Result<_>>()?,
        last_evaluated_key: last_evaluated_key.map(from_sdk_item).transpose()?,
    })
}

/// DynamoDB-based backing store.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store from an AWS configuration.
    pub async fn connect(config: &AwsConfig) -> Self {
        info!(endpoint = %config.target_display(), "Connecting to DynamoDB");
        Self::new(create_client(config).await)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl BackingStore for DynamoDbStore {
    async fn create_table(&self, table: &TableDescription) -> Result<TableDescription> {
        let parts = create_table_parts(table)?;
        let output = self
            .client
            .create_table()
            .table_name(&table.name)
            .set_key_schema(Some(parts.key_schema))
            .set_attribute_definitions(Some(parts.attribute_definitions))
            .set_global_secondary_indexes(parts.global_secondary_indexes)
            .set_local_secondary_indexes(parts.local_secondary_indexes)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| map_create_table_error(e, &table.name))?;

        debug!(table = %table.name, "Created table");
        match output.table_description() {
            Some(description) => from_sdk_table(description),
            None => Ok(table.clone()),
        }
    }

    async fn delete_table(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, table_name))?;

        debug!(table = %table_name, "Deleted table");
        let description = output.table_description().ok_or_else(|| {
            StoreError::Backend(format!("DeleteTable returned no description for {table_name}"))
        })?;
        from_sdk_table(description)
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_describe_table_error(e, table_name))?;

        let description = output
            .table()
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        from_sdk_table(description)
    }

    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<&str>,
        limit: usize,
    ) -> Result<TableNamePage> {
        let limit = limit.clamp(1, MAX_LIST_TABLES_LIMIT);
        let output = self
            .client
            .list_tables()
            .set_exclusive_start_table_name(exclusive_start_table_name.map(str::to_string))
            .set_limit(sdk_limit(Some(limit)))
            .send()
            .await
            .map_err(map_list_tables_error)?;

        Ok(TableNamePage {
            table_names: output.table_names().to_vec(),
            last_evaluated_table_name: output.last_evaluated_table_name().map(str::to_string),
        })
    }

    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(to_sdk_item(key)))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table_name))?;

        output.item().map(from_sdk_item).transpose()
    }

    async fn put_item(&self, table_name: &str, item: &Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(to_sdk_item(item)))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table_name))?;

        Ok(())
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: &Item,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        let mut expressions = ExpressionBuilder::new();
        let update_expression = expressions.update(updates);

        self.client
            .update_item()
            .table_name(table_name)
            .set_key(Some(to_sdk_item(key)))
            .set_update_expression(update_expression)
            .set_expression_attribute_names(expressions.names())
            .set_expression_attribute_values(expressions.values().map(to_sdk_item))
            .send()
            .await
            .map_err(|e| map_update_item_error(e, table_name))?;

        Ok(())
    }

    async fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(to_sdk_item(key)))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table_name))?;

        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<ItemPage> {
        let mut expressions = ExpressionBuilder::new();
        let key_condition = expressions
            .conjunction(&request.key_conditions)?
            .ok_or_else(|| {
                StoreError::InvalidRequest("query requires key conditions".to_string())
            })?;
        let filter = expressions.conjunction(&request.filter)?;

        let output = self
            .client
            .query()
            .table_name(&request.table_name)
            .set_index_name(request.index_name.clone())
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_expression_attribute_names(expressions.names())
            .set_expression_attribute_values(expressions.values().map(to_sdk_item))
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(to_sdk_item))
            .set_limit(sdk_limit(request.limit))
            .send()
            .await
            .map_err(|e| map_query_error(e, &request.table_name))?;

        items_page(output.items(), output.last_evaluated_key())
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ItemPage> {
        let mut expressions = ExpressionBuilder::new();
        let filter = expressions.conjunction(&request.filter)?;

        let output = self
            .client
            .scan()
            .table_name(&request.table_name)
            .set_index_name(request.index_name.clone())
            .set_filter_expression(filter)
            .set_expression_attribute_names(expressions.names())
            .set_expression_attribute_values(expressions.values().map(to_sdk_item))
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(to_sdk_item))
            .set_limit(sdk_limit(request.limit))
            .send()
            .await
            .map_err(|e| map_scan_error(e, &request.table_name))?;

        items_page(output.items(), output.last_evaluated_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_limit() {
        assert_eq!(sdk_limit(None), None);
        assert_eq!(sdk_limit(Some(25)), Some(25));
        assert_eq!(sdk_limit(Some(usize::MAX)), Some(i32::MAX));
    }
}
