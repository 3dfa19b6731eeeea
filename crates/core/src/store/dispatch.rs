use serde::{Deserialize, Serialize};

use crate::attribute::Item;
use crate::request::{AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage};
use crate::schema::TableDescription;

use super::Operation;

/// A store call addressed by operation, for callers that route requests by
/// name rather than through the [`BackingStore`](super::BackingStore) methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "PascalCase")]
pub enum StoreRequest {
    GetItem {
        table_name: String,
        key: Item,
    },
    PutItem {
        table_name: String,
        item: Item,
    },
    UpdateItem {
        table_name: String,
        key: Item,
        updates: Vec<AttributeUpdate>,
    },
    DeleteItem {
        table_name: String,
        key: Item,
    },
    Query(QueryRequest),
    Scan(ScanRequest),
    CreateTable(TableDescription),
    DeleteTable {
        table_name: String,
    },
    DescribeTable {
        table_name: String,
    },
    ListTables {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclusive_start_table_name: Option<String>,
        limit: usize,
    },
    /// Any operation without a typed request shape. Only ever rejected.
    Other {
        name: Operation,
    },
}

impl StoreRequest {
    pub fn operation(&self) -> Operation {
        match self {
            StoreRequest::GetItem { .. } => Operation::GetItem,
            StoreRequest::PutItem { .. } => Operation::PutItem,
            StoreRequest::UpdateItem { .. } => Operation::UpdateItem,
            StoreRequest::DeleteItem { .. } => Operation::DeleteItem,
            StoreRequest::Query(_) => Operation::Query,
            StoreRequest::Scan(_) => Operation::Scan,
            StoreRequest::CreateTable(_) => Operation::CreateTable,
            StoreRequest::DeleteTable { .. } => Operation::DeleteTable,
            StoreRequest::DescribeTable { .. } => Operation::DescribeTable,
            StoreRequest::ListTables { .. } => Operation::ListTables,
            StoreRequest::Other { name } => *name,
        }
    }
}

/// Result of a dispatched [`StoreRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreResponse {
    Table(TableDescription),
    Item(Option<Item>),
    Items(ItemPage),
    TableNames(TableNamePage),
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_of_typed_requests() {
        assert_eq!(
            StoreRequest::Scan(ScanRequest::new("orders")).operation(),
            Operation::Scan
        );
        assert_eq!(
            StoreRequest::ListTables {
                exclusive_start_table_name: None,
                limit: 10,
            }
            .operation(),
            Operation::ListTables
        );
    }

    #[test]
    fn test_other_carries_its_operation() {
        let request = StoreRequest::Other {
            name: Operation::TransactWriteItems,
        };
        assert_eq!(request.operation(), Operation::TransactWriteItems);
    }
}
