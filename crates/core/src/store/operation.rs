use std::fmt;

use serde::{Deserialize, Serialize};

/// Every operation the store surface knows about.
///
/// Only a subset is served; the rest are listed so that callers get a uniform
/// [`StoreError::UnsupportedOperation`](super::StoreError::UnsupportedOperation)
/// instead of a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetItem,
    PutItem,
    UpdateItem,
    DeleteItem,
    Query,
    Scan,
    CreateTable,
    DeleteTable,
    DescribeTable,
    ListTables,
    BatchGetItem,
    BatchWriteItem,
    CreateBackup,
    DeleteBackup,
    DescribeBackup,
    ListBackups,
    RestoreTableFromBackup,
    DescribeContinuousBackups,
    UpdateContinuousBackups,
    RestoreTableToPointInTime,
    CreateGlobalTable,
    DescribeGlobalTable,
    DescribeGlobalTableSettings,
    ListGlobalTables,
    UpdateGlobalTable,
    UpdateGlobalTableSettings,
    DescribeTimeToLive,
    UpdateTimeToLive,
    TransactGetItems,
    TransactWriteItems,
    TagResource,
    UntagResource,
    ListTagsOfResource,
    UpdateTable,
    SetEndpoint,
    SetRegion,
    DescribeLimits,
    DescribeEndpoints,
    Waiters,
}

impl Operation {
    pub const ALL: [Operation; 39] = [
        Operation::GetItem,
        Operation::PutItem,
        Operation::UpdateItem,
        Operation::DeleteItem,
        Operation::Query,
        Operation::Scan,
        Operation::CreateTable,
        Operation::DeleteTable,
        Operation::DescribeTable,
        Operation::ListTables,
        Operation::BatchGetItem,
        Operation::BatchWriteItem,
        Operation::CreateBackup,
        Operation::DeleteBackup,
        Operation::DescribeBackup,
        Operation::ListBackups,
        Operation::RestoreTableFromBackup,
        Operation::DescribeContinuousBackups,
        Operation::UpdateContinuousBackups,
        Operation::RestoreTableToPointInTime,
        Operation::CreateGlobalTable,
        Operation::DescribeGlobalTable,
        Operation::DescribeGlobalTableSettings,
        Operation::ListGlobalTables,
        Operation::UpdateGlobalTable,
        Operation::UpdateGlobalTableSettings,
        Operation::DescribeTimeToLive,
        Operation::UpdateTimeToLive,
        Operation::TransactGetItems,
        Operation::TransactWriteItems,
        Operation::TagResource,
        Operation::UntagResource,
        Operation::ListTagsOfResource,
        Operation::UpdateTable,
        Operation::SetEndpoint,
        Operation::SetRegion,
        Operation::DescribeLimits,
        Operation::DescribeEndpoints,
        Operation::Waiters,
    ];

    /// True for the single-item, query/scan and table-lifecycle operations.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Operation::GetItem
                | Operation::PutItem
                | Operation::UpdateItem
                | Operation::DeleteItem
                | Operation::Query
                | Operation::Scan
                | Operation::CreateTable
                | Operation::DeleteTable
                | Operation::DescribeTable
                | Operation::ListTables
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetItem => "GetItem",
            Operation::PutItem => "PutItem",
            Operation::UpdateItem => "UpdateItem",
            Operation::DeleteItem => "DeleteItem",
            Operation::Query => "Query",
            Operation::Scan => "Scan",
            Operation::CreateTable => "CreateTable",
            Operation::DeleteTable => "DeleteTable",
            Operation::DescribeTable => "DescribeTable",
            Operation::ListTables => "ListTables",
            Operation::BatchGetItem => "BatchGetItem",
            Operation::BatchWriteItem => "BatchWriteItem",
            Operation::CreateBackup => "CreateBackup",
            Operation::DeleteBackup => "DeleteBackup",
            Operation::DescribeBackup => "DescribeBackup",
            Operation::ListBackups => "ListBackups",
            Operation::RestoreTableFromBackup => "RestoreTableFromBackup",
            Operation::DescribeContinuousBackups => "DescribeContinuousBackups",
            Operation::UpdateContinuousBackups => "UpdateContinuousBackups",
            Operation::RestoreTableToPointInTime => "RestoreTableToPointInTime",
            Operation::CreateGlobalTable => "CreateGlobalTable",
            Operation::DescribeGlobalTable => "DescribeGlobalTable",
            Operation::DescribeGlobalTableSettings => "DescribeGlobalTableSettings",
            Operation::ListGlobalTables => "ListGlobalTables",
            Operation::UpdateGlobalTable => "UpdateGlobalTable",
            Operation::UpdateGlobalTableSettings => "UpdateGlobalTableSettings",
            Operation::DescribeTimeToLive => "DescribeTimeToLive",
            Operation::UpdateTimeToLive => "UpdateTimeToLive",
            Operation::TransactGetItems => "TransactGetItems",
            Operation::TransactWriteItems => "TransactWriteItems",
            Operation::TagResource => "TagResource",
            Operation::UntagResource => "UntagResource",
            Operation::ListTagsOfResource => "ListTagsOfResource",
            Operation::UpdateTable => "UpdateTable",
            Operation::SetEndpoint => "SetEndpoint",
            Operation::SetRegion => "SetRegion",
            Operation::DescribeLimits => "DescribeLimits",
            Operation::DescribeEndpoints => "DescribeEndpoints",
            Operation::Waiters => "Waiters",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
