//! DynamoDB backing store.
//!
//! This module provides a DynamoDB-based implementation of [`BackingStore`]
//! using `aws-sdk-dynamodb`.
//!
//! [`BackingStore`]: mtdynamo_core::store::BackingStore

mod client;
mod conversions;
mod error;
mod expression;
mod store;

pub use client::{create_client, AwsConfig};
pub use store::DynamoDbStore;
