//! Backing store implementations.
//!
//! Concrete implementations of [`BackingStore`] selected at compile time via
//! feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): tables held in memory, for tests and local runs
//! - `dynamodb`: AWS DynamoDB using `aws-sdk-dynamodb`
//!
//! The features are independent; both backends can be compiled in together.
//!
//! # Examples
//!
//! Build with DynamoDB support:
//! ```bash
//! cargo build -p mtdynamo --features dynamodb
//! ```
//!
//! [`BackingStore`]: mtdynamo_core::store::BackingStore

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
