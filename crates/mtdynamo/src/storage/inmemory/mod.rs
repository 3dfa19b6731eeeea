//! In-memory backing store for testing.
//!
//! Implements [`BackingStore`](mtdynamo_core::store::BackingStore) over
//! tables held in memory. Conditions are evaluated with the core condition
//! semantics, so facades can be exercised end to end without DynamoDB.
//!
//! # Example
//!
//! ```rust,ignore
//! use mtdynamo::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! // Use store for testing...
//! ```

mod store;

pub use store::InMemoryStore;
