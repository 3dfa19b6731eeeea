//! Multitenant virtual tables on DynamoDB-style stores.
//!
//! The pure mapping logic lives in `mtdynamo_core`; this crate wires it to
//! backing stores, tenant context providers, configuration and the CLI.

pub mod config;
pub mod context;
pub mod facade;
pub mod registry;
pub mod storage;

pub use config::Config;
pub use context::{with_context, StaticContext, TaskLocalContext};
pub use facade::{dispatch, PassThroughStore, SharedTableStore};
pub use registry::TableRegistry;
