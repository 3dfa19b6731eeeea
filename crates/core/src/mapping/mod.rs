//! Virtual-to-physical table mapping.
//!
//! [`TableMapping`] validates a virtual table against the physical table that
//! will host it and records how each virtual key attribute maps onto a
//! physical one. [`ItemMapper`] and [`QueryAndScanMapper`] are borrowed views
//! that translate individual requests through a built mapping.

mod compat;
mod error;
mod field;
mod index;
mod item;
mod prefix;
mod provider;
mod query;
mod table;

pub use error::{MappingError, Result};
pub use field::{Field, FieldMapping, IndexContext};
pub use index::{IndexMapperByKind, SecondaryIndexMapper};
pub use item::{ItemMapper, ESCAPE_PREFIX};
pub use prefix::{FieldPrefix, QualifiedValue};
pub use provider::{ByKeyTypeSchemaProvider, PhysicalSchemaProvider, SingletonSchemaProvider};
pub use query::{
    row_owner, QueryAndScanMapper, RowOwner, ScanColumns, DEFAULT_SCAN_TENANT_KEY,
    DEFAULT_SCAN_VIRTUAL_TABLE_KEY,
};
pub use table::{DedupedFieldMappings, FieldMappings, TableMapping};
