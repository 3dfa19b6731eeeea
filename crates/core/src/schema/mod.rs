mod catalog;
mod types;

pub use catalog::{
    shared_table_catalog, shared_table_name, DEFAULT_TABLE_PREFIX, HASH_KEY_FIELD,
    RANGE_KEY_FIELD,
};
pub use types::{
    IndexKind, PrimaryKey, RangeKey, ScalarAttributeType, SecondaryIndex, TableDescription,
    TableDescriptionBuilder,
};
