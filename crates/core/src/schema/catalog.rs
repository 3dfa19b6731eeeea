//! The standard pool of shared physical tables.
//!
//! One table per range-key shape of the table key (none, S, N, B). Every table
//! carries one GSI per index key shape and, when the table has a range key,
//! one LSI per range-key type. All hash keys are strings because tenant and
//! table qualifiers are packed into them.

use super::types::{
    IndexKind, PrimaryKey, ScalarAttributeType, TableDescription, TableDescriptionBuilder,
};

/// Default name prefix of the shared tables.
pub const DEFAULT_TABLE_PREFIX: &str = "mt_sharedtable_";

/// Hash key attribute name of every shared table.
pub const HASH_KEY_FIELD: &str = "hk";

/// Range key attribute name of the shared tables that have one.
pub const RANGE_KEY_FIELD: &str = "rk";

const RANGE_TYPES: [ScalarAttributeType; 3] = [
    ScalarAttributeType::String,
    ScalarAttributeType::Number,
    ScalarAttributeType::Binary,
];

/// Suffix describing a key shape, e.g. `s`, `s_n`.
fn shape_suffix(range_key_type: Option<ScalarAttributeType>) -> String {
    match range_key_type {
        None => "s".to_string(),
        Some(rk) => format!("s_{}", rk.code().to_lowercase()),
    }
}

/// Name of the shared table hosting virtual tables of the given key shape.
pub fn shared_table_name(prefix: &str, range_key_type: Option<ScalarAttributeType>) -> String {
    format!("{prefix}{}", shape_suffix(range_key_type))
}

fn with_gsis(mut builder: TableDescriptionBuilder) -> TableDescriptionBuilder {
    let hash_only = shape_suffix(None);
    builder = builder.add_secondary_index(
        format!("gsi_{hash_only}"),
        IndexKind::Gsi,
        PrimaryKey::new(format!("gsi_{hash_only}_hk"), ScalarAttributeType::String),
    );
    for rk in RANGE_TYPES {
        let shape = shape_suffix(Some(rk));
        builder = builder.add_secondary_index(
            format!("gsi_{shape}"),
            IndexKind::Gsi,
            PrimaryKey::with_range(
                format!("gsi_{shape}_hk"),
                ScalarAttributeType::String,
                format!("gsi_{shape}_rk"),
                rk,
            ),
        );
    }
    builder
}

fn with_lsis(mut builder: TableDescriptionBuilder) -> TableDescriptionBuilder {
    for rk in RANGE_TYPES {
        let shape = shape_suffix(Some(rk));
        builder = builder.add_secondary_index(
            format!("lsi_{shape}"),
            IndexKind::Lsi,
            PrimaryKey::with_range(
                HASH_KEY_FIELD,
                ScalarAttributeType::String,
                format!("lsi_{shape}_rk"),
                rk,
            ),
        );
    }
    builder
}

/// Builds the standard shared-table catalog, ordered hash-only first.
pub fn shared_table_catalog(prefix: &str) -> Vec<TableDescription> {
    let hash_only = with_gsis(
        TableDescription::builder(shared_table_name(prefix, None))
            .hash_key(HASH_KEY_FIELD, ScalarAttributeType::String),
    )
    .build();

    let mut tables = vec![hash_only];
    for rk in RANGE_TYPES {
        let builder = TableDescription::builder(shared_table_name(prefix, Some(rk)))
            .hash_and_range_key(
                HASH_KEY_FIELD,
                ScalarAttributeType::String,
                RANGE_KEY_FIELD,
                rk,
            );
        tables.push(with_lsis(with_gsis(builder)).build());
    }
    tables
}
