//! DynamoDB attribute and schema conversion functions.
//!
//! Pure functions converting between SDK types and the core types. These are
//! testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue as SdkValue, GlobalSecondaryIndex, KeySchemaElement,
    KeyType, LocalSecondaryIndex, Projection, ProjectionType,
    ScalarAttributeType as SdkScalarType, TableDescription as SdkTableDescription,
};
use mtdynamo_core::attribute::{AttributeValue, Item};
use mtdynamo_core::schema::{
    IndexKind, PrimaryKey, ScalarAttributeType, SecondaryIndex, TableDescription,
};
use mtdynamo_core::store::{Result, StoreError};

// ============================================================================
// Attribute values
// ============================================================================

/// Convert a core value to an SDK value.
pub fn to_sdk_value(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::B(b) => SdkValue::B(Blob::new(b.clone())),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::Null(b) => SdkValue::Null(*b),
        AttributeValue::L(list) => SdkValue::L(list.iter().map(to_sdk_value).collect()),
        AttributeValue::M(map) => SdkValue::M(to_sdk_item(map)),
        AttributeValue::Ss(set) => SdkValue::Ss(set.clone()),
        AttributeValue::Ns(set) => SdkValue::Ns(set.clone()),
        AttributeValue::Bs(set) => SdkValue::Bs(set.iter().cloned().map(Blob::new).collect()),
    }
}

/// Convert an SDK value to a core value.
pub fn from_sdk_value(value: &SdkValue) -> Result<AttributeValue> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s.clone()),
        SdkValue::N(n) => AttributeValue::N(n.clone()),
        SdkValue::B(b) => AttributeValue::B(b.as_ref().to_vec()),
        SdkValue::Bool(b) => AttributeValue::Bool(*b),
        SdkValue::Null(b) => AttributeValue::Null(*b),
        SdkValue::L(list) => {
            AttributeValue::L(list.iter().map(from_sdk_value).collect::<Result<_>>()?)
        }
        SdkValue::M(map) => AttributeValue::M(from_sdk_item(map)?),
        SdkValue::Ss(set) => AttributeValue::Ss(set.clone()),
        SdkValue::Ns(set) => AttributeValue::Ns(set.clone()),
        SdkValue::Bs(set) => AttributeValue::Bs(set.iter().map(|b| b.as_ref().to_vec()).collect()),
        other => {
            return Err(StoreError::Backend(format!(
                "Unsupported attribute value: {other:?}"
            )))
        }
    })
}

/// Convert a core item to an SDK item.
pub fn to_sdk_item(item: &Item) -> HashMap<String, SdkValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), to_sdk_value(value)))
        .collect()
}

/// Convert an SDK item to a core item.
pub fn from_sdk_item(item: &HashMap<String, SdkValue>) -> Result<Item> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), from_sdk_value(value)?)))
        .collect()
}

// ============================================================================
// Table schemas
// ============================================================================

fn to_sdk_scalar_type(key_type: ScalarAttributeType) -> SdkScalarType {
    match key_type {
        ScalarAttributeType::String => SdkScalarType::S,
        ScalarAttributeType::Number => SdkScalarType::N,
        ScalarAttributeType::Binary => SdkScalarType::B,
    }
}

fn from_sdk_scalar_type(key_type: &SdkScalarType) -> Result<ScalarAttributeType> {
    match key_type {
        SdkScalarType::S => Ok(ScalarAttributeType::String),
        SdkScalarType::N => Ok(ScalarAttributeType::Number),
        SdkScalarType::B => Ok(ScalarAttributeType::Binary),
        other => Err(StoreError::Backend(format!(
            "Unsupported key attribute type: {other:?}"
        ))),
    }
}

fn build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidRequest(err.to_string())
}

fn key_schema(key: &PrimaryKey) -> Result<Vec<KeySchemaElement>> {
    let mut schema = vec![KeySchemaElement::builder()
        .attribute_name(&key.hash_key)
        .key_type(KeyType::Hash)
        .build()
        .map_err(build_error)?];
    if let Some(rk) = &key.range_key {
        schema.push(
            KeySchemaElement::builder()
                .attribute_name(&rk.name)
                .key_type(KeyType::Range)
                .build()
                .map_err(build_error)?,
        );
    }
    Ok(schema)
}

/// Pieces of a CreateTable request derived from a table description.
#[derive(Debug, Clone)]
pub struct CreateTableParts {
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub global_secondary_indexes: Option<Vec<GlobalSecondaryIndex>>,
    pub local_secondary_indexes: Option<Vec<LocalSecondaryIndex>>,
}

/// Derive the CreateTable request pieces. Indexes project all attributes.
pub fn create_table_parts(table: &TableDescription) -> Result<CreateTableParts> {
    let mut definitions: Vec<(String, ScalarAttributeType)> = Vec::new();
    let mut define = |key: &PrimaryKey| {
        let attributes = std::iter::once((key.hash_key.clone(), key.hash_key_type)).chain(
            key.range_key
                .iter()
                .map(|rk| (rk.name.clone(), rk.key_type)),
        );
        for (name, key_type) in attributes {
            if !definitions.iter().any(|(defined, _)| *defined == name) {
                definitions.push((name, key_type));
            }
        }
    };

    define(&table.primary_key);
    let mut gsis = Vec::new();
    let mut lsis = Vec::new();
    for si in &table.secondary_indexes {
        let key = si.primary_key()?;
        define(key);
        let projection = Projection::builder()
            .projection_type(ProjectionType::All)
            .build();
        match si.kind {
            IndexKind::Gsi => gsis.push(
                GlobalSecondaryIndex::builder()
                    .index_name(&si.name)
                    .set_key_schema(Some(key_schema(key)?))
                    .projection(projection)
                    .build()
                    .map_err(build_error)?,
            ),
            IndexKind::Lsi => lsis.push(
                LocalSecondaryIndex::builder()
                    .index_name(&si.name)
                    .set_key_schema(Some(key_schema(key)?))
                    .projection(projection)
                    .build()
                    .map_err(build_error)?,
            ),
        }
    }

    let attribute_definitions = definitions
        .into_iter()
        .map(|(name, key_type)| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(to_sdk_scalar_type(key_type))
                .build()
                .map_err(build_error)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CreateTableParts {
        key_schema: key_schema(&table.primary_key)?,
        attribute_definitions,
        global_secondary_indexes: (!gsis.is_empty()).then_some(gsis),
        local_secondary_indexes: (!lsis.is_empty()).then_some(lsis),
    })
}

fn primary_key_from_schema(
    schema: &[KeySchemaElement],
    types: &HashMap<&str, ScalarAttributeType>,
) -> Result<PrimaryKey> {
    let lookup = |key_type: KeyType| -> Result<Option<(String, ScalarAttributeType)>> {
        schema
            .iter()
            .find(|element| *element.key_type() == key_type)
            .map(|element| {
                let name = element.attribute_name();
                types
                    .get(name)
                    .map(|t| (name.to_string(), *t))
                    .ok_or_else(|| {
                        StoreError::Backend(format!("Key attribute {name} has no definition"))
                    })
            })
            .transpose()
    };

    let (hash_key, hash_key_type) = lookup(KeyType::Hash)?
        .ok_or_else(|| StoreError::Backend("Key schema has no hash key".to_string()))?;
    Ok(match lookup(KeyType::Range)? {
        Some((range_key, range_key_type)) => {
            PrimaryKey::with_range(hash_key, hash_key_type, range_key, range_key_type)
        }
        None => PrimaryKey::new(hash_key, hash_key_type),
    })
}

/// Convert an SDK table description to a core description.
pub fn from_sdk_table(table: &SdkTableDescription) -> Result<TableDescription> {
    let name = table
        .table_name()
        .ok_or_else(|| StoreError::Backend("Table description has no name".to_string()))?;
    let types = table
        .attribute_definitions()
        .iter()
        .map(|definition| {
            Ok((
                definition.attribute_name(),
                from_sdk_scalar_type(definition.attribute_type())?,
            ))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    let mut secondary_indexes = Vec::new();
    for gsi in table.global_secondary_indexes() {
        secondary_indexes.push(SecondaryIndex::new(
            gsi.index_name().unwrap_or_default(),
            IndexKind::Gsi,
            primary_key_from_schema(gsi.key_schema(), &types)?,
        ));
    }
    for lsi in table.local_secondary_indexes() {
        secondary_indexes.push(SecondaryIndex::new(
            lsi.index_name().unwrap_or_default(),
            IndexKind::Lsi,
            primary_key_from_schema(lsi.key_schema(), &types)?,
        ));
    }

    Ok(TableDescription {
        name: name.to_string(),
        primary_key: primary_key_from_schema(table.key_schema(), &types)?,
        secondary_indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtdynamo_core::schema::ScalarAttributeType::{Number as N, String as S};

    fn sample_table() -> TableDescription {
        TableDescription::builder("shared")
            .hash_and_range_key("hk", S, "rk", N)
            .add_secondary_index("gsi", IndexKind::Gsi, PrimaryKey::new("gsi_hk", S))
            .add_secondary_index(
                "lsi",
                IndexKind::Lsi,
                PrimaryKey::with_range("hk", S, "lsi_rk", N),
            )
            .build()
    }

    #[test]
    fn test_value_conversion_preserves_nesting() {
        let item = Item::from([
            ("s".to_string(), AttributeValue::S("x".to_string())),
            ("b".to_string(), AttributeValue::B(vec![1, 2])),
            (
                "m".to_string(),
                AttributeValue::M(Item::from([(
                    "l".to_string(),
                    AttributeValue::L(vec![AttributeValue::N("1".to_string())]),
                )])),
            ),
        ]);
        let sdk = to_sdk_item(&item);
        assert_eq!(sdk["s"], SdkValue::S("x".to_string()));
        assert_eq!(from_sdk_item(&sdk).unwrap(), item);
    }

    #[test]
    fn test_create_table_parts() {
        let parts = create_table_parts(&sample_table()).unwrap();

        assert_eq!(parts.key_schema.len(), 2);
        let defined: Vec<&str> = parts
            .attribute_definitions
            .iter()
            .map(|d| d.attribute_name())
            .collect();
        assert_eq!(defined, vec!["hk", "rk", "gsi_hk", "lsi_rk"]);
        assert_eq!(parts.global_secondary_indexes.map(|g| g.len()), Some(1));
        assert_eq!(parts.local_secondary_indexes.map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_table_description_round_trip() {
        let table = sample_table();
        let parts = create_table_parts(&table).unwrap();
        let sdk = SdkTableDescription::builder()
            .table_name("shared")
            .set_key_schema(Some(parts.key_schema))
            .set_attribute_definitions(Some(parts.attribute_definitions))
            .set_global_secondary_indexes(Some(vec![
                aws_sdk_dynamodb::types::GlobalSecondaryIndexDescription::builder()
                    .index_name("gsi")
                    .set_key_schema(Some(key_schema(&PrimaryKey::new("gsi_hk", S)).unwrap()))
                    .build(),
            ]))
            .set_local_secondary_indexes(Some(vec![
                aws_sdk_dynamodb::types::LocalSecondaryIndexDescription::builder()
                    .index_name("lsi")
                    .set_key_schema(Some(
                        key_schema(&PrimaryKey::with_range("hk", S, "lsi_rk", N)).unwrap(),
                    ))
                    .build(),
            ]))
            .build();

        assert_eq!(from_sdk_table(&sdk).unwrap(), table);
    }
}
