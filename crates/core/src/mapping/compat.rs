//! Primary-key compatibility rule shared by table and index mapping.

use crate::schema::{PrimaryKey, ScalarAttributeType};

use super::{MappingError, Result};

/// Checks that `physical` can host `virtual_key`.
///
/// Both hash keys must be strings. The virtual range key, if any, must exist
/// on the physical side with the same type. A physical range key with no virtual counterpart is allowed.
pub(crate) fn check_compatible_primary_key(
    virtual_key: &PrimaryKey,
    physical_key: &PrimaryKey,
) -> Result<()> {
    if !virtual_key.has_hash_key() {
        return Err(MappingError::MissingKey(
            "hash key is required on virtual table".to_string(),
        ));
    }
    if !physical_key.has_hash_key() {
        return Err(MappingError::MissingKey(
            "hash key is required on physical table".to_string(),
        ));
    }
    if virtual_key.hash_key_type != ScalarAttributeType::String
        || physical_key.hash_key_type != ScalarAttributeType::String
    {
        return Err(MappingError::TypeMismatch(
            "hash key must be of type S".to_string(),
        ));
    }

    if let Some(virtual_rk) = &virtual_key.range_key {
        let Some(physical_rk) = &physical_key.range_key else {
            return Err(MappingError::StructuralMismatch(
                "rangeKey exists on virtual primary key but not on physical".to_string(),
            ));
        };
        if virtual_rk.key_type != physical_rk.key_type {
            return Err(MappingError::TypeMismatch(
                "virtual and physical range-key types mismatch".to_string(),
            ));
        }
    }

    Ok(())
}
