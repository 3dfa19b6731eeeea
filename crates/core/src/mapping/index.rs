use crate::schema::{SecondaryIndex, TableDescription};

use super::compat::check_compatible_primary_key;
use super::{MappingError, Result};

/// Chooses the physical secondary index that hosts a virtual one.
pub trait SecondaryIndexMapper: Send + Sync {
    /// Returns the physical index of `physical_table` that hosts
    /// `virtual_index`.
    ///
    /// Implementations must surface errors from `virtual_index.primary_key()`
    /// unchanged.
    fn lookup_physical_secondary_index<'a>(
        &self,
        virtual_index: &SecondaryIndex,
        physical_table: &'a TableDescription,
    ) -> Result<&'a SecondaryIndex>;
}

/// Standard strategy: first physical index of the same kind, in declaration
/// order, whose key is compatible with the virtual index key.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexMapperByKind;

impl SecondaryIndexMapper for IndexMapperByKind {
    fn lookup_physical_secondary_index<'a>(
        &self,
        virtual_index: &SecondaryIndex,
        physical_table: &'a TableDescription,
    ) -> Result<&'a SecondaryIndex> {
        let virtual_key = virtual_index.primary_key()?;

        physical_table
            .secondary_indexes
            .iter()
            .filter(|candidate| candidate.kind == virtual_index.kind)
            .find(|candidate| {
                candidate
                    .primary_key()
                    .and_then(|physical_key| check_compatible_primary_key(virtual_key, physical_key))
                    .is_ok()
            })
            .ok_or_else(|| {
                MappingError::IndexNotFound(format!(
                    "no compatible physical {} found for virtual index {} on physical table {}",
                    virtual_index.kind, virtual_index.name, physical_table.name
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarAttributeType::{Binary as B, Number as N, String as S};
    use crate::schema::{IndexKind, PrimaryKey};

    fn physical() -> TableDescription {
        TableDescription::builder("physical")
            .hash_and_range_key("hk", S, "rk", S)
            .add_secondary_index("gsi_s", IndexKind::Gsi, PrimaryKey::new("gsi_s_hk", S))
            .add_secondary_index(
                "gsi_s_n",
                IndexKind::Gsi,
                PrimaryKey::with_range("gsi_s_n_hk", S, "gsi_s_n_rk", N),
            )
            .add_secondary_index(
                "lsi_s_n",
                IndexKind::Lsi,
                PrimaryKey::with_range("hk", S, "lsi_s_n_rk", N),
            )
            .build()
    }

    #[test]
    fn test_picks_compatible_index_of_same_kind() {
        let table = physical();
        let virtual_gsi = SecondaryIndex::new(
            "by_date",
            IndexKind::Gsi,
            PrimaryKey::with_range("owner", S, "date", N),
        );
        let found = IndexMapperByKind
            .lookup_physical_secondary_index(&virtual_gsi, &table)
            .unwrap();
        assert_eq!(found.name, "gsi_s_n");

        let virtual_lsi = SecondaryIndex::new(
            "by_size",
            IndexKind::Lsi,
            PrimaryKey::with_range("id", S, "size", N),
        );
        let found = IndexMapperByKind
            .lookup_physical_secondary_index(&virtual_lsi, &table)
            .unwrap();
        assert_eq!(found.name, "lsi_s_n");
    }

    #[test]
    fn test_first_fit_for_hash_only_index() {
        let table = physical();
        let virtual_gsi = SecondaryIndex::new("g", IndexKind::Gsi, PrimaryKey::new("x", S));
        let found = IndexMapperByKind
            .lookup_physical_secondary_index(&virtual_gsi, &table)
            .unwrap();
        assert_eq!(found.name, "gsi_s");
    }

    #[test]
    fn test_no_compatible_index() {
        let table = physical();
        let virtual_gsi = SecondaryIndex::new(
            "by_blob",
            IndexKind::Gsi,
            PrimaryKey::with_range("owner", S, "blob", B),
        );
        let err = IndexMapperByKind
            .lookup_physical_secondary_index(&virtual_gsi, &table)
            .unwrap_err();
        assert!(matches!(err, MappingError::IndexNotFound(_)));
        assert_eq!(
            err.to_string(),
            "no compatible physical GSI found for virtual index by_blob on physical table physical"
        );
    }

    #[test]
    fn test_inconsistent_virtual_index_error_is_surfaced_unchanged() {
        let table = physical();
        let broken = SecondaryIndex::new("broken", IndexKind::Gsi, PrimaryKey::new("", S));
        let expected = broken.primary_key().unwrap_err();
        let err = IndexMapperByKind
            .lookup_physical_secondary_index(&broken, &table)
            .unwrap_err();
        assert_eq!(err, expected);
    }
}
