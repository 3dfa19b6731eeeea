mod dispatch;
mod error;
mod listing;
mod operation;
mod traits;

pub use dispatch::{StoreRequest, StoreResponse};
pub use error::{Result, StoreError};
pub use listing::{list_owned_tables, DEFAULT_LIST_TABLES_LIMIT};
pub use operation::Operation;
pub use traits::{BackingStore, ContextProvider};

/// Fails with [`StoreError::UnsupportedOperation`] for operations outside the
/// served subset.
pub fn ensure_supported(operation: Operation) -> Result<()> {
    if operation.is_supported() {
        Ok(())
    } else {
        Err(StoreError::UnsupportedOperation(operation))
    }
}
