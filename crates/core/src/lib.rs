//! Pure core of the multitenant shared-table layer: schema descriptions,
//! virtual-to-physical mappings and the store contracts. Nothing here performs
//! I/O.

pub mod attribute;
pub mod mapping;
pub mod request;
pub mod schema;
pub mod store;
