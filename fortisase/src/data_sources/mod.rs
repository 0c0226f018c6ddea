//! Data sources: read-only lookups of catalog objects by primary key

pub mod generic;

pub use generic::SaseDataSource;
