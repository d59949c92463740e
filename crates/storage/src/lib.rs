#![forbid(unsafe_code)]

pub mod catalog;
pub mod repository;
pub mod sqlite;

pub use catalog::{CatalogDocument, InMemoryCatalog};
pub use repository::{ContentCatalog, InMemoryRepository, ProgressRepository, Storage, StorageError};
