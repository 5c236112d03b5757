//! Catalog and image logic behind the movie database server.
//!
//! - [`catalog`]: catalog service and actor/genre id allocation
//! - [`database`]: the [`CatalogStore`](database::CatalogStore) port and its
//!   MongoDB and in-memory adapters
//! - [`image`]: on-demand derivation, placeholders and face crops

pub mod catalog;
pub mod database;
pub mod error;
pub mod image;

pub use catalog::{CatalogService, IdAllocator};
pub use database::{CatalogStore, InMemoryCatalogStore, MongoCatalogStore};
pub use error::{CatalogError, Result};
