pub mod memory;
pub mod mongo;
pub mod ports;

pub use memory::InMemoryCatalogStore;
pub use mongo::MongoCatalogStore;
pub use ports::CatalogStore;
