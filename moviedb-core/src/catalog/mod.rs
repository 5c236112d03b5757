pub mod id_allocator;
pub mod service;

pub use id_allocator::IdAllocator;
pub use service::CatalogService;
