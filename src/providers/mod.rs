pub mod traits;

pub use traits::CatalogService;
