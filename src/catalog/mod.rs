pub mod registry;

pub use registry::DataCatalog;
