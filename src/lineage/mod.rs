pub mod document;
pub mod graph;
pub mod service;
pub mod traversal;

pub use document::{load_definitions, LineageDocument, LoadStats};
pub use graph::LineageGraph;
pub use service::LineageService;
pub use traversal::GraphTraversal;
