pub mod catalog;
pub mod config;
pub mod error;
pub mod governance;
pub mod lineage;
pub mod quality;
pub mod reports;
pub mod types;
