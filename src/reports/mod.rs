pub mod formatters;

pub use formatters::{formatter_for, JsonFormatter, LineageReport, ReportFormatter, TextFormatter};
