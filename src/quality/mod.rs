pub mod engine;
pub mod monitor;

pub use engine::{QualityEngine, QualityMetrics, QualityResult, QualityRule, RuleKind};
pub use monitor::{QualityMonitor, QualityReport};
