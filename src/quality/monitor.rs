use crate::error::MeshError;
use crate::quality::engine::{QualityEngine, QualityResult, QualityRule};
use crate::types::Metadata;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub domain: String,
    pub timestamp: DateTime<Utc>,
    pub quality_score: f64,
    pub total_checks: u64,
    pub check_duration: f64,
}

/// Runs the engine's rules over whole records and keeps per-domain scores.
///
/// Counts are mirrored into the `metrics` facade; when no recorder is
/// installed those calls are no-ops.
#[derive(Debug, Default)]
pub struct QualityMonitor {
    engine: QualityEngine,
    domain_scores: HashMap<String, f64>,
    total_checks: u64,
    check_duration: Duration,
}

impl QualityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_quality_rule(&mut self, rule: QualityRule) {
        info!("Added quality rule to monitor: {}", rule.name);
        self.engine.add_rule(rule);
    }

    pub fn engine(&self) -> &QualityEngine {
        &self.engine
    }

    /// Check every field of `record` against every rule and update the
    /// domain's score
    #[instrument(skip(self, record), fields(field_count = record.len()))]
    pub fn check_quality(
        &mut self,
        record: &Metadata,
        domain: &str,
    ) -> Result<Vec<QualityResult>, MeshError> {
        let mut results = Vec::new();
        let rule_names = self.engine.rule_names();

        for value in record.values() {
            for rule_name in &rule_names {
                let started = Instant::now();
                let rule_results = self.engine.validate_data(value, Some(rule_name))?;
                let elapsed = started.elapsed();

                self.check_duration += elapsed;
                histogram!(
                    "data_quality_check_duration_seconds",
                    elapsed.as_secs_f64(),
                    "rule_name" => rule_name.clone()
                );

                for result in &rule_results {
                    self.total_checks += 1;
                    let outcome = if result.passed { "passed" } else { "failed" };
                    counter!(
                        "data_quality_checks_total",
                        1,
                        "rule_name" => rule_name.clone(),
                        "result" => outcome
                    );
                }

                results.extend(rule_results);
            }
        }

        self.update_quality_score(domain, &results);
        Ok(results)
    }

    fn update_quality_score(&mut self, domain: &str, results: &[QualityResult]) {
        if results.is_empty() {
            return;
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let score = passed as f64 / results.len() as f64 * 100.0;

        self.domain_scores.insert(domain.to_string(), score);
        gauge!("data_quality_score", score, "domain" => domain.to_string());
        info!("Updated quality score for domain {}: {:.2}%", domain, score);
    }

    pub fn quality_report(&self, domain: &str) -> QualityReport {
        QualityReport {
            domain: domain.to_string(),
            timestamp: Utc::now(),
            quality_score: self.domain_scores.get(domain).copied().unwrap_or(0.0),
            total_checks: self.total_checks,
            check_duration: self.check_duration.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::engine::tests::rule;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_quality_monitor_check() {
        let mut monitor = QualityMonitor::new();
        monitor.add_quality_rule(rule("test_rule", "not_null", json!({})));

        let results = monitor
            .check_quality(&record(json!({"field1": "test", "field2": null})), "test_domain")
            .unwrap();
        assert_eq!(results.len(), 2);

        let report = monitor.quality_report("test_domain");
        assert_eq!(report.domain, "test_domain");
        assert_eq!(report.quality_score, 50.0);
        assert_eq!(report.total_checks, 2);
    }

    #[test]
    fn test_quality_monitor_report_defaults() {
        let mut monitor = QualityMonitor::new();
        monitor.add_quality_rule(rule("test_rule", "not_null", json!({})));
        monitor
            .check_quality(&record(json!({"field1": "test"})), "test_domain")
            .unwrap();

        let report = monitor.quality_report("test_domain");
        assert_eq!(report.quality_score, 100.0);
        assert!(report.check_duration >= 0.0);

        let untouched = monitor.quality_report("other_domain");
        assert_eq!(untouched.quality_score, 0.0);
        assert_eq!(untouched.total_checks, 1);
    }

    #[test]
    fn test_empty_record_keeps_previous_score() {
        let mut monitor = QualityMonitor::new();
        monitor.add_quality_rule(rule("test_rule", "not_null", json!({})));
        monitor
            .check_quality(&record(json!({"a": null})), "sales")
            .unwrap();
        monitor.check_quality(&Metadata::new(), "sales").unwrap();

        assert_eq!(monitor.quality_report("sales").quality_score, 0.0);
        assert_eq!(monitor.quality_report("sales").total_checks, 1);
    }

    #[test]
    fn test_multiple_rules_per_field() {
        let mut monitor = QualityMonitor::new();
        monitor.add_quality_rule(rule("present", "not_null", json!({})));
        monitor.add_quality_rule(rule("small", "range", json!({"min": 0, "max": 10})));

        let results = monitor
            .check_quality(&record(json!({"count": 42})), "inventory")
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rule_name, "present");
        assert!(results[0].passed);
        assert_eq!(results[1].rule_name, "small");
        assert!(!results[1].passed);
        assert_eq!(monitor.quality_report("inventory").quality_score, 50.0);
        assert_eq!(monitor.engine().check_history("small").len(), 1);
    }
}
