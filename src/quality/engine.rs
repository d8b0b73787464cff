use crate::error::MeshError;
use crate::types::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;

/// A configurable check applied to individual values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_type: String,
    #[serde(default)]
    pub parameters: Metadata,
    pub severity: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Check implementations known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    NotNull,
    Range,
    Completeness,
    Accuracy,
    Consistency,
    Timeliness,
}

impl FromStr for RuleKind {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_null" => Ok(RuleKind::NotNull),
            "range" => Ok(RuleKind::Range),
            "completeness" => Ok(RuleKind::Completeness),
            "accuracy" => Ok(RuleKind::Accuracy),
            "consistency" => Ok(RuleKind::Consistency),
            "timeliness" => Ok(RuleKind::Timeliness),
            other => Err(MeshError::UnknownRuleType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub id: Uuid,
    pub rule_name: String,
    pub passed: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub pass_rate: f64,
    pub active_rules: usize,
}

struct Outcome {
    passed: bool,
    message: String,
    details: Option<Value>,
}

/// Rule registry and dispatcher
#[derive(Debug, Default)]
pub struct QualityEngine {
    rules: BTreeMap<String, QualityRule>,
    history: HashMap<String, Vec<QualityResult>>,
}

impl QualityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: QualityRule) {
        info!("Added quality rule: {}", rule.name);
        self.rules.insert(rule.name.clone(), rule);
    }

    pub fn remove_rule(&mut self, rule_name: &str) {
        if self.rules.remove(rule_name).is_some() {
            info!("Removed quality rule: {}", rule_name);
        }
    }

    pub fn get_rule(&self, rule_name: &str) -> Option<&QualityRule> {
        self.rules.get(rule_name)
    }

    /// Rule names in evaluation order
    pub fn rule_names(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }

    /// Validate a value against one named rule, or every rule when
    /// `rule_name` is `None`. Disabled rules are skipped. A rule that cannot
    /// be evaluated produces a failed result rather than an error.
    pub fn validate_data(
        &mut self,
        value: &Value,
        rule_name: Option<&str>,
    ) -> Result<Vec<QualityResult>, MeshError> {
        let rules: Vec<QualityRule> = match rule_name {
            Some(name) => vec![self
                .rules
                .get(name)
                .cloned()
                .ok_or_else(|| MeshError::RuleNotFound(name.to_string()))?],
            None => self.rules.values().cloned().collect(),
        };

        let mut results = Vec::new();
        for rule in rules.iter().filter(|rule| rule.enabled) {
            let outcome = Self::execute_rule(rule, value).unwrap_or_else(|e| {
                error!("Error executing rule {}: {}", rule.name, e);
                Outcome {
                    passed: false,
                    message: format!("Error executing rule: {}", e),
                    details: None,
                }
            });

            let result = QualityResult {
                id: Uuid::new_v4(),
                rule_name: rule.name.clone(),
                passed: outcome.passed,
                message: outcome.message,
                timestamp: Utc::now(),
                details: outcome.details,
            };

            self.history
                .entry(rule.name.clone())
                .or_default()
                .push(result.clone());
            results.push(result);
        }

        Ok(results)
    }

    fn execute_rule(rule: &QualityRule, value: &Value) -> Result<Outcome, MeshError> {
        match rule.rule_type.parse::<RuleKind>()? {
            RuleKind::NotNull => {
                let passed = !value.is_null();
                Ok(Outcome {
                    passed,
                    message: if passed { "Value is not null" } else { "Value is null" }.to_string(),
                    details: None,
                })
            }
            RuleKind::Range => Self::check_range(rule, value),
            RuleKind::Completeness => Self::check_completeness(rule, value),
            RuleKind::Accuracy => Ok(Self::stub_pass("Accuracy")),
            RuleKind::Consistency => Ok(Self::stub_pass("Consistency")),
            RuleKind::Timeliness => Ok(Self::stub_pass("Timeliness")),
        }
    }

    fn check_range(rule: &QualityRule, value: &Value) -> Result<Outcome, MeshError> {
        let bound = |key: &str| {
            rule.parameters
                .get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| MeshError::RuleEvaluation {
                    rule: rule.name.clone(),
                    reason: format!("missing numeric parameter '{}'", key),
                })
        };
        let (min, max) = (bound("min")?, bound("max")?);

        let number = value.as_f64().ok_or_else(|| MeshError::RuleEvaluation {
            rule: rule.name.clone(),
            reason: format!("value {} is not numeric", value),
        })?;

        let passed = min <= number && number <= max;
        let message = if passed {
            format!("Value {} is within range [{}, {}]", value, min, max)
        } else {
            format!("Value {} is outside range [{}, {}]", value, min, max)
        };

        Ok(Outcome {
            passed,
            message,
            details: None,
        })
    }

    fn check_completeness(rule: &QualityRule, value: &Value) -> Result<Outcome, MeshError> {
        let record = value.as_object().ok_or_else(|| MeshError::RuleEvaluation {
            rule: rule.name.clone(),
            reason: "completeness requires an object value".to_string(),
        })?;

        let missing: Vec<String> = rule
            .parameters
            .get("required_fields")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|field| !record.contains_key(*field))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let message = if missing.is_empty() {
            "All required fields present".to_string()
        } else {
            format!("Missing required fields: {:?}", missing)
        };

        Ok(Outcome {
            passed: missing.is_empty(),
            message,
            details: Some(json!({ "missing_fields": missing })),
        })
    }

    fn stub_pass(check: &str) -> Outcome {
        Outcome {
            passed: true,
            message: format!("{} check passed", check),
            details: None,
        }
    }

    pub fn check_history(&self, rule_name: &str) -> &[QualityResult] {
        self.history
            .get(rule_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn quality_metrics(&self) -> QualityMetrics {
        let total_checks: usize = self.history.values().map(Vec::len).sum();
        let passed_checks = self
            .history
            .values()
            .flatten()
            .filter(|result| result.passed)
            .count();

        let pass_rate = if total_checks > 0 {
            passed_checks as f64 / total_checks as f64 * 100.0
        } else {
            0.0
        };

        QualityMetrics {
            total_checks,
            passed_checks,
            pass_rate,
            active_rules: self.rules.values().filter(|rule| rule.enabled).count(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn rule(name: &str, rule_type: &str, parameters: Value) -> QualityRule {
        QualityRule {
            name: name.to_string(),
            description: format!("{} rule", name),
            rule_type: rule_type.to_string(),
            parameters: parameters.as_object().cloned().unwrap_or_default(),
            severity: "high".to_string(),
            enabled: true,
        }
    }

    #[test]
    fn test_add_and_remove_rule() {
        let mut engine = QualityEngine::new();
        let not_null = rule("test_rule", "not_null", json!({}));
        engine.add_rule(not_null.clone());
        assert_eq!(engine.get_rule("test_rule"), Some(&not_null));

        engine.remove_rule("test_rule");
        assert!(engine.get_rule("test_rule").is_none());
        engine.remove_rule("test_rule");
    }

    #[test]
    fn test_validate_data_not_null() {
        let mut engine = QualityEngine::new();
        engine.add_rule(rule("test_rule", "not_null", json!({})));

        let results = engine.validate_data(&json!("test"), None).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);

        let results = engine.validate_data(&Value::Null, None).unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
    }

    #[test]
    fn test_validate_data_range() {
        let mut engine = QualityEngine::new();
        engine.add_rule(rule("range_rule", "range", json!({"min": 1, "max": 10})));

        assert!(engine.validate_data(&json!(5), None).unwrap()[0].passed);

        let outside = engine.validate_data(&json!(11), None).unwrap();
        assert!(!outside[0].passed);
        assert!(outside[0].message.contains("outside range"));
    }

    #[test]
    fn test_range_on_non_numeric_value_fails() {
        let mut engine = QualityEngine::new();
        engine.add_rule(rule("range_rule", "range", json!({"min": 1, "max": 10})));

        let results = engine.validate_data(&json!("eleven"), None).unwrap();
        assert!(!results[0].passed);
        assert!(results[0].message.starts_with("Error executing rule:"));
    }

    #[test]
    fn test_completeness() {
        let mut engine = QualityEngine::new();
        engine.add_rule(rule(
            "complete",
            "completeness",
            json!({"required_fields": ["id", "name"]}),
        ));

        let results = engine.validate_data(&json!({"id": 1}), None).unwrap();
        assert!(!results[0].passed);
        assert_eq!(results[0].details, Some(json!({"missing_fields": ["name"]})));

        let results = engine
            .validate_data(&json!({"id": 1, "name": "x"}), None)
            .unwrap();
        assert!(results[0].passed);
    }

    #[test]
    fn test_unknown_rule_type_is_failed_result() {
        let mut engine = QualityEngine::new();
        engine.add_rule(rule("mystery", "freshness", json!({})));

        let results = engine.validate_data(&json!(1), None).unwrap();
        assert!(!results[0].passed);
        assert_eq!(
            results[0].message,
            "Error executing rule: Unknown rule type: freshness"
        );
    }

    #[test]
    fn test_unknown_rule_name() {
        let mut engine = QualityEngine::new();
        assert_eq!(
            engine.validate_data(&json!(1), Some("missing")),
            Err(MeshError::RuleNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let mut engine = QualityEngine::new();
        let mut disabled = rule("off", "not_null", json!({}));
        disabled.enabled = false;
        engine.add_rule(disabled);
        engine.add_rule(rule("accurate", "accuracy", json!({})));

        let results = engine.validate_data(&json!(1), None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule_name, "accurate");
        assert_eq!(engine.quality_metrics().active_rules, 1);
    }

    #[test]
    fn test_history_and_metrics() {
        let mut engine = QualityEngine::new();
        assert_eq!(engine.quality_metrics().pass_rate, 0.0);

        engine.add_rule(rule("test_rule", "not_null", json!({})));
        engine.validate_data(&json!(1), None).unwrap();
        engine.validate_data(&Value::Null, None).unwrap();

        assert_eq!(engine.check_history("test_rule").len(), 2);
        assert!(engine.check_history("other").is_empty());

        let metrics = engine.quality_metrics();
        assert_eq!(metrics.total_checks, 2);
        assert_eq!(metrics.passed_checks, 1);
        assert_eq!(metrics.pass_rate, 50.0);
    }
}
