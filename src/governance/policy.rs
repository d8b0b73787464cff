use crate::error::MeshError;
use crate::types::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{error, info};

/// A governance policy scoped to one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub policy_type: String,
    #[serde(default)]
    pub parameters: Metadata,
    pub domain: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    DataClassification,
    AccessControl,
    DataRetention,
}

impl PolicyKind {
    fn label(&self) -> &'static str {
        match self {
            PolicyKind::DataClassification => "Data classification",
            PolicyKind::AccessControl => "Access control",
            PolicyKind::DataRetention => "Data retention",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_classification" => Ok(PolicyKind::DataClassification),
            "access_control" => Ok(PolicyKind::AccessControl),
            "data_retention" => Ok(PolicyKind::DataRetention),
            other => Err(MeshError::UnknownPolicyType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub policy_name: String,
    pub passed: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<Value>,
}

#[derive(Debug, Default)]
pub struct PolicyEngine {
    policies: BTreeMap<String, Policy>,
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_policy(&mut self, policy: Policy) {
        info!("Added policy: {}", policy.name);
        self.policies.insert(policy.name.clone(), policy);
    }

    pub fn remove_policy(&mut self, policy_name: &str) {
        if self.policies.remove(policy_name).is_some() {
            info!("Removed policy: {}", policy_name);
        }
    }

    pub fn get_policy(&self, policy_name: &str) -> Option<&Policy> {
        self.policies.get(policy_name)
    }

    /// Check `data` against one named policy, or against every enabled
    /// policy of `domain` when no name is given
    pub fn check_policy(
        &self,
        data: &Value,
        domain: &str,
        policy_name: Option<&str>,
    ) -> Result<Vec<PolicyResult>, MeshError> {
        let selected: Vec<&Policy> = match policy_name {
            Some(name) => vec![self
                .policies
                .get(name)
                .ok_or_else(|| MeshError::PolicyNotFound(name.to_string()))?],
            None => self
                .policies
                .values()
                .filter(|policy| policy.enabled && policy.domain == domain)
                .collect(),
        };

        Ok(selected
            .into_iter()
            .map(|policy| match Self::execute_policy(policy, data) {
                Ok(result) => result,
                Err(e) => {
                    error!("Error executing policy {}: {}", policy.name, e);
                    PolicyResult {
                        policy_name: policy.name.clone(),
                        passed: false,
                        message: format!("Error executing policy: {}", e),
                        timestamp: Utc::now(),
                        details: None,
                    }
                }
            })
            .collect())
    }

    // Classification, access and retention checks are not enforced yet;
    // every known policy type passes.
    fn execute_policy(policy: &Policy, _data: &Value) -> Result<PolicyResult, MeshError> {
        let kind: PolicyKind = policy.policy_type.parse()?;

        Ok(PolicyResult {
            policy_name: policy.name.clone(),
            passed: true,
            message: format!("{} check passed", kind.label()),
            timestamp: Utc::now(),
            details: None,
        })
    }
}
