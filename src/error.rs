use thiserror::Error;

/// A lineage operation referenced a node id that is not in the graph.
///
/// This is the only failure the lineage core produces; the request layer
/// translates it into a "not found" response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("source or target node not found")]
    MissingEndpoint { source_id: String, target_id: String },

    #[error("node {0} not found")]
    NodeNotFound(String),
}

/// Failures raised by the catalog, quality and governance registries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Rule {0} not found")]
    RuleNotFound(String),

    #[error("Policy {0} not found")]
    PolicyNotFound(String),

    #[error("Unknown rule type: {0}")]
    UnknownRuleType(String),

    #[error("Unknown policy type: {0}")]
    UnknownPolicyType(String),

    #[error("rule {rule} could not be evaluated: {reason}")]
    RuleEvaluation { rule: String, reason: String },

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}
