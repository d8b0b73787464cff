use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Core types for the data mesh metadata layer

/// Opaque key/value payload attached to nodes, edges and products.
/// Stored and returned verbatim, never inspected.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Source,
    Transformation,
    Target,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Source => "source",
            NodeType::Transformation => "transformation",
            NodeType::Target => "target",
            NodeType::Other(s) => s,
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "source" => NodeType::Source,
            "transformation" => NodeType::Transformation,
            "target" => NodeType::Target,
            _ => NodeType::Other(value),
        }
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        NodeType::from(value.to_string())
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex in the lineage graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl DataNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<NodeType>,
        metadata: Metadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A directed data-flow relation between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEdge {
    pub source_id: String,
    pub target_id: String,
    pub transformation_type: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl DataEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        transformation_type: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            transformation_type: transformation_type.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborSummary {
    pub direct: usize,
    pub nodes: Vec<DataNode>,
}

impl NeighborSummary {
    pub fn from_nodes(nodes: Vec<DataNode>) -> Self {
        Self {
            direct: nodes.len(),
            nodes,
        }
    }
}

/// Single-hop neighbourhood of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub node: DataNode,
    pub downstream_impact: NeighborSummary,
    pub upstream_dependencies: NeighborSummary,
}

/// Transitive downstream reach of a node, keyed by node id with the
/// minimum hop distance at which each node is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactRadius {
    pub node_id: String,
    pub max_depth: Option<usize>,
    pub affected: BTreeMap<String, usize>,
}

impl ImpactRadius {
    pub fn total_affected(&self) -> usize {
        self.affected.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub node_types: BTreeMap<String, usize>,
}

/// A data product registered in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProduct {
    pub name: String,
    pub description: String,
    pub domain: String,
    pub owner: String,
    pub version: String,
    #[serde(default)]
    pub schema: Metadata,
    #[serde(default)]
    pub quality_rules: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_product_status")]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_product_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProductVersion {
    pub product_name: String,
    pub version: String,
    #[serde(default)]
    pub schema: Metadata,
    pub created_by: String,
    pub change_description: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLineage {
    pub product: String,
    pub versions: Vec<String>,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuality {
    pub product: String,
    pub quality_rules: Vec<String>,
    pub policies: Vec<String>,
    pub last_updated: DateTime<Utc>,
}
