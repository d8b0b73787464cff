use crate::error::ReferenceError;
use crate::types::{DataEdge, DataNode, GraphSummary};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Node and edge store for the lineage graph.
///
/// Nodes are keyed by their caller-assigned id. Edges are never removed, so
/// petgraph edge indices grow monotonically and double as insertion order.
#[derive(Debug, Default)]
pub struct LineageGraph {
    graph: DiGraph<DataNode, DataEdge>,
    node_map: HashMap<String, NodeIndex>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Insert a node, replacing any existing record with the same id.
    /// Edges that reference the id are left untouched.
    pub fn add_node(&mut self, node: DataNode) {
        match self.node_map.get(&node.id) {
            Some(&index) => {
                debug!("Replacing node {}", node.id);
                self.graph[index] = node;
            }
            None => {
                let id = node.id.clone();
                let index = self.graph.add_node(node);
                self.node_map.insert(id, index);
            }
        }
    }

    /// Append an edge. Both endpoints must already exist; on failure the
    /// edge sequence is not modified.
    pub fn add_edge(&mut self, edge: DataEdge) -> Result<(), ReferenceError> {
        let endpoints = (
            self.node_map.get(&edge.source_id).copied(),
            self.node_map.get(&edge.target_id).copied(),
        );

        let (Some(from_index), Some(to_index)) = endpoints else {
            return Err(ReferenceError::MissingEndpoint {
                source_id: edge.source_id,
                target_id: edge.target_id,
            });
        };

        self.graph.add_edge(from_index, to_index, edge);
        Ok(())
    }

    pub fn get_node(&self, node_id: &str) -> Option<&DataNode> {
        self.node_map.get(node_id).map(|&index| &self.graph[index])
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node_map.contains_key(node_id)
    }

    /// Direct predecessors of a node, one entry per incoming edge, in edge
    /// insertion order. Unknown ids yield an empty list.
    pub fn upstream_of(&self, node_id: &str) -> Vec<DataNode> {
        let Some(&index) = self.node_map.get(node_id) else {
            return Vec::new();
        };

        self.edges_in_order(index, Direction::Incoming)
            .into_iter()
            .filter_map(|edge_index| self.get_node(&self.graph[edge_index].source_id))
            .cloned()
            .collect()
    }

    /// Direct successors of a node, one entry per outgoing edge, in edge
    /// insertion order. Unknown ids yield an empty list.
    pub fn downstream_of(&self, node_id: &str) -> Vec<DataNode> {
        let Some(&index) = self.node_map.get(node_id) else {
            return Vec::new();
        };

        self.edges_in_order(index, Direction::Outgoing)
            .into_iter()
            .filter_map(|edge_index| self.get_node(&self.graph[edge_index].target_id))
            .cloned()
            .collect()
    }

    /// All nodes, sorted by id
    pub fn nodes(&self) -> Vec<DataNode> {
        let mut nodes: Vec<DataNode> = self
            .graph
            .raw_nodes()
            .iter()
            .map(|node| node.weight.clone())
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> Vec<DataEdge> {
        self.graph
            .raw_edges()
            .iter()
            .map(|edge| edge.weight.clone())
            .collect()
    }

    /// Get root nodes (nodes with no incoming edges), sorted by id
    pub fn root_nodes(&self) -> Vec<String> {
        self.nodes_without(Direction::Incoming)
    }

    /// Get leaf nodes (nodes with no outgoing edges), sorted by id
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.nodes_without(Direction::Outgoing)
    }

    fn nodes_without(&self, direction: Direction) -> Vec<String> {
        let mut ids: Vec<String> = self
            .node_map
            .iter()
            .filter(|(_, index)| {
                self.graph
                    .neighbors_directed(**index, direction)
                    .next()
                    .is_none()
            })
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Count nodes and edges, grouping nodes by type
    pub fn summary(&self) -> GraphSummary {
        let mut node_types = BTreeMap::new();
        for node in self.graph.raw_nodes() {
            *node_types
                .entry(node.weight.node_type.to_string())
                .or_insert(0) += 1;
        }

        GraphSummary {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            node_types,
        }
    }

    pub(crate) fn index_of(&self, node_id: &str) -> Option<NodeIndex> {
        self.node_map.get(node_id).copied()
    }

    pub(crate) fn node_at(&self, index: NodeIndex) -> &DataNode {
        &self.graph[index]
    }

    pub(crate) fn edge_at(&self, index: EdgeIndex) -> &DataEdge {
        &self.graph[index]
    }

    pub(crate) fn edge_source(&self, index: EdgeIndex) -> Option<NodeIndex> {
        self.graph.edge_endpoints(index).map(|(source, _)| source)
    }

    pub(crate) fn edge_target(&self, index: EdgeIndex) -> Option<NodeIndex> {
        self.graph.edge_endpoints(index).map(|(_, target)| target)
    }

    /// Edges touching `index` in the given direction, oldest first.
    /// petgraph walks adjacency lists newest first, so sort by edge index.
    pub(crate) fn edges_in_order(&self, index: NodeIndex, direction: Direction) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| edge.id())
            .collect();
        edges.sort();
        edges
    }
}
