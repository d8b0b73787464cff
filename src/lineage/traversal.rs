use crate::error::ReferenceError;
use crate::lineage::graph::LineageGraph;
use crate::types::{DataEdge, ImpactAnalysis, ImpactRadius, NeighborSummary};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Graph traversal utilities for lineage analysis
pub struct GraphTraversal;

impl GraphTraversal {
    /// Breadth-first search for the edge sequence leading from `source_id`
    /// to `target_id`.
    ///
    /// Outgoing edges are expanded in insertion order, so among equally
    /// short paths the one built from the oldest edges wins. Returns an empty
    /// sequence when no path exists and also when `source_id == target_id`.
    pub fn path_between(
        graph: &LineageGraph,
        source_id: &str,
        target_id: &str,
    ) -> Result<Vec<DataEdge>, ReferenceError> {
        let (Some(from_index), Some(to_index)) =
            (graph.index_of(source_id), graph.index_of(target_id))
        else {
            return Err(ReferenceError::MissingEndpoint {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            });
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut parent: HashMap<NodeIndex, EdgeIndex> = HashMap::new();

        queue.push_back(from_index);
        visited.insert(from_index);

        while let Some(current_index) = queue.pop_front() {
            if current_index == to_index {
                let path = Self::reconstruct_path(graph, &parent, to_index);
                debug!(
                    "Found lineage path {} -> {} with {} edges",
                    source_id,
                    target_id,
                    path.len()
                );
                return Ok(path);
            }

            for edge_index in graph.edges_in_order(current_index, Direction::Outgoing) {
                let Some(next_index) = graph.edge_target(edge_index) else {
                    continue;
                };
                if visited.insert(next_index) {
                    parent.insert(next_index, edge_index);
                    queue.push_back(next_index);
                }
            }
        }

        debug!("No lineage path {} -> {}", source_id, target_id);
        Ok(Vec::new())
    }

    /// Walk parent edges back from `end` and return them source-first
    fn reconstruct_path(
        graph: &LineageGraph,
        parent: &HashMap<NodeIndex, EdgeIndex>,
        end: NodeIndex,
    ) -> Vec<DataEdge> {
        let mut path = Vec::new();
        let mut current = end;

        while let Some(&edge_index) = parent.get(&current) {
            path.push(graph.edge_at(edge_index).clone());
            match graph.edge_source(edge_index) {
                Some(source) => current = source,
                None => break,
            }
        }

        path.reverse();
        path
    }

    /// Direct downstream and upstream neighbours of a node.
    ///
    /// Single hop only; see [`GraphTraversal::impact_radius`] for the
    /// transitive downstream view.
    pub fn impact_analysis(
        graph: &LineageGraph,
        node_id: &str,
    ) -> Result<ImpactAnalysis, ReferenceError> {
        let node = graph
            .get_node(node_id)
            .ok_or_else(|| ReferenceError::NodeNotFound(node_id.to_string()))?
            .clone();

        let downstream = graph.downstream_of(node_id);
        let upstream = graph.upstream_of(node_id);

        Ok(ImpactAnalysis {
            node,
            downstream_impact: NeighborSummary::from_nodes(downstream),
            upstream_dependencies: NeighborSummary::from_nodes(upstream),
        })
    }

    /// Calculate the transitive downstream reach of a node, recording the
    /// minimum depth at which each node is reached
    pub fn impact_radius(
        graph: &LineageGraph,
        node_id: &str,
        max_depth: Option<usize>,
    ) -> Result<ImpactRadius, ReferenceError> {
        let start = graph
            .index_of(node_id)
            .ok_or_else(|| ReferenceError::NodeNotFound(node_id.to_string()))?;
        let depth_limit = max_depth.unwrap_or(usize::MAX);

        let mut affected = BTreeMap::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        queue.push_back((start, 0usize));
        visited.insert(start);

        while let Some((current_index, depth)) = queue.pop_front() {
            if depth >= depth_limit {
                continue;
            }

            for edge_index in graph.edges_in_order(current_index, Direction::Outgoing) {
                let Some(next_index) = graph.edge_target(edge_index) else {
                    continue;
                };
                if visited.insert(next_index) {
                    affected.insert(graph.node_at(next_index).id.clone(), depth + 1);
                    queue.push_back((next_index, depth + 1));
                }
            }
        }

        debug!("Impact radius for {}: {} nodes", node_id, affected.len());

        Ok(ImpactRadius {
            node_id: node_id.to_string(),
            max_depth,
            affected,
        })
    }
}
