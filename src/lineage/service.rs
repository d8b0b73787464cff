use crate::error::ReferenceError;
use crate::lineage::graph::LineageGraph;
use crate::lineage::traversal::GraphTraversal;
use crate::types::{DataEdge, DataNode, GraphSummary, ImpactAnalysis, ImpactRadius};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Shared handle to the lineage graph.
///
/// Every operation takes the lock once for its whole duration: mutations
/// take the write lock, queries the read lock. The endpoint check and the
/// append in [`LineageService::add_edge`] therefore happen atomically with
/// respect to concurrent [`LineageService::add_node`] calls.
#[derive(Debug, Clone, Default)]
pub struct LineageService {
    graph: Arc<RwLock<LineageGraph>>,
}

impl LineageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, node: DataNode) {
        let node_id = node.id.clone();
        self.graph.write().add_node(node);
        info!("Added node: {}", node_id);
    }

    pub fn add_edge(&self, edge: DataEdge) -> Result<(), ReferenceError> {
        let (source_id, target_id) = (edge.source_id.clone(), edge.target_id.clone());

        match self.graph.write().add_edge(edge) {
            Ok(()) => {
                info!("Added edge: {} -> {}", source_id, target_id);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected edge {} -> {}: {}", source_id, target_id, e);
                Err(e)
            }
        }
    }

    /// Add a batch of nodes and edges under a single write lock.
    ///
    /// Edge endpoints may be nodes already in the graph or nodes in the same
    /// batch. If any endpoint is missing nothing is applied.
    pub fn add_batch(&self, nodes: Vec<DataNode>, edges: Vec<DataEdge>) -> Result<(), ReferenceError> {
        let mut graph = self.graph.write();

        {
            let incoming: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
            let known = |id: &str| incoming.contains(id) || graph.contains_node(id);

            if let Some(edge) = edges
                .iter()
                .find(|edge| !known(&edge.source_id) || !known(&edge.target_id))
            {
                warn!("Rejected batch: edge {} -> {} has a missing endpoint", edge.source_id, edge.target_id);
                return Err(ReferenceError::MissingEndpoint {
                    source_id: edge.source_id.clone(),
                    target_id: edge.target_id.clone(),
                });
            }
        }

        let (node_count, edge_count) = (nodes.len(), edges.len());
        for node in nodes {
            graph.add_node(node);
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }

        info!("Added batch of {} nodes and {} edges", node_count, edge_count);
        Ok(())
    }

    pub fn get_node(&self, node_id: &str) -> Option<DataNode> {
        self.graph.read().get_node(node_id).cloned()
    }

    /// Like [`LineageService::get_node`], but an unknown id is an error
    pub fn require_node(&self, node_id: &str) -> Result<DataNode, ReferenceError> {
        self.get_node(node_id)
            .ok_or_else(|| ReferenceError::NodeNotFound(node_id.to_string()))
    }

    /// Direct upstream nodes. Unknown ids yield an empty list; callers
    /// that need a not-found signal check [`LineageService::get_node`] first.
    pub fn upstream_nodes(&self, node_id: &str) -> Vec<DataNode> {
        self.graph.read().upstream_of(node_id)
    }

    /// Direct downstream nodes, with the same unknown-id behaviour as
    /// [`LineageService::upstream_nodes`].
    pub fn downstream_nodes(&self, node_id: &str) -> Vec<DataNode> {
        self.graph.read().downstream_of(node_id)
    }

    #[instrument(skip(self))]
    pub fn lineage_path(&self, source_id: &str, target_id: &str) -> Result<Vec<DataEdge>, ReferenceError> {
        let graph = self.graph.read();
        GraphTraversal::path_between(&graph, source_id, target_id)
    }

    #[instrument(skip(self))]
    pub fn impact_analysis(&self, node_id: &str) -> Result<ImpactAnalysis, ReferenceError> {
        let graph = self.graph.read();
        let impact = GraphTraversal::impact_analysis(&graph, node_id)?;

        info!(
            "Impact analysis for {}: {} downstream, {} upstream",
            node_id, impact.downstream_impact.direct, impact.upstream_dependencies.direct
        );
        Ok(impact)
    }

    #[instrument(skip(self))]
    pub fn impact_radius(
        &self,
        node_id: &str,
        max_depth: Option<usize>,
    ) -> Result<ImpactRadius, ReferenceError> {
        let graph = self.graph.read();
        GraphTraversal::impact_radius(&graph, node_id, max_depth)
    }

    pub fn graph_summary(&self) -> GraphSummary {
        self.graph.read().summary()
    }

    pub fn root_nodes(&self) -> Vec<String> {
        self.graph.read().root_nodes()
    }

    pub fn leaf_nodes(&self) -> Vec<String> {
        self.graph.read().leaf_nodes()
    }

    pub fn nodes(&self) -> Vec<DataNode> {
        self.graph.read().nodes()
    }

    pub fn edges(&self) -> Vec<DataEdge> {
        self.graph.read().edges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use std::thread;

    fn create_test_service() -> LineageService {
        let service = LineageService::new();
        service.add_node(DataNode::new("source1", "Source Database 1", "source", Metadata::new()));
        service.add_node(DataNode::new("transform1", "ETL Process 1", "transformation", Metadata::new()));
        service.add_node(DataNode::new("target1", "Data Warehouse 1", "target", Metadata::new()));
        service
            .add_edge(DataEdge::new("source1", "transform1", "extract", Metadata::new()))
            .unwrap();
        service
            .add_edge(DataEdge::new("transform1", "target1", "load", Metadata::new()))
            .unwrap();
        service
    }

    #[test]
    fn test_scenario_end_to_end() {
        let service = create_test_service();

        let upstream = service.upstream_nodes("transform1");
        assert_eq!(upstream.len(), 1);
        assert_eq!(upstream[0].id, "source1");

        let downstream = service.downstream_nodes("transform1");
        assert_eq!(downstream.len(), 1);
        assert_eq!(downstream[0].id, "target1");

        let path = service.lineage_path("source1", "target1").unwrap();
        assert_eq!(path.len(), 2);

        let summary = service.graph_summary();
        assert_eq!(summary.total_nodes, 3);
        assert_eq!(summary.total_edges, 2);
        assert_eq!(summary.node_types.len(), 3);

        let impact = service.impact_analysis("transform1").unwrap();
        assert_eq!(impact.downstream_impact.direct, 1);
        assert_eq!(impact.upstream_dependencies.direct, 1);
    }

    #[test]
    fn test_ghost_edge_leaves_graph_unchanged() {
        let service = create_test_service();
        let result = service.add_edge(DataEdge::new("ghost", "target1", "load", Metadata::new()));

        assert!(result.is_err());
        assert_eq!(service.graph_summary().total_edges, 2);
        assert!(service.get_node("ghost").is_none());
    }

    #[test]
    fn test_clones_share_the_graph() {
        let service = LineageService::new();
        let handle = service.clone();
        handle.add_node(DataNode::new("a", "A", "source", Metadata::new()));

        assert!(service.get_node("a").is_some());
    }

    #[test]
    fn test_concurrent_writers() {
        let service = LineageService::new();
        service.add_node(DataNode::new("hub", "Hub", "source", Metadata::new()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                thread::spawn(move || {
                    let id = format!("node{}", i);
                    service.add_node(DataNode::new(id.clone(), id.clone(), "target", Metadata::new()));
                    service
                        .add_edge(DataEdge::new("hub", id, "load", Metadata::new()))
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let summary = service.graph_summary();
        assert_eq!(summary.total_nodes, 9);
        assert_eq!(summary.total_edges, 8);
        assert_eq!(service.downstream_nodes("hub").len(), 8);
    }

    #[test]
    fn test_edge_retried_until_endpoint_added() {
        let service = LineageService::new();
        service.add_node(DataNode::new("hub", "Hub", "source", Metadata::new()));

        let writer = {
            let service = service.clone();
            thread::spawn(move || {
                let mut attempts = 0;
                loop {
                    attempts += 1;
                    match service.add_edge(DataEdge::new("hub", "late", "load", Metadata::new())) {
                        Ok(()) => return attempts,
                        Err(ReferenceError::MissingEndpoint { .. }) => thread::yield_now(),
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
            })
        };

        let reader = {
            let service = service.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    let edges = service.edges();
                    assert!(edges.len() <= 1);
                    for edge in &edges {
                        assert!(service.get_node(&edge.target_id).is_some());
                    }
                }
            })
        };

        let adder = {
            let service = service.clone();
            thread::spawn(move || {
                service.add_node(DataNode::new("late", "Late", "target", Metadata::new()));
            })
        };

        adder.join().unwrap();
        let attempts = writer.join().unwrap();
        reader.join().unwrap();

        assert!(attempts >= 1);
        let edges = service.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id, "late");
        assert_eq!(service.downstream_nodes("hub")[0].id, "late");
    }

    #[test]
    fn test_require_node() {
        let service = create_test_service();

        assert_eq!(service.require_node("source1").unwrap().name, "Source Database 1");
        assert_eq!(
            service.require_node("ghost"),
            Err(ReferenceError::NodeNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_add_batch_is_all_or_nothing() {
        let service = create_test_service();
        let nodes = vec![DataNode::new("mart1", "Sales Mart", "target", Metadata::new())];
        let edges = vec![
            DataEdge::new("target1", "mart1", "load", Metadata::new()),
            DataEdge::new("mart1", "ghost", "load", Metadata::new()),
        ];

        let err = service.add_batch(nodes.clone(), edges).unwrap_err();
        assert_eq!(
            err,
            ReferenceError::MissingEndpoint {
                source_id: "mart1".to_string(),
                target_id: "ghost".to_string(),
            }
        );
        assert!(service.get_node("mart1").is_none());
        assert_eq!(service.graph_summary().total_edges, 2);

        service
            .add_batch(nodes, vec![DataEdge::new("target1", "mart1", "load", Metadata::new())])
            .unwrap();
        assert_eq!(service.downstream_nodes("target1")[0].id, "mart1");
    }
}
