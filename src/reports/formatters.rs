use crate::quality::{QualityReport, QualityResult};
use crate::types::{DataEdge, DataNode, GraphSummary, ImpactAnalysis, ImpactRadius};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

/// Results of lineage and quality queries, ready to be rendered
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LineageReport {
    Summary(GraphSummary),
    Node(DataNode),
    Nodes { nodes: Vec<DataNode> },
    Path { path: Vec<DataEdge> },
    Impact(ImpactAnalysis),
    Radius(ImpactRadius),
    Ids { nodes: Vec<String> },
    Quality {
        results: Vec<QualityResult>,
        report: QualityReport,
    },
}

/// Trait for report formatters
pub trait ReportFormatter {
    fn format(&self, report: &LineageReport) -> Result<String>;
}

pub fn formatter_for(format: &str) -> Option<Box<dyn ReportFormatter>> {
    match format.to_lowercase().as_str() {
        "json" => Some(Box::new(JsonFormatter)),
        "text" => Some(Box::new(TextFormatter)),
        _ => None,
    }
}

/// JSON formatter
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &LineageReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

/// Plain text formatter
pub struct TextFormatter;

impl TextFormatter {
    fn node_line(out: &mut String, node: &DataNode) -> std::fmt::Result {
        writeln!(out, "- {} ({}) [{}]", node.id, node.name, node.node_type)
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &LineageReport) -> Result<String> {
        let mut out = String::new();

        match report {
            LineageReport::Summary(summary) => {
                writeln!(out, "Lineage Graph Summary")?;
                writeln!(out, "=====================")?;
                writeln!(out, "Nodes: {}", summary.total_nodes)?;
                writeln!(out, "Edges: {}", summary.total_edges)?;
                for (node_type, count) in &summary.node_types {
                    writeln!(out, "  {}: {}", node_type, count)?;
                }
            }
            LineageReport::Node(node) => {
                Self::node_line(&mut out, node)?;
                if !node.metadata.is_empty() {
                    writeln!(out, "  metadata: {}", serde_json::Value::Object(node.metadata.clone()))?;
                }
            }
            LineageReport::Nodes { nodes } => {
                if nodes.is_empty() {
                    writeln!(out, "No nodes")?;
                }
                for node in nodes {
                    Self::node_line(&mut out, node)?;
                }
            }
            LineageReport::Path { path } => {
                if path.is_empty() {
                    writeln!(out, "No path")?;
                }
                for (step, edge) in path.iter().enumerate() {
                    writeln!(
                        out,
                        "{}. {} -> {} ({})",
                        step + 1,
                        edge.source_id,
                        edge.target_id,
                        edge.transformation_type
                    )?;
                }
            }
            LineageReport::Impact(impact) => {
                writeln!(out, "Impact Analysis: {}", impact.node.id)?;
                writeln!(out, "Downstream (direct): {}", impact.downstream_impact.direct)?;
                for node in &impact.downstream_impact.nodes {
                    Self::node_line(&mut out, node)?;
                }
                writeln!(out, "Upstream (direct): {}", impact.upstream_dependencies.direct)?;
                for node in &impact.upstream_dependencies.nodes {
                    Self::node_line(&mut out, node)?;
                }
            }
            LineageReport::Radius(radius) => {
                writeln!(
                    out,
                    "Impact Radius: {} ({} affected)",
                    radius.node_id,
                    radius.total_affected()
                )?;
                for (node_id, depth) in &radius.affected {
                    writeln!(out, "- {} at depth {}", node_id, depth)?;
                }
            }
            LineageReport::Ids { nodes } => {
                for node_id in nodes {
                    writeln!(out, "- {}", node_id)?;
                }
            }
            LineageReport::Quality { results, report } => {
                writeln!(out, "Quality Report: {}", report.domain)?;
                writeln!(out, "Score: {:.1}%", report.quality_score)?;
                writeln!(out, "Checks: {}", report.total_checks)?;
                for result in results {
                    let mark = if result.passed { "PASS" } else { "FAIL" };
                    writeln!(out, "[{}] {}: {}", mark, result.rule_name, result.message)?;
                }
            }
        }

        Ok(out)
    }
}
