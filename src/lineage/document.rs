use crate::error::ReferenceError;
use crate::lineage::service::LineageService;
use crate::types::{DataEdge, DataNode};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A lineage definition file: the nodes and edges to seed a graph with.
/// Accepted as YAML (`.yml`, `.yaml`) or JSON (`.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineageDocument {
    #[serde(default)]
    pub nodes: Vec<DataNode>,
    #[serde(default)]
    pub edges: Vec<DataEdge>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub nodes: usize,
    pub edges: usize,
}

impl LineageDocument {
    /// Parse a single definition file, picking the format from its extension
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading lineage definitions from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read lineage definitions from {:?}", path))?;

        match extension_of(path) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON lineage definitions {:?}", path)),
            Some("yml") | Some("yaml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML lineage definitions {:?}", path)),
            _ => bail!("Unsupported lineage definition format: {:?}", path),
        }
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn is_definition_file(path: &Path) -> bool {
    matches!(extension_of(path), Some("json" | "yml" | "yaml"))
}

/// Collect definition files under `path`: the file itself, or every
/// definition file below a directory in file-name order
pub fn discover_definition_files<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Lineage definitions not found at {:?}", path);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", path))?;
        if entry.file_type().is_file() && is_definition_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Load every definition under `path` into `service`.
///
/// Nodes from all files are added before any edge, so an edge may refer to
/// a node declared in another file or already in the graph. The whole load
/// is applied as one batch: a dangling edge leaves the service untouched.
pub async fn load_definitions<P: AsRef<Path>>(
    service: &LineageService,
    path: P,
) -> Result<LoadStats> {
    let files = discover_definition_files(&path)?;
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for file in &files {
        let document = LineageDocument::from_path(file).await?;
        nodes.extend(document.nodes);
        edges.extend(document.edges);
    }

    let stats = LoadStats {
        files: files.len(),
        nodes: nodes.len(),
        edges: edges.len(),
    };

    service.add_batch(nodes, edges).map_err(|e| {
        let label = match &e {
            ReferenceError::MissingEndpoint {
                source_id,
                target_id,
            } => format!("{} -> {}", source_id, target_id),
            other => other.to_string(),
        };
        anyhow::Error::new(e).context(format!("Invalid lineage edge {}", label))
    })?;

    info!(
        "Loaded {} nodes and {} edges from {} definition files",
        stats.nodes, stats.edges, stats.files
    );
    Ok(stats)
}
