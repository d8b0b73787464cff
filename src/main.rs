use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use data_mesh::{
    config::Config,
    lineage::{load_definitions, LineageService},
    quality::{QualityMonitor, QualityRule},
    reports::{formatter_for, LineageReport},
    types::Metadata,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "data-mesh")]
#[command(about = "Data mesh metadata layer: lineage graph, catalog and quality checks")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Lineage definition file or directory (YAML or JSON)
    #[arg(short, long, env = "DATA_MESH_DEFINITIONS")]
    definitions: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Count nodes and edges by type
    Summary,

    /// Show a single node
    Node { id: String },

    /// List the direct upstream nodes of a node
    Upstream { id: String },

    /// List the direct downstream nodes of a node
    Downstream { id: String },

    /// Find the shortest lineage path between two nodes
    Path { source: String, target: String },

    /// Direct upstream and downstream neighbours of a node
    Impact { id: String },

    /// Transitive downstream reach of a node
    Radius {
        id: String,

        /// Maximum number of hops (defaults to lineage.max_impact_depth)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// List nodes with no upstream dependencies
    Roots,

    /// List nodes with no downstream dependents
    Leaves,

    /// Run quality rules against a JSON record
    Check {
        /// JSON object whose fields are checked
        #[arg(short, long)]
        record: PathBuf,

        /// YAML list of quality rules
        #[arg(long)]
        rules: PathBuf,

        /// Domain the record belongs to
        #[arg(long)]
        domain: Option<String>,
    },

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(long, default_value = "data-mesh.yml")]
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(&cli).await?;
    init_tracing(&config.logging.level)?;

    info!("Starting data mesh CLI");

    let metrics_handle = if config.metrics.enabled {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    let report = match cli.command {
        Commands::Init { config_file } => return init_config(config_file).await,
        Commands::Check {
            record,
            rules,
            domain,
        } => {
            let domain = domain.unwrap_or_else(|| config.quality.default_domain.clone());
            run_quality_check(&record, &rules, &domain).await?
        }
        command => {
            let service = LineageService::new();
            if let Some(path) = &config.lineage.definitions {
                load_definitions(&service, path).await?;
            } else {
                warn!("No lineage definitions given; the graph is empty");
            }
            run_lineage_command(&service, command, &config)?
        }
    };

    output_report(&report, &cli.format)?;

    if let Some(handle) = metrics_handle {
        print_metrics(&handle);
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Build configuration: defaults, then the config file, then environment
/// variables, then command line flags
async fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) if path.exists() => {
            let mut config = Config::default();
            config.merge_with(Config::load_from_file(path).await?);
            config.apply_env_overrides()?;
            config
        }
        Some(path) => {
            eprintln!("Configuration file not found: {:?}. Using defaults.", path);
            Config::load_from_env()?
        }
        None => Config::load_from_env()?,
    };

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(path) = &cli.definitions {
        config.lineage.definitions = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn run_lineage_command(
    service: &LineageService,
    command: Commands,
    config: &Config,
) -> Result<LineageReport> {
    let report = match command {
        Commands::Summary => LineageReport::Summary(service.graph_summary()),
        Commands::Node { id } => LineageReport::Node(service.require_node(&id)?),
        Commands::Upstream { id } => {
            service.require_node(&id)?;
            LineageReport::Nodes {
                nodes: service.upstream_nodes(&id),
            }
        }
        Commands::Downstream { id } => {
            service.require_node(&id)?;
            LineageReport::Nodes {
                nodes: service.downstream_nodes(&id),
            }
        }
        Commands::Path { source, target } => LineageReport::Path {
            path: service.lineage_path(&source, &target)?,
        },
        Commands::Impact { id } => LineageReport::Impact(service.impact_analysis(&id)?),
        Commands::Radius { id, depth } => {
            let depth = depth.unwrap_or(config.lineage.max_impact_depth);
            LineageReport::Radius(service.impact_radius(&id, Some(depth))?)
        }
        Commands::Roots => LineageReport::Ids {
            nodes: service.root_nodes(),
        },
        Commands::Leaves => LineageReport::Ids {
            nodes: service.leaf_nodes(),
        },
        Commands::Check { .. } | Commands::Init { .. } => {
            bail!("not a lineage command")
        }
    };

    Ok(report)
}

async fn run_quality_check(record_path: &Path, rules_path: &Path, domain: &str) -> Result<LineageReport> {
    let rules_content = tokio::fs::read_to_string(rules_path)
        .await
        .with_context(|| format!("Failed to read rules file: {:?}", rules_path))?;
    let rules: Vec<QualityRule> =
        serde_yaml::from_str(&rules_content).context("Failed to parse quality rules")?;

    let record_content = tokio::fs::read_to_string(record_path)
        .await
        .with_context(|| format!("Failed to read record file: {:?}", record_path))?;
    let record: Metadata = serde_json::from_str(&record_content)
        .context("Record must be a JSON object")?;

    let mut monitor = QualityMonitor::new();
    for rule in rules {
        monitor.add_quality_rule(rule);
    }

    let results = monitor.check_quality(&record, domain)?;
    let report = monitor.quality_report(domain);

    info!(
        "Quality check for domain {} finished: {:.1}% over {} checks",
        domain, report.quality_score, report.total_checks
    );

    Ok(LineageReport::Quality { results, report })
}

/// Initialize configuration file
async fn init_config(config_file: PathBuf) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() {
        bail!("Configuration file already exists: {:?}", config_file);
    }

    Config::default()
        .save_to_file(&config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    println!("Configuration file created: {:?}", config_file);
    Ok(())
}

fn output_report(report: &LineageReport, format: &str) -> Result<()> {
    let formatter =
        formatter_for(format).ok_or_else(|| anyhow!("Unsupported output format: {}", format))?;
    print!("{}", formatter.format(report)?);
    Ok(())
}

fn print_metrics(handle: &PrometheusHandle) {
    let rendered = handle.render();
    if !rendered.is_empty() {
        println!();
        print!("{}", rendered);
    }
}
