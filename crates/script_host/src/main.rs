//! Script Host
//!
//! Runs script graphs headlessly against a simulated entity.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use script_runtime::{TemplateRegistry, category_style};

use script_host::{Behavior, HostConfig, SimEntity, apply_exports, load_graph, run};

const DEFAULT_LOG_FILTER: &str = "script_host=info,script_runtime=warn";

/// Headless script graph runner
#[derive(Parser, Debug)]
#[command(name = "script_host")]
#[command(about = "Run script graphs against a simulated entity", long_about = None)]
struct Args {
    /// Serialized graph (JSON); repeat to attach several graphs
    #[arg(short, long)]
    graph: Vec<PathBuf>,

    /// Host configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run (overrides the config)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Key held for the whole run; repeatable
    #[arg(short, long)]
    key: Vec<String>,

    /// Print the export surface of the graphs and exit
    #[arg(long)]
    exports: bool,

    /// Print the built-in node templates and exit
    #[arg(long)]
    list_templates: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };

    // Initialize tracing
    let filter = config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = Arc::new(TemplateRegistry::with_builtins());

    if args.list_templates {
        list_templates(&registry);
        return Ok(());
    }

    if args.graph.is_empty() {
        anyhow::bail!("No graph given; pass at least one --graph <file>");
    }

    if let Some(ticks) = args.ticks {
        config.run.ticks = ticks;
    }
    config.run.keys.extend(args.key.iter().cloned());

    let mut behavior = Behavior::new();
    for path in &args.graph {
        behavior.push(load_graph(path, Arc::clone(&registry), config.graph.clone())?);
    }
    apply_exports(&mut behavior, &config)?;

    if args.exports {
        let exports: Vec<_> = behavior.graphs().iter().flat_map(|g| g.exports()).collect();
        println!("{}", serde_json::to_string_pretty(&exports)?);
        return Ok(());
    }

    info!("Running {} graph(s) for {} ticks", behavior.graphs().len(), config.run.ticks);

    let mut entity = SimEntity::new(config.entity.mass);
    let report = run(&mut behavior, &mut entity, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn list_templates(registry: &TemplateRegistry) {
    for category in registry.categories() {
        let style = category_style(&category);
        println!("{category} ({})", style.background);
        for template in registry.templates_in_category(&category) {
            let ports = |ports: &[script_types::PortDef]| {
                ports
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.port_type))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let exported = if template.exported { " [export]" } else { "" };
            println!(
                "  {}({}) -> ({}){}",
                template.name,
                ports(&template.inputs),
                ports(&template.outputs),
                exported
            );
        }
    }
}
