use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use lb_spec_builder::{
    cloud::StaticInventory,
    ingress::{group_ingresses, load_ingresses_from_yaml},
    model::{default_listen_ports, LoadBalancer},
    BuildConfig, Error, ModelBuilder,
};
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the load balancer spec of every Ingress group
    Build(BuildArgs),
    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Multi-document YAML file containing the Ingresses
    #[arg(long, env = "INGRESS_MANIFESTS")]
    ingresses: PathBuf,

    /// YAML snapshot of the VPC used for lookups and discovery
    #[arg(long, env = "INVENTORY_FILE")]
    inventory: PathBuf,

    /// TOML build configuration
    #[arg(long, env = "BUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Cluster name, overrides the config file
    #[arg(long, env = "CLUSTER_NAME")]
    cluster_name: Option<String>,

    /// VPC ID, overrides the config file (defaults to the inventory's VPC)
    #[arg(long, env = "VPC_ID")]
    vpc_id: Option<String>,

    #[arg(long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupOutput {
    group: String,
    load_balancer: LoadBalancer,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    match args.command {
        Commands::Version => {
            println!("lb-spec-builder v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Build(build_args) => run_build(build_args).await,
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    // stdout carries the rendered specs.
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

async fn run_build(args: BuildArgs) -> Result<(), Error> {
    init_tracing(args.log_json);

    let mut config = match &args.config {
        Some(path) => BuildConfig::from_toml_file(path)?,
        None => BuildConfig::default(),
    };
    if let Some(cluster_name) = args.cluster_name {
        config.cluster_name = cluster_name;
    }

    let inventory = StaticInventory::from_yaml_file(&args.inventory)?
        .with_cluster_name(config.cluster_name.clone());
    if let Some(vpc_id) = args.vpc_id {
        config.vpc_id = vpc_id;
    }
    if config.vpc_id.is_empty() {
        config.vpc_id = inventory.vpc_id.clone();
    }

    let inventory = Arc::new(inventory);
    let builder = ModelBuilder::new(config, inventory.clone(), inventory.clone(), inventory)?;

    let raw = std::fs::read_to_string(&args.ingresses)?;
    let ingresses = load_ingresses_from_yaml(&raw)?;
    let groups = group_ingresses(&ingresses, builder.parser())?;
    info!(
        ingresses = ingresses.len(),
        groups = groups.len(),
        cluster = %builder.config().cluster_name,
        "Building load balancer specs"
    );

    let listen_ports = default_listen_ports();
    let mut outputs = Vec::with_capacity(groups.len());
    let mut failed = 0;
    for group in &groups {
        match builder.build_load_balancer(group, &listen_ports).await {
            Ok(load_balancer) => outputs.push(GroupOutput {
                group: group.id.to_string(),
                load_balancer,
            }),
            Err(e) => {
                error!(group = %group.id, error = %e, "Failed to build load balancer spec");
                failed += 1;
            }
        }
    }

    let rendered = match args.output {
        OutputFormat::Json => serde_json::to_string_pretty(&outputs)
            .map_err(|e| Error::SerializationError(e.to_string()))?,
        OutputFormat::Yaml => serde_yaml::to_string(&outputs)
            .map_err(|e| Error::SerializationError(e.to_string()))?,
    };
    println!("{rendered}");

    if failed > 0 {
        return Err(Error::BuildFailed {
            failed,
            total: groups.len(),
        });
    }
    Ok(())
}
