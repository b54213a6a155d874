use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use fedset_bootstrap::{InitConfig, JoinConfig};
use fedset_store::KubeStore;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fedsetctl", version, about = "ClusterSet bootstrap CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new ClusterSet in the leader cluster
    Init {
        /// Namespace holding the ClusterSet control objects
        #[arg(short = 'n', long = "namespace", default_value = "default")]
        namespace: String,
        /// Name of the ClusterSet to create
        #[arg(long)]
        clusterset: String,
        /// ID of this (leader) cluster
        #[arg(long = "cluster-id")]
        cluster_id: String,
        /// Also create the member token Secret (rotates an existing one)
        #[arg(long = "create-token", action = ArgAction::SetTrue)]
        create_token: bool,
        /// Save the member token manifest to this path
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Join an existing ClusterSet as a member cluster
    Join {
        /// Multi-document YAML config file (ClusterSetJoinConfig + optional Secret)
        #[arg(long = "config-file")]
        config_file: Option<PathBuf>,
        /// Namespace in the member cluster
        #[arg(short = 'n', long = "namespace")]
        namespace: Option<String>,
        /// ID of this (member) cluster
        #[arg(long = "cluster-id")]
        cluster_id: Option<String>,
        /// ID of the ClusterSet to join
        #[arg(long = "clusterset-id")]
        clusterset_id: Option<String>,
        /// ID of the leader cluster
        #[arg(long = "leader-cluster-id")]
        leader_cluster_id: Option<String>,
        /// Namespace of the ClusterSet in the leader cluster
        #[arg(long = "leader-namespace")]
        leader_namespace: Option<String>,
        /// API server address of the leader cluster
        #[arg(long = "leader-apiserver")]
        leader_api_server: Option<String>,
        /// Name of an existing member token Secret
        #[arg(long = "token-secret-name")]
        token_secret_name: Option<String>,
        /// Path to a member token Secret manifest
        #[arg(long = "token-secret-file")]
        token_secret_file: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env = std::env::var("FEDSET_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("FEDSET_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid FEDSET_METRICS_ADDR; expected host:port");
        }
    }
}

/// Flags override config-file values; empty flag means keep the file's.
fn overlay(dst: &mut String, src: Option<String>) {
    if let Some(v) = src {
        if !v.is_empty() {
            *dst = v;
        }
    }
}

/// A flag-only join with no config file falls back to the conventional
/// namespace, matching the init default. Applied after the overlay so a
/// config-file namespace is never clobbered.
fn default_namespace(config: &mut JoinConfig) {
    if config.namespace.is_empty() {
        config.namespace = "default".to_string();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let store = KubeStore::try_default().await?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Init {
            namespace,
            clusterset,
            cluster_id,
            create_token,
            output,
        } => {
            let config = InitConfig {
                namespace,
                clusterset,
                cluster_id,
                create_token,
                output,
            };
            info!(clusterset = %config.clusterset, "init invoked");
            fedset_bootstrap::init(&store, &config, &mut out).await?;
        }
        Commands::Join {
            config_file,
            namespace,
            cluster_id,
            clusterset_id,
            leader_cluster_id,
            leader_namespace,
            leader_api_server,
            token_secret_name,
            token_secret_file,
        } => {
            let mut config = match &config_file {
                Some(path) => JoinConfig::from_file(path)?,
                None => JoinConfig::default(),
            };
            overlay(&mut config.namespace, namespace);
            overlay(&mut config.cluster_id, cluster_id);
            overlay(&mut config.clusterset_id, clusterset_id);
            overlay(&mut config.leader_cluster_id, leader_cluster_id);
            overlay(&mut config.leader_namespace, leader_namespace);
            overlay(&mut config.leader_api_server, leader_api_server);
            if let Some(name) = token_secret_name {
                if !name.is_empty() {
                    config.token_secret_name = name;
                }
            }
            if token_secret_file.is_some() {
                config.token_secret_file = token_secret_file;
            }
            default_namespace(&mut config);
            info!(clusterset = %config.clusterset_id, "join invoked");
            fedset_bootstrap::join(&store, &config, &mut out).await?;
        }
    }
    Ok(())
}
