// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gke_bootstrap::config::Config;
use gke_bootstrap::gke::GkeClient;
use gke_bootstrap::graph::DeclarationGraph;
use gke_bootstrap::provision::{plan, Provisioner};

/// Provision a GKE cluster, grant cluster-admin and install cert-manager
#[derive(Parser, Debug)]
#[command(name = "gke-bootstrap", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what apply would do, without calling any API
    Plan,
    /// Create or update the cluster, the role binding and the add-on
    Apply,
    /// Delete the cluster
    Destroy,
    /// Print the kubeconfig of the existing cluster
    Kubeconfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Missing configuration fails here, before any cloud call
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: project={}, zone={}, cluster={}",
        config.project, config.zone, config.cluster_name
    );

    if let Command::Plan = cli.command {
        for (i, step) in plan(&config, &DeclarationGraph::standard())?.iter().enumerate() {
            let after = step
                .depends_on
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if after.is_empty() {
                println!("{}. {}: {}", i + 1, step.node, step.description);
            } else {
                println!("{}. {}: {} (after {})", i + 1, step.node, step.description, after);
            }
        }
        return Ok(());
    }

    let api = GkeClient::from_gcloud()
        .await
        .context("Failed to authenticate against the GKE API")?;
    let provisioner = Provisioner::new(config, api);

    match cli.command {
        Command::Plan => {}
        Command::Apply => {
            let outcome = provisioner.apply().await?;
            info!(
                "Cluster {} ready at https://{}; {} add-on objects applied",
                outcome.identity.context, outcome.identity.endpoint, outcome.addon_objects
            );
        }
        Command::Destroy => {
            if !provisioner.destroy().await? {
                warn!("Nothing to destroy");
            }
        }
        Command::Kubeconfig { output } => {
            let document = provisioner.kubeconfig().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &document)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Kubeconfig written to {}", path.display());
                }
                None => print!("{}", document),
            }
        }
    }

    Ok(())
}
