// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Managed cluster lifecycle on GKE.

pub mod client;
pub mod credentials;

pub use client::{ContainerApi, GkeClient};

use crate::backoff::Backoff;
use crate::error::{ProvisionError, Result};
use crate::types::cluster::{ClusterIdentity, ClusterSpec, ClusterStatus};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Create the cluster if it does not exist, then wait for its identity
#[instrument(skip(api, spec, backoff), fields(cluster = %spec.name))]
pub async fn ensure_cluster<A: ContainerApi>(
    api: &A,
    spec: &ClusterSpec,
    backoff: Backoff,
) -> Result<ClusterIdentity> {
    match api.get_cluster(spec).await {
        Ok(existing) => {
            info!(status = ?existing.status, "Cluster already exists");
        }
        Err(e) if e.is_not_found() => {
            info!(
                "Creating cluster {} in {}/{} ({} x {})",
                spec.name, spec.project, spec.zone, spec.initial_node_count, spec.machine_type
            );
            api.create_cluster(spec).await?;
        }
        Err(e) => return Err(e),
    }

    wait_for_cluster(api, spec, backoff).await
}

/// Wait until the cluster is running and its endpoint and CA are known.
/// Polls with exponential backoff; there is no deadline.
#[instrument(skip(api, spec, backoff), fields(cluster = %spec.name))]
pub async fn wait_for_cluster<A: ContainerApi>(
    api: &A,
    spec: &ClusterSpec,
    backoff: Backoff,
) -> Result<ClusterIdentity> {
    let mut interval = backoff.initial;

    loop {
        let cluster = api.get_cluster(spec).await?;

        if cluster.status.is_failed() {
            return Err(ProvisionError::ClusterFailed {
                name: spec.name.clone(),
                reason: cluster
                    .status_message
                    .clone()
                    .unwrap_or_else(|| format!("status {:?}", cluster.status)),
            });
        }

        if let Some(identity) = cluster.identity(&spec.project) {
            if cluster.status == ClusterStatus::Degraded {
                warn!(
                    reason = ?cluster.status_message,
                    "Cluster is degraded but serving, continuing"
                );
            }
            info!(context = %identity.context, endpoint = %identity.endpoint, "Cluster is running");
            return Ok(identity);
        }

        info!(
            status = ?cluster.status,
            "Cluster not yet running, waiting {} seconds...",
            interval.as_secs()
        );
        sleep(interval).await;
        interval = backoff.next(interval);
    }
}

/// Delete the cluster and wait until the API no longer reports it.
/// Returns `false` when there was nothing to delete.
#[instrument(skip(api, spec, backoff), fields(cluster = %spec.name))]
pub async fn destroy_cluster<A: ContainerApi>(
    api: &A,
    spec: &ClusterSpec,
    backoff: Backoff,
) -> Result<bool> {
    match api.delete_cluster(spec).await {
        Ok(()) => info!("Deleting cluster {}", spec.name),
        Err(e) if e.is_not_found() => {
            info!("Cluster {} does not exist, nothing to destroy", spec.name);
            return Ok(false);
        }
        Err(e) => return Err(e),
    }

    let mut interval = backoff.initial;
    loop {
        match api.get_cluster(spec).await {
            Err(e) if e.is_not_found() => {
                info!("Cluster {} deleted", spec.name);
                return Ok(true);
            }
            Err(e) => return Err(e),
            Ok(cluster) => {
                info!(
                    status = ?cluster.status,
                    "Cluster still present, waiting {} seconds...",
                    interval.as_secs()
                );
            }
        }

        sleep(interval).await;
        interval = backoff.next(interval);
    }
}
