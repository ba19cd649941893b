// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::config::Config;
use crate::constants::cluster::{
    DISK_TYPE, INITIAL_NODE_COUNT, LOCAL_SSD_COUNT, MACHINE_TYPE, OAUTH_SCOPES,
};
use crate::kubeconfig::{context_name, synthesize};
use serde::{Deserialize, Serialize};

/// Desired state of the managed cluster. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub name: String,
    pub project: String,
    pub zone: String,
    pub initial_node_count: u32,
    pub machine_type: String,
    pub disk_type: String,
    pub local_ssd_count: u32,
    pub oauth_scopes: Vec<String>,
}

impl ClusterSpec {
    pub fn from_config(config: &Config) -> Self {
        ClusterSpec {
            name: config.cluster_name.clone(),
            project: config.project.clone(),
            zone: config.zone.clone(),
            initial_node_count: INITIAL_NODE_COUNT,
            machine_type: MACHINE_TYPE.to_string(),
            disk_type: DISK_TYPE.to_string(),
            local_ssd_count: LOCAL_SSD_COUNT,
            oauth_scopes: OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Body of a `projects.locations.clusters.create` call
    pub fn to_create_request(&self) -> CreateClusterRequest {
        CreateClusterRequest {
            cluster: ClusterResource {
                name: self.name.clone(),
                initial_node_count: self.initial_node_count,
                node_config: NodeConfig {
                    machine_type: self.machine_type.clone(),
                    disk_type: self.disk_type.clone(),
                    local_ssd_count: self.local_ssd_count,
                    oauth_scopes: self.oauth_scopes.clone(),
                },
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateClusterRequest {
    pub cluster: ClusterResource,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResource {
    pub name: String,
    pub initial_node_count: u32,
    pub node_config: NodeConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub machine_type: String,
    pub disk_type: String,
    pub local_ssd_count: u32,
    pub oauth_scopes: Vec<String>,
}

/// Live cluster as reported by the GKE API
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GkeCluster {
    pub name: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub master_auth: Option<MasterAuth>,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    #[serde(default)]
    pub cluster_ca_certificate: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    #[default]
    StatusUnspecified,
    Provisioning,
    Running,
    Reconciling,
    Stopping,
    Error,
    Degraded,
    #[serde(other)]
    Unknown,
}

impl ClusterStatus {
    /// States from which the cluster will not become usable on its own
    pub fn is_failed(self) -> bool {
        matches!(self, ClusterStatus::Stopping | ClusterStatus::Error)
    }

    /// The control plane answers requests. A degraded cluster still serves.
    pub fn is_serving(self) -> bool {
        matches!(self, ClusterStatus::Running | ClusterStatus::Degraded)
    }
}

impl GkeCluster {
    pub fn is_running(&self) -> bool {
        self.status == ClusterStatus::Running
    }

    /// Zone the cluster lives in, preferring the legacy `zone` field
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref().or(self.location.as_deref())
    }

    fn ca_certificate(&self) -> Option<&str> {
        self.master_auth
            .as_ref()
            .and_then(|m| m.cluster_ca_certificate.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// Identity of a serving cluster, or `None` while any field is still unresolved
    pub fn identity(&self, project: &str) -> Option<ClusterIdentity> {
        if !self.status.is_serving() {
            return None;
        }
        let zone = self.zone()?;
        let endpoint = self.endpoint.as_deref().filter(|e| !e.is_empty())?;
        let ca_certificate = self.ca_certificate()?;

        Some(ClusterIdentity {
            context: context_name(project, zone, &self.name),
            endpoint: endpoint.to_string(),
            ca_certificate: ca_certificate.to_string(),
        })
    }
}

/// Fields needed to address the cluster; derived once the cluster is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub context: String,
    pub endpoint: String,
    pub ca_certificate: String,
}

impl ClusterIdentity {
    pub fn kubeconfig(&self) -> String {
        synthesize(&self.context, &self.endpoint, &self.ca_certificate)
    }
}
