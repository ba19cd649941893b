// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Drives the declaration graph against GKE and the cluster's API server.

use crate::config::Config;
use crate::constants::PROVIDER_NAME;
use crate::error::{ProvisionError, Result};
use crate::backoff::Backoff;
use crate::gke::{self, ContainerApi};
use crate::graph::{DeclarationGraph, Node};
use crate::kubernetes::addon::{self, AddonBundle, AddonInstallSpec};
use crate::kubernetes::provider::{KubeconfigProvider, ProviderFactory, ProviderHandle};
use crate::kubernetes::rbac::{self, RoleBindingApplied, RoleBindingSpec};
use crate::types::cluster::{ClusterIdentity, ClusterSpec};
use tracing::{info, instrument};

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub node: Node,
    pub description: String,
    pub depends_on: Vec<Node>,
}

/// What a successful apply produced
#[derive(Debug)]
pub struct ApplyOutcome {
    pub identity: ClusterIdentity,
    pub kubeconfig: String,
    pub binding: RoleBindingApplied,
    pub addon_objects: usize,
}

pub struct Provisioner<A, P = KubeconfigProvider> {
    config: Config,
    api: A,
    providers: P,
    graph: DeclarationGraph,
    backoff: Backoff,
}

/// Value produced by an upstream node, or an error naming the missing edge
fn require<'a, T>(value: &'a Option<T>, node: Node, needs: Node) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| {
        ProvisionError::GraphError(format!("{} needs {}, which has not been applied", node, needs))
    })
}

/// Ordered steps of an apply for `config`. Makes no remote calls, but fails
/// when a file of the add-on bundle is missing.
pub fn plan(config: &Config, graph: &DeclarationGraph) -> Result<Vec<PlanStep>> {
    let spec = ClusterSpec::from_config(config);
    let binding = RoleBindingSpec::cluster_admin(&config.gcloud_email);
    let addon = AddonInstallSpec::cert_manager(&config.manifest_dir);
    addon.check_files()?;

    graph
        .order()?
        .into_iter()
        .map(|node| {
            let description = match node {
                Node::Cluster => format!(
                    "{} {} in {}/{} ({} x {}, {}, {} local SSD)",
                    node.describe(),
                    spec.name,
                    spec.project,
                    spec.zone,
                    spec.initial_node_count,
                    spec.machine_type,
                    spec.disk_type,
                    spec.local_ssd_count
                ),
                Node::RoleBinding => format!(
                    "{} {} granting {} to {}",
                    node.describe(),
                    binding.name,
                    binding.role,
                    binding.subject_email
                ),
                Node::Addon => format!(
                    "{} ({})",
                    node.describe(),
                    addon
                        .files
                        .iter()
                        .map(|f| f.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                Node::Kubeconfig | Node::Provider => node.describe().to_string(),
            };
            Ok(PlanStep {
                node,
                description,
                depends_on: graph.dependencies(node).to_vec(),
            })
        })
        .collect()
}

impl<A: ContainerApi> Provisioner<A> {
    pub fn new(config: Config, api: A) -> Self {
        Self::with_providers(config, api, KubeconfigProvider)
    }
}

impl<A: ContainerApi, P: ProviderFactory> Provisioner<A, P> {
    /// Like `new`, with `providers` turning the synthesized kubeconfig into a handle
    pub fn with_providers(config: Config, api: A, providers: P) -> Self {
        Self {
            config,
            api,
            providers,
            graph: DeclarationGraph::standard(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn cluster_spec(&self) -> ClusterSpec {
        ClusterSpec::from_config(&self.config)
    }

    pub fn role_binding_spec(&self) -> RoleBindingSpec {
        RoleBindingSpec::cluster_admin(&self.config.gcloud_email)
    }

    pub fn addon_spec(&self) -> AddonInstallSpec {
        AddonInstallSpec::cert_manager(&self.config.manifest_dir)
    }

    /// Ordered steps of an apply. Makes no remote calls.
    pub fn plan(&self) -> Result<Vec<PlanStep>> {
        plan(&self.config, &self.graph)
    }

    /// Walk the graph in dependency order. The first failure aborts the run and
    /// leaves everything already applied in place. The add-on bundle is read
    /// before anything is created.
    #[instrument(skip(self), fields(cluster = %self.config.cluster_name))]
    pub async fn apply(&self) -> Result<ApplyOutcome> {
        let spec = self.cluster_spec();
        let binding_spec = self.role_binding_spec();
        let bundle = AddonBundle::load(&self.addon_spec()).await?;
        info!(
            "Loaded add-on {} ({} objects)",
            bundle.name,
            bundle.manifests.len()
        );

        let mut identity: Option<ClusterIdentity> = None;
        let mut kubeconfig: Option<String> = None;
        let mut provider: Option<ProviderHandle> = None;
        let mut binding: Option<RoleBindingApplied> = None;
        let mut addon_objects = 0;

        for node in self.graph.order()? {
            info!("Applying {}", node);
            match node {
                Node::Cluster => {
                    identity = Some(gke::ensure_cluster(&self.api, &spec, self.backoff).await?);
                }
                Node::Kubeconfig => {
                    let document = require(&identity, node, Node::Cluster)?.kubeconfig();
                    if let Some(path) = &self.config.kubeconfig_out {
                        tokio::fs::write(path, &document).await?;
                        info!("Kubeconfig written to {}", path.display());
                    }
                    kubeconfig = Some(document);
                }
                Node::Provider => {
                    let document = require(&kubeconfig, node, Node::Kubeconfig)?;
                    provider = Some(self.providers.connect(PROVIDER_NAME, document).await?);
                }
                Node::RoleBinding => {
                    let handle = require(&provider, node, Node::Provider)?;
                    binding = Some(rbac::apply(handle, &binding_spec).await?);
                }
                Node::Addon => {
                    let handle = require(&provider, node, Node::Provider)?;
                    let applied = require(&binding, node, Node::RoleBinding)?;
                    addon_objects = addon::install(handle, &bundle, applied, self.backoff).await?;
                }
            }
        }

        let outcome = ApplyOutcome {
            identity: require(&identity, Node::Addon, Node::Cluster)?.clone(),
            kubeconfig: require(&kubeconfig, Node::Addon, Node::Kubeconfig)?.clone(),
            binding: require(&binding, Node::Addon, Node::RoleBinding)?.clone(),
            addon_objects,
        };
        info!(context = %outcome.identity.context, "Apply complete");
        Ok(outcome)
    }

    /// Tear down the cluster; everything inside it goes with it
    #[instrument(skip(self), fields(cluster = %self.config.cluster_name))]
    pub async fn destroy(&self) -> Result<bool> {
        gke::destroy_cluster(&self.api, &self.cluster_spec(), self.backoff).await
    }

    /// Kubeconfig for the existing cluster, without changing anything
    #[instrument(skip(self), fields(cluster = %self.config.cluster_name))]
    pub async fn kubeconfig(&self) -> Result<String> {
        let spec = self.cluster_spec();
        let cluster = self.api.get_cluster(&spec).await?;

        cluster
            .identity(&spec.project)
            .map(|identity| identity.kubeconfig())
            .ok_or_else(|| {
                ProvisionError::ClusterNotReady(format!(
                    "{} is {:?}; endpoint and CA are not available yet",
                    spec.name, cluster.status
                ))
            })
    }
}
