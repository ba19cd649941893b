// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster-facing provider handle built from a synthesized kubeconfig

use crate::error::{ProvisionError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::future::Future;
use tracing::{info, instrument};

/// Turns a synthesized kubeconfig into a provider handle
pub trait ProviderFactory {
    fn connect(
        &self,
        name: &str,
        kubeconfig: &str,
    ) -> impl Future<Output = Result<ProviderHandle>> + Send;
}

/// Connects to whatever cluster the kubeconfig text names
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeconfigProvider;

impl ProviderFactory for KubeconfigProvider {
    async fn connect(&self, name: &str, kubeconfig: &str) -> Result<ProviderHandle> {
        ProviderHandle::from_kubeconfig(name, kubeconfig).await
    }
}

/// A Kubernetes client bound to exactly one cluster.
/// Every Kubernetes-side operation takes this handle instead of ambient config.
#[derive(Clone)]
pub struct ProviderHandle {
    name: String,
    client: Client,
}

impl ProviderHandle {
    /// Build a handle from kubeconfig text. Never consults `~/.kube/config` or in-cluster config.
    #[instrument(skip(kubeconfig))]
    pub async fn from_kubeconfig(name: &str, kubeconfig: &str) -> Result<Self> {
        let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig).map_err(|e| {
            ProvisionError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e))
        })?;

        let client_config =
            kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    ProvisionError::KubeconfigError(format!("Failed to create config: {}", e))
                })?;

        info!("Provider {} targets {}", name, client_config.cluster_url);

        let client = Client::try_from(client_config).map_err(|e| {
            ProvisionError::KubeconfigError(format!("Failed to create client: {}", e))
        })?;

        Ok(Self::from_client(name, client))
    }

    pub fn from_client(name: &str, client: Client) -> Self {
        Self {
            name: name.to_string(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
