// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("GKE API returned {status}: {message}")]
    GkeApiError { status: u16, message: String },

    #[error("Cluster {name} failed to become ready: {reason}")]
    ClusterFailed { name: String, reason: String },

    #[error("Cluster not ready: {0}")]
    ClusterNotReady(String),

    #[error("Failed to obtain access token: {0}")]
    CredentialsError(String),

    #[error("Failed to build kubeconfig client: {0}")]
    KubeconfigError(String),

    #[error("Invalid manifest: {0}")]
    ManifestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Declaration graph error: {0}")]
    GraphError(String),
}

impl ProvisionError {
    /// True when the GKE API reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisionError::GkeApiError { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
