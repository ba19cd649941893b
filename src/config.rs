// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::cluster::DEFAULT_NAME;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

/// Provisioning configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Principal granted the cluster-admin role
    pub gcloud_email: String,
    pub project: String,
    pub zone: String,
    pub cluster_name: String,
    /// Directory holding the add-on manifest bundle
    pub manifest_dir: PathBuf,
    /// Where to write the synthesized kubeconfig after apply (optional)
    pub kubeconfig_out: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    /// Fails before anything else runs when a required value is missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gcloud_email = non_empty("GCLOUD_EMAIL")
            .context("GCLOUD_EMAIL environment variable not set")?;
        if !gcloud_email.contains('@') {
            return Err(anyhow!(
                "GCLOUD_EMAIL must be an email address, got '{}'",
                gcloud_email
            ));
        }

        let project = non_empty("GCP_PROJECT")
            .or_else(|| non_empty("CLOUDSDK_CORE_PROJECT"))
            .context("GCP_PROJECT (or CLOUDSDK_CORE_PROJECT) environment variable not set")?;
        let zone = non_empty("GCP_ZONE")
            .or_else(|| non_empty("CLOUDSDK_COMPUTE_ZONE"))
            .context("GCP_ZONE (or CLOUDSDK_COMPUTE_ZONE) environment variable not set")?;

        let cluster_name = non_empty("CLUSTER_NAME").unwrap_or_else(|| DEFAULT_NAME.to_string());
        let manifest_dir = non_empty("MANIFEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let kubeconfig_out = non_empty("KUBECONFIG_OUT").map(PathBuf::from);

        Ok(Config {
            gcloud_email,
            project,
            zone,
            cluster_name,
            manifest_dir,
            kubeconfig_out,
        })
    }
}
