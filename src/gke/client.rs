// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! GKE REST client

use crate::constants::gke::API_BASE;
use crate::error::{ProvisionError, Result};
use crate::gke::credentials;
use crate::types::cluster::{ClusterSpec, GkeCluster};
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, instrument};
use url::Url;

/// Cluster operations of the GKE API
pub trait ContainerApi {
    /// Fetch the live cluster. A missing cluster is a 404 `GkeApiError`.
    fn get_cluster(&self, spec: &ClusterSpec) -> impl Future<Output = Result<GkeCluster>> + Send;

    /// Start creating the cluster; completion is observed through `get_cluster`
    fn create_cluster(&self, spec: &ClusterSpec) -> impl Future<Output = Result<()>> + Send;

    /// Start deleting the cluster
    fn delete_cluster(&self, spec: &ClusterSpec) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Deserialize, Debug)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize, Debug)]
struct GoogleError {
    message: String,
}

pub struct GkeClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl GkeClient {
    pub fn new(token: String) -> Result<Self> {
        let base = Url::parse(API_BASE)
            .map_err(|e| ProvisionError::ConfigError(format!("Invalid GKE API URL: {}", e)))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("gke-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base, token })
    }

    /// Create a client authenticated through the gcloud credential helper
    pub async fn from_gcloud() -> Result<Self> {
        let token = credentials::access_token().await?;
        Self::new(token)
    }

    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    fn clusters_url(&self, spec: &ClusterSpec) -> Result<Url> {
        self.base
            .join(&format!(
                "projects/{}/locations/{}/clusters",
                spec.project, spec.zone
            ))
            .map_err(|e| ProvisionError::ConfigError(format!("Invalid cluster URL: {}", e)))
    }

    fn cluster_url(&self, spec: &ClusterSpec) -> Result<Url> {
        let mut url = self.clusters_url(spec)?;
        url.path_segments_mut()
            .map_err(|_| ProvisionError::ConfigError("GKE API URL cannot be a base".to_string()))?
            .push(&spec.name);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProvisionError::GkeApiError {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

/// Human-readable message from a Google API error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<GoogleErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl ContainerApi for GkeClient {
    #[instrument(skip(self, spec), fields(cluster = %spec.name))]
    async fn get_cluster(&self, spec: &ClusterSpec) -> Result<GkeCluster> {
        let url = self.cluster_url(spec)?;
        debug!("GET {}", url);

        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip(self, spec), fields(cluster = %spec.name))]
    async fn create_cluster(&self, spec: &ClusterSpec) -> Result<()> {
        let url = self.clusters_url(spec)?;
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&spec.to_create_request())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, spec), fields(cluster = %spec.name))]
    async fn delete_cluster(&self, spec: &ClusterSpec) -> Result<()> {
        let url = self.cluster_url(spec)?;
        debug!("DELETE {}", url);

        let response = self.http.delete(url).bearer_auth(&self.token).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
