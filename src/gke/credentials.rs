// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access tokens for the GKE API, taken from the same `gcloud` helper the
//! generated kubeconfig defers to.

use crate::constants::credential_helper::{CMD_ARGS, CMD_PATH};
use crate::constants::gke::ACCESS_TOKEN_ENV;
use crate::error::{ProvisionError, Result};
use serde::Deserialize;
use std::env;
use tokio::process::Command;
use tracing::debug;

#[derive(Deserialize, Debug)]
struct ConfigHelperOutput {
    credential: Credential,
}

#[derive(Deserialize, Debug)]
struct Credential {
    access_token: Option<String>,
}

/// Fetch a short-lived access token
pub async fn access_token() -> Result<String> {
    if let Some(token) = env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
        debug!("Using access token from {}", ACCESS_TOKEN_ENV);
        return Ok(token);
    }

    debug!("Requesting access token from {} {}", CMD_PATH, CMD_ARGS.join(" "));
    let output = Command::new(CMD_PATH)
        .args(CMD_ARGS)
        .output()
        .await
        .map_err(|e| ProvisionError::CredentialsError(format!("failed to run {}: {}", CMD_PATH, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProvisionError::CredentialsError(format!(
            "{} failed: {}",
            CMD_PATH,
            stderr.trim()
        )));
    }

    parse_config_helper_output(&String::from_utf8_lossy(&output.stdout))
}

/// Extract `credential.access_token` from `gcloud config config-helper --format=json`
pub fn parse_config_helper_output(json: &str) -> Result<String> {
    let parsed: ConfigHelperOutput = serde_json::from_str(json).map_err(|e| {
        ProvisionError::CredentialsError(format!("unexpected config-helper output: {}", e))
    })?;

    parsed
        .credential
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ProvisionError::CredentialsError(
                "config-helper output has no credential.access_token".to_string(),
            )
        })
}
