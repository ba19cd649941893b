// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig synthesis for GKE clusters.
//!
//! The generated document never embeds a credential. Its single user entry
//! points at the `gcloud` credential helper, so the consuming client fetches a
//! short-lived token at use time.

use crate::constants::credential_helper::{CMD_ARGS, CMD_PATH, EXPIRY_KEY, TOKEN_KEY};

/// Context name gcloud assigns to a GKE cluster
pub fn context_name(project: &str, zone: &str, cluster_name: &str) -> String {
    format!("gke_{}_{}_{}", project, zone, cluster_name)
}

/// Render the kubeconfig for one cluster. Pure and deterministic.
pub fn synthesize(context: &str, endpoint: &str, ca_certificate: &str) -> String {
    format!(
        r#"apiVersion: v1
clusters:
- cluster:
    certificate-authority-data: {ca_certificate}
    server: https://{endpoint}
  name: {context}
contexts:
- context:
    cluster: {context}
    user: {context}
  name: {context}
current-context: {context}
kind: Config
preferences: {{}}
users:
- name: {context}
  user:
    auth-provider:
      config:
        cmd-args: {cmd_args}
        cmd-path: {cmd_path}
        expiry-key: '{expiry_key}'
        token-key: '{token_key}'
      name: gcp
"#,
        ca_certificate = ca_certificate,
        endpoint = endpoint,
        context = context,
        cmd_args = CMD_ARGS.join(" "),
        cmd_path = CMD_PATH,
        expiry_key = EXPIRY_KEY,
        token_key = TOKEN_KEY,
    )
}
