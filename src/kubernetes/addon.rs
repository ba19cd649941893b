// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Static manifest add-on installation
//!
//! Loads a version-pinned bundle of YAML files and applies every object in
//! two phases: namespaces and CRDs first, then, once every CRD reports
//! `Established`, API discovery is re-run so that the custom kinds those CRDs
//! introduce resolve, then the rest.

use crate::backoff::Backoff;
use crate::constants::addon::{CERT_MANAGER_FILES, NAME};
use crate::constants::FIELD_MANAGER;
use crate::error::{ProvisionError, Result};
use crate::kubernetes::provider::ProviderHandle;
use crate::kubernetes::rbac::RoleBindingApplied;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::discovery::{Discovery, Scope};
use kube::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

const CRD_KIND: &str = "CustomResourceDefinition";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInstallSpec {
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl AddonInstallSpec {
    /// The pinned cert-manager bundle, resolved against `manifest_dir`
    pub fn cert_manager(manifest_dir: &Path) -> Self {
        Self {
            name: NAME.to_string(),
            files: CERT_MANAGER_FILES
                .iter()
                .map(|f| manifest_dir.join(f))
                .collect(),
        }
    }

    /// Fail unless every file of the bundle is present. Makes no remote calls.
    pub fn check_files(&self) -> Result<()> {
        for file in &self.files {
            let meta = std::fs::metadata(file).map_err(|e| {
                ProvisionError::ManifestError(format!("failed to read {}: {}", file.display(), e))
            })?;
            if !meta.is_file() {
                return Err(ProvisionError::ManifestError(format!(
                    "{} is not a file",
                    file.display()
                )));
            }
        }
        Ok(())
    }
}

/// Every object of an add-on, read and parsed before anything is applied
#[derive(Debug, Clone)]
pub struct AddonBundle {
    pub name: String,
    pub files: usize,
    pub manifests: Vec<Manifest>,
}

impl AddonBundle {
    pub async fn load(spec: &AddonInstallSpec) -> Result<Self> {
        Ok(Self {
            name: spec.name.clone(),
            files: spec.files.len(),
            manifests: load_manifests(spec).await?,
        })
    }
}

/// One Kubernetes object from the bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub value: serde_json::Value,
}

impl Manifest {
    fn from_value(value: serde_json::Value, source: &Path) -> Result<Self> {
        let field = |pointer: &str| value.pointer(pointer).and_then(|v| v.as_str());
        let missing = |what: &str| {
            ProvisionError::ManifestError(format!("{}: object without {}", source.display(), what))
        };

        let api_version = field("/apiVersion").ok_or_else(|| missing("apiVersion"))?;
        let kind = field("/kind").ok_or_else(|| missing("kind"))?;
        let name = field("/metadata/name").ok_or_else(|| missing("metadata.name"))?;
        let namespace = field("/metadata/namespace").map(str::to_string);

        Ok(Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace,
            value,
        })
    }

    pub fn gvk(&self) -> GroupVersionKind {
        let (group, version) = match self.api_version.split_once('/') {
            Some((g, v)) => (g, v),
            None => ("", self.api_version.as_str()),
        };
        GroupVersionKind::gvk(group, version, &self.kind)
    }

    /// Namespaces and CRDs must exist before anything that refers to them
    pub fn is_foundational(&self) -> bool {
        self.kind == "Namespace" || self.kind == CRD_KIND
    }
}

/// Apply order for a resource kind (lower = apply first)
pub fn kind_priority(kind: &str) -> u8 {
    match kind {
        "Namespace" => 0,
        "CustomResourceDefinition" => 1,
        "ServiceAccount" => 2,
        "ClusterRole" | "Role" => 3,
        "ClusterRoleBinding" | "RoleBinding" => 4,
        "ConfigMap" | "Secret" => 5,
        "Service" => 6,
        "Deployment" | "DaemonSet" | "StatefulSet" => 7,
        _ => 10,
    }
}

/// Split a multi-document YAML file into objects. Empty documents are skipped
/// and `List` kinds are flattened into their items.
pub fn parse_documents(text: &str, source: &Path) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();

    for document in serde_yaml::Deserializer::from_str(text) {
        let yaml = serde_yaml::Value::deserialize(document).map_err(|e| {
            ProvisionError::ManifestError(format!("{}: invalid YAML: {}", source.display(), e))
        })?;
        if yaml.is_null() {
            continue;
        }

        let value = serde_json::to_value(&yaml).map_err(|e| {
            ProvisionError::ManifestError(format!("{}: {}", source.display(), e))
        })?;

        let is_list = value
            .get("kind")
            .and_then(|k| k.as_str())
            .is_some_and(|k| k == "List" || k.ends_with("List"))
            && value.get("items").is_some_and(|i| i.is_array());

        if is_list {
            if let Some(items) = value.get("items").and_then(|i| i.as_array()) {
                for item in items {
                    manifests.push(Manifest::from_value(item.clone(), source)?);
                }
            }
        } else {
            manifests.push(Manifest::from_value(value, source)?);
        }
    }

    Ok(manifests)
}

/// Read every file of the add-on, in declaration order
pub async fn load_manifests(spec: &AddonInstallSpec) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();

    for file in &spec.files {
        let text = tokio::fs::read_to_string(file).await.map_err(|e| {
            ProvisionError::ManifestError(format!("failed to read {}: {}", file.display(), e))
        })?;
        let parsed = parse_documents(&text, file)?;
        debug!("Loaded {} objects from {}", parsed.len(), file.display());
        manifests.extend(parsed);
    }

    Ok(manifests)
}

/// Split into (foundational, rest), each sorted by kind priority.
/// The sort is stable so objects of the same kind keep file order.
pub fn order(manifests: Vec<Manifest>) -> (Vec<Manifest>, Vec<Manifest>) {
    let (mut foundational, mut rest): (Vec<_>, Vec<_>) =
        manifests.into_iter().partition(Manifest::is_foundational);

    foundational.sort_by_key(|m| kind_priority(&m.kind));
    rest.sort_by_key(|m| kind_priority(&m.kind));

    (foundational, rest)
}

/// Install the add-on. Requires the cluster-admin binding to have been applied.
/// Returns the number of objects applied.
#[instrument(skip(provider, bundle, binding, backoff), fields(provider = %provider.name(), addon = %bundle.name, after = %binding.name()))]
pub async fn install(
    provider: &ProviderHandle,
    bundle: &AddonBundle,
    binding: &RoleBindingApplied,
    backoff: Backoff,
) -> Result<usize> {
    if bundle.manifests.is_empty() {
        info!("Add-on {} has no objects to apply", bundle.name);
        return Ok(0);
    }

    let total = bundle.manifests.len();
    let (foundational, rest) = order(bundle.manifests.clone());
    let client = provider.client();
    let params = PatchParams::apply(FIELD_MANAGER).force();

    info!(
        "Installing add-on {} ({} objects from {} files)",
        bundle.name, total, bundle.files
    );

    // Phase 1: namespaces and CRDs
    if !foundational.is_empty() {
        let discovery = Discovery::new(client.clone()).run().await?;
        for manifest in &foundational {
            apply_manifest(client, &discovery, manifest, &params).await?;
        }
        for crd in foundational.iter().filter(|m| m.kind == CRD_KIND) {
            wait_for_crd_established(client, &crd.name, backoff).await?;
        }
    }

    // Phase 2: refresh discovery so new CRD kinds resolve
    if !rest.is_empty() {
        let discovery = Discovery::new(client.clone()).run().await?;
        for manifest in &rest {
            apply_manifest(client, &discovery, manifest, &params).await?;
        }
    }

    info!("Add-on {} installed", bundle.name);
    Ok(total)
}

fn is_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
}

/// Wait until the API server serves the kinds of a freshly applied CRD.
/// Discovery does not list them before the `Established` condition is `True`.
#[instrument(skip(client, backoff))]
pub async fn wait_for_crd_established(client: &Client, name: &str, backoff: Backoff) -> Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let mut interval = backoff.initial;

    loop {
        match crds.get(name).await {
            Ok(crd) if is_established(&crd) => {
                info!("CRD {} is established", name);
                return Ok(());
            }
            Ok(_) => {
                info!(
                    "CRD {} not yet established, waiting {} seconds...",
                    name,
                    interval.as_secs()
                );
            }
            Err(kube::Error::Api(e)) if e.code == 404 => {
                info!(
                    "CRD {} not yet visible, waiting {} seconds...",
                    name,
                    interval.as_secs()
                );
            }
            Err(e) => return Err(e.into()),
        }

        sleep(interval).await;
        interval = backoff.next(interval);
    }
}

async fn apply_manifest(
    client: &Client,
    discovery: &Discovery,
    manifest: &Manifest,
    params: &PatchParams,
) -> Result<()> {
    let (api_resource, capabilities) = discovery.resolve_gvk(&manifest.gvk()).ok_or_else(|| {
        ProvisionError::ManifestError(format!(
            "Unknown resource type: {}/{}",
            manifest.api_version, manifest.kind
        ))
    })?;

    let api: Api<DynamicObject> = match capabilities.scope {
        Scope::Namespaced => Api::namespaced_with(
            client.clone(),
            manifest.namespace.as_deref().unwrap_or("default"),
            &api_resource,
        ),
        Scope::Cluster => Api::all_with(client.clone(), &api_resource),
    };

    api.patch(&manifest.name, params, &Patch::Apply(&manifest.value))
        .await?;

    debug!(
        kind = %manifest.kind,
        name = %manifest.name,
        namespace = ?manifest.namespace,
        "Applied manifest"
    );
    Ok(())
}
