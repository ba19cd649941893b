// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster-admin role binding for the configured principal

use crate::constants::rbac::{API_GROUP, BINDING_NAME, CLUSTER_ADMIN_ROLE};
use crate::constants::FIELD_MANAGER;
use crate::error::Result;
use crate::kubernetes::provider::ProviderHandle;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, ResourceExt,
};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBindingSpec {
    pub name: String,
    pub role: String,
    pub subject_email: String,
}

impl RoleBindingSpec {
    /// Grant the built-in `cluster-admin` ClusterRole to one user
    pub fn cluster_admin(email: &str) -> Self {
        Self {
            name: BINDING_NAME.to_string(),
            role: CLUSTER_ADMIN_ROLE.to_string(),
            subject_email: email.to_string(),
        }
    }

    pub fn to_resource(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            role_ref: RoleRef {
                api_group: API_GROUP.to_string(),
                kind: "ClusterRole".to_string(),
                name: self.role.clone(),
            },
            subjects: Some(vec![Subject {
                api_group: Some(API_GROUP.to_string()),
                kind: "User".to_string(),
                name: self.subject_email.clone(),
                namespace: None,
            }]),
        }
    }
}

/// Proof that the role binding was accepted by the API server.
/// Only `apply` can produce one; the add-on installer requires it.
#[derive(Debug, Clone)]
pub struct RoleBindingApplied {
    name: String,
    uid: Option<String>,
}

impl RoleBindingApplied {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(name: &str) -> Self {
        Self {
            name: name.to_string(),
            uid: None,
        }
    }
}

/// Apply the role binding through the provider (create or update)
#[instrument(skip(provider, spec), fields(provider = %provider.name(), binding = %spec.name))]
pub async fn apply(provider: &ProviderHandle, spec: &RoleBindingSpec) -> Result<RoleBindingApplied> {
    let bindings: Api<ClusterRoleBinding> = Api::all(provider.client().clone());
    let pp = PatchParams::apply(FIELD_MANAGER).force();

    info!("Applying ClusterRoleBinding {}", spec.name);
    let applied = bindings
        .patch(&spec.name, &pp, &Patch::Apply(&spec.to_resource()))
        .await?;

    warn!(
        subject = %spec.subject_email,
        role = %spec.role,
        "Granted unrestricted cluster privileges"
    );

    Ok(RoleBindingApplied {
        name: applied.name_any(),
        uid: applied.metadata.uid.clone(),
    })
}
