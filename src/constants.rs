// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager used for server-side apply
pub const FIELD_MANAGER: &str = "gke-bootstrap";

/// Logical name of the cluster-facing provider handle
pub const PROVIDER_NAME: &str = "gvk-repro";

/// Fixed node pool shape of the managed cluster
pub mod cluster {
    pub const DEFAULT_NAME: &str = "gvk-repro-cluster";
    pub const INITIAL_NODE_COUNT: u32 = 1;
    pub const MACHINE_TYPE: &str = "n1-standard-8";
    pub const DISK_TYPE: &str = "pd-ssd";
    pub const LOCAL_SSD_COUNT: u32 = 1;

    pub const OAUTH_SCOPES: &[&str] = &[
        "https://www.googleapis.com/auth/compute",
        "https://www.googleapis.com/auth/devstorage.read_only",
        "https://www.googleapis.com/auth/logging.write",
        "https://www.googleapis.com/auth/monitoring",
    ];
}

/// GKE REST API
pub mod gke {
    pub const API_BASE: &str = "https://container.googleapis.com/v1/";
    /// Overrides the `gcloud` credential helper when set
    pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
}

/// Waiting on remote state to converge (cluster status, CRD establishment)
pub mod poll {
    /// Initial polling interval in seconds
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// External credential helper referenced by the kubeconfig and used for GKE API tokens
pub mod credential_helper {
    pub const CMD_PATH: &str = "gcloud";
    pub const CMD_ARGS: &[&str] = &["config", "config-helper", "--format=json"];
    pub const TOKEN_KEY: &str = "{.credential.access_token}";
    pub const EXPIRY_KEY: &str = "{.credential.token_expiry}";
}

/// Cluster-admin grant
pub mod rbac {
    pub const BINDING_NAME: &str = "cluster-admin-role-binding";
    pub const API_GROUP: &str = "rbac.authorization.k8s.io";
    pub const CLUSTER_ADMIN_ROLE: &str = "cluster-admin";
}

/// Certificate-management add-on
pub mod addon {
    pub const NAME: &str = "cert-manager";
    /// Pinned manifest bundle, relative to the manifest directory
    pub const CERT_MANAGER_FILES: &[&str] = &["cert-manager-0.6.0.yaml"];
}
