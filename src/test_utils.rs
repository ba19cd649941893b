// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking the Kubernetes and GKE APIs.

use crate::error::{ProvisionError, Result};
use crate::backoff::Backoff;
use crate::gke::ContainerApi;
use crate::kubernetes::provider::{ProviderFactory, ProviderHandle};
use crate::kubernetes::rbac::RoleBindingSpec;
use crate::types::cluster::{ClusterSpec, ClusterStatus, GkeCluster, MasterAuth};
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
/// A path registered with several responses answers with them in turn and then
/// keeps repeating the last one.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, vec![(status, body.to_string())])
    }

    /// Add successive responses for GET requests matching the exact path
    pub fn on_get_sequence(self, path: &str, bodies: &[&str]) -> Self {
        let responses = bodies.iter().map(|b| (200, b.to_string())).collect();
        self.on("GET", path, responses)
    }

    /// Add a response for PATCH (server-side apply) requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, vec![(status, body.to_string())])
    }

    /// Every (method, path) seen so far, in arrival order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json(&path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(path: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} not found", path),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// API server echo of an applied ClusterRoleBinding
pub fn cluster_role_binding_json(spec: &RoleBindingSpec) -> String {
    let mut value = serde_json::to_value(spec.to_resource()).unwrap();
    value["metadata"]["uid"] = serde_json::json!("test-uid");
    value.to_string()
}

/// Register discovery responses for a core-only API server (Namespaces and ConfigMaps)
pub fn core_discovery(mock: MockService) -> MockService {
    let versions = serde_json::json!({
        "kind": "APIVersions",
        "versions": ["v1"],
        "serverAddressByClientCIDRs": [
            {"clientCIDR": "0.0.0.0/0", "serverAddress": "10.0.0.1:443"}
        ]
    });
    let resources = serde_json::json!({
        "kind": "APIResourceList",
        "groupVersion": "v1",
        "resources": [
            {
                "name": "namespaces",
                "singularName": "namespace",
                "namespaced": false,
                "kind": "Namespace",
                "verbs": ["create", "delete", "get", "list", "patch", "update", "watch"]
            },
            {
                "name": "configmaps",
                "singularName": "configmap",
                "namespaced": true,
                "kind": "ConfigMap",
                "verbs": ["create", "delete", "get", "list", "patch", "update", "watch"]
            }
        ]
    });
    let groups = serde_json::json!({
        "kind": "APIGroupList",
        "apiVersion": "v1",
        "groups": []
    });

    mock.on_get("/api", 200, &versions.to_string())
        .on_get("/api/v1", 200, &resources.to_string())
        .on_get("/apis", 200, &groups.to_string())
}

/// Core discovery plus the CRD API and the cert-manager `Issuer` kind
pub fn crd_discovery(mock: MockService) -> MockService {
    let group = |name: &str, version: &str| {
        let group_version = format!("{}/{}", name, version);
        serde_json::json!({
            "name": name,
            "versions": [{"groupVersion": group_version, "version": version}],
            "preferredVersion": {"groupVersion": group_version, "version": version}
        })
    };
    let groups = serde_json::json!({
        "kind": "APIGroupList",
        "apiVersion": "v1",
        "groups": [
            group("apiextensions.k8s.io", "v1"),
            group("certmanager.k8s.io", "v1alpha1")
        ]
    });
    let crds = serde_json::json!({
        "kind": "APIResourceList",
        "groupVersion": "apiextensions.k8s.io/v1",
        "resources": [{
            "name": "customresourcedefinitions",
            "singularName": "customresourcedefinition",
            "namespaced": false,
            "kind": "CustomResourceDefinition",
            "verbs": ["create", "delete", "get", "list", "patch", "update", "watch"]
        }]
    });
    let issuers = serde_json::json!({
        "kind": "APIResourceList",
        "groupVersion": "certmanager.k8s.io/v1alpha1",
        "resources": [{
            "name": "issuers",
            "singularName": "issuer",
            "namespaced": true,
            "kind": "Issuer",
            "verbs": ["create", "delete", "get", "list", "patch", "update", "watch"]
        }]
    });

    core_discovery(mock)
        .on_get("/apis", 200, &groups.to_string())
        .on_get("/apis/apiextensions.k8s.io/v1", 200, &crds.to_string())
        .on_get("/apis/certmanager.k8s.io/v1alpha1", 200, &issuers.to_string())
}

/// API server view of the `issuers.certmanager.k8s.io` CRD
pub fn issuer_crd_json(established: bool) -> String {
    serde_json::json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": {"name": "issuers.certmanager.k8s.io"},
        "spec": {
            "group": "certmanager.k8s.io",
            "names": {"kind": "Issuer", "plural": "issuers"},
            "scope": "Namespaced",
            "versions": [{"name": "v1alpha1", "served": true, "storage": true}]
        },
        "status": {
            "acceptedNames": {"kind": "Issuer", "plural": "issuers"},
            "storedVersions": ["v1alpha1"],
            "conditions": [{
                "type": "Established",
                "status": if established { "True" } else { "False" }
            }]
        }
    })
    .to_string()
}

pub fn make_spec() -> ClusterSpec {
    ClusterSpec {
        name: "repro-cluster".to_string(),
        project: "demo-proj".to_string(),
        zone: "us-central1-a".to_string(),
        initial_node_count: 1,
        machine_type: "n1-standard-8".to_string(),
        disk_type: "pd-ssd".to_string(),
        local_ssd_count: 1,
        oauth_scopes: vec!["https://www.googleapis.com/auth/compute".to_string()],
    }
}

pub fn fast_backoff() -> Backoff {
    Backoff {
        initial: Duration::from_millis(1),
        max: Duration::from_millis(2),
    }
}

/// In-memory GKE. Each `get_cluster` advances through the queued statuses.
#[derive(Default)]
pub struct FakeContainerApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    cluster: Option<GkeCluster>,
    create_progress: Vec<ClusterStatus>,
    pending: VecDeque<ClusterStatus>,
    create_error: Option<(u16, String)>,
    calls: Vec<String>,
}

fn live_cluster(status: ClusterStatus) -> GkeCluster {
    GkeCluster {
        name: "repro-cluster".to_string(),
        zone: Some("us-central1-a".to_string()),
        location: Some("us-central1-a".to_string()),
        endpoint: Some("1.2.3.4".to_string()),
        master_auth: Some(MasterAuth {
            cluster_ca_certificate: Some("BASE64DATA".to_string()),
        }),
        status,
        status_message: None,
    }
}

fn not_found() -> ProvisionError {
    ProvisionError::GkeApiError {
        status: 404,
        message: "Not found".to_string(),
    }
}

impl FakeContainerApi {
    /// No cluster exists yet; a create moves straight to RUNNING
    pub fn empty() -> Self {
        Self::default().on_create_progress(vec![ClusterStatus::Running])
    }

    /// A cluster that is already up
    pub fn running() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().cluster = Some(live_cluster(ClusterStatus::Running));
        fake
    }

    /// Statuses reported by successive gets after a create
    pub fn on_create_progress(self, statuses: Vec<ClusterStatus>) -> Self {
        self.state.lock().unwrap().create_progress = statuses;
        self
    }

    pub fn fail_create(self, status: u16, message: &str) -> Self {
        self.state.lock().unwrap().create_error = Some((status, message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl ContainerApi for FakeContainerApi {
    async fn get_cluster(&self, _spec: &ClusterSpec) -> Result<GkeCluster> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("get".to_string());

        let next = state.pending.pop_front();
        let cluster = state.cluster.as_mut().ok_or_else(not_found)?;
        if let Some(status) = next {
            cluster.status = status;
        }
        Ok(cluster.clone())
    }

    async fn create_cluster(&self, _spec: &ClusterSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create".to_string());

        if let Some((status, message)) = state.create_error.clone() {
            return Err(ProvisionError::GkeApiError { status, message });
        }
        state.cluster = Some(live_cluster(ClusterStatus::Provisioning));
        let progress: VecDeque<ClusterStatus> = state.create_progress.iter().copied().collect();
        state.pending = progress;
        Ok(())
    }

    async fn delete_cluster(&self, _spec: &ClusterSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("delete".to_string());

        match state.cluster.take() {
            Some(_) => Ok(()),
            None => Err(not_found()),
        }
    }
}

/// Hands out a handle on a fixed client and records every kubeconfig it was given
#[derive(Clone)]
pub struct FixedProvider {
    handle: ProviderHandle,
    kubeconfigs: Arc<Mutex<Vec<String>>>,
}

impl FixedProvider {
    pub fn new(mock: &MockService) -> Self {
        Self {
            handle: ProviderHandle::from_client("test", mock.clone().into_client()),
            kubeconfigs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn kubeconfigs(&self) -> Vec<String> {
        self.kubeconfigs.lock().unwrap().clone()
    }
}

impl ProviderFactory for FixedProvider {
    async fn connect(&self, _name: &str, kubeconfig: &str) -> Result<ProviderHandle> {
        self.kubeconfigs.lock().unwrap().push(kubeconfig.to_string());
        Ok(self.handle.clone())
    }
}
