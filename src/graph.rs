// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Declaration graph: what must exist before what.

use crate::error::{ProvisionError, Result};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    Cluster,
    Kubeconfig,
    Provider,
    RoleBinding,
    Addon,
}

impl Node {
    pub const ALL: [Node; 5] = [
        Node::Cluster,
        Node::Kubeconfig,
        Node::Provider,
        Node::RoleBinding,
        Node::Addon,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            Node::Cluster => "managed GKE cluster",
            Node::Kubeconfig => "kubeconfig for the cluster",
            Node::Provider => "Kubernetes provider bound to the kubeconfig",
            Node::RoleBinding => "cluster-admin ClusterRoleBinding",
            Node::Addon => "cert-manager manifests",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Node::Cluster => "cluster",
            Node::Kubeconfig => "kubeconfig",
            Node::Provider => "provider",
            Node::RoleBinding => "role-binding",
            Node::Addon => "addon",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    /// node -> nodes it depends on
    edges: BTreeMap<Node, Vec<Node>>,
}

impl DeclarationGraph {
    /// The provisioning chain. Each edge is declared, none is implied by position.
    pub fn standard() -> Self {
        let mut graph = Self::default();
        for node in Node::ALL {
            graph.edges.entry(node).or_default();
        }
        graph.depend(Node::Kubeconfig, Node::Cluster);
        graph.depend(Node::Provider, Node::Kubeconfig);
        graph.depend(Node::RoleBinding, Node::Provider);
        // The add-on's controller needs the admin grant in place
        graph.depend(Node::Addon, Node::RoleBinding);
        graph
    }

    /// Record that `node` must wait for `on`
    pub fn depend(&mut self, node: Node, on: Node) {
        self.edges.entry(on).or_default();
        let deps = self.edges.entry(node).or_default();
        if !deps.contains(&on) {
            deps.push(on);
        }
    }

    /// True when `node` declares a direct dependency on `on`
    pub fn depends_on(&self, node: Node, on: Node) -> bool {
        self.edges.get(&node).is_some_and(|deps| deps.contains(&on))
    }

    pub fn dependencies(&self, node: Node) -> &[Node] {
        self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Topological order (Kahn). Ties resolve in `Node` order so the result is stable.
    pub fn order(&self) -> Result<Vec<Node>> {
        let mut remaining: BTreeMap<Node, usize> = self
            .edges
            .iter()
            .map(|(node, deps)| (*node, deps.len()))
            .collect();
        let mut ready: VecDeque<Node> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut ordered = Vec::with_capacity(remaining.len());

        while let Some(node) = ready.pop_front() {
            ordered.push(node);
            for (dependent, deps) in &self.edges {
                if deps.contains(&node) {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push_back(*dependent);
                        }
                    }
                }
            }
        }

        if ordered.len() != self.edges.len() {
            let stuck: Vec<String> = remaining
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(node, _)| node.to_string())
                .collect();
            return Err(ProvisionError::GraphError(format!(
                "dependency cycle between: {}",
                stuck.join(", ")
            )));
        }

        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order_is_the_chain() {
        let order = DeclarationGraph::standard().order().unwrap();
        assert_eq!(order, Node::ALL.to_vec());
    }

    #[test]
    fn test_addon_depends_on_role_binding() {
        let graph = DeclarationGraph::standard();
        assert!(graph.depends_on(Node::Addon, Node::RoleBinding));
        assert!(!graph.depends_on(Node::RoleBinding, Node::Addon));
    }

    #[test]
    fn test_standard_edges() {
        let graph = DeclarationGraph::standard();

        assert_eq!(graph.edge_count(), 4);
        assert!(graph.dependencies(Node::Cluster).is_empty());
        assert_eq!(graph.dependencies(Node::Kubeconfig), &[Node::Cluster]);
        assert_eq!(graph.dependencies(Node::Provider), &[Node::Kubeconfig]);
        assert_eq!(graph.dependencies(Node::RoleBinding), &[Node::Provider]);
    }

    #[test]
    fn test_order_respects_every_edge() {
        let graph = DeclarationGraph::standard();
        let order = graph.order().unwrap();
        let position = |n: Node| order.iter().position(|o| *o == n).unwrap();

        for node in Node::ALL {
            for dep in graph.dependencies(node) {
                assert!(position(*dep) < position(node), "{} before {}", dep, node);
            }
        }
    }

    #[test]
    fn test_duplicate_edge_is_ignored() {
        let mut graph = DeclarationGraph::standard();
        graph.depend(Node::Addon, Node::RoleBinding);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let mut graph = DeclarationGraph::standard();
        graph.depend(Node::Cluster, Node::Addon);

        let err = graph.order().unwrap_err();
        assert!(matches!(err, ProvisionError::GraphError(_)));
        assert!(err.to_string().contains("cluster"));
    }

    #[test]
    fn test_independent_nodes_keep_stable_order() {
        let mut graph = DeclarationGraph::default();
        graph.depend(Node::Addon, Node::Cluster);
        graph.depend(Node::RoleBinding, Node::Cluster);

        assert_eq!(
            graph.order().unwrap(),
            vec![Node::Cluster, Node::RoleBinding, Node::Addon]
        );
    }
}
