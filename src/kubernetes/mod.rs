// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes-side declarations: the provider handle, the admin binding and the add-on.

pub mod addon;
pub mod provider;
pub mod rbac;

pub use addon::{AddonBundle, AddonInstallSpec};
pub use provider::{KubeconfigProvider, ProviderFactory, ProviderHandle};
pub use rbac::{RoleBindingApplied, RoleBindingSpec};
