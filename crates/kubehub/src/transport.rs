use anyhow::{Context, Result};
use kube::{
    api::Api,
    core::{ApiResource, DynamicObject},
    Client, Config,
};
use orka_clientcache::{ObjectHandle, ResourceHandle, TransportFactory};
use orka_core::Gvk;
use tracing::debug;

use crate::to_kube_gvk;

/// Builds a [`kube::Client`] per type from a shared [`kube::Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeTransportFactory;

#[async_trait::async_trait]
impl TransportFactory for KubeTransportFactory {
    type Config = Config;
    type Transport = Client;

    async fn transport_for(&self, gvk: &Gvk, config: &Config) -> Result<Client> {
        debug!(gvk = %gvk, cluster = %config.cluster_url, "kubehub: building client");
        Client::try_from(config.clone()).with_context(|| format!("building client for {gvk}"))
    }
}

/// kube-rs resource description for a resolved handle.
pub fn api_resource<T>(handle: &ResourceHandle<T>) -> ApiResource {
    ApiResource::from_gvk_with_plural(&to_kube_gvk(handle.gvk()), handle.resource())
}

/// Dynamic API for a resolved type. The namespace is ignored for
/// cluster-scoped resources; `None` means all namespaces.
pub fn dynamic_api(handle: &ResourceHandle<Client>, namespace: Option<&str>) -> Api<DynamicObject> {
    let ar = api_resource(handle);
    let client = handle.transport().clone();
    match namespace {
        Some(ns) if handle.is_namespaced() => Api::namespaced_with(client, ns, &ar),
        _ => Api::all_with(client, &ar),
    }
}

/// Dynamic API scoped to the object's own namespace.
pub fn object_api(handle: &ObjectHandle<'_, Client>) -> Api<DynamicObject> {
    dynamic_api(handle.resource_handle(), handle.request_namespace())
}
