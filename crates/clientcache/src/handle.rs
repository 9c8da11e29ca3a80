use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use orka_core::{Gvk, Gvr, RestMapping, Scope};

/// Everything needed to issue requests for one type: the transport plus the
/// REST mapping it was resolved against. Never changes once built.
#[derive(Debug)]
pub struct ResourceHandle<T> {
    gvk: Gvk,
    transport: T,
    mapping: RestMapping,
}

impl<T> ResourceHandle<T> {
    pub fn new(gvk: Gvk, transport: T, mapping: RestMapping) -> Self {
        Self { gvk, transport, mapping }
    }

    pub fn gvk(&self) -> &Gvk {
        &self.gvk
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn mapping(&self) -> &RestMapping {
        &self.mapping
    }

    pub fn gvr(&self) -> &Gvr {
        &self.mapping.resource
    }

    /// Plural resource name used in request paths.
    pub fn resource(&self) -> &str {
        &self.mapping.resource.resource
    }

    pub fn scope(&self) -> Scope {
        self.mapping.scope
    }

    pub fn is_namespaced(&self) -> bool {
        self.mapping.is_namespaced()
    }
}

/// A resolved resource handle bound to one concrete value's metadata.
/// Transient: built per call and never cached.
#[derive(Debug)]
pub struct ObjectHandle<'a, T> {
    resource: Arc<ResourceHandle<T>>,
    meta: &'a ObjectMeta,
}

impl<'a, T> ObjectHandle<'a, T> {
    pub fn new(resource: Arc<ResourceHandle<T>>, meta: &'a ObjectMeta) -> Self {
        Self { resource, meta }
    }

    pub fn resource_handle(&self) -> &Arc<ResourceHandle<T>> {
        &self.resource
    }

    pub fn gvk(&self) -> &Gvk {
        self.resource.gvk()
    }

    pub fn resource(&self) -> &str {
        self.resource.resource()
    }

    pub fn is_namespaced(&self) -> bool {
        self.resource.is_namespaced()
    }

    pub fn transport(&self) -> &T {
        self.resource.transport()
    }

    pub fn name(&self) -> Option<&'a str> {
        self.meta.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.meta.namespace.as_deref()
    }

    pub fn labels(&self) -> Option<&'a BTreeMap<String, String>> {
        self.meta.labels.as_ref()
    }

    /// Namespace to put in the request path: the object's namespace for
    /// namespaced resources, nothing for cluster-scoped ones.
    pub fn request_namespace(&self) -> Option<&'a str> {
        if self.is_namespaced() { self.namespace() } else { None }
    }
}
