//! Orka kubehub: kube-rs adapters for the REST mapper and client cache.

#![forbid(unsafe_code)]

pub mod directory;
pub mod object;
pub mod transport;

pub use directory::KubeDirectory;
pub use object::DynamicRef;
pub use transport::{api_resource, dynamic_api, object_api, KubeTransportFactory};

use kube::core::GroupVersionKind;
use orka_core::Gvk;

pub fn to_kube_gvk(gvk: &Gvk) -> GroupVersionKind {
    GroupVersionKind { group: gvk.group.clone(), version: gvk.version.clone(), kind: gvk.kind.clone() }
}

pub fn from_kube_gvk(gvk: &GroupVersionKind) -> Gvk {
    Gvk::new(gvk.group.clone(), gvk.version.clone(), gvk.kind.clone())
}
