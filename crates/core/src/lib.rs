//! Orka core types: type/resource identifiers, REST mappings and mapping errors.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

mod error;
mod gvk;

pub use error::MapError;
pub use gvk::{GroupKind, Gvk, Gvr, Scope};

pub type MapResult<T> = Result<T, MapError>;

/// One served resource as reported by a directory source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveredResource {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name used in URL paths, e.g. `deployments`.
    pub plural: String,
    /// Singular name; when absent the lowercased kind is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular: Option<String>,
    pub namespaced: bool,
}

impl DiscoveredResource {
    pub fn gvk(&self) -> Gvk {
        Gvk::new(self.group.clone(), self.version.clone(), self.kind.clone())
    }

    pub fn gvr(&self) -> Gvr {
        Gvr::new(self.group.clone(), self.version.clone(), self.plural.clone())
    }

    pub fn singular_name(&self) -> String {
        match &self.singular {
            Some(s) if !s.is_empty() => s.clone(),
            _ => self.kind.to_lowercase(),
        }
    }

    pub fn gvk_key(&self) -> String {
        self.gvk().to_string()
    }
}

/// Resolved mapping from a type to the collection that serves it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestMapping {
    pub gvk: Gvk,
    pub resource: Gvr,
    pub scope: Scope,
}

impl RestMapping {
    pub fn is_namespaced(&self) -> bool {
        self.scope.is_namespaced()
    }
}

pub mod prelude {
    pub use super::{DiscoveredResource, GroupKind, Gvk, Gvr, MapError, MapResult, RestMapping, Scope};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_defaults_to_lowercased_kind() {
        let mut r = DiscoveredResource {
            group: "apps".into(),
            version: "v1".into(),
            kind: "StatefulSet".into(),
            plural: "statefulsets".into(),
            singular: None,
            namespaced: true,
        };
        assert_eq!(r.singular_name(), "statefulset");
        r.singular = Some(String::new());
        assert_eq!(r.singular_name(), "statefulset");
        r.singular = Some("sts".into());
        assert_eq!(r.singular_name(), "sts");
        assert_eq!(r.gvk_key(), "apps/v1/StatefulSet");
        assert_eq!(r.gvr(), Gvr::new("apps", "v1", "statefulsets"));
    }

    #[test]
    fn discovered_resource_json_omits_missing_singular() {
        let r = DiscoveredResource {
            group: String::new(),
            version: "v1".into(),
            kind: "Pod".into(),
            plural: "pods".into(),
            singular: None,
            namespaced: true,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("singular").is_none());
        let back: DiscoveredResource = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }
}
