//! Group/Version/Kind and Group/Version/Resource identifiers.
//!
//! Keys render and parse in the same compact form the CLI accepts:
//! `v1/ConfigMap` for the core group, `apps/v1/Deployment` otherwise.

use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Identifies a schema type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { group: group.into(), version: version.into(), kind: kind.into() }
    }

    /// Build from an `apiVersion` string (`v1` or `apps/v1`) and a kind.
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Self::new(group, version, kind),
            None => Self::new("", api_version, kind),
        }
    }

    pub fn group_kind(&self) -> GroupKind {
        GroupKind { group: self.group.clone(), kind: self.kind.clone() }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() { self.version.clone() } else { format!("{}/{}", self.group, self.version) }
    }

    /// Item type of a list kind, following the `<Kind>List` naming convention.
    ///
    /// Nothing verifies that the two types are actually related; a kind that
    /// merely happens to end in `List` is stripped all the same. A bare `List`
    /// kind has no item type.
    pub fn list_item(&self) -> Option<Gvk> {
        let item = self.kind.strip_suffix("List").filter(|k| !k.is_empty())?;
        Some(Gvk::new(self.group.clone(), self.version.clone(), item))
    }

    /// Parse `v1/Kind` or `group/v1/Kind`.
    pub fn parse_key(key: &str) -> Result<Self> {
        let parts: Vec<_> = key.split('/').collect();
        match parts.as_slice() {
            [version, kind] if !version.is_empty() && !kind.is_empty() => Ok(Self::new("", *version, *kind)),
            [group, version, kind] if !version.is_empty() && !kind.is_empty() => Ok(Self::new(*group, *version, *kind)),
            _ => Err(anyhow!("invalid gvk key: {} (expect v1/Kind or group/v1/Kind)", key)),
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Identifies a URL-addressable collection. Used both fully qualified and as
/// a partial query, where an empty group or version matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gvr {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl Gvr {
    pub fn new(group: impl Into<String>, version: impl Into<String>, resource: impl Into<String>) -> Self {
        Self { group: group.into(), version: version.into(), resource: resource.into() }
    }

    /// Partial identifier carrying only a resource name.
    pub fn resource_only(resource: impl Into<String>) -> Self {
        Self::new("", "", resource)
    }

    /// Parse `resource`, `v1/resource` or `group/v1/resource`.
    pub fn parse_key(key: &str) -> Result<Self> {
        let parts: Vec<_> = key.split('/').collect();
        match parts.as_slice() {
            [resource] if !resource.is_empty() => Ok(Self::resource_only(*resource)),
            [version, resource] if !resource.is_empty() => Ok(Self::new("", *version, *resource)),
            [group, version, resource] if !resource.is_empty() => Ok(Self::new(*group, *version, *resource)),
            _ => Err(anyhow!("invalid resource key: {} (expect resource, v1/resource or group/v1/resource)", key)),
        }
    }
}

impl fmt::Display for Gvr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.group.is_empty(), self.version.is_empty()) {
            (true, true) => write!(f, "{}", self.resource),
            (true, false) => write!(f, "{}/{}", self.version, self.resource),
            _ => write!(f, "{}/{}/{}", self.group, self.version, self.resource),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { group: group.into(), kind: kind.into() }
    }

    pub fn with_version(&self, version: impl Into<String>) -> Gvk {
        Gvk::new(self.group.clone(), version, self.kind.clone())
    }

    /// Parse `Kind` (core group) or `group/Kind`.
    pub fn parse_key(key: &str) -> Result<Self> {
        match key.split_once('/') {
            None if !key.is_empty() => Ok(Self::new("", key)),
            Some((group, kind)) if !kind.is_empty() && !kind.contains('/') => Ok(Self::new(group, kind)),
            _ => Err(anyhow!("invalid group/kind: {} (expect Kind or group/Kind)", key)),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() { write!(f, "{}", self.kind) } else { write!(f, "{}/{}", self.group, self.kind) }
    }
}

/// Whether a resource is partitioned by namespace or is cluster-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Namespaced,
    Cluster,
}

impl Scope {
    pub fn from_namespaced(namespaced: bool) -> Self {
        if namespaced { Scope::Namespaced } else { Scope::Cluster }
    }

    pub fn is_namespaced(self) -> bool {
        matches!(self, Scope::Namespaced)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_namespaced() { "namespaced" } else { "cluster" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gvk_keys_round_trip_through_display() {
        let core = Gvk::parse_key("v1/ConfigMap").unwrap();
        assert_eq!(core, Gvk::new("", "v1", "ConfigMap"));
        assert_eq!(core.to_string(), "v1/ConfigMap");

        let apps = Gvk::parse_key("apps/v1/Deployment").unwrap();
        assert_eq!(apps.group, "apps");
        assert_eq!(apps.to_string(), "apps/v1/Deployment");
        assert_eq!(apps.api_version(), "apps/v1");

        assert!(Gvk::parse_key("Deployment").is_err());
        assert!(Gvk::parse_key("a/b/c/d").is_err());
        assert!(Gvk::parse_key("apps//Deployment").is_err());
    }

    #[test]
    fn gvr_keys_allow_partial_forms() {
        assert_eq!(Gvr::parse_key("pods").unwrap(), Gvr::resource_only("pods"));
        assert_eq!(Gvr::parse_key("v1/pods").unwrap(), Gvr::new("", "v1", "pods"));
        assert_eq!(Gvr::parse_key("apps/v1/deployments").unwrap().to_string(), "apps/v1/deployments");
        assert!(Gvr::parse_key("").is_err());
    }

    #[test]
    fn api_version_splits_group() {
        assert_eq!(Gvk::from_api_version("v1", "Pod"), Gvk::new("", "v1", "Pod"));
        assert_eq!(Gvk::from_api_version("cert-manager.io/v1", "Certificate").group, "cert-manager.io");
    }

    #[test]
    fn list_item_strips_literal_suffix_only() {
        let list = Gvk::new("example.com", "v1", "WidgetList");
        assert_eq!(list.list_item(), Some(Gvk::new("example.com", "v1", "Widget")));
        assert_eq!(Gvk::new("", "v1", "Pod").list_item(), None);
        // "Playlist" has no capital L; the convention is case-sensitive.
        assert_eq!(Gvk::new("", "v1", "Playlist").list_item(), None);
    }

    #[test]
    fn bare_list_kind_has_no_item() {
        assert_eq!(Gvk::new("", "v1", "List").list_item(), None);
    }

    #[test]
    fn group_kind_parse() {
        assert_eq!(GroupKind::parse_key("ConfigMap").unwrap(), GroupKind::new("", "ConfigMap"));
        assert_eq!(GroupKind::parse_key("apps/Deployment").unwrap(), GroupKind::new("apps", "Deployment"));
        assert!(GroupKind::parse_key("apps/v1/Deployment").is_err());
    }
}
