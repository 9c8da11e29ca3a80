//! Immutable point-in-time view of the type/resource directory.

use orka_core::{DiscoveredResource, GroupKind, Gvk, Gvr, MapError, MapResult, RestMapping, Scope};
use rustc_hash::FxHashMap;

/// One row of the directory: a type, the collection serving it and its names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub mapping: RestMapping,
    pub singular: String,
}

impl MappingEntry {
    fn matches(&self, input: &Gvr) -> bool {
        let gvr = &self.mapping.resource;
        (input.group.is_empty() || input.group == gvr.group)
            && (input.version.is_empty() || input.version == gvr.version)
            && (input.resource.eq_ignore_ascii_case(&gvr.resource) || input.resource.eq_ignore_ascii_case(&self.singular))
    }
}

/// Bidirectional GVK <-> GVR map built wholesale from one directory fetch.
///
/// Entries keep the order the directory source reported them in, which is
/// the server's priority order; multi-result lookups return in that order and
/// single-result lookups return the first match.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    entries: Vec<MappingEntry>,
    by_kind: FxHashMap<Gvk, usize>,
    /// Versions per group in first-seen (preference) order.
    group_versions: FxHashMap<String, Vec<String>>,
}

impl DirectorySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_resources(resources: Vec<DiscoveredResource>) -> Self {
        let mut snap = Self::default();
        for r in resources {
            let gvk = r.gvk();
            if snap.by_kind.contains_key(&gvk) {
                // First occurrence has priority.
                continue;
            }
            let versions = snap.group_versions.entry(r.group.clone()).or_default();
            if !versions.iter().any(|v| v == &r.version) {
                versions.push(r.version.clone());
            }
            snap.by_kind.insert(gvk.clone(), snap.entries.len());
            snap.entries.push(MappingEntry {
                singular: r.singular_name(),
                mapping: RestMapping { gvk, resource: r.gvr(), scope: Scope::from_namespaced(r.namespaced) },
            });
        }
        snap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }

    /// Versions served for `group`, most preferred first.
    pub fn versions_for_group(&self, group: &str) -> &[String] {
        self.group_versions.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    fn matching(&self, input: &Gvr) -> MapResult<Vec<&MappingEntry>> {
        let found: Vec<_> = self.entries.iter().filter(|e| e.matches(input)).collect();
        if found.is_empty() {
            return Err(MapError::NoResourceMatch { resource: input.clone() });
        }
        Ok(found)
    }

    pub fn kinds_for(&self, input: &Gvr) -> MapResult<Vec<Gvk>> {
        let mut out: Vec<Gvk> = Vec::new();
        for e in self.matching(input)? {
            if !out.contains(&e.mapping.gvk) {
                out.push(e.mapping.gvk.clone());
            }
        }
        Ok(out)
    }

    pub fn kind_for(&self, input: &Gvr) -> MapResult<Gvk> {
        Ok(self.matching(input)?[0].mapping.gvk.clone())
    }

    pub fn resources_for(&self, input: &Gvr) -> MapResult<Vec<Gvr>> {
        let mut out: Vec<Gvr> = Vec::new();
        for e in self.matching(input)? {
            if !out.contains(&e.mapping.resource) {
                out.push(e.mapping.resource.clone());
            }
        }
        Ok(out)
    }

    pub fn resource_for(&self, input: &Gvr) -> MapResult<Gvr> {
        Ok(self.matching(input)?[0].mapping.resource.clone())
    }

    pub fn resource_for_kind(&self, gvk: &Gvk) -> MapResult<Gvr> {
        match self.by_kind.get(gvk) {
            Some(&i) => Ok(self.entries[i].mapping.resource.clone()),
            None => Err(MapError::NoKindMatch { group_kind: gvk.group_kind(), versions: vec![gvk.version.clone()] }),
        }
    }

    pub fn resources_for_kind(&self, gk: &GroupKind) -> MapResult<Vec<Gvr>> {
        Ok(self.rest_mappings(gk, &[])?.into_iter().map(|m| m.resource).collect())
    }

    /// Mappings for `gk`. Empty `versions` means every served version of the
    /// group in preference order. Otherwise the non-empty versions are tried in
    /// the order given and only the first served one is returned.
    pub fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> MapResult<Vec<RestMapping>> {
        let lookup = |v: &str| self.by_kind.get(&gk.with_version(v)).map(|&i| self.entries[i].mapping.clone());
        let mut requested = versions.iter().copied().filter(|v| !v.is_empty()).peekable();
        let out: Vec<RestMapping> = if requested.peek().is_none() {
            self.versions_for_group(&gk.group).iter().filter_map(|v| lookup(v)).collect()
        } else {
            requested.find_map(lookup).into_iter().collect()
        };
        if out.is_empty() {
            return Err(MapError::NoKindMatch {
                group_kind: gk.clone(),
                versions: versions.iter().map(|v| v.to_string()).collect(),
            });
        }
        Ok(out)
    }

    pub fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> MapResult<RestMapping> {
        let mut all = self.rest_mappings(gk, versions)?;
        Ok(all.swap_remove(0))
    }

    /// Singular name for a plural resource name; a singular name maps to itself.
    pub fn resource_singularizer(&self, resource: &str) -> MapResult<String> {
        if let Some(e) = self.entries.iter().find(|e| e.mapping.resource.resource.eq_ignore_ascii_case(resource)) {
            return Ok(e.singular.clone());
        }
        if let Some(e) = self.entries.iter().find(|e| e.singular.eq_ignore_ascii_case(resource)) {
            return Ok(e.singular.clone());
        }
        Err(MapError::NoResourceMatch { resource: Gvr::resource_only(resource) })
    }
}
