use std::time::Instant;

use anyhow::Result;
use kube::{
    discovery::{Discovery, Scope},
    Client,
};
use metrics::histogram;
use orka_core::DiscoveredResource;
use orka_restmap::DirectorySource;
use tracing::info;

/// Directory source backed by the API server's discovery endpoints.
///
/// Groups are listed alphabetically (kube-rs does not keep the server's group
/// order); versions within a group follow kube-rs preference order, stable
/// before beta before alpha.
#[derive(Clone)]
pub struct KubeDirectory {
    client: Client,
}

impl KubeDirectory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn try_default() -> Result<Self> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait::async_trait]
impl DirectorySource for KubeDirectory {
    async fn fetch(&self) -> Result<Vec<DiscoveredResource>> {
        let t0 = Instant::now();
        let discovery = Discovery::new(self.client.clone()).run().await?;
        let mut out = Vec::new();
        for group in discovery.groups_alphabetical() {
            for version in group.versions() {
                for (ar, caps) in group.versioned_resources(version) {
                    out.push(DiscoveredResource {
                        group: ar.group,
                        version: ar.version,
                        kind: ar.kind,
                        plural: ar.plural,
                        singular: None,
                        namespaced: matches!(caps.scope, Scope::Namespaced),
                    });
                }
            }
        }
        histogram!("orka_kubehub_discovery_ms", t0.elapsed().as_secs_f64() * 1000.0);
        info!(count = out.len(), took_ms = %t0.elapsed().as_millis(), "kubehub: discovery ok");
        Ok(out)
    }
}
