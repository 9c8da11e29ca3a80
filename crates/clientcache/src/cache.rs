use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use orka_core::Gvk;
use orka_restmap::DynamicTypeMapper;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};
use crate::handle::{ObjectHandle, ResourceHandle};
use crate::object::TypedObject;
use crate::transport::TransportFactory;

type Handle<F> = Arc<ResourceHandle<<F as TransportFactory>::Transport>>;

/// Lazily built, per-type resource handles.
///
/// Entries are keyed by the item type, so a list value and its item type
/// share one handle. Entries are never evicted.
pub struct TypeResourceCache<F: TransportFactory> {
    config: F::Config,
    factory: F,
    mapper: Arc<DynamicTypeMapper>,
    by_type: RwLock<FxHashMap<Gvk, Handle<F>>>,
}

impl<F: TransportFactory> TypeResourceCache<F> {
    pub fn new(config: F::Config, factory: F, mapper: Arc<DynamicTypeMapper>) -> Self {
        Self { config, factory, mapper, by_type: RwLock::new(FxHashMap::default()) }
    }

    pub fn mapper(&self) -> &Arc<DynamicTypeMapper> {
        &self.mapper
    }

    pub fn config(&self) -> &F::Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.by_type.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.read().is_empty()
    }

    /// Resource handle for the value's type, building it on first use.
    pub async fn get<O: TypedObject + Sync + ?Sized>(&self, obj: &O) -> CacheResult<Handle<F>> {
        let gvk = item_gvk(obj)?;
        self.resolve(&gvk).await
    }

    /// Resource handle bound to the value's own metadata.
    pub async fn object<'o, O: TypedObject + Sync + ?Sized>(
        &self,
        obj: &'o O,
    ) -> CacheResult<ObjectHandle<'o, F::Transport>> {
        let resource = self.get(obj).await?;
        let meta = obj
            .object_meta()
            .ok_or_else(|| CacheError::MissingObjectMeta { gvk: resource.gvk().clone() })?;
        Ok(ObjectHandle::new(resource, meta))
    }

    /// Resource handle for an already-known item type. The version and kind
    /// must be set; the handle's type always equals its mapping's type.
    pub async fn resolve(&self, gvk: &Gvk) -> CacheResult<Handle<F>> {
        if gvk.version.is_empty() || gvk.kind.is_empty() {
            return Err(CacheError::MissingTypeInfo);
        }
        let hit = self.by_type.read().get(gvk).cloned();
        if let Some(handle) = hit {
            counter!("orka_clientcache_hit_total", 1);
            return Ok(handle);
        }
        counter!("orka_clientcache_miss_total", 1);
        let t0 = Instant::now();
        debug!(gvk = %gvk, "clientcache: miss");

        // Built outside the lock. Racing builders for one type each insert;
        // the last insert stays cached and every returned handle is valid.
        let mapping = self.mapper.rest_mapping(&gvk.group_kind(), &[gvk.version.as_str()]).await?;
        let transport = self.factory.transport_for(gvk, &self.config).await.map_err(CacheError::Transport)?;
        let handle = Arc::new(ResourceHandle::new(gvk.clone(), transport, mapping));
        self.by_type.write().insert(gvk.clone(), handle.clone());
        histogram!("orka_clientcache_build_ms", t0.elapsed().as_secs_f64() * 1000.0);
        info!(gvk = %gvk, resource = %handle.gvr(), namespaced = handle.is_namespaced(), took_ms = %t0.elapsed().as_millis(), "clientcache: built handle");
        Ok(handle)
    }
}

fn item_gvk<O: TypedObject + ?Sized>(obj: &O) -> CacheResult<Gvk> {
    let gvk = obj.gvk().ok_or(CacheError::MissingTypeInfo)?;
    if obj.is_list() {
        if let Some(item) = gvk.list_item() {
            return Ok(item);
        }
        // A generic `List` names no item type.
        if gvk.kind == "List" {
            return Err(CacheError::MissingTypeInfo);
        }
    }
    Ok(gvk)
}
