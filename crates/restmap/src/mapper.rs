//! Dynamic REST mapper: answers GVK/GVR queries from a directory snapshot and
//! rebuilds the snapshot on demand when a lookup misses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use orka_core::{GroupKind, Gvk, Gvr, MapError, MapResult, RestMapping};
use parking_lot::Mutex;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::gate::RateGate;
use crate::snapshot::DirectorySnapshot;
use crate::source::DirectorySource;

/// Construction options for [`DynamicTypeMapper`].
#[derive(Debug, Default)]
pub struct MapperOptions {
    /// Defer the first directory fetch until the first query.
    pub lazy: bool,
    pub gate: RateGate,
}

impl MapperOptions {
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn with_gate(mut self, gate: RateGate) -> Self {
        self.gate = gate;
        self
    }
}

type InitOutcome = Option<MapResult<()>>;

enum InitState {
    Uninitialized,
    /// Carries the channel the running initializer will publish its outcome on.
    Initializing(watch::Receiver<InitOutcome>),
    Ready,
}

enum InitStep {
    Run(watch::Sender<InitOutcome>),
    Wait(watch::Receiver<InitOutcome>),
}

/// An in-flight lazy initialization. Dropping it without `finish` (the
/// initializing future was cancelled) resets the state so waiters retry.
struct InitAttempt<'a> {
    init: &'a Mutex<InitState>,
    tx: Option<watch::Sender<InitOutcome>>,
}

impl InitAttempt<'_> {
    fn finish(mut self, outcome: MapResult<()>) -> MapResult<()> {
        *self.init.lock() = if outcome.is_ok() { InitState::Ready } else { InitState::Uninitialized };
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(outcome.clone()));
        }
        outcome
    }
}

impl Drop for InitAttempt<'_> {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            *self.init.lock() = InitState::Uninitialized;
        }
    }
}

/// REST mapper over a directory that may change while the process runs.
///
/// Every lookup first runs against the current snapshot under a shared lock.
/// A "not found" result takes the exclusive lock, re-checks (another caller
/// may have refreshed meanwhile), and only then spends a [`RateGate`] token on
/// a full rebuild before checking a final time. The exclusive lock is held
/// across the fetch, so concurrent misses collapse into one rebuild: a caller
/// whose lookup began before a rebuild completed accepts that rebuild's answer
/// instead of starting another one.
pub struct DynamicTypeMapper {
    source: Box<dyn DirectorySource>,
    gate: RateGate,
    snapshot: RwLock<Arc<DirectorySnapshot>>,
    /// Bumped on every snapshot replacement, always under the write lock.
    generation: AtomicU64,
    init: Mutex<InitState>,
}

impl DynamicTypeMapper {
    /// Build a mapper. In eager mode the directory is fetched here and a fetch
    /// failure fails construction.
    pub async fn new<S>(source: S, opts: MapperOptions) -> MapResult<Self>
    where
        S: DirectorySource + 'static,
    {
        let mut mapper = Self {
            source: Box::new(source),
            gate: opts.gate,
            snapshot: RwLock::new(Arc::new(DirectorySnapshot::empty())),
            generation: AtomicU64::new(0),
            init: Mutex::new(InitState::Uninitialized),
        };
        if !opts.lazy {
            let snap = mapper.load().await?;
            info!(entries = snap.len(), "restmap: eager init done");
            *mapper.snapshot.get_mut() = Arc::new(snap);
            *mapper.generation.get_mut() += 1;
            *mapper.init.get_mut() = InitState::Ready;
        }
        Ok(mapper)
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.init.lock(), InitState::Ready)
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// Current snapshot, for listing. Does not trigger a refresh.
    pub async fn snapshot(&self) -> MapResult<Arc<DirectorySnapshot>> {
        self.ensure_ready().await?;
        Ok(self.snapshot.read().await.clone())
    }

    pub async fn kind_for(&self, resource: &Gvr) -> MapResult<Gvk> {
        self.check_and_reload("kind_for", |s| s.kind_for(resource)).await
    }

    pub async fn kinds_for(&self, resource: &Gvr) -> MapResult<Vec<Gvk>> {
        self.check_and_reload("kinds_for", |s| s.kinds_for(resource)).await
    }

    pub async fn resource_for(&self, resource: &Gvr) -> MapResult<Gvr> {
        self.check_and_reload("resource_for", |s| s.resource_for(resource)).await
    }

    pub async fn resources_for(&self, resource: &Gvr) -> MapResult<Vec<Gvr>> {
        self.check_and_reload("resources_for", |s| s.resources_for(resource)).await
    }

    pub async fn resource_for_kind(&self, gvk: &Gvk) -> MapResult<Gvr> {
        self.check_and_reload("resource_for_kind", |s| s.resource_for_kind(gvk)).await
    }

    pub async fn resources_for_kind(&self, gk: &GroupKind) -> MapResult<Vec<Gvr>> {
        self.check_and_reload("resources_for_kind", |s| s.resources_for_kind(gk)).await
    }

    pub async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> MapResult<RestMapping> {
        self.check_and_reload("rest_mapping", |s| s.rest_mapping(gk, versions)).await
    }

    pub async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> MapResult<Vec<RestMapping>> {
        self.check_and_reload("rest_mappings", |s| s.rest_mappings(gk, versions)).await
    }

    pub async fn resource_singularizer(&self, resource: &str) -> MapResult<String> {
        self.check_and_reload("resource_singularizer", |s| s.resource_singularizer(resource)).await
    }

    async fn check_and_reload<T, F>(&self, op: &'static str, query: F) -> MapResult<T>
    where
        F: Fn(&DirectorySnapshot) -> MapResult<T>,
    {
        self.ensure_ready().await?;

        let seen = self.generation.load(Ordering::Acquire);

        {
            let snap = self.snapshot.read().await;
            match query(&snap) {
                Err(e) if e.is_not_found() => {}
                other => return other,
            }
        }

        let mut snap = self.snapshot.write().await;
        match query(&snap) {
            Err(e) if e.is_not_found() => {
                if self.generation.load(Ordering::Acquire) != seen {
                    // Rebuilt by someone else after our miss; the miss stands.
                    debug!(op, "restmap: still missing after concurrent refresh");
                    return Err(e);
                }
            }
            other => {
                debug!(op, "restmap: resolved after concurrent refresh");
                return other;
            }
        }

        if let Err(delay) = self.gate.try_admit() {
            counter!("orka_restmap_rate_limited_total", 1);
            debug!(op, delay_ms = %delay.as_millis(), "restmap: refresh rate limited");
            return Err(MapError::RateLimited { delay });
        }

        counter!("orka_restmap_refresh_total", 1);
        let fresh = self.load().await?;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(op, entries = fresh.len(), generation, "restmap: directory refreshed");
        *snap = Arc::new(fresh);
        query(&snap)
    }

    async fn ensure_ready(&self) -> MapResult<()> {
        loop {
            let step = {
                let mut state = self.init.lock();
                match &*state {
                    InitState::Ready => return Ok(()),
                    InitState::Initializing(rx) => InitStep::Wait(rx.clone()),
                    InitState::Uninitialized => {
                        let (tx, rx) = watch::channel(None);
                        *state = InitState::Initializing(rx);
                        InitStep::Run(tx)
                    }
                }
            };
            match step {
                InitStep::Run(tx) => {
                    let attempt = InitAttempt { init: &self.init, tx: Some(tx) };
                    return self.initialize(attempt).await;
                }
                InitStep::Wait(mut rx) => {
                    let outcome = match rx.wait_for(Option::is_some).await {
                        Ok(v) => (*v).clone(),
                        Err(_) => None,
                    };
                    if let Some(res) = outcome {
                        return res;
                    }
                    debug!("restmap: lazy init abandoned; retrying");
                }
            }
        }
    }

    async fn initialize(&self, attempt: InitAttempt<'_>) -> MapResult<()> {
        debug!("restmap: lazy init start");
        let outcome = match self.load().await {
            Ok(snap) => {
                info!(entries = snap.len(), "restmap: lazy init done");
                let mut current = self.snapshot.write().await;
                *current = Arc::new(snap);
                self.generation.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(e) => Err(e),
        };
        attempt.finish(outcome)
    }

    async fn load(&self) -> MapResult<DirectorySnapshot> {
        let t0 = Instant::now();
        match self.source.fetch().await {
            Ok(resources) => {
                let snap = DirectorySnapshot::from_resources(resources);
                histogram!("orka_restmap_fetch_ms", t0.elapsed().as_secs_f64() * 1000.0);
                debug!(entries = snap.len(), took_ms = %t0.elapsed().as_millis(), "restmap: directory fetched");
                Ok(snap)
            }
            Err(e) => {
                counter!("orka_restmap_refresh_failed_total", 1);
                warn!(error = %e, took_ms = %t0.elapsed().as_millis(), "restmap: directory fetch failed");
                Err(MapError::source_error(e))
            }
        }
    }
}
