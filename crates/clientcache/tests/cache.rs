#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use orka_clientcache::{CacheError, ObjectMeta, TransportFactory, TypeResourceCache, TypedObject};
use orka_core::{DiscoveredResource, Gvk, Gvr, MapError};
use orka_restmap::{DynamicTypeMapper, FnSource, MapperOptions, RateGate};

#[derive(Debug)]
struct TestTransport {
    gvk: Gvk,
    cluster: String,
}

#[derive(Default)]
struct CountingFactory {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl CountingFactory {
    fn slow(delay: Duration) -> Self {
        Self { delay, ..Default::default() }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TransportFactory for CountingFactory {
    type Config = String;
    type Transport = TestTransport;

    async fn transport_for(&self, gvk: &Gvk, config: &String) -> Result<TestTransport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("credentials rejected"));
        }
        Ok(TestTransport { gvk: gvk.clone(), cluster: config.clone() })
    }
}

struct Value {
    gvk: Option<Gvk>,
    list: bool,
    meta: Option<ObjectMeta>,
}

impl Value {
    fn object(gvk: Gvk, namespace: Option<&str>, name: &str) -> Self {
        let meta = ObjectMeta {
            name: Some(name.into()),
            namespace: namespace.map(Into::into),
            labels: Some(BTreeMap::from([("app".to_string(), "demo".to_string())])),
            ..Default::default()
        };
        Self { gvk: Some(gvk), list: false, meta: Some(meta) }
    }

    fn list(gvk: Gvk) -> Self {
        Self { gvk: Some(gvk), list: true, meta: None }
    }
}

impl TypedObject for Value {
    fn gvk(&self) -> Option<Gvk> {
        self.gvk.clone()
    }

    fn is_list(&self) -> bool {
        self.list
    }

    fn object_meta(&self) -> Option<&ObjectMeta> {
        self.meta.as_ref()
    }
}

fn widget() -> Gvk {
    Gvk::new("example.com", "v1", "Widget")
}

fn directory() -> Vec<DiscoveredResource> {
    let res = |group: &str, kind: &str, plural: &str, namespaced| DiscoveredResource {
        group: group.into(),
        version: "v1".into(),
        kind: kind.into(),
        plural: plural.into(),
        singular: None,
        namespaced,
    };
    vec![res("example.com", "Widget", "widgets", true), res("", "Node", "nodes", false)]
}

async fn cache_with(
    factory: Arc<CountingFactory>,
    gate: RateGate,
) -> (TypeResourceCache<Arc<CountingFactory>>, Arc<AtomicUsize>) {
    cache_with_uninstall(factory, gate, Arc::new(AtomicBool::new(false))).await
}

/// Cache whose directory drops `Widget` once `uninstalled` is set.
async fn cache_with_uninstall(
    factory: Arc<CountingFactory>,
    gate: RateGate,
    uninstalled: Arc<AtomicBool>,
) -> (TypeResourceCache<Arc<CountingFactory>>, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();
    let source = FnSource(move || -> Result<Vec<DiscoveredResource>> {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut dir = directory();
        if uninstalled.load(Ordering::SeqCst) {
            dir.retain(|r| r.kind != "Widget");
        }
        Ok(dir)
    });
    let mapper = DynamicTypeMapper::new(source, MapperOptions::default().with_gate(gate)).await.unwrap();
    (TypeResourceCache::new("cluster-a".to_string(), factory, Arc::new(mapper)), fetches)
}

async fn cache(factory: Arc<CountingFactory>) -> TypeResourceCache<Arc<CountingFactory>> {
    cache_with(factory, RateGate::default()).await.0
}

#[tokio::test]
async fn hits_reuse_the_handle_without_building() {
    let factory = Arc::new(CountingFactory::default());
    let (cache, fetches) = cache_with(factory.clone(), RateGate::default()).await;
    let obj = Value::object(widget(), Some("default"), "w1");

    let first = cache.get(&obj).await.unwrap();
    let second = cache.get(&obj).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.calls(), 1);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    assert_eq!(first.resource(), "widgets");
    assert!(first.is_namespaced());
    assert_eq!(first.transport().gvk, widget());
    assert_eq!(first.transport().cluster, "cluster-a");
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn hits_do_not_consult_the_mapper() {
    let factory = Arc::new(CountingFactory::default());
    let uninstalled = Arc::new(AtomicBool::new(false));
    let (cache, fetches) = cache_with_uninstall(factory.clone(), RateGate::new(1, 0.001), uninstalled.clone()).await;
    let obj = Value::object(widget(), Some("default"), "w1");
    let first = cache.get(&obj).await.unwrap();

    // Rebuild without Widget, spending the only refresh token.
    uninstalled.store(true, Ordering::SeqCst);
    assert!(cache.mapper().kind_for(&Gvr::resource_only("gadgets")).await.unwrap_err().is_not_found());
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    let err = cache.mapper().rest_mapping(&widget().group_kind(), &["v1"]).await.unwrap_err();
    assert!(err.rate_limit_delay().is_some(), "got {err:?}");

    let second = cache.get(&obj).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.calls(), 1);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn incomplete_type_identifiers_are_rejected() {
    let factory = Arc::new(CountingFactory::default());
    let (cache, fetches) = cache_with(factory.clone(), RateGate::default()).await;

    let versionless = Gvk::new("example.com", "", "Widget");
    assert!(matches!(cache.resolve(&versionless).await, Err(CacheError::MissingTypeInfo)));
    let obj = Value::object(versionless, None, "w1");
    assert!(matches!(cache.get(&obj).await, Err(CacheError::MissingTypeInfo)));
    assert!(matches!(cache.get(&Value::list(Gvk::new("", "v1", "List"))).await, Err(CacheError::MissingTypeInfo)));
    assert_eq!(factory.calls(), 0);
    assert!(cache.is_empty());
    assert_eq!(fetches.load(Ordering::SeqCst), 1, "rejected without a rebuild");
}

#[tokio::test]
async fn handle_type_matches_its_mapping() {
    let cache = cache(Arc::new(CountingFactory::default())).await;
    let values = [
        Value::object(widget(), Some("default"), "w1"),
        Value::list(Gvk::new("example.com", "v1", "WidgetList")),
        Value::object(Gvk::new("", "v1", "Node"), None, "n1"),
    ];
    for v in &values {
        let h = cache.get(v).await.unwrap();
        assert_eq!(h.gvk(), &h.mapping().gvk);
        assert_eq!(h.gvr(), &h.mapping().resource);
        assert_eq!(h.transport().gvk, h.mapping().gvk);
    }
}

#[tokio::test]
async fn list_values_share_the_item_handle() {
    let factory = Arc::new(CountingFactory::default());
    let cache = cache(factory.clone()).await;

    let list = cache.get(&Value::list(Gvk::new("example.com", "v1", "WidgetList"))).await.unwrap();
    let item = cache.get(&Value::object(widget(), Some("default"), "w1")).await.unwrap();
    assert!(Arc::ptr_eq(&list, &item));
    assert_eq!(list.gvk(), &widget());
    assert_eq!(factory.calls(), 1);
}

#[tokio::test]
async fn list_suffix_is_ignored_for_non_list_values() {
    let factory = Arc::new(CountingFactory::default());
    let cache = cache(factory.clone()).await;
    let obj = Value::object(Gvk::new("example.com", "v1", "WidgetList"), None, "odd");

    let err = cache.get(&obj).await.unwrap_err();
    assert!(matches!(err, CacheError::Mapping(MapError::NoKindMatch { .. })), "got {err:?}");
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn transport_failures_are_not_cached() {
    let factory = Arc::new(CountingFactory::default());
    let cache = cache(factory.clone()).await;
    let obj = Value::object(widget(), Some("default"), "w1");

    factory.fail.store(true, Ordering::SeqCst);
    let err = cache.get(&obj).await.unwrap_err();
    assert!(matches!(err, CacheError::Transport(_)), "got {err:?}");
    assert_eq!(err.to_string(), "credentials rejected");
    assert!(cache.is_empty());

    factory.fail.store(false, Ordering::SeqCst);
    assert!(cache.get(&obj).await.is_ok());
    assert_eq!(factory.calls(), 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn unknown_types_fail_before_the_factory_runs() {
    let factory = Arc::new(CountingFactory::default());
    let cache = cache(factory.clone()).await;
    let obj = Value::object(Gvk::new("example.com", "v1", "Gadget"), None, "g");

    let err = cache.get(&obj).await.unwrap_err();
    match err {
        CacheError::Mapping(MapError::NoKindMatch { group_kind, versions }) => {
            assert_eq!(group_kind.kind, "Gadget");
            assert_eq!(versions, vec!["v1".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(factory.calls(), 0);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn rate_limited_mapping_surfaces_the_delay() {
    let factory = Arc::new(CountingFactory::default());
    let (cache, fetches) = cache_with(factory, RateGate::new(0, 0.001)).await;
    let obj = Value::object(Gvk::new("example.com", "v1", "Gadget"), None, "g");

    let err = cache.get(&obj).await.unwrap_err();
    assert!(err.rate_limit_delay().is_some_and(|d| d > Duration::ZERO), "got {err:?}");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn untyped_values_are_rejected() {
    let cache = cache(Arc::new(CountingFactory::default())).await;
    let obj = Value { gvk: None, list: false, meta: None };
    assert!(matches!(cache.get(&obj).await, Err(CacheError::MissingTypeInfo)));
}

#[tokio::test]
async fn object_handles_expose_instance_metadata() {
    let cache = cache(Arc::new(CountingFactory::default())).await;

    let obj = Value::object(widget(), Some("team-a"), "w1");
    let handle = cache.object(&obj).await.unwrap();
    assert_eq!(handle.name(), Some("w1"));
    assert_eq!(handle.namespace(), Some("team-a"));
    assert_eq!(handle.request_namespace(), Some("team-a"));
    assert_eq!(handle.labels().and_then(|l| l.get("app")).map(String::as_str), Some("demo"));
    assert_eq!(handle.resource(), "widgets");
    assert_eq!(handle.transport().cluster, "cluster-a");

    let node = Value::object(Gvk::new("", "v1", "Node"), Some("ignored"), "n1");
    let handle = cache.object(&node).await.unwrap();
    assert!(!handle.is_namespaced());
    assert_eq!(handle.request_namespace(), None);
    assert_eq!(handle.gvk().kind, "Node");
}

#[tokio::test]
async fn object_handles_require_metadata() {
    let factory = Arc::new(CountingFactory::default());
    let cache = cache(factory.clone()).await;
    let list = Value::list(Gvk::new("example.com", "v1", "WidgetList"));

    match cache.object(&list).await {
        Err(CacheError::MissingObjectMeta { gvk }) => assert_eq!(gvk, widget()),
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("lists carry no object metadata"),
    }
    // The resource handle itself was still resolved and cached.
    assert_eq!(cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_settle_on_one_handle() {
    let factory = Arc::new(CountingFactory::slow(Duration::from_millis(30)));
    let cache = Arc::new(cache(factory.clone()).await);

    let tasks = (0..8).map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move { cache.resolve(&widget()).await.map(|h| h.resource().to_string()) })
    });
    for r in futures::future::join_all(tasks).await {
        assert_eq!(r.unwrap().unwrap(), "widgets");
    }
    let built = factory.calls();
    assert!((1..=8).contains(&built), "built {built} times");
    assert_eq!(cache.len(), 1);

    let a = cache.resolve(&widget()).await.unwrap();
    let b = cache.resolve(&widget()).await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(factory.calls(), built);
}
