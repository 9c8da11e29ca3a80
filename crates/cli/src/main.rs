use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use kube::{
    api::ListParams,
    config::KubeConfigOptions,
    core::{DynamicObject, TypeMeta},
    Client, Config,
};
use orka_clientcache::{ObjectMeta, TypeResourceCache};
use orka_core::{GroupKind, Gvk, Gvr, RestMapping};
use orka_kubehub::{object_api, DynamicRef, KubeDirectory, KubeTransportFactory};
use orka_restmap::{DynamicTypeMapper, RestMapConfig};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "orkactl", version, about = "Orka CLI: dynamic REST mappings")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Kubeconfig context (default: current context)
    #[arg(long = "context", env = "ORKA_KUBE_CONTEXT", global = true)]
    context: Option<String>,

    /// Refresh tokens available at once (overrides ORKA_RESTMAP_BURST)
    #[arg(long = "burst", global = true)]
    burst: Option<u32>,

    /// Refresh token refill rate per second (overrides ORKA_RESTMAP_REFILL_PER_SEC)
    #[arg(long = "refill-per-sec", global = true)]
    refill_per_sec: Option<f64>,

    /// Defer discovery until the first lookup
    #[arg(long = "lazy", action = ArgAction::SetTrue, global = true)]
    lazy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every served resource in the current snapshot
    Resources,
    /// Kind(s) served by a resource, e.g. "deployments" or "apps/v1/deployments"
    Kind {
        gvr: String,
        /// Print every match in priority order
        #[arg(long = "all", action = ArgAction::SetTrue)]
        all: bool,
    },
    /// Resource serving a kind, e.g. "v1/ConfigMap" or "apps/v1/Deployment"
    Resource {
        gvk: String,
    },
    /// REST mapping for a group/kind, e.g. "apps/Deployment" or "Pod"
    Mapping {
        group_kind: String,
        /// Acceptable versions in preference order (default: server preference)
        #[arg(long = "version")]
        versions: Vec<String>,
        /// Print every match in priority order
        #[arg(long = "all", action = ArgAction::SetTrue)]
        all: bool,
    },
    /// Singular name for a resource
    Singular {
        resource: String,
    },
    /// Resolve a client handle for a GVK through the per-type cache
    Handle {
        gvk: String,
        /// Object name to bind the handle to
        #[arg(long = "name", default_value = "example")]
        name: String,
        /// Object namespace (ignored for cluster-scoped resources)
        #[arg(long = "ns")]
        namespace: Option<String>,
        /// List objects through the resolved handle
        #[arg(long = "list", action = ArgAction::SetTrue)]
        list: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("ORKA_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ORKA_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ORKA_METRICS_ADDR; expected host:port");
        }
    }
}

async fn kube_config(context: Option<String>) -> Result<Config> {
    let config = match context {
        Some(ctx) => Config::from_kubeconfig(&KubeConfigOptions { context: Some(ctx), ..Default::default() }).await?,
        None => Config::infer().await?,
    };
    Ok(config)
}

fn restmap_config(cli: &Cli) -> RestMapConfig {
    let mut cfg = RestMapConfig::from_env();
    if let Some(burst) = cli.burst {
        cfg.burst = burst;
    }
    if let Some(rate) = cli.refill_per_sec {
        cfg.refill_per_sec = rate;
    }
    cfg.lazy |= cli.lazy;
    cfg
}

fn scope_label(namespaced: bool) -> &'static str {
    if namespaced { "namespaced" } else { "cluster" }
}

fn print_mapping(m: &RestMapping) {
    println!("{} • {} • {}", m.gvk, m.resource, scope_label(m.is_namespaced()));
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let restmap = restmap_config(&cli);
    let config = kube_config(cli.context.clone()).await?;
    let client = Client::try_from(config.clone())?;
    let t0 = Instant::now();
    let mapper = Arc::new(DynamicTypeMapper::new(KubeDirectory::new(client), restmap.options()).await?);
    info!(burst = restmap.burst, refill_per_sec = restmap.refill_per_sec, lazy = restmap.lazy, took_ms = %t0.elapsed().as_millis(), "restmap ready");

    match cli.command {
        Commands::Resources => {
            let snap = mapper.snapshot().await?;
            match cli.output {
                Output::Human => {
                    for e in snap.entries() {
                        println!("{} • {} • {}", e.mapping.gvk, e.mapping.resource.resource, scope_label(e.mapping.is_namespaced()));
                    }
                }
                Output::Json => {
                    let rows: Vec<_> = snap
                        .entries()
                        .map(|e| json!({ "mapping": e.mapping, "singular": e.singular }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
        }
        Commands::Kind { gvr, all } => {
            let gvr = Gvr::parse_key(&gvr)?;
            let kinds = if all { mapper.kinds_for(&gvr).await? } else { vec![mapper.kind_for(&gvr).await?] };
            match cli.output {
                Output::Human => kinds.iter().for_each(|k| println!("{}", k)),
                Output::Json => println!("{}", serde_json::to_string_pretty(&kinds)?),
            }
        }
        Commands::Resource { gvk } => {
            let gvk = Gvk::parse_key(&gvk)?;
            let gvr = mapper.resource_for_kind(&gvk).await?;
            match cli.output {
                Output::Human => println!("{}", gvr),
                Output::Json => println!("{}", serde_json::to_string_pretty(&gvr)?),
            }
        }
        Commands::Mapping { group_kind, versions, all } => {
            let gk = GroupKind::parse_key(&group_kind)?;
            let versions: Vec<&str> = versions.iter().map(String::as_str).collect();
            let mappings = if all {
                mapper.rest_mappings(&gk, &versions).await?
            } else {
                vec![mapper.rest_mapping(&gk, &versions).await?]
            };
            match cli.output {
                Output::Human => mappings.iter().for_each(print_mapping),
                Output::Json => println!("{}", serde_json::to_string_pretty(&mappings)?),
            }
        }
        Commands::Singular { resource } => {
            let singular = mapper.resource_singularizer(&resource).await?;
            match cli.output {
                Output::Human => println!("{}", singular),
                Output::Json => println!("{}", json!({ "resource": resource, "singular": singular })),
            }
        }
        Commands::Handle { gvk, name, namespace, list } => {
            let gvk = Gvk::parse_key(&gvk)?;
            let cache = TypeResourceCache::new(config, KubeTransportFactory, mapper.clone());
            let obj = DynamicObject {
                types: Some(TypeMeta { api_version: gvk.api_version(), kind: gvk.kind.clone() }),
                metadata: ObjectMeta { name: Some(name), namespace, ..Default::default() },
                data: serde_json::Value::Object(Default::default()),
            };
            let typed = DynamicRef(&obj);
            let handle = cache.object(&typed).await?;
            let mapping = handle.resource_handle().mapping();
            match cli.output {
                Output::Human => {
                    print_mapping(mapping);
                    println!("object: {} (request namespace: {})", handle.name().unwrap_or("-"), handle.request_namespace().unwrap_or("-"));
                }
                Output::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "mapping": mapping,
                        "name": handle.name(),
                        "requestNamespace": handle.request_namespace(),
                    }))?
                ),
            }
            if list {
                let api = object_api(&handle);
                let t0 = Instant::now();
                let objs = api.list(&ListParams::default()).await.with_context(|| format!("listing {}", handle.resource()))?;
                info!(count = objs.items.len(), took_ms = %t0.elapsed().as_millis(), "list ok");
                for o in objs.items {
                    let ns = o.metadata.namespace.as_deref().unwrap_or("-");
                    println!("{} • {}", ns, o.metadata.name.as_deref().unwrap_or("-"));
                }
            }
        }
    }
    Ok(())
}
