//! `consumption-apis`: start the gateway worker.
//!
//! `--worker-count` sizes how many `tokio` worker threads the runtime
//! actually runs on (`main.rs` calls [`resolve_worker_count`] before
//! building the runtime and passes it to `Builder::worker_threads`) — the
//! gateway itself still binds a single `TcpListener`; concurrency comes
//! from the multi-threaded runtime, not from multiple listeners, since a
//! faithful fork-per-worker model isn't portable in safe Rust (see
//! `DESIGN.md`).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Args;
use moose_core::config::{AuthConfig, ClickhouseConfig, ConfigRegistry};
use moose_core::registry::ResourceRegistry;
use moose_core::OlapClient;
use moose_gateway::auth::JwtVerifier;
use moose_gateway::{gateway_router, GatewayState, HandlerMap};

use super::CommandResult;

#[derive(Args, Debug)]
pub struct ConsumptionApisArgs {
    pub db: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,

    #[arg(long)]
    pub clickhouse_use_ssl: bool,
    #[arg(long)]
    pub jwt_secret: Option<String>,
    #[arg(long)]
    pub jwt_issuer: Option<String>,
    #[arg(long)]
    pub jwt_audience: Option<String>,
    #[arg(long)]
    pub enforce_auth: bool,
    #[arg(long)]
    pub temporal_url: Option<String>,
    #[arg(long)]
    pub temporal_namespace: Option<String>,
    #[arg(long)]
    pub client_cert: Option<String>,
    #[arg(long)]
    pub client_key: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long, default_value_t = 4001)]
    pub proxy_port: u16,
    #[arg(long)]
    pub worker_count: Option<usize>,
}

pub fn build_registry(args: &ConsumptionApisArgs) -> ConfigRegistry {
    let clickhouse = ClickhouseConfig {
        host: args.host.clone(),
        host_port: args.port,
        user: args.user.clone(),
        password: args.pass.clone(),
        db_name: args.db.clone(),
        use_ssl: args.clickhouse_use_ssl,
    };
    let auth = AuthConfig {
        jwt_public_key_pem: args.jwt_secret.clone(),
        jwt_issuer: args.jwt_issuer.clone(),
        jwt_audience: args.jwt_audience.clone(),
        enforce_auth: args.enforce_auth,
        temporal_url: args.temporal_url.clone(),
        temporal_namespace: args.temporal_namespace.clone(),
        client_cert_path: args.client_cert.clone(),
        client_key_path: args.client_key.clone(),
        api_key: args.api_key.clone(),
    };
    ConfigRegistry::from_parts(clickhouse, Default::default(), auth)
}

/// Resolve `--worker-count`, falling back to the CPU-ratio sizing formula.
/// Called both to size the `tokio` runtime before it starts (`main.rs`) and
/// for the log line emitted once the gateway is up.
pub fn resolve_worker_count(args: &ConsumptionApisArgs) -> usize {
    args.worker_count
        .unwrap_or_else(|| moose_supervisor::worker_count(num_cpus::get(), moose_supervisor::DEFAULT_GATEWAY_CPU_RATIO, None))
}

pub async fn run(args: ConsumptionApisArgs) -> CommandResult {
    let registry = build_registry(&args);
    let worker_count = resolve_worker_count(&args);
    tracing::info!(worker_count, proxy_port = args.proxy_port, "starting consumption API gateway");

    let olap = Arc::new(OlapClient::new(&registry.clickhouse).map_err(|e| e.to_string())?);
    let verifier = Arc::new(JwtVerifier::from_config(&registry.auth).map_err(|e| e.to_string())?);
    let state = GatewayState {
        registry: Arc::new(ResourceRegistry::new()),
        olap,
        handlers: Arc::new(HandlerMap::new(HashMap::new())),
        byof: None,
    };

    let router = gateway_router(state, verifier);
    let addr = SocketAddr::from(([127, 0, 0, 1], args.proxy_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    axum::serve(listener, router)
        .await
        .map_err(|e| format!("gateway server error: {e}"))
}
