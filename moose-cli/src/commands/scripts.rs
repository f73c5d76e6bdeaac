//! `scripts`: start the workflow activity worker.
//!
//! Activity RPC against an orchestrator (Temporal) is out of scope (see
//! `DESIGN.md`); this starts the management channel the outer process
//! polls and serves an empty [`moose_workflow::WorkflowRegistry`] — ready
//! for `register`/`execute_task` to be wired in once a workflow source is
//! actually loaded.

use clap::Args;
use moose_core::config::ConfigRegistry;
use moose_workflow::WorkflowRegistry;

use super::CommandResult;

#[derive(Args, Debug)]
pub struct ScriptsArgs {
    #[arg(long)]
    pub temporal_url: Option<String>,
    #[arg(long)]
    pub temporal_namespace: Option<String>,
}

pub async fn run(args: ScriptsArgs) -> CommandResult {
    let config = ConfigRegistry::get_or_init();
    let _registry = WorkflowRegistry::new();

    tracing::info!(
        temporal_url = args.temporal_url.as_deref().unwrap_or("unset"),
        temporal_namespace = args.temporal_namespace.as_deref().unwrap_or("unset"),
        management_port = config.management_port,
        "starting workflow activity worker"
    );

    let router = moose_core::management::management_router();
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.management_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind management channel on {addr}: {e}"))?;

    tokio::select! {
        result = axum::serve(listener, router) => {
            result.map_err(|e| format!("management server error: {e}"))
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    }
}
