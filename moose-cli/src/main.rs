mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{
    consumption_apis::ConsumptionApisArgs, dmv2_serializer, export_serializer,
    scripts::ScriptsArgs, streaming_functions::StreamingFunctionsArgs,
};

#[derive(Parser)]
#[command(name = "moose", version, about = "Moose runtime process entry points")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the declarative resource manifest as JSON
    DmvSerializer {
        /// Path to registry-manifest.json (defaults to $MOOSE_SOURCE_DIR/registry-manifest.json)
        manifest_path: Option<PathBuf>,
    },
    /// Print the public items one source file exports
    ExportSerializer {
        /// Source file to inspect
        target: PathBuf,
    },
    /// Print one API's input/response schema pair
    ConsumptionTypeSerializer {
        /// API name to look up in the manifest
        target: String,
    },
    /// Start the consumption API gateway
    ConsumptionApis(ConsumptionApisArgs),
    /// Start a streaming transform worker group
    StreamingFunctions(StreamingFunctionsArgs),
    /// Start the workflow activity worker
    Scripts(ScriptsArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::DmvSerializer { manifest_path } => dmv2_serializer::run(manifest_path),
        Commands::ExportSerializer { target } => export_serializer::run(&target),
        Commands::ConsumptionTypeSerializer { target } => commands::consumption_type_serializer::run(&target),
        Commands::ConsumptionApis(args) => {
            let worker_threads = commands::consumption_apis::resolve_worker_count(&args);
            run_async(Some(worker_threads), commands::consumption_apis::run(args))
        }
        Commands::StreamingFunctions(args) => run_async(None, commands::streaming_functions::run(args)),
        Commands::Scripts(args) => run_async(None, commands::scripts::run(args)),
    };

    if let Err(e) = result {
        eprintln!("{}", colored::Colorize::red(format!("Error: {e}").as_str()));
        std::process::exit(1);
    }
}

fn run_async(
    worker_threads: Option<usize>,
    fut: impl std::future::Future<Output = commands::CommandResult>,
) -> commands::CommandResult {
    tracing_subscriber::fmt::try_init().ok();
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(count) = worker_threads {
        builder.worker_threads(count.max(1));
    }
    builder
        .build()
        .expect("failed to build tokio runtime")
        .block_on(fut)
}
