//! `dmv2-serializer`: dump the declarative resource manifest as JSON to
//! stdout. Handler *code* loading is out of scope (see `DESIGN.md`), so
//! this reads the AOT-built manifest the outer orchestrator already
//! produced rather than a live in-process registry.

use std::path::PathBuf;

use super::CommandResult;

pub fn run(manifest_path: Option<PathBuf>) -> CommandResult {
    let path = manifest_path.unwrap_or_else(default_manifest_path);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read manifest {}: {e}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| format!("manifest {} is not valid JSON: {e}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&value).expect("Value always serializes"));
    Ok(())
}

fn default_manifest_path() -> PathBuf {
    let source_dir = std::env::var("MOOSE_SOURCE_DIR").unwrap_or_else(|_| "app".to_string());
    PathBuf::from(source_dir).join("registry-manifest.json")
}
