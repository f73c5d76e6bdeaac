//! `consumption-type-serializer <target>`: print one API's input/response
//! schema pair from the declarative manifest.

use std::path::PathBuf;

use serde_json::Value;

use super::CommandResult;

fn manifest_path() -> PathBuf {
    let source_dir = std::env::var("MOOSE_SOURCE_DIR").unwrap_or_else(|_| "app".to_string());
    PathBuf::from(source_dir).join("registry-manifest.json")
}

pub fn run(target: &str) -> CommandResult {
    let path = manifest_path();
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read manifest {}: {e}", path.display()))?;
    let manifest: Value =
        serde_json::from_str(&raw).map_err(|e| format!("manifest {} is not valid JSON: {e}", path.display()))?;

    let apis = manifest
        .get("apis")
        .and_then(Value::as_array)
        .ok_or_else(|| "manifest has no \"apis\" array".to_string())?;

    let entry = apis
        .iter()
        .find(|api| api.get("name").and_then(Value::as_str) == Some(target))
        .ok_or_else(|| format!("no API named {target:?} in manifest"))?;

    let pair = serde_json::json!({
        "input_schema": entry.get("input_schema").cloned().unwrap_or(Value::Null),
        "response_schema": entry.get("response_schema").cloned().unwrap_or(Value::Null),
    });
    println!("{}", serde_json::to_string_pretty(&pair).expect("Value always serializes"));
    Ok(())
}
