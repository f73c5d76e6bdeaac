//! Static dependency/lineage analyzer.
//!
//! Runs once at registry-dump time against a user project's source tree,
//! producing per-entry-point `pullsDataFrom`/`pushesDataTo` edges against
//! tables, topics, views, and SQL resources. Does not run at request-serving
//! time — see `moose_lineage::analyze_project`.

mod resolve;
mod walker;

use std::path::{Path, PathBuf};

pub use resolve::{resolve, Resolution, VersionCatalog};
pub use walker::{Direction, LineageEntry};

#[derive(Debug)]
pub enum LineageError {
    Io(String),
    Parse { file: PathBuf, message: String },
}

impl std::fmt::Display for LineageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineageError::Io(msg) => write!(f, "io error: {msg}"),
            LineageError::Parse { file, message } => {
                write!(f, "failed to parse {}: {message}", file.display())
            }
        }
    }
}

impl std::error::Error for LineageError {}

pub type LineageResult<T> = Result<T, LineageError>;

/// One resolved edge, after running a raw resource name through the
/// version catalog.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntry {
    pub owner: String,
    pub pulls_data_from: Vec<String>,
    pub pushes_data_to: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageReport {
    pub entries: Vec<ResolvedEntry>,
    pub warnings: Vec<String>,
}

fn collect_rust_files(root: &Path) -> LineageResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let read_dir = std::fs::read_dir(&dir).map_err(|e| LineageError::Io(e.to_string()))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| LineageError::Io(e.to_string()))?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || name == "target" || name == "node_modules" {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn parse_all(paths: &[PathBuf]) -> LineageResult<Vec<syn::File>> {
    paths
        .iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|e| LineageError::Io(e.to_string()))?;
            syn::parse_file(&source).map_err(|e| LineageError::Parse {
                file: path.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Walk every `.rs` file under `root`, find every `pub fn` (an API/workflow/
/// webapp entry point), mine its reads/writes (following local-helper calls
/// transitively), and resolve each raw resource name against `catalog`.
/// Ambiguous resolutions (a base name with more than one registered version)
/// are reported in `LineageReport::warnings` rather than silently guessed.
pub fn analyze_project(root: &Path, catalog: &VersionCatalog) -> LineageResult<LineageReport> {
    let paths = collect_rust_files(root)?;
    let files = parse_all(&paths)?;
    let fn_table = walker::build_fn_table(&files);

    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for entry_fn in walker::entry_points(&files) {
        let raw = walker::collect_entry(&entry_fn, &fn_table);
        let pulls_data_from = resolve_all(&raw.owner, &raw.pulls_from, catalog, &mut warnings);
        let pushes_data_to = resolve_all(&raw.owner, &raw.pushes_to, catalog, &mut warnings);
        entries.push(ResolvedEntry {
            owner: raw.owner,
            pulls_data_from,
            pushes_data_to,
        });
    }

    Ok(LineageReport { entries, warnings })
}

fn resolve_all(owner: &str, names: &[String], catalog: &VersionCatalog, warnings: &mut Vec<String>) -> Vec<String> {
    names
        .iter()
        .map(|name| match resolve::resolve(name, catalog) {
            Resolution::Resolved(resolved) => resolved,
            Resolution::Ambiguous { chosen, candidates } => {
                warnings.push(format!(
                    "{owner}: {name} resolves to {} versioned ids ({}); using {chosen}",
                    candidates.len(),
                    candidates.join(", ")
                ));
                chosen
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn analyzes_a_single_handler_file() {
        let dir = write_project(&[(
            "handlers.rs",
            r#"
            pub fn list_orders() {
                let rows = sql!(SELECT * FROM Orders);
            }
            "#,
        )]);
        let report = analyze_project(dir.path(), &HashMap::new()).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].owner, "list_orders");
        assert_eq!(report.entries[0].pulls_data_from, vec!["Orders".to_string()]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn skips_target_directory() {
        let dir = write_project(&[("lib.rs", "pub fn noop() {}")]);
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/ignored.rs"), "pub fn should_not_be_seen() {}").unwrap();
        let report = analyze_project(dir.path(), &HashMap::new()).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].owner, "noop");
    }

    #[test]
    fn ambiguous_table_name_is_warned_about() {
        let dir = write_project(&[(
            "handlers.rs",
            r#"
            pub fn list_orders() {
                let rows = sql!(SELECT * FROM Orders);
            }
            "#,
        )]);
        let mut catalog = VersionCatalog::new();
        catalog.insert(
            "Orders".to_string(),
            vec!["Orders_1_0".to_string(), "Orders_2_0".to_string()],
        );
        let report = analyze_project(dir.path(), &catalog).unwrap();
        assert_eq!(report.entries[0].pulls_data_from, vec!["Orders_2_0".to_string()]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Orders"));
    }
}
