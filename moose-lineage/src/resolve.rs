//! Table-name resolution against a versioned-id catalog, and the
//! ambiguity-warning rule: a base name that maps to more than one
//! versioned id is reported rather than silently picking one.

use std::collections::HashMap;

/// Maps a base table/topic name to every versioned id currently registered
/// under it (e.g. `"Orders" -> ["Orders_1_0", "Orders_2_0"]`).
pub type VersionCatalog = HashMap<String, Vec<String>>;

pub enum Resolution {
    /// Resolved to a single versioned id (or the name itself, when it isn't
    /// in the catalog at all — an unversioned resource).
    Resolved(String),
    /// The base name maps to more than one versioned id; conservatively
    /// resolved to the first (lexicographically last, i.e. newest) entry,
    /// but the caller should surface the warning.
    Ambiguous { chosen: String, candidates: Vec<String> },
}

pub fn resolve(name: &str, catalog: &VersionCatalog) -> Resolution {
    match catalog.get(name) {
        None => Resolution::Resolved(name.to_string()),
        Some(versions) if versions.len() == 1 => Resolution::Resolved(versions[0].clone()),
        Some(versions) => {
            let mut sorted = versions.clone();
            sorted.sort();
            let chosen = sorted.last().cloned().unwrap_or_else(|| name.to_string());
            Resolution::Ambiguous {
                chosen,
                candidates: sorted,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unversioned_name_resolves_to_itself() {
        let catalog = VersionCatalog::new();
        match resolve("Orders", &catalog) {
            Resolution::Resolved(name) => assert_eq!(name, "Orders"),
            _ => panic!("expected Resolved"),
        }
    }

    #[test]
    fn single_version_resolves_unambiguously() {
        let mut catalog = VersionCatalog::new();
        catalog.insert("Orders".to_string(), vec!["Orders_1_0".to_string()]);
        match resolve("Orders", &catalog) {
            Resolution::Resolved(name) => assert_eq!(name, "Orders_1_0"),
            _ => panic!("expected Resolved"),
        }
    }

    #[test]
    fn multiple_versions_is_ambiguous_and_picks_the_newest() {
        let mut catalog = VersionCatalog::new();
        catalog.insert(
            "Orders".to_string(),
            vec!["Orders_1_0".to_string(), "Orders_2_0".to_string()],
        );
        match resolve("Orders", &catalog) {
            Resolution::Ambiguous { chosen, candidates } => {
                assert_eq!(chosen, "Orders_2_0");
                assert_eq!(candidates.len(), 2);
            }
            _ => panic!("expected Ambiguous"),
        }
    }
}
