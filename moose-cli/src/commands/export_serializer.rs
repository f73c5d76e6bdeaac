//! `export-serializer <target>`: print the public items one user source
//! file exports, as a JSON array of names.

use std::path::Path;

use syn::{Item, Visibility};

use super::CommandResult;

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn exported_names(file: &syn::File) -> Vec<String> {
    file.items
        .iter()
        .filter_map(|item| match item {
            Item::Fn(f) if is_public(&f.vis) => Some(f.sig.ident.to_string()),
            Item::Struct(s) if is_public(&s.vis) => Some(s.ident.to_string()),
            Item::Enum(e) if is_public(&e.vis) => Some(e.ident.to_string()),
            Item::Const(c) if is_public(&c.vis) => Some(c.ident.to_string()),
            Item::Trait(t) if is_public(&t.vis) => Some(t.ident.to_string()),
            Item::Type(t) if is_public(&t.vis) => Some(t.ident.to_string()),
            _ => None,
        })
        .collect()
}

pub fn run(target: &Path) -> CommandResult {
    let source = std::fs::read_to_string(target).map_err(|e| format!("failed to read {}: {e}", target.display()))?;
    let parsed = syn::parse_file(&source).map_err(|e| format!("failed to parse {}: {e}", target.display()))?;
    let names = exported_names(&parsed);
    println!("{}", serde_json::to_string_pretty(&names).expect("Vec<String> always serializes"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_public_functions_and_types_only() {
        let source = r#"
            pub fn handler() {}
            fn private_helper() {}
            pub struct Config;
            struct Internal;
            pub const LIMIT: u32 = 10;
        "#;
        let file = syn::parse_file(source).unwrap();
        let mut names = exported_names(&file);
        names.sort();
        assert_eq!(names, vec!["Config", "LIMIT", "handler"]);
    }

    #[test]
    fn module_with_no_public_items_exports_nothing() {
        let file = syn::parse_file("fn internal_only() {}").unwrap();
        assert!(exported_names(&file).is_empty());
    }
}
