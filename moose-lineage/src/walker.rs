//! Single-pass `syn` source walker: mines `sql!{...}` tagged templates and
//! classifies method calls into reads/writes, following plain calls to
//! other top-level functions in the same project so a `pullsDataFrom`/
//! `pushesDataTo` edge surfaces even when the actual access happens in a
//! helper a handler calls into.

use std::collections::{HashMap, HashSet};

use syn::visit::{self, Visit};
use syn::{Expr, ExprCall, ExprMacro, ExprMethodCall, Item, ItemFn, Member, Visibility};

const WRITE_VERBS: &[&str] = &["insert", "send", "publish", "emit", "write"];

const SQL_KEYWORDS: &[&str] = &[
    "select", "from", "where", "join", "left", "right", "inner", "outer", "on", "and", "or",
    "group", "by", "order", "limit", "offset", "as", "into", "values", "set", "update",
    "delete", "create", "table", "not", "null", "is", "in", "like", "asc", "desc", "having",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// What one entry point (a `pub fn`, standing in for an API/workflow/webapp
/// handler) reads from and writes to, deduplicated and in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageEntry {
    pub owner: String,
    pub pulls_from: Vec<String>,
    pub pushes_to: Vec<String>,
}

fn mine_identifiers(tokens: &proc_macro2::TokenStream) -> Vec<String> {
    let mut names = Vec::new();
    for tt in tokens.clone() {
        match tt {
            proc_macro2::TokenTree::Ident(ident) => {
                let text = ident.to_string();
                if !SQL_KEYWORDS.contains(&text.to_ascii_lowercase().as_str()) {
                    names.push(text);
                }
            }
            proc_macro2::TokenTree::Literal(lit) => {
                let text = lit.to_string();
                let trimmed = text.trim_matches('"');
                if trimmed.chars().next().is_some_and(|c| c.is_alphabetic()) {
                    names.push(trimmed.to_string());
                }
            }
            proc_macro2::TokenTree::Group(group) => names.extend(mine_identifiers(&group.stream())),
            proc_macro2::TokenTree::Punct(_) => {}
        }
    }
    names
}

fn receiver_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Path(p) => p.path.get_ident().map(ToString::to_string),
        Expr::Field(f) => match &f.member {
            Member::Named(ident) => Some(ident.to_string()),
            Member::Unnamed(_) => None,
        },
        Expr::MethodCall(m) => receiver_name(&m.receiver),
        _ => None,
    }
}

/// Every top-level `fn` in the project, keyed by name, so a call to a local
/// helper can be followed into its body. Functions outside the project
/// (crate dependencies) are never in this table and so are never followed —
/// this is the "never across `node_modules`-equivalent" rule.
pub type FnTable = HashMap<String, ItemFn>;

pub fn build_fn_table(files: &[syn::File]) -> FnTable {
    let mut table = FnTable::new();
    for file in files {
        for item in &file.items {
            if let Item::Fn(f) = item {
                table.insert(f.sig.ident.to_string(), f.clone());
            }
        }
    }
    table
}

pub fn entry_points(files: &[syn::File]) -> Vec<ItemFn> {
    files
        .iter()
        .flat_map(|file| file.items.iter())
        .filter_map(|item| match item {
            Item::Fn(f) if matches!(f.vis, Visibility::Public(_)) => Some(f.clone()),
            _ => None,
        })
        .collect()
}

struct EdgeCollector<'p> {
    fn_table: &'p FnTable,
    visited: HashSet<String>,
    edges: Vec<(String, Direction)>,
}

impl<'p, 'ast> Visit<'ast> for EdgeCollector<'p> {
    fn visit_expr_macro(&mut self, node: &'ast ExprMacro) {
        if node.mac.path.is_ident("sql") {
            for name in mine_identifiers(&node.mac.tokens) {
                self.edges.push((name, Direction::Read));
            }
        }
        visit::visit_expr_macro(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        if let Some(resource) = receiver_name(&node.receiver) {
            let method = node.method.to_string();
            let direction = if WRITE_VERBS.contains(&method.as_str()) {
                Direction::Write
            } else {
                Direction::Read
            };
            self.edges.push((resource, direction));
        }
        visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_call(&mut self, node: &'ast ExprCall) {
        if let Expr::Path(p) = &*node.func {
            if let Some(ident) = p.path.get_ident() {
                let name = ident.to_string();
                if self.visited.insert(name.clone()) {
                    if let Some(callee) = self.fn_table.get(&name) {
                        self.visit_block(&callee.block);
                    }
                }
            }
        }
        visit::visit_expr_call(self, node);
    }
}

pub fn collect_entry(entry: &ItemFn, fn_table: &FnTable) -> LineageEntry {
    let mut collector = EdgeCollector {
        fn_table,
        visited: HashSet::new(),
        edges: Vec::new(),
    };
    collector.visited.insert(entry.sig.ident.to_string());
    collector.visit_block(&entry.block);

    let mut pulls_from = Vec::new();
    let mut pushes_to = Vec::new();
    for (resource, direction) in collector.edges {
        let bucket = match direction {
            Direction::Read => &mut pulls_from,
            Direction::Write => &mut pushes_to,
        };
        if !bucket.contains(&resource) {
            bucket.push(resource);
        }
    }

    LineageEntry {
        owner: entry.sig.ident.to_string(),
        pulls_from,
        pushes_to,
    }
}
