//! Routing stage: WebApp mount-path matching
//! followed by `/api/`/`/consumption/` prefix stripping for API dispatch.

use moose_core::registry::WebAppInfo;

/// Outcome of the routing stage for one request path.
pub enum RouteTarget {
    /// A registered WebApp's mount path matched; `rewritten_path` has the
    /// mount stripped (e.g. `/admin/users` under mount `/admin` becomes `/users`).
    WebApp { mount_path: String, rewritten_path: String },
    /// No WebApp matched, but a `/api/` or `/consumption/` prefix was
    /// stripped; `lookup_path` is the remainder used for API resolution.
    Api { lookup_path: String },
    /// Neither a WebApp nor an API prefix matched.
    Unmatched,
}

/// True if `mount_path` equals `path` or is a `/`-terminated prefix of it.
fn mount_matches(mount_path: &str, path: &str) -> bool {
    if path == mount_path {
        return true;
    }
    let prefix = if mount_path.ends_with('/') {
        mount_path.to_string()
    } else {
        format!("{mount_path}/")
    };
    path.starts_with(&prefix)
}

fn strip_mount<'a>(mount_path: &str, path: &'a str) -> &'a str {
    if path == mount_path {
        return "/";
    }
    let prefix_len = if mount_path.ends_with('/') {
        mount_path.len()
    } else {
        mount_path.len() + 1
    };
    &path[prefix_len.min(path.len())..]
}

const API_PREFIXES: [&str; 2] = ["/api/", "/consumption/"];

fn strip_api_prefix(path: &str) -> Option<&str> {
    API_PREFIXES.iter().find_map(|prefix| path.strip_prefix(prefix))
}

/// Resolve a request path against the registered WebApps (longest mount
/// path first), falling back to API-prefix stripping.
pub fn route(path: &str, webapps: &[WebAppInfo]) -> RouteTarget {
    for app in webapps {
        if mount_matches(&app.mount_path, path) {
            let rewritten = strip_mount(&app.mount_path, path);
            let rewritten = if rewritten.is_empty() { "/" } else { rewritten };
            return RouteTarget::WebApp {
                mount_path: app.mount_path.clone(),
                rewritten_path: rewritten.to_string(),
            };
        }
    }

    match strip_api_prefix(path) {
        Some(lookup_path) => RouteTarget::Api {
            lookup_path: lookup_path.to_string(),
        },
        None => RouteTarget::Unmatched,
    }
}
