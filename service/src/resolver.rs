//! Resource Resolver (§4.1): turns a logical name into a fetchable URL.

use crate::alias::{apply_alias, AliasMap};
use crate::fs_adapter::{FileSystemOperations, ResourceFetcher};
use dsl_compiler_core::LogicError;
use std::path::Path;
use std::sync::Arc;

const URL_SCHEMES: [&str; 4] = ["http:", "https:", "file:", "ftp:"];

pub struct ResourceResolver {
    fetcher: Arc<dyn ResourceFetcher>,
    fs: Arc<dyn FileSystemOperations>,
}

impl ResourceResolver {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, fs: Arc<dyn FileSystemOperations>) -> Self {
        Self { fetcher, fs }
    }

    /// Resolves `name` to a URL, first match wins (§4.1). `31` is used
    /// when a `current_context_url` probe fails to locate the name
    /// relative to the current document and no further rule applies
    /// (callers distinguish `ResolutionFailed(30)` — nothing matched at
    /// all — from the ref-inliner's fetch-time `31` by calling site).
    #[tracing::instrument(skip(self, alias_map))]
    pub async fn resolve(
        &self,
        name: &str,
        base_url: Option<&str>,
        current_context_url: Option<&str>,
        alias_map: &AliasMap,
    ) -> Result<String, LogicError> {
        let name = apply_alias(alias_map, name);

        if URL_SCHEMES.iter().any(|scheme| name.starts_with(scheme)) {
            return Ok(name);
        }

        if self.fs.exists(Path::new(&name)).await {
            let abs = std::fs::canonicalize(&name).unwrap_or_else(|_| Path::new(&name).to_path_buf());
            return Ok(format!("file://{}", abs.display()));
        }

        if let Some(current) = current_context_url {
            if let Some(dir) = parent_url(current) {
                let candidate = join_url(&dir, &name);
                if self.fetcher.probe_exists(&candidate).await {
                    return Ok(candidate);
                }
            }
        }

        if let Some(base) = base_url {
            return Ok(join_url(base, &name));
        }

        Err(LogicError::ResolutionFailed { name })
    }
}

/// `dirname(url)`, keeping the trailing slash so the join step is a
/// plain concatenation.
fn parent_url(url: &str) -> Option<String> {
    let idx = url.rfind('/')?;
    Some(url[..=idx].to_string())
}

pub(crate) fn join_url(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_url_keeps_trailing_slash() {
        assert_eq!(parent_url("file:///a/b/c.yaml"), Some("file:///a/b/".to_string()));
    }

    #[test]
    fn join_url_avoids_double_slash() {
        assert_eq!(join_url("http://x/", "y"), "http://x/y");
        assert_eq!(join_url("http://x", "y"), "http://x/y");
    }
}
