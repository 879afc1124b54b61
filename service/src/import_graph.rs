//! Import Graph Builder (§4.4): DFS over `imports` lists into a
//! deduplicated, depth-ordered list of `(url, document)` pairs. Imports
//! are pushed in pre-order (a document before its own imports), which is
//! also the order the Merger folds them in.

use crate::alias::{apply_alias, AliasMap};
use crate::fs_adapter::ResourceFetcher;
use crate::resolver::ResourceResolver;
use crate::{loader, Result};
use dsl_compiler_core::{constants::IMPORTS_KEY, constants::VERSION_KEY, LogicError};
use serde_json::Value;
use std::collections::HashSet;

pub struct ImportGraphBuilder<'a> {
    resolver: &'a ResourceResolver,
    fetcher: &'a dyn ResourceFetcher,
    max_depth: usize,
}

impl<'a> ImportGraphBuilder<'a> {
    pub fn new(resolver: &'a ResourceResolver, fetcher: &'a dyn ResourceFetcher, max_depth: usize) -> Self {
        Self {
            resolver,
            fetcher,
            max_depth,
        }
    }

    #[tracing::instrument(skip(self, root_doc, alias_map))]
    pub async fn build(
        &self,
        root_doc: Value,
        root_url: Option<String>,
        base_url: Option<&str>,
        alias_map: &AliasMap,
    ) -> Result<Vec<(Option<String>, Value)>> {
        let root_version = root_doc
            .get(VERSION_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut visited = HashSet::new();
        let mut ordered = Vec::new();
        self.recurse(
            root_doc,
            root_url,
            base_url,
            alias_map,
            root_version.as_deref(),
            &mut visited,
            &mut ordered,
            0,
        )
        .await?;
        Ok(ordered)
    }

    #[allow(clippy::too_many_arguments)]
    fn recurse<'b>(
        &'b self,
        doc: Value,
        url: Option<String>,
        base_url: Option<&'b str>,
        alias_map: &'b AliasMap,
        root_version: Option<&'b str>,
        visited: &'b mut HashSet<String>,
        ordered: &'b mut Vec<(Option<String>, Value)>,
        depth: usize,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'b>> {
        Box::pin(async move {
            if depth > self.max_depth {
                return Err(LogicError::ImportFailed {
                    failed_import: url.unwrap_or_default(),
                    reason: format!("maximum import depth ({}) exceeded", self.max_depth),
                }
                .into());
            }

            if let Some(u) = &url {
                if visited.contains(u) {
                    return Ok(());
                }
                visited.insert(u.clone());
            }

            if let (Some(expected), Some(found)) = (
                root_version,
                doc.get(VERSION_KEY).and_then(Value::as_str),
            ) {
                if found != expected {
                    return Err(LogicError::VersionMismatch {
                        failed_import: url.clone().unwrap_or_default(),
                        expected: expected.to_string(),
                        found: found.to_string(),
                    }
                    .into());
                }
            }

            let imports: Vec<String> = doc
                .get(IMPORTS_KEY)
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();

            ordered.push((url.clone(), doc));

            for entry in imports {
                let aliased = apply_alias(alias_map, &entry);
                let resolved = self
                    .resolver
                    .resolve(&aliased, base_url, url.as_deref(), alias_map)
                    .await
                    .map_err(|e| LogicError::ImportFailed {
                        failed_import: entry.clone(),
                        reason: e.to_string(),
                    })?;

                let text = self.fetcher.fetch(&resolved).await.map_err(|e| {
                    LogicError::ImportFailed {
                        failed_import: entry.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let child_doc = loader::load(&text)?;

                self.recurse(
                    child_doc,
                    Some(resolved),
                    base_url,
                    alias_map,
                    root_version,
                    visited,
                    ordered,
                    depth + 1,
                )
                .await?;
            }

            Ok(())
        })
    }
}
