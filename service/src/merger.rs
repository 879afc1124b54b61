//! Merger (§4.5): folds the ordered import list into the root document,
//! per-key merge-no-override for most sections, per-entry union for the
//! sections named in `MERGEABLE_SECTIONS`.

use crate::alias::AliasMap;
use crate::ref_inliner::RefInliner;
use crate::{Result, CompileError};
use dsl_compiler_core::{
    constants::{IMPORTS_KEY, MERGEABLE_SECTIONS, VERSION_KEY},
    LogicError,
};
use serde_json::Value;

/// Merges `ordered` (root first, per `ImportGraphBuilder::build`'s
/// pre-order) into a single combined document.
#[tracing::instrument(skip_all)]
pub async fn merge(
    mut ordered: Vec<(Option<String>, Value)>,
    ref_inliner: &RefInliner<'_>,
    base_url: Option<&str>,
    alias_map: &AliasMap,
) -> Result<Value> {
    if ordered.is_empty() {
        return Err(CompileError::Other("no document to compile".to_string()));
    }
    let (_, mut combined) = ordered.remove(0);

    for (url, mut doc) in ordered {
        if let Some(obj) = doc.as_object_mut() {
            obj.remove(VERSION_KEY);
        }
        ref_inliner
            .inline(&mut doc, url.as_deref(), base_url, alias_map)
            .await?;
        merge_one(&mut combined, doc)?;
    }

    if let Some(obj) = combined.as_object_mut() {
        obj.remove(IMPORTS_KEY);
    }

    if combined.get(VERSION_KEY).is_none() {
        return Err(LogicError::MissingVersion.into());
    }

    Ok(combined)
}

fn merge_one(target: &mut Value, source: Value) -> Result<()> {
    let source_obj = match source {
        Value::Object(obj) => obj,
        _ => return Ok(()),
    };
    let target_obj = target
        .as_object_mut()
        .expect("combined document is always an object after the Loader");

    for (key, source_value) in source_obj {
        if key == IMPORTS_KEY {
            continue;
        }

        if !target_obj.contains_key(&key) {
            target_obj.insert(key, source_value);
            continue;
        }

        if !MERGEABLE_SECTIONS.contains(&key.as_str()) {
            return Err(LogicError::NonMergeableKeyRedefined { key }.into());
        }

        let target_section = target_obj
            .get_mut(&key)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| LogicError::NonMergeableKeyRedefined { key: key.clone() })?;

        let source_section = source_value
            .as_object()
            .ok_or_else(|| LogicError::NonMergeableKeyRedefined { key: key.clone() })?;

        for (name, entry) in source_section {
            if target_section.contains_key(name) {
                return Err(LogicError::DuplicateEntry {
                    path: format!("{key}.{name}"),
                }
                .into());
            }
            target_section.insert(name.clone(), entry.clone());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn per_entry_union_rejects_duplicate_entries() {
        let mut target = json!({"node_types": {"a": {}}});
        let source = json!({"node_types": {"a": {}}});
        let err = merge_one(&mut target, source).unwrap_err();
        assert!(matches!(err, CompileError::Logic(LogicError::DuplicateEntry { .. })));
    }

    #[test]
    fn per_entry_union_adds_new_entries() {
        let mut target = json!({"node_types": {"a": {}}});
        let source = json!({"node_types": {"b": {}}});
        merge_one(&mut target, source).unwrap();
        assert!(target["node_types"].get("a").is_some());
        assert!(target["node_types"].get("b").is_some());
    }

    #[test]
    fn non_mergeable_key_redefined_is_an_error() {
        let mut target = json!({"inputs": {"a": {}}});
        let source = json!({"inputs": {"b": {}}});
        let err = merge_one(&mut target, source).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Logic(LogicError::NonMergeableKeyRedefined { .. })
        ));
    }
}
