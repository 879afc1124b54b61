//! Plugin Binder (§4.8): binds a single operation mapping string to a
//! declared plugin by longest-prefix match, falling back to the
//! script-plugin path when the mapping string resolves to an existing
//! resource.

use crate::fs_adapter::ResourceFetcher;
use crate::resolver::join_url;
use crate::Result;
use dsl_compiler_core::{
    constants::{SCRIPT_PLUGIN_NAME, SCRIPT_PLUGIN_RUN_TASK, SCRIPT_PLUGIN_WORKFLOW_TASK},
    types::{OpDescriptor, Plugin},
    LogicError,
};
use indexmap::IndexMap;
use serde_json::Value;

/// Binds `mapping`/`parameters` against `plugins`. `is_workflow`
/// selects between the node-operation script-plugin rebind (injects
/// `inputs.script_path`) and the workflow rebind (injects a
/// `parameters.script_path` default), per §4.8 step 3. `fallback_code`
/// is the caller-supplied `LogicError` code used when neither a plugin
/// prefix matches nor the script-plugin fallback applies (§4.8 step 4).
#[tracing::instrument(skip(plugins, fetcher))]
pub async fn bind_operation(
    mapping: &str,
    mut parameters: IndexMap<String, Value>,
    plugins: &IndexMap<String, Plugin>,
    is_workflow: bool,
    resources_base_url: Option<&str>,
    fetcher: &dyn ResourceFetcher,
    fallback_code: i32,
) -> Result<OpDescriptor> {
    if mapping.is_empty() {
        return Ok(OpDescriptor::default());
    }

    if let Some((plugin_name, operation)) = longest_prefix_match(mapping, plugins) {
        return Ok(OpDescriptor {
            plugin: plugin_name,
            operation,
            inputs: parameters,
        });
    }

    if let Some(base) = resources_base_url {
        let candidate = join_url(base, mapping);
        if fetcher.probe_exists(&candidate).await {
            if !plugins.contains_key(SCRIPT_PLUGIN_NAME) {
                return Err(LogicError::ScriptPluginNotDeclared {
                    mapping: mapping.to_string(),
                }
                .into());
            }

            if is_workflow {
                if parameters.contains_key("script_path") {
                    return Err(LogicError::ScriptPathAlreadySet.into());
                }
                parameters.insert("script_path".to_string(), Value::String(mapping.to_string()));
                let (plugin_name, operation) =
                    longest_prefix_match(SCRIPT_PLUGIN_WORKFLOW_TASK, plugins)
                        .expect("script plugin presence just checked above");
                return Ok(OpDescriptor {
                    plugin: plugin_name,
                    operation,
                    inputs: parameters,
                });
            }

            if parameters.contains_key("script_path") {
                return Err(LogicError::ScriptPathAlreadySet.into());
            }
            parameters.insert("script_path".to_string(), Value::String(mapping.to_string()));
            let (plugin_name, operation) = longest_prefix_match(SCRIPT_PLUGIN_RUN_TASK, plugins)
                .expect("script plugin presence just checked above");
            return Ok(OpDescriptor {
                plugin: plugin_name,
                operation,
                inputs: parameters,
            });
        }
    }

    Err(LogicError::UnboundOperation {
        mapping: mapping.to_string(),
        reason: "no declared plugin prefix matches and the script-plugin fallback did not apply"
            .to_string(),
        code: fallback_code,
    }
    .into())
}

/// Chooses the longest declared plugin name `P` such that `mapping`
/// starts with `P + "."` (§9 open question: a mapping equal to a plugin
/// name with no trailing dot never matches here and falls through to
/// the script-plugin branch).
fn longest_prefix_match(
    mapping: &str,
    plugins: &IndexMap<String, Plugin>,
) -> Option<(String, String)> {
    plugins
        .keys()
        .filter(|name| mapping.starts_with(name.as_str()) && mapping[name.len()..].starts_with('.'))
        .max_by_key(|name| name.len())
        .map(|name| (name.clone(), mapping[name.len() + 1..].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsl_compiler_core::types::Executor;

    fn plugin() -> Plugin {
        Plugin {
            executor: Executor::HostAgent,
            source: Some("x".to_string()),
            install: true,
        }
    }

    #[test]
    fn picks_the_longest_matching_prefix() {
        let mut plugins = IndexMap::new();
        plugins.insert("a".to_string(), plugin());
        plugins.insert("a.b".to_string(), plugin());
        let (name, op) = longest_prefix_match("a.b.run", &plugins).unwrap();
        assert_eq!(name, "a.b");
        assert_eq!(op, "run");
    }

    #[test]
    fn plugin_name_without_trailing_dot_does_not_match() {
        let mut plugins = IndexMap::new();
        plugins.insert("a".to_string(), plugin());
        assert!(longest_prefix_match("a", &plugins).is_none());
    }
}
