//! The three entry points (§6): `parse`, `parse_from_path`,
//! `parse_from_url`, each orchestrating the full pipeline over a loaded
//! document down to a validated `Plan`.

use crate::fs_adapter::{FileSystemOperations, HttpResourceFetcher, ResourceFetcher, TokioFileSystemAdapter};
use crate::node_processor::NodeProcessor;
use crate::plugin_binder::bind_operation;
use crate::resolver::ResourceResolver;
use crate::{alias, function_validator, import_graph, loader, merger, policy_processor, post_processor, ref_inliner, schema_validator};
use crate::{CompileError, CompilerConfig, Result};
use dsl_compiler_core::{
    constants::VERSION_KEY,
    types::{
        NodeTemplateRaw, NodeType, OperationSpec, Plan, Plugin, PropertyDefinition, PolicyType,
        PolicyTrigger, RelationshipImplementation, RelationshipType, TypeImplementation, Workflow,
    },
};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

const WORKFLOW_UNBOUND_FALLBACK_CODE: i32 = 20;

/// Parses an already-read document's bytes. `doc_url` is the URL the
/// Resource Resolver treats as the document's own context for relative
/// imports/refs; `None` means "no surrounding document", matching an
/// in-memory blueprint with no imports of its own.
#[tracing::instrument(skip(bytes, config))]
pub async fn parse(bytes: &[u8], doc_url: Option<String>, config: &CompilerConfig) -> Result<Plan> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CompileError::Other(format!("document is not valid UTF-8: {e}")))?;
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(HttpResourceFetcher::new());
    let fs: Arc<dyn FileSystemOperations> = Arc::new(TokioFileSystemAdapter);
    compile(text, doc_url, config, fetcher, fs).await
}

/// Reads `path` from the local filesystem and compiles it; the document's
/// own URL context is `file://<absolute path>` so sibling imports resolve
/// relative to it (§4.1 rule 3).
#[tracing::instrument(skip(config))]
pub async fn parse_from_path(path: &std::path::Path, config: &CompilerConfig) -> Result<Plan> {
    let fs = TokioFileSystemAdapter;
    let text = fs.read_to_string(path).await?;
    let abs = tokio::fs::canonicalize(path).await.unwrap_or_else(|_| path.to_path_buf());
    parse(text.as_bytes(), Some(format!("file://{}", abs.display())), config).await
}

/// Fetches `url` and compiles it; the document's own URL context is `url`
/// itself.
#[tracing::instrument(skip(config))]
pub async fn parse_from_url(url: &str, config: &CompilerConfig) -> Result<Plan> {
    let fetcher = HttpResourceFetcher::new();
    let text = fetcher.fetch(url).await?;
    parse(text.as_bytes(), Some(url.to_string()), config).await
}

async fn compile(
    text: &str,
    doc_url: Option<String>,
    config: &CompilerConfig,
    fetcher: Arc<dyn ResourceFetcher>,
    fs: Arc<dyn FileSystemOperations>,
) -> Result<Plan> {
    let alias_map = alias::build_alias_map(config, fetcher.as_ref()).await?;

    let root_doc = loader::load(text)?;
    schema_validator::validate_imports_section(&root_doc)?;

    let resolver = ResourceResolver::new(fetcher.clone(), fs);
    let graph_builder = import_graph::ImportGraphBuilder::new(
        &resolver,
        fetcher.as_ref(),
        config.max_import_depth,
    );
    let ordered = graph_builder
        .build(root_doc, doc_url, config.resources_base_url.as_deref(), &alias_map)
        .await?;

    let ref_inliner = ref_inliner::RefInliner::new(&resolver, fetcher.as_ref());
    let combined = merger::merge(ordered, &ref_inliner, config.resources_base_url.as_deref(), &alias_map).await?;
    schema_validator::validate_combined(&combined)?;

    let version = combined
        .get(VERSION_KEY)
        .and_then(Value::as_str)
        .expect("presence already checked by schema validation")
        .to_string();

    let node_types: IndexMap<String, NodeType> = section(&combined, "node_types")?;
    let relationship_types: IndexMap<String, RelationshipType> = section(&combined, "relationships")?;
    let plugins: IndexMap<String, Plugin> = section(&combined, "plugins")?;
    let node_templates: IndexMap<String, NodeTemplateRaw> = section(&combined, "node_templates")?;
    let policy_types: IndexMap<String, PolicyType> = section(&combined, "policy_types")?;
    let policy_triggers: IndexMap<String, PolicyTrigger> = section(&combined, "policy_triggers")?;
    let groups_raw: IndexMap<String, policy_processor::RawGroup> = section(&combined, "groups")?;
    let workflows_raw: IndexMap<String, OperationSpec> = section(&combined, "workflows")?;
    let mut type_implementations: IndexMap<String, TypeImplementation> =
        section(&combined, "type_implementations")?;
    let mut relationship_implementations: IndexMap<String, RelationshipImplementation> =
        section(&combined, "relationship_implementations")?;
    let inputs: IndexMap<String, PropertyDefinition> = section(&combined, "inputs")?;
    let outputs: IndexMap<String, Value> = section(&combined, "outputs")?;

    let node_processor = NodeProcessor {
        node_types: &node_types,
        relationship_types: &relationship_types,
        plugins: &plugins,
        resources_base_url: config.resources_base_url.as_deref(),
        fetcher: fetcher.as_ref(),
    };
    let mut nodes = node_processor
        .process_all(&node_templates, &mut type_implementations, &mut relationship_implementations)
        .await?;

    post_processor::post_process(
        &mut nodes,
        &node_types,
        &relationship_types,
        &type_implementations,
        &relationship_implementations,
    )?;

    let node_names: Vec<&String> = nodes.iter().map(|n| &n.id).collect();
    let groups = policy_processor::process_groups(&groups_raw, &node_names, &policy_types, &policy_triggers)?;

    let mut workflows = IndexMap::with_capacity(workflows_raw.len());
    let mut workflow_plugin_names: Vec<String> = Vec::new();
    for (name, spec) in &workflows_raw {
        let descriptor = bind_operation(
            spec.mapping(),
            spec.parameters(),
            &plugins,
            true,
            config.resources_base_url.as_deref(),
            fetcher.as_ref(),
            WORKFLOW_UNBOUND_FALLBACK_CODE,
        )
        .await?;
        if !descriptor.plugin.is_empty() && !workflow_plugin_names.contains(&descriptor.plugin) {
            workflow_plugin_names.push(descriptor.plugin.clone());
        }
        workflows.insert(
            name.clone(),
            Workflow {
                plugin: descriptor.plugin,
                operation: descriptor.operation,
                parameters: descriptor.inputs,
            },
        );
    }

    let mut deployment_plugins_to_install: Vec<String> = Vec::new();
    for node in &nodes {
        for name in &node.deployment_plugins_to_install {
            if !deployment_plugins_to_install.contains(name) {
                deployment_plugins_to_install.push(name.clone());
            }
        }
    }

    let plan = Plan {
        nodes,
        relationships: relationship_types,
        workflows,
        policy_types,
        policy_triggers,
        groups,
        inputs,
        outputs,
        deployment_plugins_to_install,
        workflow_plugins_to_install: workflow_plugin_names,
        version,
    };

    function_validator::validate(&plan)?;

    Ok(plan)
}

fn section<T: DeserializeOwned + Default>(doc: &Value, key: &str) -> Result<T> {
    match doc.get(key) {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| CompileError::Other(format!("malformed '{key}' section: {e}"))),
        None => Ok(T::default()),
    }
}
