//! End-to-end compiler scenarios, exercised through the public `parse`
//! entry point with no filesystem or network access beyond the one
//! script-plugin-fallback test, which probes a real temp file.

use dsl_compiler::{parse, CompilerConfig};
use serde_json::json;

async fn compile(yaml: &str) -> dsl_compiler::Result<dsl_compiler::Plan> {
    parse(yaml.as_bytes(), None, &CompilerConfig::new()).await
}

#[tokio::test]
async fn minimal_single_node_compiles() {
    let plan = compile(
        r#"
tosca_definitions_version: cloudify_dsl_1_0
node_types:
  type.a:
    properties:
      x:
        default: 1
node_templates:
  node1:
    type: type.a
"#,
    )
    .await
    .unwrap();

    assert_eq!(plan.nodes.len(), 1);
    let node = plan.node("node1").unwrap();
    assert_eq!(node.properties["x"], json!(1));
    assert!(node.host_id.is_none());
}

#[tokio::test]
async fn contained_node_inherits_host_id_from_its_container() {
    let plan = compile(
        r#"
tosca_definitions_version: cloudify_dsl_1_0
node_types:
  cloudify.types.host: {}
  host_type:
    derived_from: cloudify.types.host
  web_type: {}
relationships:
  cloudify.relationships.contained_in: {}
node_templates:
  host:
    type: host_type
  web:
    type: web_type
    relationships:
      - type: cloudify.relationships.contained_in
        target: host
"#,
    )
    .await
    .unwrap();

    assert_eq!(plan.node("web").unwrap().host_id, Some("host".to_string()));
    assert_eq!(plan.node("host").unwrap().host_id, Some("host".to_string()));
    assert_eq!(
        plan.node("web").unwrap().relationships[0].base,
        dsl_compiler_core::types::BaseFamily::Contained
    );
}

#[tokio::test]
async fn operation_binds_to_the_longest_matching_plugin_prefix() {
    let plan = compile(
        r#"
tosca_definitions_version: cloudify_dsl_1_0
plugins:
  a:
    executor: central_deployment_agent
    source: x
  a.b:
    executor: central_deployment_agent
    source: y
node_types:
  t:
    interfaces:
      lifecycle:
        create: a.b.run
node_templates:
  n1:
    type: t
"#,
    )
    .await
    .unwrap();

    let op = &plan.node("n1").unwrap().operations["lifecycle.create"];
    assert_eq!(op.plugin, "a.b");
    assert_eq!(op.operation, "run");
}

#[tokio::test]
async fn unconsumed_type_implementation_is_rejected() {
    let err = compile(
        r#"
tosca_definitions_version: cloudify_dsl_1_0
node_types:
  t: {}
node_templates:
  n1:
    type: t
type_implementations:
  impl1:
    type: t
    node_ref: ghost
"#,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        dsl_compiler::CompileError::Logic(dsl_compiler_core::LogicError::UnusedTypeImplementation { .. })
    ));
}

#[tokio::test]
async fn self_referential_get_property_is_rejected() {
    let err = compile(
        r#"
tosca_definitions_version: cloudify_dsl_1_0
node_types:
  t:
    properties:
      a: {}
node_templates:
  n1:
    type: t
    properties:
      a:
        get_property: [n1, a]
"#,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        dsl_compiler::CompileError::Logic(dsl_compiler_core::LogicError::CircularGetProperty(_))
    ));
}

#[tokio::test]
async fn script_plugin_fallback_binds_an_unmatched_mapping_to_a_script_task() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
    std::fs::write(dir.path().join("scripts/install.sh"), "#!/bin/sh\n").unwrap();

    let base_url = format!("file://{}", dir.path().display());
    let config = CompilerConfig::new().with_resources_base_url(base_url);

    let yaml = r#"
tosca_definitions_version: cloudify_dsl_1_0
plugins:
  script:
    executor: central_deployment_agent
    source: x
node_types:
  t:
    interfaces:
      lifecycle:
        create: scripts/install.sh
node_templates:
  n1:
    type: t
"#;

    let plan = parse(yaml.as_bytes(), None, &config).await.unwrap();
    let op = &plan.node("n1").unwrap().operations["lifecycle.create"];
    assert_eq!(op.plugin, "script");
    assert_eq!(op.operation, "run_script");
    assert_eq!(op.inputs["script_path"], json!("scripts/install.sh"));
}
