//! Well-known identifiers fixed by §6: the host type and the three
//! relationship roots, plus the supported `tosca_definitions_version`
//! set (§4.6) and the script-plugin bindings used by the Plugin Binder's
//! fallback (§4.8).

/// A node type deriving from this is a host; hosts aggregate host-agent plugins.
pub const HOST_TYPE: &str = "cloudify.types.host";

pub const CONTAINED_IN: &str = "cloudify.relationships.contained_in";
pub const CONNECTED_TO: &str = "cloudify.relationships.connected_to";
pub const DEPENDS_ON: &str = "cloudify.relationships.depends_on";

/// Base families in match-order (§4.10: "first match in that order").
pub const BASE_FAMILY_ROOTS: [(&str, crate::types::BaseFamily); 3] = [
    (CONTAINED_IN, crate::types::BaseFamily::Contained),
    (CONNECTED_TO, crate::types::BaseFamily::Connected),
    (DEPENDS_ON, crate::types::BaseFamily::Depends),
];

pub const SUPPORTED_VERSIONS: &[&str] = &["cloudify_dsl_1_0"];

pub const SCRIPT_PLUGIN_NAME: &str = "script";
/// The run-task operation name, already in `plugin.op` form so binding it
/// follows the same longest-prefix convention as any other mapping.
pub const SCRIPT_PLUGIN_RUN_TASK: &str = "script.run_script";
pub const SCRIPT_PLUGIN_WORKFLOW_TASK: &str = "script.execute_workflow";

/// Top-level document keys the Merger folds by per-entry union (§4.5);
/// everything else is first-wins and a redefinition is `LogicError(3)`.
pub const MERGEABLE_SECTIONS: &[&str] = &[
    "interfaces",
    "node_types",
    "plugins",
    "workflows",
    "type_implementations",
    "relationships",
    "relationship_implementations",
    "policy_types",
    "groups",
    "policy_triggers",
];

/// The key the Loader strips before any further processing (§C.2 of
/// `SPEC_FULL.md`): used only for YAML anchors/aliases, never merged or validated.
pub const DSL_DEFINITIONS_KEY: &str = "dsl_definitions";

pub const VERSION_KEY: &str = "tosca_definitions_version";
pub const IMPORTS_KEY: &str = "imports";
