//! The compiler's two error taxa (§7): `FormatError` for YAML/schema
//! violations and `LogicError` for semantic violations. Every
//! `LogicError` variant carries a stable numeric `code`, matched against
//! `spec.md §7`'s non-exhaustive catalogue, plus whatever structured
//! fields a consumer needs to render a diagnostic.

use thiserror::Error;

/// Schema or YAML violations. Codes `-1, 1, 2`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// YAML parse failure (§4.2). Code `-1`.
    #[error("'{0}'")]
    YamlParse(String),

    /// Schema violation with a dot-path to the offending node. Code `1`.
    #[error("{message}; Path to error: {path}")]
    SchemaViolation { message: String, path: String },

    /// Schema violation in an `imports` subtree validated before merge. Code `2`.
    #[error("{message}; Path to error: {path}")]
    ImportsSchemaViolation { message: String, path: String },
}

impl FormatError {
    pub fn code(&self) -> i32 {
        match self {
            Self::YamlParse(_) => -1,
            Self::SchemaViolation { .. } => 1,
            Self::ImportsSchemaViolation { .. } => 2,
        }
    }
}

/// Semantic violations detected during resolution, merging, flattening,
/// binding or post-processing. Each variant's doc comment names the
/// `spec.md §4` step that raises it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogicError {
    /// A non-mergeable top-level key was redefined by an import. Code `3`.
    #[error("'{key}' cannot be redefined (already defined in the combined document)")]
    NonMergeableKeyRedefined { key: String },

    /// A mergeable section defined the same entry twice. Code `4`.
    #[error("'{path}' is already defined")]
    DuplicateEntry { path: String },

    /// A node template names an undeclared node type. Code `7`.
    #[error("node template '{node_ref}' has an undefined type '{type_name}'")]
    UndefinedNodeType { node_ref: String, type_name: String },

    /// An import could not be resolved or fetched. Code `13`.
    #[error("failed to parse import '{failed_import}': {reason}")]
    ImportFailed { failed_import: String, reason: String },

    /// A declared plugin is missing required fields. Code `18`.
    #[error("plugin '{plugin}' is invalid: {reason}")]
    InvalidPlugin { plugin: String, reason: String },

    /// An `install: true` plugin has no `source`. Code `19`.
    #[error("plugin '{plugin}' has install=true but no source")]
    PluginMissingSource { plugin: String },

    /// A non-contained node declares a host-agent plugin. Code `21`.
    #[error("node '{node_ref}' declares a host_agent plugin '{plugin}' but has no host")]
    HostAgentPluginWithoutHost { node_ref: String, plugin: String },

    /// A relationship targets itself. Code `23`.
    #[error("node '{node_ref}' has a relationship targeting itself")]
    SelfTargetingRelationship { node_ref: String },

    /// A non-contained node declares a host-agent plugin (post-process check). Code `24`.
    #[error("node '{node_ref}' declares host_agent plugins but is not contained in a host")]
    HostAgentPluginOnNonContained { node_ref: String },

    /// A relationship targets an unknown node. Code `25`.
    #[error("relationship on node '{source_node_ref}' targets unknown node '{target}'")]
    UnknownRelationshipTarget { source_node_ref: String, target: String },

    /// A relationship's declared type is unknown. Code `26`.
    #[error("relationship on node '{source_node_ref}' has undefined type '{relationship_type}'")]
    UndefinedRelationshipType {
        source_node_ref: String,
        relationship_type: String,
    },

    /// The combined document is missing `tosca_definitions_version`. Code `27`.
    #[error("the combined document does not declare tosca_definitions_version")]
    MissingVersion,

    /// An import declares a version that differs from the root's. Code `28`.
    #[error("import '{failed_import}' declares version '{found}', expected '{expected}'")]
    VersionMismatch {
        failed_import: String,
        expected: String,
        found: String,
    },

    /// The document's version is not in the supported set. Code `29`.
    #[error("unsupported tosca_definitions_version '{found}'")]
    UnsupportedVersion { found: String },

    /// A resource name could not be resolved to a URL. Code `30`.
    #[error("could not resolve resource '{name}'")]
    ResolutionFailed { name: String },

    /// A `{ref: ...}` target could not be fetched. Code `31`.
    #[error("could not fetch ref target '{name}': {reason}")]
    RefFetchFailed { name: String, reason: String },

    /// A group references an unknown member node. Code `40`.
    #[error("group '{group}' has unknown member '{member}'")]
    UnknownGroupMember { group: String, member: String },

    /// A group policy references an unknown policy type. Code `41`.
    #[error("group '{group}' policy '{policy}' has undefined type '{policy_type}'")]
    UndefinedPolicyType {
        group: String,
        policy: String,
        policy_type: String,
    },

    /// A policy trigger references an unknown trigger type. Code `42`.
    #[error("group '{group}' policy '{policy}' trigger '{trigger}' has undefined type '{trigger_type}'")]
    UndefinedPolicyTrigger {
        group: String,
        policy: String,
        trigger: String,
        trigger_type: String,
    },

    /// A property-merge key is not part of the target schema. Code `50`.
    #[error("'{key}' is not part of the properties schema")]
    PropertyNotInSchema { key: String },

    /// A property-merge mandatory key is missing a value. Code `50`.
    #[error("property '{key}' does not provide a value")]
    PropertyMissingValue { key: String },

    /// `script_path` is already present when the script plugin is about to inject it. Code `60`.
    #[error("'script_path' is already defined for this operation")]
    ScriptPathAlreadySet,

    /// The script-plugin fallback was taken but no `script` plugin is declared. Code `61`.
    #[error("mapping '{mapping}' could not be bound to any declared plugin and no 'script' plugin is declared")]
    ScriptPluginNotDeclared { mapping: String },

    /// A caller-supplied fallback code raised when no plugin bound the mapping
    /// and the script-plugin fallback did not apply either.
    #[error("could not bind operation mapping '{mapping}': {reason}")]
    UnboundOperation {
        mapping: String,
        reason: String,
        code: i32,
    },

    /// A node names a `TypeImplementation` whose type does not derive from its declared type. Code `102`.
    #[error("type implementation '{implementation}' type does not derive from node '{node_ref}'s declared type")]
    TypeImplementationMismatch { implementation: String, node_ref: String },

    /// More than one `TypeImplementation` names the same node. Code `103`.
    #[error("node '{node_ref}' has more than one type implementation")]
    MultipleTypeImplementations { node_ref: String },

    /// More than one `RelationshipImplementation` matches the same edge. Code `108`.
    #[error("relationship ({source_node_ref} -> {target_node_ref}) has more than one implementation")]
    MultipleRelationshipImplementations {
        source_node_ref: String,
        target_node_ref: String,
    },

    /// A matching `RelationshipImplementation`'s type does not derive from the edge's declared type. Code `109`.
    #[error("relationship implementation '{implementation}' type does not derive from the declared relationship type")]
    RelationshipImplementationMismatch { implementation: String },

    /// A `TypeImplementation` was never consumed by any node. Code `110`.
    #[error("type implementation '{implementation}' names unknown node_ref '{node_ref}'")]
    UnusedTypeImplementation { implementation: String, node_ref: String },

    /// A `RelationshipImplementation` was never consumed by any edge. Code `111`.
    #[error("relationship implementation '{implementation}' names an edge that does not exist")]
    UnusedRelationshipImplementation { implementation: String },

    /// A node has more than one `contained_in`-derived relationship. Code `112`.
    #[error("node '{node_ref}' has more than one contained-in relationship")]
    MultipleContainingRelationships { node_ref: String },

    /// A `derived_from` chain revisits a type name. `spec.md §3` states the
    /// DAG-over-`derived_from` invariant but does not assign it a numeric
    /// code (malformed input a conformant document never produces).
    #[error("cyclic derived_from chain detected at '{type_name}'")]
    CyclicTypeHierarchy { type_name: String },

    /// A `get_property` chain revisits a `(node, property_path)` pair. Not numerically
    /// coded in `spec.md` (it is a runtime evaluation error, not a pipeline-stage code);
    /// surfaced separately so callers can match on it without scanning a code.
    #[error("circular get_property reference: {0}")]
    CircularGetProperty(String),

    /// A `get_input` function names an input the document never declares.
    /// Not part of `spec.md`'s numeric catalogue (a supplemented check, §C.6
    /// of `SPEC_FULL.md`).
    #[error("get_input references undeclared input '{input_name}'")]
    UndefinedInput { input_name: String },
}

impl LogicError {
    /// The stable numeric code named in `spec.md §7`, where one exists.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::NonMergeableKeyRedefined { .. } => Some(3),
            Self::DuplicateEntry { .. } => Some(4),
            Self::UndefinedNodeType { .. } => Some(7),
            Self::ImportFailed { .. } => Some(13),
            Self::InvalidPlugin { .. } => Some(18),
            Self::PluginMissingSource { .. } => Some(19),
            Self::HostAgentPluginWithoutHost { .. } => Some(21),
            Self::SelfTargetingRelationship { .. } => Some(23),
            Self::HostAgentPluginOnNonContained { .. } => Some(24),
            Self::UnknownRelationshipTarget { .. } => Some(25),
            Self::UndefinedRelationshipType { .. } => Some(26),
            Self::MissingVersion => Some(27),
            Self::VersionMismatch { .. } => Some(28),
            Self::UnsupportedVersion { .. } => Some(29),
            Self::ResolutionFailed { .. } => Some(30),
            Self::RefFetchFailed { .. } => Some(31),
            Self::UnknownGroupMember { .. } => Some(40),
            Self::UndefinedPolicyType { .. } => Some(41),
            Self::UndefinedPolicyTrigger { .. } => Some(42),
            Self::PropertyNotInSchema { .. } | Self::PropertyMissingValue { .. } => Some(50),
            Self::ScriptPathAlreadySet => Some(60),
            Self::ScriptPluginNotDeclared { .. } => Some(61),
            Self::UnboundOperation { code, .. } => Some(*code),
            Self::TypeImplementationMismatch { .. } => Some(102),
            Self::MultipleTypeImplementations { .. } => Some(103),
            Self::MultipleRelationshipImplementations { .. } => Some(108),
            Self::RelationshipImplementationMismatch { .. } => Some(109),
            Self::UnusedTypeImplementation { .. } => Some(110),
            Self::UnusedRelationshipImplementation { .. } => Some(111),
            Self::MultipleContainingRelationships { .. } => Some(112),
            Self::CyclicTypeHierarchy { .. }
            | Self::CircularGetProperty(_)
            | Self::UndefinedInput { .. } => None,
        }
    }
}

/// The union the pure-core helpers (property merge, interface merge,
/// base-family classification) can raise. I/O and YAML/schema-library
/// errors are folded in one layer up, by `service::error::CompileError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Logic(#[from] LogicError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
