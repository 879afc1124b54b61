//! Schema Validator (§4.6): validates the combined document (and, ahead
//! of merge, each file's `imports` subtree) against a fixed JSON schema.
//! The JSON-schema validator itself is an external collaborator per
//! `spec.md §1`; this module wires in a real one (`jsonschema`) rather
//! than hand-rolling shape checks.

use crate::error::{CompileError, Result};
use dsl_compiler_core::{constants::SUPPORTED_VERSIONS, constants::VERSION_KEY, FormatError, LogicError};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static DOCUMENT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": [VERSION_KEY],
        "properties": {
            VERSION_KEY: { "type": "string" },
            "imports": { "type": "array", "items": { "type": "string" } },
            "inputs": { "type": "object" },
            "outputs": { "type": "object" },
            "node_types": { "type": "object" },
            "node_templates": { "type": "object" },
            "relationships": { "type": "object" },
            "plugins": { "type": "object" },
            "workflows": { "type": "object" },
            "policy_types": { "type": "object" },
            "policy_triggers": { "type": "object" },
            "groups": { "type": "object" },
            "type_implementations": { "type": "object" },
            "relationship_implementations": { "type": "object" },
        },
    })
});

static IMPORTS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "imports": { "type": "array", "items": { "type": "string" } },
        },
    })
});

/// Validates a single file's `imports` subtree, ahead of merge (§4.6).
pub fn validate_imports_section(doc: &Value) -> Result<()> {
    validate_against(doc, &IMPORTS_SCHEMA, FormatError::ImportsSchemaViolation {
        message: String::new(),
        path: String::new(),
    })
}

/// Validates the fully merged document, then checks the version is
/// among the supported set (§4.6: `LogicError(29)`).
pub fn validate_combined(doc: &Value) -> Result<()> {
    validate_against(doc, &DOCUMENT_SCHEMA, FormatError::SchemaViolation {
        message: String::new(),
        path: String::new(),
    })?;

    let version = doc
        .get(VERSION_KEY)
        .and_then(Value::as_str)
        .expect("presence already checked by schema validation");

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(LogicError::UnsupportedVersion {
            found: version.to_string(),
        }
        .into());
    }
    Ok(())
}

/// `error_kind` is used only to pick the right `FormatError` variant;
/// its fields are discarded and replaced by the real violation.
fn validate_against(doc: &Value, schema: &Value, error_kind: FormatError) -> Result<()> {
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|e| CompileError::SchemaCompile(e.to_string()))?;

    if let Err(mut errors) = compiled.validate(doc) {
        if let Some(e) = errors.next() {
            let message = e.to_string();
            let path = e.instance_path.to_string();
            let path = if path.is_empty() { ".".to_string() } else { path };
            return Err(match error_kind {
                FormatError::ImportsSchemaViolation { .. } => {
                    CompileError::Format(FormatError::ImportsSchemaViolation { message, path })
                }
                _ => CompileError::Format(FormatError::SchemaViolation { message, path }),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_version_fails_schema_validation() {
        let doc = json!({});
        assert!(validate_combined(&doc).is_err());
    }

    #[test]
    fn unsupported_version_is_a_logic_error() {
        let doc = json!({"tosca_definitions_version": "nope"});
        let err = validate_combined(&doc).unwrap_err();
        assert!(matches!(err, CompileError::Logic(LogicError::UnsupportedVersion { .. })));
    }

    #[test]
    fn supported_version_passes() {
        let doc = json!({"tosca_definitions_version": "cloudify_dsl_1_0"});
        assert!(validate_combined(&doc).is_ok());
    }
}
