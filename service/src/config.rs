//! Compiler configuration (§6: the options every entry point accepts).

use std::collections::HashMap;

/// Options shared by `parse`, `parse_from_path` and `parse_from_url`.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Logical-name to physical-name rewrites, applied by the Resource
    /// Resolver (§4.1) ahead of every other resolution rule.
    pub alias_mapping_dict: HashMap<String, String>,
    /// A URL to a YAML document of the same shape as `alias_mapping_dict`,
    /// fetched once and unioned with it (dict entries win on conflict, §6).
    pub alias_mapping_url: Option<String>,
    /// The global fallback base URL used by resolution rule 5 (§4.1).
    pub resources_base_url: Option<String>,
    /// Safety net against cyclic import graphs; the original parser has
    /// no explicit cap but the teacher's import resolver does, and
    /// conformant documents never approach it.
    pub max_import_depth: usize,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self {
            max_import_depth: 50,
            ..Default::default()
        }
    }

    pub fn with_alias_mapping_dict(mut self, dict: HashMap<String, String>) -> Self {
        self.alias_mapping_dict = dict;
        self
    }

    pub fn with_alias_mapping_url(mut self, url: impl Into<String>) -> Self {
        self.alias_mapping_url = Some(url.into());
        self
    }

    pub fn with_resources_base_url(mut self, url: impl Into<String>) -> Self {
        self.resources_base_url = Some(url.into());
        self
    }
}
