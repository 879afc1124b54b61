//! Alias-map resolution, shared by the three entry points (§6) and the
//! Resource Resolver / Import Graph Builder (§4.1, §4.4): the two alias
//! sources are unioned, with `alias_mapping_dict` overriding entries
//! from `alias_mapping_url` on key conflict.

use crate::config::CompilerConfig;
use crate::fs_adapter::ResourceFetcher;
use crate::Result;
use std::collections::HashMap;

pub type AliasMap = HashMap<String, String>;

/// Builds the effective alias map for a compile invocation. A malformed
/// or unreachable `alias_mapping_url` document yields its error directly,
/// matching the original parser's unforgiving I/O posture (unlike the
/// probe-and-fallthrough model used for resource resolution rule 4).
pub async fn build_alias_map(
    config: &CompilerConfig,
    fetcher: &dyn ResourceFetcher,
) -> Result<AliasMap> {
    let mut map = AliasMap::new();

    if let Some(url) = &config.alias_mapping_url {
        let text = fetcher.fetch(url).await?;
        let from_url: AliasMap = serde_yaml::from_str(&text)
            .map_err(|e| dsl_compiler_core::FormatError::YamlParse(e.to_string()))?;
        map.extend(from_url);
    }

    map.extend(config.alias_mapping_dict.clone());
    Ok(map)
}

/// Rule 1 of §4.1: `alias_map[name]` or identity.
pub fn apply_alias(alias_map: &AliasMap, name: &str) -> String {
    alias_map.get(name).cloned().unwrap_or_else(|| name.to_string())
}
