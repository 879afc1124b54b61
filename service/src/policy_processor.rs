//! Policy/Group Processor (§4.11): validates group membership and
//! binds each policy and trigger to its declared type by property-merge,
//! reusing the same merge law the Node Processor uses for node properties.

use crate::Result;
use dsl_compiler_core::{
    merge::merge_properties,
    types::{Group, Policy, PolicyTrigger, PolicyType, Trigger},
    LogicError,
};
use indexmap::IndexMap;
use serde_json::Value;

#[tracing::instrument(skip_all)]
pub fn process_groups(
    groups_raw: &IndexMap<String, RawGroup>,
    node_names: &[&String],
    policy_types: &IndexMap<String, PolicyType>,
    policy_triggers: &IndexMap<String, PolicyTrigger>,
) -> Result<IndexMap<String, Group>> {
    let mut result = IndexMap::with_capacity(groups_raw.len());
    for (group_name, raw) in groups_raw {
        for member in &raw.members {
            if !node_names.iter().any(|n| n.as_str() == member) {
                return Err(LogicError::UnknownGroupMember {
                    group: group_name.clone(),
                    member: member.clone(),
                }
                .into());
            }
        }

        let mut policies = IndexMap::with_capacity(raw.policies.len());
        for (policy_name, raw_policy) in &raw.policies {
            let policy_type = policy_types.get(&raw_policy.type_name).ok_or_else(|| {
                LogicError::UndefinedPolicyType {
                    group: group_name.clone(),
                    policy: policy_name.clone(),
                    policy_type: raw_policy.type_name.clone(),
                }
            })?;
            let properties =
                merge_properties(&policy_type.properties, &raw_policy.properties, &IndexMap::new())?;

            let mut triggers = IndexMap::with_capacity(raw_policy.triggers.len());
            for (trigger_name, raw_trigger) in &raw_policy.triggers {
                let trigger_type = policy_triggers.get(&raw_trigger.type_name).ok_or_else(|| {
                    LogicError::UndefinedPolicyTrigger {
                        group: group_name.clone(),
                        policy: policy_name.clone(),
                        trigger: trigger_name.clone(),
                        trigger_type: raw_trigger.type_name.clone(),
                    }
                })?;
                let parameters = merge_properties(
                    &trigger_type.parameters,
                    &raw_trigger.parameters,
                    &IndexMap::new(),
                )?;
                triggers.insert(
                    trigger_name.clone(),
                    Trigger {
                        type_name: raw_trigger.type_name.clone(),
                        parameters,
                    },
                );
            }

            policies.insert(
                policy_name.clone(),
                Policy {
                    type_name: raw_policy.type_name.clone(),
                    properties,
                    triggers,
                },
            );
        }

        result.insert(
            group_name.clone(),
            Group {
                members: raw.members.clone(),
                policies,
            },
        );
    }
    Ok(result)
}

/// `groups` as they appear in the merged document, before policy/trigger
/// type binding.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawGroup {
    pub members: Vec<String>,
    #[serde(default)]
    pub policies: IndexMap<String, RawPolicy>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawPolicy {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub triggers: IndexMap<String, RawTrigger>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawTrigger {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsl_compiler_core::types::PropertyDefinition;
    use serde_json::json;

    fn policy_type_with_prop() -> PolicyType {
        let mut properties = IndexMap::new();
        properties.insert(
            "metric".to_string(),
            PropertyDefinition {
                default: Some(json!("cpu")),
                ..Default::default()
            },
        );
        PolicyType { properties }
    }

    #[test]
    fn unknown_group_member_is_an_error() {
        let mut groups = IndexMap::new();
        groups.insert(
            "g".to_string(),
            RawGroup {
                members: vec!["ghost".to_string()],
                policies: IndexMap::new(),
            },
        );
        let node_names: Vec<&String> = Vec::new();
        let err = process_groups(&groups, &node_names, &IndexMap::new(), &IndexMap::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::Logic(LogicError::UnknownGroupMember { .. })
        ));
    }

    #[test]
    fn policy_binds_against_its_declared_type() {
        let web = "web".to_string();
        let node_names = vec![&web];

        let mut policy_types = IndexMap::new();
        policy_types.insert("scaling".to_string(), policy_type_with_prop());

        let mut policies = IndexMap::new();
        policies.insert(
            "p1".to_string(),
            RawPolicy {
                type_name: "scaling".to_string(),
                properties: IndexMap::new(),
                triggers: IndexMap::new(),
            },
        );
        let mut groups = IndexMap::new();
        groups.insert(
            "g".to_string(),
            RawGroup {
                members: vec!["web".to_string()],
                policies,
            },
        );

        let result = process_groups(&groups, &node_names, &policy_types, &IndexMap::new()).unwrap();
        assert_eq!(result["g"].policies["p1"].properties["metric"], json!("cpu"));
    }

    #[test]
    fn undefined_policy_type_is_an_error() {
        let web = "web".to_string();
        let node_names = vec![&web];
        let mut policies = IndexMap::new();
        policies.insert(
            "p1".to_string(),
            RawPolicy {
                type_name: "missing".to_string(),
                properties: IndexMap::new(),
                triggers: IndexMap::new(),
            },
        );
        let mut groups = IndexMap::new();
        groups.insert(
            "g".to_string(),
            RawGroup {
                members: vec!["web".to_string()],
                policies,
            },
        );
        let err =
            process_groups(&groups, &node_names, &IndexMap::new(), &IndexMap::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::Logic(LogicError::UndefinedPolicyType { .. })
        ));
    }
}
