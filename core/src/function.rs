//! The intrinsic-function value model (§4.12, §9). A function literal in
//! the source document is any mapping of the exact shape
//! `{"<name>": <args>}` where `<name>` is registered. `FunctionInstance`
//! is the opaque replacement the Function Validator substitutes while it
//! works, restored to `raw` once validation completes (§8 invariant 7).

use serde_json::Value;

/// One of the intrinsic functions named in the GLOSSARY. `GetAttribute`
/// is recognized but deferred — only parsed, never evaluated at compile
/// time.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    GetProperty { node_name: String, path: Vec<String> },
    GetAttribute { node_name: String, path: Vec<String> },
    GetInput { input_name: String },
    Concat { parts: Vec<Value> },
    /// A user-registered function outside the fixed set above; kept as its
    /// raw name and argument value so a caller-supplied registry hook can
    /// still validate it, per the open registry described in §9.
    Unregistered { name: String, args: Value },
}

impl Function {
    /// Recognizes `{"<name>": <args>}` mappings. Returns `None` for
    /// anything else (including mappings with more than one key, which
    /// are never function literals).
    pub fn try_parse(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        let (name, args) = obj.iter().next()?;
        match name.as_str() {
            "get_property" => {
                let (node_name, path) = parse_ref_args(args)?;
                Some(Self::GetProperty { node_name, path })
            }
            "get_attribute" => {
                let (node_name, path) = parse_ref_args(args)?;
                Some(Self::GetAttribute { node_name, path })
            }
            "get_input" => args
                .as_str()
                .map(|s| Self::GetInput {
                    input_name: s.to_string(),
                })
                .or_else(|| {
                    args.as_array().and_then(|a| a.first()).and_then(Value::as_str).map(|s| {
                        Self::GetInput {
                            input_name: s.to_string(),
                        }
                    })
                }),
            "concat" => args.as_array().map(|parts| Self::Concat {
                parts: parts.clone(),
            }),
            other => Some(Self::Unregistered {
                name: other.to_string(),
                args: args.clone(),
            }),
        }
    }

    /// The recognized, fixed-set functions name a single node; used to
    /// build the `(node, property_path)` cycle-detection identity.
    pub fn target_identity(&self) -> Option<(String, String)> {
        match self {
            Self::GetProperty { node_name, path } | Self::GetAttribute { node_name, path } => {
                Some((node_name.clone(), path.join(".")))
            }
            _ => None,
        }
    }
}

/// `get_property`/`get_attribute` args are `[node_name, prop, ...nested_path]`.
fn parse_ref_args(args: &Value) -> Option<(String, Vec<String>)> {
    let arr = args.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let node_name = arr[0].as_str()?.to_string();
    let path = arr[1..]
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    Some((node_name, path))
}

/// The opaque function-instance wrapper a plan leaf is replaced with
/// while the Function Validator is active.
#[derive(Debug, Clone)]
pub struct FunctionInstance {
    pub function: Function,
    pub raw: Value,
}
