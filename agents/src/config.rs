//! Framework-wide settings loaded from `HELLOAGENTS_*` environment
//! variables: `_` is the nesting separator, keys fold to lower-case
//! dotted paths before being deserialized.

use std::time::Duration;

use agent_types::{AgentError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

const PREFIX: &str = "HELLOAGENTS_";

/// Folds `HELLOAGENTS_`-prefixed environment variables into a nested
/// JSON object: `HELLOAGENTS_AGENT_NAME=x` becomes `{"agent":{"name":
/// "x"}}`. Every remaining `_` after the prefix is a nesting boundary,
/// so multi-word leaf keys are not representable by this scheme —
/// callers should pick single-word field names for env-loaded settings.
fn fold_env(vars: impl Iterator<Item = (String, String)>) -> Value {
    let mut root = Map::new();
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(PREFIX) else {
            continue;
        };
        let path: Vec<String> = rest.to_lowercase().split('_').map(str::to_string).collect();
        insert_path(&mut root, &path, Value::String(value));
    }
    Value::Object(root)
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = map.entry(head.clone()).or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Deserializes an `Option<u64>` from either a JSON number or a JSON
/// string (env values fold in as strings; everything else as-is).
fn u64_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse::<u64>().map(Some).map_err(D::Error::custom),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| D::Error::custom(format!("{n} is not a valid u64"))),
        Some(other) => Err(D::Error::custom(format!("expected a number or numeric string, got {other}"))),
    }
}

/// Framework-wide overrides. Every field is optional — absence means
/// "use the built-in default", matching `AgentConfig::validate`'s own
/// zero-means-default convention.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub timeout: Option<u64>,
}

impl Settings {
    /// Scans the process environment for `HELLOAGENTS_*` variables and
    /// deserializes them into [`Settings`]. An empty environment yields
    /// `Settings::default()`.
    pub fn from_env() -> Result<Self> {
        let folded = fold_env(std::env::vars());
        serde_json::from_value(folded).map_err(|e| AgentError::InvalidConfig(format!("HELLOAGENTS_* settings: {e}")))
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_env_nests_on_every_underscore() {
        let vars = vec![
            ("HELLOAGENTS_NAME".to_string(), "researcher".to_string()),
            ("HELLOAGENTS_TIMEOUT".to_string(), "30".to_string()),
            ("UNRELATED_VAR".to_string(), "ignored".to_string()),
        ];
        let folded = fold_env(vars.into_iter());
        assert_eq!(folded["name"], "researcher");
        assert_eq!(folded["timeout"], "30");
        assert!(folded.get("UNRELATED_VAR").is_none());
    }

    #[test]
    fn settings_deserializes_from_folded_env() {
        let vars = vec![
            ("HELLOAGENTS_NAME".to_string(), "researcher".to_string()),
            ("HELLOAGENTS_MODEL".to_string(), "gpt-4o-mini".to_string()),
        ];
        let folded = fold_env(vars.into_iter());
        let settings: Settings = serde_json::from_value(folded).unwrap();
        assert_eq!(settings.name.as_deref(), Some("researcher"));
        assert_eq!(settings.model.as_deref(), Some("gpt-4o-mini"));
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn timeout_deserializes_from_the_string_env_folds_into() {
        let vars = vec![("HELLOAGENTS_TIMEOUT".to_string(), "30".to_string())];
        let folded = fold_env(vars.into_iter());
        let settings: Settings = serde_json::from_value(folded).unwrap();
        assert_eq!(settings.timeout, Some(30));
        assert_eq!(settings.timeout_duration(), Duration::from_secs(30));
    }

    #[test]
    fn empty_environment_yields_default_settings() {
        let folded = fold_env(std::iter::empty());
        let settings: Settings = serde_json::from_value(folded).unwrap();
        assert!(settings.name.is_none());
        assert_eq!(settings.timeout_duration(), Duration::ZERO);
    }
}
