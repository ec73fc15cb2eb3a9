//! Configuration units served by name to the evaluation engine.
//!
//! The replica layer stores these verbatim. Payload fields (default values,
//! return values, condition targets) stay as opaque JSON.

use crate::serde_util::null_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The three independent configuration namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKind {
    /// Boolean-outcome feature gate.
    Gate,
    /// Multi-value dynamic config.
    DynamicConfig,
    /// Layer config (experiments sharing a parameter space).
    Layer,
}

impl ConfigKind {
    /// All kinds, in snapshot order.
    pub const ALL: [ConfigKind; 3] = [Self::Gate, Self::DynamicConfig, Self::Layer];

    /// Returns the snake_case name used in logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gate => "gate",
            Self::DynamicConfig => "dynamic_config",
            Self::Layer => "layer",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named configuration unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    /// Unique key within its kind.
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// Server-side type tag (e.g. `feature_gate`, `dynamic_config`).
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub spec_type: String,
    /// Hashing salt, consumed by the evaluation engine.
    #[serde(default, deserialize_with = "null_default")]
    pub salt: String,
    #[serde(default)]
    pub enabled: bool,
    /// Evaluation rules, in evaluation order.
    #[serde(default, deserialize_with = "null_default")]
    pub rules: Vec<ConfigRule>,
    /// Fallback value returned when no rule matches.
    #[serde(default)]
    pub default_value: Value,
    #[serde(default, deserialize_with = "null_default")]
    pub id_type: String,
    /// Parameter names owned explicitly by a layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_parameters: Option<Vec<String>>,
}

impl ConfigSpec {
    /// Creates a spec with the given name and enabled flag and no rules.
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            ..Default::default()
        }
    }

    /// Adds a rule, preserving order.
    #[must_use]
    pub fn with_rule(mut self, rule: ConfigRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// A single ordered rule belonging to a [`ConfigSpec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRule {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub salt: String,
    /// Percentage of matching units that pass, 0.0 to 100.0.
    #[serde(default)]
    pub pass_percentage: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub conditions: Vec<ConfigCondition>,
    #[serde(default)]
    pub return_value: Value,
    #[serde(default, deserialize_with = "null_default")]
    pub id_type: String,
    /// Name of a config this rule delegates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_delegate: Option<String>,
}

impl ConfigRule {
    /// Returns the delegate config name, treating an empty string as none.
    pub fn delegate(&self) -> Option<&str> {
        self.config_delegate.as_deref().filter(|d| !d.is_empty())
    }
}

/// A targeting condition. Stored, never evaluated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCondition {
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub condition_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub target_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_values: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "null_default")]
    pub id_type: String,
}
