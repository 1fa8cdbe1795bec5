//! Per-instance accessor configuration.
//!
//! [`AccessorConfig`] mirrors the host's stored node configuration: every
//! field is optional and uses the host's camelCase names. Boolean flags are
//! tri-state (`None` means "use the default", an explicit `false` is kept).
//! [`AccessorConfig::settings`] resolves the defaults into
//! [`AccessorSettings`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::block::BlockRule;
use super::command::{Command, CommandSet};

pub const DEFAULT_MSG_PROPERTY: &str = "payload";
pub const DEFAULT_COMMAND_MSG_PROPERTY: &str = "command";
pub const DEFAULT_VALUE_MSG_PROPERTY: &str = "value";
pub const DEFAULT_PREVIOUS_VALUE_MSG_PROPERTY: &str = "previous";
pub const DEFAULT_COLLECT_VALUES_MSG_PROPERTY: &str = "values";
pub const DEFAULT_META_DATA_MSG_PROPERTY: &str = "meta";

/// Configuration revision of an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Revision {
    /// First generation: read/write only, no dynamic value override.
    Legacy,
    #[default]
    Current,
}

impl TryFrom<u8> for Revision {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Revision::Legacy),
            2 => Ok(Revision::Current),
            other => Err(format!("unknown accessor revision {}", other)),
        }
    }
}

impl From<Revision> for u8 {
    fn from(revision: Revision) -> Self {
        match revision {
            Revision::Legacy => 1,
            Revision::Current => 2,
        }
    }
}

/// Stored configuration of one accessor instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorConfig {
    /// Node ID, namespace of `node` scoped values.
    #[serde(default)]
    pub id: String,

    /// Flow ID, namespace of `flow` scoped values.
    #[serde(default, rename = "z")]
    pub flow_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub revision: Option<Revision>,

    /// ID of the referenced registry.
    #[serde(default)]
    pub values_config: Option<String>,

    /// Selected value by ID (preferred).
    #[serde(default)]
    pub value_id: Option<String>,

    /// Selected value by name. Only consulted when no ID is configured.
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub command: Option<String>,

    /// Output property for reads, input property for writes.
    #[serde(default)]
    pub msg_property: Option<String>,

    #[serde(default)]
    pub deep_clone_value: Option<bool>,

    #[serde(default)]
    pub dynamic_control: Option<bool>,
    #[serde(default)]
    pub dynamic_command_msg_property: Option<String>,
    #[serde(default)]
    pub dynamic_value_msg_property: Option<String>,

    #[serde(default)]
    pub output_previous_value: Option<bool>,
    #[serde(default)]
    pub output_previous_value_msg_property: Option<String>,

    #[serde(default)]
    pub collect_values: Option<bool>,
    #[serde(default)]
    pub collect_values_msg_property: Option<String>,

    #[serde(default)]
    pub block_if_enable: Option<bool>,
    #[serde(default)]
    pub block_if_rule: Option<String>,
    /// Raw comparison literal, coerced to the value's datatype on instantiation.
    #[serde(default)]
    pub block_if_compare_value: Option<Value>,

    #[serde(default)]
    pub output_meta_data: Option<bool>,
    #[serde(default)]
    pub output_meta_data_msg_property: Option<String>,
}

/// Fully resolved accessor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorSettings {
    pub name: String,
    pub revision: Revision,
    /// Configured command text. Validated per message.
    pub command: String,
    pub msg_property: String,
    /// Values are always handed out as owned copies, so store and message
    /// never share state; the flag is kept for configuration compatibility.
    pub deep_clone_value: bool,
    pub dynamic_control: bool,
    pub dynamic_command_msg_property: String,
    pub dynamic_value_msg_property: String,
    pub output_previous_value: bool,
    pub output_previous_value_msg_property: String,
    pub collect_values: bool,
    pub collect_values_msg_property: String,
    pub block_if_enable: bool,
    pub block_if_rule: BlockRule,
    pub block_if_compare_value: Option<Value>,
    pub output_meta_data: bool,
    pub output_meta_data_msg_property: String,
}

/// Property names: an empty string addresses nothing and falls back too.
fn property(configured: &Option<String>, default: &str) -> String {
    match configured.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default.to_string(),
    }
}

impl AccessorConfig {
    /// Parse from a JSON value in the host's format.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The value ID, ignoring empty and `"undefined"` placeholders.
    pub fn selected_value_id(&self) -> Option<&str> {
        self.value_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "undefined")
    }

    /// The value name, ignoring empty placeholders.
    pub fn selected_value_name(&self) -> Option<&str> {
        self.value.as_deref().filter(|name| !name.is_empty())
    }

    /// Apply defaults to every unset field.
    pub fn settings(&self) -> AccessorSettings {
        let revision = self.revision.unwrap_or_default();
        AccessorSettings {
            name: self.name.clone().unwrap_or_default(),
            revision,
            command: property(&self.command, Command::Read.as_str()),
            msg_property: property(&self.msg_property, DEFAULT_MSG_PROPERTY),
            deep_clone_value: self.deep_clone_value.unwrap_or(false),
            dynamic_control: revision == Revision::Current && self.dynamic_control.unwrap_or(false),
            dynamic_command_msg_property: property(
                &self.dynamic_command_msg_property,
                DEFAULT_COMMAND_MSG_PROPERTY,
            ),
            dynamic_value_msg_property: property(
                &self.dynamic_value_msg_property,
                DEFAULT_VALUE_MSG_PROPERTY,
            ),
            output_previous_value: self.output_previous_value.unwrap_or(false),
            output_previous_value_msg_property: property(
                &self.output_previous_value_msg_property,
                DEFAULT_PREVIOUS_VALUE_MSG_PROPERTY,
            ),
            collect_values: self.collect_values.unwrap_or(false),
            collect_values_msg_property: property(
                &self.collect_values_msg_property,
                DEFAULT_COLLECT_VALUES_MSG_PROPERTY,
            ),
            block_if_enable: self.block_if_enable.unwrap_or(false),
            block_if_rule: BlockRule::from(property(&self.block_if_rule, BlockRule::Eq.as_str())),
            block_if_compare_value: self.block_if_compare_value.clone(),
            output_meta_data: self.output_meta_data.unwrap_or(false),
            output_meta_data_msg_property: property(
                &self.output_meta_data_msg_property,
                DEFAULT_META_DATA_MSG_PROPERTY,
            ),
        }
    }
}

impl AccessorSettings {
    /// Commands recognized by this accessor.
    pub fn command_set(&self) -> CommandSet {
        match self.revision {
            Revision::Legacy => CommandSet::Legacy,
            Revision::Current => CommandSet::Full,
        }
    }
}
