//! Error types for the persistent value accessor.
//!
//! Configuration errors make an accessor unusable and are raised once at
//! instantiation. Event errors abort the processing of a single message and
//! leave the accessor usable for the next one.

use thiserror::Error;

/// Errors detected while instantiating an accessor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The referenced registry does not exist.
    #[error("Referenced configuration '{0}' does not exist")]
    MissingRegistry(String),

    /// Neither a value ID nor a value name is configured.
    #[error("No value selected (neither value ID nor value name configured)")]
    MissingValueReference,

    /// The configured value ID is not a UUID.
    #[error("Selected value ID '{0}' is not a valid UUID")]
    InvalidValueId(String),

    /// No declaration with the configured ID exists in the registry.
    #[error("Value with ID '{id}' not found in configuration '{registry}'")]
    ValueIdNotFound { registry: String, id: String },

    /// No declaration with the configured name exists in the registry.
    #[error("Value '{name}' not found in configuration '{registry}'")]
    ValueNameNotFound { registry: String, name: String },
}

/// Errors that abort the processing of a single message.
#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    /// The declaration uses a scope outside `node`, `flow` and `global`.
    #[error("Failed to get context scope '{0}'")]
    InvalidScope(String),

    /// A write was requested but the message lacks the input property.
    #[error("Passed msg does not have the configured property '{0}'")]
    MissingInput(String),

    /// The write input does not have the declared datatype.
    #[error(
        "Passed value in msg.{property} does not have the configured datatype '{datatype}'! \
         Persistent value config: {registry} / {value}"
    )]
    InputTypeMismatch {
        property: String,
        datatype: String,
        registry: String,
        value: String,
    },

    /// The declared default could not be turned into a runtime value.
    #[error("Default value of {registry} / {value} is invalid: {reason}")]
    InvalidDefault {
        registry: String,
        value: String,
        reason: String,
    },

    /// The resolved command is not supported by this accessor.
    #[error("Unknown or unsupported persistent value command '{0}' used!")]
    UnsupportedCommand(String),
}

/// Errors raised when a configuration literal cannot be coerced.
#[derive(Debug, Error, PartialEq)]
pub enum CoercionError {
    /// The literal is not representable in the declared datatype.
    #[error("Failed to convert value '{literal}' to expected datatype '{datatype}'!")]
    Conversion { literal: String, datatype: String },

    /// The declared datatype is not one of the supported kinds.
    #[error("Unsupported compare value type '{0}' configured!")]
    UnsupportedDatatype(String),
}

/// Errors when loading registries from files or strings.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors from dotted-path message property access.
#[derive(Debug, Error, PartialEq)]
pub enum MessageError {
    /// The property path is empty or malformed.
    #[error("Invalid property expression '{0}'")]
    InvalidPath(String),

    /// An intermediate segment exists but is not an object or array.
    #[error("Failed to create Object at msg.{0}")]
    NotAContainer(String),

    /// An index points more than one element past the end of an array.
    #[error("Index out of range at msg.{0}")]
    IndexOutOfRange(String),
}
