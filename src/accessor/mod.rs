//! The persistent value accessor.
//!
//! An [`Accessor`] is instantiated once per configured node. It takes a
//! snapshot of the referenced registry, resolves the selected declaration
//! and then processes messages one at a time:
//!
//! 1. select the effective declaration and command,
//! 2. read the stored value (or the declared default),
//! 3. apply `read`, `write` or `reset`,
//! 4. evaluate the block policy,
//! 5. attach metadata, report status and build the two outputs.
//!
//! Configuration errors surface from [`Accessor::new`]; per-message errors
//! from [`Accessor::process`]. [`Accessor::on_input`] is the host-facing
//! entry point that reports errors through the node sink.

pub mod block;
pub mod command;
pub mod config;
pub mod output;
pub mod selector;
pub mod status;

pub use block::{BlockPolicy, BlockRule};
pub use command::{Command, CommandResolver, CommandSet};
pub use config::{AccessorConfig, AccessorSettings, Revision};
pub use output::{Metadata, Outputs};
pub use selector::{Selection, ValueSelector};
pub use status::{build_status, NodeStatus, StatusFill, StatusShape};

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::coercion::{deep_equal, matches_declared_type};
use crate::context::{ContextAccess, ContextStore};
use crate::error::{ConfigError, EventError, MessageError};
use crate::logger::NodeSink;
use crate::message::Message;
use crate::values::{is_valid_value_id, RegistryStore, ValueDeclaration, ValueRegistry};

/// One configured persistent value node.
pub struct Accessor {
    id: String,
    registry: ValueRegistry,
    declaration: ValueDeclaration,
    settings: AccessorSettings,
    commands: CommandResolver,
    selector: ValueSelector,
    block: BlockPolicy,
    context: ContextAccess,
    sink: Arc<dyn NodeSink>,
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor")
            .field("id", &self.id)
            .field("registry", &self.registry.name)
            .field("value", &self.declaration.name)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Accessor {
    /// Instantiate an accessor.
    ///
    /// The registry referenced by `config.values_config` is copied out of
    /// `registries`; later registry edits are not observed.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]. It is also reported once through `sink`, after
    /// which the host must treat the node as inert.
    pub fn new(
        config: &AccessorConfig,
        registries: &RegistryStore,
        store: Arc<dyn ContextStore>,
        sink: Arc<dyn NodeSink>,
    ) -> Result<Self, ConfigError> {
        let settings = config.settings();
        let resolved = Self::resolve_declaration(config, registries);
        let (registry, declaration) = match resolved {
            Ok(found) => found,
            Err(e) => {
                sink.error(&format!(
                    "Incorrect or inconsistent configuration of persistent value node '{}' with ID {}: {}. \
                     Skipping further processing.",
                    settings.name, config.id, e
                ));
                return Err(e);
            }
        };

        let block = if settings.block_if_enable {
            BlockPolicy::new(
                settings.block_if_rule.clone(),
                settings.block_if_compare_value.as_ref(),
                &declaration.datatype,
                sink.as_ref(),
            )
        } else {
            BlockPolicy::disabled()
        };

        log::debug!(
            "Accessor {} bound to {} / {} (command '{}', revision {:?})",
            config.id,
            registry.name,
            declaration.name,
            settings.command,
            settings.revision
        );

        Ok(Self {
            id: config.id.clone(),
            commands: CommandResolver::new(
                settings.command.clone(),
                settings.dynamic_command_msg_property.clone(),
                settings.command_set(),
            ),
            selector: ValueSelector::new(settings.dynamic_control, settings.dynamic_value_msg_property.clone()),
            context: ContextAccess::new(store, config.id.clone(), config.flow_id.clone()),
            registry,
            declaration,
            settings,
            block,
            sink,
        })
    }

    /// Look up the registry and the selected declaration. The ID is
    /// authoritative; the name is only consulted when no ID is configured.
    fn resolve_declaration(
        config: &AccessorConfig,
        registries: &RegistryStore,
    ) -> Result<(ValueRegistry, ValueDeclaration), ConfigError> {
        let registry_id = config.values_config.clone().unwrap_or_default();
        let registry = registries
            .get(&registry_id)
            .ok_or(ConfigError::MissingRegistry(registry_id))?;

        let declaration = if let Some(id) = config.selected_value_id() {
            if !is_valid_value_id(id) {
                return Err(ConfigError::InvalidValueId(id.to_string()));
            }
            registry.find_by_id(id).ok_or_else(|| ConfigError::ValueIdNotFound {
                registry: registry.name.clone(),
                id: id.to_string(),
            })?
        } else if let Some(name) = config.selected_value_name() {
            registry.find_by_name(name).ok_or_else(|| ConfigError::ValueNameNotFound {
                registry: registry.name.clone(),
                name: name.to_string(),
            })?
        } else {
            return Err(ConfigError::MissingValueReference);
        };

        let declaration = declaration.clone();
        Ok((registry, declaration))
    }

    /// Node ID of this accessor.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The statically configured declaration.
    pub fn declaration(&self) -> &ValueDeclaration {
        &self.declaration
    }

    pub fn registry(&self) -> &ValueRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AccessorSettings {
        &self.settings
    }

    /// Store key of the statically configured value.
    pub fn store_key(&self) -> String {
        self.registry.store_key(&self.declaration.name)
    }

    /// Process one message, reporting a failure through the node sink.
    ///
    /// A failed message produces no output.
    pub fn on_input(&self, msg: Message) -> Outputs {
        match self.process(msg) {
            Ok(outputs) => outputs,
            Err(e) => {
                self.sink.error(&e.to_string());
                Outputs::none()
            }
        }
    }

    /// Process one message.
    ///
    /// # Errors
    ///
    /// [`EventError`] for an invalid scope, an unsupported command, an
    /// invalid default, or a write without a valid input. Nothing is
    /// written to the store in these cases.
    pub fn process(&self, mut msg: Message) -> Result<Outputs, EventError> {
        let sink = self.sink.as_ref();
        let settings = &self.settings;

        let selection = self.selector.select(&self.registry, &self.declaration, &msg, sink);
        let declaration = selection.declaration;
        let command = self.commands.resolve(&msg, sink)?;
        log::debug!("Accessor {}: {} '{}'", self.id, command, declaration.name);

        self.context.check_scope(&declaration.scope)?;
        let key = self.registry.store_key(&declaration.name);

        let default = declaration
            .default_value()
            .map_err(|e| EventError::InvalidDefault {
                registry: self.registry.name.clone(),
                value: declaration.name.clone(),
                reason: e.to_string(),
            })?;
        let stored = self.context.read(&declaration.scope, &declaration.storage, &key)?;
        let is_default = stored.is_none();
        let current = stored.unwrap_or_else(|| default.clone());

        if !matches_declared_type(&current, &declaration.datatype) {
            sink.warn(&format!(
                "Persisted value {} / {} does not have the configured datatype '{}'!",
                self.registry.name,
                declaration.name,
                declaration.datatype.code()
            ));
        }

        let mut persisted = false;
        let value = match command {
            Command::Read => {
                self.assign(&mut msg, &settings.msg_property, current.clone());
                self.collect(&mut msg, &key, &current, &current);
                current
            }
            Command::Write => {
                let input = msg
                    .get(&settings.msg_property)
                    .cloned()
                    .ok_or_else(|| EventError::MissingInput(settings.msg_property.clone()))?;
                if !matches_declared_type(&input, &declaration.datatype) {
                    return Err(EventError::InputTypeMismatch {
                        property: settings.msg_property.clone(),
                        datatype: declaration.datatype.code().to_string(),
                        registry: self.registry.name.clone(),
                        value: declaration.name.clone(),
                    });
                }

                self.output_previous(&mut msg, &current);
                self.collect(&mut msg, &key, &input, &current);

                if is_default || !deep_equal(&input, &current) {
                    self.context
                        .write(&declaration.scope, &declaration.storage, &key, input.clone())?;
                    persisted = true;
                } else {
                    log::debug!("Accessor {}: '{}' unchanged, write skipped", self.id, key);
                }
                input
            }
            Command::Reset => {
                self.output_previous(&mut msg, &current);
                self.collect(&mut msg, &key, &default, &current);

                if is_default || !deep_equal(&current, &default) {
                    self.context
                        .write(&declaration.scope, &declaration.storage, &key, default.clone())?;
                    persisted = true;
                } else {
                    log::debug!("Accessor {}: '{}' already at default, reset skipped", self.id, key);
                }
                self.assign(&mut msg, &settings.msg_property, default.clone());
                default
            }
        };

        let blocked = self.block.evaluate(&value, sink);

        if settings.output_meta_data {
            let metadata = Metadata::new(&self.registry, declaration, command);
            match serde_json::to_value(metadata) {
                Ok(metadata) => self.assign(&mut msg, &settings.output_meta_data_msg_property, metadata),
                Err(e) => log::error!("Failed to serialize metadata: {}", e),
            }
        }

        let default_storage = self.context.default_storage();
        sink.status(&build_status(
            &value,
            declaration,
            default_storage.as_deref(),
            selection.overridden,
            blocked,
        ));

        if blocked {
            log::debug!("Accessor {}: outputs blocked", self.id);
            return Ok(Outputs::none());
        }
        let on_change = persisted.then(|| msg.clone());
        Ok(Outputs {
            primary: Some(msg),
            on_change,
        })
    }

    /// Set a message property; failures are warnings.
    fn assign(&self, msg: &mut Message, property: &str, value: Value) {
        if let Err(e) = msg.set(property, value) {
            self.sink.warn(&e.to_string());
        }
    }

    fn output_previous(&self, msg: &mut Message, previous: &Value) {
        if self.settings.output_previous_value {
            self.assign(msg, &self.settings.output_previous_value_msg_property, previous.clone());
        }
    }

    /// Merge the value into the collected values map under its store key.
    fn collect(&self, msg: &mut Message, key: &str, current: &Value, previous: &Value) {
        if !self.settings.collect_values {
            return;
        }
        let property = &self.settings.collect_values_msg_property;
        let entry = if self.settings.output_previous_value {
            json!({"current": current, "previous": previous})
        } else {
            current.clone()
        };

        let mut collected = match msg.get(property) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(existing)) => existing.clone(),
            Some(_) => {
                self.sink.warn(&MessageError::NotAContainer(property.clone()).to_string());
                return;
            }
        };
        collected.insert(key.to_string(), entry);
        self.assign(msg, property, Value::Object(collected));
    }
}
