//! Value registries and the process-wide registry store.
//!
//! A [`ValueRegistry`] is the shared configuration entity: a name used as the
//! store-key namespace plus an ordered list of declarations. The
//! [`RegistryStore`] holds every known registry keyed by its configuration ID.
//! Admin tooling mutates it; accessors read a snapshot of one registry when
//! they are instantiated and never observe later edits.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::declaration::ValueDeclaration;
use crate::error::RegistryError;

/// Build the context store key for a value.
///
/// The key is `"{registry_name}_{value_name}"` with every space replaced by
/// an underscore. External tools addressing the same store entry must use
/// this function rather than re-deriving the rule.
pub fn store_key(registry_name: &str, value_name: &str) -> String {
    format!("{}_{}", registry_name, value_name).replace(' ', "_")
}

/// A named, ordered collection of value declarations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRegistry {
    /// Configuration ID under which the registry is stored.
    #[serde(default)]
    pub id: String,

    /// Namespace prefix for store keys.
    pub name: String,

    #[serde(default)]
    pub values: Vec<ValueDeclaration>,
}

impl ValueRegistry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Append a declaration, builder style.
    pub fn with_value(mut self, value: ValueDeclaration) -> Self {
        self.values.push(value);
        self
    }

    /// First declaration with the given ID.
    pub fn find_by_id(&self, id: &str) -> Option<&ValueDeclaration> {
        self.values
            .iter()
            .find(|value| value.id.as_deref() == Some(id))
    }

    /// First declaration with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&ValueDeclaration> {
        self.values.iter().find(|value| value.name == name)
    }

    /// Store key of a value in this registry.
    pub fn store_key(&self, value_name: &str) -> String {
        store_key(&self.name, value_name)
    }
}

/// Accepted shapes of a registry file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Wrapped { registries: Vec<ValueRegistry> },
    List(Vec<ValueRegistry>),
    Single(ValueRegistry),
}

impl RegistryFile {
    fn into_registries(self) -> Vec<ValueRegistry> {
        match self {
            RegistryFile::Wrapped { registries } | RegistryFile::List(registries) => registries,
            RegistryFile::Single(registry) => vec![registry],
        }
    }
}

/// Thread-safe store of all registries, keyed by configuration ID.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    registries: Arc<RwLock<BTreeMap<String, ValueRegistry>>>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All registries, ordered by ID.
    pub fn get_all(&self) -> BTreeMap<String, ValueRegistry> {
        self.registries
            .read()
            .map(|registries| registries.clone())
            .unwrap_or_default()
    }

    /// A snapshot of the registry with the given ID.
    pub fn get(&self, id: &str) -> Option<ValueRegistry> {
        self.registries
            .read()
            .ok()
            .and_then(|registries| registries.get(id).cloned())
    }

    /// Insert or replace the registry stored under `id`.
    pub fn save(&self, id: &str, mut registry: ValueRegistry) {
        registry.id = id.to_string();
        if let Ok(mut registries) = self.registries.write() {
            registries.insert(id.to_string(), registry);
        }
    }

    /// Remove a registry. Returns `false` if no registry had that ID.
    pub fn delete(&self, id: &str) -> bool {
        self.registries
            .write()
            .map(|mut registries| registries.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.registries.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load registries from a YAML (or JSON) string.
    ///
    /// Accepts a single registry, a list, or a `registries:` wrapper.
    /// Returns the number of registries stored.
    pub fn load_str(&self, content: &str) -> Result<usize, RegistryError> {
        let file: RegistryFile = serde_yaml::from_str(content)?;
        Ok(self.insert_all(file.into_registries()))
    }

    /// Load registries from a file. `.json` files are parsed as JSON, all
    /// others as YAML.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path.extension().map_or(false, |ext| ext == "json");
        if is_json {
            let file: RegistryFile = serde_json::from_str(&content)?;
            Ok(self.insert_all(file.into_registries()))
        } else {
            self.load_str(&content)
        }
    }

    fn insert_all(&self, registries: Vec<ValueRegistry>) -> usize {
        let count = registries.len();
        for registry in registries {
            if registry.id.is_empty() {
                log::warn!(
                    "Registry '{}' has no ID; storing it under its name",
                    registry.name
                );
                let id = registry.name.clone();
                self.save(&id, registry);
            } else {
                let id = registry.id.clone();
                self.save(&id, registry);
            }
        }
        log::debug!("Loaded {} value registries", count);
        count
    }
}
