//! Declarative bootstrap configuration.
//!
//! A [`Configuration`] holds up to four sections, applied to a container in a
//! fixed order because later sections may reference identifiers registered by
//! earlier ones:
//!
//! 1. `aliases`: alias name to existing class or interface;
//! 2. `templating_engines`: alias name to a class implementing the templating
//!    engine capability, registered as a singleton and aliased;
//! 3. `singletons`: identifier to class (or pre-built instance), resolved once;
//! 4. `entries`: identifier to class, resolved on every lookup.
//!
//! In JSON, a `singletons` or `entries` section may also be an array, or use
//! integer keys, to declare self-bindings:
//!
//! ```json
//! {
//!     "aliases": { "logger": "App\\Logger" },
//!     "singletons": ["App\\Logger"],
//!     "entries": { "App\\MailerInterface": "App\\SmtpMailer" }
//! }
//! ```
//!
//! The whole configuration is validated against the container's
//! [`TypeCatalog`](crate::TypeCatalog) before anything is registered; the
//! first violation aborts the call.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::{Binding, ConfigurationError, Container, ContainerError, Resolver, TypeCatalog};

pub const ALIASES_SECTION: &str = "aliases";
pub const TEMPLATING_ENGINES_SECTION: &str = "templating_engines";
pub const SINGLETONS_SECTION: &str = "singletons";
pub const ENTRIES_SECTION: &str = "entries";

/// Interface a templating engine binding must implement by default.
pub const TEMPLATING_ENGINE_CAPABILITY: &str = "TemplatingEngine";

#[derive(Clone, Debug, Default)]
pub struct Configuration {
    aliases: Option<IndexMap<String, String>>,
    templating_engines: Option<IndexMap<String, String>>,
    singletons: Option<IndexMap<String, Binding>>,
    entries: Option<IndexMap<String, Binding>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases
            .get_or_insert_default()
            .insert(alias.into(), canonical.into());
        self
    }

    pub fn templating_engine(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.templating_engines
            .get_or_insert_default()
            .insert(name.into(), class.into());
        self
    }

    pub fn singleton(mut self, id: impl Into<String>, binding: Binding) -> Self {
        self.singletons
            .get_or_insert_default()
            .insert(id.into(), binding);
        self
    }

    pub fn entry(mut self, id: impl Into<String>, binding: Binding) -> Self {
        self.entries.get_or_insert_default().insert(id.into(), binding);
        self
    }

    pub fn aliases(&self) -> Option<&IndexMap<String, String>> {
        self.aliases.as_ref()
    }

    pub fn templating_engines(&self) -> Option<&IndexMap<String, String>> {
        self.templating_engines.as_ref()
    }

    pub fn singletons(&self) -> Option<&IndexMap<String, Binding>> {
        self.singletons.as_ref()
    }

    pub fn entries(&self) -> Option<&IndexMap<String, Binding>> {
        self.entries.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_none()
            && self.templating_engines.is_none()
            && self.singletons.is_none()
            && self.entries.is_none()
    }

    /// Parses a configuration from a JSON value, checking its shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigurationError> {
        let serde_json::Value::Object(sections) = value else {
            return Err(ConfigurationError::InvalidRoot);
        };
        if sections.is_empty() {
            return Err(ConfigurationError::Empty);
        }
        let mut configuration = Self::new();
        for (key, section) in sections {
            match key.as_str() {
                ALIASES_SECTION => {
                    configuration.aliases = Some(parse_string_map(ALIASES_SECTION, section)?);
                }
                TEMPLATING_ENGINES_SECTION => {
                    configuration.templating_engines =
                        Some(parse_string_map(TEMPLATING_ENGINES_SECTION, section)?);
                }
                SINGLETONS_SECTION => {
                    configuration.singletons = Some(parse_binding_map(SINGLETONS_SECTION, section)?);
                }
                ENTRIES_SECTION => {
                    configuration.entries = Some(parse_binding_map(ENTRIES_SECTION, section)?);
                }
                _ => return Err(ConfigurationError::UnknownSection(key)),
            }
        }
        Ok(configuration)
    }

    /// Parses a configuration from JSON text.
    pub fn parse(text: impl AsRef<str>) -> Result<Self, ConfigurationError> {
        Self::parse_at(Path::new(""), text.as_ref())
    }

    fn parse_at(path: &Path, text: &str) -> Result<Self, ConfigurationError> {
        if text.trim().is_empty() {
            return Err(ConfigurationError::Empty);
        }
        let value = serde_json::from_str(text).map_err(|source| ConfigurationError::Parse {
            path: path.to_owned(),
            source,
        })?;
        Self::from_value(value)
    }

    /// Reads and parses a JSON configuration file.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigurationError::EmptyPath);
        }
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound(path.to_owned()));
        }
        tracing::debug!(path = ?path, "Reading container configuration");
        let text = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = ?path, error = %source, "Failed to read container configuration");
            ConfigurationError::Unreadable {
                path: path.to_owned(),
                source,
            }
        })?;
        Self::parse_at(path, &text)
    }

    /// Checks every section against `types`, in application order.
    pub fn validate(&self, types: &TypeCatalog, capability: &str) -> Result<(), ConfigurationError> {
        if self.is_empty() {
            return Err(ConfigurationError::Empty);
        }
        for (alias, canonical) in self.aliases.iter().flatten() {
            check_class(types, ALIASES_SECTION, alias, canonical)?;
        }
        for (name, class) in self.templating_engines.iter().flatten() {
            check_class(types, TEMPLATING_ENGINES_SECTION, name, class)?;
            if !types.is_subtype(class, capability) {
                return Err(ConfigurationError::NotTemplatingEngine {
                    key: name.clone(),
                    value: class.clone(),
                    capability: capability.to_owned(),
                });
            }
        }
        for (id, binding) in self.singletons.iter().flatten() {
            check_binding(types, SINGLETONS_SECTION, id, binding)?;
            if self.is_alias(id) {
                return Err(ConfigurationError::AliasedSingleton(id.clone()));
            }
        }
        for (id, binding) in self.entries.iter().flatten() {
            check_binding(types, ENTRIES_SECTION, id, binding)?;
        }
        Ok(())
    }
}

impl Configuration {
    /// Returns `true` if applying this configuration registers `id` as an alias.
    fn is_alias(&self, id: &str) -> bool {
        self.aliases.iter().flatten().any(|(alias, _)| alias == id)
            || self
                .templating_engines
                .iter()
                .flatten()
                .any(|(name, class)| name == id && name != class)
    }
}

impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(Error::custom)
    }
}

fn is_positional(key: &str) -> bool {
    key.parse::<u64>().is_ok()
}

fn parse_string_map(
    section: &'static str,
    value: serde_json::Value,
) -> Result<IndexMap<String, String>, ConfigurationError> {
    let serde_json::Value::Object(map) = value else {
        return Err(ConfigurationError::InvalidSection {
            section,
            expected: "an object of strings",
        });
    };
    let mut result = IndexMap::with_capacity(map.len());
    for (key, value) in map {
        if key.is_empty() {
            return Err(ConfigurationError::EmptyKey { section });
        }
        if is_positional(&key) {
            return Err(ConfigurationError::NonStringKey { section, key });
        }
        let serde_json::Value::String(value) = value else {
            return Err(ConfigurationError::NonStringValue { section, key });
        };
        if value.is_empty() {
            return Err(ConfigurationError::EmptyValue { section, key });
        }
        result.insert(key, value);
    }
    Ok(result)
}

fn parse_binding_map(
    section: &'static str,
    value: serde_json::Value,
) -> Result<IndexMap<String, Binding>, ConfigurationError> {
    let entries: Vec<(Option<String>, serde_json::Value)> = match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| ((!is_positional(&k)).then_some(k), v))
            .collect(),
        serde_json::Value::Array(list) => list.into_iter().map(|v| (None, v)).collect(),
        _ => {
            return Err(ConfigurationError::InvalidSection {
                section,
                expected: "an object or an array of strings",
            });
        }
    };
    let mut result = IndexMap::with_capacity(entries.len());
    for (index, (key, value)) in entries.into_iter().enumerate() {
        let label = key.clone().unwrap_or_else(|| index.to_string());
        if key.as_deref() == Some("") {
            return Err(ConfigurationError::EmptyKey { section });
        }
        let serde_json::Value::String(value) = value else {
            return Err(ConfigurationError::NonStringValue {
                section,
                key: label,
            });
        };
        if value.is_empty() {
            return Err(ConfigurationError::EmptyValue {
                section,
                key: label,
            });
        }
        match key {
            Some(key) => {
                let binding = Binding::Redirect(value).normalize(&key);
                result.insert(key, binding);
            }
            None => {
                result.insert(value, Binding::SelfReference);
            }
        }
    }
    Ok(result)
}

fn check_class(
    types: &TypeCatalog,
    section: &'static str,
    key: &str,
    value: &str,
) -> Result<(), ConfigurationError> {
    if key.is_empty() {
        return Err(ConfigurationError::EmptyKey { section });
    }
    if value.is_empty() {
        return Err(ConfigurationError::EmptyValue {
            section,
            key: key.to_owned(),
        });
    }
    if !types.exists(value) {
        return Err(ConfigurationError::UnknownClass {
            section,
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }
    Ok(())
}

fn check_binding(
    types: &TypeCatalog,
    section: &'static str,
    id: &str,
    binding: &Binding,
) -> Result<(), ConfigurationError> {
    match binding {
        Binding::SelfReference => check_class(types, section, id, id),
        Binding::Redirect(target) => check_class(types, section, id, target),
        Binding::Factory(_) | Binding::Instance(_) if id.is_empty() => {
            Err(ConfigurationError::EmptyKey { section })
        }
        Binding::Factory(_) | Binding::Instance(_) => Ok(()),
    }
}

/// Applies a [`Configuration`] to a container.
///
/// # Examples
///
/// ```rust
/// use anode::{Configurator, Container, TypeCatalog, TypeDescriptor};
///
/// struct Logger;
///
/// let container = Container::new(
///     TypeCatalog::new().with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger))),
/// );
/// let configurator = Configurator::from_value(serde_json::json!({
///     "aliases": { "log": "Logger" },
///     "singletons": ["Logger"],
/// }))?;
/// container.use_configurator(&configurator)?;
///
/// assert!(container.get("log")?.ptr_eq(&container.get("Logger")?));
/// # Ok::<(), anode::ContainerError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Configurator {
    configuration: Configuration,
    capability: String,
}

impl Configurator {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            capability: TEMPLATING_ENGINE_CAPABILITY.to_owned(),
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigurationError> {
        Ok(Self::new(Configuration::from_value(value)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        Ok(Self::new(Configuration::parse_file(path)?))
    }

    /// Overrides the interface templating engine bindings must implement.
    pub fn with_templating_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = capability.into();
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub(crate) fn apply(&self, container: &Container) -> Result<(), ContainerError> {
        self.configuration
            .validate(container.types(), &self.capability)?;
        let configuration = &self.configuration;
        let bootstrap = Bootstrap::new(configuration);
        let mut resolver = Resolver::bootstrapping(container, &bootstrap);
        for (alias, canonical) in configuration.aliases.iter().flatten() {
            container.alias(alias, canonical)?;
        }
        for (name, class) in configuration.templating_engines.iter().flatten() {
            if !container.has_singleton(class) {
                resolver.singleton(class, Binding::SelfReference)?;
            }
            bootstrap.mark_materialized(class);
            if name != class {
                container.alias(name, class)?;
            }
            tracing::debug!(name = %name, class = %class, "Registered templating engine");
        }
        for (id, binding) in configuration.singletons.iter().flatten() {
            if bootstrap.is_materialized(id) {
                continue;
            }
            resolver.singleton(id, binding.clone())?;
        }
        for (id, binding) in configuration.entries.iter().flatten() {
            resolver.bind(id.into(), binding.clone())?;
        }
        tracing::debug!("Applied container configuration");
        Ok(())
    }
}

/// Configuration tables visible to autowiring while a configuration is applied.
pub(crate) struct Bootstrap<'a> {
    configuration: &'a Configuration,
    materialized: RefCell<HashSet<String>>,
}

impl<'a> Bootstrap<'a> {
    fn new(configuration: &'a Configuration) -> Self {
        Self {
            configuration,
            materialized: RefCell::default(),
        }
    }

    pub(crate) fn singleton(&self, id: &str) -> Option<&'a Binding> {
        self.configuration.singletons.as_ref()?.get(id)
    }

    pub(crate) fn entry(&self, id: &str) -> Option<&'a Binding> {
        self.configuration.entries.as_ref()?.get(id)
    }

    /// Records a configured singleton that was created ahead of its section.
    pub(crate) fn mark_materialized(&self, id: &str) {
        self.materialized.borrow_mut().insert(id.to_owned());
    }

    fn is_materialized(&self, id: &str) -> bool {
        self.materialized.borrow().contains(id)
    }
}

