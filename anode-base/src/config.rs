use std::collections::BTreeMap;
use std::path::Path;

use anode::{Configuration, StdError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Sectioned JSON application configuration.
///
/// Each top-level key holds one section: `container` for the
/// [`Configuration`] applied at bootstrap, `tracing` for
/// [`TracingConfig`](crate::TracingConfig), plus whatever the application adds.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    sections: BTreeMap<String, serde_json::Value>,
}

/// A typed section of [`Config`] stored under a fixed key.
pub trait ConfigSection: DeserializeOwned {
    fn key() -> &'static str;
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T>(&self, name: impl AsRef<str>) -> Result<T, StdError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(
            self.sections
                .get(name.as_ref())
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )?)
    }

    /// Returns the typed section, or `None` if its key is absent.
    pub fn section<T>(&self) -> Result<Option<T>, StdError>
    where
        T: ConfigSection,
    {
        match self.sections.get(T::key()) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn set<T>(&mut self, name: impl Into<String>, value: T) -> Result<(), StdError>
    where
        T: Serialize,
    {
        self.sections
            .insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Builder form of [`Config::set`].
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be represented as JSON.
    pub fn with<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Serialize,
    {
        self.sections
            .insert(name.into(), serde_json::to_value(value).unwrap());
        self
    }

    /// Merges `other` into this config.
    ///
    /// Objects are merged key by key, arrays are concatenated and any other
    /// value is replaced.
    pub fn merge_from(&mut self, other: Self) {
        for (key, value) in other.sections {
            merge_value(
                self.sections.entry(key).or_insert(serde_json::Value::Null),
                value,
            );
        }
    }

    pub fn parse<T>(text: T) -> Result<Self, StdError>
    where
        T: AsRef<str>,
    {
        Ok(serde_json::from_str(text.as_ref())?)
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, StdError> {
        let path = path.as_ref();
        tracing::debug!(path = ?path, "Reading config");
        let text = std::fs::read_to_string(path)?;
        Self::parse(text)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

impl ConfigSection for Configuration {
    fn key() -> &'static str {
        "container"
    }
}

fn merge_value(target: &mut serde_json::Value, source: serde_json::Value) {
    match (target, source) {
        (serde_json::Value::Object(target), serde_json::Value::Object(source)) => {
            for (key, value) in source {
                merge_value(target.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (serde_json::Value::Array(target), serde_json::Value::Array(source)) => {
            target.extend(source);
        }
        (target, source) => *target = source,
    }
}
