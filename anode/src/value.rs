use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::{ContainerError, StdError};

/// A constructed instance owned by the container.
///
/// An `Object` pairs the concrete class name it was built as with a shared,
/// type-erased value. Cloning an `Object` shares the same underlying instance,
/// so identity can be checked with [`Object::ptr_eq`].
#[derive(Clone)]
pub struct Object {
    class: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Wraps `value` as an instance of `class`.
    pub fn new<T>(class: impl Into<Arc<str>>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::from_arc(class, Arc::new(value))
    }

    /// Wraps an already shared value as an instance of `class`.
    pub fn from_arc<T>(class: impl Into<Arc<str>>, value: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            class: class.into(),
            inner: value,
        }
    }

    /// Returns the concrete class name this instance was built as.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the typed shared value if the instance holds a `T`.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.inner.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.inner.downcast_ref::<T>()
    }

    /// Returns `true` if both objects share the same underlying instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// A value flowing through parameter resolution.
///
/// Resolved dependencies are objects; defaults and user-supplied arguments may
/// also be plain data.
#[derive(Clone, Debug)]
pub enum Value {
    Object(Object),
    Data(serde_json::Value),
}

impl Value {
    pub fn null() -> Self {
        Self::Data(serde_json::Value::Null)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(v) => Some(v),
            Self::Data(_) => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Self::Object(v) => Some(v),
            Self::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(v) => Some(v),
            Self::Object(_) => None,
        }
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Data(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Data(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Data(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Data(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Data(value.into())
    }
}

/// Resolved arguments handed to constructors and method bodies, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the object passed as `name`.
    pub fn object(&self, name: &str) -> Result<&Object, StdError> {
        match self.get(name) {
            Some(Value::Object(v)) => Ok(v),
            Some(Value::Data(_)) => Err(format!("Argument `{name}` is not an object").into()),
            None => Err(format!("Missing argument `{name}`").into()),
        }
    }

    /// Returns the typed instance passed as `name`.
    pub fn instance<T>(&self, name: &str) -> Result<Arc<T>, StdError>
    where
        T: Any + Send + Sync,
    {
        let object = self.object(name)?;
        object.downcast::<T>().ok_or_else(|| {
            format!(
                "Argument `{name}` of class `{}` is not a {}",
                object.class(),
                type_name::<T>()
            )
            .into()
        })
    }

    /// Deserializes the data passed as `name`.
    pub fn data<T>(&self, name: &str) -> Result<T, StdError>
    where
        T: DeserializeOwned,
    {
        match self.get(name) {
            Some(Value::Data(v)) => Ok(serde_json::from_value(v.clone())?),
            Some(Value::Object(_)) => Err(format!("Argument `{name}` is an object").into()),
            None => Err(format!("Missing argument `{name}`").into()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// User-supplied arguments for [`Container::call`](crate::Container::call), keyed by
/// parameter name.
///
/// Supplied values always win over autowiring. Keys must be parameter names:
/// positional (integer) keys are rejected when the call is made.
#[derive(Clone, Debug, Default)]
pub struct NamedArguments {
    values: IndexMap<String, Value>,
}

impl NamedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds named arguments from a JSON object.
    ///
    /// Arrays and other non-object values are positional and are rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ContainerError> {
        match value {
            serde_json::Value::Object(map) => {
                let arguments = Self {
                    values: map.into_iter().map(|(k, v)| (k, Value::Data(v))).collect(),
                };
                arguments.ensure_named()?;
                Ok(arguments)
            }
            serde_json::Value::Null => Ok(Self::new()),
            _ => Err(ContainerError::InvalidArgument(
                "Call arguments must be a map of parameter names to values".into(),
            )),
        }
    }

    pub(crate) fn ensure_named(&self) -> Result<(), ContainerError> {
        for name in self.values.keys() {
            if name.is_empty() || name.parse::<i64>().is_ok() {
                return Err(ContainerError::InvalidArgument(format!(
                    "Call arguments must be keyed by parameter name, got positional key `{name}`"
                )));
            }
        }
        Ok(())
    }
}
