use std::path::PathBuf;

/// Type alias for boxed errors that can be sent across threads.
///
/// Constructor and method bodies declared in a [`TypeCatalog`](crate::TypeCatalog)
/// report failures with this type; the container wraps them with context.
pub type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by container registration and resolution.
///
/// Resolution errors keep their cause chain: an outer
/// [`ContainerError::AutowiringFailure`] exposes the failure it wraps through
/// [`std::error::Error::source`], so the root cause stays discoverable with
/// [`ContainerError::causes`].
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("Parameter `{0}` must not be empty")]
    EmptyParameter(&'static str),
    #[error("Cannot alias `{alias}`: {reason}")]
    Alias { alias: String, reason: String },
    #[error("Cannot bind `{id}`: {reason}")]
    Binding { id: String, reason: String },
    #[error("Cannot register singleton `{id}`: {reason}")]
    Singleton { id: String, reason: String },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Cannot autowire parameter `${parameter}` of `{target}`: {source}")]
    AutowiringFailure {
        target: String,
        parameter: String,
        #[source]
        source: StdError,
    },
    #[error("Circular reference detected: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
    #[error("No entry found for `{0}`")]
    EntryNotFound(String),
    #[error("Type `{0}` does not exist")]
    UnknownType(String),
    #[error("Type `{0}` is not instantiable")]
    NotInstantiable(String),
    #[error("Parameter `${0}` has no type and no usable annotation")]
    MissingTypeHint(String),
    #[error("Parameter `${parameter}` of builtin type `{ty}` has no default value")]
    BuiltinWithoutDefault { parameter: String, ty: String },
    #[error("None of the union members `{}` could be resolved", .types.join("|"))]
    UnresolvableUnion {
        types: Vec<String>,
        #[source]
        source: Option<StdError>,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Method `{method}` does not exist on `{target}`")]
    BadMethodCall { target: String, method: String },
    #[error("Cannot construct `{class}`: {source}")]
    Construction {
        class: String,
        #[source]
        source: StdError,
    },
    #[error("Call to `{callable}` failed: {source}")]
    Invocation {
        callable: String,
        #[source]
        source: StdError,
    },
}

impl ContainerError {
    /// Returns the container error this one wraps, if any.
    pub fn previous(&self) -> Option<&ContainerError> {
        std::error::Error::source(self)?.downcast_ref::<ContainerError>()
    }

    /// Iterates over this error and every container error it wraps, outermost first.
    pub fn causes(&self) -> impl Iterator<Item = &ContainerError> {
        std::iter::successors(Some(self), |e| e.previous())
    }

    /// Returns the deepest wrapped container error.
    pub fn root_cause(&self) -> &ContainerError {
        self.causes().last().unwrap_or(self)
    }

    /// Returns the dependency chain of a circular reference anywhere in the cause chain.
    pub fn circular_chain(&self) -> Option<&[String]> {
        self.causes().find_map(|e| match e {
            ContainerError::CircularReference { chain } => Some(chain.as_slice()),
            _ => None,
        })
    }

    pub(crate) fn is_circular(&self) -> bool {
        self.circular_chain().is_some()
    }
}

/// Errors raised while loading or validating a container configuration.
///
/// Every violation kind has its own variant so callers and logs can tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Configuration file path is empty")]
    EmptyPath,
    #[error("Configuration file `{}` does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("Configuration file `{}` is not readable: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration file `{}` is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration is empty")]
    Empty,
    #[error("Configuration root must be an object")]
    InvalidRoot,
    #[error("Unknown configuration section `{0}`")]
    UnknownSection(String),
    #[error("Configuration section `{section}` must be {expected}")]
    InvalidSection {
        section: &'static str,
        expected: &'static str,
    },
    #[error("Configuration section `{section}` contains an empty key")]
    EmptyKey { section: &'static str },
    #[error("Configuration section `{section}` requires string keys, got `{key}`")]
    NonStringKey { section: &'static str, key: String },
    #[error("Value of `{key}` in configuration section `{section}` must be a string")]
    NonStringValue { section: &'static str, key: String },
    #[error("Value of `{key}` in configuration section `{section}` is empty")]
    EmptyValue { section: &'static str, key: String },
    #[error(
        "Value `{value}` of `{key}` in configuration section `{section}` is not an existing class or interface"
    )]
    UnknownClass {
        section: &'static str,
        key: String,
        value: String,
    },
    #[error("Singleton `{0}` is also configured as an alias")]
    AliasedSingleton(String),
    #[error("Templating engine `{value}` bound to `{key}` does not implement `{capability}`")]
    NotTemplatingEngine {
        key: String,
        value: String,
        capability: String,
    },
}
