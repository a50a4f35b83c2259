//! Static-style proxies over container-resolved instances.
//!
//! A [`Facade`] names an implementor identifier and the methods it exposes.
//! Every invocation resolves the implementor through the container, so the
//! facade follows whatever binding, singleton or alias is registered for it.
//!
//! # Examples
//!
//! ```rust
//! use anode::{
//!     Container, MethodDescriptor, NamedArguments, Parameter, TypeCatalog, TypeDescriptor,
//! };
//! use anode_base::{AllowedMethods, Facade};
//!
//! let container = Container::new(TypeCatalog::new().with(
//!     TypeDescriptor::class("Cache").construct(|_| Ok(())).method(
//!         MethodDescriptor::new("get", |_, args| {
//!             Ok(format!("cached:{}", args.data::<String>("key")?).into())
//!         })
//!         .param(Parameter::new("key").typed("string")),
//!     ),
//! ));
//! let cache = Facade::new("Cache", AllowedMethods::only(["get"]));
//!
//! let value = cache.invoke(&container, "get", NamedArguments::new().with("key", "a"))?;
//! assert_eq!(value.as_data().unwrap(), "cached:a");
//! assert!(cache.invoke(&container, "clear", NamedArguments::new()).is_err());
//! # Ok::<(), anode::ContainerError>(())
//! ```

use std::collections::BTreeSet;

use anode::{Callable, Container, ContainerError, NamedArguments, Value};
use serde::{Deserialize, Deserializer};

/// Methods a [`Facade`] forwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedMethods {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl AllowedMethods {
    pub fn only<I>(methods: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Only(methods.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, method: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(methods) => methods.contains(method),
        }
    }
}

/// Deserializes from `"*"` or from a list of method names.
impl<'de> Deserialize<'de> for AllowedMethods {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Wildcard(String),
            Methods(Vec<String>),
        }

        use serde::de::Error;
        match Repr::deserialize(deserializer)? {
            Repr::Wildcard(v) if v == "*" => Ok(Self::All),
            Repr::Wildcard(v) => Err(Error::custom(format!(
                "expected \"*\" or a list of method names, got {v:?}"
            ))),
            Repr::Methods(methods) => Ok(Self::only(methods)),
        }
    }
}

/// Forwards method calls to the instance the container resolves for `implementor`.
#[derive(Clone, Debug, Deserialize)]
pub struct Facade {
    implementor: String,
    #[serde(default)]
    allowed: AllowedMethods,
}

impl Facade {
    pub fn new(implementor: impl Into<String>, allowed: AllowedMethods) -> Self {
        Self {
            implementor: implementor.into(),
            allowed,
        }
    }

    pub fn implementor(&self) -> &str {
        &self.implementor
    }

    pub fn allowed(&self) -> &AllowedMethods {
        &self.allowed
    }

    /// Resolves the implementor and calls `method` on it.
    ///
    /// Methods outside the allow-list fail with
    /// [`ContainerError::BadMethodCall`] without being invoked.
    pub fn invoke(
        &self,
        container: &Container,
        method: &str,
        arguments: NamedArguments,
    ) -> Result<Value, ContainerError> {
        let target = container.get(self.implementor.as_str())?;
        if !self.allowed.allows(method) {
            tracing::debug!(
                implementor = %self.implementor,
                method = method,
                "Rejected facade call"
            );
            return Err(ContainerError::BadMethodCall {
                target: self.implementor.clone(),
                method: method.to_owned(),
            });
        }
        container.call(Callable::method(target, method), arguments)
    }
}
