use std::fmt;
use std::sync::Arc;

use crate::{ContainerError, Object, Resolver};

/// Factory invoked with the in-flight [`Resolver`] to produce an instance.
pub type FactoryFn = Arc<dyn Fn(&mut Resolver<'_>) -> Result<Object, ContainerError> + Send + Sync>;

/// How a container entry produces its value.
#[derive(Clone)]
pub enum Binding {
    /// Autowire the identifier as its own concrete type.
    SelfReference,
    /// Resolve another identifier instead.
    Redirect(String),
    /// Invoke a factory with the resolver.
    Factory(FactoryFn),
    /// Return a pre-built instance.
    Instance(Object),
}

impl Binding {
    pub fn redirect(target: impl Into<String>) -> Self {
        Self::Redirect(target.into())
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> Result<Object, ContainerError> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    pub fn instance(object: Object) -> Self {
        Self::Instance(object)
    }

    /// Normalizes a redirect pointing back at `id` into a self-reference.
    pub(crate) fn normalize(self, id: &str) -> Self {
        match self {
            Self::Redirect(target) if target == id => Self::SelfReference,
            other => other,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReference => f.write_str("SelfReference"),
            Self::Redirect(target) => f.debug_tuple("Redirect").field(target).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Instance(object) => f.debug_tuple("Instance").field(object).finish(),
        }
    }
}

impl From<Object> for Binding {
    fn from(value: Object) -> Self {
        Self::Instance(value)
    }
}

/// Resolver registered for an ordered intersection of types.
#[derive(Clone, Debug)]
pub struct IntersectionResolver {
    members: Vec<String>,
    resolver: Binding,
}

impl IntersectionResolver {
    pub(crate) fn new(members: Vec<String>, resolver: Binding) -> Self {
        Self { members, resolver }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn resolver(&self) -> &Binding {
        &self.resolver
    }
}
