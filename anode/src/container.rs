use dashmap::DashMap;

use crate::configurator::Configurator;
use crate::{
    Binding, Callable, ContainerError, EntryIdentifier, IntersectionResolver, NamedArguments,
    Object, Resolver, TypeCatalog, Value,
};

/// The dependency injection container.
///
/// A `Container` holds four registries (transient entries, cached singletons,
/// aliases and intersection resolvers) on top of a [`TypeCatalog`] describing
/// the types it can autowire. It is created once at startup, owned by the
/// caller and cleared explicitly with [`Container::clear`].
///
/// All operations take `&self` so that factories can re-enter the container
/// while a lookup is in flight. The container performs no synchronization
/// beyond what its maps need: concurrent registration from several threads
/// must be coordinated by the caller.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use anode::{Binding, Container, Parameter, TypeCatalog, TypeDescriptor};
///
/// struct Logger;
/// struct Mailer {
///     logger: Arc<Logger>,
/// }
///
/// let container = Container::new(
///     TypeCatalog::new()
///         .with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)))
///         .with(TypeDescriptor::interface("MailerInterface"))
///         .with(
///             TypeDescriptor::class("Mailer")
///                 .implements("MailerInterface")
///                 .param(Parameter::new("logger").typed("Logger"))
///                 .construct(|args| {
///                     Ok(Mailer {
///                         logger: args.instance("logger")?,
///                     })
///                 }),
///         ),
/// );
///
/// container.singleton("Logger", Binding::SelfReference)?;
/// container.bind("MailerInterface", Binding::redirect("Mailer"))?;
///
/// let mailer = container.get("MailerInterface")?;
/// let logger = container.get("Logger")?;
/// assert_eq!(mailer.class(), "Mailer");
/// assert!(Arc::ptr_eq(
///     &mailer.downcast::<Mailer>().unwrap().logger,
///     &logger.downcast::<Logger>().unwrap(),
/// ));
/// # Ok::<(), anode::ContainerError>(())
/// ```
#[derive(Debug)]
pub struct Container {
    types: TypeCatalog,
    pub(crate) entries: DashMap<String, Binding>,
    pub(crate) singletons: DashMap<String, Object>,
    pub(crate) aliases: DashMap<String, String>,
    pub(crate) intersections: DashMap<Vec<String>, IntersectionResolver>,
}

impl Container {
    /// Creates an empty container able to autowire the types in `types`.
    pub fn new(types: TypeCatalog) -> Self {
        Self {
            types,
            entries: DashMap::new(),
            singletons: DashMap::new(),
            aliases: DashMap::new(),
            intersections: DashMap::new(),
        }
    }

    pub fn types(&self) -> &TypeCatalog {
        &self.types
    }

    /// Starts a new top-level resolution with an empty dependency chain.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }

    /// Resolves `id` into an instance.
    ///
    /// Lookup order: intersection resolvers for intersection identifiers; then
    /// the cached singleton (after alias resolution), the entry binding, the
    /// alias target, and finally autowiring of `id` as a class.
    pub fn get(&self, id: impl Into<EntryIdentifier>) -> Result<Object, ContainerError> {
        self.resolver().get(id)
    }

    /// Registers a transient entry and returns its eagerly resolved value.
    ///
    /// Later lookups of `id` re-evaluate the binding each time.
    pub fn bind(
        &self,
        id: impl Into<EntryIdentifier>,
        binding: Binding,
    ) -> Result<Object, ContainerError> {
        self.resolver().bind(id.into(), binding)
    }

    /// Resolves `binding` once and caches the instance under `id`.
    pub fn singleton(&self, id: &str, binding: Binding) -> Result<Object, ContainerError> {
        self.resolver().singleton(id, binding)
    }

    /// Registers `alias` as a secondary name of the existing type `canonical`.
    ///
    /// Aliases are single-hop: looking up `alias` resolves `canonical` without
    /// consulting the alias table again.
    pub fn alias(&self, alias: &str, canonical: &str) -> Result<(), ContainerError> {
        if alias.is_empty() {
            return Err(ContainerError::EmptyParameter("alias"));
        }
        if canonical.is_empty() {
            return Err(ContainerError::EmptyParameter("canonical"));
        }
        if alias == canonical {
            return Err(ContainerError::Alias {
                alias: alias.to_owned(),
                reason: "an alias cannot point at itself".into(),
            });
        }
        if self.singletons.contains_key(alias) {
            return Err(ContainerError::Alias {
                alias: alias.to_owned(),
                reason: "it is already a singleton".into(),
            });
        }
        if !self.types.exists(canonical) {
            return Err(ContainerError::Alias {
                alias: alias.to_owned(),
                reason: format!("`{canonical}` is not an existing class or interface"),
            });
        }
        self.aliases.insert(alias.to_owned(), canonical.to_owned());
        tracing::debug!(alias = alias, canonical = canonical, "Registered alias");
        Ok(())
    }

    /// Invokes `callable`, autowiring every parameter not present in `arguments`.
    pub fn call(
        &self,
        callable: impl Into<Callable>,
        arguments: NamedArguments,
    ) -> Result<Value, ContainerError> {
        self.resolver().call(callable, arguments)
    }

    /// Applies a configuration to this container.
    pub fn use_configurator(&self, configurator: &Configurator) -> Result<(), ContainerError> {
        configurator.apply(self)
    }

    /// Removes every entry, singleton, alias and intersection resolver.
    pub fn clear(&self) {
        self.entries.clear();
        self.singletons.clear();
        self.aliases.clear();
        self.intersections.clear();
        tracing::debug!("Cleared container");
    }

    /// Returns `true` if `id` has an entry, a singleton or an alias.
    pub fn has(&self, id: &str) -> bool {
        self.has_entry(id) || self.has_singleton(id) || self.has_alias(id)
    }

    pub fn has_entry(&self, id: &str) -> bool {
        self.entries.contains_key(id)
            || self
                .alias_target(id)
                .is_some_and(|v| self.entries.contains_key(&v))
    }

    pub fn has_singleton(&self, id: &str) -> bool {
        self.singletons.contains_key(id)
            || self
                .alias_target(id)
                .is_some_and(|v| self.singletons.contains_key(&v))
    }

    pub fn has_alias(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    pub fn has_intersection_resolver<S>(&self, members: &[S]) -> bool
    where
        S: AsRef<str>,
    {
        let members: Vec<String> = members.iter().map(|v| v.as_ref().to_owned()).collect();
        self.intersections.contains_key(&members)
    }

    pub(crate) fn alias_target(&self, id: &str) -> Option<String> {
        self.aliases.get(id).map(|v| v.value().clone())
    }

    pub(crate) fn cached_singleton(&self, id: &str) -> Option<Object> {
        self.singletons.get(id).map(|v| v.value().clone())
    }

    pub(crate) fn entry(&self, id: &str) -> Option<Binding> {
        self.entries.get(id).map(|v| v.value().clone())
    }

    pub(crate) fn intersection_resolver(&self, members: &[String]) -> Option<Binding> {
        // Exact, ordered member equality: `[A, B]` does not match `[B, A]`.
        self.intersections
            .get(members)
            .map(|v| v.value().resolver().clone())
    }

    /// Checks that a redirect target names a declared type or a registered identifier.
    pub(crate) fn check_target(
        &self,
        target: &str,
        error: impl FnOnce(String) -> ContainerError,
    ) -> Result<(), ContainerError> {
        if target.is_empty() {
            return Err(ContainerError::EmptyParameter("value"));
        }
        if !self.types.exists(target) && !self.has(target) {
            return Err(error(format!(
                "`{target}` is not an existing class, interface or entry"
            )));
        }
        Ok(())
    }
}
