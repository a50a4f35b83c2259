//! The resolution engine.
//!
//! A [`Resolver`] is the context of one top-level lookup: it owns the
//! [`DependencyChain`] and, while a configuration is being applied, the
//! bootstrap tables. Every recursive lookup made while satisfying parameters
//! goes through the same resolver so cycles are detected across the whole
//! call tree.
//!
//! Parameters are resolved in declaration order. For each one the strategies
//! are tried in a fixed priority:
//!
//! 1. bootstrap configuration lookup (only while a configuration is applied and
//!    the parameter declares exactly one named, non-builtin type);
//! 2. no declared type: the `@param` annotation in the signature doc comment;
//! 3. union type: the first member that resolves;
//! 4. intersection type: the intersection resolver registered for the members;
//! 5. named, non-builtin type: a recursive lookup;
//! 6. named builtin type: the declared default.
//!
//! Any failure of 2-6 falls back to the declared default value when there is
//! one, and otherwise is wrapped in [`ContainerError::AutowiringFailure`].
//!
//! Circular references are the one exception to that fallback: a
//! [`ContainerError::CircularReference`] is never replaced by a default and
//! ends a union scan at the member that raised it, so the cycle always
//! surfaces with its full chain.

use crate::configurator::Bootstrap;
use crate::types::is_builtin;
use crate::{
    Arguments, Binding, Container, ContainerError, DependencyChain, EntryIdentifier,
    IntersectionResolver, NamedArguments, Object, Parameter, Signature, StdError, TypeHint, Value,
};

pub struct Resolver<'c> {
    container: &'c Container,
    chain: DependencyChain,
    bootstrap: Option<&'c Bootstrap<'c>>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            chain: DependencyChain::new(),
            bootstrap: None,
        }
    }

    pub(crate) fn bootstrapping(container: &'c Container, bootstrap: &'c Bootstrap<'c>) -> Self {
        Self {
            container,
            chain: DependencyChain::new(),
            bootstrap: Some(bootstrap),
        }
    }

    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Identifiers currently being resolved, outermost first.
    pub fn chain(&self) -> &DependencyChain {
        &self.chain
    }

    /// Returns `true` while a configuration is being applied.
    pub fn is_bootstrapping(&self) -> bool {
        self.bootstrap.is_some()
    }

    /// Resolves `id` within the current resolution.
    pub fn get(&mut self, id: impl Into<EntryIdentifier>) -> Result<Object, ContainerError> {
        match id.into() {
            EntryIdentifier::Single(id) => self.resolve(&id, true),
            EntryIdentifier::Intersection(members) => self.resolve_intersection(&members),
        }
    }

    fn resolve(&mut self, id: &str, follow_alias: bool) -> Result<Object, ContainerError> {
        if id.is_empty() {
            return Err(ContainerError::EmptyParameter("id"));
        }
        self.chain.push(id)?;
        let result = self.lookup(id, follow_alias);
        self.chain.pop();
        result
    }

    fn lookup(&mut self, id: &str, follow_alias: bool) -> Result<Object, ContainerError> {
        let container = self.container;
        let alias = if follow_alias {
            container.alias_target(id)
        } else {
            None
        };
        let canonical = alias.as_deref().unwrap_or(id);
        if let Some(object) = container.cached_singleton(canonical) {
            tracing::trace!(id = id, "Resolved cached singleton");
            return Ok(object);
        }
        if let Some(binding) = container.entry(id) {
            tracing::trace!(id = id, binding = ?binding, "Resolving entry");
            return self.resolve_binding(id, &binding);
        }
        if let Some(canonical) = alias {
            tracing::trace!(id = id, canonical = %canonical, "Resolving alias");
            return self.resolve(&canonical, false);
        }
        self.autowire(id)
    }

    fn resolve_binding(&mut self, id: &str, binding: &Binding) -> Result<Object, ContainerError> {
        match binding {
            Binding::SelfReference => self.autowire(id),
            Binding::Redirect(target) if target == id => self.autowire(id),
            Binding::Redirect(target) => self.resolve(target, true),
            Binding::Factory(factory) => factory(self),
            Binding::Instance(object) => Ok(object.clone()),
        }
    }

    /// Resolves `binding` for `id` with `id` tracked on the chain.
    fn resolve_tracked(&mut self, id: &str, binding: &Binding) -> Result<Object, ContainerError> {
        self.chain.push(id)?;
        let result = self.resolve_binding(id, binding);
        self.chain.pop();
        result
    }

    pub(crate) fn resolve_intersection(
        &mut self,
        members: &[String],
    ) -> Result<Object, ContainerError> {
        let id = members.join("&");
        let binding = self
            .container
            .intersection_resolver(members)
            .ok_or_else(|| ContainerError::EntryNotFound(id.clone()))?;
        tracing::trace!(id = %id, "Resolving intersection");
        self.chain.push(&id)?;
        let result = match &binding {
            Binding::Redirect(target) => self.resolve(target, true),
            Binding::Factory(factory) => factory(self),
            Binding::Instance(object) => Ok(object.clone()),
            Binding::SelfReference => Err(ContainerError::NotInstantiable(id.clone())),
        };
        self.chain.pop();
        result
    }

    fn autowire(&mut self, class: &str) -> Result<Object, ContainerError> {
        let container = self.container;
        let descriptor = container
            .types()
            .get(class)
            .ok_or_else(|| ContainerError::UnknownType(class.to_owned()))?;
        if !descriptor.is_instantiable() {
            return Err(ContainerError::NotInstantiable(class.to_owned()));
        }
        tracing::trace!(class = class, "Autowiring");
        let args =
            self.resolve_arguments(class, descriptor.signature(), None, self.is_bootstrapping())?;
        match descriptor.build(&args) {
            Some(Ok(object)) => Ok(object),
            Some(Err(source)) => Err(ContainerError::Construction {
                class: class.to_owned(),
                source,
            }),
            None => Err(ContainerError::NotInstantiable(class.to_owned())),
        }
    }

    /// Resolves every parameter of `signature`, preferring `supplied` values.
    pub(crate) fn resolve_arguments(
        &mut self,
        target: &str,
        signature: &Signature,
        supplied: Option<&NamedArguments>,
        allow_bootstrap: bool,
    ) -> Result<Arguments, ContainerError> {
        let mut args = Arguments::new();
        for param in signature.params() {
            if let Some(value) = supplied.and_then(|v| v.get(param.name())) {
                args.push(param.name(), value.clone());
                continue;
            }
            match self.resolve_parameter(param, signature, allow_bootstrap) {
                Ok(value) => args.push(param.name(), value),
                Err(err) if err.is_circular() => return Err(autowiring_failure(target, param, err)),
                Err(err) => match param.default() {
                    Some(default) => {
                        tracing::warn!(
                            target = target,
                            parameter = param.name(),
                            error = %err,
                            "Falling back to default value"
                        );
                        args.push(param.name(), default.clone());
                    }
                    None => return Err(autowiring_failure(target, param, err)),
                },
            }
        }
        Ok(args)
    }

    fn resolve_parameter(
        &mut self,
        param: &Parameter,
        signature: &Signature,
        allow_bootstrap: bool,
    ) -> Result<Value, ContainerError> {
        if allow_bootstrap
            && let Some(TypeHint::Named(ty)) = param.type_hint()
            && !is_builtin(ty)
            && let Some(object) = self.resolve_from_bootstrap(ty)?
        {
            return Ok(object.into());
        }
        match param.type_hint() {
            None => match signature.annotated_type(param.name()) {
                Some(ty) => self.resolve(&ty, true).map(Value::from),
                None => param
                    .default()
                    .cloned()
                    .ok_or_else(|| ContainerError::MissingTypeHint(param.name().to_owned())),
            },
            Some(TypeHint::Union(members)) => self.resolve_union(members).map(Value::from),
            Some(TypeHint::Intersection(members)) => {
                self.resolve_intersection(members).map(Value::from)
            }
            Some(TypeHint::Named(ty)) if !is_builtin(ty) => self.resolve(ty, true).map(Value::from),
            Some(TypeHint::Named(ty)) => {
                param
                    .default()
                    .cloned()
                    .ok_or_else(|| ContainerError::BuiltinWithoutDefault {
                        parameter: param.name().to_owned(),
                        ty: ty.clone(),
                    })
            }
        }
    }

    fn resolve_union(&mut self, members: &[TypeHint]) -> Result<Object, ContainerError> {
        let mut last_error = None;
        for member in members {
            let result = match member {
                TypeHint::Named(ty) if is_builtin(ty) || !self.is_resolvable(ty) => continue,
                TypeHint::Named(ty) => self.resolve(ty, true),
                TypeHint::Intersection(types) => self.resolve_intersection(types),
                TypeHint::Union(nested) => self.resolve_union(nested),
            };
            match result {
                Ok(object) => return Ok(object),
                Err(err) if err.is_circular() => return Err(err),
                Err(err) => {
                    tracing::trace!(member = %member, error = %err, "Union member not resolvable");
                    last_error = Some(err);
                }
            }
        }
        Err(ContainerError::UnresolvableUnion {
            types: members.iter().map(ToString::to_string).collect(),
            source: last_error.map(|e| Box::new(e) as StdError),
        })
    }

    fn is_resolvable(&self, ty: &str) -> bool {
        self.container.types().exists(ty) || self.container.has(ty)
    }

    /// Resolves `ty` from the configuration being applied, registering it on the way.
    fn resolve_from_bootstrap(&mut self, ty: &str) -> Result<Option<Object>, ContainerError> {
        let Some(bootstrap) = self.bootstrap else {
            return Ok(None);
        };
        if let Some(binding) = bootstrap.singleton(ty) {
            if let Some(object) = self.container.cached_singleton(ty) {
                bootstrap.mark_materialized(ty);
                return Ok(Some(object));
            }
            tracing::debug!(id = ty, "Registering configured singleton ahead of order");
            let object = self.singleton(ty, binding.clone())?;
            bootstrap.mark_materialized(ty);
            return Ok(Some(object));
        }
        if let Some(binding) = bootstrap.entry(ty) {
            tracing::debug!(id = ty, "Registering configured entry ahead of order");
            return self.bind(ty.into(), binding.clone()).map(Some);
        }
        Ok(None)
    }

    /// Registers a transient entry and eagerly resolves it.
    ///
    /// If the eager resolution fails the previous registration for the
    /// identifier is restored.
    pub(crate) fn bind(
        &mut self,
        id: EntryIdentifier,
        binding: Binding,
    ) -> Result<Object, ContainerError> {
        match id {
            EntryIdentifier::Single(id) => self.bind_single(id, binding),
            EntryIdentifier::Intersection(members) => self.bind_intersection(members, binding),
        }
    }

    fn bind_single(&mut self, id: String, binding: Binding) -> Result<Object, ContainerError> {
        if id.is_empty() {
            return Err(ContainerError::EmptyParameter("id"));
        }
        let container = self.container;
        let binding = binding.normalize(&id);
        match &binding {
            Binding::SelfReference if !container.types().exists(&id) => {
                return Err(ContainerError::Binding {
                    reason: "it is not an existing class or interface".into(),
                    id,
                });
            }
            Binding::Redirect(target) => container.check_target(target, |reason| {
                ContainerError::Binding {
                    id: id.clone(),
                    reason,
                }
            })?,
            _ => {}
        }
        let previous = container.entries.insert(id.clone(), binding.clone());
        tracing::debug!(id = %id, binding = ?binding, "Registered entry");
        self.resolve_tracked(&id, &binding).inspect_err(|_| {
            match previous {
                Some(previous) => container.entries.insert(id.clone(), previous),
                None => container.entries.remove(&id).map(|(_, v)| v),
            };
        })
    }

    fn bind_intersection(
        &mut self,
        members: Vec<String>,
        binding: Binding,
    ) -> Result<Object, ContainerError> {
        if members.is_empty() || members.iter().any(String::is_empty) {
            return Err(ContainerError::EmptyParameter("id"));
        }
        let container = self.container;
        let id = members.join("&");
        if let Some(member) = members.iter().find(|v| !container.types().exists(v)) {
            return Err(ContainerError::Binding {
                reason: format!("`{member}` is not an existing class or interface"),
                id,
            });
        }
        match &binding {
            Binding::SelfReference => {
                return Err(ContainerError::Binding {
                    id,
                    reason: "an intersection requires a redirect, factory or instance".into(),
                });
            }
            Binding::Redirect(target) => container.check_target(target, |reason| {
                ContainerError::Binding {
                    id: id.clone(),
                    reason,
                }
            })?,
            _ => {}
        }
        let previous = container.intersections.insert(
            members.clone(),
            IntersectionResolver::new(members.clone(), binding),
        );
        tracing::debug!(id = %id, "Registered intersection resolver");
        self.resolve_intersection(&members).inspect_err(|_| {
            match previous {
                Some(previous) => container.intersections.insert(members.clone(), previous),
                None => container.intersections.remove(&members).map(|(_, v)| v),
            };
        })
    }

    /// Resolves `binding` for `id` and caches the instance for the container's lifetime.
    pub(crate) fn singleton(&mut self, id: &str, binding: Binding) -> Result<Object, ContainerError> {
        if id.is_empty() {
            return Err(ContainerError::EmptyParameter("id"));
        }
        let container = self.container;
        if container.has_alias(id) {
            return Err(ContainerError::Singleton {
                id: id.to_owned(),
                reason: "it is already an alias".into(),
            });
        }
        let binding = binding.normalize(id);
        match &binding {
            Binding::SelfReference if !container.types().exists(id) => {
                return Err(ContainerError::Singleton {
                    id: id.to_owned(),
                    reason: "it is not an existing class or interface".into(),
                });
            }
            Binding::Redirect(target) => container.check_target(target, |reason| {
                ContainerError::Singleton {
                    id: id.to_owned(),
                    reason,
                }
            })?,
            _ => {}
        }
        let object = match binding {
            Binding::Instance(object) => object,
            binding => self.resolve_tracked(id, &binding)?,
        };
        container.singletons.insert(id.to_owned(), object.clone());
        tracing::debug!(id = id, class = object.class(), "Registered singleton");
        Ok(object)
    }
}

fn autowiring_failure(target: &str, param: &Parameter, err: ContainerError) -> ContainerError {
    ContainerError::AutowiringFailure {
        target: target.to_owned(),
        parameter: param.name().to_owned(),
        source: Box::new(err),
    }
}
