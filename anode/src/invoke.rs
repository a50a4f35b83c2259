use std::fmt;

use crate::{
    ContainerError, FunctionDescriptor, MethodDescriptor, NamedArguments, Object, Resolver, Value,
};

/// Something [`Container::call`](crate::Container::call) can invoke.
#[derive(Clone)]
pub enum Callable {
    /// A closure or function value.
    Function(FunctionDescriptor),
    /// `"Type::method"` (static), `"Type@method"` (instance, resolving `Type`
    /// through the container) or the name of a declared free function.
    Named(String),
    /// An explicit instance and method name.
    Method { target: Object, method: String },
    /// An explicit class and static method name.
    StaticMethod { class: String, method: String },
}

impl Callable {
    pub fn method(target: Object, method: impl Into<String>) -> Self {
        Self::Method {
            target,
            method: method.into(),
        }
    }

    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::StaticMethod {
            class: class.into(),
            method: method.into(),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(function) => f.debug_tuple("Function").field(&function.name()).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Method { target, method } => f
                .debug_struct("Method")
                .field("target", target)
                .field("method", method)
                .finish(),
            Self::StaticMethod { class, method } => f
                .debug_struct("StaticMethod")
                .field("class", class)
                .field("method", method)
                .finish(),
        }
    }
}

impl From<FunctionDescriptor> for Callable {
    fn from(value: FunctionDescriptor) -> Self {
        Self::Function(value)
    }
}

impl From<&str> for Callable {
    fn from(value: &str) -> Self {
        Self::Named(value.to_owned())
    }
}

impl From<String> for Callable {
    fn from(value: String) -> Self {
        Self::Named(value)
    }
}

impl<M> From<(Object, M)> for Callable
where
    M: Into<String>,
{
    fn from((target, method): (Object, M)) -> Self {
        Self::method(target, method)
    }
}

impl Resolver<'_> {
    /// Invokes `callable` within the current resolution.
    ///
    /// Values in `arguments` are passed as-is and never re-resolved; every other
    /// parameter is autowired. The bootstrap configuration lookup never applies
    /// to calls.
    pub fn call(
        &mut self,
        callable: impl Into<Callable>,
        arguments: NamedArguments,
    ) -> Result<Value, ContainerError> {
        arguments.ensure_named()?;
        match callable.into() {
            Callable::Function(function) => self.invoke_function(&function, &arguments),
            Callable::Named(name) => self.call_named(&name, &arguments),
            Callable::Method { target, method } => self.invoke_method(target, &method, &arguments),
            Callable::StaticMethod { class, method } => {
                self.invoke_static(&class, &method, &arguments)
            }
        }
    }

    fn call_named(&mut self, name: &str, arguments: &NamedArguments) -> Result<Value, ContainerError> {
        if let Some((class, method)) = name.split_once("::") {
            check_callable_parts(name, class, method)?;
            return self.invoke_static(class, method, arguments);
        }
        if let Some((class, method)) = name.split_once('@') {
            check_callable_parts(name, class, method)?;
            let target = self.get(class)?;
            return self.invoke_method(target, method, arguments);
        }
        let container = self.container();
        match container.types().function(name) {
            Some(function) => self.invoke_function(function, arguments),
            None => Err(ContainerError::InvalidArgument(format!(
                "`{name}` is neither `Type::method`, `Type@method` nor a declared function"
            ))),
        }
    }

    fn invoke_function(
        &mut self,
        function: &FunctionDescriptor,
        arguments: &NamedArguments,
    ) -> Result<Value, ContainerError> {
        tracing::trace!(function = function.name(), "Calling function");
        let args =
            self.resolve_arguments(function.name(), function.signature(), Some(arguments), false)?;
        function
            .invoke(&args)
            .map_err(|source| ContainerError::Invocation {
                callable: function.name().to_owned(),
                source,
            })
    }

    fn invoke_static(
        &mut self,
        class: &str,
        method: &str,
        arguments: &NamedArguments,
    ) -> Result<Value, ContainerError> {
        let container = self.container();
        if !container.types().exists(class) {
            return Err(ContainerError::UnknownType(class.to_owned()));
        }
        let descriptor = container
            .types()
            .find_method(class, method)
            .filter(|v| v.is_static())
            .ok_or_else(|| ContainerError::BadMethodCall {
                target: class.to_owned(),
                method: method.to_owned(),
            })?;
        self.invoke(None, &format!("{class}::{method}"), descriptor, arguments)
    }

    fn invoke_method(
        &mut self,
        target: Object,
        method: &str,
        arguments: &NamedArguments,
    ) -> Result<Value, ContainerError> {
        let container = self.container();
        let descriptor = container
            .types()
            .find_method(target.class(), method)
            .ok_or_else(|| ContainerError::BadMethodCall {
                target: target.class().to_owned(),
                method: method.to_owned(),
            })?;
        let label = format!("{}@{method}", target.class());
        self.invoke(Some(&target), &label, descriptor, arguments)
    }

    fn invoke(
        &mut self,
        receiver: Option<&Object>,
        label: &str,
        method: &MethodDescriptor,
        arguments: &NamedArguments,
    ) -> Result<Value, ContainerError> {
        tracing::trace!(method = label, "Calling method");
        let args = self.resolve_arguments(label, method.signature(), Some(arguments), false)?;
        method
            .invoke(receiver, &args)
            .map_err(|source| ContainerError::Invocation {
                callable: label.to_owned(),
                source,
            })
    }
}

fn check_callable_parts(name: &str, class: &str, method: &str) -> Result<(), ContainerError> {
    if class.is_empty() || method.is_empty() {
        return Err(ContainerError::InvalidArgument(format!(
            "`{name}` does not name both a type and a method"
        )));
    }
    Ok(())
}
