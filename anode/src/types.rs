//! Declared type signatures used for autowiring.
//!
//! Autowiring needs to know, for every type the container may build, which
//! parameters its constructor takes and how each one is typed. Those signatures
//! are declared up front in a [`TypeCatalog`] and handed to the
//! [`Container`](crate::Container) when it is created.
//!
//! # Examples
//!
//! ```rust
//! use anode::{Parameter, TypeCatalog, TypeDescriptor};
//!
//! struct Logger;
//! struct Mailer {
//!     logger: std::sync::Arc<Logger>,
//! }
//!
//! let types = TypeCatalog::new()
//!     .with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)))
//!     .with(
//!         TypeDescriptor::class("Mailer")
//!             .param(Parameter::new("logger").typed("Logger"))
//!             .construct(|args| {
//!                 Ok(Mailer {
//!                     logger: args.instance("logger")?,
//!                 })
//!             }),
//!     );
//!
//! assert!(types.is_instantiable("Mailer"));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::sync::Arc;

use crate::annotation::annotated_type;
use crate::{Arguments, Object, StdError, Value};

/// Type names that are never resolved through the container.
pub const BUILTIN_TYPES: &[&str] = &[
    "string", "int", "bool", "float", "array", "object", "mixed", "iterable", "callable",
    "resource", "closure", "null", "void", "false", "true", "never", "self", "static",
];

/// Returns `true` if `name` is a builtin type.
pub fn is_builtin(name: &str) -> bool {
    let name = name.trim_start_matches('?');
    BUILTIN_TYPES.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Declared type of a parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeHint {
    /// A single named type, builtin or not.
    Named(String),
    /// Any one of the members; members are named types or nested intersections.
    Union(Vec<TypeHint>),
    /// All of the named types at once.
    Intersection(Vec<String>),
}

impl TypeHint {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn union<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeHint>,
    {
        Self::Union(members.into_iter().map(Into::into).collect())
    }

    pub fn intersection<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Intersection(members.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for TypeHint {
    fn from(value: &str) -> Self {
        Self::Named(value.to_owned())
    }
}

impl From<String> for TypeHint {
    fn from(value: String) -> Self {
        Self::Named(value)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match member {
                        Self::Intersection(_) => write!(f, "({member})")?,
                        _ => write!(f, "{member}")?,
                    }
                }
                Ok(())
            }
            Self::Intersection(members) => f.write_str(&members.join("&")),
        }
    }
}

/// A declared parameter of a constructor, method or function.
#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    hint: Option<TypeHint>,
    default: Option<Value>,
}

impl Parameter {
    /// Creates an untyped parameter without a default value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: None,
            default: None,
        }
    }

    /// Declares the parameter as a single named type.
    pub fn typed(self, name: impl Into<String>) -> Self {
        self.hint(TypeHint::Named(name.into()))
    }

    pub fn union<I>(self, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeHint>,
    {
        self.hint(TypeHint::union(members))
    }

    pub fn intersection<I>(self, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.hint(TypeHint::intersection(members))
    }

    pub fn hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hint(&self) -> Option<&TypeHint> {
        self.hint.as_ref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered parameters plus the doc comment that may annotate them.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<Parameter>,
    doc: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Returns the first non-builtin type annotated for `name` in the doc comment.
    pub fn annotated_type(&self, name: &str) -> Option<String> {
        annotated_type(self.doc.as_deref()?, name)
    }
}

type ConstructFn = Arc<dyn Fn(&Arguments) -> Result<Object, StdError> + Send + Sync>;
type MethodFn = Arc<dyn Fn(Option<&Object>, &Arguments) -> Result<Value, StdError> + Send + Sync>;
type FunctionFn = Arc<dyn Fn(&Arguments) -> Result<Value, StdError> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    AbstractClass,
    Interface,
}

/// Everything the container knows about a declared class or interface.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    parents: Vec<String>,
    signature: Signature,
    construct: Option<ConstructFn>,
    methods: HashMap<String, MethodDescriptor>,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parents: Vec::new(),
            signature: Signature::new(),
            construct: None,
            methods: HashMap::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::AbstractClass)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Declares a parent class.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Declares an implemented (or, for interfaces, extended) interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.parents.push(interface.into());
        self
    }

    /// Appends a constructor parameter.
    pub fn param(mut self, param: Parameter) -> Self {
        self.signature = self.signature.param(param);
        self
    }

    /// Sets the constructor doc comment used for `@param` annotations.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.signature = self.signature.doc(doc);
        self
    }

    /// Sets the constructor body; the built value becomes an instance of this class.
    pub fn construct<T, F>(mut self, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, StdError> + Send + Sync + 'static,
    {
        let class: Arc<str> = Arc::from(self.name.as_str());
        self.construct = Some(Arc::new(
            move |args: &Arguments| -> Result<Object, StdError> {
                Ok(Object::new(class.clone(), build(args)?))
            },
        ));
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Class && self.construct.is_some()
    }

    pub(crate) fn build(&self, args: &Arguments) -> Option<Result<Object, StdError>> {
        self.construct.as_ref().map(|build| build(args))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parents", &self.parents)
            .field("signature", &self.signature)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A method declared on a type, invocable through [`Container::call`](crate::Container::call).
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    is_static: bool,
    signature: Signature,
    body: MethodFn,
}

impl MethodDescriptor {
    /// Declares an instance method; the body receives the target instance.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Option<&Object>, &Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            is_static: false,
            signature: Signature::new(),
            body: Arc::new(body),
        }
    }

    /// Declares a static method; the body never receives an instance.
    pub fn new_static<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            is_static: true,
            signature: Signature::new(),
            body: Arc::new(move |_: Option<&Object>, args: &Arguments| body(args)),
        }
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.signature = self.signature.param(param);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.signature = self.signature.doc(doc);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn invoke(
        &self,
        receiver: Option<&Object>,
        args: &Arguments,
    ) -> Result<Value, StdError> {
        (self.body)(receiver, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A free function or closure value.
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    signature: Signature,
    body: FunctionFn,
}

impl FunctionDescriptor {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Signature::new(),
            body: Arc::new(body),
        }
    }

    /// Declares an anonymous closure.
    pub fn closure<F>(body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, StdError> + Send + Sync + 'static,
    {
        Self::new("{closure}", body)
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.signature = self.signature.param(param);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.signature = self.signature.doc(doc);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn invoke(&self, args: &Arguments) -> Result<Value, StdError> {
        (self.body)(args)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Registry of declared types and free functions.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDescriptor>,
    functions: HashMap<String, FunctionDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a type.
    ///
    /// # Panics
    ///
    /// Panics if a type with the same name has already been declared.
    pub fn add(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        match self.types.entry(descriptor.name.clone()) {
            hash_map::Entry::Occupied(_) => panic!("Type {} already declared", descriptor.name),
            hash_map::Entry::Vacant(v) => {
                v.insert(descriptor);
            }
        };
        self
    }

    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.add(descriptor);
        self
    }

    /// Declares a free function callable by name.
    ///
    /// # Panics
    ///
    /// Panics if a function with the same name has already been declared.
    pub fn add_function(&mut self, function: FunctionDescriptor) -> &mut Self {
        match self.functions.entry(function.name.clone()) {
            hash_map::Entry::Occupied(_) => panic!("Function {} already declared", function.name),
            hash_map::Entry::Vacant(v) => {
                v.insert(function);
            }
        };
        self
    }

    pub fn with_function(mut self, function: FunctionDescriptor) -> Self {
        self.add_function(function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Returns `true` if `name` is a declared class or interface.
    pub fn exists(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn is_instantiable(&self, name: &str) -> bool {
        self.get(name).is_some_and(TypeDescriptor::is_instantiable)
    }

    /// Returns `true` if `name` is `ancestor` or transitively extends or implements it.
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        let mut pending = vec![name];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(descriptor) = self.get(current) {
                pending.extend(descriptor.parents.iter().map(String::as_str));
            }
        }
        false
    }

    /// Finds `method` on `class` or, failing that, on its ancestors.
    pub fn find_method(&self, class: &str, method: &str) -> Option<&MethodDescriptor> {
        let mut pending = vec![class];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            let Some(descriptor) = self.get(current) else {
                continue;
            };
            if let Some(found) = descriptor.methods.get(method) {
                return Some(found);
            }
            pending.extend(descriptor.parents.iter().rev().map(String::as_str));
        }
        None
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }
}
