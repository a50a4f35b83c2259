//! # anode
//!
//! A runtime dependency injection container that turns declared type signatures
//! into live instances.
//!
//! ## Core Concepts
//!
//! - **TypeCatalog**: The declared classes, interfaces and functions, with the
//!   constructor and method signatures autowiring inspects
//! - **Container**: The registry of entries, singletons, aliases and
//!   intersection resolvers, and the entry point for every lookup
//! - **Binding**: How an entry produces its value (self-reference, redirect,
//!   factory or pre-built instance)
//! - **Resolver**: The context of one top-level lookup, tracking the dependency
//!   chain for cycle detection
//! - **Configurator**: Declarative bootstrap bindings applied in a fixed order
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use anode::{Binding, Container, Parameter, TypeCatalog, TypeDescriptor};
//!
//! struct Logger;
//!
//! struct UserService {
//!     logger: Arc<Logger>,
//! }
//!
//! let types = TypeCatalog::new()
//!     .with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)))
//!     .with(TypeDescriptor::interface("UserServiceInterface"))
//!     .with(
//!         TypeDescriptor::class("UserService")
//!             .implements("UserServiceInterface")
//!             .param(Parameter::new("logger").typed("Logger"))
//!             .construct(|args| {
//!                 Ok(UserService {
//!                     logger: args.instance("logger")?,
//!                 })
//!             }),
//!     );
//!
//! let container = Container::new(types);
//! container.singleton("Logger", Binding::SelfReference)?;
//! container.bind("UserServiceInterface", Binding::redirect("UserService"))?;
//!
//! let first = container.get("UserServiceInterface")?;
//! let second = container.get("UserServiceInterface")?;
//! assert!(!first.ptr_eq(&second));
//! assert!(Arc::ptr_eq(
//!     &first.downcast::<UserService>().unwrap().logger,
//!     &second.downcast::<UserService>().unwrap().logger,
//! ));
//! # Ok::<(), anode::ContainerError>(())
//! ```
//!
//! ## Calling Functions
//!
//! Any declared function or method can be invoked with some arguments supplied
//! by name and the rest autowired:
//!
//! ```rust
//! use anode::{
//!     Container, FunctionDescriptor, NamedArguments, Parameter, TypeCatalog, TypeDescriptor,
//! };
//!
//! struct Clock;
//!
//! let container = Container::new(
//!     TypeCatalog::new().with(TypeDescriptor::class("Clock").construct(|_| Ok(Clock))),
//! );
//! let greet = FunctionDescriptor::closure(|args| {
//!     args.instance::<Clock>("clock")?;
//!     Ok(format!("Hello, {}", args.data::<String>("name")?).into())
//! })
//! .param(Parameter::new("name").typed("string"))
//! .param(Parameter::new("clock").typed("Clock"));
//!
//! let greeting = container.call(greet, NamedArguments::new().with("name", "world"))?;
//! assert_eq!(greeting.as_data().unwrap(), "Hello, world");
//! # Ok::<(), anode::ContainerError>(())
//! ```

mod annotation;
mod binding;
mod chain;
mod configurator;
mod container;
mod error;
mod identifier;
mod invoke;
mod resolver;
mod types;
mod value;

pub use binding::*;
pub use chain::*;
pub use configurator::{
    ALIASES_SECTION, Configuration, Configurator, ENTRIES_SECTION, SINGLETONS_SECTION,
    TEMPLATING_ENGINE_CAPABILITY, TEMPLATING_ENGINES_SECTION,
};
pub use container::*;
pub use error::*;
pub use identifier::*;
pub use invoke::*;
pub use resolver::*;
pub use types::*;
pub use value::*;
