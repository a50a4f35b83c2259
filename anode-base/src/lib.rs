//! # anode-base
//!
//! Application glue for the anode container: a sectioned JSON application
//! config, tracing set up from that config, facades over container-resolved
//! services and a one-call bootstrap tying them together.
//!
//! ## Quick Start
//!
//! ```rust
//! use anode::{TypeCatalog, TypeDescriptor};
//! use anode_base::{Config, bootstrap};
//!
//! struct Logger;
//!
//! let config = Config::parse(
//!     r#"
//!     {
//!         "container": {
//!             "aliases": { "log": "Logger" },
//!             "singletons": ["Logger"]
//!         }
//!     }
//!     "#,
//! )?;
//! let types = TypeCatalog::new().with(TypeDescriptor::class("Logger").construct(|_| Ok(Logger)));
//!
//! let container = bootstrap(&config, types)?;
//! assert!(container.get("log")?.ptr_eq(&container.get("Logger")?));
//! # Ok::<(), anode::StdError>(())
//! ```

mod bootstrap;
mod config;
mod facade;
mod logging;

pub use bootstrap::*;
pub use config::*;
pub use facade::*;
pub use logging::*;
