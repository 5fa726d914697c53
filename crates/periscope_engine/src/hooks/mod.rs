//! Extension hook machinery.
//!
//! # Design Principles
//!
//! - Hooks execute in registration order, finish functions included
//! - Each DidStart hook receives the context returned by the previous one
//! - No fault raised by extension code unwinds past this module
//!
//! # Architecture
//!
//! - **Phases** ([`phase`]): Labels used to attribute faults
//! - **Invoker** ([`invoker`]): The fault barrier around every hook call
//! - **Registry** ([`registry`]): Ordered extensions and per-stage fan-out
//!
//! # Example
//!
//! ```
//! use periscope_context::Context;
//! use periscope_engine::extension::Extension;
//! use periscope_engine::hooks::{ExtensionRegistry, Stage};
//!
//! struct Noop;
//!
//! impl Extension for Noop {
//!     fn name(&self) -> &str {
//!         "noop"
//!     }
//! }
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register(Noop);
//!
//! let start = registry.did_start(Stage::Validation, &Context::new(), |ext, ctx| {
//!     ext.validation_did_start(ctx)
//! });
//! assert!(start.errors.is_empty());
//! assert!(start.pending.finish_all(|finish| finish(&[])).is_empty());
//! ```

pub mod invoker;
pub mod phase;
pub mod registry;

pub use invoker::{invoke, panic_message};
pub use phase::{Phase, Stage};
pub use registry::{ExtensionRegistry, PendingFinishes, StageStart};
