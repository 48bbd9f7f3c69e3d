// src/lib.rs

//! Type checking and coercion for build recipe parameters
//!
//! Recipe files declare loosely-typed parameter values; this crate is the
//! engine that classifies already-deserialized values against declared
//! shapes and, on request, coerces short-hand forms (comma-separated
//! strings, positional lists, partially-keyed mappings) into their
//! canonical structures. It owns no file format: parsing recipes and
//! reporting aggregated failures stay with the caller.
//!
//! # Architecture
//!
//! - [`Value`]: dynamic value tree handed over by the recipe loader
//! - [`TypeSpec`]: atomic or compound expected shape, usable as a
//!   registry key
//! - [`is_of_type`]: recursive structural matcher
//! - [`coerce`]: best-effort normalization to the canonical shapes
//! - [`TypeRegistry`]: immutable parameter and coercion tables, with
//!   [`TypeRegistry::check`] as the per-parameter entry point
//!
//! ```
//! use paramcheck::{TypeRegistry, Value};
//!
//! let registry = TypeRegistry::builtin();
//! let (ok, toolchain) = registry.check("toolchain", &Value::from("intel, 2015a"), true)?;
//! assert!(ok);
//! assert_eq!(
//!     toolchain,
//!     Some(Value::map([("name", "intel".into()), ("version", "2015a".into())])),
//! );
//! # Ok::<(), paramcheck::TypeError>(())
//! ```

pub mod coerce;
mod error;
pub mod matcher;
pub mod registry;
pub mod typespec;
pub mod value;

pub use coerce::CoercionFn;
pub use error::{Result, TypeError};
pub use matcher::{MAX_VALUE_DEPTH, is_of_type};
pub use registry::{DEPENDENCIES, DEPENDENCY, NAME_VERSION, TypeRegistry};
pub use typespec::{CompoundSpec, ReqKind, ReqValue, Requirements, TypeSpec};
pub use value::{TypeTag, Value};
