// src/registry.rs

//! Domain type registry and the parameter checker entry point
//!
//! A [`TypeRegistry`] bundles the two lookup tables the checker runs on:
//! parameter name → expected spec, and spec → coercion function. It is
//! built once at startup and never mutated afterwards, so a single
//! instance can be shared freely across threads. Tests assemble minimal
//! registries with the builder methods instead of touching global state.

use crate::coerce::{self, CoercionFn};
use crate::error::{Result, TypeError};
use crate::matcher::is_of_type;
use crate::typespec::{Requirements, TypeSpec};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Mapping with exactly the keys `name` and `version`, both strings
pub static NAME_VERSION: LazyLock<TypeSpec> = LazyLock::new(|| {
    TypeSpec::mapping(
        Requirements::new()
            .required_keys(["name", "version"])
            .opt_keys(std::iter::empty::<&str>())
            .value_types([TypeSpec::STR]),
    )
});

/// Dependency descriptor: `name`/`version` plus optional `versionsuffix`
/// and `toolchain`
pub static DEPENDENCY: LazyLock<TypeSpec> = LazyLock::new(|| {
    TypeSpec::mapping(
        Requirements::new()
            .required_keys(["name", "version"])
            .opt_keys(["versionsuffix", "toolchain"]),
    )
});

/// Ordered list of dependency descriptors
pub static DEPENDENCIES: LazyLock<TypeSpec> =
    LazyLock::new(|| TypeSpec::sequence(Requirements::new().value_types([DEPENDENCY.clone()])));

/// Immutable lookup tables driving the checker
#[derive(Debug, Default)]
pub struct TypeRegistry {
    parameters: HashMap<String, TypeSpec>,
    coercions: HashMap<TypeSpec, CoercionFn>,
}

impl TypeRegistry {
    /// Empty registry; every parameter check is skipped
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry matching the stock recipe format
    pub fn builtin() -> Self {
        Self::new()
            .with_parameter("dependencies", DEPENDENCIES.clone())
            .with_parameter("name", TypeSpec::STR)
            .with_parameter("toolchain", NAME_VERSION.clone())
            .with_parameter("version", TypeSpec::STR)
            .with_coercion(TypeSpec::STR, coerce::string)
            .with_coercion(TypeSpec::INT, coerce::integer)
            .with_coercion(TypeSpec::FLOAT, coerce::float)
            .with_coercion(NAME_VERSION.clone(), coerce::name_version)
            .with_coercion(DEPENDENCIES.clone(), coerce::dependencies)
    }

    /// Declare the expected spec for a parameter name
    pub fn with_parameter(mut self, name: impl Into<String>, expected: TypeSpec) -> Self {
        self.parameters.insert(name.into(), expected);
        self
    }

    /// Register a coercion function for a target spec
    pub fn with_coercion(mut self, target: TypeSpec, func: CoercionFn) -> Self {
        self.coercions.insert(target, func);
        self
    }

    /// Expected spec for `name`, if one is declared
    pub fn parameter_type(&self, name: &str) -> Option<&TypeSpec> {
        self.parameters.get(name)
    }

    /// Convert `value` to `target`
    ///
    /// Already-conforming values pass through unchanged. Otherwise the
    /// registered coercion runs and its result is verified against the
    /// target; a raw coercion failure and a verification mismatch are
    /// reported as distinct errors.
    pub fn convert(&self, value: &Value, target: &TypeSpec) -> Result<Value> {
        if let TypeSpec::Atomic(tag) = target {
            if value.tag() == *tag {
                debug!(%target, "value already has the target shape");
                return Ok(value.clone());
            }
        } else if is_of_type(value, target)? {
            debug!(%target, "value already satisfies the target spec");
            return Ok(value.clone());
        }

        let Some(func) = self.coercions.get(target) else {
            return Err(TypeError::NoCoercion {
                target: target.clone(),
            });
        };

        debug!(value = %value.summary(), %target, "attempting coercion");
        let converted = func(value).map_err(|cause| TypeError::CoercionFailed {
            value: value.summary(),
            found: value.tag(),
            target: target.clone(),
            cause: Box::new(cause),
        })?;

        let conforming = match target {
            TypeSpec::Atomic(tag) => converted.tag() == *tag,
            compound => is_of_type(&converted, compound)?,
        };
        if !conforming {
            return Err(TypeError::CoercionMismatch {
                value: value.summary(),
                target: target.clone(),
                got: converted.tag(),
            });
        }
        Ok(converted)
    }

    /// Check a named parameter value, optionally coercing it
    ///
    /// A parameter without a declared spec always passes unchanged. A
    /// declared parameter that fails the matcher returns `(false, None)`
    /// when `auto_convert` is off; with `auto_convert` the conversion
    /// result is returned, and a conversion failure propagates as a hard
    /// error since the caller asked for a usable value.
    pub fn check(
        &self,
        name: &str,
        value: &Value,
        auto_convert: bool,
    ) -> Result<(bool, Option<Value>)> {
        let Some(expected) = self.parameters.get(name) else {
            debug!(parameter = name, "no expected type declared, skipping check");
            return Ok((true, Some(value.clone())));
        };

        if is_of_type(value, expected)? {
            debug!(parameter = name, "value type check passed");
            return Ok((true, Some(value.clone())));
        }

        if auto_convert {
            debug!(
                parameter = name,
                expected = %expected,
                "type check failed, attempting conversion"
            );
            let converted = self.convert(value, expected)?;
            Ok((true, Some(converted)))
        } else {
            debug!(
                parameter = name,
                expected = %expected,
                "type check failed, auto-conversion disabled"
            );
            Ok((false, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv(name: &str, version: &str) -> Value {
        Value::map([("name", name.into()), ("version", version.into())])
    }

    #[test]
    fn test_builtin_parameter_table() {
        let registry = TypeRegistry::builtin();
        assert_eq!(registry.parameter_type("name"), Some(&TypeSpec::STR));
        assert_eq!(registry.parameter_type("version"), Some(&TypeSpec::STR));
        assert_eq!(registry.parameter_type("toolchain"), Some(&*NAME_VERSION));
        assert_eq!(registry.parameter_type("dependencies"), Some(&*DEPENDENCIES));
        assert_eq!(registry.parameter_type("homepage"), None);
    }

    #[test]
    fn test_convert_identity_fast_paths() {
        let registry = TypeRegistry::builtin();
        let name = Value::from("gzip");
        assert_eq!(registry.convert(&name, &TypeSpec::STR).unwrap(), name);

        let toolchain = nv("GCC", "4.8.2");
        assert_eq!(registry.convert(&toolchain, &NAME_VERSION).unwrap(), toolchain);
    }

    #[test]
    fn test_convert_atomic_cast() {
        let registry = TypeRegistry::builtin();
        assert_eq!(
            registry.convert(&Value::Int(42), &TypeSpec::STR).unwrap(),
            Value::from("42")
        );
        assert_eq!(
            registry.convert(&"4.5".into(), &TypeSpec::FLOAT).unwrap(),
            Value::Float(4.5)
        );
    }

    #[test]
    fn test_convert_without_registered_coercion() {
        let registry = TypeRegistry::builtin();
        // a lone descriptor has no registered coercion
        let dep = Value::map([("zlib", "1.2.8".into())]);
        assert!(matches!(
            registry.convert(&dep, &DEPENDENCY),
            Err(TypeError::NoCoercion { .. })
        ));
    }

    #[test]
    fn test_convert_failure_carries_cause() {
        let registry = TypeRegistry::builtin();
        let err = registry
            .convert(&"gcc".into(), &NAME_VERSION)
            .unwrap_err();
        let TypeError::CoercionFailed { cause, .. } = err else {
            panic!("expected CoercionFailed, got {err:?}");
        };
        assert!(matches!(*cause, TypeError::AmbiguousShape { .. }));
    }

    #[test]
    fn test_convert_verifies_result() {
        let registry = TypeRegistry::builtin();
        // the mapping passes the name/version coercion untouched, but its
        // integer version then fails the value_types verification
        let pair = Value::map([("name", "gcc".into()), ("version", Value::Int(4))]);
        assert!(matches!(
            registry.convert(&pair, &NAME_VERSION),
            Err(TypeError::CoercionMismatch { .. })
        ));
    }

    #[test]
    fn test_check_skips_undeclared_parameters() {
        let registry = TypeRegistry::builtin();
        let (ok, out) = registry.check("homepage", &Value::Int(42), false).unwrap();
        assert!(ok);
        assert_eq!(out, Some(Value::Int(42)));
    }

    #[test]
    fn test_check_without_auto_convert() {
        let registry = TypeRegistry::builtin();
        let (ok, out) = registry
            .check("toolchain", &"intel, 2015a".into(), false)
            .unwrap();
        assert!(!ok);
        assert_eq!(out, None);
    }

    #[test]
    fn test_check_with_auto_convert() {
        let registry = TypeRegistry::builtin();
        let (ok, out) = registry
            .check("toolchain", &"intel, 2015a".into(), true)
            .unwrap();
        assert!(ok);
        assert_eq!(out, Some(nv("intel", "2015a")));
    }

    #[test]
    fn test_check_conversion_failure_is_a_hard_error() {
        let registry = TypeRegistry::builtin();
        assert!(registry.check("toolchain", &"gcc".into(), true).is_err());
    }

    #[test]
    fn test_isolated_registry_checks_only_what_it_declares() {
        let registry = TypeRegistry::new()
            .with_parameter("jobs", TypeSpec::INT)
            .with_coercion(TypeSpec::INT, coerce::integer);

        let (ok, out) = registry.check("jobs", &"16".into(), true).unwrap();
        assert!(ok);
        assert_eq!(out, Some(Value::Int(16)));

        // builtin parameters mean nothing to this registry
        let (ok, _) = registry.check("dependencies", &Value::Int(0), false).unwrap();
        assert!(ok);
    }
}
