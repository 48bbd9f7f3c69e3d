// src/coerce.rs

//! Best-effort coercions to the canonical domain shapes
//!
//! Recipe authors write dependencies and toolchains in several short-hand
//! forms: a comma-separated string, a positional list, or a mapping keyed
//! by the package name. The functions here normalize those forms into the
//! canonical `{name, version, ...}` mappings the rest of the build
//! pipeline consumes. A coercion either fully succeeds or fails; it never
//! returns a partially-normalized structure.

use crate::error::{Result, TypeError};
use crate::value::Value;
use indexmap::IndexMap;
use tracing::debug;

/// A registered coercion from an arbitrary input shape to one target shape
pub type CoercionFn = fn(&Value) -> Result<Value>;

/// Normalize a toolchain-style value into a `{name, version}` mapping
///
/// Accepted inputs:
/// - a comma-separated two-field string: `"intel, 2015a"`
/// - a two-element list of strings: `["intel", "2015a"]`
/// - a mapping whose key set is exactly `{name, version}` (passed through)
///
/// Fields are trimmed of surrounding whitespace. Anything else, including
/// tuples and lists of other lengths, is ambiguous.
pub fn name_version(value: &Value) -> Result<Value> {
    match value {
        Value::Str(s) => {
            let fields: Vec<&str> = s.split(',').collect();
            name_version_from_fields(value, &fields)
        }
        Value::List(items) => {
            let mut fields = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Str(s) => fields.push(s.as_str()),
                    other => {
                        return Err(TypeError::AmbiguousShape {
                            value: value.summary(),
                            reason: format!(
                                "name/version list elements must be strings, found {}",
                                other.tag()
                            ),
                        });
                    }
                }
            }
            name_version_from_fields(value, &fields)
        }
        Value::Map(map) => {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            if keys == ["name", "version"] {
                Ok(value.clone())
            } else {
                Err(TypeError::AmbiguousShape {
                    value: value.summary(),
                    reason: "mapping must have exactly the keys name and version".to_string(),
                })
            }
        }
        other => Err(TypeError::AmbiguousShape {
            value: other.summary(),
            reason: format!("cannot derive a name/version pair from a {}", other.tag()),
        }),
    }
}

fn name_version_from_fields(original: &Value, fields: &[&str]) -> Result<Value> {
    if fields.len() != 2 {
        return Err(TypeError::AmbiguousShape {
            value: original.summary(),
            reason: format!("expected exactly 2 fields, found {}", fields.len()),
        });
    }
    Ok(Value::map([
        ("name", fields[0].trim().into()),
        ("version", fields[1].trim().into()),
    ]))
}

/// Normalize one dependency into a canonical descriptor mapping
///
/// Mapping inputs are folded in insertion order: `name`, `version` and
/// `versionsuffix` copy verbatim, `toolchain` goes through
/// [`name_version`], and one free key may stand in for `name = key,
/// version = value`. Positional inputs (list or tuple) carry 2 to 4
/// fields: name, version, versionsuffix, toolchain.
pub fn dependency(value: &Value) -> Result<Value> {
    match value {
        Value::Map(map) => {
            let mut dep: IndexMap<String, Value> = IndexMap::new();
            let mut named = false;
            for (key, entry) in map {
                match key.as_str() {
                    "name" | "version" | "versionsuffix" => {
                        dep.insert(key.clone(), entry.clone());
                    }
                    "toolchain" => {
                        dep.insert("toolchain".to_string(), name_version(entry)?);
                    }
                    free if !named => {
                        debug!(key = free, "interpreting free key as name/version");
                        dep.insert("name".to_string(), Value::Str(free.to_string()));
                        dep.insert("version".to_string(), entry.clone());
                    }
                    unexpected => {
                        return Err(TypeError::AmbiguousShape {
                            value: value.summary(),
                            reason: format!(
                                "unexpected key {unexpected:?} after name and version were already determined"
                            ),
                        });
                    }
                }
                named = dep.contains_key("name") && dep.contains_key("version");
            }
            if !named {
                return Err(TypeError::AmbiguousShape {
                    value: value.summary(),
                    reason: "dependency mapping does not determine both a name and a version"
                        .to_string(),
                });
            }
            Ok(Value::Map(dep))
        }
        Value::List(items) | Value::Tuple(items) => {
            if !(2..=4).contains(&items.len()) {
                return Err(TypeError::AmbiguousShape {
                    value: value.summary(),
                    reason: format!(
                        "positional dependency needs 2 to 4 fields, found {}",
                        items.len()
                    ),
                });
            }
            let mut dep: IndexMap<String, Value> = IndexMap::new();
            dep.insert("name".to_string(), items[0].clone());
            dep.insert("version".to_string(), items[1].clone());
            if let Some(suffix) = items.get(2) {
                dep.insert("versionsuffix".to_string(), suffix.clone());
            }
            if let Some(toolchain) = items.get(3) {
                dep.insert("toolchain".to_string(), toolchain.clone());
            }
            Ok(Value::Map(dep))
        }
        other => Err(TypeError::AmbiguousShape {
            value: other.summary(),
            reason: format!("cannot interpret a {} as a dependency", other.tag()),
        }),
    }
}

/// Normalize a sequence of dependencies, preserving length and order
///
/// Order matters: reverse-dependency reporting downstream relies on
/// positional correspondence with the original recipe.
pub fn dependencies(value: &Value) -> Result<Value> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let mut deps = Vec::with_capacity(items.len());
            for item in items {
                deps.push(dependency(item)?);
            }
            Ok(Value::List(deps))
        }
        other => Err(TypeError::AmbiguousShape {
            value: other.summary(),
            reason: format!("dependency list must be a sequence, found {}", other.tag()),
        }),
    }
}

/// Scalar-to-string cast
pub fn string(value: &Value) -> Result<Value> {
    match value {
        Value::Str(_) => Ok(value.clone()),
        Value::Int(i) => Ok(Value::Str(i.to_string())),
        Value::Float(x) => Ok(Value::Str(x.to_string())),
        other => Err(TypeError::AmbiguousShape {
            value: other.summary(),
            reason: format!("only scalars coerce to a string, found {}", other.tag()),
        }),
    }
}

/// Scalar-to-integer cast; floats truncate toward zero
pub fn integer(value: &Value) -> Result<Value> {
    match value {
        Value::Int(_) => Ok(value.clone()),
        Value::Float(x) => Ok(Value::Int(*x as i64)),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            TypeError::AmbiguousShape {
                value: value.summary(),
                reason: "not an integer literal".to_string(),
            }
        }),
        other => Err(TypeError::AmbiguousShape {
            value: other.summary(),
            reason: format!("only scalars coerce to an integer, found {}", other.tag()),
        }),
    }
}

/// Scalar-to-float cast
pub fn float(value: &Value) -> Result<Value> {
    match value {
        Value::Float(_) => Ok(value.clone()),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            TypeError::AmbiguousShape {
                value: value.summary(),
                reason: "not a float literal".to_string(),
            }
        }),
        other => Err(TypeError::AmbiguousShape {
            value: other.summary(),
            reason: format!("only scalars coerce to a float, found {}", other.tag()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv(name: &str, version: &str) -> Value {
        Value::map([("name", name.into()), ("version", version.into())])
    }

    #[test]
    fn test_name_version_from_string() {
        assert_eq!(
            name_version(&"intel, 2015a".into()).unwrap(),
            nv("intel", "2015a")
        );
        // no space after the comma, leading/trailing whitespace
        assert_eq!(
            name_version(&"  GCC,4.8.2 ".into()).unwrap(),
            nv("GCC", "4.8.2")
        );
    }

    #[test]
    fn test_name_version_from_list() {
        let pair = Value::list(["gcc".into(), " 4.8.2".into()]);
        assert_eq!(name_version(&pair).unwrap(), nv("gcc", "4.8.2"));
    }

    #[test]
    fn test_name_version_passes_conforming_mapping_through() {
        let pair = nv("gcc", "4.8.2");
        assert_eq!(name_version(&pair).unwrap(), pair);
    }

    #[test]
    fn test_name_version_ambiguous_shapes() {
        // three comma-separated fields
        assert!(name_version(&"a, b, c".into()).is_err());
        // one-element list
        assert!(name_version(&Value::list(["gcc".into()])).is_err());
        // tuples are not accepted
        assert!(name_version(&Value::tuple(["gcc".into(), "4.8".into()])).is_err());
        // mapping with a foreign key
        let bad = Value::map([
            ("name", "x".into()),
            ("version", "1".into()),
            ("arch", "x86".into()),
        ]);
        assert!(name_version(&bad).is_err());
        // scalar that is not a string
        assert!(name_version(&Value::Int(42)).is_err());
    }

    #[test]
    fn test_dependency_from_free_key_mapping() {
        let dep = Value::map([
            ("foo", "1.2.3".into()),
            ("toolchain", "GCC, 4.8.2".into()),
        ]);
        let expected = Value::map([
            ("name", "foo".into()),
            ("version", "1.2.3".into()),
            ("toolchain", nv("GCC", "4.8.2")),
        ]);
        assert_eq!(dependency(&dep).unwrap(), expected);
    }

    #[test]
    fn test_dependency_from_explicit_mapping() {
        let dep = Value::map([
            ("name", "zlib".into()),
            ("version", "1.2.8".into()),
            ("versionsuffix", "-static".into()),
        ]);
        assert_eq!(dependency(&dep).unwrap(), dep);
    }

    #[test]
    fn test_dependency_second_free_key_is_ambiguous() {
        let dep = Value::map([("foo", "1.0".into()), ("bar", "2.0".into())]);
        assert!(matches!(
            dependency(&dep),
            Err(TypeError::AmbiguousShape { .. })
        ));
    }

    #[test]
    fn test_dependency_free_key_overwrites_partial_name() {
        // a free key seen before name+version are both determined wins;
        // the earlier lone name is overwritten by the fold
        let dep = Value::map([("name", "x".into()), ("foo", "1.0".into())]);
        assert_eq!(dependency(&dep).unwrap(), nv("foo", "1.0"));
    }

    #[test]
    fn test_dependency_mapping_without_version_is_ambiguous() {
        let dep = Value::map([("name", "zlib".into())]);
        assert!(dependency(&dep).is_err());
    }

    #[test]
    fn test_dependency_positional_forms() {
        let two = Value::tuple(["zlib".into(), "1.2.8".into()]);
        assert_eq!(dependency(&two).unwrap(), nv("zlib", "1.2.8"));

        let three = Value::list(["zlib".into(), "1.2.8".into(), "-static".into()]);
        let expected = Value::map([
            ("name", "zlib".into()),
            ("version", "1.2.8".into()),
            ("versionsuffix", "-static".into()),
        ]);
        assert_eq!(dependency(&three).unwrap(), expected);

        // the positional toolchain field is carried verbatim
        let four = Value::tuple([
            "zlib".into(),
            "1.2.8".into(),
            "".into(),
            "GCC, 4.8.2".into(),
        ]);
        let result = dependency(&four).unwrap();
        let map = result.as_map().unwrap();
        assert_eq!(map["toolchain"], Value::from("GCC, 4.8.2"));
    }

    #[test]
    fn test_dependency_positional_length_bounds() {
        assert!(dependency(&Value::list(["zlib".into()])).is_err());
        let five = Value::list([
            "a".into(),
            "b".into(),
            "c".into(),
            "d".into(),
            "e".into(),
        ]);
        assert!(dependency(&five).is_err());
    }

    #[test]
    fn test_dependencies_preserve_order() {
        let input = Value::list([
            Value::map([("zlib", "1.2.8".into())]),
            Value::tuple(["gcc".into(), "4.8.2".into()]),
            Value::map([("binutils", "2.25".into())]),
        ]);
        let result = dependencies(&input).unwrap();
        let Value::List(deps) = &result else {
            panic!("expected a list, got {result}");
        };
        assert_eq!(deps.len(), 3);
        let names: Vec<&str> = deps
            .iter()
            .map(|dep| dep.as_map().unwrap()["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["zlib", "gcc", "binutils"]);
    }

    #[test]
    fn test_dependencies_fail_as_a_whole() {
        let input = Value::list([
            Value::map([("zlib", "1.2.8".into())]),
            Value::from("not-a-dependency"),
        ]);
        assert!(dependencies(&input).is_err());
    }

    #[test]
    fn test_scalar_casts() {
        assert_eq!(string(&Value::Int(42)).unwrap(), Value::from("42"));
        assert_eq!(integer(&" 42 ".into()).unwrap(), Value::Int(42));
        assert_eq!(integer(&Value::Float(3.9)).unwrap(), Value::Int(3));
        assert_eq!(float(&"4.5".into()).unwrap(), Value::Float(4.5));
        assert_eq!(float(&Value::Int(2)).unwrap(), Value::Float(2.0));

        assert!(integer(&"4.5".into()).is_err());
        assert!(integer(&"gcc".into()).is_err());
        assert!(string(&Value::list(["a".into()])).is_err());
    }
}
