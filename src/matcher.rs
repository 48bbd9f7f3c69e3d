// src/matcher.rs

//! Recursive structural matching of values against type specs
//!
//! `Ok(false)` is an ordinary mismatch; errors are reserved for defects in
//! the spec itself and for input nested beyond the recursion guard.

use crate::error::{Result, TypeError};
use crate::typespec::{CompoundSpec, ReqKind, ReqValue, TypeSpec};
use crate::value::{TypeTag, Value};
use indexmap::IndexMap;
use tracing::debug;

/// Maximum value nesting depth the matcher will walk
pub const MAX_VALUE_DEPTH: usize = 128;

/// Check whether `value` satisfies `expected`
pub fn is_of_type(value: &Value, expected: &TypeSpec) -> Result<bool> {
    is_of_type_at(value, expected, 0)
}

fn is_of_type_at(value: &Value, expected: &TypeSpec, depth: usize) -> Result<bool> {
    if depth >= MAX_VALUE_DEPTH {
        return Err(TypeError::TooDeep {
            limit: MAX_VALUE_DEPTH,
        });
    }
    match expected {
        TypeSpec::Atomic(tag) => Ok(value.tag() == *tag),
        TypeSpec::Compound(compound) => match_compound(value, compound, depth),
    }
}

fn match_compound(value: &Value, compound: &CompoundSpec, depth: usize) -> Result<bool> {
    if value.tag() != compound.parent() {
        debug!(
            found = %value.tag(),
            expected = %compound.parent(),
            "parent shape mismatch"
        );
        return Ok(false);
    }

    // Every requirement is evaluated even after one has failed; a
    // requirement predicate may carry diagnostic side effects.
    let mut type_ok = true;
    for (kind, payload) in compound.requirements() {
        let passed = check_requirement(value, compound, *kind, payload, depth)?;
        debug!(
            requirement = %kind,
            passed,
            value = %value.summary(),
            "requirement evaluated"
        );
        type_ok &= passed;
    }
    Ok(type_ok)
}

fn check_requirement(
    value: &Value,
    compound: &CompoundSpec,
    kind: ReqKind,
    payload: &ReqValue,
    depth: usize,
) -> Result<bool> {
    match (compound.parent(), kind, payload) {
        (TypeTag::Mapping, ReqKind::KeyTypes, ReqValue::Types(types)) => {
            let map = expect_map(value)?;
            for key in map.keys() {
                let key_value = Value::Str(key.clone());
                if !matches_any(&key_value, types, depth)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (TypeTag::Mapping, ReqKind::OptKeys, ReqValue::Keys(opt)) => {
            // Closed-key-set check: every key, not just the extras, must
            // be in required_keys ∪ opt_keys.
            let required = match compound.requirement(ReqKind::RequiredKeys) {
                Some(ReqValue::Keys(keys)) => keys.as_slice(),
                Some(_) => {
                    return Err(TypeError::defect(
                        "required_keys requirement carries a non-key payload",
                    ));
                }
                None => {
                    return Err(TypeError::defect(
                        "opt_keys requirement needs required_keys alongside it",
                    ));
                }
            };
            let map = expect_map(value)?;
            Ok(map
                .keys()
                .all(|key| required.contains(key) || opt.contains(key)))
        }
        (TypeTag::Mapping, ReqKind::RequiredKeys, ReqValue::Keys(keys)) => {
            let map = expect_map(value)?;
            Ok(keys.iter().all(|key| map.contains_key(key)))
        }
        (TypeTag::Mapping, ReqKind::ValueTypes, ReqValue::Types(types)) => {
            let map = expect_map(value)?;
            for entry in map.values() {
                if !matches_any(entry, types, depth)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (TypeTag::Sequence, ReqKind::ValueTypes, ReqValue::Types(types)) => {
            let items = expect_items(value)?;
            for item in items {
                if !matches_any(item, types, depth)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (parent, kind, _) => Err(TypeError::Defect {
            reason: format!("requirement {kind} is not supported for a {parent} compound"),
        }),
    }
}

/// True if `value` matches at least one spec in the set
fn matches_any(value: &Value, types: &[TypeSpec], depth: usize) -> Result<bool> {
    for spec in types {
        if is_of_type_at(value, spec, depth + 1)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn expect_map(value: &Value) -> Result<&IndexMap<String, Value>> {
    value
        .as_map()
        .ok_or_else(|| TypeError::defect("mapping requirement evaluated against a non-mapping"))
}

fn expect_items(value: &Value) -> Result<&[Value]> {
    value
        .as_items()
        .ok_or_else(|| TypeError::defect("sequence requirement evaluated against a non-sequence"))
}
