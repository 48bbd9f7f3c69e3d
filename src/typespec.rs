// src/typespec.rs

//! Type specifications for recipe parameter values
//!
//! A [`TypeSpec`] describes the expected shape of a parameter value:
//! either a bare runtime shape, or a mapping/sequence refined by
//! structural requirements. Specs are immutable once built and support
//! value equality and stable hashing, so they can serve as keys in the
//! coercion registry.
//!
//! Requirements are declared through the [`Requirements`] builder and
//! stored in a canonical encoding: sorted by requirement kind, one entry
//! per kind. Two specs built from the same requirements in a different
//! declaration order therefore compare and hash identically.

use crate::error::{Result, TypeError};
use crate::value::TypeTag;
use std::fmt;

/// Named structural constraint kinds attached to a compound spec
///
/// The derived ordering matches the alphabetical order of the wire names,
/// which is what the canonical encoding sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReqKind {
    /// Allowed key shapes (mapping parent)
    KeyTypes,
    /// Additional allowed key names (mapping parent)
    ///
    /// Despite the name, the matcher checks *every* key against
    /// `required_keys ∪ opt_keys`, so declaring this closes the key set.
    OptKeys,
    /// Key names that must be present (mapping parent)
    RequiredKeys,
    /// Allowed value shapes (mapping parent) or element shapes (sequence
    /// parent)
    ValueTypes,
}

impl ReqKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReqKind::KeyTypes => "key_types",
            ReqKind::OptKeys => "opt_keys",
            ReqKind::RequiredKeys => "required_keys",
            ReqKind::ValueTypes => "value_types",
        }
    }
}

impl fmt::Display for ReqKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a single requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReqValue {
    /// A set of allowed type specs, in declaration order
    Types(Vec<TypeSpec>),
    /// A set of key names, in declaration order
    Keys(Vec<String>),
}

/// Insertion-ordered requirement builder
///
/// Setting the same kind twice replaces the earlier entry; encoding sorts
/// by kind, which makes the result independent of declaration order.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    entries: Vec<(ReqKind, ReqValue)>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_types<I: IntoIterator<Item = TypeSpec>>(self, types: I) -> Self {
        self.set(ReqKind::KeyTypes, ReqValue::Types(types.into_iter().collect()))
    }

    pub fn value_types<I: IntoIterator<Item = TypeSpec>>(self, types: I) -> Self {
        self.set(ReqKind::ValueTypes, ReqValue::Types(types.into_iter().collect()))
    }

    pub fn required_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(
            ReqKind::RequiredKeys,
            ReqValue::Keys(keys.into_iter().map(Into::into).collect()),
        )
    }

    pub fn opt_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(
            ReqKind::OptKeys,
            ReqValue::Keys(keys.into_iter().map(Into::into).collect()),
        )
    }

    fn set(mut self, kind: ReqKind, value: ReqValue) -> Self {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((kind, value)),
        }
        self
    }

    /// Canonical encoding: sorted by kind, one entry per kind
    pub fn encode(mut self) -> Vec<(ReqKind, ReqValue)> {
        self.entries.sort_by_key(|(kind, _)| *kind);
        self.entries
    }
}

/// A mapping or sequence shape refined by structural requirements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundSpec {
    parent: TypeTag,
    requirements: Vec<(ReqKind, ReqValue)>,
}

impl CompoundSpec {
    /// Build a compound spec, rejecting parents that cannot carry
    /// requirements
    pub fn new(parent: TypeTag, requirements: Requirements) -> Result<Self> {
        match parent {
            TypeTag::Mapping | TypeTag::Sequence => Ok(Self {
                parent,
                requirements: requirements.encode(),
            }),
            other => Err(TypeError::Defect {
                reason: format!("compound parent must be a mapping or sequence, not {other}"),
            }),
        }
    }

    pub fn parent(&self) -> TypeTag {
        self.parent
    }

    pub fn requirements(&self) -> &[(ReqKind, ReqValue)] {
        &self.requirements
    }

    /// Look up a sibling requirement by kind
    pub(crate) fn requirement(&self, kind: ReqKind) -> Option<&ReqValue> {
        self.requirements
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for CompoundSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.parent)?;
        for (i, (kind, payload)) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}: [")?;
            match payload {
                ReqValue::Types(types) => {
                    for (j, spec) in types.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{spec}")?;
                    }
                }
                ReqValue::Keys(keys) => {
                    for (j, key) in keys.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        f.write_str(key)?;
                    }
                }
            }
            f.write_str("]")?;
        }
        f.write_str("}")
    }
}

/// Expected shape of a parameter value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// Pure runtime-shape membership
    Atomic(TypeTag),
    /// Parent shape plus structural requirements
    Compound(CompoundSpec),
}

impl TypeSpec {
    pub const STR: TypeSpec = TypeSpec::Atomic(TypeTag::Str);
    pub const INT: TypeSpec = TypeSpec::Atomic(TypeTag::Int);
    pub const FLOAT: TypeSpec = TypeSpec::Atomic(TypeTag::Float);
    pub const MAPPING: TypeSpec = TypeSpec::Atomic(TypeTag::Mapping);
    pub const SEQUENCE: TypeSpec = TypeSpec::Atomic(TypeTag::Sequence);
    pub const TUPLE: TypeSpec = TypeSpec::Atomic(TypeTag::Tuple);

    /// Mapping compound with the given requirements
    pub fn mapping(requirements: Requirements) -> Self {
        TypeSpec::Compound(CompoundSpec {
            parent: TypeTag::Mapping,
            requirements: requirements.encode(),
        })
    }

    /// Sequence compound with the given requirements
    pub fn sequence(requirements: Requirements) -> Self {
        TypeSpec::Compound(CompoundSpec {
            parent: TypeTag::Sequence,
            requirements: requirements.encode(),
        })
    }

    /// General compound constructor; errors on an unsupported parent
    pub fn compound(parent: TypeTag, requirements: Requirements) -> Result<Self> {
        CompoundSpec::new(parent, requirements).map(TypeSpec::Compound)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Atomic(tag) => write!(f, "{tag}"),
            TypeSpec::Compound(compound) => write!(f, "{compound}"),
        }
    }
}
