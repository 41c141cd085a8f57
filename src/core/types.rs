//! Semantic type tags and the lattice that relates them.
//!
//! Rust generics already guarantee that items handed from one stage to the
//! next have matching types. Type tags describe the *semantic* input and
//! product types of a conduit on top of that: two stages may both carry
//! `serde_json::Value`, yet one declares its products as `Integer` and the
//! other as `Number`. A [`TypeLattice`] decides how such tags relate when
//! conduits are grouped concurrently.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

const ANY: &str = "*";

/// A named semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    /// Create a tag with the given name
    pub fn new<S: Into<Cow<'static, str>>>(name: S) -> Self {
        Self(name.into())
    }

    /// The tag of a Rust type, named by [`std::any::type_name`]
    pub fn of<T: ?Sized>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// The top of every lattice: every tag is a subtype of `any`
    pub fn any() -> Self {
        Self(Cow::Borrowed(ANY))
    }

    pub fn is_any(&self) -> bool {
        self.0 == ANY
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeTag {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

/// Oracle deciding subtype relationships between type tags.
///
/// Conduit groups consult the lattice when they are built: the product type
/// of a group widens to the common ancestor of its members' product types,
/// and the input type narrows to the common descendant of their input types.
pub trait TypeLattice: Send + Sync {
    /// Whether `sub` is a subtype of (or equal to) `sup`
    fn is_subtype(&self, sub: &TypeTag, sup: &TypeTag) -> bool;

    /// The most specific tag that all of `tags` are subtypes of
    fn common_ancestor(&self, tags: &[TypeTag]) -> TypeTag;

    /// A tag among `tags` that is a subtype of all the others
    fn common_descendant(&self, tags: &[TypeTag]) -> Result<TypeTag>;
}

/// A single-inheritance hierarchy of declared tags.
///
/// An empty hierarchy is purely nominal: a tag is only a subtype of itself
/// and of [`TypeTag::any`].
///
/// ```rust
/// use conduitweld::core::{TypeHierarchy, TypeLattice, TypeTag};
///
/// let lattice = TypeHierarchy::new()
///     .declare("Integer", "Number")
///     .declare("Float", "Number");
///
/// let common = lattice.common_ancestor(&["Integer".into(), "Float".into()]);
/// assert_eq!(common, TypeTag::new("Number"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    parents: HashMap<TypeTag, TypeTag>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `sup` as the direct supertype of `sub`, replacing any earlier
    /// declaration for `sub`
    pub fn declare(mut self, sub: impl Into<TypeTag>, sup: impl Into<TypeTag>) -> Self {
        self.parents.insert(sub.into(), sup.into());
        self
    }

    /// `tag` followed by its declared supertypes, nearest first.
    fn ancestors(&self, tag: &TypeTag) -> Vec<TypeTag> {
        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        let mut current = Some(tag.clone());
        while let Some(tag) = current {
            // cyclic declarations end the walk
            if !seen.insert(tag.clone()) {
                break;
            }
            current = self.parents.get(&tag).cloned();
            chain.push(tag);
        }
        chain
    }
}

impl TypeLattice for TypeHierarchy {
    fn is_subtype(&self, sub: &TypeTag, sup: &TypeTag) -> bool {
        sup.is_any() || self.ancestors(sub).contains(sup)
    }

    fn common_ancestor(&self, tags: &[TypeTag]) -> TypeTag {
        let Some((first, rest)) = tags.split_first() else {
            return TypeTag::any();
        };
        self.ancestors(first)
            .into_iter()
            .find(|candidate| {
                rest.iter().all(|tag| self.is_subtype(tag, candidate))
            })
            .unwrap_or_else(TypeTag::any)
    }

    fn common_descendant(&self, tags: &[TypeTag]) -> Result<TypeTag> {
        tags.iter()
            .find(|candidate| {
                tags.iter().all(|tag| self.is_subtype(candidate, tag))
            })
            .cloned()
            .ok_or_else(|| Error::NoCommonSubtype {
                tags: tags.to_vec(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> TypeHierarchy {
        TypeHierarchy::new()
            .declare("Integer", "Number")
            .declare("Float", "Number")
            .declare("Number", "Value")
            .declare("Text", "Value")
    }

    #[test]
    fn test_subtype_is_reflexive_and_transitive() {
        let lattice = numbers();
        assert!(lattice.is_subtype(&"Integer".into(), &"Integer".into()));
        assert!(lattice.is_subtype(&"Integer".into(), &"Value".into()));
        assert!(lattice.is_subtype(&"Text".into(), &TypeTag::any()));
        assert!(!lattice.is_subtype(&"Number".into(), &"Integer".into()));
    }

    #[test]
    fn test_common_ancestor_widens() {
        let lattice = numbers();
        assert_eq!(
            lattice.common_ancestor(&["Integer".into(), "Float".into()]),
            TypeTag::new("Number")
        );
        assert_eq!(
            lattice.common_ancestor(&["Integer".into(), "Text".into()]),
            TypeTag::new("Value")
        );
        assert_eq!(
            lattice.common_ancestor(&["Integer".into(), "Unrelated".into()]),
            TypeTag::any()
        );
    }

    #[test]
    fn test_common_descendant_narrows() {
        let lattice = numbers();
        assert_eq!(
            lattice
                .common_descendant(&["Number".into(), "Integer".into()])
                .unwrap(),
            TypeTag::new("Integer")
        );
        let err = lattice
            .common_descendant(&["Integer".into(), "Float".into()])
            .unwrap_err();
        assert!(matches!(err, Error::NoCommonSubtype { .. }));
    }

    #[test]
    fn test_nominal_hierarchy() {
        let lattice = TypeHierarchy::default();
        let tag = TypeTag::of::<i64>();
        assert_eq!(lattice.common_ancestor(&[tag.clone(), tag.clone()]), tag);
        assert_eq!(
            lattice.common_ancestor(&[tag.clone(), TypeTag::of::<u8>()]),
            TypeTag::any()
        );
    }

    #[test]
    fn test_cyclic_declarations_terminate() {
        let lattice = TypeHierarchy::new().declare("A", "B").declare("B", "A");
        assert!(lattice.is_subtype(&"A".into(), &"B".into()));
        assert!(!lattice.is_subtype(&"A".into(), &"C".into()));
    }
}
