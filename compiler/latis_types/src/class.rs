//! Class identities and the class-hierarchy oracle.
//!
//! The lattice only needs two answers about classes: the nearest common
//! ancestor of two classes (for merges) and a display name (for rendering).
//! The compiler's class registry provides them through [`ClassHierarchy`].

use std::borrow::Cow;

use rustc_hash::FxHashSet;

/// Identity of a class or record descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Class-hierarchy queries the lattice depends on.
///
/// `common_ancestor` must be commutative and return `Some(a)` for `(a, a)`;
/// merges rely on both for idempotence and order independence.
pub trait ClassHierarchy {
    /// Nearest class that both `a` and `b` derive from (or are).
    fn common_ancestor(&self, a: ClassId, b: ClassId) -> Option<ClassId>;

    /// Display name used when rendering types.
    fn class_name(&self, class: ClassId) -> Cow<'_, str> {
        Cow::Owned(format!("Class#{}", class.raw()))
    }
}

/// A hierarchy without inheritance: only identical classes share an ancestor.
#[derive(Copy, Clone, Default, Debug)]
pub struct FlatHierarchy;

impl ClassHierarchy for FlatHierarchy {
    fn common_ancestor(&self, a: ClassId, b: ClassId) -> Option<ClassId> {
        (a == b).then_some(a)
    }
}

/// Single-inheritance class table.
#[derive(Clone, Default, Debug)]
pub struct ClassTable {
    classes: Vec<ClassEntry>,
}

#[derive(Clone, Debug)]
struct ClassEntry {
    name: String,
    parent: Option<ClassId>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. `parent` must already be registered.
    ///
    /// # Panics
    /// Panics if `parent` is not a class of this table or the table exceeds
    /// `u32::MAX` classes.
    pub fn add_class(&mut self, name: impl Into<String>, parent: Option<ClassId>) -> ClassId {
        if let Some(parent) = parent {
            assert!(
                (parent.raw() as usize) < self.classes.len(),
                "parent {parent:?} is not registered"
            );
        }
        let id = u32::try_from(self.classes.len())
            .unwrap_or_else(|_| panic!("class table exceeded u32::MAX classes"));
        self.classes.push(ClassEntry {
            name: name.into(),
            parent,
        });
        ClassId(id)
    }

    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.classes.get(class.raw() as usize)?.parent
    }

    /// `class` followed by its ancestors, nearest first.
    pub fn ancestors(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(class), |&c| self.parent(c))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassHierarchy for ClassTable {
    fn common_ancestor(&self, a: ClassId, b: ClassId) -> Option<ClassId> {
        if a == b {
            return Some(a);
        }
        let of_a: FxHashSet<ClassId> = self.ancestors(a).collect();
        self.ancestors(b).find(|c| of_a.contains(c))
    }

    fn class_name(&self, class: ClassId) -> Cow<'_, str> {
        match self.classes.get(class.raw() as usize) {
            Some(entry) => Cow::Borrowed(&entry.name),
            None => Cow::Owned(format!("Class#{}", class.raw())),
        }
    }
}
