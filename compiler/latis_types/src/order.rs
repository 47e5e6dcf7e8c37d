//! Comparisons between lattice values that are not joins.
//!
//! `can_be_same_type` answers whether two values could ever be identical at
//! runtime (strict comparison folding). `cmp_types` is a total order that
//! agrees with [`TypeTree::equivalent`], used to sort and deduplicate types
//! deterministically.

use std::cmp::Ordering;

use crate::stack::ensure_sufficient_stack;
use crate::{ClassHierarchy, NodeId, PrimitiveType, TypeTree};

impl TypeTree {
    /// Whether a value of this type can be `false`.
    pub fn may_be_false(&self, id: NodeId) -> bool {
        self.is_nullable(id)
            || matches!(
                self.real_ptype(id),
                PrimitiveType::False | PrimitiveType::Bool
            )
    }

    /// Whether a value of type `a` and a value of type `b` (in `other`) can
    /// be the same value.
    ///
    /// Only the top-level kinds are inspected. Unresolved, mixed and
    /// erroneous types can be anything; two types that may both be `false`
    /// can both be `false`; class instances need a common ancestor.
    pub fn can_be_same_type(
        &self,
        a: NodeId,
        other: &TypeTree,
        b: NodeId,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        let (ours, theirs) = (self.real_ptype(a), other.real_ptype(b));
        let open = |kind: PrimitiveType| {
            matches!(
                kind,
                PrimitiveType::Unknown | PrimitiveType::Mixed | PrimitiveType::Error
            )
        };
        if open(ours) || open(theirs) {
            return true;
        }
        if self.may_be_false(a) && other.may_be_false(b) {
            return true;
        }
        if ours != theirs {
            return false;
        }
        match (self.class(a), other.class(b)) {
            (Some(x), Some(y)) => classes.common_ancestor(x, y).is_some(),
            _ => true,
        }
    }

    /// Total order over lattice values: kind, class, lattice flags, then
    /// children by key, then the any-key child (absent first).
    ///
    /// `Ordering::Equal` exactly when [`equivalent`](Self::equivalent) holds.
    pub fn cmp_types(&self, a: NodeId, other: &TypeTree, b: NodeId) -> Ordering {
        ensure_sufficient_stack(|| {
            let scalar = (self.ptype(a) as u8)
                .cmp(&(other.ptype(b) as u8))
                .then_with(|| self.class(a).cmp(&other.class(b)))
                .then_with(|| {
                    self.flags(a)
                        .lattice()
                        .bits()
                        .cmp(&other.flags(b).lattice().bits())
                });
            if scalar.is_ne() || self.is_capped(a) || other.is_capped(b) {
                return scalar;
            }

            let (ours, theirs) = (self.children(a), other.children(b));
            for (&(ka, ca), &(kb, cb)) in ours.iter().zip(theirs) {
                let ord = ka.cmp(&kb).then_with(|| self.cmp_types(ca, other, cb));
                if ord.is_ne() {
                    return ord;
                }
            }
            ours.len().cmp(&theirs.len()).then_with(|| {
                match (self.any_key_child(a), other.any_key_child(b)) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(ca), Some(cb)) => self.cmp_types(ca, other, cb),
                }
            })
        })
    }
}
