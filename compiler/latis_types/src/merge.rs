//! Lattice join of type trees.
//!
//! `merge` widens a destination node to the least upper bound of itself and
//! a source node, in place, recursing into substructure. It is idempotent,
//! commutative and associative up to [`TypeTree::equivalent`], so worker
//! threads can apply merges in any order and still converge.
//!
//! Merges stop at [`MAX_ARRAY_DEPTH`](crate::MAX_ARRAY_DEPTH), so joining a
//! value into its own elements converges.
//!
//! A merge reports whether anything observable changed. Only changed nodes
//! (and their ancestors) get a new generation stamp, which is what lets the
//! fixed-point driver detect quiescence.

use latis_ir::{Key, MultiKey};

use crate::stack::ensure_sufficient_stack;
use crate::tree::TypeNode;
use crate::{ClassHierarchy, ClassId, FlatHierarchy, NodeId, PrimitiveType, TypeFlags, TypeTree};

/// Scalar part of the value being joined into a node.
#[derive(Copy, Clone, Debug)]
struct Incoming {
    ptype: PrimitiveType,
    class: Option<ClassId>,
    flags: TypeFlags,
}

impl Incoming {
    fn of(node: &TypeNode) -> Self {
        Self {
            ptype: node.ptype(),
            class: node.class(),
            flags: node.flags(),
        }
    }

    fn kind(ptype: PrimitiveType) -> Self {
        Self {
            ptype,
            class: None,
            flags: TypeFlags::empty(),
        }
    }
}

impl TypeTree {
    /// Join the subtree at `src` in `src_tree` into `dst`.
    ///
    /// With `preserve_nullable == false` the source's nullability is
    /// discarded at this boundary (casts and similar); nested children always
    /// keep theirs. Returns whether `dst`'s subtree changed.
    ///
    /// # Panics
    /// Panics if `dst` is `NodeId::UNKNOWN` or not a node of this tree.
    #[tracing::instrument(level = "trace", skip_all, fields(dst = ?dst, src = ?src))]
    pub fn merge(
        &mut self,
        dst: NodeId,
        src_tree: &TypeTree,
        src: NodeId,
        preserve_nullable: bool,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        self.writable(dst);
        let changed = self.merge_node(dst, src_tree, src, preserve_nullable, classes);
        if changed {
            tracing::trace!(generation = ?self.generation(dst), "merge changed destination");
        }
        changed
    }

    fn merge_node(
        &mut self,
        dst: NodeId,
        src_tree: &TypeTree,
        src: NodeId,
        preserve_nullable: bool,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        let Some(source) = src_tree.get(src) else {
            return false;
        };

        ensure_sufficient_stack(|| {
            // Kind first: error propagation from the children below looks at
            // the joined kind of this node.
            let mut changed =
                self.join_scalar(dst, Incoming::of(source), preserve_nullable, classes);
            if self.is_capped(dst) {
                return changed;
            }

            let edges = source
                .children()
                .iter()
                .copied()
                .chain(source.any_key_child().map(|child| (Key::ANY, child)));
            for (key, src_child) in edges {
                let (dst_child, created) = self.child_or_insert(dst, key);
                changed |= created;
                changed |= self.merge_node(dst_child, src_tree, src_child, true, classes);
            }
            changed
        })
    }

    /// Navigate `path` from `id` with write-path semantics, creating missing
    /// nodes, then merge the source at the end of it.
    ///
    /// Returns whether anything changed, including nodes created or newly
    /// marked written along the path.
    pub fn merge_at(
        &mut self,
        id: NodeId,
        path: &MultiKey,
        src_tree: &TypeTree,
        src: NodeId,
        preserve_nullable: bool,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        let (target, walked) = self.write_path(id, path);
        let merged = self.merge(target, src_tree, src, preserve_nullable, classes);
        merged || walked
    }

    /// Join a bare primitive kind into `id`.
    pub fn merge_kind(&mut self, id: NodeId, ptype: PrimitiveType) -> bool {
        self.join_scalar(id, Incoming::kind(ptype), true, &FlatHierarchy)
    }

    /// Join an instance of `class` into `id`.
    pub fn merge_class(
        &mut self,
        id: NodeId,
        class: ClassId,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        let incoming = Incoming {
            class: Some(class),
            ..Incoming::kind(PrimitiveType::Class)
        };
        self.join_scalar(id, incoming, true, classes)
    }

    /// Join kind, class and lattice flags of one node; no recursion.
    fn join_scalar(
        &mut self,
        dst: NodeId,
        incoming: Incoming,
        preserve_nullable: bool,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        let node = self.node_mut(dst);
        let old_kind = node.ptype();
        let old_class = node.class();

        let mut kind = old_kind.join(incoming.ptype);
        let mut class = None;
        if kind == PrimitiveType::Class {
            class = match (old_class, incoming.class) {
                (Some(a), Some(b)) => {
                    let ancestor = classes.common_ancestor(a, b);
                    if ancestor.is_none() {
                        kind = PrimitiveType::Mixed;
                    }
                    ancestor
                }
                (a, b) => a.or(b),
            };
        }

        let mut nullable = old_kind.absorbed_into(kind);
        if preserve_nullable {
            nullable |= incoming.ptype.absorbed_into(kind)
                || incoming.flags.contains(TypeFlags::NULLABLE);
        }
        let error = kind == PrimitiveType::Error || incoming.flags.contains(TypeFlags::ERROR);

        let mut changed = false;
        if kind != old_kind || class != old_class {
            self.set_kind(dst, kind, class);
            self.touch(dst);
            changed = true;
        }
        if nullable {
            changed |= self.insert_flags(dst, TypeFlags::NULLABLE);
        }
        if error {
            changed |= self.set_error(dst, true);
        }
        changed
    }
}
