//! Arena-backed type trees.
//!
//! A [`TypeTree`] holds every lattice node of one analyzable location (a
//! variable, a parameter, an expression slot). Nodes are addressed by
//! [`NodeId`], a 32-bit index into the tree's arena:
//!
//! - children are owned by the arena and listed on their parent as
//!   `(Key, NodeId)` edges, plus one any-key edge
//! - the parent link is a plain index, never an owner
//! - nodes are only ever created as fresh children of an existing node, so
//!   the ownership graph is a tree by construction
//! - nothing is freed until the whole tree is dropped, so an index can
//!   never dangle
//!
//! Array nesting is capped at [`MAX_ARRAY_DEPTH`] any-key edges below the
//! root. A node created at the cap is `Mixed`, merges never recurse below
//! it, and nothing beneath it is part of the lattice value. Self-nesting
//! writes such as `$a[] = $a` therefore reach a fixed point.
//!
//! Read paths (`read_at`, `lookup_at`) never allocate. The only side effect
//! of a read is the atomic `READ` usage mark, which lets readers share a tree
//! behind a read lock. Write paths (`write_at`, merges) are the only way to
//! materialize structure.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use latis_ir::{Key, MultiKey};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::InvariantViolation;
use crate::generation::{current_generation, Generation};
use crate::stack::ensure_sufficient_stack;
use crate::{ClassId, PrimitiveType, TypeFlags};

/// Deepest array nesting a tree keeps, counted in any-key edges from the root.
pub const MAX_ARRAY_DEPTH: u8 = 6;

/// Handle of a node inside a [`TypeTree`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: Self = Self(0);

    /// The canonical "no information" node.
    ///
    /// Returned by reads that resolve nothing. Every accessor accepts it and
    /// reports an `Unknown` node with no flags and no children; write paths
    /// reject it.
    pub const UNKNOWN: Self = Self(u32::MAX);

    /// Number of usable indices; `u32::MAX` itself is `UNKNOWN`.
    const MAX_NODES: usize = u32::MAX as usize;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "NodeId::UNKNOWN")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// One lattice node.
#[derive(Debug)]
pub struct TypeNode {
    ptype: PrimitiveType,
    class: Option<ClassId>,
    /// `TypeFlags` bits. Atomic so readers can set `READ` through `&self`.
    flags: AtomicU8,
    generation: Generation,
    parent: Option<NodeId>,
    /// Any-key edges between the root and this node.
    array_depth: u8,
    any_key: Option<NodeId>,
    /// Sorted by key; at most one edge per key.
    children: SmallVec<[(Key, NodeId); 4]>,
}

impl TypeNode {
    fn new(parent: Option<NodeId>, array_depth: u8) -> Self {
        Self {
            ptype: PrimitiveType::Unknown,
            class: None,
            flags: AtomicU8::new(0),
            generation: current_generation(),
            parent,
            array_depth,
            any_key: None,
            children: SmallVec::new(),
        }
    }

    #[inline]
    pub fn ptype(&self) -> PrimitiveType {
        self.ptype
    }

    /// Class identity; only present on `Class` nodes.
    #[inline]
    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        TypeFlags::from_bits_truncate(self.flags.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn array_depth(&self) -> u8 {
        self.array_depth
    }

    /// At or below the nesting cap: children here are not merged, copied
    /// or compared.
    #[inline]
    pub fn is_capped(&self) -> bool {
        self.array_depth >= MAX_ARRAY_DEPTH
    }

    #[inline]
    pub fn any_key_child(&self) -> Option<NodeId> {
        self.any_key
    }

    /// Explicit children in key order.
    #[inline]
    pub fn children(&self) -> &[(Key, NodeId)] {
        &self.children
    }

    /// Whether the node has any substructure.
    #[inline]
    pub fn structured(&self) -> bool {
        self.any_key.is_some() || !self.children.is_empty()
    }

    /// Exact child for `key`; the wildcard addresses the any-key slot.
    pub fn find(&self, key: Key) -> Option<NodeId> {
        if key.is_any_key() {
            return self.any_key;
        }
        self.children
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|i| self.children[i].1)
    }

    #[inline]
    fn mark_read(&self) {
        self.flags
            .fetch_or(TypeFlags::READ.bits(), Ordering::Relaxed);
    }
}

impl Clone for TypeNode {
    fn clone(&self) -> Self {
        Self {
            ptype: self.ptype,
            class: self.class,
            flags: AtomicU8::new(self.flags.load(Ordering::Relaxed)),
            generation: self.generation,
            parent: self.parent,
            array_depth: self.array_depth,
            any_key: self.any_key,
            children: self.children.clone(),
        }
    }
}

/// Every lattice node of one analyzable location.
#[derive(Clone, Debug)]
pub struct TypeTree {
    nodes: Vec<TypeNode>,
}

impl TypeTree {
    /// A tree holding a single `Unknown` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![TypeNode::new(None, 0)],
        }
    }

    /// A single node of kind `ptype`.
    pub fn of_kind(ptype: PrimitiveType) -> Self {
        let mut tree = Self::new();
        tree.merge_kind(NodeId::ROOT, ptype);
        tree
    }

    /// An `Array` whose elements have kind `elem`.
    pub fn array_of(elem: PrimitiveType) -> Self {
        let mut tree = Self::of_kind(PrimitiveType::Array);
        let (elem_node, _) = tree.child_or_insert(NodeId::ROOT, Key::ANY);
        tree.merge_kind(elem_node, elem);
        tree
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of materialized nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node behind `id`, or `None` for `NodeId::UNKNOWN`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn get(&self, id: NodeId) -> Option<&TypeNode> {
        if id.is_unknown() {
            return None;
        }
        match self.nodes.get(id.index()) {
            Some(node) => Some(node),
            None => InvariantViolation::ForeignNode {
                node: id,
                len: self.nodes.len(),
            }
            .raise(),
        }
    }

    /// Validate a handle for a write path.
    #[inline]
    pub(crate) fn writable(&self, id: NodeId) -> usize {
        if id.is_unknown() {
            InvariantViolation::WriteThroughUnknown.raise();
        }
        if id.index() >= self.nodes.len() {
            InvariantViolation::ForeignNode {
                node: id,
                len: self.nodes.len(),
            }
            .raise();
        }
        id.index()
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TypeNode {
        let index = self.writable(id);
        &mut self.nodes[index]
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn ptype(&self, id: NodeId) -> PrimitiveType {
        self.get(id).map_or(PrimitiveType::Unknown, TypeNode::ptype)
    }

    /// Kind as seen by code generation: an `Unknown` node that may be
    /// `false` is `False`.
    pub fn real_ptype(&self, id: NodeId) -> PrimitiveType {
        match self.ptype(id) {
            PrimitiveType::Unknown if self.is_nullable(id) => PrimitiveType::False,
            ptype => ptype,
        }
    }

    pub fn class(&self, id: NodeId) -> Option<ClassId> {
        self.get(id).and_then(TypeNode::class)
    }

    pub fn flags(&self, id: NodeId) -> TypeFlags {
        self.get(id).map_or(TypeFlags::empty(), TypeNode::flags)
    }

    pub fn generation(&self, id: NodeId) -> Generation {
        self.get(id).map_or(Generation::INITIAL, TypeNode::generation)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(TypeNode::parent)
    }

    pub fn structured(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(TypeNode::structured)
    }

    pub fn children(&self, id: NodeId) -> &[(Key, NodeId)] {
        match self.get(id) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    pub fn any_key_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(TypeNode::any_key_child)
    }

    pub fn array_depth(&self, id: NodeId) -> u8 {
        self.get(id).map_or(0, TypeNode::array_depth)
    }

    pub fn is_capped(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(TypeNode::is_capped)
    }

    pub fn is_nullable(&self, id: NodeId) -> bool {
        self.flags(id).contains(TypeFlags::NULLABLE)
    }

    pub fn has_error(&self, id: NodeId) -> bool {
        self.flags(id).contains(TypeFlags::ERROR)
    }

    pub fn was_read(&self, id: NodeId) -> bool {
        self.flags(id).contains(TypeFlags::READ)
    }

    pub fn was_written(&self, id: NodeId) -> bool {
        self.flags(id).contains(TypeFlags::WRITE)
    }

    // ========================================
    // Read path
    // ========================================

    /// Exact child for `key`, without the any-key fallback and without
    /// marking anything read.
    pub fn lookup_at(&self, id: NodeId, key: Key) -> NodeId {
        self.get(id)
            .and_then(|node| node.find(key))
            .unwrap_or(NodeId::UNKNOWN)
    }

    /// The type stored at `key`: the exact child, else the any-key child,
    /// else `NodeId::UNKNOWN`. Marks the result read.
    pub fn read_at(&self, id: NodeId, key: Key) -> NodeId {
        let Some(node) = self.get(id) else {
            return NodeId::UNKNOWN;
        };
        let found = node.find(key).or(node.any_key);
        match found {
            Some(child) => {
                self.nodes[child.index()].mark_read();
                child
            }
            None => NodeId::UNKNOWN,
        }
    }

    /// `read_at` applied along `path`, stopping at the first miss.
    pub fn read_at_path(&self, id: NodeId, path: &MultiKey) -> NodeId {
        let mut current = id;
        for &key in path {
            current = self.read_at(current, key);
            if current.is_unknown() {
                break;
            }
        }
        current
    }

    // ========================================
    // Write path
    // ========================================

    /// The child for `key`, created as an `Unknown` node if absent. Marks
    /// the child written.
    pub fn write_at(&mut self, id: NodeId, key: Key) -> NodeId {
        self.write_step(id, key).0
    }

    /// `write_at` applied along `path`.
    pub fn write_at_path(&mut self, id: NodeId, path: &MultiKey) -> NodeId {
        self.write_path(id, path).0
    }

    /// `write_at_path`, also reporting whether any node was created or
    /// newly marked written.
    pub(crate) fn write_path(&mut self, id: NodeId, path: &MultiKey) -> (NodeId, bool) {
        path.iter().fold((id, false), |(current, changed), &key| {
            let (child, stepped) = self.write_step(current, key);
            (child, changed || stepped)
        })
    }

    fn write_step(&mut self, id: NodeId, key: Key) -> (NodeId, bool) {
        let (child, created) = self.child_or_insert(id, key);
        let marked = self.set_written(child, true);
        (child, created || marked)
    }

    /// The child for `key`, and whether it had to be created.
    ///
    /// An any-key child created at the nesting cap starts out `Mixed`.
    pub(crate) fn child_or_insert(&mut self, id: NodeId, key: Key) -> (NodeId, bool) {
        let index = self.writable(id);
        let node = &self.nodes[index];

        let slot = if key.is_any_key() {
            match node.any_key {
                Some(child) => return (child, false),
                None => None,
            }
        } else {
            match node.children.binary_search_by_key(&key, |&(k, _)| k) {
                Ok(i) => return (node.children[i].1, false),
                Err(i) => Some(i),
            }
        };

        let child = self.alloc(id, slot.is_none());
        let node = &mut self.nodes[index];
        match slot {
            None => node.any_key = Some(child),
            Some(i) => node.children.insert(i, (key, child)),
        }
        if slot.is_none() && self.is_capped(child) {
            tracing::debug!(node = ?child, "array nesting capped");
            self.set_kind(child, PrimitiveType::Mixed, None);
        }
        self.touch(id);
        (child, true)
    }

    /// Overwrite kind and class. Callers guarantee the new value is a join
    /// of the old one and stamp the generation themselves.
    pub(crate) fn set_kind(&mut self, id: NodeId, ptype: PrimitiveType, class: Option<ClassId>) {
        let node = self.node_mut(id);
        node.ptype = ptype;
        node.class = class;
    }

    fn alloc(&mut self, parent: NodeId, via_any_key: bool) -> NodeId {
        let index = self.nodes.len();
        if index >= NodeId::MAX_NODES {
            InvariantViolation::TreeOverflow {
                max: NodeId::MAX_NODES,
            }
            .raise();
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "bounded by MAX_NODES above"
        )]
        let id = NodeId(index as u32);
        let depth = self.nodes[parent.index()]
            .array_depth
            .saturating_add(u8::from(via_any_key));
        self.nodes.push(TypeNode::new(Some(parent), depth));
        id
    }

    /// Stamp `id` and its ancestors with the current generation.
    ///
    /// An ancestor's generation is never below a descendant's, so the walk
    /// stops at the first node that is already up to date.
    pub(crate) fn touch(&mut self, id: NodeId) {
        let generation = current_generation();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &mut self.nodes[node_id.index()];
            if node.generation >= generation {
                break;
            }
            node.generation = generation;
            current = node.parent;
        }
    }

    // ========================================
    // Flags
    // ========================================

    /// Add non-error `flags`; returns whether anything was new.
    pub(crate) fn insert_flags(&mut self, id: NodeId, flags: TypeFlags) -> bool {
        debug_assert!(
            !flags.contains(TypeFlags::ERROR),
            "the error flag goes through set_error"
        );
        let node = self.node_mut(id);
        let old = TypeFlags::from_bits_truncate(*node.flags.get_mut());
        let new = old | flags;
        if new == old {
            return false;
        }
        *node.flags.get_mut() = new.bits();
        self.touch(id);
        true
    }

    fn apply_flag(&mut self, id: NodeId, flag: TypeFlags, on: bool) -> bool {
        if on {
            return self.insert_flags(id, flag);
        }
        if self.flags(id).contains(flag) {
            InvariantViolation::ClearedFlag { node: id, flags: flag }.raise();
        }
        false
    }

    /// Replace the node's flags with `flags`.
    ///
    /// # Panics
    /// Panics if `flags` lacks a flag that is already set.
    pub fn set_flags(&mut self, id: NodeId, flags: TypeFlags) -> bool {
        let old = self.flags(id);
        let cleared = old.cleared_by(flags);
        if !cleared.is_empty() {
            InvariantViolation::ClearedFlag {
                node: id,
                flags: cleared,
            }
            .raise();
        }
        let added = flags.difference(old);
        let mut changed = self.insert_flags(id, added.difference(TypeFlags::ERROR));
        if added.contains(TypeFlags::ERROR) {
            changed |= self.set_error(id, true);
        }
        changed
    }

    /// Set (`true`) the nullable flag. Passing `false` panics if it is set.
    pub fn set_nullable(&mut self, id: NodeId, on: bool) -> bool {
        self.apply_flag(id, TypeFlags::NULLABLE, on)
    }

    /// Set (`true`) the read mark. Passing `false` panics if it is set.
    pub fn set_read(&mut self, id: NodeId, on: bool) -> bool {
        self.apply_flag(id, TypeFlags::READ, on)
    }

    /// Set (`true`) the write mark. Passing `false` panics if it is set.
    pub fn set_written(&mut self, id: NodeId, on: bool) -> bool {
        self.apply_flag(id, TypeFlags::WRITE, on)
    }

    /// Set (`true`) the error flag and propagate it to ancestors.
    ///
    /// Propagation walks up one parent at a time while
    /// [`should_proxy_error_to_parent`](Self::should_proxy_error_to_parent)
    /// holds and stops at the first ancestor that already has the flag.
    /// Passing `false` panics if the flag is set.
    pub fn set_error(&mut self, id: NodeId, on: bool) -> bool {
        if !on {
            if self.has_error(id) {
                InvariantViolation::ClearedFlag {
                    node: id,
                    flags: TypeFlags::ERROR,
                }
                .raise();
            }
            return false;
        }

        let mut changed = false;
        let mut current = id;
        loop {
            let node = self.node_mut(current);
            let old = *node.flags.get_mut();
            if old & TypeFlags::ERROR.bits() != 0 {
                break;
            }
            *node.flags.get_mut() = old | TypeFlags::ERROR.bits();
            self.touch(current);
            changed = true;

            match self.parent(current) {
                Some(parent) if self.should_proxy_error_to_parent(current) => {
                    tracing::debug!(child = ?current, ?parent, "propagating error flag to parent");
                    current = parent;
                }
                _ => break,
            }
        }
        changed
    }

    /// Whether an error at `child` makes its parent erroneous too.
    ///
    /// Arrays and mixed values hold independently typed elements: one bad
    /// element does not invalidate the container. Every other parent
    /// (tuples, shapes, class instances, untyped nodes) is only as good as
    /// its parts.
    pub fn should_proxy_error_to_parent(&self, child: NodeId) -> bool {
        match self.parent(child) {
            Some(parent) => !matches!(
                self.ptype(parent),
                PrimitiveType::Array | PrimitiveType::Mixed
            ),
            None => false,
        }
    }

    // ========================================
    // Whole-subtree queries
    // ========================================

    /// Deep copy of the subtree at `id` into a new, independently owned
    /// tree rooted at the copy. Kinds, classes, flags and generations are
    /// kept; nothing below a capped node is copied.
    pub fn snapshot(&self, id: NodeId) -> TypeTree {
        let Some(source) = self.get(id) else {
            return TypeTree::new();
        };
        let mut out = TypeTree {
            nodes: Vec::with_capacity(1),
        };
        let mut root = source.clone();
        root.parent = None;
        root.array_depth = 0;
        root.any_key = None;
        root.children = SmallVec::new();
        out.nodes.push(root);
        self.copy_children(id, &mut out, NodeId::ROOT);
        out
    }

    fn copy_children(&self, from: NodeId, out: &mut TypeTree, to: NodeId) {
        ensure_sufficient_stack(|| {
            let source = &self.nodes[from.index()];
            if source.is_capped() {
                return;
            }
            for &(key, child) in &source.children {
                let copied = self.copy_node(child, out, to, false);
                out.nodes[to.index()].children.push((key, copied));
            }
            if let Some(child) = source.any_key {
                let copied = self.copy_node(child, out, to, true);
                out.nodes[to.index()].any_key = Some(copied);
            }
        });
    }

    fn copy_node(
        &self,
        from: NodeId,
        out: &mut TypeTree,
        parent: NodeId,
        via_any_key: bool,
    ) -> NodeId {
        let id = out.alloc(parent, via_any_key);
        let source = &self.nodes[from.index()];
        let node = &mut out.nodes[id.index()];
        node.ptype = source.ptype;
        node.class = source.class;
        *node.flags.get_mut() = source.flags.load(Ordering::Relaxed);
        node.generation = source.generation;
        self.copy_children(from, out, id);
        id
    }

    /// Structural equality of lattice values.
    ///
    /// Compares kind, class, `NULLABLE`/`ERROR`, and children by key
    /// (including the any-key slot). Usage marks, generations and handle
    /// numbering are ignored, and so is everything below a capped node.
    pub fn equivalent(&self, a: NodeId, other: &TypeTree, b: NodeId) -> bool {
        ensure_sufficient_stack(|| {
            if self.ptype(a) != other.ptype(b)
                || self.class(a) != other.class(b)
                || self.flags(a).lattice() != other.flags(b).lattice()
            {
                return false;
            }
            if self.is_capped(a) || other.is_capped(b) {
                return true;
            }

            let (ours, theirs) = (self.children(a), other.children(b));
            if ours.len() != theirs.len() {
                return false;
            }
            let children_match = ours.iter().zip(theirs).all(|(&(ka, ca), &(kb, cb))| {
                ka == kb && self.equivalent(ca, other, cb)
            });
            if !children_match {
                return false;
            }

            match (self.any_key_child(a), other.any_key_child(b)) {
                (None, None) => true,
                (Some(ca), Some(cb)) => self.equivalent(ca, other, cb),
                _ => false,
            }
        })
    }

    /// Class identities anywhere in the lattice value of the subtree,
    /// deduplicated, in depth-first order.
    pub fn class_types_inside(&self, id: NodeId) -> Vec<ClassId> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            if let Some(class) = node.class {
                if seen.insert(class) {
                    out.push(class);
                }
            }
            if node.is_capped() {
                continue;
            }
            stack.extend(node.any_key);
            stack.extend(node.children.iter().rev().map(|&(_, child)| child));
        }
        out
    }

    pub fn has_class_type_inside(&self, id: NodeId) -> bool {
        !self.class_types_inside(id).is_empty()
    }
}

impl Default for TypeTree {
    fn default() -> Self {
        Self::new()
    }
}
