//! A type tree shared between analysis workers.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{ClassHierarchy, NodeId, TypeTree};

/// Reference-counted, lock-protected [`TypeTree`].
///
/// Read paths only set the atomic `READ` mark, so any number of workers can
/// read under the shared lock. Merges take the exclusive lock; because merge
/// is order independent, interleaving does not change the converged tree.
#[derive(Clone, Debug, Default)]
pub struct SharedTypeTree(Arc<RwLock<TypeTree>>);

impl SharedTypeTree {
    pub fn new(tree: TypeTree) -> Self {
        Self(Arc::new(RwLock::new(tree)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TypeTree> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TypeTree> {
        self.0.write()
    }

    /// Merge `src` into `dst` under the write lock.
    pub fn merge_from(
        &self,
        dst: NodeId,
        src_tree: &TypeTree,
        src: NodeId,
        preserve_nullable: bool,
        classes: &dyn ClassHierarchy,
    ) -> bool {
        self.0
            .write()
            .merge(dst, src_tree, src, preserve_nullable, classes)
    }

    /// Independent copy of the subtree at `id`.
    pub fn snapshot(&self, id: NodeId) -> TypeTree {
        self.0.read().snapshot(id)
    }
}

impl From<TypeTree> for SharedTypeTree {
    fn from(tree: TypeTree) -> Self {
        Self::new(tree)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use latis_ir::int_key;

    use super::*;
    use crate::{FlatHierarchy, PrimitiveType};

    #[test]
    fn readers_share_the_lock() {
        let shared = SharedTypeTree::new(TypeTree::array_of(PrimitiveType::Int));
        let guard = shared.read();
        let other = shared.read();
        let elem = guard.read_at(NodeId::ROOT, int_key(7));
        assert_eq!(other.ptype(elem), PrimitiveType::Int);
        assert!(other.was_read(elem));
    }

    #[test]
    fn concurrent_merges_converge() {
        let shared = SharedTypeTree::new(TypeTree::of_kind(PrimitiveType::Tuple));
        thread::scope(|scope| {
            for i in 0..4 {
                let shared = shared.clone();
                scope.spawn(move || {
                    let mut src = TypeTree::of_kind(PrimitiveType::Tuple);
                    let slot = src.write_at(NodeId::ROOT, int_key(i % 2));
                    let kind = if i < 2 {
                        PrimitiveType::Int
                    } else {
                        PrimitiveType::Float
                    };
                    src.merge_kind(slot, kind);
                    shared.merge_from(NodeId::ROOT, &src, NodeId::ROOT, true, &FlatHierarchy);
                });
            }
        });

        let tree = shared.read();
        assert_eq!(tree.children(NodeId::ROOT).len(), 2);
        for &(_, child) in tree.children(NodeId::ROOT) {
            assert_eq!(tree.ptype(child), PrimitiveType::Float);
        }
    }

    #[test]
    fn snapshot_is_detached() {
        let shared = SharedTypeTree::from(TypeTree::of_kind(PrimitiveType::Int));
        let copy = shared.snapshot(NodeId::ROOT);
        shared.write().merge_kind(NodeId::ROOT, PrimitiveType::String);
        assert_eq!(copy.ptype(NodeId::ROOT), PrimitiveType::Int);
        assert_eq!(shared.read().ptype(NodeId::ROOT), PrimitiveType::Mixed);
    }
}
