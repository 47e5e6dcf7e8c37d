//! Property-based tests for the type lattice.
//!
//! Random type trees are generated from a small description language and
//! checked for the laws the fixed-point driver relies on:
//! 1. Kind join is commutative, associative and idempotent
//! 2. Keys round-trip through the process-wide interner
//! 3. Merge is idempotent and commutative up to `equivalent`
//! 4. `cmp_types` is a total order consistent with `equivalent`
//! 5. A thread's generation view never moves backwards

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::needless_pass_by_value,
    reason = "Proptest macros generate code with these patterns"
)]

use latis_ir::{int_key, keys, string_key, Key, KeyKind};
use latis_types::{
    advance_generation, current_generation, global_generation, reconcile_generation,
    refresh_generation, FlatHierarchy, Generation, NodeId, PrimitiveType, TypeTree,
};
use proptest::prelude::*;

// -- Tree Generation Strategies --

/// Blueprint of a random type tree.
#[derive(Clone, Debug)]
enum Blueprint {
    Leaf {
        kind: PrimitiveType,
        nullable: bool,
    },
    Node {
        kind: PrimitiveType,
        children: Vec<(i32, Blueprint)>,
        any: Option<Box<Blueprint>>,
    },
}

fn kind_strategy() -> impl Strategy<Value = PrimitiveType> {
    prop::sample::select(PrimitiveType::ALL.to_vec())
}

fn container_strategy() -> impl Strategy<Value = PrimitiveType> {
    prop::sample::select(vec![
        PrimitiveType::Unknown,
        PrimitiveType::Array,
        PrimitiveType::Tuple,
        PrimitiveType::Shape,
        PrimitiveType::Mixed,
    ])
}

fn blueprint_strategy() -> impl Strategy<Value = Blueprint> {
    let leaf = (kind_strategy(), any::<bool>())
        .prop_map(|(kind, nullable)| Blueprint::Leaf { kind, nullable });
    leaf.prop_recursive(4, 24, 4, |inner| {
        (
            container_strategy(),
            prop::collection::vec((0..4i32, inner.clone()), 0..4),
            prop::option::of(inner.prop_map(Box::new)),
        )
            .prop_map(|(kind, children, any)| Blueprint::Node {
                kind,
                children,
                any,
            })
    })
}

fn build_into(tree: &mut TypeTree, node: NodeId, blueprint: &Blueprint) {
    match blueprint {
        Blueprint::Leaf { kind, nullable } => {
            tree.merge_kind(node, *kind);
            if *nullable {
                tree.set_nullable(node, true);
            }
        }
        Blueprint::Node {
            kind,
            children,
            any,
        } => {
            tree.merge_kind(node, *kind);
            for (key, child) in children {
                let slot = tree.write_at(node, int_key(*key));
                build_into(tree, slot, child);
            }
            if let Some(child) = any {
                let slot = tree.write_at(node, Key::ANY);
                build_into(tree, slot, child);
            }
        }
    }
}

fn build(blueprint: &Blueprint) -> TypeTree {
    let mut tree = TypeTree::new();
    build_into(&mut tree, NodeId::ROOT, blueprint);
    tree
}

fn merged(dst: &TypeTree, src: &TypeTree) -> TypeTree {
    let mut out = dst.snapshot(NodeId::ROOT);
    out.merge(NodeId::ROOT, src, NodeId::ROOT, true, &FlatHierarchy);
    out
}

// -- Kind Join --

proptest! {
    #[test]
    fn join_is_commutative(a in kind_strategy(), b in kind_strategy()) {
        prop_assert_eq!(a.join(b), b.join(a));
    }

    #[test]
    fn join_is_associative(a in kind_strategy(), b in kind_strategy(), c in kind_strategy()) {
        prop_assert_eq!(a.join(b).join(c), a.join(b.join(c)));
    }

    #[test]
    fn join_is_an_upper_bound(a in kind_strategy(), b in kind_strategy()) {
        let joined = a.join(b);
        prop_assert_eq!(joined.join(a), joined);
        prop_assert_eq!(joined.join(b), joined);
    }
}

// -- Keys --

proptest! {
    #[test]
    fn int_keys_round_trip(value in any::<i32>()) {
        let key = int_key(value);
        prop_assert!(key.is_int_key());
        prop_assert_eq!(key.int_value(), Some(value));
        prop_assert_eq!(key.kind(), Some(KeyKind::Int(value)));
        prop_assert_eq!(int_key(value), key);
        prop_assert_eq!(key.to_string(), value.to_string());
    }

    #[test]
    fn string_keys_round_trip(text in "[a-z_]{0,12}") {
        let key = string_key(&text);
        prop_assert!(key.is_string_key());
        prop_assert_eq!(string_key(&text), key);
        prop_assert_eq!(keys().name_of(key), Some(text.as_str()));
        prop_assert_eq!(key.to_string(), text);
    }
}

// -- Merge --

proptest! {
    #[test]
    fn building_is_deterministic(blueprint in blueprint_strategy()) {
        let a = build(&blueprint);
        let b = build(&blueprint);
        prop_assert!(a.equivalent(NodeId::ROOT, &b, NodeId::ROOT));
    }

    #[test]
    fn merge_is_idempotent(a in blueprint_strategy(), b in blueprint_strategy()) {
        let (a, b) = (build(&a), build(&b));
        let mut dst = merged(&a, &b);
        let count = dst.node_count();
        let stamped = dst.generation(NodeId::ROOT);

        prop_assert!(!dst.merge(NodeId::ROOT, &b, NodeId::ROOT, true, &FlatHierarchy));
        prop_assert!(!dst.merge(NodeId::ROOT, &a, NodeId::ROOT, true, &FlatHierarchy));
        prop_assert_eq!(dst.node_count(), count);
        prop_assert_eq!(dst.generation(NodeId::ROOT), stamped);
    }

    #[test]
    fn merge_is_commutative(a in blueprint_strategy(), b in blueprint_strategy()) {
        let (a, b) = (build(&a), build(&b));
        let ab = merged(&a, &b);
        let ba = merged(&b, &a);
        prop_assert!(
            ab.equivalent(NodeId::ROOT, &ba, NodeId::ROOT),
            "{} vs {}",
            ab.render(NodeId::ROOT, &FlatHierarchy),
            ba.render(NodeId::ROOT, &FlatHierarchy),
        );
    }

    #[test]
    fn type_order_is_total_and_matches_equivalence(a in blueprint_strategy(), b in blueprint_strategy()) {
        let (a, b) = (build(&a), build(&b));
        let forward = a.cmp_types(NodeId::ROOT, &b, NodeId::ROOT);
        prop_assert_eq!(b.cmp_types(NodeId::ROOT, &a, NodeId::ROOT), forward.reverse());
        prop_assert_eq!(forward.is_eq(), a.equivalent(NodeId::ROOT, &b, NodeId::ROOT));
    }

    #[test]
    fn merge_reaches_an_upper_bound(a in blueprint_strategy(), b in blueprint_strategy()) {
        let (a, b) = (build(&a), build(&b));
        let joined = merged(&a, &b);
        prop_assert_eq!(joined.ptype(NodeId::ROOT), a.ptype(NodeId::ROOT).join(b.ptype(NodeId::ROOT)));
        for (key, _) in a.children(NodeId::ROOT).iter().chain(b.children(NodeId::ROOT)) {
            prop_assert!(!joined.lookup_at(NodeId::ROOT, *key).is_unknown());
        }
    }
}

// -- Generation Clock --

#[derive(Clone, Copy, Debug)]
enum ClockOp {
    Advance,
    Refresh,
    Reconcile(u64),
}

fn clock_op_strategy() -> impl Strategy<Value = ClockOp> {
    prop_oneof![
        Just(ClockOp::Advance),
        Just(ClockOp::Refresh),
        (0..64u64).prop_map(ClockOp::Reconcile),
    ]
}

proptest! {
    #[test]
    fn generation_view_is_monotonic(ops in prop::collection::vec(clock_op_strategy(), 1..32)) {
        let mut last = current_generation();
        for op in ops {
            let view = match op {
                ClockOp::Advance => advance_generation(),
                ClockOp::Refresh => refresh_generation(),
                ClockOp::Reconcile(raw) => reconcile_generation(Generation::from_raw(raw)),
            };
            prop_assert!(view >= last);
            prop_assert_eq!(current_generation(), view);
            last = view;
        }
        prop_assert!(refresh_generation() >= last);
        prop_assert!(refresh_generation() >= global_generation());
    }
}
