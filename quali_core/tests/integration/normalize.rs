/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::helper::{ctx, loc, unwrap_or_panic};
use quali_core::infer::{Error, InferenceContext, normalize};
use quali_core::model::{Constraint, SlotId, SubtypeConstraint};
use quali_core::source::AnnotationLocation;
use utils::hash::HashSet;

fn sub(left: SlotId, right: SlotId) -> Constraint {
    Constraint::Subtype(SubtypeConstraint::new(
        left,
        right,
        AnnotationLocation::Missing,
    ))
}

fn collect_subtype_pairs(constraint: &Constraint, pairs: &mut Vec<(SlotId, SlotId)>) {
    match constraint {
        Constraint::Subtype(c) => pairs.push((c.subtype, c.supertype)),
        Constraint::Existential(c) => {
            for nested in c.if_exists.iter().chain(c.if_not_exists.iter()) {
                collect_subtype_pairs(nested, pairs);
            }
        }
        _ => {}
    }
}

/// An existential chain of the given length: `length - 1` nested existential
/// wrappers around a terminal variable. Length 1 is a plain variable.
fn chain(ctx: &mut InferenceContext, length: usize, offset: usize) -> SlotId {
    let mut slot = ctx
        .slots
        .get_or_create_variable(loc(offset * 100, offset * 100 + 1));
    for i in 1..length {
        let potential = ctx
            .slots
            .get_or_create_variable(loc(offset * 100 + 2 * i, offset * 100 + 2 * i + 1));
        slot = ctx.slots.get_or_create_existential(potential, slot);
    }
    slot
}

#[test]
fn constraints_without_existentials_pass_through() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));
    let v3 = ctx.slots.get_or_create_variable(loc(4, 5));
    ctx.add_subtype(v1, v2);
    ctx.add_combine(v1, v2, v3);

    let before = ctx.constraints.constraints().clone();
    let after = unwrap_or_panic(ctx.normalize());
    assert_eq!(before, after);
}

#[test]
fn two_chain_worked_example() {
    let mut ctx = ctx();
    let p = ctx.slots.get_or_create_variable(loc(0, 1));
    let a = ctx.slots.get_or_create_variable(loc(2, 3));
    let q = ctx.slots.get_or_create_variable(loc(4, 5));
    let b = ctx.slots.get_or_create_variable(loc(6, 7));
    let left = ctx.slots.get_or_create_existential(p, a);
    let right = ctx.slots.get_or_create_existential(q, b);

    // (p | a) <: (q | b)
    ctx.add_subtype(left, right);
    let normalized = unwrap_or_panic(ctx.normalize());

    // one outer existential on p, one nested on q per branch
    assert_eq!(normalized.len(), 1);
    let outer = match normalized.iter().next().unwrap() {
        Constraint::Existential(outer) => outer,
        other => panic!("expected an existential constraint, got {other}"),
    };
    assert_eq!(outer.potential, p);

    match outer.if_exists.as_slice() {
        [Constraint::Existential(nested)] => {
            assert_eq!(nested.potential, q);
            assert_eq!(nested.if_exists, vec![sub(p, q)]);
            assert_eq!(nested.if_not_exists, vec![sub(p, b)]);
        }
        other => panic!("expected one nested existential, got {other:?}"),
    }
    match outer.if_not_exists.as_slice() {
        [Constraint::Existential(nested)] => {
            assert_eq!(nested.potential, q);
            assert_eq!(nested.if_exists, vec![sub(a, q)]);
            assert_eq!(nested.if_not_exists, vec![sub(a, b)]);
        }
        other => panic!("expected one nested existential, got {other:?}"),
    }
}

#[test]
fn two_by_two_chains_derive_four_constraints() {
    let mut ctx = ctx();
    let left = chain(&mut ctx, 2, 0);
    let right = chain(&mut ctx, 2, 1);
    ctx.add_subtype(left, right);

    let normalized = unwrap_or_panic(ctx.normalize());
    let mut pairs = Vec::new();
    for constraint in &normalized {
        collect_subtype_pairs(constraint, &mut pairs);
    }
    assert_eq!(pairs.len(), 4);
}

#[test]
fn normalization_removes_every_existential() {
    for left_len in 1..=5 {
        for right_len in 1..=5 {
            let mut ctx = ctx();
            let left = chain(&mut ctx, left_len, 0);
            let right = chain(&mut ctx, right_len, 1);
            ctx.add_subtype(left, right);

            let normalized = unwrap_or_panic(ctx.normalize());
            for constraint in &normalized {
                for id in constraint.slots() {
                    assert!(
                        ctx.slot(id).is_some_and(|slot| !matches!(
                            slot,
                            quali_core::model::Slot::Existential(_)
                        )),
                        "existential slot {id} survived ({left_len}x{right_len} chains)"
                    );
                }
            }
        }
    }
}

#[test]
fn no_derived_constraint_compares_a_slot_to_itself() {
    let mut ctx = ctx();
    let x = ctx.slots.get_or_create_variable(loc(0, 1));
    let t = ctx.slots.get_or_create_variable(loc(2, 3));
    let u = ctx.slots.get_or_create_variable(loc(4, 5));
    // x is potential on both sides
    let left = ctx.slots.get_or_create_existential(x, t);
    let right = ctx.slots.get_or_create_existential(x, u);
    ctx.add_subtype(left, right);

    let normalized = unwrap_or_panic(ctx.normalize());
    let mut pairs = Vec::new();
    for constraint in &normalized {
        collect_subtype_pairs(constraint, &mut pairs);
    }
    assert!(!pairs.is_empty());
    for (left, right) in pairs {
        assert_ne!(left, right);
    }
}

#[test]
fn constraints_over_one_chain_share_a_tree() {
    let mut ctx = ctx();
    let p = ctx.slots.get_or_create_variable(loc(0, 1));
    let a = ctx.slots.get_or_create_variable(loc(2, 3));
    let v3 = ctx.slots.get_or_create_variable(loc(4, 5));
    let v4 = ctx.slots.get_or_create_variable(loc(6, 7));
    let left = ctx.slots.get_or_create_existential(p, a);

    ctx.add_subtype(left, v3);
    ctx.add_subtype(left, v4);
    let normalized = unwrap_or_panic(ctx.normalize());

    // both constraints branch on p, so they fold into one existential
    assert_eq!(normalized.len(), 1);
    let outer = match normalized.iter().next().unwrap() {
        Constraint::Existential(outer) => outer,
        other => panic!("expected an existential constraint, got {other}"),
    };
    assert_eq!(outer.potential, p);

    let branch: HashSet<Constraint> = outer.if_exists.iter().cloned().collect();
    assert_eq!(branch, HashSet::from_iter([sub(p, v3), sub(p, v4)]));
    let branch: HashSet<Constraint> = outer.if_not_exists.iter().cloned().collect();
    assert_eq!(branch, HashSet::from_iter([sub(a, v3), sub(a, v4)]));
}

#[test]
fn repeated_slot_chain_prunes_contradictory_paths() {
    let mut ctx = ctx();
    let x = ctx.slots.get_or_create_variable(loc(0, 1));
    let t = ctx.slots.get_or_create_variable(loc(2, 3));
    let u = ctx.slots.get_or_create_variable(loc(4, 5));
    // left chain [x, x, t]: the repeated x can only contribute once
    let inner = ctx.slots.get_or_create_existential(x, t);
    let outer = ctx.slots.get_or_create_existential(x, inner);
    ctx.add_subtype(outer, u);

    let normalized = unwrap_or_panic(ctx.normalize());
    assert_eq!(normalized.len(), 1);
    let existential = match normalized.iter().next().unwrap() {
        Constraint::Existential(existential) => existential,
        other => panic!("expected an existential constraint, got {other}"),
    };
    assert_eq!(existential.potential, x);
    assert_eq!(existential.if_exists, vec![sub(x, u)]);
    assert_eq!(existential.if_not_exists, vec![sub(t, u)]);
}

#[test]
fn dangling_slot_is_fatal_in_strict_mode() {
    let ctx = ctx();
    let mut constraints: HashSet<Constraint> = HashSet::default();
    constraints.insert(sub(SlotId(0), SlotId(9999)));

    let result = normalize(&ctx.slots, constraints, false);
    assert!(matches!(
        result,
        Err(Error::DanglingSlot { slot: SlotId(9999), .. })
    ));
}

#[test]
fn dangling_slot_is_dropped_in_permissive_mode() {
    let ctx = ctx();
    let mut constraints: HashSet<Constraint> = HashSet::default();
    constraints.insert(sub(SlotId(0), SlotId(9999)));

    let normalized = normalize(&ctx.slots, constraints, true).unwrap();
    assert!(normalized.is_empty());
}

#[test]
fn surviving_existential_is_fatal_even_in_permissive_mode() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));
    let v3 = ctx.slots.get_or_create_variable(loc(4, 5));
    let existential = ctx.slots.get_or_create_existential(v1, v2);
    // combine is not a binary constraint, so expansion never touches it
    ctx.add_combine(existential, v2, v3);

    let drained = ctx.constraints.drain();
    let result = normalize(&ctx.slots, drained, true);
    assert!(matches!(
        result,
        Err(Error::ExistentialSurvivedNormalization { slot, .. }) if slot == existential
    ));
}
