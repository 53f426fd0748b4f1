/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::helper::{ctx, loc, permissive_ctx, qual};
use quali_core::infer::{ContradictionKind, Error};
use quali_core::model::Constraint;

#[test]
fn satisfied_constant_subtype_folds_away() {
    let mut ctx = ctx();
    let left = ctx.slots.get_or_create_constant(qual("Left"));
    let mid = ctx.slots.get_or_create_constant(qual("Mid"));
    ctx.add_subtype(left, mid);
    assert!(ctx.constraints.constraints().is_empty());
    assert!(ctx.check_errors().is_ok());
}

#[test]
fn violated_constant_subtype_is_a_contradiction() {
    let mut ctx = ctx();
    let left = ctx.slots.get_or_create_constant(qual("Left"));
    let mid = ctx.slots.get_or_create_constant(qual("Mid"));
    ctx.set_location(loc(0, 9));
    ctx.add_subtype(mid, left);
    assert!(ctx.constraints.constraints().is_empty());

    let summary = ctx.check_errors().unwrap_err();
    assert!(matches!(
        summary.errors(),
        [Error::Contradiction {
            kind: ContradictionKind::Subtype,
            first,
            second,
            ..
        }] if *first == qual("Mid") && *second == qual("Left")
    ));
}

#[test]
fn constant_equality_folding() {
    let mut ctx = ctx();
    let mid = ctx.slots.get_or_create_constant(qual("Mid"));
    let left = ctx.slots.get_or_create_constant(qual("Left"));

    ctx.add_equality(mid, mid);
    assert!(ctx.constraints.constraints().is_empty());
    assert!(ctx.check_errors().is_ok());

    ctx.add_equality(mid, left);
    assert!(ctx.constraints.constraints().is_empty());
    let summary = ctx.check_errors().unwrap_err();
    assert!(matches!(
        summary.errors(),
        [Error::Contradiction {
            kind: ContradictionKind::Equality,
            ..
        }]
    ));
}

#[test]
fn constant_inequality_folding() {
    let mut ctx = ctx();
    let left = ctx.slots.get_or_create_constant(qual("Left"));
    let right = ctx.slots.get_or_create_constant(qual("Right"));

    // distinct constants trivially satisfy an inequality
    ctx.add_inequality(left, right);
    assert!(ctx.constraints.constraints().is_empty());
    assert!(ctx.check_errors().is_ok());

    ctx.add_inequality(left, left);
    let summary = ctx.check_errors().unwrap_err();
    assert!(matches!(
        summary.errors(),
        [Error::Contradiction {
            kind: ContradictionKind::Inequality,
            ..
        }]
    ));
}

#[test]
fn incomparable_constants_are_a_contradiction() {
    let mut ctx = ctx();
    let left = ctx.slots.get_or_create_constant(qual("Left"));
    let right = ctx.slots.get_or_create_constant(qual("Right"));
    let mid = ctx.slots.get_or_create_constant(qual("Mid"));

    // comparable in either direction is fine
    ctx.add_comparable(mid, left);
    assert!(ctx.check_errors().is_ok());

    ctx.add_comparable(left, right);
    let summary = ctx.check_errors().unwrap_err();
    assert!(matches!(
        summary.errors(),
        [Error::Contradiction {
            kind: ContradictionKind::Comparable,
            ..
        }]
    ));
}

#[test]
fn equality_and_comparable_are_symmetric_set_elements() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    ctx.add_equality(v1, v2);
    ctx.add_equality(v2, v1);
    ctx.add_comparable(v1, v2);
    ctx.add_comparable(v2, v1);
    assert_eq!(ctx.constraints.constraints().len(), 2);
}

#[test]
fn duplicate_constraints_collapse_across_locations() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    ctx.set_location(loc(0, 9));
    ctx.add_subtype(v1, v2);
    ctx.set_location(loc(10, 19));
    ctx.add_subtype(v1, v2);
    assert_eq!(ctx.constraints.constraints().len(), 1);
}

#[test]
fn constant_top_subtype_operand_rewrites_to_equality() {
    let mut ctx = ctx();
    let v = ctx.slots.get_or_create_variable(loc(0, 1));
    let top = ctx.slots.top_constant();

    // TOP <: v pins v to TOP exactly
    ctx.add_subtype(top, v);
    let stored: Vec<_> = ctx.constraints.constraints().iter().collect();
    assert!(matches!(stored.as_slice(), [Constraint::Equality(_)]));
}

#[test]
fn constant_bottom_supertype_operand_rewrites_to_equality() {
    let mut ctx = ctx();
    let v = ctx.slots.get_or_create_variable(loc(0, 1));
    let bottom = ctx.slots.get_or_create_constant(qual("Bot"));

    ctx.add_subtype(v, bottom);
    let stored: Vec<_> = ctx.constraints.constraints().iter().collect();
    assert!(matches!(stored.as_slice(), [Constraint::Equality(_)]));
}

#[test]
fn subtype_of_constant_top_is_not_rewritten() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));
    let top = ctx.slots.top_constant();

    // the rewrite fires on a top *subtype* operand only; v1 <: TOP stays live
    ctx.add_subtype(v1, top);
    ctx.add_equality(v1, v2);

    let constraints = ctx.constraints.constraints();
    assert_eq!(constraints.len(), 2);
    assert_eq!(
        constraints
            .iter()
            .filter(|c| matches!(c, Constraint::Subtype(_)))
            .count(),
        1
    );
    assert_eq!(
        constraints
            .iter()
            .filter(|c| matches!(c, Constraint::Equality(_)))
            .count(),
        1
    );
}

#[test]
fn ignore_mode_suppresses_recording() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    ctx.constraints.start_ignoring_constraints();
    ctx.add_subtype(v1, v2);
    assert!(ctx.constraints.constraints().is_empty());

    ctx.constraints.stop_ignoring_constraints();
    ctx.add_equality(v1, v2);
    assert_eq!(ctx.constraints.constraints().len(), 1);
}

#[test]
fn preference_requires_a_variable_and_a_constant_goal() {
    let mut ctx = ctx();
    let v = ctx.slots.get_or_create_variable(loc(0, 1));
    let mid = ctx.slots.get_or_create_constant(qual("Mid"));

    ctx.add_preference(v, mid, 50);
    assert!(ctx.check_errors().is_ok());

    // operands swapped
    ctx.add_preference(mid, v, 50);
    let summary = ctx.check_errors().unwrap_err();
    assert!(matches!(
        summary.errors(),
        [Error::MalformedPreference { variable, goal }]
            if *variable == mid && *goal == v
    ));
}

#[test]
fn malformed_preference_is_tolerated_in_permissive_mode() {
    let mut ctx = permissive_ctx();
    let v = ctx.slots.get_or_create_variable(loc(0, 1));
    let mid = ctx.slots.get_or_create_constant(qual("Mid"));
    ctx.add_preference(mid, v, 50);
    assert!(ctx.check_errors().is_ok());
}

#[test]
fn implication_with_no_assumptions_is_the_conclusion() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    let conclusion = ctx.constraints.create_subtype(&ctx.slots, v1, v2);
    ctx.add_implication(vec![], conclusion);

    let stored: Vec<_> = ctx.constraints.constraints().iter().collect();
    assert!(matches!(stored.as_slice(), [Constraint::Subtype(_)]));
}

#[test]
fn implication_with_a_false_assumption_is_vacuous() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    let assumption = ctx.constraints.create_subtype(&ctx.slots, v1, v2);
    let conclusion = ctx.constraints.create_equality(&ctx.slots, v1, v2);
    ctx.add_implication(vec![Constraint::AlwaysFalse, assumption], conclusion);
    assert!(ctx.constraints.constraints().is_empty());
}

#[test]
fn implication_drops_true_assumptions() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    let assumption = ctx.constraints.create_subtype(&ctx.slots, v1, v2);
    let conclusion = ctx.constraints.create_equality(&ctx.slots, v1, v2);
    ctx.add_implication(
        vec![Constraint::AlwaysTrue, assumption.clone()],
        conclusion,
    );

    let stored: Vec<_> = ctx.constraints.constraints().iter().collect();
    match stored.as_slice() {
        [Constraint::Implication(implication)] => {
            assert_eq!(implication.assumptions, vec![assumption]);
        }
        other => panic!("expected a single implication, got {other:?}"),
    }
}

#[test]
fn implication_with_only_true_assumptions_is_the_conclusion() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    let conclusion = ctx.constraints.create_equality(&ctx.slots, v1, v2);
    ctx.add_implication(vec![Constraint::AlwaysTrue], conclusion);

    let stored: Vec<_> = ctx.constraints.constraints().iter().collect();
    assert!(matches!(stored.as_slice(), [Constraint::Equality(_)]));
}

#[test]
fn implication_with_a_true_conclusion_is_vacuous() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    let assumption = ctx.constraints.create_subtype(&ctx.slots, v1, v2);
    ctx.add_implication(vec![assumption], Constraint::AlwaysTrue);
    assert!(ctx.constraints.constraints().is_empty());
}

#[test]
fn implication_with_a_false_conclusion_hardens_its_assumptions() {
    let mut ctx = ctx();
    let v1 = ctx.slots.get_or_create_variable(loc(0, 1));
    let v2 = ctx.slots.get_or_create_variable(loc(2, 3));

    let assumption = ctx.constraints.create_subtype(&ctx.slots, v1, v2);
    ctx.add_implication(vec![assumption.clone()], Constraint::AlwaysFalse);

    let stored: Vec<_> = ctx.constraints.constraints().iter().collect();
    assert_eq!(stored.as_slice(), [&assumption]);
}
