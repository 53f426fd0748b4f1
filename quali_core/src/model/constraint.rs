/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::slot::{ArithmeticOp, SlotId};
use crate::source::AnnotationLocation;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// A logical relationship between slots. The working set is a hash set, so
/// equality and hashing deliberately exclude the source location: the same
/// relationship created at two call sites is one constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Subtype(SubtypeConstraint),
    Equality(EqualityConstraint),
    Inequality(InequalityConstraint),
    Comparable(ComparableConstraint),
    Combine(CombineConstraint),
    Arithmetic(ArithmeticConstraint),
    Preference(PreferenceConstraint),
    Existential(ExistentialConstraint),
    Implication(ImplicationConstraint),
    /// Result of folding a constraint between constants that always holds.
    /// Never stored in the working set, never handed to a solver.
    AlwaysTrue,
    /// Result of folding a constraint between constants that can never hold.
    /// Never stored in the working set, never handed to a solver.
    AlwaysFalse,
}

/// `subtype <: supertype` must hold in the solution.
#[derive(Debug, Clone)]
pub struct SubtypeConstraint {
    pub subtype: SlotId,
    pub supertype: SlotId,
    pub location: AnnotationLocation,
}

/// `first = second`. Operands are stored in id order so that creation in
/// either order yields the same set element.
#[derive(Debug, Clone)]
pub struct EqualityConstraint {
    pub first: SlotId,
    pub second: SlotId,
    pub location: AnnotationLocation,
}

/// `first != second`.
#[derive(Debug, Clone)]
pub struct InequalityConstraint {
    pub first: SlotId,
    pub second: SlotId,
    pub location: AnnotationLocation,
}

/// `first <: second` or `second <: first`. Operands are stored in id order,
/// like equality.
#[derive(Debug, Clone)]
pub struct ComparableConstraint {
    pub first: SlotId,
    pub second: SlotId,
    pub location: AnnotationLocation,
}

/// `result = viewpoint-adapt(target, decl)`.
#[derive(Debug, Clone)]
pub struct CombineConstraint {
    pub target: SlotId,
    pub decl: SlotId,
    pub result: SlotId,
    pub location: AnnotationLocation,
}

/// `result = left op right` under the checker's qualifier semantics.
#[derive(Debug, Clone)]
pub struct ArithmeticConstraint {
    pub operation: ArithmeticOp,
    pub left: SlotId,
    pub right: SlotId,
    pub result: SlotId,
    pub location: AnnotationLocation,
}

/// Soft hint: prefer `variable = goal`, with the given weight.
#[derive(Debug, Clone)]
pub struct PreferenceConstraint {
    pub variable: SlotId,
    pub goal: SlotId,
    pub weight: i32,
    pub location: AnnotationLocation,
}

/// If `potential` is materialized in source then every constraint in
/// `if_exists` must hold, otherwise every constraint in `if_not_exists`.
#[derive(Debug, Clone)]
pub struct ExistentialConstraint {
    pub potential: SlotId,
    pub if_exists: Vec<Constraint>,
    pub if_not_exists: Vec<Constraint>,
    pub location: AnnotationLocation,
}

/// `conclusion` must hold whenever all of `assumptions` hold.
#[derive(Debug, Clone)]
pub struct ImplicationConstraint {
    pub assumptions: Vec<Constraint>,
    pub conclusion: Box<Constraint>,
    pub location: AnnotationLocation,
}

impl SubtypeConstraint {
    pub fn new(subtype: SlotId, supertype: SlotId, location: AnnotationLocation) -> Self {
        Self {
            subtype,
            supertype,
            location,
        }
    }
}

impl EqualityConstraint {
    pub fn new(a: SlotId, b: SlotId, location: AnnotationLocation) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first,
            second,
            location,
        }
    }
}

impl InequalityConstraint {
    pub fn new(first: SlotId, second: SlotId, location: AnnotationLocation) -> Self {
        Self {
            first,
            second,
            location,
        }
    }
}

impl ComparableConstraint {
    pub fn new(a: SlotId, b: SlotId, location: AnnotationLocation) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first,
            second,
            location,
        }
    }
}

impl ExistentialConstraint {
    pub fn new(
        potential: SlotId,
        if_exists: Vec<Constraint>,
        if_not_exists: Vec<Constraint>,
        location: AnnotationLocation,
    ) -> Self {
        Self {
            potential,
            if_exists,
            if_not_exists,
            location,
        }
    }
}

// Location-blind equality and hashing for every payload struct, so the
// working set collapses duplicates created at different source positions.

macro_rules! eq_hash_on {
    ($ty:ident: $($field:ident),+) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $(self.$field == other.$field)&&+
            }
        }
        impl Eq for $ty {}
        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                $(self.$field.hash(state);)+
            }
        }
    };
}

eq_hash_on!(SubtypeConstraint: subtype, supertype);
eq_hash_on!(EqualityConstraint: first, second);
eq_hash_on!(InequalityConstraint: first, second);
eq_hash_on!(ComparableConstraint: first, second);
eq_hash_on!(CombineConstraint: target, decl, result);
eq_hash_on!(ArithmeticConstraint: operation, left, right, result);
eq_hash_on!(PreferenceConstraint: variable, goal, weight);
eq_hash_on!(ExistentialConstraint: potential, if_exists, if_not_exists);
eq_hash_on!(ImplicationConstraint: assumptions, conclusion);

impl Constraint {
    /// The ordered list of slots this constraint references, recursing into
    /// conditional and implication bodies.
    pub fn slots(&self) -> Vec<SlotId> {
        match self {
            Constraint::Subtype(c) => vec![c.subtype, c.supertype],
            Constraint::Equality(c) => vec![c.first, c.second],
            Constraint::Inequality(c) => vec![c.first, c.second],
            Constraint::Comparable(c) => vec![c.first, c.second],
            Constraint::Combine(c) => vec![c.target, c.decl, c.result],
            Constraint::Arithmetic(c) => vec![c.left, c.right, c.result],
            Constraint::Preference(c) => vec![c.variable, c.goal],
            Constraint::Existential(c) => {
                let mut slots = vec![c.potential];
                for nested in c.if_exists.iter().chain(c.if_not_exists.iter()) {
                    slots.extend(nested.slots());
                }
                slots
            }
            Constraint::Implication(c) => {
                let mut slots = Vec::new();
                for assumption in &c.assumptions {
                    slots.extend(assumption.slots());
                }
                slots.extend(c.conclusion.slots());
                slots
            }
            Constraint::AlwaysTrue | Constraint::AlwaysFalse => vec![],
        }
    }

    pub fn location(&self) -> AnnotationLocation {
        match self {
            Constraint::Subtype(c) => c.location.clone(),
            Constraint::Equality(c) => c.location.clone(),
            Constraint::Inequality(c) => c.location.clone(),
            Constraint::Comparable(c) => c.location.clone(),
            Constraint::Combine(c) => c.location.clone(),
            Constraint::Arithmetic(c) => c.location.clone(),
            Constraint::Preference(c) => c.location.clone(),
            Constraint::Existential(c) => c.location.clone(),
            Constraint::Implication(c) => c.location.clone(),
            Constraint::AlwaysTrue | Constraint::AlwaysFalse => AnnotationLocation::Missing,
        }
    }

    /// The two operands, for the constraint shapes the normalizer can expand.
    pub fn as_binary(&self) -> Option<(SlotId, SlotId)> {
        match self {
            Constraint::Subtype(c) => Some((c.subtype, c.supertype)),
            Constraint::Equality(c) => Some((c.first, c.second)),
            Constraint::Inequality(c) => Some((c.first, c.second)),
            Constraint::Comparable(c) => Some((c.first, c.second)),
            _ => None,
        }
    }

    /// Remake a binary constraint with new operands, keeping its kind and
    /// location. Only meaningful for the [`Self::as_binary`] shapes.
    pub fn with_operands(&self, left: SlotId, right: SlotId) -> Constraint {
        match self {
            Constraint::Subtype(c) => {
                Constraint::Subtype(SubtypeConstraint::new(left, right, c.location.clone()))
            }
            Constraint::Equality(c) => {
                Constraint::Equality(EqualityConstraint::new(left, right, c.location.clone()))
            }
            Constraint::Inequality(c) => {
                Constraint::Inequality(InequalityConstraint::new(left, right, c.location.clone()))
            }
            Constraint::Comparable(c) => {
                Constraint::Comparable(ComparableConstraint::new(left, right, c.location.clone()))
            }
            _ => unreachable!("not a binary constraint: {self}"),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Constraint::AlwaysTrue | Constraint::AlwaysFalse)
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Subtype(c) => write!(f, "{} <: {}", c.subtype, c.supertype),
            Constraint::Equality(c) => write!(f, "{} = {}", c.first, c.second),
            Constraint::Inequality(c) => write!(f, "{} != {}", c.first, c.second),
            Constraint::Comparable(c) => write!(f, "{} <:> {}", c.first, c.second),
            Constraint::Combine(c) => {
                write!(f, "{} = combine({}, {})", c.result, c.target, c.decl)
            }
            Constraint::Arithmetic(c) => write!(
                f,
                "{} = {} {} {}",
                c.result,
                c.left,
                c.operation.as_ref(),
                c.right
            ),
            Constraint::Preference(c) => {
                write!(f, "prefer {} = {} (weight {})", c.variable, c.goal, c.weight)
            }
            Constraint::Existential(c) => {
                write!(f, "if {} exists {{ ", c.potential)?;
                for nested in &c.if_exists {
                    write!(f, "{nested}; ")?;
                }
                write!(f, "}} else {{ ")?;
                for nested in &c.if_not_exists {
                    write!(f, "{nested}; ")?;
                }
                write!(f, "}}")
            }
            Constraint::Implication(c) => {
                for (i, assumption) in c.assumptions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{assumption}")?;
                }
                write!(f, " -> {}", c.conclusion)
            }
            Constraint::AlwaysTrue => write!(f, "true"),
            Constraint::AlwaysFalse => write!(f, "false"),
        }
    }
}
