/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::slot_manager::SlotManager;
use super::{ContradictionKind, Error};
use crate::hierarchy::{Qualifier, QualifierHierarchy};
use crate::model::{
    ArithmeticConstraint, ArithmeticOp, CombineConstraint, ComparableConstraint, Constraint,
    EqualityConstraint, ExistentialConstraint, ImplicationConstraint, InequalityConstraint,
    PreferenceConstraint, Slot, SlotId, SubtypeConstraint,
};
use crate::source::AnnotationLocation;
use std::rc::Rc;
use utils::dlog;
use utils::hash::HashSet;

/// Sole authority for constraint construction and the live working set.
///
/// Binary constraints between two constants never reach the set: they are
/// folded against the hierarchy at creation, into `AlwaysTrue` when
/// satisfied and into a reported contradiction plus `AlwaysFalse` when
/// violated. Reporting at creation time is deliberate: the user sees the
/// offending code immediately instead of an unsolvable constraint set
/// failing much later inside a solver.
pub struct ConstraintManager {
    hierarchy: Rc<dyn QualifierHierarchy>,
    permissive: bool,

    constraints: HashSet<Constraint>,
    ignore_constraints: bool,

    // stamped on every constructed constraint; the traversal layer updates
    // it as it walks the program
    current_location: AnnotationLocation,

    errors: Vec<Error>,
}

impl ConstraintManager {
    pub fn new(hierarchy: Rc<dyn QualifierHierarchy>, permissive: bool) -> Self {
        Self {
            hierarchy,
            permissive,
            constraints: HashSet::default(),
            ignore_constraints: false,
            current_location: AnnotationLocation::Missing,
            errors: Vec::new(),
        }
    }

    pub fn set_location(&mut self, location: AnnotationLocation) {
        self.current_location = location;
    }

    /// Suppress constraint recording, e.g. while a provisional flow pass
    /// analyzes code whose results should not yet generate constraints.
    /// `create_*` still works and still folds/reports.
    pub fn start_ignoring_constraints(&mut self) {
        self.ignore_constraints = true;
    }

    pub fn stop_ignoring_constraints(&mut self) {
        self.ignore_constraints = false;
    }

    pub fn constraints(&self) -> &HashSet<Constraint> {
        &self.constraints
    }

    /// Hand the accumulated set off (to the normalizer), leaving the
    /// manager empty.
    pub fn drain(&mut self) -> HashSet<Constraint> {
        std::mem::take(&mut self.constraints)
    }

    fn add(&mut self, constraint: Constraint) {
        if self.ignore_constraints || constraint.is_sentinel() {
            return;
        }
        self.constraints.insert(constraint);
    }

    fn constant_pair(
        &self,
        slots: &SlotManager,
        a: SlotId,
        b: SlotId,
    ) -> Option<(Qualifier, Qualifier)> {
        let a = slots.constant_value(a)?.clone();
        let b = slots.constant_value(b)?.clone();
        Some((a, b))
    }

    fn report_contradiction(&mut self, kind: ContradictionKind, first: Qualifier, second: Qualifier) {
        self.errors.push(Error::Contradiction {
            kind,
            first,
            second,
            location: self.current_location.clone(),
        });
    }

    pub fn create_subtype(&mut self, slots: &SlotManager, sub: SlotId, sup: SlotId) -> Constraint {
        if let Some((sub_value, sup_value)) = self.constant_pair(slots, sub, sup) {
            if self.hierarchy.is_subtype(&sub_value, &sup_value) {
                return Constraint::AlwaysTrue;
            }
            self.report_contradiction(ContradictionKind::Subtype, sub_value, sup_value);
            return Constraint::AlwaysFalse;
        }
        Constraint::Subtype(SubtypeConstraint::new(
            sub,
            sup,
            self.current_location.clone(),
        ))
    }

    pub fn create_equality(&mut self, slots: &SlotManager, a: SlotId, b: SlotId) -> Constraint {
        if let Some((a_value, b_value)) = self.constant_pair(slots, a, b) {
            if self.hierarchy.are_same(&a_value, &b_value) {
                return Constraint::AlwaysTrue;
            }
            self.report_contradiction(ContradictionKind::Equality, a_value, b_value);
            return Constraint::AlwaysFalse;
        }
        Constraint::Equality(EqualityConstraint::new(a, b, self.current_location.clone()))
    }

    pub fn create_inequality(&mut self, slots: &SlotManager, a: SlotId, b: SlotId) -> Constraint {
        if let Some((a_value, b_value)) = self.constant_pair(slots, a, b) {
            if !self.hierarchy.are_same(&a_value, &b_value) {
                return Constraint::AlwaysTrue;
            }
            self.report_contradiction(ContradictionKind::Inequality, a_value, b_value);
            return Constraint::AlwaysFalse;
        }
        Constraint::Inequality(InequalityConstraint::new(
            a,
            b,
            self.current_location.clone(),
        ))
    }

    pub fn create_comparable(&mut self, slots: &SlotManager, a: SlotId, b: SlotId) -> Constraint {
        if let Some((a_value, b_value)) = self.constant_pair(slots, a, b) {
            if self.hierarchy.is_subtype(&a_value, &b_value)
                || self.hierarchy.is_subtype(&b_value, &a_value)
            {
                return Constraint::AlwaysTrue;
            }
            self.report_contradiction(ContradictionKind::Comparable, a_value, b_value);
            return Constraint::AlwaysFalse;
        }
        Constraint::Comparable(ComparableConstraint::new(
            a,
            b,
            self.current_location.clone(),
        ))
    }

    // Combine and arithmetic semantics live in the checker's oracle, which
    // this core treats as uninterpreted for these kinds, so there is no
    // folding shortcut here.

    pub fn create_combine(&mut self, target: SlotId, decl: SlotId, result: SlotId) -> Constraint {
        Constraint::Combine(CombineConstraint {
            target,
            decl,
            result,
            location: self.current_location.clone(),
        })
    }

    pub fn create_arithmetic(
        &mut self,
        operation: ArithmeticOp,
        left: SlotId,
        right: SlotId,
        result: SlotId,
    ) -> Constraint {
        Constraint::Arithmetic(ArithmeticConstraint {
            operation,
            left,
            right,
            result,
            location: self.current_location.clone(),
        })
    }

    pub fn create_preference(
        &mut self,
        slots: &SlotManager,
        variable: SlotId,
        goal: SlotId,
        weight: i32,
    ) -> Constraint {
        let variable_ok = slots.slot(variable).is_some_and(Slot::is_variable);
        let goal_ok = slots.slot(goal).is_some_and(|slot| !slot.is_variable());
        if !variable_ok || !goal_ok {
            if self.permissive {
                dlog!("malformed preference: {variable} = {goal}");
            } else {
                self.errors.push(Error::MalformedPreference { variable, goal });
            }
        }
        Constraint::Preference(PreferenceConstraint {
            variable,
            goal,
            weight,
            location: self.current_location.clone(),
        })
    }

    pub fn create_existential(
        &mut self,
        potential: SlotId,
        if_exists: Vec<Constraint>,
        if_not_exists: Vec<Constraint>,
    ) -> Constraint {
        Constraint::Existential(ExistentialConstraint::new(
            potential,
            if_exists,
            if_not_exists,
            self.current_location.clone(),
        ))
    }

    /// Build an implication, folding statically known parts away:
    /// no assumptions left means the conclusion is a hard constraint, a
    /// false assumption makes the implication vacuous, a false conclusion
    /// turns the remaining assumptions themselves into hard constraints.
    pub fn create_implication(
        &mut self,
        assumptions: Vec<Constraint>,
        conclusion: Constraint,
    ) -> Constraint {
        if assumptions.is_empty() {
            return conclusion;
        }

        let mut refined = Vec::with_capacity(assumptions.len());
        for assumption in assumptions {
            match assumption {
                Constraint::AlwaysFalse => return Constraint::AlwaysTrue,
                Constraint::AlwaysTrue => {}
                other => refined.push(other),
            }
        }

        if refined.is_empty() {
            return conclusion;
        }

        match conclusion {
            Constraint::AlwaysTrue => Constraint::AlwaysTrue,
            Constraint::AlwaysFalse => {
                // a statically false conclusion reduces the implication to
                // the conjunction of its assumptions, recorded directly as
                // hard constraints
                for assumption in refined {
                    self.add(assumption);
                }
                Constraint::AlwaysTrue
            }
            conclusion => Constraint::Implication(ImplicationConstraint {
                assumptions: refined,
                conclusion: Box::new(conclusion),
                location: self.current_location.clone(),
            }),
        }
    }

    /// Record `sub <: sup`. A constant top on the subtype side (and
    /// symmetrically a constant bottom on the supertype side) pins the other
    /// operand exactly, so the constraint is strengthened to an equality.
    pub fn add_subtype(&mut self, slots: &SlotManager, sub: SlotId, sup: SlotId) {
        if let Some(sub_value) = slots.constant_value(sub) {
            let top = self.hierarchy.top();
            if self.hierarchy.are_same(sub_value, &top) {
                self.add_equality(slots, sup, sub);
                return;
            }
        }
        if let Some(sup_value) = slots.constant_value(sup) {
            let bottom = self.hierarchy.bottom();
            if self.hierarchy.are_same(sup_value, &bottom) {
                self.add_equality(slots, sub, sup);
                return;
            }
        }
        let constraint = self.create_subtype(slots, sub, sup);
        self.add(constraint);
    }

    pub fn add_equality(&mut self, slots: &SlotManager, a: SlotId, b: SlotId) {
        let constraint = self.create_equality(slots, a, b);
        self.add(constraint);
    }

    pub fn add_inequality(&mut self, slots: &SlotManager, a: SlotId, b: SlotId) {
        let constraint = self.create_inequality(slots, a, b);
        self.add(constraint);
    }

    pub fn add_comparable(&mut self, slots: &SlotManager, a: SlotId, b: SlotId) {
        let constraint = self.create_comparable(slots, a, b);
        self.add(constraint);
    }

    pub fn add_combine(&mut self, target: SlotId, decl: SlotId, result: SlotId) {
        let constraint = self.create_combine(target, decl, result);
        self.add(constraint);
    }

    pub fn add_arithmetic(
        &mut self,
        operation: ArithmeticOp,
        left: SlotId,
        right: SlotId,
        result: SlotId,
    ) {
        let constraint = self.create_arithmetic(operation, left, right, result);
        self.add(constraint);
    }

    pub fn add_preference(
        &mut self,
        slots: &SlotManager,
        variable: SlotId,
        goal: SlotId,
        weight: i32,
    ) {
        let constraint = self.create_preference(slots, variable, goal, weight);
        self.add(constraint);
    }

    pub fn add_existential(
        &mut self,
        potential: SlotId,
        if_exists: Vec<Constraint>,
        if_not_exists: Vec<Constraint>,
    ) {
        let constraint = self.create_existential(potential, if_exists, if_not_exists);
        self.add(constraint);
    }

    pub fn add_implication(&mut self, assumptions: Vec<Constraint>, conclusion: Constraint) {
        let constraint = self.create_implication(assumptions, conclusion);
        self.add(constraint);
    }

    pub(crate) fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}
