/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The inference pipeline: slot creation during traversal, constraint
//! generation over those slots, then normalization of the accumulated set
//! into solver-ready form.

mod constraint_manager;
mod error;
mod normalize;
mod slot_manager;

pub use constraint_manager::ConstraintManager;
pub use error::{ContradictionKind, Error};
pub use normalize::normalize;
pub use slot_manager::{SlotAnnotation, SlotManager};

use crate::ErrorSummary;
use crate::hierarchy::QualifierHierarchy;
use crate::model::{ArithmeticOp, Constraint, Slot, SlotId};
use crate::source::{AnnotationLocation, FileDatabase};
use std::rc::Rc;
use utils::hash::HashSet;

/// Owns the two managers and the file database for one inference run.
/// The mode (strict or permissive) is fixed at construction and shared
/// by both managers.
pub struct InferenceContext {
    pub files: FileDatabase,
    pub slots: SlotManager,
    pub constraints: ConstraintManager,
    permissive: bool,
}

impl InferenceContext {
    pub fn new(
        files: FileDatabase,
        hierarchy: Rc<dyn QualifierHierarchy>,
        permissive: bool,
    ) -> Self {
        let slots = SlotManager::new(hierarchy.as_ref(), permissive);
        let constraints = ConstraintManager::new(hierarchy, permissive);
        Self {
            files,
            slots,
            constraints,
            permissive,
        }
    }

    pub fn permissive(&self) -> bool {
        self.permissive
    }

    pub fn set_location(&mut self, location: AnnotationLocation) {
        self.constraints.set_location(location);
    }

    pub fn add_subtype(&mut self, sub: SlotId, sup: SlotId) {
        self.constraints.add_subtype(&self.slots, sub, sup);
    }

    pub fn add_equality(&mut self, a: SlotId, b: SlotId) {
        self.constraints.add_equality(&self.slots, a, b);
    }

    pub fn add_inequality(&mut self, a: SlotId, b: SlotId) {
        self.constraints.add_inequality(&self.slots, a, b);
    }

    pub fn add_comparable(&mut self, a: SlotId, b: SlotId) {
        self.constraints.add_comparable(&self.slots, a, b);
    }

    pub fn add_combine(&mut self, target: SlotId, decl: SlotId, result: SlotId) {
        self.constraints.add_combine(target, decl, result);
    }

    pub fn add_arithmetic(
        &mut self,
        operation: ArithmeticOp,
        left: SlotId,
        right: SlotId,
        result: SlotId,
    ) {
        self.constraints
            .add_arithmetic(operation, left, right, result);
    }

    pub fn add_preference(&mut self, variable: SlotId, goal: SlotId, weight: i32) {
        self.constraints
            .add_preference(&self.slots, variable, goal, weight);
    }

    pub fn add_existential(
        &mut self,
        potential: SlotId,
        if_exists: Vec<Constraint>,
        if_not_exists: Vec<Constraint>,
    ) {
        self.constraints
            .add_existential(potential, if_exists, if_not_exists);
    }

    pub fn add_implication(&mut self, assumptions: Vec<Constraint>, conclusion: Constraint) {
        self.constraints.add_implication(assumptions, conclusion);
    }

    /// Resolve a serialized slot annotation back to its slot, as when an
    /// annotated declaration is re-read in a later round.
    pub fn slot_for_annotation(&mut self, annotation: &SlotAnnotation) -> SlotId {
        match self.slots.slot_of(annotation) {
            Ok(id) => id,
            Err(error) => {
                self.slots.record_error(error);
                self.slots.top_constant()
            }
        }
    }

    /// Drain the accumulated constraints and normalize them. The managers
    /// remain usable afterwards; a later round starts from an empty set.
    pub fn normalize(&mut self) -> Result<HashSet<Constraint>, ErrorSummary> {
        let constraints = self.constraints.drain();
        normalize(&self.slots, constraints, self.permissive).map_err(|error| {
            ErrorSummary::new(
                "normalization failed".to_string(),
                self.files.clone(),
                vec![error],
            )
        })
    }

    /// Fails if either manager recorded errors during the run. Clears the
    /// recorded errors either way.
    pub fn check_errors(&mut self) -> Result<(), ErrorSummary> {
        let mut errors = self.slots.take_errors();
        errors.extend(self.constraints.take_errors());
        if errors.is_empty() {
            return Ok(());
        }
        let noun = if errors.len() == 1 { "error" } else { "errors" };
        Err(ErrorSummary::new(
            format!("inference found {} {}", errors.len(), noun),
            self.files.clone(),
            errors,
        ))
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.slot(id)
    }
}
