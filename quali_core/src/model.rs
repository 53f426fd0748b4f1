/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The slot/constraint vocabulary the solver reasons over. Slots are unknowns
//! (or known constants) at annotatable program positions; constraints are
//! logical relationships between slots. Everything here is plain data: slots
//! live in the slot manager's arena and refer to each other by [`SlotId`],
//! never by owned edges, since the slot graph is not acyclic by construction.

mod constraint;
mod slot;

pub use constraint::{
    ArithmeticConstraint, CombineConstraint, ComparableConstraint, Constraint, EqualityConstraint,
    ExistentialConstraint, ImplicationConstraint, InequalityConstraint, PreferenceConstraint,
    SubtypeConstraint,
};
pub use slot::{
    ArithmeticOp, ArithmeticVariableSlot, CombVariableSlot, ConstantSlot, ExistentialVariableSlot,
    LubVariableSlot, RefinementVariableSlot, Slot, SlotId, SlotKind, VariableSlot,
};
