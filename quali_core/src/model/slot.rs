/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::hierarchy::Qualifier;
use crate::source::AnnotationLocation;
use std::fmt::{self, Display, Formatter};
use strum_macros::{AsRefStr, EnumDiscriminants, EnumIter};

/// Index of a slot in the slot manager's arena. Ids are assigned once,
/// never reused, and increase monotonically within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub u32);

impl Display for SlotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, EnumIter)]
pub enum ArithmeticOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(SlotKind))]
#[strum_discriminants(derive(Hash))]
pub enum Slot {
    Variable(VariableSlot),
    Constant(ConstantSlot),
    Refinement(RefinementVariableSlot),
    Comb(CombVariableSlot),
    Lub(LubVariableSlot),
    Existential(ExistentialVariableSlot),
    Arithmetic(ArithmeticVariableSlot),
}

/// An unknown qualifier at a program position, to be solved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSlot {
    pub id: SlotId,
    pub location: AnnotationLocation,
}

/// A fixed, already-known qualifier value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantSlot {
    pub id: SlotId,
    pub value: Qualifier,
}

/// A flow-sensitive narrowing of another slot. In any valid solution the
/// refinement is a subtype of the slot it refines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementVariableSlot {
    pub id: SlotId,
    pub location: AnnotationLocation,
    pub refined: SlotId,
}

/// The result of viewpoint-adapting a declared slot by a receiver slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombVariableSlot {
    pub id: SlotId,
    pub location: AnnotationLocation,
    pub first: SlotId,
    pub second: SlotId,
}

/// The least upper bound of two slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LubVariableSlot {
    pub id: SlotId,
    pub left: SlotId,
    pub right: SlotId,
}

/// A variable whose annotation may or may not be materialized in source:
/// resolves to `potential` if the annotation exists, else to `alternative`.
/// Written `(@0 | @1)` in comments and Display output. Constraints mentioning
/// these slots are rewritten away by normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistentialVariableSlot {
    pub id: SlotId,
    pub potential: SlotId,
    pub alternative: SlotId,
}

/// The result of an arithmetic operation between two operand slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticVariableSlot {
    pub id: SlotId,
    pub location: AnnotationLocation,
    pub operation: ArithmeticOp,
    pub left: SlotId,
    pub right: SlotId,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        match self {
            Slot::Variable(s) => s.id,
            Slot::Constant(s) => s.id,
            Slot::Refinement(s) => s.id,
            Slot::Comb(s) => s.id,
            Slot::Lub(s) => s.id,
            Slot::Existential(s) => s.id,
            Slot::Arithmetic(s) => s.id,
        }
    }

    pub fn location(&self) -> AnnotationLocation {
        match self {
            Slot::Variable(s) => s.location.clone(),
            Slot::Refinement(s) => s.location.clone(),
            Slot::Comb(s) => s.location.clone(),
            Slot::Arithmetic(s) => s.location.clone(),
            Slot::Constant(_) | Slot::Lub(_) | Slot::Existential(_) => AnnotationLocation::Missing,
        }
    }

    /// Whether a solved value for this slot may be written back into source.
    pub fn is_insertable(&self) -> bool {
        match self {
            Slot::Variable(s) => s.location.is_insertable(),
            Slot::Refinement(s) => s.location.is_insertable(),
            Slot::Constant(_)
            | Slot::Comb(_)
            | Slot::Lub(_)
            | Slot::Existential(_)
            | Slot::Arithmetic(_) => false,
        }
    }

    /// Every slot kind except constants represents an unknown to be solved.
    pub fn is_variable(&self) -> bool {
        !matches!(self, Slot::Constant(_))
    }

    pub fn kind(&self) -> SlotKind {
        SlotKind::from(self)
    }

    pub fn constant_value(&self) -> Option<&Qualifier> {
        match self {
            Slot::Constant(s) => Some(&s.value),
            _ => None,
        }
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Constant(s) => write!(f, "{}", s.value),
            Slot::Existential(s) => write!(f, "{} ({} | {})", s.id, s.potential, s.alternative),
            other => write!(f, "{}", other.id()),
        }
    }
}
