/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::Error;
use crate::hierarchy::{Qualifier, QualifierHierarchy};
use crate::model::{
    ArithmeticOp, ArithmeticVariableSlot, CombVariableSlot, ConstantSlot, ExistentialVariableSlot,
    LubVariableSlot, RefinementVariableSlot, Slot, SlotId, VariableSlot,
};
use crate::source::AnnotationLocation;
use utils::dlog;
use utils::hash::HashMap;

/// The serialized form of a slot reference: an id wrapped in a marker value,
/// so the traversal layer can stash a slot inside the host language's own
/// annotation representation and recover it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotAnnotation(pub u32);

/// Sole authority for slot identity. Owns every slot of the run in an arena
/// indexed by [`SlotId`]; each creation operation is idempotent over its
/// cache key. Single-writer by construction: callers share it behind one
/// `&mut` borrow, never across threads.
pub struct SlotManager {
    permissive: bool,

    // the arena; a slot's id is its index, so ids are unique and monotonic
    slots: Vec<Slot>,

    // identity caches, one per slot kind
    variable_cache: HashMap<AnnotationLocation, SlotId>,
    refinement_cache: HashMap<AnnotationLocation, SlotId>,
    constant_cache: HashMap<Qualifier, SlotId>,
    comb_cache: HashMap<(SlotId, SlotId), SlotId>,
    lub_cache: HashMap<(SlotId, SlotId), SlotId>,
    existential_cache: HashMap<(SlotId, SlotId), SlotId>,
    arithmetic_cache: HashMap<AnnotationLocation, SlotId>,

    // the hierarchy's top, used as the permissive-mode fallback slot
    top_constant: SlotId,

    errors: Vec<Error>,
}

impl SlotManager {
    /// Pre-populates one constant slot per declared qualifier so every
    /// constant has a stable id before traversal begins.
    pub fn new(hierarchy: &dyn QualifierHierarchy, permissive: bool) -> Self {
        let mut manager = Self {
            permissive,
            slots: Vec::new(),
            variable_cache: HashMap::default(),
            refinement_cache: HashMap::default(),
            constant_cache: HashMap::default(),
            comb_cache: HashMap::default(),
            lub_cache: HashMap::default(),
            existential_cache: HashMap::default(),
            arithmetic_cache: HashMap::default(),
            top_constant: SlotId(0),
            errors: Vec::new(),
        };
        for qualifier in hierarchy.qualifiers() {
            manager.get_or_create_constant(qualifier);
        }
        manager.top_constant = manager.get_or_create_constant(hierarchy.top());
        manager
    }

    fn next_id(&self) -> SlotId {
        SlotId(self.slots.len() as u32)
    }

    /// A variable slot for the given location. A `Missing` location always
    /// mints a fresh, uncached slot: distinct uses of the synthetic position
    /// are intentionally distinct unknowns.
    pub fn get_or_create_variable(&mut self, location: AnnotationLocation) -> SlotId {
        if location == AnnotationLocation::Missing {
            let id = self.next_id();
            self.slots.push(Slot::Variable(VariableSlot { id, location }));
            return id;
        }
        if let Some(&id) = self.variable_cache.get(&location) {
            return id;
        }
        let id = self.next_id();
        self.variable_cache.insert(location.clone(), id);
        self.slots.push(Slot::Variable(VariableSlot { id, location }));
        id
    }

    /// A refinement of `refined` at the given location. Cached by location
    /// only: a location has at most one refinement lineage, so `refined` is
    /// ignored on a cache hit.
    pub fn get_or_create_refinement(
        &mut self,
        location: AnnotationLocation,
        refined: SlotId,
    ) -> SlotId {
        if location == AnnotationLocation::Missing {
            let id = self.next_id();
            self.slots.push(Slot::Refinement(RefinementVariableSlot {
                id,
                location,
                refined,
            }));
            return id;
        }
        if let Some(&id) = self.refinement_cache.get(&location) {
            return id;
        }
        let id = self.next_id();
        self.refinement_cache.insert(location.clone(), id);
        self.slots.push(Slot::Refinement(RefinementVariableSlot {
            id,
            location,
            refined,
        }));
        id
    }

    pub fn get_or_create_constant(&mut self, value: Qualifier) -> SlotId {
        if let Some(&id) = self.constant_cache.get(&value) {
            return id;
        }
        let id = self.next_id();
        self.constant_cache.insert(value.clone(), id);
        self.slots.push(Slot::Constant(ConstantSlot { id, value }));
        id
    }

    /// Viewpoint adaptation result of (receiver, declared). The pair is an
    /// ordered cache key; callers supply operands in semantic order.
    pub fn get_or_create_comb(
        &mut self,
        first: SlotId,
        second: SlotId,
        location: AnnotationLocation,
    ) -> SlotId {
        if let Some(&id) = self.comb_cache.get(&(first, second)) {
            return id;
        }
        let id = self.next_id();
        self.comb_cache.insert((first, second), id);
        self.slots.push(Slot::Comb(CombVariableSlot {
            id,
            location,
            first,
            second,
        }));
        id
    }

    /// Least upper bound of two slots. The pair is unordered, so the cache
    /// key is normalized by id before lookup.
    pub fn get_or_create_lub(&mut self, left: SlotId, right: SlotId) -> SlotId {
        let key = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        if let Some(&id) = self.lub_cache.get(&key) {
            return id;
        }
        let id = self.next_id();
        self.lub_cache.insert(key, id);
        self.slots.push(Slot::Lub(LubVariableSlot { id, left, right }));
        id
    }

    /// An existential choice over (potential, alternative). Both operands
    /// must be variable-kind slots; a constant here is an upstream bug, so
    /// strict mode records it while permissive mode logs and carries on with
    /// a best-effort slot.
    pub fn get_or_create_existential(
        &mut self,
        potential: SlotId,
        alternative: SlotId,
    ) -> SlotId {
        for operand in [potential, alternative] {
            let ok = self.slot(operand).is_some_and(Slot::is_variable);
            if !ok {
                if self.permissive {
                    dlog!("existential over non-variable operand {operand}");
                } else {
                    self.errors
                        .push(Error::ExistentialOperandNotVariable { operand });
                }
            }
        }
        if let Some(&id) = self.existential_cache.get(&(potential, alternative)) {
            return id;
        }
        let id = self.next_id();
        self.existential_cache.insert((potential, alternative), id);
        self.slots.push(Slot::Existential(ExistentialVariableSlot {
            id,
            potential,
            alternative,
        }));
        id
    }

    /// The result of an arithmetic expression. Cached by location only: one
    /// arithmetic result per source arithmetic expression.
    pub fn get_or_create_arithmetic(
        &mut self,
        operation: ArithmeticOp,
        left: SlotId,
        right: SlotId,
        location: AnnotationLocation,
    ) -> SlotId {
        if let Some(&id) = self.arithmetic_cache.get(&location) {
            return id;
        }
        let id = self.next_id();
        self.arithmetic_cache.insert(location.clone(), id);
        self.slots.push(Slot::Arithmetic(ArithmeticVariableSlot {
            id,
            location,
            operation,
            left,
            right,
        }));
        id
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.0 as usize)
    }

    /// All slots, in insertion (and therefore id) order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn variable_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| slot.is_variable())
    }

    pub fn constant_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| !slot.is_variable())
    }

    pub fn constant_value(&self, id: SlotId) -> Option<&Qualifier> {
        self.slot(id).and_then(Slot::constant_value)
    }

    /// The qualifier-hierarchy top, as a pre-populated constant slot.
    pub fn top_constant(&self) -> SlotId {
        self.top_constant
    }

    pub fn annotation_of(&self, slot: SlotId) -> SlotAnnotation {
        SlotAnnotation(slot.0)
    }

    /// Recover the slot a [`SlotAnnotation`] refers to. An encoding this
    /// manager never issued is an error; permissive mode degrades to the top
    /// constant instead of failing the run.
    pub fn slot_of(&self, annotation: &SlotAnnotation) -> Result<SlotId, Error> {
        if (annotation.0 as usize) < self.slots.len() {
            return Ok(SlotId(annotation.0));
        }
        if self.permissive {
            dlog!("unrecognized slot encoding {}, using top", annotation.0);
            return Ok(self.top_constant);
        }
        Err(Error::UnrecognizedSlotEncoding { id: annotation.0 })
    }

    pub(crate) fn record_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub(crate) fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}
