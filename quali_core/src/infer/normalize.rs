/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! One-shot batch rewrite of the constraint set, run after traversal and
//! before solving. Pass A drops constraints referencing slots that do not
//! resolve. Pass B removes every existential slot: each binary constraint
//! mentioning one is expanded over the exists/doesn't-exist cases of its
//! operand chains, the surviving cases are folded into one shared decision
//! tree, and the tree is converted back into nested existential constraints.
//!
//! Given `(@1 | (@2 | @4))  <:  (@5 | @6)` the left chain is [@1, @2, @4]
//! and the right chain [@5, @6]; the expansion of the pair (@2, @5) is
//! "@1 doesn't exist, @2 exists, @5 exists  =>  @2 <: @5", and so on for
//! every pair, with contradictory and self-referential cases pruned.

use super::Error;
use super::slot_manager::SlotManager;
use crate::hierarchy::Qualifier;
use crate::model::{Constraint, ExistentialConstraint, Slot, SlotId};
use crate::source::AnnotationLocation;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use utils::dlog;
use utils::hash::HashSet;

pub fn normalize(
    slots: &SlotManager,
    constraints: HashSet<Constraint>,
    permissive: bool,
) -> Result<HashSet<Constraint>, Error> {
    dlog!("-- normalization : dangling slots --");
    let mut filtered: Vec<Constraint> = Vec::with_capacity(constraints.len());
    for constraint in constraints {
        match constraint.slots().into_iter().find(|&id| slots.slot(id).is_none()) {
            Some(dangling) => {
                if !permissive {
                    return Err(Error::DanglingSlot {
                        constraint: constraint.to_string(),
                        slot: dangling,
                    });
                }
                dlog!("dropping constraint with dangling slot {dangling}: {constraint}");
            }
            None => filtered.push(constraint),
        }
    }

    dlog!("-- normalization : existential elimination --");
    let mut tree = ExistentialTree::default();
    let mut normalized: HashSet<Constraint> = HashSet::default();
    for constraint in filtered {
        let expandable = constraint
            .as_binary()
            .is_some_and(|(l, r)| is_existential(slots, l) || is_existential(slots, r));
        if expandable {
            expand(slots, &mut tree, constraint);
        } else {
            normalized.insert(constraint);
        }
    }
    normalized.extend(tree.into_constraints());

    // the whole point of this pass; a leftover existential here is a bug in
    // this module, fatal regardless of mode
    for constraint in &normalized {
        for id in constraint.slots() {
            if is_existential(slots, id) {
                return Err(Error::ExistentialSurvivedNormalization {
                    constraint: constraint.to_string(),
                    slot: id,
                });
            }
        }
    }

    Ok(normalized)
}

fn is_existential(slots: &SlotManager, id: SlotId) -> bool {
    matches!(slots.slot(id), Some(Slot::Existential(_)))
}

/// Unroll one operand into its chain: the potential slot of every nested
/// existential, ending with the first non-existential slot reached. Every
/// element but the last means "use this slot if it exists"; the terminal
/// always applies when nothing earlier materialized.
fn unroll(slots: &SlotManager, start: SlotId) -> Vec<SlotId> {
    let mut chain = Vec::new();
    let mut current = start;
    while let Some(Slot::Existential(existential)) = slots.slot(current) {
        chain.push(existential.potential);
        current = existential.alternative;
    }
    chain.push(current);
    chain
}

fn expand(slots: &SlotManager, tree: &mut ExistentialTree, constraint: Constraint) {
    let Some((left, right)) = constraint.as_binary() else {
        unreachable!("only binary constraints are expanded")
    };
    let left_chain = unroll(slots, left);
    let right_chain = unroll(slots, right);
    add_to_tree(slots, tree, &left_chain, &right_chain, &constraint);
}

/// Cartesian expansion of the two chains with pruning. For every pair
/// (left_i, right_j) the path is "left_i exists, nothing before it on the
/// left exists, right_j exists, nothing before it on the right exists",
/// and the derived constraint is the original remade over the pair.
/// Chain terminals always exist, so they carry no negative literal and
/// nothing after them is reachable. A left element whose negation is
/// already implied is skipped outright, and a slot is never compared
/// against itself.
fn add_to_tree(
    slots: &SlotManager,
    tree: &mut ExistentialTree,
    left_chain: &[SlotId],
    right_chain: &[SlotId],
    constraint: &Constraint,
) {
    let mut previously_encountered: BTreeSet<Literal> = BTreeSet::new();
    let last_left = left_chain.len() - 1;
    let last_right = right_chain.len() - 1;

    for (left_index, &left) in left_chain.iter().enumerate() {
        let lhs = Literal::new(slots, left, true, left_index == last_left);

        if !previously_encountered.contains(&lhs.negated()) {
            let mut encountered = previously_encountered.clone();
            encountered.insert(lhs.clone());

            for (right_index, &right) in right_chain.iter().enumerate() {
                let rhs = Literal::new(slots, right, true, right_index == last_right);

                if left != right && !encountered.contains(&rhs.negated()) {
                    let mut path = encountered.clone();
                    path.insert(rhs.clone());
                    tree.add_constraints(&path, constraint.with_operands(left, right));
                }
                encountered.insert(rhs.negated());
            }

            previously_encountered.insert(lhs.negated());
        }
    }
}

/// Tree ordering for slots: variables (by id) sort before constants (by
/// qualifier name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Variable(SlotId),
    Constant(Qualifier),
}

/// One exists/doesn't-exist decision about a slot along a path. The ordering
/// deliberately excludes the polarity: a path set holds at most one literal
/// per (slot, terminal-flag), so inserting the opposite polarity of a
/// recorded literal is a no-op rather than a contradiction.
#[derive(Debug, Clone)]
struct Literal {
    slot: SlotId,
    key: SortKey,
    exists: bool,
    always_exists: bool,
}

impl Literal {
    fn new(slots: &SlotManager, id: SlotId, exists: bool, always_exists: bool) -> Self {
        let key = match slots.slot(id) {
            Some(Slot::Constant(constant)) => SortKey::Constant(constant.value.clone()),
            _ => SortKey::Variable(id),
        };
        Self {
            slot: id,
            key,
            exists,
            always_exists,
        }
    }

    fn negated(&self) -> Literal {
        Literal {
            slot: self.slot,
            key: self.key.clone(),
            exists: !self.exists,
            always_exists: self.always_exists,
        }
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        // conditional literals order before terminals
        (self.always_exists, &self.key).cmp(&(other.always_exists, &other.key))
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Literal {}

/// The shared decision tree. One node per existential literal, children
/// stored as arena indices so self-referential slot graphs cannot knot the
/// ownership; a terminal ("always exists") slot is a leaf marker, not a
/// branching node.
#[derive(Default)]
struct ExistentialTree {
    nodes: Vec<ExistentialNode>,
    roots: BTreeMap<SortKey, usize>,
}

struct ExistentialNode {
    slot: SlotId,
    always_exists: bool,
    if_exists: BTreeMap<SortKey, usize>,
    if_not_exists: BTreeMap<SortKey, usize>,
    constraints: Vec<Constraint>,
}

impl ExistentialTree {
    fn add_constraints(&mut self, path: &BTreeSet<Literal>, constraint: Constraint) {
        let mut literals = path.iter();
        let head = literals.next().expect("paths have at least one literal");

        let mut current = self.get_or_create(None, head);
        let mut current_literal = head;

        while !current_literal.always_exists {
            let Some(next) = literals.next() else { break };
            current = self.get_or_create(Some((current, current_literal.exists)), next);
            current_literal = next;
        }

        let node = &mut self.nodes[current];
        if !node.constraints.contains(&constraint) {
            node.constraints.push(constraint);
        }
    }

    fn get_or_create(&mut self, parent: Option<(usize, bool)>, literal: &Literal) -> usize {
        let children = match parent {
            None => &self.roots,
            Some((index, true)) => &self.nodes[index].if_exists,
            Some((index, false)) => &self.nodes[index].if_not_exists,
        };
        if let Some(&existing) = children.get(&literal.key) {
            return existing;
        }

        let new_index = self.nodes.len();
        self.nodes.push(ExistentialNode {
            slot: literal.slot,
            always_exists: literal.always_exists,
            if_exists: BTreeMap::new(),
            if_not_exists: BTreeMap::new(),
            constraints: Vec::new(),
        });
        let children = match parent {
            None => &mut self.roots,
            Some((index, true)) => &mut self.nodes[index].if_exists,
            Some((index, false)) => &mut self.nodes[index].if_not_exists,
        };
        children.insert(literal.key.clone(), new_index);
        new_index
    }

    fn into_constraints(self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        for &root in self.roots.values() {
            constraints.extend(self.node_constraints(root));
        }
        constraints
    }

    /// Convert a subtree back into real constraints, bottom-up. A branching
    /// node becomes one existential constraint whose if-exists branch is its
    /// own derived constraints plus the converted if-exists subtree; a leaf
    /// marker contributes its constraints directly with no wrapping.
    fn node_constraints(&self, index: usize) -> Vec<Constraint> {
        let node = &self.nodes[index];
        if node.always_exists {
            return node.constraints.clone();
        }

        let mut if_exists = node.constraints.clone();
        for &child in node.if_exists.values() {
            if_exists.extend(self.node_constraints(child));
        }
        let mut if_not_exists = Vec::new();
        for &child in node.if_not_exists.values() {
            if_not_exists.extend(self.node_constraints(child));
        }

        vec![Constraint::Existential(ExistentialConstraint::new(
            node.slot,
            if_exists,
            if_not_exists,
            AnnotationLocation::Missing,
        ))]
    }
}
