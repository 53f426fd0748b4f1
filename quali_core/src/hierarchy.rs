/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use utils::hash::HashSet;
use utils::id_set::IdSet;

/// An opaque qualifier token. The core never interprets these beyond identity
/// and whatever the [`QualifierHierarchy`] says about them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Qualifier(Rc<str>);

impl Qualifier {
    pub fn new(name: &str) -> Self {
        Qualifier(Rc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Qualifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The external oracle over qualifier values. Supplied by the type-system
/// author; the core consults it only for constant folding and the
/// top/bottom subtype rewrites.
pub trait QualifierHierarchy {
    /// Every declared qualifier, used to pre-populate constant slots.
    fn qualifiers(&self) -> Vec<Qualifier>;

    fn is_subtype(&self, sub: &Qualifier, sup: &Qualifier) -> bool;

    fn are_same(&self, a: &Qualifier, b: &Qualifier) -> bool {
        a == b
    }

    fn top(&self) -> Qualifier;

    fn bottom(&self) -> Qualifier;
}

/// A hierarchy described by its unique top, unique bottom, and direct
/// (sub, sup) edges. The subtype relation is the reflexive-transitive
/// closure of the edges, with bottom below and top above everything.
pub struct ExplicitLattice {
    qualifiers: IdSet<Qualifier>,
    // supers[q] = every qualifier q is a subtype of, including q itself
    supers: Vec<HashSet<u32>>,
    top: u32,
    bottom: u32,
}

impl ExplicitLattice {
    pub fn new(top: &str, bottom: &str, edges: &[(&str, &str)]) -> Self {
        let mut qualifiers = IdSet::new();
        let top = qualifiers.insert(Qualifier::new(top));
        let bottom = qualifiers.insert(Qualifier::new(bottom));
        let mut direct: Vec<(u32, u32)> = Vec::with_capacity(edges.len());
        for (sub, sup) in edges {
            let sub = qualifiers.insert(Qualifier::new(sub));
            let sup = qualifiers.insert(Qualifier::new(sup));
            direct.push((sub, sup));
        }

        let n = qualifiers.len();
        let mut supers: Vec<HashSet<u32>> = vec![HashSet::default(); n];
        for (q, sups) in supers.iter_mut().enumerate() {
            let q = q as u32;
            sups.insert(q);
            sups.insert(top);
        }
        for q in 0..n as u32 {
            supers[bottom as usize].insert(q);
        }
        for (sub, sup) in direct {
            supers[sub as usize].insert(sup);
        }

        // transitive closure; hierarchies are tiny so a fixpoint loop is fine
        let mut changed = true;
        while changed {
            changed = false;
            for q in 0..n {
                let reachable: Vec<u32> = supers[q].iter().copied().collect();
                for mid in reachable {
                    let grand: Vec<u32> = supers[mid as usize].iter().copied().collect();
                    for sup in grand {
                        changed |= supers[q].insert(sup);
                    }
                }
            }
        }

        Self {
            qualifiers,
            supers,
            top,
            bottom,
        }
    }
}

impl QualifierHierarchy for ExplicitLattice {
    fn qualifiers(&self) -> Vec<Qualifier> {
        self.qualifiers.iter().cloned().collect()
    }

    fn is_subtype(&self, sub: &Qualifier, sup: &Qualifier) -> bool {
        match (
            self.qualifiers.try_get_id(sub),
            self.qualifiers.try_get_id(sup),
        ) {
            (Some(sub), Some(sup)) => self.supers[sub as usize].contains(&sup),
            // a qualifier this lattice never declared relates to nothing
            _ => false,
        }
    }

    fn top(&self) -> Qualifier {
        self.qualifiers[self.top].clone()
    }

    fn bottom(&self) -> Qualifier {
        self.qualifiers[self.bottom].clone()
    }
}
