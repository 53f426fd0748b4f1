/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use crate::hash::HashMap;
use std::hash::Hash;

// elements are unique
// elements have unique IDs
// elements can be retrieved by their ID
// IDs are stable
// iteration is in order of insertion (and therefore stable)
//
// use cases:
// - assign unique integer IDs to values: T
// - intern data to avoid repeated comparisons against large values
//
// requirements:
// - values must be immutable
#[derive(Default, Clone)]
pub struct IdSet<T: Hash + Eq + Clone> {
    map: HashMap<T, u32>,
    values: Vec<T>,
}

impl<T: Hash + Eq + Clone> IdSet<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            map: HashMap::default(),
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn insert(&mut self, value: T) -> u32 {
        use std::collections::hash_map::Entry;
        match self.map.entry(value) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let new_id = self.values.len() as u32;
                self.values.push(entry.key().clone());
                entry.insert(new_id);
                new_id
            }
        }
    }

    #[inline]
    pub fn try_get_value(&self, id: u32) -> Option<&T> {
        self.values.get(id as usize)
    }

    #[inline]
    pub fn try_get_id(&self, value: &T) -> Option<u32> {
        self.map.get(value).copied()
    }

    // this will panic if value is not found
    #[inline]
    pub fn get_id(&self, value: &T) -> u32 {
        self.try_get_id(value).unwrap()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T: Hash + Eq + Clone> std::ops::Index<u32> for IdSet<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: u32) -> &Self::Output {
        self.try_get_value(id).unwrap()
    }
}

impl<'a, T: Hash + Eq + Clone> IntoIterator for &'a IdSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
