//! Late-binding pool for mode-shifted group references.
//!
//! A gated cluster's group id is unknown while bindings are being
//! normalized, so the placeholder binding carries a token instead. Group
//! export fills the token's slot, and a resolution pass rewrites every
//! token reference to the concrete id before the mapping is encoded.

use crate::config::evgen::{Evgen, GroupRef};
use crate::config::mapping::Mapping;

#[derive(Clone, Debug, Default)]
pub struct TokenPool {
    slots: Vec<Option<i64>>,
}

impl TokenPool {
    pub fn allocate(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    pub fn assign(&mut self, token: usize, group_id: i64) {
        if let Some(slot) = self.slots.get_mut(token) {
            *slot = Some(group_id);
        }
    }

    pub fn resolve(&self, token: usize) -> Option<i64> {
        self.slots.get(token).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Rewrite every token reference in `mapping` to its resolved group id.
/// A token never assigned keeps the `-1` placeholder.
pub(crate) fn resolve_mapping(pool: &TokenPool, mapping: &mut Mapping) {
    for group in &mut mapping.groups {
        for input in &mut group.inputs {
            for activator in &mut input.activators {
                for binding in &mut activator.bindings {
                    if let Evgen::ModeShift { group: group_ref, .. } = &mut binding.evgen {
                        if let GroupRef::Token(token) = *group_ref {
                            *group_ref =
                                GroupRef::Id(pool.resolve(token).unwrap_or(-1));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_fill_and_resolve() {
        let mut pool = TokenPool::default();
        let a = pool.allocate();
        let b = pool.allocate();
        pool.assign(b, 7);
        assert_eq!(pool.resolve(a), None);
        assert_eq!(pool.resolve(b), Some(7));
    }
}
