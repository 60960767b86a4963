use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::analysis::pta::CsObjId;

/// A monotonically growing set of abstract objects.
///
/// Once an object is in the set it is never removed; the engine relies on
/// this to only ever propagate differences.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PointsToSet {
    objects: BTreeSet<CsObjId>,
}

impl PointsToSet {
    pub fn new() -> PointsToSet {
        PointsToSet {
            objects: BTreeSet::new(),
        }
    }

    /// A set holding a single object.
    pub fn singleton(object: CsObjId) -> PointsToSet {
        let mut set = PointsToSet::new();
        set.insert(object);
        set
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn contains(&self, object: CsObjId) -> bool {
        self.objects.contains(&object)
    }

    /// Adds an object. Returns false if it was already present.
    pub fn insert(&mut self, object: CsObjId) -> bool {
        self.objects.insert(object)
    }

    pub fn iter(&self) -> impl Iterator<Item = CsObjId> + '_ {
        self.objects.iter().cloned()
    }

    /// The objects of `other` not yet in this set.
    pub fn difference_from(&self, other: &PointsToSet) -> PointsToSet {
        PointsToSet {
            objects: other
                .objects
                .difference(&self.objects)
                .cloned()
                .collect(),
        }
    }

    /// True if this set contains every object of `other`.
    pub fn is_superset(&self, other: &PointsToSet) -> bool {
        self.objects.is_superset(&other.objects)
    }
}

impl fmt::Display for PointsToSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        let mut is_first = true;
        for object in &self.objects {
            if !is_first {
                write!(f, ", ")?;
            }
            write!(f, "{}", object)?;
            is_first = false;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = PointsToSet::new();

        assert!(set.insert(CsObjId(0)));
        assert!(!set.insert(CsObjId(0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_difference_from() {
        let mut set = PointsToSet::singleton(CsObjId(0));
        set.insert(CsObjId(1));

        let mut incoming = PointsToSet::singleton(CsObjId(1));
        incoming.insert(CsObjId(2));

        let delta = set.difference_from(&incoming);
        assert_eq!(delta.len(), 1);
        assert!(delta.contains(CsObjId(2)));
    }

    #[test]
    fn test_superset() {
        let mut set = PointsToSet::singleton(CsObjId(0));
        set.insert(CsObjId(1));

        assert!(set.is_superset(&PointsToSet::singleton(CsObjId(1))));
        assert!(!set.is_superset(&PointsToSet::singleton(CsObjId(2))));
    }
}
