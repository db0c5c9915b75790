// Category-tagged overlap events derived from per-tick contact sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::state::{ArcId, PlayerId, PushableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColliderCategory {
    Wall,
    Reflector,
    Button,
    Damageable,
    AuthorityObject,
    Plate,
    RechargeZone,
    Pickup,
}

/// A collider in the level, identified by category and the id used inside that category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderKey {
    pub category: ColliderCategory,
    pub index: u64,
}

impl ColliderKey {
    pub fn new(category: ColliderCategory, index: impl Into<u64>) -> Self {
        Self {
            category,
            index: index.into(),
        }
    }
}

/// The moving body whose contacts are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlapSubject {
    Arc(ArcId),
    Cone(PlayerId),
    Player(PlayerId),
    Pushable(PushableId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPhase {
    Begin,
    Stay,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapEvent {
    pub subject: OverlapSubject,
    pub collider: ColliderKey,
    pub phase: OverlapPhase,
}

/// Remembers last tick's contacts so callers only report what touches now.
#[derive(Debug, Default)]
pub struct OverlapTracker {
    contacts: BTreeMap<OverlapSubject, BTreeSet<ColliderKey>>,
}

impl OverlapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `touching` against the previous set for `subject`.
    /// Events come out in collider order; `End` events follow `Begin`/`Stay`.
    pub fn update(
        &mut self,
        subject: OverlapSubject,
        touching: BTreeSet<ColliderKey>,
    ) -> Vec<OverlapEvent> {
        let previous = self.contacts.remove(&subject).unwrap_or_default();
        let mut events = Vec::with_capacity(touching.len() + previous.len());

        for collider in &touching {
            let phase = if previous.contains(collider) {
                OverlapPhase::Stay
            } else {
                OverlapPhase::Begin
            };
            events.push(OverlapEvent {
                subject,
                collider: *collider,
                phase,
            });
        }
        for collider in previous.difference(&touching) {
            events.push(OverlapEvent {
                subject,
                collider: *collider,
                phase: OverlapPhase::End,
            });
        }

        if !touching.is_empty() {
            self.contacts.insert(subject, touching);
        }
        events
    }

    /// Ends every contact of a subject that no longer exists.
    pub fn forget(&mut self, subject: OverlapSubject) -> Vec<OverlapEvent> {
        self.update(subject, BTreeSet::new())
    }

    pub fn is_touching(&self, subject: OverlapSubject, collider: ColliderKey) -> bool {
        self.contacts
            .get(&subject)
            .is_some_and(|set| set.contains(&collider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(i: u32) -> ColliderKey {
        ColliderKey::new(ColliderCategory::Plate, i)
    }

    fn phases(events: &[OverlapEvent]) -> Vec<(u64, OverlapPhase)> {
        events.iter().map(|e| (e.collider.index, e.phase)).collect()
    }

    #[test]
    fn begin_stay_end_sequence() {
        let mut tracker = OverlapTracker::new();
        let subject = OverlapSubject::Player(1);

        let first = tracker.update(subject, BTreeSet::from([plate(1)]));
        assert_eq!(phases(&first), vec![(1, OverlapPhase::Begin)]);

        let second = tracker.update(subject, BTreeSet::from([plate(1), plate(2)]));
        assert_eq!(
            phases(&second),
            vec![(1, OverlapPhase::Stay), (2, OverlapPhase::Begin)]
        );

        let third = tracker.update(subject, BTreeSet::from([plate(2)]));
        assert_eq!(
            phases(&third),
            vec![(2, OverlapPhase::Stay), (1, OverlapPhase::End)]
        );
        assert!(tracker.is_touching(subject, plate(2)));
        assert!(!tracker.is_touching(subject, plate(1)));
    }

    #[test]
    fn forget_ends_all_contacts_once() {
        let mut tracker = OverlapTracker::new();
        let subject = OverlapSubject::Pushable(3);
        tracker.update(subject, BTreeSet::from([plate(1), plate(4)]));

        let ended = tracker.forget(subject);
        assert_eq!(
            phases(&ended),
            vec![(1, OverlapPhase::End), (4, OverlapPhase::End)]
        );
        assert!(tracker.forget(subject).is_empty());
    }
}
