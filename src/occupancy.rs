use crate::data::PlacedSlot;
use std::collections::HashMap;
use std::fmt;

/// The three resources a class ties up for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Room,
    Teacher,
    Batch,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Room, ResourceKind::Teacher, ResourceKind::Batch];

    /// The id of this resource in `slot`.
    pub fn id_of(self, slot: &PlacedSlot) -> &str {
        match self {
            ResourceKind::Room => &slot.room,
            ResourceKind::Teacher => &slot.teacher,
            ResourceKind::Batch => &slot.batch,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Room => "Room",
            ResourceKind::Teacher => "Teacher",
            ResourceKind::Batch => "Batch",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccupancyKey {
    pub day: String,
    pub time: String,
    pub kind: ResourceKind,
    pub id: String,
}

impl OccupancyKey {
    pub fn new(day: &str, time: &str, kind: ResourceKind, id: &str) -> Self {
        Self {
            day: day.to_string(),
            time: time.to_string(),
            kind,
            id: id.to_string(),
        }
    }
}

/// Which slot holds each (day, time, resource) during a generation run.
///
/// Owned by a single run; nothing else reads or writes it while the
/// run is in progress.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    entries: HashMap<OccupancyKey, PlacedSlot>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self, day: &str, time: &str, kind: ResourceKind, id: &str) -> bool {
        self.entries
            .contains_key(&OccupancyKey::new(day, time, kind, id))
    }

    /// Records `slot` under `key`. Returns true if the key was already held;
    /// the newer slot replaces the stored one either way.
    pub fn occupy(&mut self, key: OccupancyKey, slot: PlacedSlot) -> bool {
        self.entries.insert(key, slot).is_some()
    }

    /// Records the room, teacher and batch keys of `slot` at (day, time)
    /// and returns the kinds that were already taken, in room/teacher/batch order.
    pub fn occupy_slot(&mut self, day: &str, time: &str, slot: &PlacedSlot) -> Vec<ResourceKind> {
        let mut collisions = Vec::new();
        for kind in ResourceKind::ALL {
            let key = OccupancyKey::new(day, time, kind, kind.id_of(slot));
            if self.occupy(key, slot.clone()) {
                collisions.push(kind);
            }
        }
        collisions
    }

    /// Number of periods in which resource `id` of `kind` is held.
    pub fn count_for(&self, kind: ResourceKind, id: &str) -> usize {
        self.entries
            .keys()
            .filter(|key| key.kind == kind && key.id == id)
            .count()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&OccupancyKey, &PlacedSlot)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
