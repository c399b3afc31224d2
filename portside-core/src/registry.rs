//! The per-slot registry of in-progress tasks.
//!
//! Two update paths converge here: the incremental trigger stream
//! ([`TaskRegistry::apply_trigger`]) and the bulk resynchronization pass
//! ([`TaskRegistry::resync`]), which reads every slot straight out of a
//! snapshot and is the designed recovery for missed or reordered
//! notifications. Both run on the host's event thread; renderers only read.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::FieldSnapshot;
use crate::catalog::{TaskCatalog, TaskDescriptor, TaskId};
use crate::constants::SLOT_COUNT;
use crate::palette::TaskColor;
use crate::trigger::{self, TriggerKind};

/// A live task occupying one of the game's task bays.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTask {
    pub slot: u8,
    pub descriptor: TaskDescriptor,
    pub taken: u32,
    pub delivered: u32,
    /// Whether the player wants overlays drawn for this task.
    pub tracked: bool,
    /// Panel-owned visibility toggle; the engine only sets it at creation.
    pub active: bool,
    pub color: TaskColor,
    /// Sideways shove, in tiles, applied to the drawn route line so stacked
    /// routes stay readable.
    pub path_offset: Option<i32>,
}

impl ActiveTask {
    fn new(slot: u8, descriptor: TaskDescriptor) -> Self {
        Self {
            slot,
            descriptor,
            taken: 0,
            delivered: 0,
            tracked: true,
            active: true,
            color: TaskColor::for_slot(slot),
            path_offset: None,
        }
    }

    /// All required cargo handed over.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.delivered >= self.descriptor.quantity
    }
}

/// What a trigger did to the registry, so the host shim can decide whether
/// to repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new record now occupies the slot.
    Created(u8),
    /// The slot was already occupied; the old record was replaced.
    Replaced(u8),
    /// An existing record's count changed.
    Updated(u8),
    /// The slot's record was removed.
    Removed(u8),
    /// A count arrived for a vacant slot and was dropped.
    Dropped(u8),
    /// Untracked id, non-bay field, or a no-op clear.
    Ignored,
}

/// Ordered collection of in-progress tasks, at most one per slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskRegistry {
    slots: BTreeMap<u8, ActiveTask>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one raw field change into the registry.
    pub fn apply_trigger(
        &mut self,
        raw_id: u32,
        value: i32,
        catalog: &TaskCatalog,
    ) -> TriggerOutcome {
        let Some(decoded) = trigger::classify(raw_id) else {
            return TriggerOutcome::Ignored;
        };
        match decoded.kind {
            TriggerKind::Other => TriggerOutcome::Ignored,
            TriggerKind::TaskId => self.apply_identifier(decoded.slot, value, catalog),
            TriggerKind::CargoTaken => self.apply_count(decoded.slot, value, CountField::Taken),
            TriggerKind::CargoDelivered => {
                self.apply_count(decoded.slot, value, CountField::Delivered)
            }
        }
    }

    fn apply_identifier(&mut self, slot: u8, value: i32, catalog: &TaskCatalog) -> TriggerOutcome {
        if value == 0 {
            return if self.slots.remove(&slot).is_some() {
                TriggerOutcome::Removed(slot)
            } else {
                TriggerOutcome::Ignored
            };
        }
        let Some(descriptor) = catalog.by_task_id(TaskId(value)) else {
            warn!("slot {slot} identifier {value} matches no known task; clearing the bay");
            return if self.slots.remove(&slot).is_some() {
                TriggerOutcome::Removed(slot)
            } else {
                TriggerOutcome::Ignored
            };
        };
        let record = ActiveTask::new(slot, descriptor.clone());
        if self.slots.insert(slot, record).is_some() {
            // One record per slot is structural; an occupied bay getting a
            // fresh identifier means we missed the clear in between.
            warn!("slot {slot} was still occupied; replacing with task {value}");
            TriggerOutcome::Replaced(slot)
        } else {
            TriggerOutcome::Created(slot)
        }
    }

    fn apply_count(&mut self, slot: u8, value: i32, field: CountField) -> TriggerOutcome {
        let Some(task) = self.slots.get_mut(&slot) else {
            debug!("{field:?} count for vacant slot {slot} dropped (out-of-order event)");
            return TriggerOutcome::Dropped(slot);
        };
        let count = clamp_count(value);
        match field {
            CountField::Taken => task.taken = count,
            CountField::Delivered => task.delivered = count,
        }
        TriggerOutcome::Updated(slot)
    }

    /// Reconcile every slot against a bulk snapshot, returning the number of
    /// mutations performed. Converges to the same state as a correctly
    /// delivered trigger stream; running it twice back-to-back against
    /// unchanged state performs zero mutations the second time.
    pub fn resync<S: FieldSnapshot>(&mut self, snapshot: &S, catalog: &TaskCatalog) -> usize {
        let mut changes = 0;
        for slot in 0..SLOT_COUNT {
            let (Some(id_field), Some(taken_field), Some(delivered_field)) = (
                trigger::identifier_field(slot),
                trigger::taken_field(slot),
                trigger::delivered_field(slot),
            ) else {
                continue;
            };
            let value = snapshot.value_at(id_field);
            let resolved = if value == 0 {
                None
            } else {
                catalog.by_task_id(TaskId(value))
            };
            let Some(descriptor) = resolved else {
                if value != 0 {
                    warn!("resync: slot {slot} identifier {value} matches no known task");
                }
                if self.slots.remove(&slot).is_some() {
                    changes += 1;
                }
                continue;
            };
            let stale = self
                .slots
                .get(&slot)
                .is_none_or(|task| task.descriptor.task_id != descriptor.task_id);
            if stale {
                self.slots.insert(slot, ActiveTask::new(slot, descriptor.clone()));
                changes += 1;
            }
            let taken = clamp_count(snapshot.value_at(taken_field));
            let delivered = clamp_count(snapshot.value_at(delivered_field));
            if let Some(task) = self.slots.get_mut(&slot) {
                if task.taken != taken {
                    task.taken = taken;
                    changes += 1;
                }
                if task.delivered != delivered {
                    task.delivered = delivered;
                    changes += 1;
                }
            }
        }
        changes
    }

    #[must_use]
    pub fn task(&self, slot: u8) -> Option<&ActiveTask> {
        self.slots.get(&slot)
    }

    pub fn task_mut(&mut self, slot: u8) -> Option<&mut ActiveTask> {
        self.slots.get_mut(&slot)
    }

    /// Tasks in slot order, the order the panel lists them in.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveTask> {
        self.slots.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Serialize the registry for the host's settings store.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_settings_blob(&self) -> Result<String, serde_json::Error> {
        let records: Vec<PersistedTask> = self.iter().map(PersistedTask::from).collect();
        serde_json::to_string(&records)
    }

    /// Rebuild a registry from a stored blob, re-resolving descriptors
    /// against the current catalog. Records whose task id is no longer in
    /// the catalog, or whose slot is out of range, are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not valid JSON.
    pub fn from_settings_blob(
        blob: &str,
        catalog: &TaskCatalog,
    ) -> Result<Self, serde_json::Error> {
        let records: Vec<PersistedTask> = serde_json::from_str(blob)?;
        let mut registry = Self::default();
        for record in records {
            if record.slot >= SLOT_COUNT {
                warn!("stored task in slot {} out of range; dropping", record.slot);
                continue;
            }
            let Some(descriptor) = catalog.by_task_id(record.task_id) else {
                warn!(
                    "stored task id {} no longer in the catalog; dropping",
                    record.task_id.0
                );
                continue;
            };
            if registry.slots.contains_key(&record.slot) {
                warn!("stored blob repeats slot {}; keeping the first", record.slot);
                continue;
            }
            registry.slots.insert(
                record.slot,
                ActiveTask {
                    slot: record.slot,
                    descriptor: descriptor.clone(),
                    taken: record.taken,
                    delivered: record.delivered,
                    tracked: record.tracked,
                    active: record.active,
                    color: record.color,
                    path_offset: record.path_offset,
                },
            );
        }
        Ok(registry)
    }
}

#[derive(Debug, Clone, Copy)]
enum CountField {
    Taken,
    Delivered,
}

fn clamp_count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// One registry record as stored in the settings blob. Descriptors are not
/// persisted; restore re-resolves them by task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTask {
    pub slot: u8,
    pub task_id: TaskId,
    #[serde(default)]
    pub taken: u32,
    #[serde(default)]
    pub delivered: u32,
    #[serde(default = "default_true")]
    pub tracked: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    pub color: TaskColor,
    #[serde(default)]
    pub path_offset: Option<i32>,
}

const fn default_true() -> bool {
    true
}

impl From<&ActiveTask> for PersistedTask {
    fn from(task: &ActiveTask) -> Self {
        Self {
            slot: task.slot,
            task_id: task.descriptor.task_id,
            taken: task.taken,
            delivered: task.delivered,
            tracked: task.tracked,
            active: task.active,
            color: task.color,
            path_offset: task.path_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TaskCatalog, TaskColumn};
    use crate::coords::WorldPoint;
    use crate::location::{LocationCatalog, LocationId, PortLocation};
    use crate::route::{RouteCatalog, SeaRoute};
    use crate::trigger::{delivered_field, identifier_field, taken_field};
    use smallvec::smallvec;
    use std::collections::HashMap;

    struct FixtureRow {
        row_id: u32,
        task_id: i64,
        name: &'static str,
        pickup: i64,
        delivery: i64,
    }

    impl crate::TaskRow for FixtureRow {
        fn row_id(&self) -> u32 {
            self.row_id
        }

        fn int_field(&self, column: TaskColumn, _index: usize) -> Option<i64> {
            match column {
                TaskColumn::TaskId => Some(self.task_id),
                TaskColumn::CargoItem => Some(4611),
                TaskColumn::CargoQuantity => Some(8),
                TaskColumn::Reward => Some(640),
                TaskColumn::NoticeBoard => Some(1),
                TaskColumn::Pickup => Some(self.pickup),
                TaskColumn::Delivery => Some(self.delivery),
                TaskColumn::Name => None,
            }
        }

        fn string_field(&self, column: TaskColumn, _index: usize) -> Option<String> {
            matches!(column, TaskColumn::Name).then(|| self.name.to_string())
        }
    }

    fn fixture_catalog() -> TaskCatalog {
        let port = |id: u16, name: &'static str, x: i32| PortLocation {
            id: LocationId(id),
            name,
            dock: WorldPoint::sea(x, 100),
            cargo: WorldPoint::sea(x + 2, 100),
            nav_waypoint: Some(WorldPoint::sea(x, 80)),
        };
        let locations = LocationCatalog::build(&[
            port(1, "Saltmarsh Quay", 100),
            port(2, "Ember Bay", 300),
            port(3, "Ironreef Docks", 500),
        ])
        .unwrap();
        let routes = RouteCatalog::build(
            vec![
                SeaRoute::new(LocationId(1), LocationId(2), smallvec![]),
                SeaRoute::new(LocationId(2), LocationId(3), smallvec![]),
            ],
            &locations,
        )
        .unwrap();
        let rows = [
            FixtureRow {
                row_id: 1,
                task_id: 102,
                name: "Salted crates",
                pickup: 1,
                delivery: 2,
            },
            FixtureRow {
                row_id: 2,
                task_id: 215,
                name: "Lamp oil",
                pickup: 2,
                delivery: 3,
            },
        ];
        TaskCatalog::build(&rows, &locations, &routes).0
    }

    struct MapSnapshot(HashMap<u32, i32>);

    impl MapSnapshot {
        fn of(entries: &[(u32, i32)]) -> Self {
            Self(entries.iter().copied().collect())
        }
    }

    impl crate::FieldSnapshot for MapSnapshot {
        fn value_at(&self, raw_id: u32) -> i32 {
            self.0.get(&raw_id).copied().unwrap_or(0)
        }
    }

    #[test]
    fn zero_identifier_on_empty_registry_is_a_noop() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        let outcome = registry.apply_trigger(identifier_field(0).unwrap(), 0, &catalog);
        assert_eq!(outcome, TriggerOutcome::Ignored);
        assert!(registry.is_empty());
    }

    #[test]
    fn resolving_identifier_creates_a_fresh_record() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        let outcome = registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        assert_eq!(outcome, TriggerOutcome::Created(0));

        let task = registry.task(0).unwrap();
        assert_eq!(task.descriptor.task_id, TaskId(102));
        assert_eq!(task.taken, 0);
        assert_eq!(task.delivered, 0);
        assert!(task.tracked);
        assert_eq!(task.color, TaskColor::for_slot(0));
    }

    #[test]
    fn count_trigger_updates_in_place_without_new_records() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);

        let outcome = registry.apply_trigger(taken_field(0).unwrap(), 3, &catalog);
        assert_eq!(outcome, TriggerOutcome::Updated(0));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.task(0).unwrap().taken, 3);

        registry.apply_trigger(delivered_field(0).unwrap(), 2, &catalog);
        assert_eq!(registry.task(0).unwrap().delivered, 2);
        assert!(!registry.task(0).unwrap().is_complete());
    }

    #[test]
    fn zero_identifier_removes_the_whole_record() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        registry.apply_trigger(taken_field(0).unwrap(), 3, &catalog);

        let outcome = registry.apply_trigger(identifier_field(0).unwrap(), 0, &catalog);
        assert_eq!(outcome, TriggerOutcome::Removed(0));
        assert!(registry.is_empty());
    }

    #[test]
    fn count_for_vacant_slot_is_dropped() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        let outcome = registry.apply_trigger(taken_field(2).unwrap(), 5, &catalog);
        assert_eq!(outcome, TriggerOutcome::Dropped(2));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_raw_id_is_ignored() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        assert_eq!(registry.apply_trigger(1, 102, &catalog), TriggerOutcome::Ignored);
    }

    #[test]
    fn identifier_on_occupied_slot_replaces_the_record() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        registry.apply_trigger(taken_field(0).unwrap(), 3, &catalog);

        let outcome = registry.apply_trigger(identifier_field(0).unwrap(), 215, &catalog);
        assert_eq!(outcome, TriggerOutcome::Replaced(0));
        assert_eq!(registry.len(), 1);
        let task = registry.task(0).unwrap();
        assert_eq!(task.descriptor.task_id, TaskId(215));
        assert_eq!(task.taken, 0);
    }

    #[test]
    fn unresolvable_identifier_clears_the_bay() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);

        let outcome = registry.apply_trigger(identifier_field(0).unwrap(), 9999, &catalog);
        assert_eq!(outcome, TriggerOutcome::Removed(0));
        assert!(registry.is_empty());
    }

    #[test]
    fn negative_count_clamps_to_zero() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        registry.apply_trigger(taken_field(0).unwrap(), -4, &catalog);
        assert_eq!(registry.task(0).unwrap().taken, 0);
    }

    #[test]
    fn resync_converges_and_is_idempotent() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        // Stale record that the snapshot no longer shows.
        registry.apply_trigger(identifier_field(1).unwrap(), 215, &catalog);

        let snapshot = MapSnapshot::of(&[
            (identifier_field(0).unwrap(), 102),
            (taken_field(0).unwrap(), 4),
            (delivered_field(0).unwrap(), 1),
        ]);
        let changes = registry.resync(&snapshot, &catalog);
        assert!(changes > 0);
        assert_eq!(registry.len(), 1);
        let task = registry.task(0).unwrap();
        assert_eq!(task.descriptor.task_id, TaskId(102));
        assert_eq!(task.taken, 4);
        assert_eq!(task.delivered, 1);

        assert_eq!(registry.resync(&snapshot, &catalog), 0);
    }

    #[test]
    fn resync_matches_the_equivalent_trigger_stream() {
        let catalog = fixture_catalog();

        let mut streamed = TaskRegistry::new();
        streamed.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        streamed.apply_trigger(taken_field(0).unwrap(), 4, &catalog);
        streamed.apply_trigger(delivered_field(0).unwrap(), 1, &catalog);

        let mut resynced = TaskRegistry::new();
        let snapshot = MapSnapshot::of(&[
            (identifier_field(0).unwrap(), 102),
            (taken_field(0).unwrap(), 4),
            (delivered_field(0).unwrap(), 1),
        ]);
        resynced.resync(&snapshot, &catalog);

        assert_eq!(streamed, resynced);
    }

    #[test]
    fn settings_blob_roundtrips_panel_state() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        registry.apply_trigger(identifier_field(3).unwrap(), 215, &catalog);
        {
            let task = registry.task_mut(3).unwrap();
            task.tracked = false;
            task.color = TaskColor::opaque(0x11, 0x22, 0x33);
            task.path_offset = Some(2);
        }

        let blob = registry.to_settings_blob().unwrap();
        let restored = TaskRegistry::from_settings_blob(&blob, &catalog).unwrap();
        assert_eq!(restored, registry);
    }

    #[test]
    fn restore_drops_records_the_catalog_no_longer_knows() {
        let catalog = fixture_catalog();
        let blob = format!(
            "[{},{}]",
            r##"{"slot":0,"task_id":102,"color":"#2E86DEFF"}"##,
            r##"{"slot":1,"task_id":777,"color":"#2E86DEFF"}"##
        );
        let restored = TaskRegistry::from_settings_blob(&blob, &catalog).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.task(0).is_some());
    }

    #[test]
    fn restore_rejects_out_of_range_slots_and_bad_json() {
        let catalog = fixture_catalog();
        let blob = r##"[{"slot":99,"task_id":102,"color":"#2E86DEFF"}]"##;
        let restored = TaskRegistry::from_settings_blob(blob, &catalog).unwrap();
        assert!(restored.is_empty());
        assert!(TaskRegistry::from_settings_blob("not json", &catalog).is_err());
    }

    #[test]
    fn iteration_is_slot_ordered() {
        let catalog = fixture_catalog();
        let mut registry = TaskRegistry::new();
        registry.apply_trigger(identifier_field(3).unwrap(), 215, &catalog);
        registry.apply_trigger(identifier_field(0).unwrap(), 102, &catalog);
        let slots: Vec<u8> = registry.iter().map(|task| task.slot).collect();
        assert_eq!(slots, vec![0, 3]);
    }
}
