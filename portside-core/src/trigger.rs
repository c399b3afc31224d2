//! Decoding raw field-change ids into task-slot triggers.
//!
//! The host publishes changes as `(raw field id, new value)` pairs. This
//! module owns the static table mapping each tracked id to a semantic field
//! and the slot it belongs to, plus the reverse mapping the resync path uses
//! to read a slot's fields straight out of a bulk snapshot.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::constants::{
    FIELD_NOTICE_BOARD_REFRESH, FIELD_TASKS_UNLOCKED, OTHER_SLOT, SLOT_COUNT, TASK_FIELD_BASE,
    TASK_FIELD_STRIDE,
};

/// Semantic meaning of a tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    /// The slot's task identifier; nonzero means a task occupies the bay.
    TaskId,
    /// Units of cargo loaded so far.
    CargoTaken,
    /// Units of cargo handed over so far.
    CargoDelivered,
    /// Tracked for subscription purposes but not routed to any bay.
    Other,
}

impl TriggerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskId => "task-id",
            Self::CargoTaken => "cargo-taken",
            Self::CargoDelivered => "cargo-delivered",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task-id" => Ok(Self::TaskId),
            "cargo-taken" => Ok(Self::CargoTaken),
            "cargo-delivered" => Ok(Self::CargoDelivered),
            "other" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

/// A decoded trigger: which field changed, and whose bay it belongs to.
/// `Other` triggers carry [`OTHER_SLOT`], which never matches a real bay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTrigger {
    pub kind: TriggerKind,
    pub slot: u8,
}

fn table() -> &'static HashMap<u32, TaskTrigger> {
    static TABLE: OnceLock<HashMap<u32, TaskTrigger>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = HashMap::new();
        for slot in 0..SLOT_COUNT {
            let base = TASK_FIELD_BASE + u32::from(slot) * TASK_FIELD_STRIDE;
            map.insert(base, TaskTrigger { kind: TriggerKind::TaskId, slot });
            map.insert(
                base + 1,
                TaskTrigger {
                    kind: TriggerKind::CargoTaken,
                    slot,
                },
            );
            map.insert(
                base + 2,
                TaskTrigger {
                    kind: TriggerKind::CargoDelivered,
                    slot,
                },
            );
        }
        for raw in [FIELD_TASKS_UNLOCKED, FIELD_NOTICE_BOARD_REFRESH] {
            map.insert(
                raw,
                TaskTrigger {
                    kind: TriggerKind::Other,
                    slot: OTHER_SLOT,
                },
            );
        }
        map
    })
}

/// Classify a raw field id. `None` means the id is not tracked at all;
/// callers must not fall back to a default slot.
#[must_use]
pub fn classify(raw_id: u32) -> Option<TaskTrigger> {
    table().get(&raw_id).copied()
}

/// Membership test over the tracked-id set.
#[must_use]
pub fn contains(raw_id: u32) -> bool {
    table().contains_key(&raw_id)
}

/// Every id the host shim should subscribe to.
pub fn tracked_ids() -> impl Iterator<Item = u32> + 'static {
    table().keys().copied()
}

fn slot_field(slot: u8, offset: u32) -> Option<u32> {
    (slot < SLOT_COUNT).then(|| TASK_FIELD_BASE + u32::from(slot) * TASK_FIELD_STRIDE + offset)
}

/// Raw id of a slot's task-identifier field.
#[must_use]
pub fn identifier_field(slot: u8) -> Option<u32> {
    slot_field(slot, 0)
}

/// Raw id of a slot's cargo-taken counter.
#[must_use]
pub fn taken_field(slot: u8) -> Option<u32> {
    slot_field(slot, 1)
}

/// Raw id of a slot's cargo-delivered counter.
#[must_use]
pub fn delivered_field(slot: u8) -> Option<u32> {
    slot_field(slot, 2)
}
