//! The task catalog: immutable descriptors of every delivery task the host
//! data tables define, indexed by task id and by source row id.
//!
//! The catalog is rebuilt from scratch at login / cache reload and swapped
//! into the process-wide [`CatalogHandle`] as one step, so readers never see
//! a half-built set.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use log::{debug, info, warn};
use num_traits::cast::cast;
use serde::{Deserialize, Serialize};

use crate::TaskRow;
use crate::location::{LocationCatalog, LocationId};
use crate::route::{RouteCatalog, RouteMatch};

/// Task identifier as published in a slot's identifier field. Zero means
/// "no task" and never appears in the catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub i32);

/// Key of the source data-table row a descriptor was built from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RowId(pub u32);

/// Columns of the host's task data table. Rows are queried by
/// (column, tuple-index); every column here uses tuple index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskColumn {
    TaskId,
    Name,
    CargoItem,
    CargoQuantity,
    Reward,
    NoticeBoard,
    Pickup,
    Delivery,
}

/// Immutable definition of one delivery task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDescriptor {
    pub task_id: TaskId,
    pub row_id: RowId,
    pub name: String,
    pub cargo_item: i32,
    pub quantity: u32,
    pub notice_board: LocationId,
    pub pickup: LocationId,
    pub delivery: LocationId,
    /// `None` is the "no charted route" condition: the task stays listed but
    /// renderers draw no navigation line for it.
    pub route: Option<RouteMatch>,
    /// Full-path length of the route, 0.0 when no route is charted.
    pub distance: f64,
    pub reward: i64,
    /// Reward per distance, normalized against the best task in the catalog.
    /// Always within `0.0..=1.0`; 0.0 when the distance is zero.
    pub efficiency: f32,
}

/// Row tallies from one catalog rebuild, for the host's startup log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub accepted: usize,
    pub skipped: usize,
    pub routeless: usize,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks ({} routeless, {} rows skipped)",
            self.accepted, self.routeless, self.skipped
        )
    }
}

/// Immutable task registry, built once per rebuild.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    entries: Vec<TaskDescriptor>,
    by_task: HashMap<TaskId, usize>,
    by_row: HashMap<RowId, usize>,
}

impl TaskCatalog {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from host data-table rows.
    ///
    /// Malformed rows are skipped with a warning, never fatal: a row missing
    /// a field, naming an unknown port, or delivering to its own pickup port
    /// is excluded. A row whose endpoints have no charted route is kept with
    /// the route absent. Efficiencies are normalized after all rows are in.
    pub fn build<R: TaskRow>(
        rows: &[R],
        locations: &LocationCatalog,
        routes: &RouteCatalog,
    ) -> (Self, BuildReport) {
        let mut report = BuildReport::default();
        let mut entries: Vec<TaskDescriptor> = Vec::with_capacity(rows.len());
        let mut by_task = HashMap::with_capacity(rows.len());
        let mut by_row = HashMap::with_capacity(rows.len());
        let mut ratios: Vec<f64> = Vec::with_capacity(rows.len());

        for row in rows {
            let row_id = RowId(row.row_id());
            let Some(entry) = decode_row(row, locations, routes) else {
                report.skipped += 1;
                continue;
            };
            if by_task.contains_key(&entry.task_id) || by_row.contains_key(&row_id) {
                warn!(
                    "task table row {} repeats task id {}; keeping the first",
                    row_id.0, entry.task_id.0
                );
                report.skipped += 1;
                continue;
            }
            if entry.route.is_none() {
                report.routeless += 1;
            }
            let ratio = if entry.distance > 0.0 {
                reward_as_f64(entry.reward) / entry.distance
            } else {
                0.0
            };
            ratios.push(ratio);
            by_task.insert(entry.task_id, entries.len());
            by_row.insert(row_id, entries.len());
            entries.push(entry);
        }

        let max_ratio = ratios.iter().copied().fold(0.0_f64, f64::max);
        if max_ratio > 0.0 {
            for (entry, ratio) in entries.iter_mut().zip(&ratios) {
                entry.efficiency = narrow_ratio(ratio / max_ratio);
            }
        }

        report.accepted = entries.len();
        info!("task catalog rebuilt: {report}");
        (
            Self {
                entries,
                by_task,
                by_row,
            },
            report,
        )
    }

    #[must_use]
    pub fn by_task_id(&self, id: TaskId) -> Option<&TaskDescriptor> {
        self.by_task.get(&id).map(|&index| &self.entries[index])
    }

    #[must_use]
    pub fn by_row_id(&self, id: RowId) -> Option<&TaskDescriptor> {
        self.by_row.get(&id).map(|&index| &self.entries[index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.entries.iter()
    }
}

fn decode_row<R: TaskRow>(
    row: &R,
    locations: &LocationCatalog,
    routes: &RouteCatalog,
) -> Option<TaskDescriptor> {
    let row_id = RowId(row.row_id());
    let skip = |why: &str| {
        warn!("task table row {}: {why}; skipping", row_id.0);
    };

    let Some(raw_task_id) = row.int_field(TaskColumn::TaskId, 0) else {
        skip("missing task id");
        return None;
    };
    let Ok(task_id) = i32::try_from(raw_task_id) else {
        skip("task id out of range");
        return None;
    };
    if task_id <= 0 {
        skip("task id not positive");
        return None;
    }
    let Some(name) = row.string_field(TaskColumn::Name, 0) else {
        skip("missing name");
        return None;
    };

    let location = |column: TaskColumn| -> Option<LocationId> {
        let raw = row.int_field(column, 0)?;
        let id = LocationId(u16::try_from(raw).ok()?);
        locations.get(id)?;
        Some(id)
    };
    let Some(notice_board) = location(TaskColumn::NoticeBoard) else {
        skip("unresolved notice-board port");
        return None;
    };
    let Some(pickup) = location(TaskColumn::Pickup) else {
        skip("unresolved pickup port");
        return None;
    };
    let Some(delivery) = location(TaskColumn::Delivery) else {
        skip("unresolved delivery port");
        return None;
    };
    if pickup == delivery {
        // Same-port errands are a different task family; not ours to track.
        debug!("task table row {}: same-port task; skipping", row_id.0);
        return None;
    }

    let Some(cargo_item) = row
        .int_field(TaskColumn::CargoItem, 0)
        .and_then(|value| i32::try_from(value).ok())
    else {
        skip("missing cargo item");
        return None;
    };
    let Some(quantity) = row
        .int_field(TaskColumn::CargoQuantity, 0)
        .and_then(|value| u32::try_from(value).ok())
    else {
        skip("missing cargo quantity");
        return None;
    };
    let Some(reward) = row.int_field(TaskColumn::Reward, 0) else {
        skip("missing reward");
        return None;
    };

    let route = routes.find(pickup, delivery);
    let distance = route
        .as_ref()
        .map_or(0.0, |found| found.distance(locations));

    Some(TaskDescriptor {
        task_id: TaskId(task_id),
        row_id,
        name,
        cargo_item,
        quantity,
        notice_board,
        pickup,
        delivery,
        route,
        distance,
        reward,
        efficiency: 0.0,
    })
}

/// Narrow a `0.0..=1.0` ratio to f32, flushing anything non-finite to 0.
fn narrow_ratio(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    cast::<f64, f32>(value.clamp(0.0, 1.0)).unwrap_or(0.0)
}

/// Convert a reward to f64 in one place, tolerating precision loss.
fn reward_as_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Shared handle readers resolve the current catalog through. Rebuilds
/// replace the whole catalog as one visible step.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Arc<TaskCatalog>>,
}

impl CatalogHandle {
    /// Snapshot of the current catalog. Cheap: clones an `Arc`.
    #[must_use]
    pub fn current(&self) -> Arc<TaskCatalog> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Install a freshly built catalog, returning the shared snapshot.
    pub fn install(&self, catalog: TaskCatalog) -> Arc<TaskCatalog> {
        let next = Arc::new(catalog);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&next);
        next
    }
}

/// Process-wide current-catalog handle.
#[must_use]
pub fn shared_catalog() -> &'static CatalogHandle {
    static HANDLE: OnceLock<CatalogHandle> = OnceLock::new();
    HANDLE.get_or_init(CatalogHandle::default)
}
