//! Portside Core Engine
//!
//! Platform-agnostic task-tracking logic for the Portside sailing assistant.
//! This crate derives structured delivery-task state from the host client's
//! bit-packed field notifications without any UI or platform-specific
//! dependencies; overlays and panels consume it through the traits below.

pub mod catalog;
pub mod constants;
pub mod coords;
pub mod data;
pub mod location;
pub mod palette;
pub mod registry;
pub mod route;
pub mod trigger;

// Re-export commonly used types
pub use catalog::{
    BuildReport, CatalogHandle, RowId, TaskCatalog, TaskColumn, TaskDescriptor, TaskId,
    shared_catalog,
};
pub use constants::{OTHER_SLOT, SETTINGS_GROUP, SETTINGS_KEY_TASKS, SLOT_COUNT};
pub use coords::{WorldPoint, path_length};
pub use data::{builtin_locations, builtin_routes};
pub use location::{LocationCatalog, LocationCatalogError, LocationId, PortLocation};
pub use palette::{ColorParseError, SLOT_PALETTE, TaskColor};
pub use registry::{ActiveTask, PersistedTask, TaskRegistry, TriggerOutcome};
pub use route::{RouteCatalog, RouteCatalogError, RouteMatch, SeaRoute, WaypointList};
pub use trigger::{
    TaskTrigger, TriggerKind, classify, contains, delivered_field, identifier_field, taken_field,
    tracked_ids,
};

/// One row of the host's task data table, queryable by (column, tuple-index).
/// Row handles are opaque; only the typed accessors matter.
pub trait TaskRow {
    /// Key of this row in the source table.
    fn row_id(&self) -> u32;

    /// Integer cell, `None` when the cell is absent or differently typed.
    fn int_field(&self, column: TaskColumn, index: usize) -> Option<i64>;

    /// String cell, `None` when the cell is absent or differently typed.
    fn string_field(&self, column: TaskColumn, index: usize) -> Option<String>;
}

/// Trait for abstracting access to the host's task data table.
/// Platform-specific implementations should provide this.
pub trait TaskDataSource {
    type Row: TaskRow;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the task table rows from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded.
    fn task_rows(&self) -> Result<Vec<Self::Row>, Self::Error>;
}

/// An indexable block of current field values, used by the resync path to
/// read slot state directly instead of waiting on change notifications.
pub trait FieldSnapshot {
    /// Current value of a raw field id; 0 when the field is unset.
    fn value_at(&self, raw_id: u32) -> i32;
}

/// Trait for abstracting the host's key/value configuration store.
/// Platform-specific implementations should provide this.
pub trait SettingsStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a text blob under (group, key).
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be stored.
    fn save(&self, group: &str, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Load the text blob stored under (group, key), if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load(&self, group: &str, key: &str) -> Result<Option<String>, Self::Error>;
}

/// Engine facade binding a task data source to a settings store.
pub struct PortTaskEngine<D, S>
where
    D: TaskDataSource,
    S: SettingsStore,
{
    data_source: D,
    settings: S,
}

impl<D, S> PortTaskEngine<D, S>
where
    D: TaskDataSource,
    S: SettingsStore,
{
    /// Create an engine with the provided data source and settings store.
    pub const fn new(data_source: D, settings: S) -> Self {
        Self {
            data_source,
            settings,
        }
    }

    /// Build a fresh task catalog from the data source. The caller installs
    /// it into a [`CatalogHandle`] to make the swap visible to readers.
    ///
    /// # Errors
    ///
    /// Returns an error if the task table cannot be loaded.
    pub fn rebuild_catalog(
        &self,
        locations: &LocationCatalog,
        routes: &RouteCatalog,
    ) -> Result<(TaskCatalog, BuildReport), D::Error> {
        let rows = self.data_source.task_rows()?;
        Ok(TaskCatalog::build(&rows, locations, routes))
    }

    /// Persist the registry to the settings store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn save_tasks(&self, registry: &TaskRegistry) -> Result<(), anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let blob = registry.to_settings_blob()?;
        self.settings
            .save(SETTINGS_GROUP, SETTINGS_KEY_TASKS, &blob)
            .map_err(Into::into)
    }

    /// Restore the registry persisted by [`Self::save_tasks`], resolving
    /// descriptors against the given catalog. An absent or empty blob
    /// yields an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the blob is corrupt.
    pub fn restore_tasks(&self, catalog: &TaskCatalog) -> Result<TaskRegistry, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        match self
            .settings
            .load(SETTINGS_GROUP, SETTINGS_KEY_TASKS)
            .map_err(Into::into)?
        {
            Some(blob) if !blob.trim().is_empty() => {
                Ok(TaskRegistry::from_settings_blob(&blob, catalog)?)
            }
            _ => Ok(TaskRegistry::new()),
        }
    }
}
