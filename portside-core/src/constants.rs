//! Centralized identifiers and tuning constants for the Portside engine.
//!
//! Field ids and slot layout must match what the host client publishes.
//! Keeping them together ensures the wiring can only change via code review,
//! rather than drifting across modules.

// Slot layout ---------------------------------------------------------------

/// Number of concurrent task bays the game exposes.
pub const SLOT_COUNT: u8 = 5;

/// Slot carried by triggers that do not belong to any task bay.
/// Never matches a real slot.
pub const OTHER_SLOT: u8 = u8::MAX;

// Raw field ids -------------------------------------------------------------

/// First field id of the per-slot block. Each slot owns a contiguous block
/// of [`TASK_FIELD_STRIDE`] ids: identifier, cargo taken, cargo delivered.
pub(crate) const TASK_FIELD_BASE: u32 = 9460;
pub(crate) const TASK_FIELD_STRIDE: u32 = 3;

/// Tracked fields outside the per-slot blocks. Observed so the host shim
/// can subscribe to one id set, but they never route to a task bay.
pub(crate) const FIELD_TASKS_UNLOCKED: u32 = 9475;
pub(crate) const FIELD_NOTICE_BOARD_REFRESH: u32 = 9476;

// Settings ------------------------------------------------------------------

/// Configuration group the host stores Portside settings under.
pub const SETTINGS_GROUP: &str = "portside";

/// Key for the serialized active-task registry.
pub const SETTINGS_KEY_TASKS: &str = "active-tasks";
