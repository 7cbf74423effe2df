//! Constants for answer scales, staleness bookkeeping and defaults.
//!
//! Board size is not a constant here: it comes from the game record.

// =============================================================================
// Answer Scale
// =============================================================================

/// Highest liberty count a learner can report. Groups with more liberties
/// report this value ("5 or more").
pub const MAX_LIBERTIES: usize = 5;

// =============================================================================
// Staleness
// =============================================================================

/// Staleness saturates here.
pub const MAX_STALENESS: u8 = 4;

/// Staleness value written for stones whose group was just asked about.
pub const JUST_ASKED: u8 = 0;

// =============================================================================
// Scheduling Defaults
// =============================================================================

/// Default cap on questions generated for a single move.
pub const DEFAULT_MAX_QUESTIONS: usize = 3;

/// Default largest liberty difference for a comparison pair.
pub const DEFAULT_COMPARISON_THRESHOLD: usize = 1;

// =============================================================================
// Record Geometry
// =============================================================================

/// Board size used when a record carries no `SZ` property.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest accepted board size.
pub const MIN_BOARD_SIZE: usize = 2;

/// Largest accepted board size (one SGF letter per coordinate).
pub const MAX_BOARD_SIZE: usize = 25;
