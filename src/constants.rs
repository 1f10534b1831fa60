//! Constants for board dimensions, search parameters, and timing.
//!
//! The board is stored as a 1D array with a one-cell border ring, so the
//! grid geometry depends on the runtime size. Only the bounds and the
//! defaults live here; see [`crate::board`] for the layout itself.

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest supported board size.
pub const MIN_SIZE: usize = 2;

/// Largest supported board size (the column letters run out after 25).
pub const MAX_SIZE: usize = 25;

/// Board size used when nothing else has been requested.
pub const DEFAULT_SIZE: usize = 7;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// UCT exploration constant.
pub const UCT_C: f64 = 0.4;

// =============================================================================
// Timing
// =============================================================================

/// Default wall-clock budget per generated move, in seconds.
pub const DEFAULT_TIME_LIMIT: f64 = 30.0;

/// Headroom subtracted from the time limit so the reply beats the controller's clock.
pub const TIME_EPSILON: f64 = 0.1;

/// Lower bound on the search budget after the headroom is subtracted.
pub const MIN_SEARCH_TIME: f64 = 0.01;
