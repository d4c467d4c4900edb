//! Footstep localization by time difference of arrival
//!
//! - [`arrival`]: Per-channel arrival time with sub-sample interpolation
//! - [`solver`]: Exhaustive grid-search multilateration
//! - [`tracker`]: Stateful tracker with confidence-gated EMA smoothing

pub mod arrival;
pub mod solver;
pub mod tracker;

pub use arrival::{time_of_arrival, ArrivalTime};
pub use solver::{confidence_from_residual, GridSolution, GridSolver, MAX_CONFIDENCE};
pub use tracker::{PositionEstimate, PositionTracker};
