//! Shared primitive types used across the entire game core.

/// A stable identifier for one layer node in the prestige tree.
pub type LayerId = String;

/// A stable identifier for an upgrade, milestone, achievement or buyable
/// within a layer.
pub type FeatureId = String;

/// A point on the host clock, in milliseconds. The core never reads a wall
/// clock for game time; the scheduler and tick operations are driven with
/// explicit `TimeMs` values so tests can control time.
pub type TimeMs = u64;
