//! Player save state: schema, defaults, validation and migration.
//!
//! The persisted root object is an explicit versioned struct rather than a
//! free-form record. Serde field names match the historical save format
//! (camelCase), so old payloads deserialize directly; fields added later
//! fall back to defaults via `#[serde(default)]`.
//!
//! Validation is a read-only NaN scan over every numeric field, collecting
//! the full dotted path of each corrupt value into one combined error.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;
use crate::error::{GameError, GameResult};
use crate::types::{FeatureId, LayerId, TimeMs};

/// What `save()` does when validation fails: warn the player but persist
/// the payload anyway, or refuse the write and keep the last good save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidSavePolicy {
    WarnAndSave,
    #[default]
    AbortWrite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    pub last_update: TimeMs,
    pub config: ConfigState,
    pub version: String,
    /// Total active play time, in seconds.
    pub time_played: f64,
    pub points: Decimal,
    pub ui: UiState,
    pub nodes: BTreeMap<LayerId, NodeData>,
    pub dev: DevState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigState {
    pub automatic_saving: bool,
    pub offline_production: bool,
    /// Tick period in milliseconds.
    pub update_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UiState {
    pub current_tab: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevState {
    /// Time multiplier applied to every tick delta. 1 outside dev mode.
    pub speed_mult: f64,
}

/// Per-layer persisted sub-state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeData {
    pub unlocked: bool,
    /// The layer's own currency.
    pub points: Decimal,
    pub total: Decimal,
    pub best: Decimal,
    pub upgrades: BTreeSet<FeatureId>,
    pub milestones: BTreeSet<FeatureId>,
    pub achievements: BTreeSet<FeatureId>,
    pub buyables: BTreeMap<FeatureId, Decimal>,
    pub clickables: BTreeMap<FeatureId, String>,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            automatic_saving: true,
            offline_production: true,
            update_rate: 33,
        }
    }
}

impl Default for DevState {
    fn default() -> Self {
        Self { speed_mult: 1.0 }
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            last_update: 0,
            config: ConfigState::default(),
            version: String::new(),
            time_played: 0.0,
            points: Decimal::zero(),
            ui: UiState::default(),
            nodes: BTreeMap::new(),
            dev: DevState::default(),
        }
    }
}

impl PlayerState {
    /// Fresh save for a new player (also the hard-reset target).
    pub fn default_save(version: &str, initial_points: &Decimal, now: TimeMs) -> Self {
        Self {
            last_update: now,
            version: version.to_string(),
            points: initial_points.clone(),
            ..Self::default()
        }
    }

    pub fn node(&self, layer: &str) -> Option<&NodeData> {
        self.nodes.get(layer)
    }

    pub fn node_mut(&mut self, layer: &str) -> Option<&mut NodeData> {
        self.nodes.get_mut(layer)
    }
}

/// Read-only corruption scan. Collects every NaN-valued field as a dotted
/// path under `player.` and fails once with all of them, comma-joined.
pub fn check_player(state: &PlayerState) -> GameResult<()> {
    let mut invalid: Vec<String> = Vec::new();

    let mut push_decimal = |path: String, value: &Decimal| {
        if value.is_nan() {
            invalid.push(path);
        }
    };
    push_decimal("player.points".to_string(), &state.points);
    for (layer, node) in &state.nodes {
        push_decimal(format!("player.nodes.{layer}.points"), &node.points);
        push_decimal(format!("player.nodes.{layer}.total"), &node.total);
        push_decimal(format!("player.nodes.{layer}.best"), &node.best);
        for (id, amount) in &node.buyables {
            push_decimal(format!("player.nodes.{layer}.buyables.{id}"), amount);
        }
    }
    if state.time_played.is_nan() {
        invalid.push("player.timePlayed".to_string());
    }
    if state.dev.speed_mult.is_nan() {
        invalid.push("player.dev.speedMult".to_string());
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(GameError::SaveFileInvalid(invalid.join(", ")))
    }
}

/// Brings an older save up to the current version. Saves from a newer build
/// are rejected rather than guessed at.
pub fn migrate(state: &mut PlayerState, current_version: &str) -> GameResult<()> {
    match compare_versions(&state.version, current_version) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(GameError::UnsupportedSaveVersion {
            found: state.version.clone(),
            supported: current_version.to_string(),
        }),
        Ordering::Less => {
            log::info!(
                "migrating save from version {} to {}",
                state.version,
                current_version
            );
            // Schema changes between versions are absorbed by serde
            // defaults at decode time; migration just re-stamps.
            state.version = current_version.to_string();
            Ok(())
        }
    }
}

/// Orders version strings like "2.0-indev1" by their dotted numeric prefix.
/// The suffix after `-` is a stage label and does not affect ordering.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let numbers = |v: &str| -> Vec<u64> {
        v.split('-')
            .next()
            .unwrap_or("")
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (numbers(a), numbers(b));
    for index in 0..a.len().max(b.len()) {
        let left = a.get(index).copied().unwrap_or(0);
        let right = b.get(index).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlayerState {
        let mut state =
            PlayerState::default_save("2.0-indev1", &Decimal::from(100.0), 1_000);
        state.nodes.insert("P".to_string(), NodeData::default());
        state
    }

    #[test]
    fn clean_state_validates() {
        assert!(check_player(&sample()).is_ok());
    }

    #[test]
    fn nan_points_reports_its_path() {
        let mut state = sample();
        state.points = Decimal::nan();
        let err = check_player(&state).unwrap_err();
        assert_eq!(err.to_string(), "save file invalid: player.points");
    }

    #[test]
    fn nested_nans_are_all_collected() {
        let mut state = sample();
        state.points = Decimal::nan();
        let node = state.node_mut("P").unwrap();
        node.best = Decimal::nan();
        node.buyables.insert("11".to_string(), Decimal::nan());
        let message = check_player(&state).unwrap_err().to_string();
        assert!(message.contains("player.points"));
        assert!(message.contains("player.nodes.P.best"));
        assert!(message.contains("player.nodes.P.buyables.11"));
    }

    #[test]
    fn migrate_restamps_older_saves() {
        let mut state = sample();
        state.version = "1.3".to_string();
        migrate(&mut state, "2.0-indev1").unwrap();
        assert_eq!(state.version, "2.0-indev1");
    }

    #[test]
    fn migrate_rejects_newer_saves() {
        let mut state = sample();
        state.version = "3.1".to_string();
        let err = migrate(&mut state, "2.0-indev1").unwrap_err();
        assert!(matches!(err, GameError::UnsupportedSaveVersion { .. }));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: PlayerState =
            serde_json::from_str(r#"{"points":["100","Decimal"]}"#).unwrap();
        assert!(state.config.automatic_saving);
        assert_eq!(state.config.update_rate, 33);
        assert_eq!(state.dev.speed_mult, 1.0);
        assert_eq!(state.points, Decimal::from(100.0));
    }
}
