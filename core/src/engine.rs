//! Game engine.
//!
//! `GameEngine` owns the player state outright; there is no shared mutable
//! save object anywhere. Every state transition (tick, save, load, reset)
//! goes through a method here, and the host drives time explicitly so runs
//! are reproducible.

use crate::decimal::Decimal;
use crate::error::GameResult;
use crate::intervals::{Fired, Scheduler};
use crate::layer::LayerRegistry;
use crate::save::{check_player, migrate, InvalidSavePolicy, PlayerState};
use crate::serializer;
use crate::storage::SaveStorage;
use crate::types::TimeMs;

/// Tick deltas are clamped to this range before any time advances, so a
/// stalled clock or a machine waking from sleep cannot run away.
pub const MIN_TICK_MS: u64 = 1;
pub const MAX_TICK_MS: u64 = 24 * 3600 * 1000;

/// Static description of the game build, the analogue of the mod-info
/// block content ships with.
pub struct GameSpec {
    /// Storage key for the save envelope.
    pub id: String,
    pub name: String,
    pub version: String,
    pub points_name: String,
    pub initial_points: Decimal,
    pub endgame: Decimal,
    pub offline_limit_hours: u64,
    pub update_rate_ms: u64,
}

impl Default for GameSpec {
    fn default() -> Self {
        Self {
            id: "tpt-ts".to_string(),
            name: "The Typescript Tree".to_string(),
            version: "2.0-indev1".to_string(),
            points_name: "points".to_string(),
            initial_points: Decimal::from(100.0),
            endgame: "e3.140e16".parse().unwrap_or_else(|_| Decimal::infinity()),
            offline_limit_hours: 24,
            update_rate_ms: 33,
        }
    }
}

/// The main-currency gain pipeline: base gain, then multipliers, then
/// powerers, all gated behind `can_generate`.
pub struct PointsPipeline {
    pub can_generate: Box<dyn Fn(&PlayerState) -> bool>,
    pub base_gain: Box<dyn Fn(&PlayerState) -> Decimal>,
    pub multipliers: Box<dyn Fn(&PlayerState, Decimal) -> Decimal>,
    pub powerers: Box<dyn Fn(&PlayerState, Decimal) -> Decimal>,
}

impl Default for PointsPipeline {
    fn default() -> Self {
        Self {
            can_generate: Box::new(|_| false),
            base_gain: Box::new(|_| Decimal::one()),
            multipliers: Box::new(|_, gain| gain),
            powerers: Box::new(|_, gain| gain),
        }
    }
}

impl PointsPipeline {
    pub fn gain(&self, player: &PlayerState) -> Decimal {
        if !(self.can_generate)(player) {
            return Decimal::zero();
        }
        let gain = (self.base_gain)(player);
        let gain = (self.multipliers)(player, gain);
        (self.powerers)(player, gain)
    }
}

pub struct GameEngine<S: SaveStorage> {
    spec: GameSpec,
    registry: LayerRegistry,
    storage: S,
    scheduler: Scheduler,
    pipeline: PointsPipeline,
    policy: InvalidSavePolicy,
    player: PlayerState,
    last_tick_at: TimeMs,
}

impl<S: SaveStorage> GameEngine<S> {
    pub fn new(spec: GameSpec, registry: LayerRegistry, storage: S, now: TimeMs) -> Self {
        let mut player = PlayerState::default_save(&spec.version, &spec.initial_points, now);
        registry.apply_onto_player(&mut player);
        let scheduler = Scheduler::new(spec.update_rate_ms);
        Self {
            spec,
            registry,
            storage,
            scheduler,
            pipeline: PointsPipeline::default(),
            policy: InvalidSavePolicy::default(),
            player,
            last_tick_at: now,
        }
    }

    pub fn with_pipeline(mut self, pipeline: PointsPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_policy(mut self, policy: InvalidSavePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn spec(&self) -> &GameSpec {
        &self.spec
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn points_gain(&self) -> Decimal {
        self.pipeline.gain(&self.player)
    }

    /// Hook for content that wants to block saving in special game states.
    pub fn can_save(&self) -> bool {
        true
    }

    /// Advances the game by `delta_ms` of wall time. The delta is clamped,
    /// scaled by the dev speed multiplier, and applied to the points
    /// pipeline and every layer in row order.
    pub fn tick(&mut self, delta_ms: u64) {
        let clamped = delta_ms.clamp(MIN_TICK_MS, MAX_TICK_MS);
        if clamped != delta_ms {
            log::debug!("tick delta {delta_ms}ms clamped to {clamped}ms");
        }
        let true_diff = clamped as f64 / 1000.0 * self.player.dev.speed_mult;
        let diff = Decimal::from(true_diff);

        self.player.time_played += true_diff;
        self.player.last_update = self.player.last_update.saturating_add(clamped);

        let gain = self.pipeline.gain(&self.player);
        self.player.points = self.player.points.add(&gain.mul(&diff));

        self.registry.tick(&mut self.player, &diff);
    }

    /// Validates and persists the current state. Returns whether a write
    /// happened. An invalid state either aborts the write or is persisted
    /// anyway with a warning, per the configured policy.
    pub fn save(&mut self) -> GameResult<bool> {
        if !self.can_save() {
            return Ok(false);
        }
        if let Err(error) = check_player(&self.player) {
            match self.policy {
                InvalidSavePolicy::AbortWrite => {
                    log::error!("refusing to persist invalid save: {error}");
                    return Err(error);
                }
                InvalidSavePolicy::WarnAndSave => {
                    log::warn!("persisting save despite validation failure: {error}");
                }
            }
        }
        let envelope = serializer::serialize(&self.player)?;
        self.storage.write(&self.spec.id, &envelope)?;
        log::debug!("saved game '{}'", self.spec.id);
        Ok(true)
    }

    /// Loads the stored save, or falls back to a fresh default state when
    /// none exists or the stored one is unusable. A structurally valid save
    /// from a newer build is the one non-recoverable case.
    pub fn load(&mut self, now: TimeMs) -> GameResult<()> {
        let loaded = match self.storage.read(&self.spec.id)? {
            None => {
                log::info!("no stored save, starting fresh");
                None
            }
            Some(envelope) => match serializer::deserialize::<PlayerState>(&envelope) {
                Ok(state) => Some(state),
                Err(error) => {
                    log::warn!("stored save is unreadable ({error}), resetting");
                    None
                }
            },
        };

        let loaded = loaded.and_then(|state| match check_player(&state) {
            Ok(()) => Some(state),
            Err(error) => {
                log::warn!("stored save failed validation ({error}), resetting");
                None
            }
        });

        match loaded {
            Some(mut state) => {
                migrate(&mut state, &self.spec.version)?;
                self.registry.apply_onto_player(&mut state);
                self.player = state;
                self.catch_up_offline(now);
            }
            None => {
                self.player = PlayerState::default_save(
                    &self.spec.version,
                    &self.spec.initial_points,
                    now,
                );
                self.registry.apply_onto_player(&mut self.player);
            }
        }

        self.player.last_update = now;
        self.last_tick_at = now;
        self.scheduler.restart_all(now);
        Ok(())
    }

    /// One clamped catch-up tick for the time the game was closed, gated on
    /// the offline-production setting and capped by the configured limit.
    fn catch_up_offline(&mut self, now: TimeMs) {
        if !self.player.config.offline_production {
            return;
        }
        let elapsed = now.saturating_sub(self.player.last_update);
        if elapsed < MIN_TICK_MS {
            return;
        }
        let limit = self.spec.offline_limit_hours * 3600 * 1000;
        let granted = elapsed.min(limit);
        log::info!(
            "offline for {elapsed}ms, simulating {granted}ms of production"
        );
        self.tick(granted);
    }

    /// Wholesale replacement with the default state, then an immediate save.
    pub fn reset_save(&mut self, now: TimeMs) -> GameResult<()> {
        log::warn!("hard reset of game '{}'", self.spec.id);
        self.player =
            PlayerState::default_save(&self.spec.version, &self.spec.initial_points, now);
        self.registry.apply_onto_player(&mut self.player);
        self.last_tick_at = now;
        self.save()?;
        Ok(())
    }

    /// One cooperative scheduler step: runs a tick for the real elapsed
    /// time when the tick task is due, and an autosave when that task is
    /// due and automatic saving is on.
    pub fn advance(&mut self, now: TimeMs) -> GameResult<Fired> {
        let fired = self.scheduler.poll(now);
        if fired.tick {
            let delta = now.saturating_sub(self.last_tick_at);
            self.last_tick_at = now;
            self.tick(delta);
        }
        if fired.autosave && self.player.config.automatic_saving {
            self.save()?;
        }
        Ok(fired)
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Releases the storage backend, e.g. to hand it to a fresh engine.
    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn endgame_reached(&self) -> bool {
        self.player.points.gte(&self.spec.endgame)
    }
}
