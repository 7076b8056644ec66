//! Layer content interface.
//!
//! Game content defines each prestige layer as data plus injected
//! callbacks; the core calls through this surface without knowing any
//! layer's internals. Behavior variants are a tagged sum
//! ([`ResourceCalculation`]), not a class hierarchy: each variant carries
//! exactly the callbacks it needs.

use std::collections::BTreeMap;

use crate::decimal::Decimal;
use crate::error::{GameError, GameResult};
use crate::save::{NodeData, PlayerState};
use crate::types::LayerId;

pub type Predicate = Box<dyn Fn(&PlayerState) -> bool>;
pub type ResourceFn = Box<dyn Fn(&PlayerState) -> Decimal>;
pub type FormulaFn = Box<dyn Fn(&Decimal) -> Decimal>;
pub type UpdateFn = Box<dyn Fn(&mut PlayerState, &Decimal)>;

/// How a layer's prestige gain is computed.
pub enum ResourceCalculation {
    /// Currency accrues continuously: `effects(formula(base_resource))`.
    Incremental {
        formula: FormulaFn,
        effects: FormulaFn,
        /// Fraction of gain earned passively per second, if any.
        passive_generation: Option<ResourceFn>,
    },
    /// Currency is bought in discrete units at a rising cost. Gain
    /// evaluation for this variant is unfinished content.
    Static {
        formula: FormulaFn,
        effects: FormulaFn,
        round_cost: bool,
        can_buy_max: Predicate,
    },
}

/// The resource a layer's prestige formula reads.
pub struct ReliesOn {
    pub resource_name: String,
    pub resource: ResourceFn,
}

/// One prestige layer: identity and display data plus injected behavior.
pub struct LayerSpec {
    pub id: LayerId,
    pub name: String,
    pub symbol: String,
    pub color: String,
    pub row: u32,
    pub position: u32,
    pub base_requirement: Decimal,
    pub branches_from: Vec<LayerId>,
    pub relies_on: ReliesOn,
    pub calculation: ResourceCalculation,
    /// Seeded into the player's node map the first time the layer appears.
    pub base_data: NodeData,
    /// Condition for the layer to unlock; once met, the persisted flag on
    /// the node stays set.
    pub unlockable: Predicate,
    pub shown: Predicate,
    pub disabled: Predicate,
    pub resets_nothing: Predicate,
    /// Feature names preserved when the named higher layer resets this one.
    pub keep_on_reset: Box<dyn Fn(&str) -> Vec<String>>,
    pub update: Option<UpdateFn>,
}

impl LayerSpec {
    /// A layer with inert defaults: reads main points, gains nothing,
    /// always shown, never disabled. Content overrides what it needs.
    pub fn new(id: impl Into<LayerId>, name: impl Into<String>, row: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: String::new(),
            color: String::new(),
            row,
            position: 0,
            base_requirement: Decimal::zero(),
            branches_from: Vec::new(),
            relies_on: ReliesOn {
                resource_name: "points".to_string(),
                resource: Box::new(|player| player.points.clone()),
            },
            calculation: ResourceCalculation::Incremental {
                formula: Box::new(|_| Decimal::zero()),
                effects: Box::new(Decimal::clone),
                passive_generation: None,
            },
            base_data: NodeData::default(),
            unlockable: Box::new(|_| false),
            shown: Box::new(|_| true),
            disabled: Box::new(|_| false),
            resets_nothing: Box::new(|_| false),
            keep_on_reset: Box::new(|_| Vec::new()),
            update: None,
        }
    }

    /// Prestige gain for the current player state.
    pub fn resource_gain(&self, player: &PlayerState) -> GameResult<Decimal> {
        match &self.calculation {
            ResourceCalculation::Incremental {
                formula, effects, ..
            } => {
                let base = (self.relies_on.resource)(player);
                Ok(effects(&formula(&base)))
            }
            ResourceCalculation::Static { .. } => {
                Err(GameError::NotImplemented("static cost calculation"))
            }
        }
    }

    pub fn is_unlocked(&self, player: &PlayerState) -> bool {
        player.node(&self.id).is_some_and(|node| node.unlocked)
    }

    pub fn is_disabled(&self, player: &PlayerState) -> bool {
        (self.disabled)(player)
    }
}

/// All registered layers, held in tree order (row-major).
#[derive(Default)]
pub struct LayerRegistry {
    layers: Vec<LayerSpec>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: LayerSpec) {
        let at = self
            .layers
            .partition_point(|l| (l.row, l.position) <= (spec.row, spec.position));
        self.layers.insert(at, spec);
    }

    pub fn get(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerSpec> {
        self.layers.iter()
    }

    /// Seeds node data for any registered layer the player doesn't have
    /// yet. Existing nodes are left alone, so loaded saves keep progress.
    pub fn apply_onto_player(&self, player: &mut PlayerState) {
        for layer in &self.layers {
            player
                .nodes
                .entry(layer.id.clone())
                .or_insert_with(|| layer.base_data.clone());
        }
    }

    /// Runs every layer's per-tick work in row order, skipping disabled
    /// layers: passive generation first, then the layer's own update.
    /// `diff` is the scaled elapsed time in seconds.
    pub fn tick(&self, player: &mut PlayerState, diff: &Decimal) {
        for layer in &self.layers {
            if layer.is_disabled(player) {
                continue;
            }
            if !layer.is_unlocked(player) && (layer.unlockable)(player) {
                if let Some(node) = player.node_mut(&layer.id) {
                    node.unlocked = true;
                }
            }
            if let ResourceCalculation::Incremental {
                passive_generation: Some(passive),
                ..
            } = &layer.calculation
            {
                let rate = passive(player);
                if rate.gt(&Decimal::zero()) {
                    if let Ok(gain) = layer.resource_gain(player) {
                        let earned = gain.mul(&rate).mul(diff);
                        if let Some(node) = player.node_mut(&layer.id) {
                            node.points = node.points.add(&earned);
                            node.total = node.total.add(&earned);
                        }
                    }
                }
            }
            if let Some(update) = &layer.update {
                update(player, diff);
            }
        }
    }

    /// Generic cross-layer reset path. Unfinished content: every reset so
    /// far is layer-specific, expressed through `keep_on_reset`.
    pub fn reset_layer(&self, _id: &str, _keep: &[String]) -> GameResult<()> {
        Err(GameError::NotImplemented("generic layer reset"))
    }
}

pub fn has_upgrade(player: &PlayerState, layer: &str, upgrade: &str) -> bool {
    player
        .node(layer)
        .is_some_and(|node| node.upgrades.contains(upgrade))
}

pub fn has_milestone(player: &PlayerState, layer: &str, milestone: &str) -> bool {
    player
        .node(layer)
        .is_some_and(|node| node.milestones.contains(milestone))
}

pub fn has_achievement(player: &PlayerState, layer: &str, achievement: &str) -> bool {
    player
        .node(layer)
        .is_some_and(|node| node.achievements.contains(achievement))
}

pub fn buyable_amount(player: &PlayerState, layer: &str, buyable: &str) -> Decimal {
    player
        .node(layer)
        .and_then(|node| node.buyables.get(buyable))
        .cloned()
        .unwrap_or_else(Decimal::zero)
}

pub fn set_buyable_amount(
    player: &mut PlayerState,
    layer: &str,
    buyable: &str,
    amount: Decimal,
) {
    let node = player
        .nodes
        .entry(layer.to_string())
        .or_insert_with(NodeData::default);
    node.buyables.insert(buyable.to_string(), amount);
}

/// Node data for layers the registry knows about, keyed by layer id.
/// Convenience for content that wants a default map without a player.
pub fn default_nodes(registry: &LayerRegistry) -> BTreeMap<LayerId, NodeData> {
    registry
        .iter()
        .map(|layer| (layer.id.clone(), layer.base_data.clone()))
        .collect()
}
