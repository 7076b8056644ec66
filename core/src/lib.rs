//! Prestige-tree game logic core.
//!
//! Everything a host (UI or headless runner) needs to run the game:
//! arbitrary-precision values, softcap/scale transforms, display
//! formatting, the save envelope codec, the player-state schema with
//! validation, persistence, the layer content interface, the cooperative
//! scheduler, and the engine that ties them together.

pub mod decimal;
pub mod engine;
pub mod error;
pub mod format;
pub mod intervals;
pub mod layer;
pub mod save;
pub mod serializer;
pub mod softcap;
pub mod storage;
pub mod types;

pub use decimal::Decimal;
pub use engine::{GameEngine, GameSpec, PointsPipeline};
pub use error::{GameError, GameResult};
pub use intervals::{Fired, Interval, Scheduler};
pub use layer::{LayerRegistry, LayerSpec, ResourceCalculation};
pub use save::{InvalidSavePolicy, NodeData, PlayerState};
pub use softcap::{scale, softcap, ScaleMode, SoftcapMode};
pub use storage::{MemoryStorage, SaveStorage, SqliteStorage};
pub use types::{FeatureId, LayerId, TimeMs};
