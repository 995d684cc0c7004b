//! Common imports for the entire crate.

pub use bevy::prelude::*;

pub use crate::gameplay::ai::{AiEffect, AiTuning, EnemyBrain, EnemyState};
pub use crate::gameplay::enemies::{Enemy, EnemyDied, EnemyKind, EnemySpawned};
pub use crate::gameplay::groups::{EnemyGroupManager, GroupConfig, Role, Squad};
pub use crate::gameplay::player::Player;
pub use crate::gameplay::{Body, CombatStats, GameRng, Health, WorldBounds};
pub use crate::{GameSet, GameState, InGameState};
