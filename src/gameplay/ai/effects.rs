//! Effects produced by enemy states and applied to the world in `GameSet::Combat`.

use std::time::Duration;

use bevy::prelude::*;

use crate::gameplay::enemies::Enemy;
use crate::gameplay::player::Player;
use crate::gameplay::{CombatStats, Health};
use crate::{GameSet, gameplay_running};

/// How a hit was delivered. Only used for logging and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DamageKind {
    Melee,
    Ranged,
    Slam,
    Lunge,
    Explosion,
}

/// Something an enemy did to another entity this frame.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum AiEffect {
    /// Hit the player. Scaled by the player's mark multiplier when applied.
    DamagePlayer {
        source: Entity,
        amount: f32,
        kind: DamageKind,
    },
    /// Restore health to an enemy, clamped to its max.
    Heal { target: Entity, amount: f32 },
    /// Permanently scale an enemy's damage and speed.
    Empower {
        target: Entity,
        damage_multiplier: f32,
        speed_multiplier: f32,
    },
    /// Player takes extra damage until `until` (virtual elapsed time).
    MarkPlayer { source: Entity, until: Duration },
    /// Progress of a sacrifice channel toward `target`, in `[0, 1]`.
    EnergyTransfer {
        source: Entity,
        target: Entity,
        progress: f32,
    },
}

fn apply_ai_effects(
    mut effects: MessageReader<AiEffect>,
    mut players: Query<(&mut Health, &mut Player), Without<Enemy>>,
    mut enemies: Query<(&mut Health, &mut CombatStats), With<Enemy>>,
    time: Res<Time>,
) {
    let now = time.elapsed();
    for effect in effects.read() {
        match *effect {
            AiEffect::DamagePlayer { amount, kind, .. } => {
                for (mut health, player) in &mut players {
                    let dealt = amount * player.damage_taken_multiplier(now);
                    health.take_damage(dealt);
                    debug!("Player took {dealt:.1} {kind:?} damage");
                }
            }
            AiEffect::MarkPlayer { until, .. } => {
                for (_, mut player) in &mut players {
                    player.mark_until(until);
                }
            }
            AiEffect::Heal { target, amount } => {
                if let Ok((mut health, _)) = enemies.get_mut(target) {
                    health.heal(amount);
                }
            }
            AiEffect::Empower {
                target,
                damage_multiplier,
                speed_multiplier,
            } => {
                if let Ok((_, mut stats)) = enemies.get_mut(target) {
                    stats.empower(damage_multiplier, speed_multiplier);
                }
            }
            AiEffect::EnergyTransfer { .. } => {}
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        apply_ai_effects
            .in_set(GameSet::Combat)
            .run_if(gameplay_running),
    );
}
