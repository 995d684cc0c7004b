//! Enemy archetype, kinds, and the death check that removes fallen enemies.

pub mod spawn;
mod variants;

use bevy::prelude::*;

use crate::gameplay::ai::{AiComponent, AiTuning, Behavior, BehaviorPolicy, EnemyBrain, StateScratch};
use crate::gameplay::{Body, CombatStats, CurrentTarget, Health, WorldBounds};
use crate::screens::GameState;
use crate::{GameSet, gameplay_running};

pub use variants::{BRUTE_POLICY, GRUNT_POLICY, HUNTER_POLICY, PRIEST_POLICY, SCOUT_POLICY};

// === Constants ===

/// Per-level growth of health and damage.
const HEALTH_PER_LEVEL: f32 = 0.15;
const DAMAGE_PER_LEVEL: f32 = 0.10;
/// Speed grows slowly so late waves stay dodgeable.
const SPEED_PER_LEVEL: f32 = 0.03;
const MAX_SPEED_SCALE: f32 = 1.5;

// === Components ===

#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EnemyKind {
    Grunt,
    Brute,
    Hunter,
    Priest,
    Scout,
}

/// Level-1 numbers for an enemy kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindStats {
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
}

impl EnemyKind {
    pub const ALL: &'static [Self] = &[
        Self::Grunt,
        Self::Brute,
        Self::Hunter,
        Self::Priest,
        Self::Scout,
    ];

    /// Specialised enemies keep their distance in role-based layouts.
    #[must_use]
    pub const fn is_specialized(self) -> bool {
        matches!(self, Self::Hunter | Self::Priest)
    }

    #[must_use]
    pub const fn base_stats(self) -> KindStats {
        match self {
            Self::Grunt => KindStats {
                health: 30.0,
                damage: 8.0,
                speed: 90.0,
                size: 20.0,
            },
            Self::Brute => KindStats {
                health: 90.0,
                damage: 14.0,
                speed: 55.0,
                size: 30.0,
            },
            Self::Hunter => KindStats {
                health: 25.0,
                damage: 7.0,
                speed: 80.0,
                size: 18.0,
            },
            Self::Priest => KindStats {
                health: 35.0,
                damage: 6.0,
                speed: 70.0,
                size: 20.0,
            },
            Self::Scout => KindStats {
                health: 20.0,
                damage: 6.0,
                speed: 150.0,
                size: 16.0,
            },
        }
    }

    /// Stats scaled linearly with level. Level 0 is treated as level 1.
    #[must_use]
    pub fn stats(self, level: u32) -> KindStats {
        let base = self.base_stats();
        let steps = level.saturating_sub(1) as f32;
        KindStats {
            health: base.health * HEALTH_PER_LEVEL.mul_add(steps, 1.0),
            damage: base.damage * DAMAGE_PER_LEVEL.mul_add(steps, 1.0),
            speed: base.speed * SPEED_PER_LEVEL.mul_add(steps, 1.0).min(MAX_SPEED_SCALE),
            size: base.size,
        }
    }

    #[must_use]
    pub fn policy(self) -> &'static dyn BehaviorPolicy {
        match self {
            Self::Grunt => &GRUNT_POLICY,
            Self::Brute => &BRUTE_POLICY,
            Self::Hunter => &HUNTER_POLICY,
            Self::Priest => &PRIEST_POLICY,
            Self::Scout => &SCOUT_POLICY,
        }
    }

    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Grunt => Color::srgb(0.8, 0.2, 0.2),
            Self::Brute => Color::srgb(0.5, 0.1, 0.1),
            Self::Hunter => Color::srgb(0.9, 0.6, 0.1),
            Self::Priest => Color::srgb(0.6, 0.3, 0.9),
            Self::Scout => Color::srgb(0.2, 0.7, 0.9),
        }
    }
}

// === Messages ===

/// Written once per new enemy so squads can adopt it.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawned {
    pub entity: Entity,
    pub center: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DeathCause {
    Slain,
    Sacrificed,
    OutOfBounds,
}

/// Written by [`despawn_fallen_enemies`] just before the entity is despawned.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct EnemyDied {
    pub entity: Entity,
    pub cause: DeathCause,
}

// === Spawning ===

/// Spawn an enemy with every component its AI needs.
/// Single source of truth for the enemy archetype.
///
/// The caller writes the matching [`EnemySpawned`] message.
pub fn spawn_enemy(
    commands: &mut Commands,
    kind: EnemyKind,
    level: u32,
    center: Vec2,
    tuning: &AiTuning,
) -> Entity {
    let level = level.max(1);
    let stats = kind.stats(level);
    commands
        .spawn((
            Name::new(format!("{kind:?} L{level}")),
            Enemy { kind, level },
            Body::from_center(center, Vec2::splat(stats.size)),
            Health::new(stats.health),
            CombatStats {
                damage: stats.damage,
                speed: stats.speed,
            },
            AiComponent::new(stats.health, tuning.low_health_threshold),
            EnemyBrain::default(),
            Behavior(kind.policy()),
            CurrentTarget(None),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

// === Death ===

/// Why an enemy should be removed this frame, if it should.
#[must_use]
pub fn death_cause(
    health: &Health,
    body: &Body,
    brain: Option<&EnemyBrain>,
    ai: Option<&AiComponent>,
    bounds: &WorldBounds,
) -> Option<DeathCause> {
    let sacrificed = ai.is_some_and(|ai| {
        matches!(
            ai.scratch,
            StateScratch::Sacrifice {
                completed: true,
                ..
            }
        )
    });
    if sacrificed {
        Some(DeathCause::Sacrificed)
    } else if health.is_depleted() {
        Some(DeathCause::Slain)
    } else if bounds.is_outside(body.center()) {
        Some(DeathCause::OutOfBounds)
    } else if brain.is_some_and(|brain| brain.0.is_stopped()) {
        Some(DeathCause::Slain)
    } else {
        None
    }
}

/// Despawns enemies that are dead, sacrificed, or have left the arena.
pub(crate) fn despawn_fallen_enemies(
    mut commands: Commands,
    bounds: Res<WorldBounds>,
    enemies: Query<
        (Entity, &Health, &Body, Option<&EnemyBrain>, Option<&AiComponent>),
        With<Enemy>,
    >,
    mut died: MessageWriter<EnemyDied>,
) {
    for (entity, health, body, brain, ai) in &enemies {
        let Some(cause) = death_cause(health, body, brain, ai, &bounds) else {
            continue;
        };
        debug!("{entity} removed: {cause:?}");
        died.write(EnemyDied { entity, cause });
        commands.entity(entity).despawn();
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Enemy>()
        .add_message::<EnemySpawned>()
        .add_message::<EnemyDied>();

    spawn::plugin(app);

    app.add_systems(
        Update,
        despawn_fallen_enemies
            .in_set(GameSet::Death)
            .run_if(gameplay_running),
    );
}
