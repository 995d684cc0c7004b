//! Enemy AI: per-enemy state machines driven once per frame.
//!
//! Each enemy carries an [`EnemyBrain`] and an [`AiComponent`]. Every frame
//! [`tick_enemy_ai`] borrows the enemy's components into an [`Agent`], builds
//! an [`AiContext`] from the frame's shared data, and runs the brain. States
//! never touch the world directly: anything that affects another entity is
//! pushed as an [`AiEffect`] and applied later in `GameSet::Combat`.

mod effects;
mod policy;
pub mod state_machine;
mod states;
pub mod steering;

use std::time::Duration;

use bevy::prelude::*;
use rand::rngs::StdRng;

use crate::gameplay::enemies::Enemy;
use crate::gameplay::groups::{GroupId, Squad};
use crate::gameplay::player::Player;
use crate::gameplay::{Body, CombatStats, CurrentTarget, GameRng, Health, WorldBounds};
use crate::{GameSet, gameplay_running};

pub use effects::{AiEffect, DamageKind};
pub use policy::{Behavior, BehaviorPolicy, melee_reach, pursue_target};
pub use state_machine::{State, StateMachine, StateName, Transition};
pub use states::EnemyState;

// === Configuration ===

/// Timing and distance constants shared by every enemy state.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct AiTuning {
    /// Fraction of max health below which an enemy flees.
    pub low_health_threshold: f32,
    /// Extra reach added to the sum of half-widths for melee range.
    pub attack_range_padding: f32,
    pub attack_cooldown: Duration,
    pub retreat_duration: Duration,
    pub flee_speed_multiplier: f32,
    pub dodge_duration: Duration,
    pub dodge_speed_multiplier: f32,
    pub sacrifice_duration: Duration,
    /// Allies further than this are not considered as sacrifice recipients.
    pub sacrifice_search_radius: f32,
    /// Fraction of the sacrificer's max health given to the recipient.
    pub sacrifice_heal_fraction: f32,
    pub sacrifice_damage_multiplier: f32,
    pub sacrifice_speed_multiplier: f32,
    pub sacrifice_explosion_radius: f32,
    pub sacrifice_explosion_damage: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            low_health_threshold: 0.2,
            attack_range_padding: 10.0,
            attack_cooldown: Duration::from_millis(1000),
            retreat_duration: Duration::from_millis(3000),
            flee_speed_multiplier: 1.5,
            dodge_duration: Duration::from_millis(500),
            dodge_speed_multiplier: 2.0,
            sacrifice_duration: Duration::from_millis(2000),
            sacrifice_search_radius: 150.0,
            sacrifice_heal_fraction: 0.5,
            sacrifice_damage_multiplier: 1.5,
            sacrifice_speed_multiplier: 1.2,
            sacrifice_explosion_radius: 120.0,
            sacrifice_explosion_damage: 40.0,
        }
    }
}

// === Components ===

/// Data that only one state needs while it is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub enum StateScratch {
    #[default]
    None,
    Dodge {
        direction: Vec2,
    },
    Sacrifice {
        target: Option<Entity>,
        completed: bool,
    },
}

/// Per-enemy AI bookkeeping: thresholds, timestamps and state scratch data.
///
/// Timestamps are virtual elapsed time, so they freeze while the game is paused.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AiComponent {
    pub low_health_threshold: f32,
    pub state_entered_at: Duration,
    pub last_attack_at: Option<Duration>,
    pub last_special_at: Option<Duration>,
    pub last_dodge_at: Option<Duration>,
    /// Health seen at the end of the previous tick. A drop means we were struck.
    pub observed_health: f32,
    pub scratch: StateScratch,
}

impl AiComponent {
    #[must_use]
    pub const fn new(max_health: f32, low_health_threshold: f32) -> Self {
        Self {
            low_health_threshold,
            state_entered_at: Duration::ZERO,
            last_attack_at: None,
            last_special_at: None,
            last_dodge_at: None,
            observed_health: max_health,
            scratch: StateScratch::None,
        }
    }

    /// Records the current health and reports whether it dropped since last call.
    pub fn observe_health(&mut self, current: f32) -> bool {
        let struck = current < self.observed_health;
        self.observed_health = current;
        struck
    }
}

/// The enemy's state machine.
#[derive(Component, Debug, Clone)]
pub struct EnemyBrain(pub StateMachine<EnemyState>);

impl Default for EnemyBrain {
    fn default() -> Self {
        Self(StateMachine::new(EnemyState::Idle).with_global(EnemyState::Reflexes))
    }
}

impl EnemyBrain {
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.0.state_name()
    }
}

// === Per-tick views ===

/// Mutable view of one enemy for the duration of its tick.
pub struct Agent<'a> {
    pub entity: Entity,
    pub body: &'a mut Body,
    pub health: &'a mut Health,
    pub stats: &'a mut CombatStats,
    pub ai: &'a mut AiComponent,
    pub squad: Option<Squad>,
    pub policy: &'static dyn BehaviorPolicy,
    /// State the machine was in when the tick started.
    pub state: Option<EnemyState>,
    /// Health dropped since the previous tick.
    pub struck: bool,
}

impl Agent<'_> {
    #[must_use]
    pub fn is_low_health(&self) -> bool {
        self.health.current < self.ai.low_health_threshold * self.health.max
    }

    #[must_use]
    pub fn time_in_state(&self, now: Duration) -> Duration {
        now.saturating_sub(self.ai.state_entered_at)
    }

    #[must_use]
    pub fn formation_position(&self) -> Option<Vec2> {
        self.squad.and_then(|squad| squad.formation_position)
    }

    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.squad.map(|squad| squad.group)
    }
}

/// The entity an enemy is hunting, copied at the start of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub body: Body,
}

impl TargetSnapshot {
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.body.center()
    }
}

/// Another enemy as seen at the start of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllySnapshot {
    pub entity: Entity,
    pub group: Option<GroupId>,
    pub center: Vec2,
    pub health: Health,
}

/// Shared frame data handed to every state hook.
pub struct AiContext<'w> {
    pub now: Duration,
    pub delta: Duration,
    pub target: Option<TargetSnapshot>,
    pub allies: &'w [AllySnapshot],
    pub tuning: &'w AiTuning,
    pub bounds: &'w WorldBounds,
    pub rng: &'w mut StdRng,
    pub effects: &'w mut Vec<AiEffect>,
}

/// True when `cooldown` has passed since `last`, or when it never happened.
#[must_use]
pub fn cooldown_ready(last: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    last.is_none_or(|at| now.saturating_sub(at) >= cooldown)
}

// === Systems ===

/// Points every enemy at the player. There is a single player, so no search is needed.
fn acquire_player_target(
    players: Query<Entity, With<Player>>,
    mut enemies: Query<&mut CurrentTarget, With<Enemy>>,
) {
    let player = players.iter().next();
    for mut target in &mut enemies {
        if target.0 != player {
            target.0 = player;
        }
    }
}

type EnemyAiQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Body,
        &'static mut Health,
        &'static mut CombatStats,
        &'static mut AiComponent,
        &'static mut EnemyBrain,
        &'static Behavior,
        &'static CurrentTarget,
        Option<&'static Squad>,
    ),
    With<Enemy>,
>;

/// Runs every enemy's state machine once and publishes the resulting effects.
pub fn tick_enemy_ai(
    time: Res<Time>,
    tuning: Res<AiTuning>,
    bounds: Res<WorldBounds>,
    mut rng: ResMut<GameRng>,
    targets: Query<(Entity, &Body), (With<Player>, Without<Enemy>)>,
    mut enemies: EnemyAiQuery,
    mut effects_out: MessageWriter<AiEffect>,
) {
    let allies: Vec<AllySnapshot> = enemies
        .iter()
        .map(|(entity, body, health, _, _, _, _, _, squad)| AllySnapshot {
            entity,
            group: squad.map(|s| s.group),
            center: body.center(),
            health: *health,
        })
        .collect();

    let mut effects = Vec::new();
    for (entity, mut body, mut health, mut stats, mut ai, mut brain, behavior, target, squad) in
        &mut enemies
    {
        if brain.0.is_stopped() {
            continue;
        }

        let target = target
            .0
            .and_then(|e| targets.get(e).ok())
            .map(|(entity, body)| TargetSnapshot {
                entity,
                body: *body,
            });
        let struck = ai.observe_health(health.current);

        let mut agent = Agent {
            entity,
            body: &mut body,
            health: &mut health,
            stats: &mut stats,
            ai: &mut ai,
            squad: squad.copied(),
            policy: behavior.0,
            state: brain.0.current(),
            struck,
        };
        let mut ctx = AiContext {
            now: time.elapsed(),
            delta: time.delta(),
            target,
            allies: &allies,
            tuning: &tuning,
            bounds: &bounds,
            rng: &mut rng.0,
            effects: &mut effects,
        };

        brain.0.update(&mut agent, &mut ctx);

        // Health set by the state itself (sacrifice) is not a hit.
        agent.ai.observed_health = agent.health.current;
    }

    effects_out.write_batch(effects);
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<AiTuning>()
        .register_type::<AiComponent>()
        .init_resource::<AiTuning>()
        .add_message::<AiEffect>();

    app.add_systems(
        Update,
        (acquire_player_target, tick_enemy_ai)
            .chain()
            .in_set(GameSet::Ai)
            .run_if(gameplay_running),
    );

    effects::plugin(app);
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cooldown_ready_when_never_used() {
        assert!(cooldown_ready(None, Duration::ZERO, Duration::from_secs(1)));
    }

    #[test]
    fn cooldown_respects_elapsed_time() {
        let last = Some(Duration::from_millis(500));
        assert!(!cooldown_ready(last, Duration::from_millis(1400), Duration::from_secs(1)));
        assert!(cooldown_ready(last, Duration::from_millis(1500), Duration::from_secs(1)));
    }

    #[test]
    fn observe_health_detects_drops_only() {
        let mut ai = AiComponent::new(50.0, 0.2);
        assert!(!ai.observe_health(50.0));
        assert!(ai.observe_health(40.0));
        assert!(!ai.observe_health(45.0));
    }

    #[test]
    fn default_brain_starts_idle_with_reflexes() {
        let brain = EnemyBrain::default();
        assert_eq!(brain.0.current(), Some(EnemyState::Idle));
        assert_eq!(brain.0.global(), Some(EnemyState::Reflexes));
        assert_eq!(brain.state_name(), "Idle");
    }
}
