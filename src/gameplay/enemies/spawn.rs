//! Wave spawning with ramping pace and level-gated enemy kinds.

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::gameplay::ai::AiTuning;
use crate::gameplay::{GameRng, WorldBounds};
use crate::screens::GameState;
use crate::{GameSet, gameplay_running};

use super::{Enemy, EnemyKind, EnemySpawned, spawn_enemy};

// === Constants ===

/// Seconds before the first wave after entering `InGame`.
pub const INITIAL_DELAY: f32 = 2.0;

/// Starting interval between waves (seconds).
pub const START_INTERVAL: f32 = 2.5;

/// Minimum interval between waves (seconds).
pub const MIN_INTERVAL: f32 = 0.6;

/// Duration (seconds) over which the interval ramps from START to MIN.
pub const RAMP_DURATION: f32 = 300.0; // 5 minutes

/// Seconds of play per enemy level.
pub const LEVEL_DURATION: f32 = 60.0;

/// Waves pause while this many enemies are alive.
pub const MAX_ALIVE: usize = 60;

/// How far past the arena edge enemies appear. Must stay inside `WorldBounds::margin`.
const SPAWN_OFFSET: f32 = 40.0;

/// Scatter of a wave's members around its spawn point.
const CLUSTER_JITTER: f32 = 30.0;

const MAX_CLUSTER: u32 = 4;

// === Resource ===

/// Tracks wave timing and the current enemy level.
///
/// Inserted on `OnEnter(GameState::InGame)`, reset each time the state is entered.
#[derive(Resource, Debug, Reflect)]
#[reflect(Resource)]
pub struct WaveSpawner {
    /// One-shot timer, re-created with a shorter interval after each wave.
    pub timer: Timer,
    pub elapsed_secs: f32,
    pub level: u32,
}

impl Default for WaveSpawner {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(INITIAL_DELAY, TimerMode::Once),
            elapsed_secs: 0.0,
            level: 1,
        }
    }
}

// === Pure Functions ===

/// Compute the current wave interval based on elapsed time.
///
/// Returns `START_INTERVAL` when spawning begins, linearly decreasing to
/// `MIN_INTERVAL` over `RAMP_DURATION` seconds.
#[must_use]
pub fn current_interval(elapsed_secs: f32) -> f32 {
    let spawning_time = (elapsed_secs - INITIAL_DELAY).max(0.0);
    let t = (spawning_time / RAMP_DURATION).min(1.0);
    (MIN_INTERVAL - START_INTERVAL).mul_add(t, START_INTERVAL)
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // elapsed is clamped to >= 0
pub fn level_at(elapsed_secs: f32) -> u32 {
    1 + (elapsed_secs.max(0.0) / LEVEL_DURATION) as u32
}

/// Relative spawn weight of a kind at a level. Zero until the kind unlocks.
#[must_use]
pub const fn kind_weight(kind: EnemyKind, level: u32) -> u32 {
    match kind {
        EnemyKind::Grunt => 10,
        EnemyKind::Scout if level >= 2 => 4,
        EnemyKind::Hunter if level >= 2 => 3,
        EnemyKind::Brute if level >= 3 => 3,
        EnemyKind::Priest if level >= 4 => 2,
        _ => 0,
    }
}

pub fn pick_kind(level: u32, rng: &mut impl Rng) -> EnemyKind {
    EnemyKind::ALL
        .choose_weighted(rng, |kind| kind_weight(*kind, level))
        .copied()
        .unwrap_or(EnemyKind::Grunt)
}

/// Members per wave grow with level.
pub fn cluster_size(level: u32, rng: &mut impl Rng) -> u32 {
    let max = (1 + level / 2).min(MAX_CLUSTER);
    rng.random_range(1..=max)
}

/// A point just outside a random arena edge.
pub fn offscreen_spawn_point(bounds: &WorldBounds, rng: &mut impl Rng) -> Vec2 {
    let size = bounds.size;
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random_range(0.0..=size.x), -SPAWN_OFFSET),
        1 => Vec2::new(size.x + SPAWN_OFFSET, rng.random_range(0.0..=size.y)),
        2 => Vec2::new(rng.random_range(0.0..=size.x), size.y + SPAWN_OFFSET),
        _ => Vec2::new(-SPAWN_OFFSET, rng.random_range(0.0..=size.y)),
    }
}

// === Systems ===

fn reset_wave_spawner(mut commands: Commands) {
    commands.insert_resource(WaveSpawner::default());
}

/// Tick the wave timer and spawn a cluster of enemies when it fires.
fn tick_wave_spawner(
    time: Res<Time>,
    mut spawner: ResMut<WaveSpawner>,
    tuning: Res<AiTuning>,
    bounds: Res<WorldBounds>,
    mut rng: ResMut<GameRng>,
    enemies: Query<(), With<Enemy>>,
    mut spawned: MessageWriter<EnemySpawned>,
    mut commands: Commands,
) {
    spawner.elapsed_secs += time.delta_secs();
    spawner.timer.tick(time.delta());

    let level = level_at(spawner.elapsed_secs);
    if level != spawner.level {
        spawner.level = level;
        info!("Enemy level {level}");
    }

    if !spawner.timer.just_finished() {
        return;
    }
    let next_interval = current_interval(spawner.elapsed_secs);
    spawner.timer = Timer::new(Duration::from_secs_f32(next_interval), TimerMode::Once);

    if enemies.iter().count() >= MAX_ALIVE {
        return;
    }

    let rng = &mut rng.0;
    let origin = offscreen_spawn_point(&bounds, rng);
    for _ in 0..cluster_size(level, rng) {
        let jitter = Vec2::new(
            rng.random_range(-CLUSTER_JITTER..=CLUSTER_JITTER),
            rng.random_range(-CLUSTER_JITTER..=CLUSTER_JITTER),
        );
        let center = origin + jitter;
        let kind = pick_kind(level, rng);
        let entity = spawn_enemy(&mut commands, kind, level, center, &tuning);
        spawned.write(EnemySpawned { entity, center });
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<WaveSpawner>();

    app.add_systems(OnEnter(GameState::InGame), reset_wave_spawner);

    app.add_systems(
        Update,
        tick_wave_spawner
            .in_set(GameSet::Spawn)
            .run_if(gameplay_running),
    );
}
