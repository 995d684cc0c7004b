//! Development tools, only included with the `dev` feature.
//!
//! `E` drops a mixed squad just outside the arena, and a repeating timer logs
//! a one-line summary of every active squad.

use std::fmt::Write as _;

use bevy::prelude::*;

use crate::gameplay::ai::AiTuning;
use crate::gameplay::enemies::spawn::offscreen_spawn_point;
use crate::gameplay::enemies::{EnemyKind, EnemySpawned, spawn_enemy};
use crate::gameplay::groups::EnemyGroupManager;
use crate::gameplay::{GameRng, WorldBounds};
use crate::{GameSet, gameplay_running};

/// Kinds spawned per E key press.
const SQUAD_BURST: &[EnemyKind] = &[
    EnemyKind::Grunt,
    EnemyKind::Grunt,
    EnemyKind::Hunter,
    EnemyKind::Priest,
    EnemyKind::Scout,
];

/// Spacing between members of a debug burst.
const BURST_SPACING: f32 = 25.0;

const SUMMARY_INTERVAL_SECS: f32 = 5.0;

#[derive(Resource, Debug)]
struct SquadSummaryTimer(Timer);

impl Default for SquadSummaryTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(SUMMARY_INTERVAL_SECS, TimerMode::Repeating))
    }
}

fn debug_spawn_squad(
    keyboard: Res<ButtonInput<KeyCode>>,
    tuning: Res<AiTuning>,
    bounds: Res<WorldBounds>,
    mut rng: ResMut<GameRng>,
    mut spawned: MessageWriter<EnemySpawned>,
    mut commands: Commands,
) {
    if !keyboard.just_pressed(KeyCode::KeyE) {
        return;
    }

    let origin = offscreen_spawn_point(&bounds, &mut rng.0);
    for (i, kind) in SQUAD_BURST.iter().enumerate() {
        let center = origin + Vec2::new(BURST_SPACING * i as f32, 0.0);
        let entity = spawn_enemy(&mut commands, *kind, 1, center, &tuning);
        spawned.write(EnemySpawned { entity, center });
    }
    info!("Debug squad of {} spawned at {origin}", SQUAD_BURST.len());
}

/// One line per active squad: id, archetype, formation, size, leader.
fn squad_summary(manager: &EnemyGroupManager) -> String {
    let mut summary = String::new();
    for group in manager.groups().iter().filter(|g| g.is_active()) {
        let _ = write!(
            summary,
            "[#{} {:?}/{:?} x{} leader {:?}] ",
            group.id().0,
            group.group_type(),
            group.formation_type(),
            group.len(),
            group.leader(),
        );
    }
    summary.trim_end().to_string()
}

fn log_squad_summary(
    time: Res<Time>,
    mut timer: ResMut<SquadSummaryTimer>,
    manager: Res<EnemyGroupManager>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }
    let summary = squad_summary(&manager);
    if summary.is_empty() {
        info!("No active squads");
    } else {
        info!("Squads: {summary}");
    }
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<SquadSummaryTimer>();

    app.add_systems(
        Update,
        (
            debug_spawn_squad.in_set(GameSet::Input),
            log_squad_summary.in_set(GameSet::Presentation),
        )
            .run_if(gameplay_running),
    );
}
