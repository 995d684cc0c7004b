//! Game states and the screen-level plugins that move between them.

mod in_game;
mod loading;

use bevy::prelude::*;

/// Primary game states.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Initial loading state.
    #[default]
    Loading,
    /// Active run: player, enemies and squads exist.
    InGame,
}

/// Sub-states within `InGame`. Only exists while `GameState::InGame` is active.
#[derive(SubStates, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[source(GameState = GameState::InGame)]
pub enum InGameState {
    /// Normal gameplay.
    #[default]
    Playing,
    /// Game is paused. Virtual time is frozen with it.
    Paused,
}

pub(super) fn plugin(app: &mut App) {
    app.init_state::<GameState>()
        .add_sub_state::<InGameState>()
        .add_systems(Startup, setup_camera);

    app.add_plugins((loading::plugin, in_game::plugin));
}

/// Spawns the global 2D camera. Persists across all states (do NOT add `DespawnOnExit`).
fn setup_camera(mut commands: Commands) {
    commands.spawn((Name::new("Camera"), Camera2d));
}
