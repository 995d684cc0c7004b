//! In-game screen: pause/unpause input and virtual time freezing.
//!
//! Gameplay logic is handled by the domain plugins under `gameplay`. This
//! plugin only owns the keybinding that flips `InGameState`.

use bevy::prelude::*;

use super::{GameState, InGameState};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        handle_pause_input.run_if(in_state(GameState::InGame)),
    );

    // Freezing virtual time stops every timestamp comparison in the AI layer,
    // so cooldowns and state durations do not silently expire while paused.
    app.add_systems(OnEnter(InGameState::Paused), pause_virtual_time);
    app.add_systems(OnExit(InGameState::Paused), unpause_virtual_time);
}

fn handle_pause_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    current_state: Res<State<InGameState>>,
    mut next_state: ResMut<NextState<InGameState>>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    match current_state.get() {
        InGameState::Playing => next_state.set(InGameState::Paused),
        InGameState::Paused => next_state.set(InGameState::Playing),
    }
}

fn pause_virtual_time(mut time: ResMut<Time<Virtual>>) {
    time.pause();
}

fn unpause_virtual_time(mut time: ResMut<Time<Virtual>>) {
    time.unpause();
}
