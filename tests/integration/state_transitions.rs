//! Tests for game state transitions.

use bevy::prelude::*;
use horde_survival::gameplay::player::Player;
use horde_survival::{GameState, InGameState};
use pretty_assertions::assert_eq;

use super::{create_game_app, enter_game};

#[test]
fn game_initializes_in_loading_state() {
    let app = create_game_app();
    let state = app.world().resource::<State<GameState>>();
    assert_eq!(*state.get(), GameState::Loading);
}

#[test]
fn loading_hands_over_to_gameplay() {
    let mut app = create_game_app();
    enter_game(&mut app);

    let state = app.world().resource::<State<GameState>>();
    assert_eq!(*state.get(), GameState::InGame);
    let sub = app.world().resource::<State<InGameState>>();
    assert_eq!(*sub.get(), InGameState::Playing);

    let players = app
        .world_mut()
        .query_filtered::<Entity, With<Player>>()
        .iter(app.world())
        .count();
    assert_eq!(players, 1);
}

#[test]
fn pausing_freezes_virtual_time() {
    let mut app = create_game_app();
    enter_game(&mut app);

    app.world_mut()
        .resource_mut::<NextState<InGameState>>()
        .set(InGameState::Paused);
    app.update();
    let frozen = app.world().resource::<Time<Virtual>>().elapsed();
    app.update();
    app.update();

    let time = app.world().resource::<Time<Virtual>>();
    assert!(time.is_paused());
    assert_eq!(time.elapsed(), frozen);
}
