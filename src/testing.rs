//! Testing utilities for Bevy systems.

#![cfg(test)]

use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use crate::{GameState, InGameState};

/// Creates a minimal app for testing with essential plugins.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app
}

/// Creates a test app with the game's state machine registered.
///
/// Starts in `GameState::Loading`. Use [`transition_to_ingame`] to reach gameplay.
pub fn create_base_test_app() -> App {
    let mut app = create_test_app();
    app.add_plugins(StatesPlugin);
    app.init_state::<GameState>();
    app.add_sub_state::<InGameState>();
    app
}

/// Moves the app into `GameState::InGame` and runs the frame that applies it.
///
/// `OnEnter(GameState::InGame)` systems have run when this returns.
pub fn transition_to_ingame(app: &mut App) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::InGame);
    app.update();
}

/// Makes every subsequent `app.update()` advance time by exactly `step`.
pub fn use_fixed_frame_step(app: &mut App, step: Duration) {
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
}

/// Asserts the number of entities matching the filter `F`.
pub fn assert_entity_count<F: bevy::ecs::query::QueryFilter>(app: &mut App, expected: usize) {
    let mut query = app.world_mut().query_filtered::<Entity, F>();
    let actual = query.iter(app.world()).count();
    assert_eq!(
        actual, expected,
        "expected {expected} entities matching filter, found {actual}"
    );
}

/// Distinct entity ids for pure-logic tests that never touch an `App`.
pub fn test_entities(count: usize) -> Vec<Entity> {
    let mut world = World::new();
    (0..count).map(|_| world.spawn_empty().id()).collect()
}

/// Helper to advance the app by multiple frames.
pub fn tick_multiple(app: &mut App, count: usize) {
    for _ in 0..count {
        app.update();
    }
}
