//! Crate-level tests running the full game plugin headless.

mod squad_lifecycle;
mod state_transitions;

use std::time::Duration;

use bevy::input::InputPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use horde_survival::gameplay::GameRng;

/// Full game plugin on `MinimalPlugins`, fixed 100 ms frames, seeded randomness.
pub fn create_game_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.add_plugins(InputPlugin);
    app.add_plugins(horde_survival::plugin);
    app.insert_resource(GameRng::seeded(42));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
    app
}

/// Runs frames until loading hands over to `InGame`.
pub fn enter_game(app: &mut App) {
    app.update(); // loading queues InGame
    app.update(); // StateTransition applies it
}
