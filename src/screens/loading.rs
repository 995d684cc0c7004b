//! Loading screen: nothing to load yet, so the run starts on the first frame.

use bevy::prelude::*;

use super::GameState;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        check_loading_complete.run_if(in_state(GameState::Loading)),
    );
}

fn check_loading_complete(mut next_state: ResMut<NextState<GameState>>) {
    info!("Loading complete, starting run");
    next_state.set(GameState::InGame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_base_test_app;
    use pretty_assertions::assert_eq;

    #[test]
    fn loading_moves_to_in_game() {
        let mut app = create_base_test_app();
        app.add_plugins(plugin);

        app.update(); // check_loading_complete queues the transition
        app.update(); // StateTransition applies it

        let state = app.world().resource::<State<GameState>>();
        assert_eq!(*state.get(), GameState::InGame);
    }
}
