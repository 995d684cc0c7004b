//! Horde survival game library: enemy AI, squad coordination, and the systems that drive them.

#[cfg(feature = "dev")]
mod dev_tools;
pub mod gameplay;
pub mod prelude;
pub mod screens;
#[cfg(test)]
pub mod testing;

use bevy::prelude::*;

pub use screens::{GameState, InGameState};

/// Z layer for enemy and player sprites.
pub const Z_UNIT: f32 = 10.0;

/// Frame-level ordering of gameplay work. Sets are chained in this order every `Update`.
///
/// Player input runs before enemies think, enemies think before their squads
/// recompute formations, and combat resolution sees the effects of both.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Player input and player movement.
    Input,
    /// Wave spawning.
    Spawn,
    /// Per-enemy state machines.
    Ai,
    /// Squad membership, formations and merges.
    Squads,
    /// Effects emitted by the AI layer (damage, heals, buffs).
    Combat,
    /// Removal of dead or escaped enemies.
    Death,
    /// Presentation: sprites and transforms.
    Presentation,
}

/// Run condition: gameplay is active and not paused.
#[must_use]
pub fn gameplay_running(
    game_state: Option<Res<State<GameState>>>,
    in_game_state: Option<Res<State<InGameState>>>,
) -> bool {
    game_state.is_some_and(|s| *s.get() == GameState::InGame)
        && in_game_state.is_some_and(|s| *s.get() == InGameState::Playing)
}

/// Root plugin: game states, set ordering and all gameplay plugins.
pub fn plugin(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Spawn,
            GameSet::Ai,
            GameSet::Squads,
            GameSet::Combat,
            GameSet::Death,
            GameSet::Presentation,
        )
            .chain(),
    );

    app.add_plugins((screens::plugin, gameplay::plugin));

    #[cfg(feature = "dev")]
    app.add_plugins(dev_tools::plugin);
}
