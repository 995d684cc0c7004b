//! The player: spawn, keyboard movement, and the Scout mark debuff.

use std::time::Duration;

use bevy::prelude::*;

use crate::gameplay::{Body, Health, WorldBounds};
use crate::screens::GameState;
use crate::{GameSet, gameplay_running};

// === Constants ===

pub const PLAYER_SIZE: f32 = 24.0;
pub const PLAYER_HEALTH: f32 = 100.0;
/// Units per second.
pub const PLAYER_SPEED: f32 = 220.0;
/// Extra damage taken while marked.
pub const MARK_DAMAGE_MULTIPLIER: f32 = 1.25;

// === Components ===

#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Player {
    /// Virtual time at which the current mark wears off.
    pub marked_until: Option<Duration>,
}

impl Player {
    #[must_use]
    pub fn is_marked(&self, now: Duration) -> bool {
        self.marked_until.is_some_and(|until| now < until)
    }

    #[must_use]
    pub fn damage_taken_multiplier(&self, now: Duration) -> f32 {
        if self.is_marked(now) {
            MARK_DAMAGE_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Extends the mark. A shorter mark never cuts an existing one short.
    pub fn mark_until(&mut self, until: Duration) {
        self.marked_until = Some(self.marked_until.map_or(until, |current| current.max(until)));
    }
}

// === Pure Functions ===

/// Unit direction from the pressed movement keys, or zero.
#[must_use]
pub fn movement_input(keyboard: &ButtonInput<KeyCode>) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if keyboard.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        direction.y -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        direction.y += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        direction.x -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        direction.x += 1.0;
    }
    direction.normalize_or_zero()
}

// === Systems ===

fn spawn_player(mut commands: Commands, bounds: Res<WorldBounds>) {
    commands.spawn((
        Name::new("Player"),
        Player::default(),
        Body::from_center(bounds.center(), Vec2::splat(PLAYER_SIZE)),
        Health::new(PLAYER_HEALTH),
        DespawnOnExit(GameState::InGame),
    ));
}

fn move_player(
    time: Res<Time>,
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    bounds: Res<WorldBounds>,
    mut players: Query<&mut Body, With<Player>>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    let direction = movement_input(&keyboard);
    if direction == Vec2::ZERO {
        return;
    }
    let step = direction * PLAYER_SPEED * time.delta_secs();
    for mut body in &mut players {
        body.position += step;
        bounds.clamp_body(&mut body);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Player>();

    app.add_systems(OnEnter(GameState::InGame), spawn_player);

    app.add_systems(
        Update,
        move_player.in_set(GameSet::Input).run_if(gameplay_running),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unmarked_player_takes_normal_damage() {
        let player = Player::default();
        assert_eq!(player.damage_taken_multiplier(Duration::ZERO), 1.0);
    }

    #[test]
    fn mark_expires() {
        let mut player = Player::default();
        player.mark_until(Duration::from_secs(3));
        assert_eq!(
            player.damage_taken_multiplier(Duration::from_secs(2)),
            MARK_DAMAGE_MULTIPLIER
        );
        assert_eq!(player.damage_taken_multiplier(Duration::from_secs(3)), 1.0);
    }

    #[test]
    fn shorter_mark_does_not_shorten_existing_one() {
        let mut player = Player::default();
        player.mark_until(Duration::from_secs(5));
        player.mark_until(Duration::from_secs(4));
        assert_eq!(player.marked_until, Some(Duration::from_secs(5)));
    }

    #[test]
    fn diagonal_input_is_normalised() {
        let mut keyboard = ButtonInput::<KeyCode>::default();
        keyboard.press(KeyCode::KeyW);
        keyboard.press(KeyCode::ArrowRight);
        let direction = movement_input(&keyboard);
        assert!((direction.length() - 1.0).abs() < 1e-5);
        assert!(direction.x > 0.0 && direction.y < 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut keyboard = ButtonInput::<KeyCode>::default();
        keyboard.press(KeyCode::KeyA);
        keyboard.press(KeyCode::KeyD);
        assert_eq!(movement_input(&keyboard), Vec2::ZERO);
    }
}
