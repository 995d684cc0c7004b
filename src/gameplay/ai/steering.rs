//! Movement primitives shared by states, policies and squads.
//!
//! Every normalisation falls back to a random unit vector on zero length so a
//! degenerate direction can never write NaN into a position.

use std::f32::consts::TAU;
use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use crate::gameplay::Body;

/// Uniformly random direction.
pub fn random_unit(rng: &mut impl Rng) -> Vec2 {
    Vec2::from_angle(rng.random_range(0.0..TAU))
}

/// Unit vector from `from` to `to`, or a random one when they coincide.
pub fn direction_or_random(from: Vec2, to: Vec2, rng: &mut impl Rng) -> Vec2 {
    (to - from)
        .try_normalize()
        .unwrap_or_else(|| random_unit(rng))
}

/// Moves the body's centre along `direction` at `speed` units per second.
pub fn step_along(body: &mut Body, direction: Vec2, speed: f32, delta: Duration) {
    let Some(direction) = direction.try_normalize() else {
        return;
    };
    let center = body.center() + direction * speed * delta.as_secs_f32();
    body.set_center(center);
}

/// Moves the body's centre toward `destination` without overshooting it.
pub fn step_toward(body: &mut Body, destination: Vec2, speed: f32, delta: Duration) {
    let offset = destination - body.center();
    let max_step = speed * delta.as_secs_f32();
    let distance = offset.length();
    if distance <= max_step {
        body.set_center(destination);
        return;
    }
    step_along(body, offset, speed, delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn body_at(center: Vec2) -> Body {
        Body::from_center(center, Vec2::splat(10.0))
    }

    #[test]
    fn zero_length_direction_falls_back_to_unit_vector() {
        let mut rng = StdRng::seed_from_u64(1);
        let dir = direction_or_random(Vec2::ONE, Vec2::ONE, &mut rng);
        assert!(dir.is_finite());
        assert!((dir.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn step_toward_does_not_overshoot() {
        let mut body = body_at(Vec2::ZERO);
        step_toward(&mut body, Vec2::new(5.0, 0.0), 100.0, Duration::from_secs(1));
        assert_eq!(body.center(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn step_toward_moves_by_speed_times_delta() {
        let mut body = body_at(Vec2::ZERO);
        step_toward(&mut body, Vec2::new(100.0, 0.0), 50.0, Duration::from_millis(200));
        assert!((body.center().x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn step_along_zero_direction_keeps_position() {
        let mut body = body_at(Vec2::new(3.0, 4.0));
        step_along(&mut body, Vec2::ZERO, 100.0, Duration::from_secs(1));
        assert_eq!(body.center(), Vec2::new(3.0, 4.0));
    }
}
