//! Gameplay domain: shared components, the player, enemies, their AI and squads.

pub mod ai;
pub mod enemies;
pub mod groups;
pub mod player;
mod visuals;

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

// === Shared Components ===

/// Hit points. Damage and heals are clamped to `[0, max]`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Current health as a fraction of max, in `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Applies damage, never dropping below zero. Negative amounts are ignored.
    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    /// Heals up to `max`. Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }
}

/// Axis-aligned bounding box in arena coordinates.
///
/// The arena frame has its origin at the top-left corner with `y` growing
/// downward. `position` is the box's top-left corner.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Body {
    pub position: Vec2,
    pub size: Vec2,
}

impl Body {
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            position: center - size / 2.0,
            size,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size / 2.0
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.position = center - self.size / 2.0;
    }

    #[must_use]
    pub fn half_width(&self) -> f32 {
        self.size.x / 2.0
    }
}

/// Damage per hit and movement speed (units per second).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CombatStats {
    pub damage: f32,
    pub speed: f32,
}

impl CombatStats {
    /// Permanently scales damage and speed.
    pub fn empower(&mut self, damage_multiplier: f32, speed_multiplier: f32) {
        self.damage *= damage_multiplier;
        self.speed *= speed_multiplier;
    }
}

/// The entity this enemy is hunting. `None` until a player exists.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CurrentTarget(pub Option<Entity>);

// === Resources ===

/// Playable arena and how far outside it an entity may stray before it is removed.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct WorldBounds {
    pub size: Vec2,
    pub margin: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            size: Vec2::new(1280.0, 720.0),
            margin: 200.0,
        }
    }
}

impl WorldBounds {
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.size / 2.0
    }

    /// True once a point is further than `margin` outside the arena.
    #[must_use]
    pub fn is_outside(&self, point: Vec2) -> bool {
        point.x < -self.margin
            || point.y < -self.margin
            || point.x > self.size.x + self.margin
            || point.y > self.size.y + self.margin
    }

    /// Keeps a body fully inside the arena.
    pub fn clamp_body(&self, body: &mut Body) {
        let max = (self.size - body.size).max(Vec2::ZERO);
        body.position = body.position.clamp(Vec2::ZERO, max);
    }

    /// Converts an arena point into world translation (origin centred, `y` up).
    #[must_use]
    pub fn to_world(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x - self.size.x / 2.0, self.size.y / 2.0 - point.y)
    }
}

/// Game-wide random source. Seed it in tests for reproducible runs.
#[derive(Resource, Debug)]
pub struct GameRng(pub StdRng);

impl Default for GameRng {
    fn default() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl GameRng {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Health>()
        .register_type::<Body>()
        .register_type::<CombatStats>()
        .register_type::<CurrentTarget>()
        .register_type::<WorldBounds>()
        .init_resource::<WorldBounds>()
        .init_resource::<GameRng>();

    app.add_plugins((
        player::plugin,
        enemies::plugin,
        ai::plugin,
        groups::plugin,
        visuals::plugin,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn health_new_sets_current_to_max() {
        let health = Health::new(80.0);
        assert_eq!(health.current, 80.0);
        assert_eq!(health.max, 80.0);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut health = Health::new(10.0);
        health.take_damage(25.0);
        assert_eq!(health.current, 0.0);
        assert!(health.is_depleted());
    }

    #[test]
    fn heal_clamps_at_max_and_reports_restored_amount() {
        let mut health = Health {
            current: 70.0,
            max: 100.0,
        };
        let restored = health.heal(50.0);
        assert_eq!(health.current, 100.0);
        assert_eq!(restored, 30.0);
    }

    #[test]
    fn ratio_handles_zero_max() {
        let health = Health {
            current: 0.0,
            max: 0.0,
        };
        assert_eq!(health.ratio(), 0.0);
    }

    #[test]
    fn body_center_is_position_plus_half_size() {
        let body = Body {
            position: Vec2::new(10.0, 20.0),
            size: Vec2::new(30.0, 40.0),
        };
        assert_eq!(body.center(), Vec2::new(25.0, 40.0));
        assert_eq!(Body::from_center(body.center(), body.size), body);
    }

    #[test]
    fn empower_multiplies_stats() {
        let mut stats = CombatStats {
            damage: 10.0,
            speed: 100.0,
        };
        stats.empower(1.5, 1.2);
        assert!((stats.damage - 15.0).abs() < 1e-4);
        assert!((stats.speed - 120.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_tolerate_margin() {
        let bounds = WorldBounds {
            size: Vec2::new(100.0, 100.0),
            margin: 50.0,
        };
        assert!(!bounds.is_outside(Vec2::new(-40.0, 50.0)));
        assert!(bounds.is_outside(Vec2::new(-60.0, 50.0)));
        assert!(bounds.is_outside(Vec2::new(50.0, 151.0)));
    }

    #[test]
    fn clamp_body_keeps_it_inside() {
        let bounds = WorldBounds {
            size: Vec2::new(100.0, 100.0),
            margin: 0.0,
        };
        let mut body = Body {
            position: Vec2::new(95.0, -5.0),
            size: Vec2::new(10.0, 10.0),
        };
        bounds.clamp_body(&mut body);
        assert_eq!(body.position, Vec2::new(90.0, 0.0));
    }

    #[test]
    fn to_world_flips_y_around_arena_center() {
        let bounds = WorldBounds {
            size: Vec2::new(200.0, 100.0),
            margin: 0.0,
        };
        assert_eq!(bounds.to_world(Vec2::new(100.0, 50.0)), Vec2::ZERO);
        assert_eq!(bounds.to_world(Vec2::ZERO), Vec2::new(-100.0, 50.0));
    }
}
