//! Flat-colour sprites driven by gameplay state.

use bevy::color::{Alpha, Luminance};
use bevy::ecs::entity::EntityHashMap;
use bevy::prelude::*;

use crate::gameplay::ai::AiEffect;
use crate::gameplay::enemies::Enemy;
use crate::gameplay::groups::{FormationBonus, Role, Squad};
use crate::gameplay::player::Player;
use crate::gameplay::{Body, WorldBounds};
use crate::{GameSet, Z_UNIT, gameplay_running};

// === Constants ===

const PLAYER_COLOR: Color = Color::srgb(0.2, 0.8, 0.2);
const LEADER_LIGHTEN: f32 = 0.2;
const SHIELDED_DARKEN: f32 = 0.1;
/// Alpha of a sacrificing enemy at the end of its channel.
const DRAINED_ALPHA: f32 = 0.3;

// === Systems ===

fn attach_enemy_sprites(
    mut commands: Commands,
    bounds: Res<WorldBounds>,
    enemies: Query<(Entity, &Enemy, &Body), Added<Enemy>>,
) {
    for (entity, enemy, body) in &enemies {
        commands.entity(entity).insert((
            Sprite::from_color(enemy.kind.color(), body.size),
            Transform::from_translation(bounds.to_world(body.center()).extend(Z_UNIT)),
        ));
    }
}

fn attach_player_sprite(
    mut commands: Commands,
    bounds: Res<WorldBounds>,
    players: Query<(Entity, &Body), Added<Player>>,
) {
    for (entity, body) in &players {
        commands.entity(entity).insert((
            Sprite::from_color(PLAYER_COLOR, body.size),
            Transform::from_translation(bounds.to_world(body.center()).extend(Z_UNIT + 1.0)),
        ));
    }
}

fn sync_transforms(bounds: Res<WorldBounds>, mut bodies: Query<(&Body, &mut Transform)>) {
    for (body, mut transform) in &mut bodies {
        let world = bounds.to_world(body.center());
        transform.translation.x = world.x;
        transform.translation.y = world.y;
    }
}

/// Sprite colour for an enemy given its squad and sacrifice progress.
#[must_use]
pub fn enemy_tint(base: Color, squad: Option<&Squad>, channel: Option<f32>) -> Color {
    let mut color = base;
    if let Some(squad) = squad {
        if squad.role == Role::Leader {
            color = color.lighter(LEADER_LIGHTEN);
        }
        if squad.bonus == FormationBonus::Shielded {
            color = color.darker(SHIELDED_DARKEN);
        }
    }
    if let Some(progress) = channel {
        let progress = progress.clamp(0.0, 1.0);
        color = color.with_alpha(1.0 - (1.0 - DRAINED_ALPHA) * progress);
    }
    color
}

fn tint_enemies(
    mut effects: MessageReader<AiEffect>,
    mut enemies: Query<(Entity, &Enemy, Option<&Squad>, &mut Sprite)>,
) {
    let channels: EntityHashMap<f32> = effects
        .read()
        .filter_map(|effect| match *effect {
            AiEffect::EnergyTransfer {
                source, progress, ..
            } => Some((source, progress)),
            _ => None,
        })
        .collect();

    for (entity, enemy, squad, mut sprite) in &mut enemies {
        let tint = enemy_tint(enemy.kind.color(), squad, channels.get(&entity).copied());
        if sprite.color != tint {
            sprite.color = tint;
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            (attach_enemy_sprites, attach_player_sprite),
            sync_transforms,
            tint_enemies,
        )
            .chain()
            .in_set(GameSet::Presentation)
            .run_if(gameplay_running),
    );
}
