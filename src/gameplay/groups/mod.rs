//! Enemy squads: roles, leaders, formations and the manager that owns them.
//!
//! The [`EnemyGroupManager`] resource is the source of truth for membership.
//! Each frame `sync_squads` mirrors it onto a [`Squad`] component so enemy AI
//! can read its role and formation slot without touching the manager.

pub mod formation;
mod group;
mod manager;

use std::time::Duration;

use bevy::ecs::entity::EntityHashMap;
use bevy::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::gameplay::enemies::{Enemy, EnemyDied, EnemySpawned, despawn_fallen_enemies};
use crate::gameplay::player::Player;
use crate::gameplay::{Body, GameRng};
use crate::screens::GameState;
use crate::{GameSet, gameplay_running};

pub use formation::MemberSnapshot;
pub use group::{EnemyGroup, GroupMember};
pub use manager::{EnemyGroupManager, GroupMerge};

// === Types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct GroupId(pub u32);

/// Tactical assignment of a squad member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum Role {
    Leader,
    Attacker,
    Defender,
    Support,
    Distractor,
    Striker,
}

/// Tactical archetype. Governs role-based positioning when no formation is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum GroupType {
    Standard,
    Surround,
    Protect,
    Distract,
    Drain,
}

impl GroupType {
    pub const ALL: &'static [Self] = &[
        Self::Standard,
        Self::Surround,
        Self::Protect,
        Self::Distract,
        Self::Drain,
    ];

    /// Formation that suits this archetype. Standard squads roll one at random.
    pub fn matched_formation(self, rng: &mut impl Rng) -> FormationType {
        match self {
            Self::Surround => FormationType::Orbital,
            Self::Protect => FormationType::Phalanx,
            Self::Distract => FormationType::Pincer,
            Self::Drain => FormationType::Swarm,
            Self::Standard => FormationType::ALL
                .choose(rng)
                .copied()
                .unwrap_or(FormationType::None),
        }
    }
}

/// Spatial arrangement of a squad around its leader and the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum FormationType {
    None,
    Phalanx,
    Pincer,
    Orbital,
    Swarm,
}

impl FormationType {
    pub const ALL: &'static [Self] = &[
        Self::None,
        Self::Phalanx,
        Self::Pincer,
        Self::Orbital,
        Self::Swarm,
    ];

    #[must_use]
    pub const fn bonus(self) -> FormationBonus {
        match self {
            Self::Phalanx => FormationBonus::Shielded,
            Self::Orbital => FormationBonus::Evasive,
            Self::None | Self::Pincer | Self::Swarm => FormationBonus::None,
        }
    }
}

/// Display tag for formations with a signature look. Has no effect on combat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect)]
pub enum FormationBonus {
    #[default]
    None,
    Shielded,
    Evasive,
}

// === Configuration ===

#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct GroupConfig {
    /// Join and merge radius, measured between the closest pair of members.
    pub formation_distance: f32,
    pub max_group_size: usize,
    /// Chance that an enemy with no squad nearby founds a new one.
    pub new_group_chance: f32,
    pub recompute_interval: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            formation_distance: 200.0,
            max_group_size: 8,
            new_group_chance: 0.7,
            recompute_interval: Duration::from_millis(500),
        }
    }
}

// === Components ===

/// An enemy's view of its squad membership, refreshed every frame.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Squad {
    pub group: GroupId,
    pub role: Role,
    pub formation_position: Option<Vec2>,
    pub bonus: FormationBonus,
}

// === Systems ===

fn member_snapshots<'a>(
    enemies: impl Iterator<Item = (Entity, &'a Body, &'a Enemy)>,
) -> EntityHashMap<MemberSnapshot> {
    enemies
        .map(|(entity, body, enemy)| {
            (
                entity,
                MemberSnapshot {
                    center: body.center(),
                    specialized: enemy.kind.is_specialized(),
                },
            )
        })
        .collect()
}

fn reset_group_manager(mut commands: Commands) {
    commands.insert_resource(EnemyGroupManager::default());
}

fn assign_spawned_enemies(
    mut spawned: MessageReader<EnemySpawned>,
    mut manager: ResMut<EnemyGroupManager>,
    config: Res<GroupConfig>,
    time: Res<Time>,
    mut rng: ResMut<GameRng>,
    enemies: Query<(Entity, &Body, &Enemy)>,
) {
    if spawned.is_empty() {
        return;
    }
    let snapshots = member_snapshots(enemies.iter());
    for event in spawned.read() {
        manager.on_enemy_spawned(
            event.entity,
            event.center,
            time.elapsed(),
            &config,
            &snapshots,
            &mut rng.0,
        );
    }
}

fn update_enemy_groups(
    mut manager: ResMut<EnemyGroupManager>,
    config: Res<GroupConfig>,
    time: Res<Time>,
    mut rng: ResMut<GameRng>,
    players: Query<&Body, (With<Player>, Without<Enemy>)>,
    enemies: Query<(Entity, &Body, &Enemy)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let snapshots = member_snapshots(enemies.iter());
    manager.update(time.delta(), player.center(), &config, &snapshots, &mut rng.0);
}

/// Mirrors manager membership onto `Squad` components.
fn sync_squads(
    mut commands: Commands,
    manager: Res<EnemyGroupManager>,
    mut enemies: Query<(Entity, Option<&mut Squad>), With<Enemy>>,
) {
    let mut desired: EntityHashMap<Squad> = EntityHashMap::default();
    for group in manager.groups().iter().filter(|g| g.is_active()) {
        for member in group.members() {
            desired.insert(
                member.entity,
                Squad {
                    group: group.id(),
                    role: member.role,
                    formation_position: member.formation_position,
                    bonus: group.formation_type().bonus(),
                },
            );
        }
    }

    for (entity, current) in &mut enemies {
        match (desired.get(&entity), current) {
            (Some(wanted), Some(mut squad)) => {
                if *squad != *wanted {
                    *squad = *wanted;
                }
            }
            (Some(wanted), None) => {
                commands.entity(entity).insert(*wanted);
            }
            (None, Some(_)) => {
                commands.entity(entity).remove::<Squad>();
            }
            (None, None) => {}
        }
    }
}

fn release_dead_enemies(mut died: MessageReader<EnemyDied>, mut manager: ResMut<EnemyGroupManager>) {
    for event in died.read() {
        manager.on_enemy_died(event.entity);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GroupConfig>()
        .register_type::<Squad>()
        .init_resource::<GroupConfig>()
        .init_resource::<EnemyGroupManager>();

    app.add_systems(OnEnter(GameState::InGame), reset_group_manager);

    app.add_systems(
        Update,
        (
            (assign_spawned_enemies, update_enemy_groups, sync_squads)
                .chain()
                .in_set(GameSet::Squads),
            release_dead_enemies
                .in_set(GameSet::Death)
                .after(despawn_fallen_enemies),
        )
            .run_if(gameplay_running),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn archetypes_map_to_their_formations() {
        let mut rng = StdRng::seed_from_u64(3);
        let cases = [
            (GroupType::Surround, FormationType::Orbital),
            (GroupType::Protect, FormationType::Phalanx),
            (GroupType::Distract, FormationType::Pincer),
            (GroupType::Drain, FormationType::Swarm),
        ];
        for (group_type, formation) in cases {
            assert_eq!(group_type.matched_formation(&mut rng), formation, "{group_type:?}");
        }
    }

    #[test]
    fn standard_rolls_every_formation() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen: Vec<FormationType> = Vec::new();
        for _ in 0..200 {
            let formation = GroupType::Standard.matched_formation(&mut rng);
            if !seen.contains(&formation) {
                seen.push(formation);
            }
        }
        assert_eq!(seen.len(), FormationType::ALL.len());
    }

    #[test]
    fn formation_bonuses() {
        assert_eq!(FormationType::Phalanx.bonus(), FormationBonus::Shielded);
        assert_eq!(FormationType::Orbital.bonus(), FormationBonus::Evasive);
        assert_eq!(FormationType::Pincer.bonus(), FormationBonus::None);
        assert_eq!(FormationType::Swarm.bonus(), FormationBonus::None);
        assert_eq!(FormationType::None.bonus(), FormationBonus::None);
    }
}
