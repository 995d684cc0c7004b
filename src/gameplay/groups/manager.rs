//! Squad lifecycle: spawn-time assignment, proximity merges and death teardown.

use std::time::Duration;

use bevy::ecs::entity::EntityHashMap;
use bevy::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::formation::MemberSnapshot;
use super::group::EnemyGroup;
use super::{FormationType, GroupConfig, GroupId, GroupType, Role};

/// Result of one merge: every member of `absorbed` now belongs to `survivor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMerge {
    pub survivor: GroupId,
    pub absorbed: GroupId,
    pub moved: usize,
}

/// Owns every enemy squad.
#[derive(Resource, Debug, Default)]
pub struct EnemyGroupManager {
    groups: Vec<EnemyGroup>,
    next_id: u32,
}

impl EnemyGroupManager {
    #[must_use]
    pub fn groups(&self) -> &[EnemyGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&EnemyGroup> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut EnemyGroup> {
        self.groups.iter_mut().find(|g| g.id() == id)
    }

    /// The active group `entity` belongs to, if any.
    #[must_use]
    pub fn group_of(&self, entity: Entity) -> Option<&EnemyGroup> {
        self.groups
            .iter()
            .find(|g| g.is_active() && g.contains(entity))
    }

    /// Registers a new, empty group and returns its id.
    pub fn create_group(&mut self, group_type: GroupType, formation_type: FormationType) -> GroupId {
        let id = GroupId(self.next_id);
        self.next_id += 1;
        self.groups.push(EnemyGroup::new(id, group_type, formation_type));
        debug!("Created squad {id:?}: {group_type:?} / {formation_type:?}");
        id
    }

    /// Places a freshly spawned enemy.
    ///
    /// Joins the nearest eligible squad; failing that, founds a new one with
    /// probability `new_group_chance`. Returns the group it ended up in.
    pub fn on_enemy_spawned(
        &mut self,
        entity: Entity,
        center: Vec2,
        now: Duration,
        config: &GroupConfig,
        snapshots: &EntityHashMap<MemberSnapshot>,
        rng: &mut impl Rng,
    ) -> Option<GroupId> {
        if let Some(existing) = self.group_of(entity) {
            return Some(existing.id());
        }
        if let Some(id) = self.add_to_existing_group(entity, center, now, config, snapshots) {
            return Some(id);
        }
        if !rng.random_bool(f64::from(config.new_group_chance.clamp(0.0, 1.0))) {
            return None;
        }

        let group_type = GroupType::ALL.choose(rng).copied().unwrap_or(GroupType::Standard);
        let formation_type = group_type.matched_formation(rng);
        let id = self.create_group(group_type, formation_type);
        if let Some(group) = self.group_mut(id) {
            group.add_member(entity, Role::Attacker, now);
        }
        Some(id)
    }

    /// Adds `entity` to the closest active, non-full group whose nearest member
    /// is within `formation_distance` of `center`.
    pub fn add_to_existing_group(
        &mut self,
        entity: Entity,
        center: Vec2,
        now: Duration,
        config: &GroupConfig,
        snapshots: &EntityHashMap<MemberSnapshot>,
    ) -> Option<GroupId> {
        let closest = self
            .groups
            .iter()
            .filter(|g| g.is_active() && g.len() < config.max_group_size)
            .filter_map(|g| g.distance_to_point(center, snapshots).map(|d| (g.id(), d)))
            .filter(|(_, distance)| *distance <= config.formation_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)?;

        let group = self.group_mut(closest)?;
        group.add_member(entity, Role::Attacker, now);
        Some(closest)
    }

    /// Removes a dead enemy from its squad, discarding the squad if it emptied.
    pub fn on_enemy_died(&mut self, entity: Entity) -> Option<GroupId> {
        let group = self.groups.iter_mut().find(|g| g.contains(entity))?;
        let id = group.id();
        group.remove_member(entity);
        if !group.is_active() {
            debug!("Squad {id:?} disbanded");
        }
        self.discard_inactive();
        Some(id)
    }

    /// Advances every active group, then merges neighbours and drops inactive groups.
    pub fn update(
        &mut self,
        delta: Duration,
        player: Vec2,
        config: &GroupConfig,
        snapshots: &EntityHashMap<MemberSnapshot>,
        rng: &mut impl Rng,
    ) -> Vec<GroupMerge> {
        for group in self.groups.iter_mut().filter(|g| g.is_active()) {
            group.update(delta, config.recompute_interval, player, snapshots, rng);
        }
        let merges = self.check_for_group_merges(config, snapshots);
        self.discard_inactive();
        merges
    }

    /// Pairwise scan: a later group is absorbed into an earlier one when the
    /// combined size fits and some pair of members is within formation distance.
    ///
    /// Each outer group takes at most one merge per call. Absorbed groups are
    /// left empty and inactive until [`Self::discard_inactive`].
    pub fn check_for_group_merges(
        &mut self,
        config: &GroupConfig,
        snapshots: &EntityHashMap<MemberSnapshot>,
    ) -> Vec<GroupMerge> {
        let mut merges = Vec::new();
        for i in 0..self.groups.len() {
            for j in (i + 1)..self.groups.len() {
                let (head, tail) = self.groups.split_at_mut(j);
                let (survivor, absorbed) = (&mut head[i], &mut tail[0]);
                if !survivor.is_active() || !absorbed.is_active() {
                    continue;
                }
                if survivor.len() + absorbed.len() > config.max_group_size {
                    continue;
                }
                let close = survivor
                    .distance_to_group(absorbed, snapshots)
                    .is_some_and(|d| d <= config.formation_distance);
                if !close {
                    continue;
                }

                let moved = absorbed.drain_members();
                let merge = GroupMerge {
                    survivor: survivor.id(),
                    absorbed: absorbed.id(),
                    moved: moved.len(),
                };
                for member in moved {
                    survivor.absorb_member(member);
                }
                debug!("Merged squad {:?} into {:?}", merge.absorbed, merge.survivor);
                merges.push(merge);
                break;
            }
        }
        merges
    }

    pub fn discard_inactive(&mut self) {
        self.groups.retain(EnemyGroup::is_active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_entities;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn snapshots(points: &[(Entity, f32, f32)]) -> EntityHashMap<MemberSnapshot> {
        points
            .iter()
            .map(|&(entity, x, y)| {
                (
                    entity,
                    MemberSnapshot {
                        center: Vec2::new(x, y),
                        specialized: false,
                    },
                )
            })
            .collect()
    }

    fn always_group() -> GroupConfig {
        GroupConfig {
            new_group_chance: 1.0,
            ..default()
        }
    }

    fn never_group() -> GroupConfig {
        GroupConfig {
            new_group_chance: 0.0,
            ..default()
        }
    }

    fn group_with(manager: &mut EnemyGroupManager, members: &[Entity]) -> GroupId {
        let id = manager.create_group(GroupType::Standard, FormationType::None);
        if let Some(group) = manager.group_mut(id) {
            for (i, &member) in members.iter().enumerate() {
                group.add_member(member, Role::Attacker, Duration::from_secs(i as u64));
            }
        }
        id
    }

    #[test]
    fn founded_groups_use_their_archetype_formation() {
        let ids = test_entities(30);
        let mut manager = EnemyGroupManager::default();
        let mut rng = StdRng::seed_from_u64(5);

        for (i, &entity) in ids.iter().enumerate() {
            let center = Vec2::new(i as f32 * 1000.0, 0.0);
            manager.on_enemy_spawned(
                entity,
                center,
                Duration::ZERO,
                &always_group(),
                &EntityHashMap::default(),
                &mut rng,
            );
        }

        assert_eq!(manager.groups().len(), ids.len());
        for group in manager.groups() {
            let expected = match group.group_type() {
                GroupType::Surround => FormationType::Orbital,
                GroupType::Protect => FormationType::Phalanx,
                GroupType::Distract => FormationType::Pincer,
                GroupType::Drain => FormationType::Swarm,
                GroupType::Standard => continue,
            };
            assert_eq!(group.formation_type(), expected, "{:?}", group.id());
        }
    }

    #[test]
    fn spawn_far_from_groups_founds_new_group() {
        let ids = test_entities(1);
        let mut manager = EnemyGroupManager::default();
        let mut rng = StdRng::seed_from_u64(1);

        let id = manager.on_enemy_spawned(
            ids[0],
            Vec2::ZERO,
            Duration::ZERO,
            &always_group(),
            &EntityHashMap::default(),
            &mut rng,
        );

        let group = id.and_then(|id| manager.group(id));
        assert_eq!(group.map(EnemyGroup::leader), Some(Some(ids[0])));
    }

    #[test]
    fn spawn_may_stay_ungrouped() {
        let ids = test_entities(1);
        let mut manager = EnemyGroupManager::default();
        let mut rng = StdRng::seed_from_u64(1);

        let id = manager.on_enemy_spawned(
            ids[0],
            Vec2::ZERO,
            Duration::ZERO,
            &never_group(),
            &EntityHashMap::default(),
            &mut rng,
        );

        assert_eq!(id, None);
        assert!(manager.groups().is_empty());
    }

    #[test]
    fn spawn_joins_closest_group_in_range() {
        let ids = test_entities(3);
        let mut manager = EnemyGroupManager::default();
        let far = group_with(&mut manager, &[ids[0]]);
        let near = group_with(&mut manager, &[ids[1]]);
        let snaps = snapshots(&[(ids[0], 0.0, 0.0), (ids[1], 300.0, 0.0)]);
        let mut rng = StdRng::seed_from_u64(1);

        let joined = manager.on_enemy_spawned(
            ids[2],
            Vec2::new(220.0, 0.0),
            Duration::from_secs(5),
            &never_group(),
            &snaps,
            &mut rng,
        );

        assert_eq!(joined, Some(near));
        assert_eq!(manager.group(far).map(EnemyGroup::len), Some(1));
        assert_eq!(manager.group(near).map(EnemyGroup::len), Some(2));
    }

    #[test]
    fn full_group_is_skipped() {
        let ids = test_entities(9);
        let mut manager = EnemyGroupManager::default();
        let full = group_with(&mut manager, &ids[..8]);
        let snaps = snapshots(&[(ids[0], 0.0, 0.0)]);

        let joined =
            manager.add_to_existing_group(ids[8], Vec2::ZERO, Duration::ZERO, &GroupConfig::default(), &snaps);

        assert_eq!(joined, None);
        assert_eq!(manager.group(full).map(EnemyGroup::len), Some(8));
    }

    #[test]
    fn nearby_groups_merge_into_earlier_group() {
        let ids = test_entities(5);
        let mut manager = EnemyGroupManager::default();
        let first = group_with(&mut manager, &ids[..3]);
        let second = group_with(&mut manager, &ids[3..]);
        let snaps = snapshots(&[
            (ids[0], 0.0, 0.0),
            (ids[1], 10.0, 0.0),
            (ids[2], 20.0, 0.0),
            (ids[3], 150.0, 0.0),
            (ids[4], 900.0, 0.0),
        ]);

        let merges = manager.check_for_group_merges(&GroupConfig::default(), &snaps);

        assert_eq!(
            merges,
            vec![GroupMerge {
                survivor: first,
                absorbed: second,
                moved: 2,
            }]
        );
        assert_eq!(manager.group(second).map(EnemyGroup::is_active), Some(false));
        manager.discard_inactive();
        assert_eq!(manager.groups().len(), 1);
        assert_eq!(manager.group(first).map(EnemyGroup::len), Some(5));
    }

    #[test]
    fn absorbed_leader_becomes_attacker() {
        let ids = test_entities(2);
        let mut manager = EnemyGroupManager::default();
        let first = group_with(&mut manager, &[ids[0]]);
        group_with(&mut manager, &[ids[1]]);
        let snaps = snapshots(&[(ids[0], 0.0, 0.0), (ids[1], 50.0, 0.0)]);

        manager.check_for_group_merges(&GroupConfig::default(), &snaps);

        let group = manager.group(first);
        assert_eq!(group.and_then(EnemyGroup::leader), Some(ids[0]));
        assert_eq!(
            group.and_then(|g| g.member(ids[1])).map(|m| m.role),
            Some(Role::Attacker)
        );
    }

    #[test]
    fn merge_respects_size_cap() {
        let ids = test_entities(9);
        let mut manager = EnemyGroupManager::default();
        group_with(&mut manager, &ids[..5]);
        group_with(&mut manager, &ids[5..]);
        let points: Vec<_> = ids.iter().map(|&id| (id, 0.0, 0.0)).collect();

        let merges = manager.check_for_group_merges(&GroupConfig::default(), &snapshots(&points));

        assert!(merges.is_empty());
        assert_eq!(manager.groups().len(), 2);
    }

    #[test]
    fn distant_groups_do_not_merge() {
        let ids = test_entities(2);
        let mut manager = EnemyGroupManager::default();
        group_with(&mut manager, &[ids[0]]);
        group_with(&mut manager, &[ids[1]]);
        let snaps = snapshots(&[(ids[0], 0.0, 0.0), (ids[1], 201.0, 0.0)]);

        assert!(manager.check_for_group_merges(&GroupConfig::default(), &snaps).is_empty());
    }

    #[test]
    fn one_merge_per_outer_group_per_pass() {
        let ids = test_entities(3);
        let mut manager = EnemyGroupManager::default();
        let first = group_with(&mut manager, &[ids[0]]);
        group_with(&mut manager, &[ids[1]]);
        group_with(&mut manager, &[ids[2]]);
        let snaps = snapshots(&[(ids[0], 0.0, 0.0), (ids[1], 10.0, 0.0), (ids[2], 20.0, 0.0)]);

        let merges = manager.check_for_group_merges(&GroupConfig::default(), &snaps);

        // Group 0 absorbs group 1 and stops scanning; group 2 waits for the next pass.
        assert_eq!(merges.len(), 1);
        assert_eq!(manager.group(first).map(EnemyGroup::len), Some(2));
    }

    #[test]
    fn death_removes_member_and_discards_empty_group() {
        let ids = test_entities(2);
        let mut manager = EnemyGroupManager::default();
        let id = group_with(&mut manager, &ids);

        assert_eq!(manager.on_enemy_died(ids[0]), Some(id));
        assert_eq!(manager.group_of(ids[1]).map(EnemyGroup::id), Some(id));
        assert_eq!(manager.group_of(ids[1]).and_then(EnemyGroup::leader), Some(ids[1]));

        manager.on_enemy_died(ids[1]);
        assert!(manager.groups().is_empty());
        assert_eq!(manager.on_enemy_died(ids[1]), None);
    }

    #[test]
    fn every_member_appears_in_exactly_one_group() {
        let ids = test_entities(12);
        let mut manager = EnemyGroupManager::default();
        let mut rng = StdRng::seed_from_u64(42);
        let points: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, (i % 4) as f32 * 120.0, (i / 4) as f32 * 90.0))
            .collect();
        let snaps = snapshots(&points);

        for &(id, x, y) in &points {
            manager.on_enemy_spawned(id, Vec2::new(x, y), Duration::ZERO, &always_group(), &snaps, &mut rng);
        }
        manager.update(
            Duration::from_secs(1),
            Vec2::new(1000.0, 1000.0),
            &GroupConfig::default(),
            &snaps,
            &mut rng,
        );

        for &id in &ids {
            let owners = manager.groups().iter().filter(|g| g.contains(id)).count();
            assert!(owners <= 1, "{id:?} belongs to {owners} groups");
        }
        for group in manager.groups() {
            let leaders = group.members().iter().filter(|m| m.role == Role::Leader).count();
            assert_eq!(leaders, 1);
            assert!(group.len() <= GroupConfig::default().max_group_size);
        }
    }
}
