//! A single enemy squad: membership, leadership and formation slots.

use std::time::Duration;

use bevy::ecs::entity::EntityHashMap;
use bevy::prelude::*;
use rand::Rng;

use super::formation::{self, MemberSnapshot};
use super::{FormationType, GroupId, GroupType, Role};

/// One enemy's membership record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMember {
    pub entity: Entity,
    pub role: Role,
    pub join_time: Duration,
    /// Breaks ties between members that joined on the same frame.
    pub join_seq: u64,
    pub formation_position: Option<Vec2>,
}

/// A coordinated squad.
///
/// Members are kept in join order. While the group has members exactly one of
/// them is the leader and holds `Role::Leader`; an empty group is inactive.
#[derive(Debug, Clone)]
pub struct EnemyGroup {
    id: GroupId,
    members: Vec<GroupMember>,
    leader: Option<Entity>,
    group_type: GroupType,
    formation_type: FormationType,
    active: bool,
    since_recompute: Duration,
    next_seq: u64,
}

impl EnemyGroup {
    #[must_use]
    pub const fn new(id: GroupId, group_type: GroupType, formation_type: FormationType) -> Self {
        Self {
            id,
            members: Vec::new(),
            leader: None,
            group_type,
            formation_type,
            active: true,
            since_recompute: Duration::ZERO,
            next_seq: 0,
        }
    }

    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub const fn group_type(&self) -> GroupType {
        self.group_type
    }

    #[must_use]
    pub const fn formation_type(&self) -> FormationType {
        self.formation_type
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn leader(&self) -> Option<Entity> {
        self.leader
    }

    #[must_use]
    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.member(entity).is_some()
    }

    #[must_use]
    pub fn member(&self, entity: Entity) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.entity == entity)
    }

    fn member_mut(&mut self, entity: Entity) -> Option<&mut GroupMember> {
        self.members.iter_mut().find(|m| m.entity == entity)
    }

    /// Adds `entity` with `role`. Returns `false` if it is already a member.
    ///
    /// The first member, or any member added as `Role::Leader`, becomes leader.
    pub fn add_member(&mut self, entity: Entity, role: Role, now: Duration) -> bool {
        if self.contains(entity) {
            return false;
        }
        let join_seq = self.next_seq;
        self.next_seq += 1;
        self.members.push(GroupMember {
            entity,
            role: if role == Role::Leader { Role::Attacker } else { role },
            join_time: now,
            join_seq,
            formation_position: None,
        });
        self.active = true;

        if self.leader.is_none() || role == Role::Leader {
            self.set_leader(entity);
        }
        true
    }

    /// Moves a member record over from a merged group, keeping its join time.
    /// An incoming leader is demoted to attacker.
    pub(super) fn absorb_member(&mut self, mut member: GroupMember) {
        if self.contains(member.entity) {
            return;
        }
        if member.role == Role::Leader {
            member.role = Role::Attacker;
        }
        member.join_seq = self.next_seq;
        member.formation_position = None;
        self.next_seq += 1;
        self.members.push(member);
        self.active = true;
        if self.leader.is_none() {
            self.choose_new_leader();
        }
    }

    /// Removes `entity`. A departing leader is replaced by the earliest joiner;
    /// removing the last member deactivates the group.
    pub fn remove_member(&mut self, entity: Entity) -> bool {
        let Some(index) = self.members.iter().position(|m| m.entity == entity) else {
            return false;
        };
        self.members.remove(index);

        if self.members.is_empty() {
            self.leader = None;
            self.deactivate();
        } else if self.leader == Some(entity) {
            self.leader = None;
            self.choose_new_leader();
        }
        true
    }

    /// Promotes a member to leader, demoting the previous leader to attacker.
    pub fn set_leader(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        if let Some(old) = self.leader.filter(|&old| old != entity) {
            if let Some(member) = self.member_mut(old) {
                member.role = Role::Attacker;
            }
        }
        if let Some(member) = self.member_mut(entity) {
            member.role = Role::Leader;
        }
        self.leader = Some(entity);
        true
    }

    /// Elects the member with the smallest join time, ties broken by join order.
    pub fn choose_new_leader(&mut self) {
        let earliest = self
            .members
            .iter()
            .min_by_key(|m| (m.join_time, m.join_seq))
            .map(|m| m.entity);
        match earliest {
            Some(entity) => {
                self.set_leader(entity);
            }
            None => self.leader = None,
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Takes every member out, leaving the group empty and inactive.
    pub(super) fn drain_members(&mut self) -> Vec<GroupMember> {
        self.leader = None;
        self.deactivate();
        std::mem::take(&mut self.members)
    }

    /// Advances the recompute throttle. Returns `true` if positions were recomputed.
    pub fn update(
        &mut self,
        delta: Duration,
        interval: Duration,
        player: Vec2,
        snapshots: &EntityHashMap<MemberSnapshot>,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.active {
            return false;
        }
        self.since_recompute += delta;
        if self.since_recompute < interval {
            return false;
        }
        self.since_recompute = Duration::ZERO;
        self.recompute_formation(player, snapshots, rng);
        true
    }

    /// Recomputes every member's slot (and role, for role-based layouts) now.
    ///
    /// Members without a snapshot keep their previous slot.
    pub fn recompute_formation(
        &mut self,
        player: Vec2,
        snapshots: &EntityHashMap<MemberSnapshot>,
        rng: &mut impl Rng,
    ) {
        let present: Vec<(usize, MemberSnapshot)> = self
            .members
            .iter()
            .enumerate()
            .filter_map(|(i, m)| snapshots.get(&m.entity).map(|s| (i, *s)))
            .collect();
        let inputs: Vec<MemberSnapshot> = present.iter().map(|(_, s)| *s).collect();
        let leader = present
            .iter()
            .position(|(i, _)| Some(self.members[*i].entity) == self.leader);

        let plan = formation::plan(
            self.formation_type,
            self.group_type,
            &inputs,
            leader,
            player,
            rng,
        );

        for (slot, (index, _)) in present.iter().enumerate() {
            let member = &mut self.members[*index];
            member.formation_position = plan.positions.get(slot).copied().flatten();
            let assigned = plan.roles.get(slot).copied().flatten();
            if let Some(role) = assigned.filter(|_| member.role != Role::Leader) {
                member.role = role;
            }
        }
    }

    /// Smallest distance between any member of `self` and `point`.
    #[must_use]
    pub fn distance_to_point(&self, point: Vec2, snapshots: &EntityHashMap<MemberSnapshot>) -> Option<f32> {
        self.members
            .iter()
            .filter_map(|m| snapshots.get(&m.entity))
            .map(|s| s.center.distance(point))
            .min_by(f32::total_cmp)
    }

    /// Smallest distance between any member of `self` and any member of `other`.
    #[must_use]
    pub fn distance_to_group(&self, other: &Self, snapshots: &EntityHashMap<MemberSnapshot>) -> Option<f32> {
        self.members
            .iter()
            .filter_map(|m| snapshots.get(&m.entity))
            .filter_map(|s| other.distance_to_point(s.center, snapshots))
            .min_by(f32::total_cmp)
    }
}
