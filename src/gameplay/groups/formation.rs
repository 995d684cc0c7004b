//! Formation geometry.
//!
//! Pure functions from member centres (join order) and the player's centre to
//! per-member target positions and, for role-based layouts, role assignments.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, TAU};

use bevy::prelude::*;
use rand::Rng;

use super::{FormationType, GroupType, Role};
use crate::gameplay::ai::steering::{direction_or_random, random_unit};

// === Constants ===

/// Lateral spacing per member on a phalanx line.
pub const PHALANX_SPACING: f32 = 40.0;
/// Maximum total phalanx width.
pub const PHALANX_MAX_WIDTH: f32 = 300.0;
/// Pincer flank angle either side of the bearing.
pub const PINCER_ANGLE: f32 = FRAC_PI_3;
pub const PINCER_BASE_DISTANCE: f32 = 100.0;
/// Extra distance for each further member of a flank.
pub const PINCER_STEP: f32 = 50.0;
pub const ORBITAL_RADIUS: f32 = 150.0;
pub const SWARM_BIAS: f32 = 50.0;
pub const SWARM_JITTER_PER_MEMBER: f32 = 20.0;
pub const SWARM_MAX_JITTER: f32 = 100.0;
pub const SURROUND_RADIUS: f32 = 150.0;
/// Distance of bodyguards in front of the squad anchor.
pub const PROTECT_GUARD_DISTANCE: f32 = 70.0;
/// Total angle of the bodyguard fan.
pub const PROTECT_FAN: f32 = FRAC_PI_2;
/// Distance of protected members behind the squad anchor.
pub const PROTECT_REAR_DISTANCE: f32 = 60.0;
pub const PROTECT_REAR_SPACING: f32 = 40.0;
pub const DISTRACT_NEAR_RADIUS: f32 = 80.0;
pub const DISTRACT_FAR_RADIUS: f32 = 220.0;
pub const DRAIN_RADIUS: f32 = 180.0;
pub const DRAIN_RADIUS_JITTER: f32 = 40.0;
pub const DRAIN_ANGLE_JITTER: f32 = 0.3;

// === Types ===

/// What the formation pass needs to know about one member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberSnapshot {
    pub center: Vec2,
    /// Ranged and support variants that a Protect squad shields.
    pub specialized: bool,
}

/// Output of one formation pass, aligned with the input members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormationPlan {
    pub positions: Vec<Option<Vec2>>,
    /// `None` keeps the member's current role.
    pub roles: Vec<Option<Role>>,
}

impl FormationPlan {
    fn positions_only(positions: Vec<Option<Vec2>>) -> Self {
        let roles = vec![None; positions.len()];
        Self { positions, roles }
    }
}

// === Dispatch ===

/// Computes target positions for every member.
///
/// `leader` indexes into `members`. Explicit formations ignore `group_type`;
/// `FormationType::None` falls back to role-based positioning.
pub fn plan(
    formation: FormationType,
    group_type: GroupType,
    members: &[MemberSnapshot],
    leader: Option<usize>,
    player: Vec2,
    rng: &mut impl Rng,
) -> FormationPlan {
    let centers: Vec<Vec2> = members.iter().map(|m| m.center).collect();
    match formation {
        FormationType::Phalanx => {
            FormationPlan::positions_only(phalanx(&centers, leader, player, rng))
        }
        FormationType::Pincer => FormationPlan::positions_only(pincer(&centers, leader, player, rng)),
        FormationType::Orbital => FormationPlan::positions_only(orbital(&centers, player)),
        FormationType::Swarm => FormationPlan::positions_only(swarm(&centers, player, rng)),
        FormationType::None => role_based(group_type, members, player, rng),
    }
}

fn centroid(centers: &[Vec2]) -> Vec2 {
    if centers.is_empty() {
        return Vec2::ZERO;
    }
    centers.iter().copied().sum::<Vec2>() / centers.len() as f32
}

fn anchor(centers: &[Vec2], leader: Option<usize>) -> Vec2 {
    leader
        .and_then(|i| centers.get(i).copied())
        .unwrap_or_else(|| centroid(centers))
}

/// Evenly spaced points on a circle, starting at `start_angle`.
fn ring(center: Vec2, radius: f32, count: usize, start_angle: f32) -> Vec<Vec2> {
    let step = TAU / count.max(1) as f32;
    (0..count)
        .map(|i| center + Vec2::from_angle(start_angle + step * i as f32) * radius)
        .collect()
}

// === Explicit formations ===

/// Line across the leader's approach. The leader keeps the centre and chases directly.
///
/// Followers alternate sides and each side spreads its share out to the
/// half-width, so the line always spans the full width around the anchor.
pub fn phalanx(centers: &[Vec2], leader: Option<usize>, player: Vec2, rng: &mut impl Rng) -> Vec<Option<Vec2>> {
    let count = centers.len();
    let anchor = anchor(centers, leader);
    let bearing = direction_or_random(anchor, player, rng);
    let across = bearing.perp();
    let half_width = (count as f32 * PHALANX_SPACING).min(PHALANX_MAX_WIDTH) / 2.0;

    let followers = (0..count).filter(|&i| Some(i) != leader).count();
    let first_side = followers.div_ceil(2);
    let second_side = followers / 2;

    let mut slot = 0;
    (0..count)
        .map(|i| {
            if Some(i) == leader {
                return None;
            }
            let rank = (slot / 2 + 1) as f32;
            let (side, per_side) = if slot % 2 == 0 {
                (1.0, first_side)
            } else {
                (-1.0, second_side)
            };
            slot += 1;
            let offset = half_width * rank / per_side.max(1) as f32;
            Some(anchor + across * offset * side)
        })
        .collect()
}

/// Splits non-leaders into two flanks by index parity: even left, odd right.
#[must_use]
pub fn pincer_flanks(count: usize, leader: Option<usize>) -> (Vec<usize>, Vec<usize>) {
    let (left, right): (Vec<(usize, usize)>, Vec<(usize, usize)>) = (0..count)
        .filter(|&i| Some(i) != leader)
        .enumerate()
        .partition(|(k, _)| k % 2 == 0);
    (
        left.into_iter().map(|(_, i)| i).collect(),
        right.into_iter().map(|(_, i)| i).collect(),
    )
}

/// Two flanks closing on the player from ±60° off the squad's bearing.
pub fn pincer(centers: &[Vec2], leader: Option<usize>, player: Vec2, rng: &mut impl Rng) -> Vec<Option<Vec2>> {
    let anchor = anchor(centers, leader);
    let back = direction_or_random(player, anchor, rng).to_angle();
    let (left, right) = pincer_flanks(centers.len(), leader);

    let mut positions = vec![None; centers.len()];
    for (flank, offset) in [(left, PINCER_ANGLE), (right, -PINCER_ANGLE)] {
        for (k, index) in flank.into_iter().enumerate() {
            let distance = PINCER_BASE_DISTANCE + PINCER_STEP * k as f32;
            positions[index] = Some(player + Vec2::from_angle(back + offset) * distance);
        }
    }
    positions
}

/// Everyone on a fixed-radius circle around the player.
#[must_use]
pub fn orbital(centers: &[Vec2], player: Vec2) -> Vec<Option<Vec2>> {
    let start = centers
        .first()
        .and_then(|c| (*c - player).try_normalize())
        .map_or(0.0, Vec2::to_angle);
    ring(player, ORBITAL_RADIUS, centers.len(), start)
        .into_iter()
        .map(Some)
        .collect()
}

/// Loose cloud drifting from the centroid toward the player.
pub fn swarm(centers: &[Vec2], player: Vec2, rng: &mut impl Rng) -> Vec<Option<Vec2>> {
    let center = centroid(centers);
    let bias = direction_or_random(center, player, rng);
    let jitter = (SWARM_JITTER_PER_MEMBER * centers.len() as f32).min(SWARM_MAX_JITTER);
    let base = center + bias * SWARM_BIAS;
    centers
        .iter()
        .map(|_| {
            let offset = random_unit(rng) * jitter * rng.random::<f32>().sqrt();
            Some(base + offset)
        })
        .collect()
}

// === Role-based positioning ===

fn role_based(
    group_type: GroupType,
    members: &[MemberSnapshot],
    player: Vec2,
    rng: &mut impl Rng,
) -> FormationPlan {
    let centers: Vec<Vec2> = members.iter().map(|m| m.center).collect();
    match group_type {
        GroupType::Standard => FormationPlan::positions_only(vec![None; members.len()]),
        GroupType::Surround => FormationPlan::positions_only(surround(&centers, player)),
        GroupType::Protect => protect(members, player, rng),
        GroupType::Distract => distract(&centers, player),
        GroupType::Drain => FormationPlan::positions_only(drain(&centers, player, rng)),
    }
}

#[must_use]
pub fn surround(centers: &[Vec2], player: Vec2) -> Vec<Option<Vec2>> {
    let start = (centroid(centers) - player)
        .try_normalize()
        .map_or(0.0, Vec2::to_angle);
    ring(player, SURROUND_RADIUS, centers.len(), start)
        .into_iter()
        .map(Some)
        .collect()
}

/// Bodyguards fan out in front of the squad, specialised members wait behind them.
pub fn protect(members: &[MemberSnapshot], player: Vec2, rng: &mut impl Rng) -> FormationPlan {
    let centers: Vec<Vec2> = members.iter().map(|m| m.center).collect();
    let anchor = centroid(&centers);
    let bearing = direction_or_random(anchor, player, rng);
    let across = bearing.perp();

    let guards: Vec<usize> = (0..members.len()).filter(|&i| !members[i].specialized).collect();
    let protected: Vec<usize> = (0..members.len()).filter(|&i| members[i].specialized).collect();

    let mut plan = FormationPlan::positions_only(vec![None; members.len()]);

    let fan_step = if guards.len() > 1 {
        PROTECT_FAN / (guards.len() - 1) as f32
    } else {
        0.0
    };
    let fan_start = if guards.len() > 1 { -PROTECT_FAN / 2.0 } else { 0.0 };
    for (j, &index) in guards.iter().enumerate() {
        let direction = Vec2::from_angle(fan_start + fan_step * j as f32).rotate(bearing);
        plan.positions[index] = Some(anchor + direction * PROTECT_GUARD_DISTANCE);
        plan.roles[index] = Some(Role::Defender);
    }

    let middle = (protected.len().max(1) - 1) as f32 / 2.0;
    for (j, &index) in protected.iter().enumerate() {
        let lateral = across * (j as f32 - middle) * PROTECT_REAR_SPACING;
        plan.positions[index] = Some(anchor - bearing * PROTECT_REAR_DISTANCE + lateral);
        plan.roles[index] = Some(Role::Support);
    }
    plan
}

/// Even members harass up close as Distractors, odd members wait far out as Strikers.
#[must_use]
pub fn distract(centers: &[Vec2], player: Vec2) -> FormationPlan {
    let start = (centroid(centers) - player)
        .try_normalize()
        .map_or(0.0, Vec2::to_angle);
    let near: Vec<usize> = (0..centers.len()).filter(|i| i % 2 == 0).collect();
    let far: Vec<usize> = (0..centers.len()).filter(|i| i % 2 == 1).collect();

    let mut plan = FormationPlan::positions_only(vec![None; centers.len()]);
    let near_ring = ring(player, DISTRACT_NEAR_RADIUS, near.len(), start);
    for (&index, position) in near.iter().zip(near_ring) {
        plan.positions[index] = Some(position);
        plan.roles[index] = Some(Role::Distractor);
    }
    let half_step = TAU / far.len().max(1) as f32 / 2.0;
    let far_ring = ring(player, DISTRACT_FAR_RADIUS, far.len(), start + half_step);
    for (&index, position) in far.iter().zip(far_ring) {
        plan.positions[index] = Some(position);
        plan.roles[index] = Some(Role::Striker);
    }
    plan
}

/// Uneven ring with jittered radius and angle.
pub fn drain(centers: &[Vec2], player: Vec2, rng: &mut impl Rng) -> Vec<Option<Vec2>> {
    let step = TAU / centers.len().max(1) as f32;
    (0..centers.len())
        .map(|i| {
            let angle = step * i as f32 + rng.random_range(-DRAIN_ANGLE_JITTER..=DRAIN_ANGLE_JITTER);
            let radius = DRAIN_RADIUS + rng.random_range(-DRAIN_RADIUS_JITTER..=DRAIN_RADIUS_JITTER);
            Some(player + Vec2::from_angle(angle) * radius)
        })
        .collect()
}
