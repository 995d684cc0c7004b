//! Behaviour policies for each enemy kind.

use std::time::Duration;

use crate::gameplay::ai::steering::{direction_or_random, step_along, step_toward};
use crate::gameplay::ai::{
    Agent, AiContext, AiEffect, AiTuning, BehaviorPolicy, DamageKind, EnemyState, TargetSnapshot,
    Transition, cooldown_ready, melee_reach, pursue_target,
};

// === Constants ===

/// Hunter opens fire from this far away.
pub const HUNTER_RANGE: f32 = 250.0;
/// Hunter backs off when the target is closer than this.
pub const HUNTER_COMFORT_DISTANCE: f32 = 140.0;

pub const BRUTE_SLAM_COOLDOWN: Duration = Duration::from_secs(5);
pub const BRUTE_SLAM_MULTIPLIER: f32 = 2.0;

pub const PRIEST_HEAL_COOLDOWN: Duration = Duration::from_secs(3);
pub const PRIEST_HEAL_RANGE: f32 = 220.0;
/// Heal amount as a multiple of the priest's damage stat.
pub const PRIEST_HEAL_POWER: f32 = 1.5;
/// Health fraction at which a squadded priest gives itself up.
pub const PRIEST_SACRIFICE_THRESHOLD: f32 = 0.35;

pub const SCOUT_LUNGE_COOLDOWN: Duration = Duration::from_secs(4);
pub const SCOUT_LUNGE_MULTIPLIER: f32 = 1.5;
pub const SCOUT_MARK_DURATION: Duration = Duration::from_secs(3);
/// Scout starts a lunge when the target is this close.
pub const SCOUT_DASH_RANGE: f32 = 160.0;
/// Lunge speed as a multiple of the scout's speed.
pub const SCOUT_DASH_SPEED_MULTIPLIER: f32 = 3.0;
pub const SCOUT_DODGE_COOLDOWN: Duration = Duration::from_secs(2);

// === Policies ===

/// Plain melee chaser.
#[derive(Debug)]
pub struct Grunt;

pub static GRUNT_POLICY: Grunt = Grunt;

impl BehaviorPolicy for Grunt {
    fn name(&self) -> &'static str {
        "Grunt"
    }
}

/// Slow tank with a periodic heavy slam.
#[derive(Debug)]
pub struct Brute;

pub static BRUTE_POLICY: Brute = Brute;

impl BehaviorPolicy for Brute {
    fn name(&self) -> &'static str {
        "Brute"
    }

    fn special_cooldown(&self) -> Option<Duration> {
        Some(BRUTE_SLAM_COOLDOWN)
    }

    fn special_attack(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, _target: &TargetSnapshot) -> bool {
        ctx.effects.push(AiEffect::DamagePlayer {
            source: agent.entity,
            amount: agent.stats.damage * BRUTE_SLAM_MULTIPLIER,
            kind: DamageKind::Slam,
        });
        true
    }
}

/// Ranged kiter: shoots from distance and keeps the target at arm's length.
#[derive(Debug)]
pub struct Hunter;

pub static HUNTER_POLICY: Hunter = Hunter;

impl BehaviorPolicy for Hunter {
    fn name(&self) -> &'static str {
        "Hunter"
    }

    fn in_attack_range(&self, agent: &Agent<'_>, target: &TargetSnapshot, _tuning: &AiTuning) -> bool {
        agent.body.center().distance(target.center()) <= HUNTER_RANGE
    }

    fn hold(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, target: &TargetSnapshot) {
        let center = agent.body.center();
        if center.distance(target.center()) >= HUNTER_COMFORT_DISTANCE {
            return;
        }
        let away = direction_or_random(target.center(), center, ctx.rng);
        step_along(agent.body, away, agent.stats.speed, ctx.delta);
    }

    fn basic_attack(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, _target: &TargetSnapshot) {
        ctx.effects.push(AiEffect::DamagePlayer {
            source: agent.entity,
            amount: agent.stats.damage,
            kind: DamageKind::Ranged,
        });
    }
}

/// Support healer. Holds its squad slot, mends squadmates and sacrifices itself when low.
#[derive(Debug)]
pub struct Priest;

pub static PRIEST_POLICY: Priest = Priest;

impl BehaviorPolicy for Priest {
    fn name(&self) -> &'static str {
        "Priest"
    }

    fn react(&self, agent: &mut Agent<'_>, _ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
        let Some(squad) = agent.squad else {
            return Transition::Stay;
        };
        match agent.state {
            Some(EnemyState::Sacrifice) | None => Transition::Stay,
            Some(_) if agent.health.ratio() <= PRIEST_SACRIFICE_THRESHOLD => {
                Transition::To(EnemyState::Sacrifice)
            }
            Some(EnemyState::Idle | EnemyState::Pursue) if squad.formation_position.is_some() => {
                Transition::To(EnemyState::Support)
            }
            Some(_) => Transition::Stay,
        }
    }

    fn support(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) {
        if !cooldown_ready(agent.ai.last_special_at, ctx.now, PRIEST_HEAL_COOLDOWN) {
            return;
        }
        let Some(group) = agent.group() else {
            return;
        };
        let center = agent.body.center();
        let patient = ctx
            .allies
            .iter()
            .filter(|ally| {
                ally.entity != agent.entity
                    && ally.group == Some(group)
                    && !ally.health.is_depleted()
                    && ally.health.ratio() < 1.0
                    && ally.center.distance(center) <= PRIEST_HEAL_RANGE
            })
            .min_by(|a, b| a.health.ratio().total_cmp(&b.health.ratio()));
        let Some(patient) = patient else {
            return;
        };
        ctx.effects.push(AiEffect::Heal {
            target: patient.entity,
            amount: agent.stats.damage * PRIEST_HEAL_POWER,
        });
        agent.ai.last_special_at = Some(ctx.now);
    }
}

/// Fast skirmisher: lunges to mark the target and sidesteps when hit.
#[derive(Debug)]
pub struct Scout;

pub static SCOUT_POLICY: Scout = Scout;

impl BehaviorPolicy for Scout {
    fn name(&self) -> &'static str {
        "Scout"
    }

    fn react(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
        let evasive = matches!(
            agent.state,
            Some(EnemyState::Pursue | EnemyState::Attack | EnemyState::Idle)
        );
        if agent.struck
            && evasive
            && cooldown_ready(agent.ai.last_dodge_at, ctx.now, SCOUT_DODGE_COOLDOWN)
        {
            return Transition::To(EnemyState::Dodge);
        }
        Transition::Stay
    }

    /// Closes the last stretch in a burst and lunges on arrival.
    fn pursue(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, target: &TargetSnapshot) {
        let center = agent.body.center();
        let distance = center.distance(target.center());
        if distance > SCOUT_DASH_RANGE
            || !cooldown_ready(agent.ai.last_special_at, ctx.now, SCOUT_LUNGE_COOLDOWN)
        {
            pursue_target(agent, ctx, target);
            return;
        }

        // Stop just inside reach instead of on top of the target.
        let reach = melee_reach(agent, target, ctx.tuning);
        let Some(bearing) = (target.center() - center).try_normalize() else {
            return;
        };
        let destination = center + bearing * (distance - reach + 1.0).max(0.0);
        let speed = agent.stats.speed * SCOUT_DASH_SPEED_MULTIPLIER;
        step_toward(agent.body, destination, speed, ctx.delta);

        if self.in_attack_range(agent, target, ctx.tuning) {
            lunge(agent, ctx);
            agent.ai.last_special_at = Some(ctx.now);
        }
    }

    fn special_cooldown(&self) -> Option<Duration> {
        Some(SCOUT_LUNGE_COOLDOWN)
    }

    fn special_attack(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, _target: &TargetSnapshot) -> bool {
        lunge(agent, ctx);
        true
    }
}

/// Heavy hit that marks the player.
fn lunge(agent: &Agent<'_>, ctx: &mut AiContext<'_>) {
    ctx.effects.push(AiEffect::DamagePlayer {
        source: agent.entity,
        amount: agent.stats.damage * SCOUT_LUNGE_MULTIPLIER,
        kind: DamageKind::Lunge,
    });
    ctx.effects.push(AiEffect::MarkPlayer {
        source: agent.entity,
        until: ctx.now + SCOUT_MARK_DURATION,
    });
}
