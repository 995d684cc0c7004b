//! Enemy behaviour states.
//!
//! `EnemyState` values carry no data. Per-enemy data such as the dodge
//! direction or the sacrifice recipient lives in [`AiComponent::scratch`].

use bevy::prelude::*;
use rand::Rng;

use super::steering::{direction_or_random, random_unit, step_along, step_toward};
use super::{
    AiContext, AiEffect, Agent, DamageKind, State, StateName, StateScratch, Transition,
    cooldown_ready,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EnemyState {
    Idle,
    Pursue,
    Attack,
    Flee,
    Support,
    Dodge,
    Sacrifice,
    /// Global state: runs the policy's reflexes before the current state.
    Reflexes,
}

impl StateName for EnemyState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pursue => "Pursue",
            Self::Attack => "Attack",
            Self::Flee => "Flee",
            Self::Support => "Support",
            Self::Dodge => "Dodge",
            Self::Sacrifice => "Sacrifice",
            Self::Reflexes => "Reflexes",
        }
    }
}

impl<'a, 'w> State<Agent<'a>, AiContext<'w>> for EnemyState {
    fn enter(&self, agent: &mut Agent<'a>, ctx: &mut AiContext<'w>, _previous: Option<Self>) -> Transition<Self> {
        agent.ai.state_entered_at = ctx.now;
        let scratch = match self {
            Self::Dodge => enter_dodge(agent, ctx),
            Self::Sacrifice => enter_sacrifice(agent, ctx),
            _ => StateScratch::None,
        };
        agent.ai.scratch = scratch;
        Transition::Stay
    }

    fn exit(&self, agent: &mut Agent<'a>, _ctx: &mut AiContext<'w>, next: Option<Self>) -> Transition<Self> {
        // A stopped machine keeps its last scratch so the death check can read it.
        if next.is_some() {
            agent.ai.scratch = StateScratch::None;
        }
        Transition::Stay
    }

    fn update(&self, agent: &mut Agent<'a>, ctx: &mut AiContext<'w>) -> Transition<Self> {
        // Runs for the global state too, so reflexes never fire on a dead or lost enemy.
        if agent.health.is_depleted() || ctx.bounds.is_outside(agent.body.center()) {
            return Transition::Stop;
        }

        if *self == Self::Reflexes {
            let policy = agent.policy;
            return policy.react(agent, ctx);
        }

        match self {
            Self::Idle => idle(ctx),
            Self::Pursue => pursue(agent, ctx),
            Self::Attack => attack(agent, ctx),
            Self::Flee => flee(agent, ctx),
            Self::Support => support(agent, ctx),
            Self::Dodge => dodge(agent, ctx),
            Self::Sacrifice => sacrifice(agent, ctx),
            Self::Reflexes => Transition::Stay,
        }
    }
}

// === Local states ===

fn idle(ctx: &AiContext<'_>) -> Transition<EnemyState> {
    if ctx.target.is_some() {
        Transition::To(EnemyState::Pursue)
    } else {
        Transition::Stay
    }
}

fn pursue(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
    let Some(target) = ctx.target else {
        return Transition::To(EnemyState::Idle);
    };
    if agent.is_low_health() {
        return Transition::To(EnemyState::Flee);
    }
    let policy = agent.policy;
    if policy.in_attack_range(agent, &target, ctx.tuning) {
        return Transition::To(EnemyState::Attack);
    }
    policy.pursue(agent, ctx, &target);
    Transition::Stay
}

fn attack(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
    let Some(target) = ctx.target else {
        return Transition::To(EnemyState::Idle);
    };
    if agent.is_low_health() {
        return Transition::To(EnemyState::Flee);
    }
    let policy = agent.policy;
    if !policy.in_attack_range(agent, &target, ctx.tuning) {
        return Transition::To(EnemyState::Pursue);
    }

    policy.hold(agent, ctx, &target);

    if cooldown_ready(agent.ai.last_attack_at, ctx.now, ctx.tuning.attack_cooldown) {
        policy.basic_attack(agent, ctx, &target);
        agent.ai.last_attack_at = Some(ctx.now);
    }

    let special_ready = policy
        .special_cooldown()
        .is_some_and(|cooldown| cooldown_ready(agent.ai.last_special_at, ctx.now, cooldown));
    if special_ready && policy.special_attack(agent, ctx, &target) {
        agent.ai.last_special_at = Some(ctx.now);
    }

    Transition::Stay
}

fn flee(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
    if agent.time_in_state(ctx.now) >= ctx.tuning.retreat_duration {
        return Transition::To(EnemyState::Pursue);
    }
    let Some(target) = ctx.target else {
        return Transition::Stay;
    };
    let away = direction_or_random(target.center(), agent.body.center(), ctx.rng);
    let speed = agent.stats.speed * ctx.tuning.flee_speed_multiplier;
    step_along(agent.body, away, speed, ctx.delta);
    Transition::Stay
}

fn support(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
    if agent.is_low_health() {
        return Transition::To(EnemyState::Flee);
    }
    let Some(slot) = agent.formation_position() else {
        return Transition::To(EnemyState::Pursue);
    };
    step_toward(agent.body, slot, agent.stats.speed, ctx.delta);
    let policy = agent.policy;
    policy.support(agent, ctx);
    Transition::Stay
}

fn dodge(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
    if agent.time_in_state(ctx.now) >= ctx.tuning.dodge_duration {
        return Transition::To(EnemyState::Pursue);
    }
    let StateScratch::Dodge { direction } = agent.ai.scratch else {
        return Transition::To(EnemyState::Pursue);
    };
    let speed = agent.stats.speed * ctx.tuning.dodge_speed_multiplier;
    step_along(agent.body, direction, speed, ctx.delta);
    Transition::Stay
}

fn sacrifice(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
    let StateScratch::Sacrifice { target, completed } = agent.ai.scratch else {
        return Transition::To(EnemyState::Pursue);
    };
    if completed {
        return Transition::Stop;
    }

    let elapsed = agent.time_in_state(ctx.now).as_secs_f32();
    let duration = ctx.tuning.sacrifice_duration.as_secs_f32().max(f32::EPSILON);
    let progress = (elapsed / duration).min(1.0);

    if progress < 1.0 {
        if let Some(target) = target {
            ctx.effects.push(AiEffect::EnergyTransfer {
                source: agent.entity,
                target,
                progress,
            });
        }
        return Transition::Stay;
    }

    if let Some(target) = target {
        ctx.effects.push(AiEffect::Heal {
            target,
            amount: agent.health.max * ctx.tuning.sacrifice_heal_fraction,
        });
        ctx.effects.push(AiEffect::Empower {
            target,
            damage_multiplier: ctx.tuning.sacrifice_damage_multiplier,
            speed_multiplier: ctx.tuning.sacrifice_speed_multiplier,
        });
    }

    if let Some(player) = ctx.target {
        let radius = ctx.tuning.sacrifice_explosion_radius;
        let distance = agent.body.center().distance(player.center());
        if distance < radius {
            ctx.effects.push(AiEffect::DamagePlayer {
                source: agent.entity,
                amount: ctx.tuning.sacrifice_explosion_damage * (1.0 - distance / radius),
                kind: DamageKind::Explosion,
            });
        }
    }

    agent.ai.scratch = StateScratch::Sacrifice {
        target,
        completed: true,
    };
    agent.health.current = 0.0;
    Transition::Stop
}

// === Entry hooks ===

/// Sidestep perpendicular to the target bearing, picking a side at random.
fn enter_dodge(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> StateScratch {
    agent.ai.last_dodge_at = Some(ctx.now);
    let bearing = ctx
        .target
        .and_then(|target| (target.center() - agent.body.center()).try_normalize());
    let direction = match bearing {
        Some(bearing) if ctx.rng.random_bool(0.5) => bearing.perp(),
        Some(bearing) => -bearing.perp(),
        None => random_unit(ctx.rng),
    };
    StateScratch::Dodge { direction }
}

/// Picks the nearby squadmate that benefits most: healthy and close.
fn enter_sacrifice(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>) -> StateScratch {
    let radius = ctx.tuning.sacrifice_search_radius;
    let center = agent.body.center();
    let target = agent.group().and_then(|group| {
        ctx.allies
            .iter()
            .filter(|ally| {
                ally.entity != agent.entity && ally.group == Some(group) && !ally.health.is_depleted()
            })
            .filter_map(|ally| {
                let distance = ally.center.distance(center);
                (distance <= radius).then(|| (ally.entity, ally.health.ratio() - distance / radius))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(entity, _)| entity)
    });
    StateScratch::Sacrifice {
        target,
        completed: false,
    }
}
