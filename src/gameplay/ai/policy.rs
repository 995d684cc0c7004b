//! Per-variant behaviour injected into the shared enemy states.

use std::fmt::Debug;
use std::time::Duration;

use bevy::prelude::*;

use super::steering::step_toward;
use super::{Agent, AiContext, AiEffect, AiTuning, DamageKind, EnemyState, TargetSnapshot, Transition};

/// Movement and attack policy for one kind of enemy.
///
/// States decide *when* to move or attack; the policy decides *how*. Every
/// hook has a default matching a plain melee enemy.
pub trait BehaviorPolicy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Reflex check run by the global state before the current state.
    fn react(&self, _agent: &mut Agent<'_>, _ctx: &mut AiContext<'_>) -> Transition<EnemyState> {
        Transition::Stay
    }

    /// Movement while pursuing.
    fn pursue(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, target: &TargetSnapshot) {
        pursue_target(agent, ctx, target);
    }

    /// Centre distance within the sum of half-widths plus padding.
    fn in_attack_range(&self, agent: &Agent<'_>, target: &TargetSnapshot, tuning: &AiTuning) -> bool {
        agent.body.center().distance(target.center()) <= melee_reach(agent, target, tuning)
    }

    /// Movement while attacking. Melee enemies stand still.
    fn hold(&self, _agent: &mut Agent<'_>, _ctx: &mut AiContext<'_>, _target: &TargetSnapshot) {}

    fn basic_attack(&self, agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, _target: &TargetSnapshot) {
        ctx.effects.push(AiEffect::DamagePlayer {
            source: agent.entity,
            amount: agent.stats.damage,
            kind: DamageKind::Melee,
        });
    }

    /// Cooldown of the special attack, or `None` if this variant has none.
    fn special_cooldown(&self) -> Option<Duration> {
        None
    }

    /// Returns `true` if the special fired and its cooldown should restart.
    fn special_attack(&self, _agent: &mut Agent<'_>, _ctx: &mut AiContext<'_>, _target: &TargetSnapshot) -> bool {
        false
    }

    /// Action performed each tick while in the Support state.
    fn support(&self, _agent: &mut Agent<'_>, _ctx: &mut AiContext<'_>) {}
}

/// The policy an enemy was spawned with.
#[derive(Component, Debug, Clone, Copy)]
pub struct Behavior(pub &'static dyn BehaviorPolicy);

/// Head for the squad slot when there is one, otherwise straight at the target.
pub fn pursue_target(agent: &mut Agent<'_>, ctx: &mut AiContext<'_>, target: &TargetSnapshot) {
    let destination = agent.formation_position().unwrap_or_else(|| target.center());
    step_toward(agent.body, destination, agent.stats.speed, ctx.delta);
}

/// Centre distance at which a melee enemy can hit `target`.
#[must_use]
pub fn melee_reach(agent: &Agent<'_>, target: &TargetSnapshot, tuning: &AiTuning) -> f32 {
    agent.body.half_width() + target.body.half_width() + tuning.attack_range_padding
}
