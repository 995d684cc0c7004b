//! Generic finite state machine with a global pre-emptive state.
//!
//! States are plain `Copy` values. Everything an individual owner needs to
//! remember while in a state lives on the owner, so one state value can be
//! shared by any number of machines.

use std::fmt::Debug;

use bevy::prelude::*;

/// Verdict returned by a state hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Remain in the current state.
    Stay,
    /// Switch to another state.
    To(S),
    /// Terminate the machine. The owner is done and its systems remove it.
    Stop,
}

/// Display name of a state, independent of the owner it drives.
pub trait StateName {
    fn name(&self) -> &'static str;
}

/// One unit of behaviour for an owner `O` evaluated against a context `C`.
pub trait State<O: ?Sized, C: ?Sized>: StateName + Copy + PartialEq + Debug {
    /// Called after the machine switched to this state.
    ///
    /// Any transition returned here arrives while the switch is still in
    /// progress and is dropped with a warning.
    fn enter(&self, _owner: &mut O, _ctx: &mut C, _previous: Option<Self>) -> Transition<Self> {
        Transition::Stay
    }

    /// Called before the machine leaves this state. `next` is `None` on stop.
    ///
    /// Returned transitions are dropped like those from [`State::enter`].
    fn exit(&self, _owner: &mut O, _ctx: &mut C, _next: Option<Self>) -> Transition<Self> {
        Transition::Stay
    }

    fn update(&self, owner: &mut O, ctx: &mut C) -> Transition<Self>;
}

/// Current, previous and global state of a single owner.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMachine<S> {
    current: Option<S>,
    previous: Option<S>,
    global: Option<S>,
}

impl<S: Copy + PartialEq + Debug> StateMachine<S> {
    /// Starts in `initial`. Its `enter` hook is not called.
    #[must_use]
    pub const fn new(initial: S) -> Self {
        Self {
            current: Some(initial),
            previous: None,
            global: None,
        }
    }

    /// Installs a global state consulted before the current state every update.
    #[must_use]
    pub fn with_global(mut self, global: S) -> Self {
        self.global = Some(global);
        self
    }

    #[must_use]
    pub const fn current(&self) -> Option<S> {
        self.current
    }

    #[must_use]
    pub const fn previous(&self) -> Option<S> {
        self.previous
    }

    #[must_use]
    pub const fn global(&self) -> Option<S> {
        self.global
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.current.is_none()
    }

    /// Runs one tick.
    ///
    /// The global state goes first and pre-empts the current state whenever it
    /// requests a transition or a stop.
    pub fn update<O: ?Sized, C: ?Sized>(&mut self, owner: &mut O, ctx: &mut C)
    where
        S: State<O, C>,
    {
        let Some(current) = self.current else {
            return;
        };

        if let Some(global) = self.global {
            match global.update(owner, ctx) {
                Transition::Stay => {}
                Transition::To(next) => {
                    self.change_state(next, owner, ctx);
                    return;
                }
                Transition::Stop => {
                    self.stop(owner, ctx);
                    return;
                }
            }
        }

        match current.update(owner, ctx) {
            Transition::Stay => {}
            Transition::To(next) => {
                self.change_state(next, owner, ctx);
            }
            Transition::Stop => self.stop(owner, ctx),
        }
    }

    /// Switches to `next`: `exit` on the old state, then `enter` on the new one.
    ///
    /// Returns `false` when `next` is already current.
    pub fn change_state<O: ?Sized, C: ?Sized>(&mut self, next: S, owner: &mut O, ctx: &mut C) -> bool
    where
        S: State<O, C>,
    {
        if self.current == Some(next) {
            return false;
        }

        let old = self.current;
        if let Some(old_state) = old {
            let request = old_state.exit(owner, ctx, Some(next));
            drop_hook_request(old_state, "exit", request);
            self.previous = Some(old_state);
        }

        self.current = Some(next);
        let request = next.enter(owner, ctx, old);
        drop_hook_request(next, "enter", request);
        true
    }

    /// Switches back to the previous state. Warns and does nothing if there is none.
    pub fn revert_to_previous_state<O: ?Sized, C: ?Sized>(&mut self, owner: &mut O, ctx: &mut C) -> bool
    where
        S: State<O, C>,
    {
        let Some(previous) = self.previous else {
            warn!("revert_to_previous_state called with no previous state");
            return false;
        };
        self.change_state(previous, owner, ctx)
    }

    /// Exits the current state and leaves the machine without one.
    pub fn stop<O: ?Sized, C: ?Sized>(&mut self, owner: &mut O, ctx: &mut C)
    where
        S: State<O, C>,
    {
        let Some(old) = self.current.take() else {
            return;
        };
        let request = old.exit(owner, ctx, None);
        drop_hook_request(old, "exit", request);
        self.previous = Some(old);
    }
}

impl<S: StateName> StateMachine<S> {
    /// Name of the current state, or `"Stopped"`.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.current.as_ref().map_or("Stopped", StateName::name)
    }
}

fn drop_hook_request<S: Debug>(state: S, hook: &str, request: Transition<S>) {
    if !matches!(request, Transition::Stay) {
        warn!("{state:?}::{hook} requested {request:?} during a transition; dropped");
    }
}
