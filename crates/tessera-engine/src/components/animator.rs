//! Per-entity animation state machine.
//!
//! Only transitions leaving the current state are evaluated. Each state keeps
//! its transitions sorted so condition-bearing edges are tried before pure
//! exit-time edges, each group by ascending exit time.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::components::animation::AnimationState;
use crate::components::parameters::{Condition, Parameters};

/// Index of a state inside its `Animator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// Directed edge between two animation states.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTransition {
    pub target: StateId,
    /// Normalized time the source state must reach before the edge may fire.
    pub exit_time: Option<f32>,
    pub conditions: Vec<Condition>,
    keys: Vec<String>,
}

impl AnimationTransition {
    /// Unconditional edge taken once the source reaches `exit_time`.
    pub fn on_exit(target: StateId, exit_time: f32) -> Self {
        Self {
            target,
            exit_time: Some(exit_time),
            conditions: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Guarded edge with no exit time; add guards with `with_condition`.
    pub fn when(target: StateId) -> Self {
        Self {
            target,
            exit_time: None,
            conditions: Vec::new(),
            keys: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        if !self.keys.contains(&condition.key) {
            self.keys.push(condition.key.clone());
        }
        self.conditions.push(condition);
        self
    }

    pub fn with_exit_time(mut self, exit_time: f32) -> Self {
        self.exit_time = Some(exit_time);
        self
    }

    pub fn is_conditional(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Parameter keys read by this transition's guard.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_satisfied(&self, source: &AnimationState, params: &Parameters) -> bool {
        if let Some(exit_time) = self.exit_time {
            if source.normalized_time < exit_time {
                return false;
            }
        }
        self.conditions.iter().all(|c| c.evaluate(params))
    }

    fn evaluation_order(a: &Self, b: &Self) -> Ordering {
        b.is_conditional()
            .cmp(&a.is_conditional())
            .then_with(|| a.exit_time.unwrap_or(0.0).total_cmp(&b.exit_time.unwrap_or(0.0)))
    }
}

/// Finite state machine over `AnimationState`s with a parameter/trigger store.
#[derive(Debug)]
pub struct Animator {
    states: Vec<AnimationState>,
    names: HashMap<String, StateId>,
    current: StateId,
    running: bool,
    pub params: Parameters,
}

impl Animator {
    /// Create an animator whose entry (and current) state is `entry`.
    pub fn new(entry: AnimationState) -> Self {
        let mut names = HashMap::new();
        names.insert(entry.name.clone(), StateId(0));
        Self {
            states: vec![entry],
            names,
            current: StateId(0),
            running: false,
            params: Parameters::new(),
        }
    }

    pub fn add_state(&mut self, state: AnimationState) -> StateId {
        let id = StateId(self.states.len());
        self.names.insert(state.name.clone(), id);
        self.states.push(state);
        id
    }

    /// Attach `transition` to `from`, keeping the state's evaluation order.
    pub fn add_transition(&mut self, from: StateId, transition: AnimationTransition) {
        if let Some(state) = self.states.get_mut(from.0) {
            state.transitions.push(transition);
            state.transitions.sort_by(AnimationTransition::evaluation_order);
        }
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    pub fn state(&self, id: StateId) -> Option<&AnimationState> {
        self.states.get(id.0)
    }

    pub fn states(&self) -> &[AnimationState] {
        &self.states
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn current_state(&self) -> &AnimationState {
        &self.states[self.current.0]
    }

    pub fn current_state_mut(&mut self) -> &mut AnimationState {
        &mut self.states[self.current.0]
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Enter the current state at `now`. The animation system calls this on
    /// the first frame an animator is seen.
    pub fn begin(&mut self, now: f32) {
        self.running = true;
        self.states[self.current.0].enter(now);
    }

    /// Force a switch to `id`, restarting it at `now`.
    pub fn play(&mut self, id: StateId, now: f32) {
        if id.0 >= self.states.len() {
            return;
        }
        self.current = id;
        self.running = true;
        self.states[id.0].enter(now);
    }

    /// Take the first satisfied transition out of the current state.
    ///
    /// Returns the new state when a transition fired. Keys read by the fired
    /// transition whose triggers have run out are reset immediately.
    pub fn check_transitions(&mut self, now: f32) -> Option<StateId> {
        let current = &self.states[self.current.0];
        let index = current
            .transitions
            .iter()
            .position(|t| t.is_satisfied(current, &self.params))?;

        let transition = &self.states[self.current.0].transitions[index];
        let target = transition.target;
        for key in &transition.keys {
            self.params.consume_expired(key);
        }

        log::trace!(
            "animator transition '{}' -> '{}'",
            self.states[self.current.0].name,
            self.states.get(target.0).map(|s| s.name.as_str()).unwrap_or("?")
        );
        self.play(target, now);
        Some(target)
    }

    pub fn check_triggers(&mut self, dt: f32) {
        self.params.check_triggers(dt);
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.params.set(key, value);
    }

    pub fn get_float(&self, key: &str) -> f32 {
        self.params.get(key)
    }

    pub fn set_trigger(&mut self, key: impl Into<String>, value: f32, reset_value: f32, duration: f32) {
        self.params.set_trigger(key, value, reset_value, duration);
    }
}
