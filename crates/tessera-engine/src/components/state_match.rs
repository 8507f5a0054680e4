//! Condition-matching animator.
//!
//! Instead of walking edges out of one current state, every tick evaluates
//! all candidate matches and picks one whose match states are all satisfied.
//! Conditions and match states live in arenas and are referenced by id, so a
//! condition shared by many matches is evaluated once per tick.

use std::collections::HashMap;

use crate::components::animation::AnimationState;
use crate::components::parameters::{Condition, Parameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchStateId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(pub usize);

/// A condition plus the result of its latest evaluation.
#[derive(Debug, Clone)]
pub struct MatchStateCondition {
    pub condition: Condition,
    satisfied: bool,
}

impl MatchStateCondition {
    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }
}

/// How a match state decides whether it holds.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchRule {
    /// Every listed condition holds.
    All(Vec<ConditionId>),
    /// The referenced match state does not hold.
    Not(MatchStateId),
}

#[derive(Debug, Clone)]
pub struct MatchState {
    pub name: String,
    pub rule: MatchRule,
    satisfied: bool,
}

impl MatchState {
    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }
}

/// Follow-up match reachable from the owning match once its own chain lock
/// has elapsed, regardless of the ordinary lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationChain {
    pub target: MatchId,
    pub chain_lock_time: f32,
}

/// A candidate animation selected when all of its match states hold.
#[derive(Debug, Clone)]
pub struct AnimationMatch {
    pub state: AnimationState,
    pub match_states: Vec<MatchStateId>,
    /// Normalized time this match must reach before an ordinary switch away.
    pub lock_time: f32,
    pub chains: Vec<AnimationChain>,
    /// Only reachable through a chain; skipped by the ordinary scan.
    pub chain_only: bool,
}

impl AnimationMatch {
    pub fn new(state: AnimationState) -> Self {
        Self {
            state,
            match_states: Vec::new(),
            lock_time: 0.0,
            chains: Vec::new(),
            chain_only: false,
        }
    }

    pub fn requires(mut self, match_state: MatchStateId) -> Self {
        self.match_states.push(match_state);
        self
    }

    pub fn with_lock_time(mut self, lock_time: f32) -> Self {
        self.lock_time = lock_time;
        self
    }

    pub fn with_chain(mut self, target: MatchId, chain_lock_time: f32) -> Self {
        self.chains.push(AnimationChain { target, chain_lock_time });
        self
    }

    pub fn chain_only(mut self) -> Self {
        self.chain_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }
}

#[derive(Debug)]
pub struct StateMatchAnimator {
    conditions: Vec<MatchStateCondition>,
    match_states: Vec<MatchState>,
    matches: Vec<AnimationMatch>,
    names: HashMap<String, MatchId>,
    /// Conditions referenced by some match, each listed once.
    active_conditions: Vec<ConditionId>,
    /// Referenced match states, inverse targets before their inverters.
    active_states: Vec<MatchStateId>,
    current: MatchId,
    initialized: bool,
    running: bool,
    pub params: Parameters,
}

impl Default for StateMatchAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMatchAnimator {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            match_states: Vec::new(),
            matches: Vec::new(),
            names: HashMap::new(),
            active_conditions: Vec::new(),
            active_states: Vec::new(),
            current: MatchId(0),
            initialized: false,
            running: false,
            params: Parameters::new(),
        }
    }

    /// Register a condition. Structurally equal conditions share one id.
    pub fn add_condition(&mut self, condition: Condition) -> ConditionId {
        if let Some(index) = self.conditions.iter().position(|c| c.condition == condition) {
            return ConditionId(index);
        }
        self.initialized = false;
        self.conditions.push(MatchStateCondition {
            condition,
            satisfied: false,
        });
        ConditionId(self.conditions.len() - 1)
    }

    /// Register a match state that holds when all `conditions` hold.
    pub fn add_all(&mut self, name: impl Into<String>, conditions: Vec<ConditionId>) -> MatchStateId {
        self.push_match_state(name.into(), MatchRule::All(conditions))
    }

    /// Register a match state that holds when `inverse` does not.
    pub fn add_not(&mut self, name: impl Into<String>, inverse: MatchStateId) -> MatchStateId {
        self.push_match_state(name.into(), MatchRule::Not(inverse))
    }

    fn push_match_state(&mut self, name: String, rule: MatchRule) -> MatchStateId {
        self.initialized = false;
        self.match_states.push(MatchState {
            name,
            rule,
            satisfied: false,
        });
        MatchStateId(self.match_states.len() - 1)
    }

    /// Register a candidate match. The first match added is the entry match.
    pub fn add_match(&mut self, animation_match: AnimationMatch) -> MatchId {
        self.initialized = false;
        let id = MatchId(self.matches.len());
        self.names.insert(animation_match.state.name.clone(), id);
        self.matches.push(animation_match);
        id
    }

    /// Mutable access for wiring chains after all matches exist.
    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut AnimationMatch> {
        self.initialized = false;
        self.matches.get_mut(id.0)
    }

    pub fn match_id(&self, name: &str) -> Option<MatchId> {
        self.names.get(name).copied()
    }

    pub fn get_match(&self, id: MatchId) -> Option<&AnimationMatch> {
        self.matches.get(id.0)
    }

    pub fn matches(&self) -> &[AnimationMatch] {
        &self.matches
    }

    pub fn match_state(&self, id: MatchStateId) -> Option<&MatchState> {
        self.match_states.get(id.0)
    }

    pub fn condition(&self, id: ConditionId) -> Option<&MatchStateCondition> {
        self.conditions.get(id.0)
    }

    pub fn current(&self) -> MatchId {
        self.current
    }

    pub fn current_match(&self) -> Option<&AnimationMatch> {
        self.matches.get(self.current.0)
    }

    pub fn current_state_mut(&mut self) -> Option<&mut AnimationState> {
        self.matches.get_mut(self.current.0).map(|m| &mut m.state)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of distinct conditions evaluated per tick.
    pub fn active_condition_count(&self) -> usize {
        self.active_conditions.len()
    }

    /// Build the deduplicated evaluation sets from the registered matches.
    pub fn init(&mut self) {
        let mut state_seen = vec![false; self.match_states.len()];
        let mut condition_seen = vec![false; self.conditions.len()];
        self.active_states.clear();
        self.active_conditions.clear();

        let roots: Vec<MatchStateId> = self
            .matches
            .iter()
            .flat_map(|m| m.match_states.iter().copied())
            .collect();
        for root in roots {
            self.visit(root, &mut state_seen);
        }

        for id in &self.active_states {
            if let MatchRule::All(conditions) = &self.match_states[id.0].rule {
                for c in conditions {
                    if c.0 < condition_seen.len() && !condition_seen[c.0] {
                        condition_seen[c.0] = true;
                        self.active_conditions.push(*c);
                    }
                }
            }
        }
        self.initialized = true;
    }

    // Post-order walk so an inverse target is evaluated before its inverter.
    fn visit(&mut self, id: MatchStateId, seen: &mut [bool]) {
        if id.0 >= seen.len() || seen[id.0] {
            return;
        }
        seen[id.0] = true;
        if let MatchRule::Not(inner) = self.match_states[id.0].rule {
            self.visit(inner, seen);
        }
        self.active_states.push(id);
    }

    /// Enter the current match at `now`.
    pub fn begin(&mut self, now: f32) {
        self.running = true;
        if let Some(m) = self.matches.get_mut(self.current.0) {
            m.state.enter(now);
        }
    }

    /// Force a switch to `id`, restarting it at `now`.
    pub fn play(&mut self, id: MatchId, now: f32) {
        if id.0 >= self.matches.len() {
            return;
        }
        if let Some(old) = self.matches.get_mut(self.current.0) {
            old.state.completed = false;
        }
        self.current = id;
        self.running = true;
        self.matches[id.0].state.enter(now);

        let keys: Vec<ConditionId> = self.matches[id.0]
            .match_states
            .iter()
            .filter_map(|s| match &self.match_states.get(s.0)?.rule {
                MatchRule::All(conditions) => Some(conditions.clone()),
                MatchRule::Not(_) => None,
            })
            .flatten()
            .collect();
        for c in keys {
            if let Some(cond) = self.conditions.get(c.0) {
                self.params.consume_expired(&cond.condition.key);
            }
        }
    }

    /// Whether every match state of `id` held at the last evaluation.
    pub fn is_satisfied(&self, id: MatchId) -> bool {
        self.matches
            .get(id.0)
            .map(|m| {
                m.match_states
                    .iter()
                    .all(|s| self.match_states.get(s.0).is_some_and(|ms| ms.satisfied))
            })
            .unwrap_or(false)
    }

    /// Re-evaluate all conditions and pick the match to play.
    ///
    /// Chains of the current match are tried first and ignore its lock time.
    /// Otherwise nothing changes until the current match reaches its lock
    /// time; then matches are scanned in declaration order and the first
    /// satisfied one wins. If that is the current match, playback continues.
    pub fn check_states(&mut self, now: f32) -> Option<MatchId> {
        if self.matches.is_empty() {
            return None;
        }
        if !self.initialized {
            self.init();
        }
        self.evaluate();

        let current = &self.matches[self.current.0];
        let position = current.state.normalized_time;

        let chained = current
            .chains
            .iter()
            .find(|chain| position >= chain.chain_lock_time && self.is_satisfied(chain.target))
            .map(|chain| chain.target);
        if let Some(target) = chained {
            log::trace!("state match chain '{}' -> {:?}", current.name(), target);
            self.play(target, now);
            return Some(target);
        }

        if position < current.lock_time {
            return None;
        }

        let next = (0..self.matches.len())
            .map(MatchId)
            .find(|id| !self.matches[id.0].chain_only && self.is_satisfied(*id))?;
        if next == self.current {
            return None;
        }
        self.play(next, now);
        Some(next)
    }

    fn evaluate(&mut self) {
        for id in &self.active_conditions {
            let cond = &mut self.conditions[id.0];
            cond.satisfied = cond.condition.evaluate(&self.params);
        }
        for id in &self.active_states {
            let satisfied = match &self.match_states[id.0].rule {
                MatchRule::All(conditions) => conditions
                    .iter()
                    .all(|c| self.conditions.get(c.0).is_some_and(|c| c.satisfied)),
                MatchRule::Not(inner) => !self.match_states.get(inner.0).is_some_and(|s| s.satisfied),
            };
            self.match_states[id.0].satisfied = satisfied;
        }
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
