//! Data-driven animator definitions.
//!
//! Both animator kinds can be authored as JSON and built against an
//! `AssetRegistry`, which resolves clip names. Names inside a definition
//! (states, match states, matches) are resolved while building; a dangling
//! name is an error rather than a silently dead edge.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::error::EngineError;
use crate::assets::registry::AssetRegistry;
use crate::components::animation::AnimationState;
use crate::components::animator::{AnimationTransition, Animator, StateId};
use crate::components::parameters::Condition;
use crate::components::state_match::{AnimationMatch, MatchId, MatchStateId, StateMatchAnimator};

fn default_speed() -> f32 {
    1.0
}

fn default_looping() -> bool {
    true
}

/// One playable state: a clip plus playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    /// Clip name in the registry.
    pub clip: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_looping")]
    pub looping: bool,
}

impl StateDef {
    fn build(&self, registry: &AssetRegistry) -> Result<AnimationState, EngineError> {
        Ok(AnimationState::new(self.name.clone(), registry.clip(&self.clip)?)
            .with_speed(self.speed)
            .with_looping(self.looping))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub exit_time: Option<f32>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// JSON form of an `Animator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimatorDef {
    /// Name of the state entered first.
    pub entry: String,
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
    /// Initial parameter values.
    #[serde(default)]
    pub parameters: HashMap<String, f32>,
}

impl AnimatorDef {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self, registry: &AssetRegistry) -> Result<Animator, EngineError> {
        let entry = self
            .states
            .iter()
            .find(|s| s.name == self.entry)
            .ok_or(EngineError::MissingEntry)?;

        let mut animator = Animator::new(entry.build(registry)?);
        for state in self.states.iter().filter(|s| s.name != self.entry) {
            animator.add_state(state.build(registry)?);
        }

        for def in &self.transitions {
            let from = lookup_state(&animator, &def.from)?;
            let to = lookup_state(&animator, &def.to)?;
            let transition = match (def.exit_time, def.conditions.is_empty()) {
                (Some(exit_time), true) => AnimationTransition::on_exit(to, exit_time),
                (exit_time, _) => {
                    let mut transition = AnimationTransition::when(to);
                    if let Some(exit_time) = exit_time {
                        transition = transition.with_exit_time(exit_time);
                    }
                    def.conditions
                        .iter()
                        .cloned()
                        .fold(transition, AnimationTransition::with_condition)
                }
            };
            animator.add_transition(from, transition);
        }

        for (key, value) in &self.parameters {
            animator.set_float(key.clone(), *value);
        }
        Ok(animator)
    }
}

fn lookup_state(animator: &Animator, name: &str) -> Result<StateId, EngineError> {
    animator
        .state_id(name)
        .ok_or_else(|| EngineError::UnknownState(name.to_string()))
}

/// A named predicate: all `conditions` hold, or `not` does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStateDef {
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub not: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDef {
    /// Name of the match to chain into.
    pub target: String,
    /// Normalized time after which the chain may fire.
    #[serde(default)]
    pub lock_time: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDef {
    #[serde(flatten)]
    pub state: StateDef,
    /// Match states that must all hold.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub lock_time: f32,
    #[serde(default)]
    pub chains: Vec<ChainDef>,
    #[serde(default)]
    pub chain_only: bool,
}

/// JSON form of a `StateMatchAnimator`. The first match is the entry match;
/// declaration order is scan priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMatchDef {
    #[serde(default)]
    pub match_states: Vec<MatchStateDef>,
    pub matches: Vec<MatchDef>,
    #[serde(default)]
    pub parameters: HashMap<String, f32>,
}

impl StateMatchDef {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self, registry: &AssetRegistry) -> Result<StateMatchAnimator, EngineError> {
        if self.matches.is_empty() {
            return Err(EngineError::MissingEntry);
        }

        // Ids follow declaration order, so names resolve before anything is added.
        let state_ids: HashMap<&str, MatchStateId> = self
            .match_states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), MatchStateId(i)))
            .collect();
        let match_ids: HashMap<&str, MatchId> = self
            .matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.state.name.as_str(), MatchId(i)))
            .collect();
        let resolve_state = |name: &str| {
            state_ids
                .get(name)
                .copied()
                .ok_or_else(|| EngineError::UnknownMatchState(name.to_string()))
        };

        let mut animator = StateMatchAnimator::new();
        for def in &self.match_states {
            match &def.not {
                Some(_) if !def.conditions.is_empty() => {
                    return Err(EngineError::AmbiguousMatchState(def.name.clone()));
                }
                Some(inverse) => {
                    animator.add_not(def.name.clone(), resolve_state(inverse)?);
                }
                None => {
                    let conditions = def
                        .conditions
                        .iter()
                        .map(|c| animator.add_condition(c.clone()))
                        .collect();
                    animator.add_all(def.name.clone(), conditions);
                }
            }
        }

        for def in &self.matches {
            let mut animation_match = AnimationMatch::new(def.state.build(registry)?).with_lock_time(def.lock_time);
            for name in &def.requires {
                animation_match = animation_match.requires(resolve_state(name)?);
            }
            for chain in &def.chains {
                let target = match_ids
                    .get(chain.target.as_str())
                    .copied()
                    .ok_or_else(|| EngineError::UnknownState(chain.target.clone()))?;
                animation_match = animation_match.with_chain(target, chain.lock_time);
            }
            if def.chain_only {
                animation_match = animation_match.chain_only();
            }
            animator.add_match(animation_match);
        }

        for (key, value) in &self.parameters {
            animator.set_float(key.clone(), *value);
        }
        animator.init();
        Ok(animator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::AnimationClip;

    fn registry() -> AssetRegistry {
        let mut registry = AssetRegistry::new();
        for (i, name) in ["idle", "run", "slash", "stab"].iter().enumerate() {
            registry.insert_clip(AnimationClip::horizontal_strip(*name, i as f32, 0.0, 4, 4.0));
        }
        registry
    }

    const WALKER: &str = r#"{
        "entry": "idle",
        "states": [
            { "name": "run", "clip": "run", "speed": 2.0 },
            { "name": "idle", "clip": "idle" }
        ],
        "transitions": [
            { "from": "idle", "to": "run", "conditions": [{ "key": "speed", "op": ">", "value": 0.5 }] },
            { "from": "run", "to": "idle", "conditions": [{ "key": "speed", "op": "<", "value": 0.5 }] },
            { "from": "run", "to": "idle", "exit_time": 1.0 }
        ],
        "parameters": { "speed": 0.0 }
    }"#;

    #[test]
    fn builds_animator_with_entry_first() {
        let animator = AnimatorDef::from_json(WALKER).unwrap().build(&registry()).unwrap();
        assert_eq!(animator.current_state().name, "idle");
        assert_eq!(animator.get_float("speed"), 0.0);

        let run = animator.state_id("run").unwrap();
        let run_state = animator.state(run).unwrap();
        assert_eq!(run_state.speed, 2.0);
        assert_eq!(run_state.sample_rate, 8.0);
        assert_eq!(run_state.transitions().len(), 2);
        assert!(run_state.transitions()[0].is_conditional());
        assert_eq!(run_state.transitions()[1].exit_time, Some(1.0));
    }

    #[test]
    fn animator_definition_errors() {
        let missing_entry = r#"{ "entry": "nope", "states": [{ "name": "idle", "clip": "idle" }] }"#;
        assert!(matches!(
            AnimatorDef::from_json(missing_entry).unwrap().build(&registry()),
            Err(EngineError::MissingEntry)
        ));

        let bad_target = r#"{
            "entry": "idle",
            "states": [{ "name": "idle", "clip": "idle" }],
            "transitions": [{ "from": "idle", "to": "jump", "exit_time": 0.5 }]
        }"#;
        assert!(matches!(
            AnimatorDef::from_json(bad_target).unwrap().build(&registry()),
            Err(EngineError::UnknownState(name)) if name == "jump"
        ));

        let bad_clip = r#"{ "entry": "idle", "states": [{ "name": "idle", "clip": "fly" }] }"#;
        assert!(matches!(
            AnimatorDef::from_json(bad_clip).unwrap().build(&registry()),
            Err(EngineError::UnknownClip(_))
        ));
    }

    const COMBO: &str = r#"{
        "match_states": [
            { "name": "attacking", "conditions": [{ "key": "attack", "op": "=", "value": 1 }] },
            { "name": "calm", "not": "attacking" },
            { "name": "armed", "conditions": [{ "key": "attack", "op": "=", "value": 1 }] }
        ],
        "matches": [
            { "name": "idle", "clip": "idle", "requires": ["calm"] },
            { "name": "slash", "clip": "slash", "looping": false, "requires": ["attacking"],
              "lock_time": 1.0, "chains": [{ "target": "stab", "lock_time": 0.25 }] },
            { "name": "stab", "clip": "stab", "looping": false, "requires": ["armed"], "chain_only": true }
        ]
    }"#;

    #[test]
    fn builds_state_match_with_chains() {
        let animator = StateMatchDef::from_json(COMBO).unwrap().build(&registry()).unwrap();
        assert_eq!(animator.current_match().unwrap().name(), "idle");
        assert_eq!(animator.matches().len(), 3);
        assert_eq!(animator.active_condition_count(), 1);

        let slash = animator.get_match(animator.match_id("slash").unwrap()).unwrap();
        assert_eq!(slash.lock_time, 1.0);
        assert_eq!(slash.chains[0].target, animator.match_id("stab").unwrap());
        assert!(!slash.state.looping);
        assert!(animator.get_match(animator.match_id("stab").unwrap()).unwrap().chain_only);
    }

    #[test]
    fn built_state_match_switches_on_parameters() {
        let mut animator = StateMatchDef::from_json(COMBO).unwrap().build(&registry()).unwrap();
        animator.begin(0.0);
        assert_eq!(animator.check_states(0.0), None);

        animator.set_float("attack", 1.0);
        assert_eq!(animator.check_states(0.1), animator.match_id("slash"));
    }

    #[test]
    fn state_match_definition_errors() {
        let ambiguous = r#"{
            "match_states": [
                { "name": "a", "conditions": [{ "key": "x", "op": ">", "value": 0 }] },
                { "name": "b", "conditions": [{ "key": "x", "op": ">", "value": 0 }], "not": "a" }
            ],
            "matches": [{ "name": "idle", "clip": "idle" }]
        }"#;
        assert!(matches!(
            StateMatchDef::from_json(ambiguous).unwrap().build(&registry()),
            Err(EngineError::AmbiguousMatchState(name)) if name == "b"
        ));

        let dangling = r#"{ "matches": [{ "name": "idle", "clip": "idle", "requires": ["ghost"] }] }"#;
        assert!(matches!(
            StateMatchDef::from_json(dangling).unwrap().build(&registry()),
            Err(EngineError::UnknownMatchState(name)) if name == "ghost"
        ));

        let empty = r#"{ "matches": [] }"#;
        assert!(matches!(
            StateMatchDef::from_json(empty).unwrap().build(&registry()),
            Err(EngineError::MissingEntry)
        ));
    }
}
