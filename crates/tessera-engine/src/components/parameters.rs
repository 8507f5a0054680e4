//! Animation parameters, timed triggers, and the conditions that read them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison applied by a condition between a parameter and its target value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparator {
    /// Compare `value` against `target`.
    ///
    /// An unset parameter reads as NaN and fails every comparator, `NotEqual`
    /// included. `Equal` is exact float equality.
    pub fn compare(self, value: f32, target: f32) -> bool {
        if value.is_nan() || target.is_nan() {
            return false;
        }
        match self {
            Comparator::Equal => value == target,
            Comparator::Greater => value > target,
            Comparator::Less => value < target,
            Comparator::NotEqual => value != target,
        }
    }
}

/// `parameter <comparator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(rename = "op")]
    pub comparator: Comparator,
    pub value: f32,
}

impl Condition {
    pub fn new(key: impl Into<String>, comparator: Comparator, value: f32) -> Self {
        Self {
            key: key.into(),
            comparator,
            value,
        }
    }

    pub fn evaluate(&self, params: &Parameters) -> bool {
        self.comparator.compare(params.get(&self.key), self.value)
    }
}

/// Callback run when a trigger resets. Receives the parameter key.
pub type ResetCallback = Box<dyn FnMut(&str)>;

/// A timed parameter pulse that falls back to `reset_value` when `time_left` runs out.
pub struct Trigger {
    pub reset_value: f32,
    pub time_left: f32,
    pub on_reset: Option<ResetCallback>,
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("reset_value", &self.reset_value)
            .field("time_left", &self.time_left)
            .field("on_reset", &self.on_reset.is_some())
            .finish()
    }
}

/// Parameter dictionary plus active triggers, shared in shape by both animators.
#[derive(Debug, Default)]
pub struct Parameters {
    values: HashMap<String, f32>,
    triggers: HashMap<String, Trigger>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a parameter. Unknown keys read as NaN.
    pub fn get(&self, key: &str) -> f32 {
        self.values.get(key).copied().unwrap_or(f32::NAN)
    }

    pub fn set(&mut self, key: impl Into<String>, value: f32) {
        self.values.insert(key.into(), value);
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, if value { 1.0 } else { 0.0 });
    }

    pub fn remove(&mut self, key: &str) -> Option<f32> {
        self.values.remove(key)
    }

    /// Set `key` to `value` for `duration` seconds, then back to `reset_value`.
    ///
    /// Re-triggering an active key replaces the pending trigger.
    pub fn set_trigger(&mut self, key: impl Into<String>, value: f32, reset_value: f32, duration: f32) {
        self.insert_trigger(key.into(), value, reset_value, duration, None);
    }

    /// Like `set_trigger`, running `on_reset` when the trigger expires.
    pub fn set_trigger_with(
        &mut self,
        key: impl Into<String>,
        value: f32,
        reset_value: f32,
        duration: f32,
        on_reset: impl FnMut(&str) + 'static,
    ) {
        self.insert_trigger(key.into(), value, reset_value, duration, Some(Box::new(on_reset)));
    }

    fn insert_trigger(&mut self, key: String, value: f32, reset_value: f32, duration: f32, on_reset: Option<ResetCallback>) {
        self.values.insert(key.clone(), value);
        self.triggers.insert(
            key,
            Trigger {
                reset_value,
                time_left: duration.max(0.0),
                on_reset,
            },
        );
    }

    pub fn trigger(&self, key: &str) -> Option<&Trigger> {
        self.triggers.get(key)
    }

    pub fn active_triggers(&self) -> usize {
        self.triggers.len()
    }

    /// Count every trigger down by `dt`; reset and drop those that reach zero.
    pub fn check_triggers(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for (key, trigger) in self.triggers.iter_mut() {
            trigger.time_left = (trigger.time_left - dt).max(0.0);
            if trigger.time_left <= 0.0 {
                expired.push(key.clone());
            }
        }
        for key in expired {
            self.reset_trigger(&key);
        }
    }

    /// Reset `key` if it is backed by a trigger with no time left.
    ///
    /// Transitions call this for the keys they read so an expired pulse is
    /// consumed the moment it is used instead of on the next tick.
    pub fn consume_expired(&mut self, key: &str) -> bool {
        match self.triggers.get(key) {
            Some(trigger) if trigger.time_left <= 0.0 => {
                self.reset_trigger(key);
                true
            }
            _ => false,
        }
    }

    fn reset_trigger(&mut self, key: &str) {
        if let Some(mut trigger) = self.triggers.remove(key) {
            self.values.insert(key.to_string(), trigger.reset_value);
            if let Some(callback) = trigger.on_reset.as_mut() {
                callback(key);
            }
            log::trace!("trigger '{}' reset to {}", key, trigger.reset_value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn unknown_parameter_is_nan() {
        let params = Parameters::new();
        assert!(params.get("speed").is_nan());
    }

    #[test]
    fn nan_fails_every_comparator() {
        for op in [Comparator::Equal, Comparator::Greater, Comparator::Less, Comparator::NotEqual] {
            assert!(!op.compare(f32::NAN, 1.0), "{:?} must fail on NaN", op);
        }
    }

    #[test]
    fn comparators() {
        assert!(Comparator::Equal.compare(2.0, 2.0));
        assert!(!Comparator::Equal.compare(2.0, 2.0001));
        assert!(Comparator::Greater.compare(3.0, 2.0));
        assert!(Comparator::Less.compare(1.0, 2.0));
        assert!(Comparator::NotEqual.compare(1.0, 2.0));
        assert!(!Comparator::NotEqual.compare(2.0, 2.0));
    }

    #[test]
    fn condition_reads_parameters() {
        let mut params = Parameters::new();
        let cond = Condition::new("speed", Comparator::Greater, 0.5);
        assert!(!cond.evaluate(&params));
        params.set("speed", 1.0);
        assert!(cond.evaluate(&params));
    }

    #[test]
    fn zero_duration_trigger_resets_on_next_check() {
        let mut params = Parameters::new();
        params.set_trigger("jump", 1.0, 0.0, 0.0);
        assert_eq!(params.get("jump"), 1.0);

        params.check_triggers(0.016);
        assert_eq!(params.get("jump"), 0.0);
        assert!(params.trigger("jump").is_none());
    }

    #[test]
    fn trigger_counts_down() {
        let mut params = Parameters::new();
        params.set_trigger("hit", 1.0, 0.0, 0.5);

        params.check_triggers(0.25);
        assert_eq!(params.get("hit"), 1.0);
        assert_eq!(params.active_triggers(), 1);

        params.check_triggers(0.25);
        assert_eq!(params.get("hit"), 0.0);
        assert_eq!(params.active_triggers(), 0);
    }

    #[test]
    fn reset_callback_runs_once() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut params = Parameters::new();
        params.set_trigger_with("dash", 1.0, 0.0, 0.0, move |_| counter.set(counter.get() + 1));

        params.check_triggers(0.1);
        params.check_triggers(0.1);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn consume_expired_only_touches_spent_triggers() {
        let mut params = Parameters::new();
        params.set_trigger("a", 1.0, 0.0, 0.0);
        params.set_trigger("b", 1.0, 0.0, 1.0);

        assert!(params.consume_expired("a"));
        assert!(!params.consume_expired("b"));
        assert!(!params.consume_expired("missing"));
        assert_eq!(params.get("a"), 0.0);
        assert_eq!(params.get("b"), 1.0);
    }

    #[test]
    fn comparator_parses_symbols() {
        let cond: Condition = serde_json::from_str(r#"{ "key": "x", "op": "!=", "value": 3 }"#).unwrap();
        assert_eq!(cond.comparator, Comparator::NotEqual);
        assert_eq!(cond.value, 3.0);
    }
}
