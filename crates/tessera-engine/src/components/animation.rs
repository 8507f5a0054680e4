//! Animation clips and per-instance playback cursors.
//!
//! A clip is a sequence of atlas cells sampled at a fixed rate. An
//! `AnimationState` is one playback of a clip inside an animator; the
//! animation system advances it against the game clock.

use std::sync::Arc;

use crate::components::animator::AnimationTransition;

/// A frame-based sprite animation: atlas cells plus a sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Frame cells as (col, row) pairs in the atlas.
    pub frames: Vec<(f32, f32)>,
    /// Frames per second at speed 1.0.
    pub sample_rate: f32,
}

/// Clips are shared by every state (and entity) that plays them.
pub type SharedClip = Arc<AnimationClip>;

impl AnimationClip {
    /// Create a horizontal strip clip (consecutive columns, same row).
    pub fn horizontal_strip(name: impl Into<String>, row: f32, start_col: f32, frame_count: u32, fps: f32) -> Self {
        let frames = (0..frame_count).map(|i| (start_col + i as f32, row)).collect();
        Self {
            name: name.into(),
            frames,
            sample_rate: fps,
        }
    }

    /// Create a vertical strip clip (consecutive rows, same column).
    pub fn vertical_strip(name: impl Into<String>, col: f32, start_row: f32, frame_count: u32, fps: f32) -> Self {
        let frames = (0..frame_count).map(|i| (col, start_row + i as f32)).collect();
        Self {
            name: name.into(),
            frames,
            sample_rate: fps,
        }
    }

    /// Create from an explicit frame list.
    pub fn from_frames(name: impl Into<String>, frames: Vec<(f32, f32)>, fps: f32) -> Self {
        Self {
            name: name.into(),
            frames,
            sample_rate: fps,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Duration in seconds at speed 1.0.
    pub fn length(&self) -> f32 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.frames.len() as f32 / self.sample_rate
    }

    pub fn into_shared(self) -> SharedClip {
        Arc::new(self)
    }
}

/// Edges produced by one call to `AnimationState::advance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub frame_changed: bool,
    pub started: bool,
    pub finished: bool,
}

/// One named clip instance with its own playback cursor.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub name: String,
    pub clip: SharedClip,
    /// Playback speed multiplier (1.0 = normal).
    pub speed: f32,
    /// Effective frames per second: clip rate times speed.
    pub sample_rate: f32,
    /// Effective length in seconds.
    pub length: f32,
    pub looping: bool,
    pub cur_frame: usize,
    /// Game time at which the current frame began.
    pub last_frame_time: f32,
    /// Sample intervals accumulated since the loop started.
    pub frame_time: f32,
    pub loop_start_time: f32,
    /// Playback position in [0, 1].
    pub normalized_time: f32,
    /// Set once `Finished` has been raised; cleared when the state is left or re-entered.
    pub completed: bool,
    started: bool,
    pub(crate) transitions: Vec<AnimationTransition>,
}

impl AnimationState {
    pub fn new(name: impl Into<String>, clip: SharedClip) -> Self {
        let mut state = Self {
            name: name.into(),
            clip,
            speed: 1.0,
            sample_rate: 0.0,
            length: 0.0,
            looping: true,
            cur_frame: 0,
            last_frame_time: 0.0,
            frame_time: 0.0,
            loop_start_time: 0.0,
            normalized_time: 0.0,
            completed: false,
            started: false,
            transitions: Vec::new(),
        };
        state.recompute_rate();
        state
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        self.recompute_rate();
    }

    fn recompute_rate(&mut self) {
        self.sample_rate = self.clip.sample_rate * self.speed;
        self.length = if self.sample_rate > 0.0 {
            self.clip.frame_count() as f32 / self.sample_rate
        } else {
            0.0
        };
    }

    /// Outgoing transitions in evaluation order.
    pub fn transitions(&self) -> &[AnimationTransition] {
        &self.transitions
    }

    /// Restart playback from frame 0 at game time `now`.
    pub fn enter(&mut self, now: f32) {
        self.cur_frame = 0;
        self.last_frame_time = now;
        self.frame_time = 0.0;
        self.loop_start_time = now;
        self.normalized_time = 0.0;
        self.completed = false;
        self.started = false;
    }

    /// Current atlas cell, if the clip has frames.
    pub fn current_cell(&self) -> Option<(f32, f32)> {
        self.clip.frames.get(self.cur_frame).copied()
    }

    /// Whether a non-looping state has played to its end.
    pub fn is_finished(&self) -> bool {
        !self.looping && self.normalized_time >= 1.0
    }

    /// Advance the frame cursor up to game time `now`.
    ///
    /// Frames step in whole sample intervals. Past the final frame a looping
    /// state wraps to frame 0 and restarts its loop clock; a non-looping state
    /// holds its last frame with normalized time 1.0. `Finished` is raised the
    /// first time the end is crossed and not again until the state is re-entered.
    pub fn advance(&mut self, now: f32) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        if !self.started {
            self.started = true;
            report.started = true;
        }

        let frame_count = self.clip.frame_count();
        if frame_count == 0 || self.sample_rate <= 0.0 {
            return report;
        }
        if self.is_finished() {
            return report;
        }

        let interval = 1.0 / self.sample_rate;
        while self.last_frame_time + interval <= now {
            self.last_frame_time += interval;
            self.frame_time += interval;

            if self.cur_frame + 1 < frame_count {
                self.cur_frame += 1;
                report.frame_changed = true;
                continue;
            }

            if !self.completed {
                self.completed = true;
                report.finished = true;
            }

            if self.looping {
                self.cur_frame = 0;
                self.frame_time = 0.0;
                self.loop_start_time = self.last_frame_time;
                report.frame_changed |= frame_count > 1;
            } else {
                self.normalized_time = 1.0;
                return report;
            }
        }

        self.normalized_time = if self.length > 0.0 {
            ((now - self.loop_start_time) / self.length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        report
    }
}
