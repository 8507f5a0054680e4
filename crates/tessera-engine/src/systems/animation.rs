//! Animation system: drives animators and updates sprite frames.

use crate::api::types::{AnimationEvent, AnimationEventKind, EntityId};
use crate::components::animation::{AnimationState, PlaybackReport};
use crate::components::animator::Animator;
use crate::components::state_match::StateMatchAnimator;
use crate::core::scene::Scene;
use crate::core::signature::{SystemKind, SystemTable};
use crate::core::time::GameClock;

/// Tick every active entity's animator and state-match animator and copy the
/// current frame into its sprite.
///
/// Call this once per frame, after the clock has advanced and before the
/// batch update. Only entities whose signature `systems` routes to the
/// animation or state-match system are driven. An entity carrying both
/// kinds plays both; the state-match frame is the one that ends up in the
/// sprite.
///
/// Returns the entities whose sprite cell changed. Static batches do not
/// refresh on their own, so the caller marks theirs dirty.
pub fn tick_animations(
    scene: &mut Scene,
    systems: &SystemTable,
    clock: &GameClock,
    events: &mut Vec<AnimationEvent>,
) -> Vec<EntityId> {
    let now = clock.now();
    let dt = clock.delta();
    let mut changed = Vec::new();

    for entity in scene.iter_mut() {
        if !entity.active {
            continue;
        }
        let id = entity.id;
        let signature = entity.signature();
        let mut cell = None;

        if systems.is_interested(signature, SystemKind::Animation) {
            if let Some(animator) = entity.animator.as_mut() {
                cell = drive_animator(id, animator, now, dt, events).or(cell);
            }
        }
        if systems.is_interested(signature, SystemKind::StateMatch) {
            if let Some(state_match) = entity.state_match.as_mut() {
                cell = drive_state_match(id, state_match, now, dt, events).or(cell);
            }
        }

        if let (Some((col, row)), Some(sprite)) = (cell, entity.sprite.as_mut()) {
            if sprite.col != col || sprite.row != row {
                sprite.col = col;
                sprite.row = row;
                changed.push(id);
            }
        }
    }
    changed
}

fn drive_animator(
    entity: EntityId,
    animator: &mut Animator,
    now: f32,
    dt: f32,
    events: &mut Vec<AnimationEvent>,
) -> Option<(f32, f32)> {
    if !animator.is_running() {
        animator.begin(now);
    }
    // Transitions read this frame's triggers before they count down.
    animator.check_transitions(now);
    animator.check_triggers(dt);

    let state = animator.current_state_mut();
    let report = state.advance(now);
    emit(entity, state, report, events);
    state.current_cell()
}

fn drive_state_match(
    entity: EntityId,
    state_match: &mut StateMatchAnimator,
    now: f32,
    dt: f32,
    events: &mut Vec<AnimationEvent>,
) -> Option<(f32, f32)> {
    if !state_match.is_running() {
        state_match.begin(now);
    }
    state_match.check_states(now);
    state_match.check_triggers(dt);

    let state = state_match.current_state_mut()?;
    let report = state.advance(now);
    emit(entity, state, report, events);
    state.current_cell()
}

fn emit(entity: EntityId, state: &AnimationState, report: PlaybackReport, events: &mut Vec<AnimationEvent>) {
    if report.started {
        events.push(AnimationEvent {
            entity,
            state: state.name.clone(),
            kind: AnimationEventKind::Started,
        });
    }
    if report.finished {
        events.push(AnimationEvent {
            entity,
            state: state.name.clone(),
            kind: AnimationEventKind::Finished,
        });
    }
}
