//! Fixed timestep simulation tick
//!
//! Advances the playground deterministically: inputs are applied in order,
//! then physics steps once and its contacts become sound events.

use serde::{Deserialize, Serialize};

use super::physics::PhysicsEngine;
use super::projector::{TouchSample, project_touch};
use super::state::{GameEvent, Playground};
use crate::consts::FLOOR_Y;
use crate::scene::{NodeContent, Viewport};

/// Lifecycle stage of a touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub sample: TouchSample,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, sample: TouchSample) -> Self {
        Self { phase, sample }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Touches in arrival order
    pub touches: Vec<TouchEvent>,
    /// Reset button pressed
    pub reset: bool,
    /// Canvas resized
    pub viewport: Option<Viewport>,
}

/// Route one touch through the projector into the launch controller
pub fn handle_touch<P: PhysicsEngine>(state: &mut Playground<P>, touch: &TouchEvent) {
    let camera = state.camera();
    let hit = project_touch(
        &state.scene,
        &camera,
        state.viewport,
        state.handles.catcher,
        touch.sample.location,
    );
    if hit.is_none() {
        log::trace!("Touch at {} missed the catcher", touch.sample.location);
    }

    match touch.phase {
        TouchPhase::Began => state.launcher.begin(
            &mut state.scene,
            &mut state.physics,
            &state.handles,
            touch.sample,
            hit,
            &state.launch,
        ),
        TouchPhase::Moved => {
            state
                .launcher
                .update(&mut state.scene, &state.handles, touch.sample, hit, &state.launch)
        }
        TouchPhase::Ended => {
            let launched = state.launcher.release(
                &mut state.scene,
                &mut state.physics,
                &state.handles,
                touch.sample,
                hit,
                &state.launch,
            );
            if let Some(impulse) = launched {
                state.push_event(GameEvent::Launched { impulse });
            }
        }
        TouchPhase::Cancelled => state.launcher.cancel(&mut state.scene, &state.handles),
    }
}

/// Advance the playground by one fixed timestep
pub fn tick<P: PhysicsEngine>(state: &mut Playground<P>, input: &TickInput, dt: f32) {
    if let Some(viewport) = input.viewport {
        state.viewport = viewport;
    }

    if input.reset {
        state.reset();
    }

    for touch in &input.touches {
        handle_touch(state, touch);
    }

    state.physics.step(dt);
    state.sync_bodies();

    // Trees settling onto the snow field stay silent; the ball always rings
    let settling = state.settling > 0;
    state.settling = state.settling.saturating_sub(1);
    let floor = state.scene.get(state.handles.floor).and_then(|n| n.body);
    for contact in &state.physics.drain_contacts() {
        let touches_floor = floor.is_some_and(|body| contact.a == body || contact.b == body);
        if settling && touches_floor {
            continue;
        }
        if let Some(intent) = state.notifier.notify(contact) {
            state.push_event(GameEvent::Sound(intent));
        }
    }

    // Snow falls from the emitter node
    let emitter = state.handles.emitter;
    let half_extents = state.scene.get(emitter).and_then(|n| match n.content {
        NodeContent::Emitter { half_extents } => Some(half_extents),
        _ => None,
    });
    let center = state.scene.world_position(emitter);
    if let (Some(half_extents), Some(center)) = (half_extents, center) {
        state.snow.update(dt, center, half_extents, FLOOR_Y);
    }

    state.time_ticks += 1;
}
