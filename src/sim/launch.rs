//! Aiming and launching the ball
//!
//! While aiming the ball has no physics body: it follows the touch across the
//! catcher plane and the pointer shows where it will go. On release it gets a
//! dynamic body and one impulse; from then on the physics world owns it.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::physics::{BodyDesc, Collider, PhysicsEngine};
use super::projector::{PointerKind, TouchSample, launch_vector};
use crate::category;
use crate::consts::{BALL_MASS, BALL_RADIUS};
use crate::scene::assembler::POINTER_LENGTH;
use crate::scene::{NodeId, Scene, SceneHandles};

/// Launch tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Impulse magnitude
    pub velocity: f32,
    /// Only stylus releases launch the ball
    pub require_stylus: bool,
}

/// Aiming state of the single ball
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchController {
    aiming: bool,
}

impl LaunchController {
    pub fn is_aiming(&self) -> bool {
        self.aiming
    }

    /// Touch down: take the ball out of the simulation and start aiming
    pub fn begin(
        &mut self,
        scene: &mut Scene,
        physics: &mut impl PhysicsEngine,
        handles: &SceneHandles,
        sample: TouchSample,
        hit: Option<Vec3>,
        config: &LaunchConfig,
    ) {
        detach_body(scene, physics, handles.ball);
        self.aiming = true;
        scene.set_hidden(handles.pointer, false);
        self.update(scene, handles, sample, hit, config);
    }

    /// Touch moved: follow the touch and re-aim the pointer
    pub fn update(
        &mut self,
        scene: &mut Scene,
        handles: &SceneHandles,
        sample: TouchSample,
        hit: Option<Vec3>,
        config: &LaunchConfig,
    ) {
        if !self.aiming {
            return;
        }
        if let Some(position) = hit {
            scene.set_position(handles.ball, position);
        }

        let Some(ball) = scene.get(handles.ball).map(|n| n.transform.translation) else {
            return;
        };
        let direction = aim_vector(&sample, config).normalize_or(-Vec3::Z);
        if let Some(pointer) = scene.get_mut(handles.pointer) {
            pointer.transform.translation = ball + direction * POINTER_LENGTH;
            pointer.transform.rotation = Quat::from_rotation_arc(Vec3::Y, direction);
        }
    }

    /// Touch up: attach a dynamic body and fire. Returns the impulse applied,
    /// or `None` when the release does not launch (not aiming, or a
    /// non-stylus release while a stylus is required).
    pub fn release(
        &mut self,
        scene: &mut Scene,
        physics: &mut impl PhysicsEngine,
        handles: &SceneHandles,
        sample: TouchSample,
        hit: Option<Vec3>,
        config: &LaunchConfig,
    ) -> Option<Vec3> {
        if !self.aiming {
            return None;
        }
        self.update(scene, handles, sample, hit, config);
        self.end(scene, handles);

        if config.require_stylus && sample.kind != PointerKind::Stylus {
            log::debug!("Release from {:?} ignored, stylus required", sample.kind);
            return None;
        }

        let position = scene.get(handles.ball)?.transform.translation;
        let body = physics.insert(
            BodyDesc::dynamic(
                Collider::Sphere {
                    radius: BALL_RADIUS,
                },
                BALL_MASS,
            )
            .with_restitution(0.5)
            .with_category(category::BALL),
            position,
        );
        if let Some(node) = scene.get_mut(handles.ball) {
            node.body = Some(body);
        }

        let impulse = aim_vector(&sample, config);
        physics.apply_impulse(body, impulse);
        log::info!("Launched from {} with impulse {}", position, impulse);
        Some(impulse)
    }

    /// Touch cancelled: stop aiming, the ball stays put without physics
    pub fn cancel(&mut self, scene: &mut Scene, handles: &SceneHandles) {
        self.end(scene, handles);
    }

    fn end(&mut self, scene: &mut Scene, handles: &SceneHandles) {
        self.aiming = false;
        scene.set_hidden(handles.pointer, true);
    }
}

/// Impulse a release with `sample` would apply
pub fn aim_vector(sample: &TouchSample, config: &LaunchConfig) -> Vec3 {
    launch_vector(sample.altitude, sample.azimuth, config.velocity)
}

fn detach_body(scene: &mut Scene, physics: &mut impl PhysicsEngine, node: NodeId) {
    if let Some(body) = scene.get_mut(node).and_then(|n| n.body.take()) {
        physics.remove(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::assemble;
    use crate::sim::physics::PhysicsWorld;
    use glam::Vec2;

    const CONFIG: LaunchConfig = LaunchConfig {
        velocity: 40.0,
        require_stylus: true,
    };

    fn setup() -> (Scene, PhysicsWorld, SceneHandles) {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let handles = assemble(&mut scene, &mut physics, false);
        (scene, physics, handles)
    }

    fn stylus(altitude: f32) -> TouchSample {
        TouchSample::stylus(Vec2::new(100.0, 100.0), altitude, Vec2::X)
    }

    #[test]
    fn test_release_attaches_tagged_body_and_fires() {
        let (mut scene, mut physics, handles) = setup();
        let mut launcher = LaunchController::default();
        let sample = stylus(std::f32::consts::FRAC_PI_2);

        launcher.begin(
            &mut scene,
            &mut physics,
            &handles,
            sample,
            Some(Vec3::new(1.0, 0.5, 5.0)),
            &CONFIG,
        );
        assert!(launcher.is_aiming());
        assert!(!scene.is_hidden(handles.pointer));

        let impulse = launcher
            .release(&mut scene, &mut physics, &handles, sample, None, &CONFIG)
            .unwrap();
        assert!((impulse - Vec3::new(0.0, 0.0, -40.0)).length() < 1e-4);

        let body = scene.get(handles.ball).and_then(|n| n.body).unwrap();
        assert_eq!(physics.category(body), Some(category::BALL));
        assert_eq!(physics.position(body), Some(Vec3::new(1.0, 0.5, 5.0)));
        assert!((physics.velocity(body).unwrap().z - -40.0).abs() < 1e-4);
        assert!(scene.is_hidden(handles.pointer));
        assert!(!launcher.is_aiming());
    }

    #[test]
    fn test_finger_release_ignored_when_stylus_required() {
        let (mut scene, mut physics, handles) = setup();
        let mut launcher = LaunchController::default();
        let finger = TouchSample::pointer(Vec2::new(10.0, 10.0), PointerKind::Direct);

        launcher.begin(&mut scene, &mut physics, &handles, finger, None, &CONFIG);
        let fired = launcher.release(&mut scene, &mut physics, &handles, finger, None, &CONFIG);
        assert!(fired.is_none());
        assert!(scene.get(handles.ball).unwrap().body.is_none());
        // Only the snow field remains in the world
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn test_finger_release_launches_straight_when_allowed() {
        let (mut scene, mut physics, handles) = setup();
        let mut launcher = LaunchController::default();
        let config = LaunchConfig {
            require_stylus: false,
            ..CONFIG
        };
        let finger = TouchSample::pointer(Vec2::new(10.0, 10.0), PointerKind::Mouse);

        launcher.begin(&mut scene, &mut physics, &handles, finger, None, &config);
        let impulse = launcher
            .release(&mut scene, &mut physics, &handles, finger, None, &config)
            .unwrap();
        assert!((impulse - Vec3::new(0.0, 0.0, -40.0)).length() < 1e-4);
    }

    #[test]
    fn test_begin_detaches_ball_in_flight() {
        let (mut scene, mut physics, handles) = setup();
        let mut launcher = LaunchController::default();
        let sample = stylus(1.2);

        launcher.begin(&mut scene, &mut physics, &handles, sample, None, &CONFIG);
        launcher.release(&mut scene, &mut physics, &handles, sample, None, &CONFIG);
        assert_eq!(physics.body_count(), 2);

        launcher.begin(&mut scene, &mut physics, &handles, sample, None, &CONFIG);
        assert_eq!(physics.body_count(), 1);
        assert!(scene.get(handles.ball).unwrap().body.is_none());
    }

    #[test]
    fn test_missed_touch_keeps_ball_position() {
        let (mut scene, mut physics, handles) = setup();
        let mut launcher = LaunchController::default();
        let before = scene.get(handles.ball).unwrap().transform.translation;

        launcher.begin(&mut scene, &mut physics, &handles, stylus(1.0), None, &CONFIG);
        launcher.update(&mut scene, &handles, stylus(1.0), None, &CONFIG);
        assert_eq!(scene.get(handles.ball).unwrap().transform.translation, before);
    }

    #[test]
    fn test_pointer_follows_aim() {
        let (mut scene, mut physics, handles) = setup();
        let mut launcher = LaunchController::default();
        let ball = Vec3::new(0.0, 0.0, 5.0);

        launcher.begin(
            &mut scene,
            &mut physics,
            &handles,
            stylus(std::f32::consts::FRAC_PI_2),
            Some(ball),
            &CONFIG,
        );
        let pointer = scene.get(handles.pointer).unwrap().transform;
        assert!((pointer.translation - (ball - Vec3::Z * POINTER_LENGTH)).length() < 1e-4);
        assert!((pointer.rotation * Vec3::Y - -Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_update_without_begin_is_ignored() {
        let (mut scene, _physics, handles) = setup();
        let mut launcher = LaunchController::default();
        launcher.update(&mut scene, &handles, stylus(1.0), Some(Vec3::ONE), &CONFIG);
        assert_ne!(scene.get(handles.ball).unwrap().transform.translation, Vec3::ONE);
    }
}
