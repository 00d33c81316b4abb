//! Playground state
//!
//! Everything the fixed-step loop mutates lives here: the scene arena, the
//! physics engine behind its trait, aiming state, the placed trees, snow and
//! the outgoing event queue.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::contact::{ContactNotifier, SoundIntent};
use super::formation::reset_formation;
use super::launch::{LaunchConfig, LaunchController};
use super::physics::{PhysicsEngine, PhysicsWorld};
use super::snow::SnowField;
use crate::consts::{BALL_REST_POSITION, SIM_DT};
use crate::scene::{Camera, NodeContent, NodeId, Scene, SceneHandles, Viewport, assemble};
use crate::settings::Settings;

/// Snow uses its own RNG stream so flakes never shift note choices
const SNOW_STREAM: u64 = 0x5A0F_1A4E;

/// Game events emitted for the front end (sound, UI)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A first contact that rings an instrument
    Sound(SoundIntent),
    /// Ball released with this impulse
    Launched { impulse: Vec3 },
    /// Formation rebuilt with this many trees
    Reset { trees: usize },
}

/// The whole interactive scene
pub struct Playground<P: PhysicsEngine = PhysicsWorld> {
    /// Session seed for reproducibility
    pub seed: u64,
    pub scene: Scene,
    pub handles: SceneHandles,
    pub physics: P,
    pub launcher: LaunchController,
    /// Group nodes of the placed trees
    pub trees: Vec<NodeId>,
    pub snow: SnowField,
    pub notifier: ContactNotifier,
    pub launch: LaunchConfig,
    pub rows: u32,
    pub spacing: f32,
    /// Ticks of silence after each reset
    pub settle_ticks: u32,
    /// Silent ticks left
    pub settling: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub viewport: Viewport,
    events: Vec<GameEvent>,
}

impl Playground<PhysicsWorld> {
    /// Playground on the built-in physics world
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self::with_engine(seed, settings, PhysicsWorld::new())
    }
}

impl<P: PhysicsEngine> Playground<P> {
    /// Assemble the scene on `physics` and place the first formation
    pub fn with_engine(seed: u64, settings: &Settings, mut physics: P) -> Self {
        let mut scene = Scene::new();
        let handles = assemble(&mut scene, &mut physics, settings.ornaments);
        let settle_ticks = (settings.settle_seconds / SIM_DT).round() as u32;

        let mut playground = Self {
            seed,
            scene,
            handles,
            physics,
            launcher: LaunchController::default(),
            trees: Vec::new(),
            snow: SnowField::new(seed ^ SNOW_STREAM, settings.max_snow()),
            notifier: ContactNotifier::new(seed),
            launch: settings.launch_config(),
            rows: settings.formation_rows,
            spacing: settings.formation_spacing,
            settle_ticks,
            settling: 0,
            time_ticks: 0,
            viewport: Viewport::new(1024.0, 768.0),
            events: Vec::new(),
        };
        playground.reset();
        log::info!(
            "Playground ready: seed {}, {} trees, {} snowflakes max",
            seed,
            playground.trees.len(),
            playground.snow.cap()
        );
        playground
    }

    /// Rebuild the formation and park the ball
    pub fn reset(&mut self) -> usize {
        self.launcher.cancel(&mut self.scene, &self.handles);
        if let Some(body) = self
            .scene
            .get_mut(self.handles.ball)
            .and_then(|n| n.body.take())
        {
            self.physics.remove(body);
        }
        self.scene
            .set_position(self.handles.ball, Vec3::from(BALL_REST_POSITION));

        let prefab = self.handles.tree.clone();
        let count = reset_formation(
            &mut self.scene,
            &mut self.physics,
            &prefab,
            &mut self.trees,
            self.rows,
            self.spacing,
        );
        // Contacts from trees settling onto the snow field stay silent
        self.physics.drain_contacts();
        self.settling = self.settle_ticks;
        self.events.push(GameEvent::Reset { trees: count });
        count
    }

    /// Camera as placed in the scene
    pub fn camera(&self) -> Camera {
        match self.scene.get(self.handles.camera).map(|n| &n.content) {
            Some(NodeContent::Camera(camera)) => {
                let mut camera = *camera;
                if let Some(position) = self.scene.world_position(self.handles.camera) {
                    let forward = camera.target - camera.position;
                    camera.position = position;
                    camera.target = position + forward;
                }
                camera
            }
            _ => Camera::default(),
        }
    }

    /// Copy body positions back onto their scene nodes
    pub fn sync_bodies(&mut self) {
        let moved: Vec<(NodeId, Vec3)> = self
            .scene
            .iter()
            .filter_map(|node| {
                let body = node.body?;
                let position = self.physics.position(body)?;
                Some((node.id, position))
            })
            .collect();
        for (id, position) in moved {
            self.scene.set_position(id, position);
        }
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply changed settings; formation changes take effect on next reset
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.launch = settings.launch_config();
        self.rows = settings.formation_rows;
        self.spacing = settings.formation_spacing;
        self.settle_ticks = (settings.settle_seconds / SIM_DT).round() as u32;
        self.snow.set_cap(settings.max_snow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Primitive;

    fn settings(rows: u32) -> Settings {
        Settings {
            formation_rows: rows,
            ..Settings::default()
        }
    }

    #[test]
    fn test_new_places_formation() {
        let mut playground = Playground::new(1, &settings(2));
        assert_eq!(playground.trees.len(), 6);
        // Snow field plus one body per tree
        assert_eq!(playground.physics.body_count(), 7);
        assert_eq!(
            playground.drain_events(),
            vec![GameEvent::Reset { trees: 6 }]
        );
        assert!(playground.drain_events().is_empty());
    }

    #[test]
    fn test_reset_parks_ball() {
        let mut playground = Playground::new(1, &settings(1));
        let ball = playground.handles.ball;
        playground.scene.set_position(ball, Vec3::new(3.0, 2.0, 1.0));
        playground.reset();
        assert_eq!(
            playground.scene.world_position(ball),
            Some(Vec3::from(BALL_REST_POSITION))
        );
        assert_eq!(playground.settling, playground.settle_ticks);
    }

    #[test]
    fn test_camera_follows_node() {
        let playground = Playground::new(1, &settings(0));
        let camera = playground.camera();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 7.0));
        assert!((camera.target - camera.position).z < 0.0);
    }

    #[test]
    fn test_sync_moves_tree_nodes_with_bodies() {
        let mut playground = Playground::new(1, &settings(0));
        let tree = playground.trees[0];
        let body = playground.scene.get(tree).and_then(|n| n.body).unwrap();
        playground.physics.apply_impulse(body, Vec3::new(0.0, 0.0, -10.0));
        playground.physics.step(SIM_DT);
        playground.sync_bodies();
        let node = playground.scene.world_position(tree).unwrap();
        let body = playground.physics.position(body).unwrap();
        assert!((node - body).length() < 1e-5);
        assert!(body.z < 0.0);
    }

    #[test]
    fn test_tree_template_survives_resets() {
        let mut playground = Playground::new(1, &settings(1));
        playground.reset();
        playground.reset();
        let geometry = playground
            .scene
            .iter()
            .filter(|n| {
                matches!(
                    n.content,
                    NodeContent::Geometry {
                        primitive: Primitive::Cone { .. },
                        ..
                    }
                )
            })
            .count();
        assert_eq!(geometry, 3);
    }
}
