//! Christmas Tree Bowling - fling a ball into a triangle of trees
//!
//! Core modules:
//! - `scene`: Arena scene graph, primitive geometry, camera and scene assembly
//! - `sim`: Deterministic simulation (physics, touch handling, formation, contacts)
//! - `audio`: Instrument presets and the note conductor
//! - `renderer`: Canvas draw list (painter's algorithm)
//! - `settings`: Persisted preferences and tuning

pub mod audio;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod sim;

pub use audio::{Conductor, Instrument, Note};
pub use settings::{QualityPreset, Settings};

/// Scene configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default formation: rows are counted from zero, so 6 gives 7 rows
    pub const FORMATION_ROWS: u32 = 6;
    pub const FORMATION_SPACING: f32 = 2.5;
    /// Height of every tree slot
    pub const FORMATION_Y: f32 = -1.0;

    /// Launch impulse magnitude
    pub const LAUNCH_VELOCITY: f32 = 40.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.25;
    pub const BALL_MASS: f32 = 1.0;
    pub const BALL_REST_POSITION: [f32; 3] = [0.0, 0.0, 5.0];

    /// Snow field sits just below the trees
    pub const FLOOR_Y: f32 = -1.0;

    /// Invisible plane that catches touches, facing the camera
    pub const CATCHER_Z: f32 = 5.0;
    pub const CATCHER_SIZE: f32 = 20.0;

    /// Camera
    pub const CAMERA_POSITION: [f32; 3] = [0.0, 0.0, 7.0];
    pub const CAMERA_FOV_Y_DEGREES: f32 = 60.0;

    /// Tree body
    pub const TREE_MASS: f32 = 2.0;

    /// Fixed note length in seconds
    pub const NOTE_DURATION: f32 = 1.0;
}

/// Contact categories attached to physics bodies
pub mod category {
    pub const TREE: u32 = 1;
    /// Ball in flight and the snow field share a category
    pub const BALL: u32 = 2;
    pub const SNOW_FIELD: u32 = 2;
}
