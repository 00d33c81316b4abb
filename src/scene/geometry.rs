//! Primitive geometry, materials and prefabs
//!
//! Primitives are described by their dimensions only; the renderer and the
//! physics layer derive what they need from them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A geometric primitive, centered on its node origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Cone standing on its base, apex up
    Cone {
        top_radius: f32,
        bottom_radius: f32,
        height: f32,
    },
    /// Upright cylinder
    Cylinder { radius: f32, height: f32 },
    Sphere { radius: f32 },
    /// Flat rectangle in the node's XY plane (normal +Z)
    Plane { width: f32, height: f32 },
    /// Infinite horizontal floor (normal +Y)
    Floor,
}

impl Primitive {
    /// Lowest and highest Y relative to the primitive origin
    pub fn vertical_extent(&self) -> (f32, f32) {
        match *self {
            Primitive::Cone { height, .. } | Primitive::Cylinder { height, .. } => {
                (-height / 2.0, height / 2.0)
            }
            Primitive::Sphere { radius } => (-radius, radius),
            Primitive::Plane { height, .. } => (-height / 2.0, height / 2.0),
            Primitive::Floor => (0.0, 0.0),
        }
    }

    /// Largest horizontal radius
    pub fn max_radius(&self) -> f32 {
        match *self {
            Primitive::Cone {
                top_radius,
                bottom_radius,
                ..
            } => top_radius.max(bottom_radius),
            Primitive::Cylinder { radius, .. } | Primitive::Sphere { radius } => radius,
            Primitive::Plane { width, .. } => width / 2.0,
            Primitive::Floor => f32::INFINITY,
        }
    }
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Linear RGBA
    pub diffuse: [f32; 4],
    /// Self-illumination (0 = lit only by lights)
    pub emission: f32,
}

impl Material {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            diffuse: [r, g, b, 1.0],
            emission: 0.0,
        }
    }

    pub const fn glowing(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    pub const fn with_alpha(mut self, alpha: f32) -> Self {
        self.diffuse[3] = alpha;
        self
    }

    pub const PINE: Material = Material::new(0.05, 0.45, 0.12);
    pub const BARK: Material = Material::new(0.4, 0.25, 0.1);
    pub const ORNAMENT: Material = Material::new(0.85, 0.05, 0.1).glowing(0.4);
    pub const SNOW: Material = Material::new(0.92, 0.94, 1.0);
    pub const BALL: Material = Material::new(0.8, 0.8, 0.85).glowing(0.1);
    pub const POINTER: Material = Material::new(1.0, 0.85, 0.2).glowing(1.0);
    pub const INVISIBLE: Material = Material::new(0.0, 0.0, 0.0).with_alpha(0.0);
}

/// One piece of a prefab: a primitive with a material, offset from the prefab origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub primitive: Primitive,
    pub material: Material,
    pub offset: Vec3,
}

impl Part {
    pub fn new(primitive: Primitive, material: Material, offset: Vec3) -> Self {
        Self {
            primitive,
            material,
            offset,
        }
    }
}

/// Immutable template subgraph, cloned into the scene per placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    pub parts: Vec<Part>,
}

impl Prefab {
    /// Vertical span of all parts relative to the prefab origin
    pub fn vertical_extent(&self) -> (f32, f32) {
        self.parts
            .iter()
            .map(|p| {
                let (lo, hi) = p.primitive.vertical_extent();
                (lo + p.offset.y, hi + p.offset.y)
            })
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (a, b)| {
                (lo.min(a), hi.max(b))
            })
    }

    /// Horizontal radius that encloses every part
    pub fn max_radius(&self) -> f32 {
        self.parts
            .iter()
            .map(|p| p.primitive.max_radius() + p.offset.x.hypot(p.offset.z))
            .fold(0.0, f32::max)
    }
}
