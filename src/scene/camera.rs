//! Perspective camera with screen <-> world conversions

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};

use crate::consts::{CAMERA_FOV_Y_DEGREES, CAMERA_POSITION};

/// View size in logical pixels (origin top-left, Y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// A half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to a plane, if it is hit in front of the origin
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = self.direction.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let position = Vec3::from(CAMERA_POSITION);
        Self {
            position,
            target: position - Vec3::Z,
            fov_y: CAMERA_FOV_Y_DEGREES.to_radians(),
            near: 0.1,
            far: 200.0,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn view_proj(&self, viewport: Viewport) -> Mat4 {
        self.projection(viewport.aspect()) * self.view()
    }

    /// Ray from the eye through a point in view coordinates
    pub fn ray_through(&self, point: Vec2, viewport: Viewport) -> Ray {
        let ndc = Vec2::new(
            2.0 * point.x / viewport.width - 1.0,
            1.0 - 2.0 * point.y / viewport.height,
        );
        let inv = self.view_proj(viewport).inverse();
        // Depth range is [0, 1]
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray {
            origin: near,
            direction: (far - near).normalize_or(-Vec3::Z),
        }
    }

    /// Screen position and view depth of a world point, `None` if behind the camera
    pub fn project(&self, world: Vec3, viewport: Viewport) -> Option<(Vec2, f32)> {
        let clip = self.view_proj(viewport) * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width,
            (1.0 - ndc.y) * 0.5 * viewport.height,
        );
        Some((screen, clip.w))
    }

    /// Pixels per world unit for an object `depth` units in front of the camera
    pub fn pixels_per_unit(&self, depth: f32, viewport: Viewport) -> f32 {
        viewport.height / (2.0 * (self.fov_y / 2.0).tan() * depth.max(self.near))
    }
}
