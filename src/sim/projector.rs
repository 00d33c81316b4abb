//! Touch-to-3D projection and stylus launch direction

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::{Camera, NodeContent, NodeId, Primitive, Scene, Viewport};

/// What produced a touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    /// Finger
    Direct,
    Stylus,
    Mouse,
}

/// One sample of a touch/stylus/mouse pointer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    /// View coordinates (pixels, origin top-left)
    pub location: Vec2,
    pub kind: PointerKind,
    /// 0 = parallel to the screen, π/2 = perpendicular
    pub altitude: f32,
    /// Unit vector in view coordinates the stylus points along
    pub azimuth: Vec2,
}

impl TouchSample {
    /// A finger or mouse sample: reported as perpendicular to the screen
    pub fn pointer(location: Vec2, kind: PointerKind) -> Self {
        Self {
            location,
            kind,
            altitude: FRAC_PI_2,
            azimuth: Vec2::X,
        }
    }

    pub fn stylus(location: Vec2, altitude: f32, azimuth: Vec2) -> Self {
        Self {
            location,
            kind: PointerKind::Stylus,
            altitude,
            azimuth: azimuth.normalize_or(Vec2::X),
        }
    }
}

/// Launch impulse from stylus orientation:
/// the flatter the stylus, the more the ball leaves the straight-ahead line.
pub fn launch_vector(altitude: f32, azimuth: Vec2, velocity: f32) -> Vec3 {
    let altitude_factor = (FRAC_PI_2 - altitude) / FRAC_PI_2;
    let dir_x = -azimuth.x * altitude_factor;
    let dir_y = azimuth.y * altitude_factor;
    let dir_z = 1.0 - (dir_x * dir_x + dir_y * dir_y).sqrt();
    Vec3::new(dir_x, dir_y, -dir_z) * velocity
}

/// Convert W3C pointer tilt (degrees) into altitude and azimuth unit vector
pub fn tilt_to_angles(tilt_x: f32, tilt_y: f32) -> (f32, Vec2) {
    if tilt_x == 0.0 && tilt_y == 0.0 {
        return (FRAC_PI_2, Vec2::X);
    }
    // ±90° would be infinite tangents
    let tx = tilt_x.clamp(-89.9, 89.9).to_radians().tan();
    let ty = tilt_y.clamp(-89.9, 89.9).to_radians().tan();
    let altitude = (1.0 / (tx * tx + ty * ty).sqrt()).atan();
    let azimuth = ty.atan2(tx);
    (altitude, Vec2::new(azimuth.cos(), azimuth.sin()))
}

/// World position where a touch meets the catcher plane.
///
/// `None` when the ray misses the plane's extents (or the catcher is not a
/// plane); callers treat that as a touch outside the interactive region.
pub fn project_touch(
    scene: &Scene,
    camera: &Camera,
    viewport: Viewport,
    catcher: NodeId,
    location: Vec2,
) -> Option<Vec3> {
    let node = scene.get(catcher)?;
    let NodeContent::Geometry {
        primitive: Primitive::Plane { width, height },
        ..
    } = node.content
    else {
        return None;
    };

    let world = scene.world_transform(catcher)?;
    let origin = world.transform_point3(Vec3::ZERO);
    let normal = world.transform_vector3(Vec3::Z).normalize_or_zero();

    let ray = camera.ray_through(location, viewport);
    let t = ray.intersect_plane(origin, normal)?;
    let hit = ray.at(t);

    let local = world.inverse().transform_point3(hit);
    if local.x.abs() > width / 2.0 || local.y.abs() > height / 2.0 {
        return None;
    }
    Some(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Node};
    use proptest::prelude::*;

    const V: f32 = 40.0;

    #[test]
    fn test_perpendicular_stylus_launches_straight_ahead() {
        for azimuth in [Vec2::X, Vec2::Y, Vec2::new(-0.6, 0.8)] {
            let v = launch_vector(FRAC_PI_2, azimuth, V);
            assert!((v - Vec3::new(0.0, 0.0, -V)).length() < 1e-4);
        }
    }

    #[test]
    fn test_flat_stylus_launches_in_screen_plane() {
        // altitude 0: factor 1, so the in-plane components use the whole unit
        // vector and nothing is left for depth
        let azimuth = Vec2::new(0.6, 0.8);
        let v = launch_vector(0.0, azimuth, V);
        assert!((v - Vec3::new(-0.6 * V, 0.8 * V, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_half_tilt() {
        let v = launch_vector(FRAC_PI_2 / 2.0, Vec2::X, 1.0);
        assert!((v - Vec3::new(-0.5, 0.0, -0.5)).length() < 1e-5);
    }

    #[test]
    fn test_untilted_pointer_is_perpendicular() {
        let (altitude, _) = tilt_to_angles(0.0, 0.0);
        assert_eq!(altitude, FRAC_PI_2);
    }

    #[test]
    fn test_tilt_conversion() {
        // Tilted 45° toward +X
        let (altitude, azimuth) = tilt_to_angles(45.0, 0.0);
        assert!((altitude - FRAC_PI_2 / 2.0).abs() < 1e-4);
        assert!((azimuth - Vec2::X).length() < 1e-5);

        // Tilted toward +Y (down the screen)
        let (_, azimuth) = tilt_to_angles(0.0, 30.0);
        assert!((azimuth - Vec2::Y).length() < 1e-5);
    }

    fn catcher_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let catcher = scene.add_child(
            Scene::ROOT,
            Node::geometry(
                "catcher",
                Primitive::Plane {
                    width: 20.0,
                    height: 20.0,
                },
                Material::INVISIBLE,
            )
            .at(Vec3::new(0.0, 0.0, 5.0))
            .hidden(),
        );
        (scene, catcher)
    }

    #[test]
    fn test_center_touch_hits_catcher_in_front_of_camera() {
        let (scene, catcher) = catcher_scene();
        let viewport = Viewport::new(1024.0, 768.0);
        let hit = project_touch(
            &scene,
            &Camera::default(),
            viewport,
            catcher,
            Vec2::new(512.0, 384.0),
        )
        .unwrap();
        assert!((hit - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-3);
    }

    #[test]
    fn test_touch_maps_screen_right_to_world_right() {
        let (scene, catcher) = catcher_scene();
        let viewport = Viewport::new(1024.0, 768.0);
        let hit = project_touch(
            &scene,
            &Camera::default(),
            viewport,
            catcher,
            Vec2::new(900.0, 100.0),
        )
        .unwrap();
        assert!(hit.x > 0.0);
        assert!(hit.y > 0.0);
        assert!((hit.z - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_small_catcher_can_be_missed() {
        let (mut scene, catcher) = catcher_scene();
        if let Some(node) = scene.get_mut(catcher) {
            node.content = NodeContent::Geometry {
                primitive: Primitive::Plane {
                    width: 0.1,
                    height: 0.1,
                },
                material: Material::INVISIBLE,
            };
        }
        let viewport = Viewport::new(1024.0, 768.0);
        let miss = project_touch(
            &scene,
            &Camera::default(),
            viewport,
            catcher,
            Vec2::new(10.0, 10.0),
        );
        assert!(miss.is_none());
    }

    #[test]
    fn test_non_plane_catcher_never_hits() {
        let mut scene = Scene::new();
        let sphere = scene.add_child(
            Scene::ROOT,
            Node::geometry("ball", Primitive::Sphere { radius: 1.0 }, Material::BALL),
        );
        let viewport = Viewport::new(100.0, 100.0);
        assert!(
            project_touch(&scene, &Camera::default(), viewport, sphere, Vec2::splat(50.0))
                .is_none()
        );
    }

    proptest! {
        #[test]
        fn prop_launch_speed_bounded(
            altitude in 0.0f32..FRAC_PI_2,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let azimuth = Vec2::new(angle.cos(), angle.sin());
            let v = launch_vector(altitude, azimuth, V);
            // Never launches back toward the camera
            prop_assert!(v.z <= 1e-4);
            prop_assert!(v.length() <= V * 1.0001);
            prop_assert!(v.length() >= V * std::f32::consts::FRAC_1_SQRT_2 * 0.999);
        }
    }
}
