//! Narrow-phase collision tests between simple colliders
//!
//! Every test reports the normal pointing from the first shape toward the
//! second, so the response code can push the pair apart along it.

use glam::{Vec2, Vec3};

use super::physics::Collider;

/// Bodies closer than this count as touching even without overlap
pub const CONTACT_MARGIN: f32 = 0.01;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the shapes touch (overlap or within `CONTACT_MARGIN`)
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec3,
    /// Unit normal from the first shape toward the second
    pub normal: Vec3,
    /// Overlap depth, negative while only within the margin
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            penetration: 0.0,
        }
    }

    fn touching(point: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            hit: penetration > -CONTACT_MARGIN,
            point,
            normal,
            penetration,
        }
    }

    /// Same contact seen from the other shape
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Collide two placed colliders; the normal points from `a` toward `b`
pub fn collide(a: &Collider, a_pos: Vec3, b: &Collider, b_pos: Vec3) -> CollisionResult {
    match (*a, *b) {
        (Collider::Sphere { radius: ra }, Collider::Sphere { radius: rb }) => {
            sphere_sphere(a_pos, ra, b_pos, rb)
        }
        (Collider::Sphere { radius }, Collider::Cylinder { .. }) => {
            sphere_cylinder(a_pos, radius, b.center(b_pos), b)
        }
        (Collider::Cylinder { .. }, Collider::Sphere { radius }) => {
            sphere_cylinder(b_pos, radius, a.center(a_pos), a).flipped()
        }
        (Collider::Cylinder { .. }, Collider::Cylinder { .. }) => {
            cylinder_cylinder(a.center(a_pos), a, b.center(b_pos), b)
        }
        (Collider::HalfSpace, Collider::HalfSpace) => CollisionResult::miss(),
        (Collider::HalfSpace, _) => floor_contact(a_pos.y, b, b_pos),
        (_, Collider::HalfSpace) => floor_contact(b_pos.y, a, a_pos).flipped(),
    }
}

/// Sphere against sphere
pub fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32) -> CollisionResult {
    let delta = pb - pa;
    let dist = delta.length();
    let penetration = ra + rb - dist;
    if penetration <= -CONTACT_MARGIN {
        return CollisionResult::miss();
    }
    // Coincident centers: separate upward
    let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
    CollisionResult::touching(pa + normal * ra, normal, penetration)
}

/// Sphere against an upright cylinder centered at `center`
pub fn sphere_cylinder(
    sphere: Vec3,
    radius: f32,
    center: Vec3,
    cylinder: &Collider,
) -> CollisionResult {
    let Collider::Cylinder {
        radius: cyl_radius,
        half_height,
        ..
    } = *cylinder
    else {
        return CollisionResult::miss();
    };

    let local = sphere - center;
    let horizontal = Vec2::new(local.x, local.z);
    let horizontal_dist = horizontal.length();
    let inside_radially = horizontal_dist < cyl_radius;
    let inside_vertically = local.y.abs() < half_height;

    if inside_radially && inside_vertically {
        // Center is inside: leave through the nearest face
        let side_depth = cyl_radius - horizontal_dist;
        let cap_depth = half_height - local.y.abs();
        let (normal, depth) = if side_depth < cap_depth {
            let dir = if horizontal_dist > 1e-6 {
                horizontal / horizontal_dist
            } else {
                Vec2::X
            };
            (Vec3::new(dir.x, 0.0, dir.y), side_depth)
        } else {
            (Vec3::new(0.0, local.y.signum(), 0.0), cap_depth)
        };
        // Normal points from the sphere toward the cylinder
        return CollisionResult::touching(sphere, -normal, depth + radius);
    }

    // Closest point on the cylinder surface
    let clamped_h = if horizontal_dist > cyl_radius {
        horizontal * (cyl_radius / horizontal_dist)
    } else {
        horizontal
    };
    let closest = center
        + Vec3::new(
            clamped_h.x,
            local.y.clamp(-half_height, half_height),
            clamped_h.y,
        );

    let delta = closest - sphere;
    let dist = delta.length();
    let penetration = radius - dist;
    if penetration <= -CONTACT_MARGIN || dist < 1e-6 {
        return CollisionResult::miss();
    }
    CollisionResult::touching(closest, delta / dist, penetration)
}

/// Upright cylinder against upright cylinder
pub fn cylinder_cylinder(ca: Vec3, a: &Collider, cb: Vec3, b: &Collider) -> CollisionResult {
    let (
        Collider::Cylinder {
            radius: ra,
            half_height: ha,
            ..
        },
        Collider::Cylinder {
            radius: rb,
            half_height: hb,
            ..
        },
    ) = (*a, *b)
    else {
        return CollisionResult::miss();
    };

    let vertical_overlap = (ha + hb) - (cb.y - ca.y).abs();
    let horizontal = Vec2::new(cb.x - ca.x, cb.z - ca.z);
    let dist = horizontal.length();
    let radial_overlap = ra + rb - dist;

    if vertical_overlap <= -CONTACT_MARGIN || radial_overlap <= -CONTACT_MARGIN {
        return CollisionResult::miss();
    }

    if radial_overlap < vertical_overlap {
        let dir = if dist > 1e-6 { horizontal / dist } else { Vec2::X };
        let normal = Vec3::new(dir.x, 0.0, dir.y);
        let mid_y = (ca.y + cb.y) / 2.0;
        let point = Vec3::new(ca.x + dir.x * ra, mid_y, ca.z + dir.y * ra);
        CollisionResult::touching(point, normal, radial_overlap)
    } else {
        let normal = Vec3::new(0.0, (cb.y - ca.y).signum(), 0.0);
        let point = (ca + cb) / 2.0;
        CollisionResult::touching(point, normal, vertical_overlap)
    }
}

/// Horizontal floor at `floor_y` against any finite collider; normal is +Y
pub fn floor_contact(floor_y: f32, collider: &Collider, pos: Vec3) -> CollisionResult {
    let bottom = match *collider {
        Collider::Sphere { radius } => pos.y - radius,
        Collider::Cylinder { half_height, .. } => collider.center(pos).y - half_height,
        Collider::HalfSpace => return CollisionResult::miss(),
    };
    let penetration = floor_y - bottom;
    if penetration <= -CONTACT_MARGIN {
        return CollisionResult::miss();
    }
    CollisionResult::touching(Vec3::new(pos.x, floor_y, pos.z), Vec3::Y, penetration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Collider {
        Collider::Cylinder {
            radius: 0.5,
            half_height: 1.0,
            offset_y: 0.25,
        }
    }

    #[test]
    fn test_sphere_sphere_overlap() {
        let result = sphere_sphere(Vec3::ZERO, 0.25, Vec3::new(0.4, 0.0, 0.0), 0.25);
        assert!(result.hit);
        assert!((result.normal - Vec3::X).length() < 1e-6);
        assert!((result.penetration - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_sphere_apart() {
        let result = sphere_sphere(Vec3::ZERO, 0.25, Vec3::new(2.0, 0.0, 0.0), 0.25);
        assert!(!result.hit);
    }

    #[test]
    fn test_ball_hits_tree_side() {
        let collider = tree();
        // Ball approaching the tree from +Z (the camera side)
        let result = collide(
            &Collider::Sphere { radius: 0.25 },
            Vec3::new(0.0, 0.0, 0.7),
            &collider,
            Vec3::new(0.0, -1.0, 0.0),
        );
        assert!(result.hit);
        // Normal from ball toward tree points into the scene
        assert!(result.normal.z < -0.99);
    }

    #[test]
    fn test_tree_ball_order_flips_normal() {
        let collider = tree();
        let ball = Collider::Sphere { radius: 0.25 };
        let ab = collide(&ball, Vec3::new(0.0, 0.0, 0.7), &collider, Vec3::new(0.0, -1.0, 0.0));
        let ba = collide(&collider, Vec3::new(0.0, -1.0, 0.0), &ball, Vec3::new(0.0, 0.0, 0.7));
        assert!((ab.normal + ba.normal).length() < 1e-6);
        assert!((ab.penetration - ba.penetration).abs() < 1e-6);
    }

    #[test]
    fn test_neighbouring_trees_do_not_touch() {
        let collider = tree();
        let result = collide(
            &collider,
            Vec3::new(0.0, -1.0, 0.0),
            &collider,
            Vec3::new(2.5, -1.0, 0.0),
        );
        assert!(!result.hit);
    }

    #[test]
    fn test_trees_side_by_side_push_horizontally() {
        let collider = tree();
        let result = collide(
            &collider,
            Vec3::new(0.0, -1.0, 0.0),
            &collider,
            Vec3::new(0.8, -1.0, 0.0),
        );
        assert!(result.hit);
        assert!((result.normal - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_floor_contact_normal_points_up() {
        let result = collide(
            &Collider::HalfSpace,
            Vec3::new(0.0, -1.0, 0.0),
            &Collider::Sphere { radius: 0.25 },
            Vec3::new(1.0, -0.8, 0.0),
        );
        assert!(result.hit);
        assert_eq!(result.normal, Vec3::Y);
        assert!((result.penetration - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_inside_cylinder_is_pushed_out() {
        let collider = tree();
        let result = collide(
            &Collider::Sphere { radius: 0.25 },
            Vec3::new(0.3, -0.75, 0.0),
            &collider,
            Vec3::new(0.0, -1.0, 0.0),
        );
        assert!(result.hit);
        assert!(result.penetration > 0.25);
        // Ball should move out through the +X side, so the normal toward the tree is -X
        assert!(result.normal.x < -0.99);
    }
}
