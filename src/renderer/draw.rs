//! Flattening the scene into screen-space shapes
//!
//! Each visible primitive becomes one silhouette: spheres as circles, cones
//! and cylinders as quads around their projected axis, planes as their
//! projected corners. Shapes are flat-shaded and painted back to front.

use glam::{Mat4, Vec2, Vec3};

use crate::scene::{Camera, LightKind, Material, NodeContent, Primitive, Scene, Viewport};
use crate::sim::Flake;

/// Half-size of the drawn snow field
const FLOOR_EXTENT: f32 = 40.0;
/// Snow is drawn slightly see-through
const SNOW_ALPHA: f32 = 0.85;

/// Screen-space outline
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    Polygon(Vec<Vec2>),
}

/// One fill operation
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCmd {
    pub shape: Shape,
    /// Linear RGBA
    pub color: [f32; 4],
    /// Distance from the camera; larger is painted first
    pub depth: f32,
}

impl DrawCmd {
    /// CSS color string for canvas fills
    pub fn css_color(&self) -> String {
        let [r, g, b, a] = self.color;
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("rgba({}, {}, {}, {:.3})", channel(r), channel(g), channel(b), a.clamp(0.0, 1.0))
    }
}

/// Omni lights and total ambient light in the scene
struct Lighting {
    omni: Vec<(Vec3, f32)>,
    ambient: f32,
}

impl Lighting {
    fn gather(scene: &Scene) -> Self {
        let mut omni = Vec::new();
        let mut ambient = 0.0;
        for node in scene.iter() {
            let NodeContent::Light(light) = node.content else {
                continue;
            };
            match light.kind {
                LightKind::Ambient => ambient += light.intensity,
                LightKind::Omni => {
                    if let Some(position) = scene.world_position(node.id) {
                        omni.push((position, light.intensity));
                    }
                }
            }
        }
        Self { omni, ambient }
    }

    /// Lambert shading for a surface at `point` facing `normal`
    fn shade(&self, material: &Material, point: Vec3, normal: Vec3) -> [f32; 4] {
        let diffuse: f32 = self
            .omni
            .iter()
            .map(|(position, intensity)| {
                let to_light = (*position - point).normalize_or_zero();
                intensity * normal.dot(to_light).max(0.0)
            })
            .sum();
        let level = (self.ambient + diffuse + material.emission).min(1.0);
        let [r, g, b, a] = material.diffuse;
        [r * level, g * level, b * level, a]
    }
}

/// Everything visible, sorted back to front
pub fn draw_list(
    scene: &Scene,
    camera: &Camera,
    viewport: Viewport,
    snow: &[Flake],
) -> Vec<DrawCmd> {
    let lighting = Lighting::gather(scene);
    let mut commands = Vec::new();

    for node in scene.iter() {
        let NodeContent::Geometry {
            primitive,
            material,
        } = node.content
        else {
            continue;
        };
        if material.diffuse[3] <= 0.0 || scene.is_hidden(node.id) {
            continue;
        }
        let Some(world) = scene.world_transform(node.id) else {
            continue;
        };
        if let Some(cmd) =
            primitive_cmd(&primitive, &material, world, camera, viewport, &lighting)
        {
            commands.push(cmd);
        }
    }

    for flake in snow {
        let Some((center, depth)) = camera.project(flake.pos, viewport) else {
            continue;
        };
        commands.push(DrawCmd {
            shape: Shape::Circle {
                center,
                radius: (flake.size * camera.pixels_per_unit(depth, viewport)).max(0.5),
            },
            color: [1.0, 1.0, 1.0, SNOW_ALPHA],
            depth,
        });
    }

    commands.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    commands
}

fn primitive_cmd(
    primitive: &Primitive,
    material: &Material,
    world: Mat4,
    camera: &Camera,
    viewport: Viewport,
    lighting: &Lighting,
) -> Option<DrawCmd> {
    let center = world.transform_point3(Vec3::ZERO);
    let facing = (camera.position - center).normalize_or(Vec3::Z);
    let scale = world.transform_vector3(Vec3::X).length();

    match *primitive {
        Primitive::Sphere { radius } => {
            let (screen, depth) = camera.project(center, viewport)?;
            Some(DrawCmd {
                shape: Shape::Circle {
                    center: screen,
                    radius: radius * scale * camera.pixels_per_unit(depth, viewport),
                },
                color: lighting.shade(material, center, facing),
                depth,
            })
        }
        Primitive::Cone {
            top_radius,
            bottom_radius,
            height,
        } => axial(
            world,
            height,
            top_radius * scale,
            bottom_radius * scale,
            material,
            camera,
            viewport,
            lighting,
        ),
        Primitive::Cylinder { radius, height } => axial(
            world,
            height,
            radius * scale,
            radius * scale,
            material,
            camera,
            viewport,
            lighting,
        ),
        Primitive::Plane { width, height } => {
            let (w, h) = (width / 2.0, height / 2.0);
            let corners = [
                Vec3::new(-w, -h, 0.0),
                Vec3::new(w, -h, 0.0),
                Vec3::new(w, h, 0.0),
                Vec3::new(-w, h, 0.0),
            ];
            let normal = world.transform_vector3(Vec3::Z).normalize_or(Vec3::Z);
            polygon(
                corners.map(|c| world.transform_point3(c)),
                lighting.shade(material, center, normal),
                camera,
                viewport,
            )
        }
        Primitive::Floor => {
            let corners = [
                Vec3::new(-FLOOR_EXTENT, 0.0, camera.position.z - 1.0),
                Vec3::new(FLOOR_EXTENT, 0.0, camera.position.z - 1.0),
                Vec3::new(FLOOR_EXTENT, 0.0, -FLOOR_EXTENT),
                Vec3::new(-FLOOR_EXTENT, 0.0, -FLOOR_EXTENT),
            ];
            let mut cmd = polygon(
                corners.map(|c| world.transform_point3(c)),
                lighting.shade(material, center, Vec3::Y),
                camera,
                viewport,
            )?;
            // Ground is always painted first
            cmd.depth = camera.far;
            Some(cmd)
        }
    }
}

/// Quad (or triangle for a pointed cone) around the projected Y axis
#[allow(clippy::too_many_arguments)]
fn axial(
    world: Mat4,
    height: f32,
    top_radius: f32,
    bottom_radius: f32,
    material: &Material,
    camera: &Camera,
    viewport: Viewport,
    lighting: &Lighting,
) -> Option<DrawCmd> {
    let top = world.transform_point3(Vec3::Y * height / 2.0);
    let bottom = world.transform_point3(Vec3::Y * -height / 2.0);
    let center = (top + bottom) / 2.0;
    let (top_px, top_depth) = camera.project(top, viewport)?;
    let (bottom_px, bottom_depth) = camera.project(bottom, viewport)?;
    let depth = (top_depth + bottom_depth) / 2.0;
    let color = lighting.shade(material, center, (camera.position - center).normalize_or(Vec3::Z));

    let axis = top_px - bottom_px;
    let Some(dir) = axis.try_normalize() else {
        // Looking straight down the axis
        return Some(DrawCmd {
            shape: Shape::Circle {
                center: bottom_px,
                radius: top_radius.max(bottom_radius) * camera.pixels_per_unit(depth, viewport),
            },
            color,
            depth,
        });
    };
    let side = dir.perp();
    let top_half = top_radius * camera.pixels_per_unit(top_depth, viewport);
    let bottom_half = bottom_radius * camera.pixels_per_unit(bottom_depth, viewport);

    let mut points = vec![bottom_px - side * bottom_half, bottom_px + side * bottom_half];
    if top_half > 0.0 {
        points.push(top_px + side * top_half);
        points.push(top_px - side * top_half);
    } else {
        points.push(top_px);
    }
    Some(DrawCmd {
        shape: Shape::Polygon(points),
        color,
        depth,
    })
}

/// Projected polygon; `None` if any corner is behind the camera
fn polygon(
    corners: [Vec3; 4],
    color: [f32; 4],
    camera: &Camera,
    viewport: Viewport,
) -> Option<DrawCmd> {
    let mut points = Vec::with_capacity(corners.len());
    let mut depth = 0.0;
    for corner in corners {
        let (screen, d) = camera.project(corner, viewport)?;
        points.push(screen);
        depth += d / corners.len() as f32;
    }
    Some(DrawCmd {
        shape: Shape::Polygon(points),
        color,
        depth,
    })
}
