//! Builds the static scene once at startup

use glam::Vec3;

use super::geometry::{Material, Part, Prefab, Primitive};
use super::{Camera, Light, LightKind, Node, NodeContent, NodeId, Scene};
use crate::category;
use crate::consts::*;
use crate::sim::physics::{BodyDesc, Collider, PhysicsEngine};

/// Ids of the nodes the game needs to reach after assembly
#[derive(Debug, Clone)]
pub struct SceneHandles {
    pub camera: NodeId,
    pub floor: NodeId,
    pub emitter: NodeId,
    pub ball: NodeId,
    pub pointer: NodeId,
    pub catcher: NodeId,
    /// Template cloned for every tree slot
    pub tree: Prefab,
}

/// Half-length of the aim pointer
pub const POINTER_LENGTH: f32 = 1.0;

/// Tree template: cone on a trunk, with an optional ornament on the cone
pub fn tree_prefab(with_ornament: bool) -> Prefab {
    let mut parts = vec![
        Part::new(
            Primitive::Cone {
                top_radius: 0.0,
                bottom_radius: 0.5,
                height: 1.5,
            },
            Material::PINE,
            Vec3::new(0.0, 0.5, 0.0),
        ),
        Part::new(
            Primitive::Cylinder {
                radius: 0.25,
                height: 0.5,
            },
            Material::BARK,
            Vec3::new(0.0, -0.5, 0.0),
        ),
    ];
    if with_ornament {
        // Sits on the camera-facing side of the cone, a third of the way up
        parts.push(Part::new(
            Primitive::Sphere { radius: 0.1 },
            Material::ORNAMENT,
            Vec3::new(0.0, 0.3, 0.35),
        ));
    }
    Prefab {
        name: "tree".into(),
        parts,
    }
}

/// Physics shape enclosing a prefab: an upright cylinder around all parts
pub fn prefab_collider(prefab: &Prefab) -> Collider {
    let (lo, hi) = prefab.vertical_extent();
    Collider::Cylinder {
        radius: prefab.max_radius(),
        half_height: (hi - lo) / 2.0,
        offset_y: (hi + lo) / 2.0,
    }
}

/// Populate an empty scene: camera, lights, snow field, emitter, ball,
/// pointer and the invisible touch catcher. Trees are placed separately.
pub fn assemble(
    scene: &mut Scene,
    physics: &mut impl PhysicsEngine,
    with_ornaments: bool,
) -> SceneHandles {
    let camera = scene.add_child(
        Scene::ROOT,
        Node::new("camera", NodeContent::Camera(Camera::default()))
            .at(Vec3::from(CAMERA_POSITION)),
    );

    for (i, position) in [Vec3::new(-10.0, 0.0, 10.0), Vec3::new(10.0, 10.0, -10.0)]
        .into_iter()
        .enumerate()
    {
        scene.add_child(
            Scene::ROOT,
            Node::new(
                format!("omni.{i}"),
                NodeContent::Light(Light {
                    kind: LightKind::Omni,
                    intensity: 1.0,
                }),
            )
            .at(position),
        );
    }
    scene.add_child(
        Scene::ROOT,
        Node::new(
            "ambient",
            NodeContent::Light(Light {
                kind: LightKind::Ambient,
                intensity: 0.3,
            }),
        ),
    );

    // Snow field
    let floor = scene.add_child(
        Scene::ROOT,
        Node::geometry("snow_field", Primitive::Floor, Material::SNOW)
            .at(Vec3::new(0.0, FLOOR_Y, 0.0)),
    );
    let floor_body = physics.insert(
        BodyDesc::fixed(Collider::HalfSpace).with_category(category::SNOW_FIELD),
        Vec3::new(0.0, FLOOR_Y, 0.0),
    );
    if let Some(node) = scene.get_mut(floor) {
        node.body = Some(floor_body);
    }

    // Snow falls over the whole formation
    let emitter = scene.add_child(
        Scene::ROOT,
        Node::new(
            "snow_emitter",
            NodeContent::Emitter {
                half_extents: Vec3::new(12.0, 0.5, 12.0),
            },
        )
        .at(Vec3::new(0.0, 8.0, -7.0)),
    );

    let ball = scene.add_child(
        Scene::ROOT,
        Node::geometry(
            "ball",
            Primitive::Sphere {
                radius: BALL_RADIUS,
            },
            Material::BALL,
        )
        .at(Vec3::from(BALL_REST_POSITION)),
    );

    let pointer = scene.add_child(
        Scene::ROOT,
        Node::geometry(
            "pointer",
            Primitive::Cylinder {
                radius: 0.02,
                height: POINTER_LENGTH * 2.0,
            },
            Material::POINTER,
        )
        .hidden(),
    );

    let catcher = scene.add_child(
        Scene::ROOT,
        Node::geometry(
            "touch_catcher",
            Primitive::Plane {
                width: CATCHER_SIZE,
                height: CATCHER_SIZE,
            },
            Material::INVISIBLE,
        )
        .at(Vec3::new(0.0, 0.0, CATCHER_Z))
        .hidden(),
    );

    log::info!("Scene assembled with {} nodes", scene.len());

    SceneHandles {
        camera,
        floor,
        emitter,
        ball,
        pointer,
        catcher,
        tree: tree_prefab(with_ornaments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PhysicsWorld;

    #[test]
    fn test_tree_collider_encloses_template() {
        let collider = prefab_collider(&tree_prefab(true));
        let Collider::Cylinder {
            radius,
            half_height,
            offset_y,
        } = collider
        else {
            panic!("expected cylinder");
        };
        assert!((radius - 0.5).abs() < 1e-6);
        // Trunk bottom at -0.75, cone apex at 1.25
        assert!((half_height - 1.0).abs() < 1e-6);
        assert!((offset_y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_assemble_attaches_only_the_floor_body() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let handles = assemble(&mut scene, &mut physics, true);

        assert_eq!(physics.body_count(), 1);
        let floor_body = scene.get(handles.floor).and_then(|n| n.body).unwrap();
        assert_eq!(physics.category(floor_body), Some(category::SNOW_FIELD));

        // Ball waits without physics, catcher and pointer are never drawn
        assert!(scene.get(handles.ball).unwrap().body.is_none());
        assert!(scene.is_hidden(handles.catcher));
        assert!(scene.is_hidden(handles.pointer));
        assert_eq!(handles.tree.parts.len(), 3);
    }
}
