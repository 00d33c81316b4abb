//! Triangular "bowling pin" layout of trees
//!
//! Row `z` (counted from the front) holds `z + 1` trees, centered on X and
//! pushed `spacing` further back per row.

use glam::Vec3;

use super::physics::{BodyDesc, PhysicsEngine};
use crate::category;
use crate::consts::{FORMATION_Y, TREE_MASS};
use crate::scene::assembler::prefab_collider;
use crate::scene::{NodeId, Prefab, Scene};

/// Number of slots for `rows` (rows are counted from zero, inclusive)
pub fn slot_count(rows: u32) -> usize {
    let n = rows as usize + 1;
    n * (n + 1) / 2
}

/// Slot positions ordered front row first, left to right
pub fn formation_positions(rows: u32, spacing: f32) -> Vec<Vec3> {
    let mut positions = Vec::with_capacity(slot_count(rows));
    for z in 0..=rows {
        for x in 0..=z {
            positions.push(Vec3::new(
                (-spacing * z as f32 / 2.0) + x as f32 * spacing,
                FORMATION_Y,
                -(z as f32) * spacing,
            ));
        }
    }
    positions
}

/// Remove every placed tree (nodes and bodies), then place a fresh clone of
/// `prefab` with a dynamic body in each slot. Returns the number placed.
pub fn reset_formation(
    scene: &mut Scene,
    physics: &mut impl PhysicsEngine,
    prefab: &Prefab,
    trees: &mut Vec<NodeId>,
    rows: u32,
    spacing: f32,
) -> usize {
    for tree in trees.drain(..) {
        for node in scene.remove_subtree(tree) {
            if let Some(body) = node.body {
                physics.remove(body);
            }
        }
    }

    let collider = prefab_collider(prefab);
    for position in formation_positions(rows, spacing) {
        let node = scene.instantiate(prefab, Scene::ROOT, position);
        let body = physics.insert(
            BodyDesc::dynamic(collider, TREE_MASS).with_category(category::TREE),
            position,
        );
        if let Some(record) = scene.get_mut(node) {
            record.body = Some(body);
        }
        trees.push(node);
    }

    log::info!("Formation reset: {} trees in {} rows", trees.len(), rows + 1);
    trees.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tree_prefab;
    use crate::sim::physics::PhysicsWorld;
    use proptest::prelude::*;

    #[test]
    fn test_two_rows_gives_six_slots() {
        let positions = formation_positions(2, 2.5);
        assert_eq!(positions.len(), 6);

        let expected = [
            (0, 0),
            (1, 0),
            (1, 1),
            (2, 0),
            (2, 1),
            (2, 2),
        ];
        for (pos, (z, x)) in positions.iter().zip(expected) {
            let want = Vec3::new(
                -2.5 * z as f32 / 2.0 + x as f32 * 2.5,
                -1.0,
                -(z as f32) * 2.5,
            );
            assert!((*pos - want).length() < 1e-6, "{pos} != {want}");
        }
    }

    #[test]
    fn test_front_slot_is_centered() {
        let positions = formation_positions(6, 2.5);
        assert_eq!(positions[0], Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(positions.len(), 28);
    }

    #[test]
    fn test_reset_replaces_previous_trees() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let prefab = tree_prefab(false);
        let mut trees = Vec::new();

        let first = reset_formation(&mut scene, &mut physics, &prefab, &mut trees, 2, 2.5);
        let first_ids = trees.clone();
        let nodes_after_first = scene.len();

        let second = reset_formation(&mut scene, &mut physics, &prefab, &mut trees, 2, 2.5);
        assert_eq!(first, 6);
        assert_eq!(second, 6);
        assert_eq!(physics.body_count(), 6);
        assert_eq!(scene.len(), nodes_after_first);
        assert!(first_ids.iter().all(|id| !scene.contains(*id)));
    }

    #[test]
    fn test_reset_tags_trees() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let mut trees = Vec::new();
        reset_formation(&mut scene, &mut physics, &tree_prefab(true), &mut trees, 1, 2.5);

        for tree in &trees {
            let body = scene.get(*tree).and_then(|n| n.body).unwrap();
            assert_eq!(physics.category(body), Some(category::TREE));
        }
    }

    proptest! {
        #[test]
        fn prop_slot_count_matches_positions(rows in 0u32..20, spacing in 0.5f32..5.0) {
            let positions = formation_positions(rows, spacing);
            prop_assert_eq!(positions.len(), slot_count(rows));
            // Every row is symmetric about X = 0
            let sum_x: f32 = positions.iter().map(|p| p.x).sum();
            prop_assert!(sum_x.abs() < 1e-2 * positions.len() as f32);
        }

        #[test]
        fn prop_reset_is_count_idempotent(rows in 0u32..6, resets in 1usize..4) {
            let mut scene = Scene::new();
            let mut physics = PhysicsWorld::new();
            let prefab = tree_prefab(false);
            let mut trees = Vec::new();
            let mut counts = Vec::new();
            for _ in 0..resets {
                counts.push(reset_formation(
                    &mut scene,
                    &mut physics,
                    &prefab,
                    &mut trees,
                    rows,
                    2.5,
                ));
            }
            prop_assert!(counts.iter().all(|&c| c == slot_count(rows)));
            prop_assert_eq!(physics.body_count(), slot_count(rows));
        }
    }
}
