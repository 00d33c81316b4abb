//! Rigid-body physics behind an engine-agnostic trait
//!
//! `PhysicsEngine` is the boundary the rest of the game talks to: attach and
//! detach bodies, push them with impulses, step the world and collect
//! begin-contact events. `PhysicsWorld` is the built-in implementation:
//! translational bodies only (no rotation), semi-implicit Euler, pairwise
//! narrow phase and impulse response.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::collide;

/// Gravity (m/s²)
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);
/// Fraction of velocity lost per second
pub const LINEAR_DAMPING: f32 = 0.1;
/// Overlap allowed before positional correction kicks in
const PENETRATION_SLOP: f32 = 0.005;
/// Share of the remaining overlap corrected per step
const CORRECTION_PERCENT: f32 = 0.8;

/// Stable handle to a physics body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves, infinite mass
    Static,
    /// Integrated every step
    Dynamic,
}

/// Collision shape, positioned at the body origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Sphere { radius: f32 },
    /// Upright cylinder whose center sits `offset_y` above the body origin
    Cylinder {
        radius: f32,
        half_height: f32,
        offset_y: f32,
    },
    /// Everything below the body's Y is solid
    HalfSpace,
}

impl Collider {
    /// Geometric center for a body at `pos`
    pub fn center(&self, pos: Vec3) -> Vec3 {
        match *self {
            Collider::Cylinder { offset_y, .. } => pos + Vec3::Y * offset_y,
            _ => pos,
        }
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub collider: Collider,
    pub mass: f32,
    /// Bounciness (0 = dead stop, 1 = perfectly elastic)
    pub restitution: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Contact classification; `None` means untagged
    pub category: Option<u32>,
}

impl BodyDesc {
    pub fn dynamic(collider: Collider, mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            collider,
            mass,
            restitution: 0.3,
            friction: 0.5,
            category: None,
        }
    }

    pub fn fixed(collider: Collider) -> Self {
        Self {
            kind: BodyKind::Static,
            collider,
            mass: 0.0,
            restitution: 0.2,
            friction: 0.8,
            category: None,
        }
    }

    pub fn with_category(mut self, category: u32) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    fn inverse_mass(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic if self.mass > 0.0 => 1.0 / self.mass,
            _ => 0.0,
        }
    }
}

/// Reported the first step two bodies touch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub category_a: Option<u32>,
    pub category_b: Option<u32>,
    pub point: Vec3,
    /// Normal impulse magnitude applied when the contact began
    pub impulse: f32,
}

/// The interface the game uses to drive a physics engine
pub trait PhysicsEngine {
    /// Attach a new body at `position`
    fn insert(&mut self, desc: BodyDesc, position: Vec3) -> BodyHandle;
    /// Detach a body; returns false if it did not exist
    fn remove(&mut self, handle: BodyHandle) -> bool;
    /// Instantaneous velocity change of `impulse / mass`. Ignored for static or missing bodies.
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3);
    fn position(&self, handle: BodyHandle) -> Option<Vec3>;
    fn velocity(&self, handle: BodyHandle) -> Option<Vec3>;
    fn category(&self, handle: BodyHandle) -> Option<u32>;
    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);
    /// Begin-contact events gathered since the last drain
    fn drain_contacts(&mut self) -> Vec<Contact>;
    fn body_count(&self) -> usize;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RigidBody {
    handle: BodyHandle,
    desc: BodyDesc,
    position: Vec3,
    velocity: Vec3,
}

/// Built-in physics world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsWorld {
    /// Sorted by handle for deterministic iteration
    bodies: Vec<RigidBody>,
    /// Pairs (lower handle first) touching after the last step
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
    contacts: Vec<Contact>,
    gravity: Vec3,
    next_handle: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            touching: BTreeSet::new(),
            contacts: Vec::new(),
            gravity: GRAVITY,
            next_handle: 1,
        }
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |b| b.handle).ok()
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let i = self.index_of(handle)?;
        Some(&self.bodies[i])
    }

    /// Resolve one pair; returns the normal impulse if the pair touches
    fn resolve_pair(&mut self, i: usize, j: usize) -> Option<(f32, Vec3)> {
        let (a, b) = (&self.bodies[i], &self.bodies[j]);
        let inv_a = a.desc.inverse_mass();
        let inv_b = b.desc.inverse_mass();
        let inv_sum = inv_a + inv_b;
        if inv_sum <= 0.0 {
            return None;
        }

        let result = collide(&a.desc.collider, a.position, &b.desc.collider, b.position);
        if !result.hit {
            return None;
        }
        let normal = result.normal;

        // Impulse along the normal, only while approaching
        let relative = b.velocity - a.velocity;
        let approach = relative.dot(normal);
        let mut impulse = 0.0;
        let mut delta_a = Vec3::ZERO;
        let mut delta_b = Vec3::ZERO;
        if approach < 0.0 {
            let restitution = a.desc.restitution.min(b.desc.restitution);
            impulse = -(1.0 + restitution) * approach / inv_sum;
            delta_a -= normal * impulse * inv_a;
            delta_b += normal * impulse * inv_b;

            // Coulomb friction on the tangential slip
            let tangential = relative - normal * approach;
            let friction = (a.desc.friction * b.desc.friction).sqrt();
            let tangent_impulse = (tangential / inv_sum).clamp_length_max(friction * impulse);
            delta_a += tangent_impulse * inv_a;
            delta_b -= tangent_impulse * inv_b;
        }

        // Push overlapping bodies apart
        let depth = (result.penetration - PENETRATION_SLOP).max(0.0);
        let correction = normal * (depth * CORRECTION_PERCENT / inv_sum);

        let a = &mut self.bodies[i];
        a.velocity += delta_a;
        a.position -= correction * inv_a;
        let b = &mut self.bodies[j];
        b.velocity += delta_b;
        b.position += correction * inv_b;

        Some((impulse, result.point))
    }
}

impl PhysicsEngine for PhysicsWorld {
    fn insert(&mut self, desc: BodyDesc, position: Vec3) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.push(RigidBody {
            handle,
            desc,
            position,
            velocity: Vec3::ZERO,
        });
        handle
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        let Some(i) = self.index_of(handle) else {
            return false;
        };
        self.bodies.remove(i);
        self.touching.retain(|&(a, b)| a != handle && b != handle);
        true
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        let Some(i) = self.index_of(handle) else {
            return;
        };
        let body = &mut self.bodies[i];
        body.velocity += impulse * body.desc.inverse_mass();
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| b.velocity)
    }

    fn category(&self, handle: BodyHandle) -> Option<u32> {
        self.body(handle).and_then(|b| b.desc.category)
    }

    fn step(&mut self, dt: f32) {
        let damping = (1.0 - LINEAR_DAMPING * dt).max(0.0);
        for body in &mut self.bodies {
            if body.desc.kind == BodyKind::Dynamic {
                body.velocity = (body.velocity + self.gravity * dt) * damping;
                body.position += body.velocity * dt;
            }
        }

        let mut now_touching = BTreeSet::new();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let Some((impulse, point)) = self.resolve_pair(i, j) else {
                    continue;
                };
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                let key = (a.handle, b.handle);
                if !self.touching.contains(&key) {
                    log::debug!(
                        "Contact began {:?}/{:?} impulse {:.3}",
                        a.handle,
                        b.handle,
                        impulse
                    );
                    self.contacts.push(Contact {
                        a: a.handle,
                        b: b.handle,
                        category_a: a.desc.category,
                        category_b: b.desc.category,
                        point,
                        impulse,
                    });
                }
                now_touching.insert(key);
            }
        }
        self.touching = now_touching;
    }

    fn drain_contacts(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.contacts)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
