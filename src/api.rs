use glam::Vec2;

use crate::collider::Collider;
use crate::error::ColliderError;
use crate::types::*;

/// Public API contract for the grid-partitioned collision world.
pub trait CollisionWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Result<Self, ColliderError>
    where
        Self: Sized;

    // --- Collider lifecycle ------------------------------------------------

    /// Create a collider centered at (x, y), register it and queue it for the next step.
    fn create_collider(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<ColliderId, ColliderError>;

    /// Unlink a collider from the grid and from every partner's hit list.
    fn remove_collider(&mut self, id: ColliderId) -> Result<Collider, ColliderError>;

    fn collider(&self, id: ColliderId) -> Option<&Collider>;

    fn collider_mut(&mut self, id: ColliderId) -> Option<&mut Collider>;

    // --- Motion ------------------------------------------------------------

    /// Request a move to (x, y); applied by the next `step`.
    fn move_to(&mut self, id: ColliderId, x: f32, y: f32) -> Result<(), ColliderError>;

    fn resize(&mut self, id: ColliderId, width: f32, height: f32) -> Result<(), ColliderError>;

    // --- Step --------------------------------------------------------------

    /// Run detection for every queued collider, then return them to resting.
    fn step(&mut self);

    /// Drain and return the events recorded since the last drain.
    fn drain_events(&mut self) -> Vec<CollisionEvent>;

    // --- Queries -----------------------------------------------------------

    fn query_point(&self, p: Vec2) -> Vec<ColliderId>;

    fn query_aabb(&self, center: Vec2, half_extents: Vec2) -> Vec<ColliderId>;
}

/// Narrowphase primitives for axis-aligned boxes.
pub trait SweepApi {
    fn overlap_point_aabb(p: Vec2, aabb: &Aabb) -> bool;

    /// Static overlap of `a` against `b`; normal points from `b` toward `a`.
    fn overlap_aabb_aabb(a: &Aabb, b: &Aabb, eps: f32) -> Option<Sweep>;

    /// `moving` displaced by `delta` against a stationary `target`.
    fn sweep_aabb_aabb(moving: &Aabb, delta: Vec2, target: &Aabb, eps: f32) -> Option<Sweep>;
}
