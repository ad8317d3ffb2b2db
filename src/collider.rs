use std::collections::HashSet;
use std::fmt;

use glam::Vec2;

use crate::types::*;

/// Called once for every hit newly recorded on a collider during a step.
pub type CollisionCallback = Box<dyn FnMut(ColliderId, &Hit)>;

/// A rectangular body tracked by a [`CollisionWorld`](crate::CollisionWorld).
///
/// Geometry, pending displacement, grid placement and the hit list are owned
/// by the world; callers only get the setters below and read access.
pub struct Collider {
    id: ColliderId,
    pub(crate) aabb: Aabb,
    /// Displacement requested by `move_to`, consumed by the next step.
    pub(crate) delta: Vec2,
    collision_type: CollisionType,
    pub(crate) touches: Touches,
    pub(crate) last_hit_position: Vec2,
    response_name: String,
    response_filters: HashSet<String>,
    pub(crate) grid_keys: Vec<(i32, i32)>,
    pub(crate) hits: Vec<Hit>,
    pub(crate) is_dynamic: bool,
    callback: Option<CollisionCallback>,
    /// Opaque passthrough, never read by the engine.
    pub user_data: Option<ColKey>,
}

impl fmt::Debug for Collider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collider")
            .field("id", &self.id)
            .field("aabb", &self.aabb)
            .field("delta", &self.delta)
            .field("collision_type", &self.collision_type)
            .field("touches", &self.touches)
            .field("response_name", &self.response_name)
            .field("response_filters", &self.response_filters)
            .field("hits", &self.hits)
            .field("is_dynamic", &self.is_dynamic)
            .field("has_callback", &self.callback.is_some())
            .field("user_data", &self.user_data)
            .finish()
    }
}

impl Collider {
    pub(crate) fn new(id: ColliderId, aabb: Aabb) -> Self {
        Self {
            id,
            aabb,
            delta: Vec2::ZERO,
            collision_type: CollisionType::default(),
            touches: Touches::default(),
            last_hit_position: aabb.pos,
            response_name: String::new(),
            response_filters: HashSet::new(),
            grid_keys: Vec::new(),
            hits: Vec::new(),
            is_dynamic: false,
            callback: None,
            user_data: None,
        }
    }

    // --- Setters -----------------------------------------------------------

    pub fn set_response_name(&mut self, name: impl Into<String>) {
        self.response_name = name.into();
    }

    /// Response names whose contacts never count toward this collider's touches.
    pub fn set_response_filters<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.response_filters = names.into_iter().map(Into::into).collect();
    }

    pub fn set_collision_type(&mut self, collision_type: CollisionType) {
        self.collision_type = collision_type;
    }

    pub fn set_collision_callback<F>(&mut self, callback: F)
    where
        F: FnMut(ColliderId, &Hit) + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_collision_callback(&mut self) {
        self.callback = None;
    }

    // --- Getters -----------------------------------------------------------

    pub fn id(&self) -> ColliderId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.aabb.pos
    }

    pub fn width(&self) -> f32 {
        self.aabb.half.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.aabb.half.y * 2.0
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Displacement still waiting for the next step.
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn touches(&self) -> Touches {
        self.touches
    }

    pub fn last_hit_position(&self) -> Vec2 {
        self.last_hit_position
    }

    pub fn collision_type(&self) -> CollisionType {
        self.collision_type
    }

    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    pub fn response_filters(&self) -> &HashSet<String> {
        &self.response_filters
    }

    /// Grid cells the collider was last placed in.
    pub fn grid_keys(&self) -> &[(i32, i32)] {
        &self.grid_keys
    }

    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    pub fn has_collision_callback(&self) -> bool {
        self.callback.is_some()
    }

    // --- Hit bookkeeping ---------------------------------------------------

    /// Record a hit unless one for the same partner is already stored.
    /// Returns true when the hit was inserted.
    pub(crate) fn add_hit(&mut self, hit: Hit) -> bool {
        if self.hits.iter().any(|h| h.other == hit.other) {
            return false;
        }
        self.hits.push(hit);
        true
    }

    /// Drop the hit referencing `other`. Returns false if there was none.
    pub(crate) fn remove_hit(&mut self, other: ColliderId) -> bool {
        let before = self.hits.len();
        self.hits.retain(|h| h.other != other);
        self.hits.len() != before
    }

    pub(crate) fn has_hit_with(&self, other: ColliderId) -> bool {
        self.hits.iter().any(|h| h.other == other)
    }

    /// Whether a contact with `other` counts toward this collider's touches:
    /// neither side is a sensor and the partner's response name is not filtered.
    pub fn responds_to(&self, other: &Collider) -> bool {
        !self.collision_type.is_sensor()
            && !other.collision_type.is_sensor()
            && !self.response_filters.contains(&other.response_name)
    }

    /// Callback access for the step driver; the callback is taken out while it runs.
    pub(crate) fn take_callback(&mut self) -> Option<CollisionCallback> {
        self.callback.take()
    }

    pub(crate) fn restore_callback(&mut self, callback: CollisionCallback) {
        if self.callback.is_none() {
            self.callback = Some(callback);
        }
    }
}
