use glam::Vec2;
use log::{debug, trace, warn};

use std::collections::{HashMap, HashSet};

use crate::api::{CollisionWorldApi, SweepApi};
use crate::collider::Collider;
use crate::error::{ColliderError, check_finite};
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Grid-partitioned world owning every collider.
///
/// Colliders live in an append-only arena and refer to each other by
/// [`ColliderId`]. Moves and resizes only queue work; [`step`](CollisionWorldApi::step)
/// runs detection for the queued colliders and returns them to resting.
pub struct CollisionWorld {
    pub cfg: WorldConfig,
    pub step_counter: u32,

    colliders: Vec<Option<Collider>>,

    // Uniform grid: cell coord -> colliders placed in that cell
    grid: HashMap<(i32, i32), Vec<ColliderId>>,

    // Colliders to run detection for on the next step, in transition order
    dynamic: Vec<ColliderId>,

    events: Vec<CollisionEvent>,
}

impl CollisionWorldApi for CollisionWorld {
    fn new(cfg: WorldConfig) -> Result<Self, ColliderError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            step_counter: 0,
            colliders: Vec::new(),
            grid: HashMap::new(),
            dynamic: Vec::new(),
            events: Vec::new(),
        })
    }

    fn create_collider(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<ColliderId, ColliderError> {
        let x = check_finite(x, "x")?;
        let y = check_finite(y, "y")?;
        let width = check_finite(width, "width")?;
        let height = check_finite(height, "height")?;

        let id = ColliderId(self.colliders.len() as u32);
        let half = Vec2::new(self.half_extent(width), self.half_extent(height));
        let aabb = Aabb::new(Vec2::new(x, y), half);
        self.check_cell_span(&aabb)?;
        self.colliders.push(Some(Collider::new(id, aabb)));
        self.place_collider_in_grid(id, aabb);
        // Newly created colliders are checked on their first step
        self.set_as_dynamic(id)?;

        debug!("Created collider {:?} at ({}, {}) size {}x{}", id, x, y, half.x * 2.0, half.y * 2.0);
        Ok(id)
    }

    fn remove_collider(&mut self, id: ColliderId) -> Result<Collider, ColliderError> {
        let collider = self.get(id)?;
        let partners: Vec<ColliderId> = collider.hits.iter().map(|h| h.other).collect();
        let keys = collider.grid_keys.clone();

        self.unlink_from_grid(id, &keys);
        self.dynamic.retain(|&d| d != id);
        let removed = self.colliders[id.index()]
            .take()
            .ok_or(ColliderError::UnknownCollider(id))?;

        for other in partners {
            if let Some(partner) = self.slot_mut(other) {
                if !partner.remove_hit(id) {
                    warn!("Collider {:?} had no reciprocal hit for removed {:?}", other, id);
                }
                partner.touches.reset();
            }
            self.recompute_touches(other);
        }

        debug!("Removed collider {:?}", id);
        Ok(removed)
    }

    fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.slot(id)
    }

    fn collider_mut(&mut self, id: ColliderId) -> Option<&mut Collider> {
        self.slot_mut(id)
    }

    fn move_to(&mut self, id: ColliderId, x: f32, y: f32) -> Result<(), ColliderError> {
        let x = check_finite(x, "x")?;
        let y = check_finite(y, "y")?;

        let collider = self.get(id)?;
        let delta = Vec2::new(x, y) - collider.aabb.pos;
        if delta == Vec2::ZERO {
            self.get_mut(id)?.delta = delta;
            return Ok(());
        }

        // Occupy every cell along the path so fast movers can't skip a cell
        let swept = collider.aabb.swept(delta);
        self.check_cell_span(&swept)?;
        self.get_mut(id)?.delta = delta;
        trace!("Collider {:?} moving by ({}, {})", id, delta.x, delta.y);
        self.place_collider_in_grid(id, swept);
        self.set_as_dynamic(id)
    }

    fn resize(&mut self, id: ColliderId, width: f32, height: f32) -> Result<(), ColliderError> {
        let width = check_finite(width, "width")?;
        let height = check_finite(height, "height")?;

        let half = Vec2::new(self.half_extent(width), self.half_extent(height));
        let collider = self.get(id)?;
        let aabb = Aabb::new(collider.aabb.pos, half);
        let bound = if collider.delta != Vec2::ZERO {
            aabb.swept(collider.delta)
        } else {
            aabb
        };
        self.check_cell_span(&bound)?;
        self.get_mut(id)?.aabb = aabb;
        self.place_collider_in_grid(id, bound);
        self.set_as_dynamic(id)
    }

    fn step(&mut self) {
        self.step_counter = self.step_counter.wrapping_add(1);
        let eps = self.cfg.contact_epsilon;
        let queue = std::mem::take(&mut self.dynamic);
        let mut touched: Vec<ColliderId> = Vec::new();
        let events_before = self.events.len();

        for &id in &queue {
            let Some(mover) = self.slot(id) else { continue };
            let aabb = mover.aabb;
            let delta = mover.delta;
            let mover_type = mover.collision_type();

            let candidates = self.candidates(id);
            let mut contacts: Vec<(ColliderId, Sweep)> = candidates
                .iter()
                .filter_map(|&other| {
                    let target = self.slot(other)?;
                    Narrowphase::sweep_aabb_aabb(&aabb, delta, &target.aabb, eps)
                        .map(|s| (other, s))
                })
                .collect();
            contacts.sort_by(|a, b| a.1.toi.total_cmp(&b.1.toi).then(a.0.cmp(&b.0)));

            // First non-sensor contact we are moving into blocks the move;
            // faces we only slide along do not
            let mut applied = delta;
            let mut cutoff = f32::INFINITY;
            if !mover_type.is_sensor() {
                let blocking = contacts.iter().find(|(other, s)| {
                    !s.started_overlapping
                        && delta.dot(s.normal) < 0.0
                        && self.slot(*other).is_some_and(|c| !c.collision_type().is_sensor())
                });
                if let Some((_, s)) = blocking {
                    cutoff = s.toi;
                    applied = match mover_type {
                        CollisionType::Solid => delta * s.toi,
                        CollisionType::Slide if s.normal.x != 0.0 => {
                            Vec2::new(delta.x * s.toi, delta.y)
                        }
                        CollisionType::Slide => Vec2::new(delta.x, delta.y * s.toi),
                        CollisionType::Sensor => delta,
                    };
                }
            }
            contacts.retain(|(_, s)| s.toi <= cutoff);

            for (other, sweep) in &contacts {
                self.record_contact(id, *other, sweep, &mut touched);
            }
            self.drop_unconfirmed_hits(id, &candidates, &mut touched);

            if let Some(mover) = self.slot_mut(id) {
                mover.aabb.pos += applied;
                mover.delta = Vec2::ZERO;
                let bound = mover.aabb;
                self.place_collider_in_grid(id, bound);
            }
            touched.push(id);
        }

        touched.sort_unstable();
        touched.dedup();
        for id in touched {
            self.recompute_touches(id);
        }

        // Step boundary: everything processed this step is resting again
        for &id in &queue {
            if let Some(c) = self.slot_mut(id) {
                c.is_dynamic = false;
                c.delta = Vec2::ZERO;
            }
        }

        debug!(
            "Step {}: {} dynamic collider(s), {} event(s)",
            self.step_counter,
            queue.len(),
            self.events.len() - events_before
        );
    }

    fn drain_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }

    fn query_point(&self, p: Vec2) -> Vec<ColliderId> {
        let cell = Self::world_to_cell(p, self.cfg.cell_size);
        let mut out: Vec<ColliderId> = self
            .grid
            .get(&cell)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&id| {
                self.slot(id)
                    .is_some_and(|c| Narrowphase::overlap_point_aabb(p, &c.aabb))
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn query_aabb(&self, center: Vec2, half_extents: Vec2) -> Vec<ColliderId> {
        let query = Aabb::new(center, half_extents);
        if self.check_cell_span(&query).is_err() {
            // Cheaper to test every collider than to walk that many cells
            let mut out: Vec<ColliderId> = self
                .iter()
                .filter(|c| Narrowphase::overlap_aabb_aabb(&c.aabb, &query, 0.0).is_some())
                .map(Collider::id)
                .collect();
            out.sort_unstable();
            return out;
        }
        let cs = self.cfg.cell_size;
        let (ix0, iy0) = Self::world_to_cell(query.min(), cs);
        let (ix1, iy1) = Self::world_to_cell(query.max(), cs);
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                let Some(list) = self.grid.get(&(ix, iy)) else { continue };
                for &id in list {
                    if !seen.insert(id) {
                        continue;
                    }
                    let Some(c) = self.slot(id) else { continue };
                    if Narrowphase::overlap_aabb_aabb(&c.aabb, &query, 0.0).is_some() {
                        out.push(id);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }
}

impl CollisionWorld {
    /// Transition a collider from resting to dynamic. No-op if it already is.
    ///
    /// Partners whose reciprocal hit no longer holds under this collider's
    /// pending move lose that hit and get their touches recomputed; this
    /// collider's own hits and touches are cleared and it is queued for the
    /// next step.
    pub fn set_as_dynamic(&mut self, id: ColliderId) -> Result<(), ColliderError> {
        let this = self.get(id)?;
        if this.is_dynamic {
            return Ok(());
        }
        let eps = self.cfg.contact_epsilon;

        // Collect first, mutate partners after
        let mut stale = Vec::new();
        for hit in &this.hits {
            let Some(partner) = self.slot(hit.other) else {
                warn!("Collider {:?} has a hit on missing collider {:?}", id, hit.other);
                continue;
            };
            if !partner.has_hit_with(id) {
                warn!("Collider {:?} lists {:?} but the reciprocal hit is missing", id, hit.other);
                continue;
            }
            if Narrowphase::sweep_aabb_aabb(&this.aabb, this.delta, &partner.aabb, eps).is_none() {
                stale.push(hit.other);
            }
        }

        for other in stale {
            if let Some(partner) = self.slot_mut(other) {
                partner.remove_hit(id);
                partner.touches.reset();
            }
            self.recompute_touches(other);
        }

        let this = self.get_mut(id)?;
        this.is_dynamic = true;
        this.touches.reset();
        this.hits.clear();
        self.dynamic.push(id);
        Ok(())
    }

    /// OR the touches implied by a collider's current hits into its flags.
    /// Existing flags are not cleared first.
    pub fn calculate_touches(&mut self, id: ColliderId) -> Result<(), ColliderError> {
        self.get(id)?;
        self.recompute_touches(id);
        Ok(())
    }

    /// Colliders queued for the next step.
    pub fn dynamic_colliders(&self) -> &[ColliderId] {
        &self.dynamic
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid occupancy and broadphase pair counts.
    ///
    /// `candidate_pairs` counts a pair once per shared cell; `unique_pairs`
    /// counts it once overall.
    pub fn debug_stats(&self) -> WorldStats {
        let candidate_pairs = self
            .grid
            .values()
            .map(|ids| ids.len() * ids.len().saturating_sub(1) / 2)
            .sum();
        let unique_pairs = self
            .iter()
            .map(|c| self.candidates(c.id()).into_iter().filter(|&o| o > c.id()).count())
            .sum();
        WorldStats {
            colliders: self.len(),
            cells: self.grid.len(),
            dynamic: self.dynamic.len(),
            candidate_pairs,
            unique_pairs,
        }
    }

    fn slot(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: ColliderId) -> Option<&mut Collider> {
        self.colliders.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn get(&self, id: ColliderId) -> Result<&Collider, ColliderError> {
        self.slot(id).ok_or(ColliderError::UnknownCollider(id))
    }

    fn get_mut(&mut self, id: ColliderId) -> Result<&mut Collider, ColliderError> {
        self.slot_mut(id).ok_or(ColliderError::UnknownCollider(id))
    }

    /// Half extent for a requested size; zero falls back to just under one cell.
    fn half_extent(&self, size: f32) -> f32 {
        let size = size.abs();
        if size > 0.0 {
            size / 2.0
        } else {
            (self.cfg.cell_size - 1.0).max(0.0) / 2.0
        }
    }

    fn world_to_cell(p: Vec2, cs: f32) -> (i32, i32) {
        ((p.x / cs).floor() as i32, (p.y / cs).floor() as i32)
    }

    /// Reject bounds covering more cells than `max_grid_cells`.
    fn check_cell_span(&self, bound: &Aabb) -> Result<(), ColliderError> {
        let cs = self.cfg.cell_size;
        let (min, max) = (bound.min() / cs, bound.max() / cs);
        let nx = f64::from(max.x.floor()) - f64::from(min.x.floor()) + 1.0;
        let ny = f64::from(max.y.floor()) - f64::from(min.y.floor()) + 1.0;
        let cells = nx * ny;
        if cells > self.cfg.max_grid_cells as f64 {
            return Err(ColliderError::CellSpanTooLarge {
                cells: cells as u64,
                limit: self.cfg.max_grid_cells,
            });
        }
        Ok(())
    }

    /// Re-index a collider into every cell `bound` covers. Idempotent.
    pub(crate) fn place_collider_in_grid(&mut self, id: ColliderId, bound: Aabb) {
        let Some(collider) = self.slot_mut(id) else { return };
        let old = std::mem::take(&mut collider.grid_keys);
        self.unlink_from_grid(id, &old);

        let cs = self.cfg.cell_size;
        let (ix0, iy0) = Self::world_to_cell(bound.min(), cs);
        let (ix1, iy1) = Self::world_to_cell(bound.max(), cs);
        let mut keys = Vec::new();
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                self.grid.entry((ix, iy)).or_default().push(id);
                keys.push((ix, iy));
            }
        }
        if let Some(collider) = self.slot_mut(id) {
            collider.grid_keys = keys;
        }
    }

    fn unlink_from_grid(&mut self, id: ColliderId, keys: &[(i32, i32)]) {
        for key in keys {
            if let Some(list) = self.grid.get_mut(key) {
                list.retain(|&c| c != id);
                if list.is_empty() {
                    self.grid.remove(key);
                }
            }
        }
    }

    /// Other colliders sharing at least one cell with `id`, sorted.
    fn candidates(&self, id: ColliderId) -> Vec<ColliderId> {
        let Some(collider) = self.slot(id) else { return Vec::new() };
        let mut out: Vec<ColliderId> = collider
            .grid_keys
            .iter()
            .filter_map(|k| self.grid.get(k))
            .flatten()
            .copied()
            .filter(|&other| other != id)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn recompute_touches(&mut self, id: ColliderId) {
        let Some(this) = self.slot(id) else { return };
        let mut touches = this.touches;
        for hit in &this.hits {
            match self.slot(hit.other) {
                Some(partner) if this.responds_to(partner) => touches.accumulate(hit.normal),
                Some(_) => {}
                None => warn!("Collider {:?} has a hit on missing collider {:?}", id, hit.other),
            }
        }
        if let Some(this) = self.slot_mut(id) {
            this.touches = touches;
        }
    }

    /// Store a contact on both participants, buffer an event and fire callbacks
    /// for whichever side actually gained a hit.
    fn record_contact(
        &mut self,
        id: ColliderId,
        other: ColliderId,
        sweep: &Sweep,
        touched: &mut Vec<ColliderId>,
    ) {
        let hit = Hit::from_sweep(other, sweep);
        let reciprocal = hit.reciprocal(id);

        let Some(mover) = self.slot_mut(id) else { return };
        let inserted_a = mover.add_hit(hit);
        if inserted_a {
            mover.last_hit_position = sweep.position;
        }
        let a_key = mover.user_data;

        let Some(partner) = self.slot_mut(other) else { return };
        let inserted_b = partner.add_hit(reciprocal);
        if inserted_b {
            partner.last_hit_position = partner.aabb.pos;
        }
        let b_key = partner.user_data;

        if !(inserted_a || inserted_b) {
            return;
        }
        touched.push(other);
        if self.events.len() < self.cfg.max_events {
            self.events.push(CollisionEvent {
                a: id,
                b: other,
                a_key,
                b_key,
                sweep: *sweep,
            });
        }
        if inserted_a {
            self.invoke_callback(id, &hit);
        }
        if inserted_b {
            self.invoke_callback(other, &reciprocal);
        }
    }

    /// Partners still holding a hit on `id` that this step did not confirm
    /// lose it, keeping hit lists symmetric.
    fn drop_unconfirmed_hits(
        &mut self,
        id: ColliderId,
        candidates: &[ColliderId],
        touched: &mut Vec<ColliderId>,
    ) {
        let Some(mover) = self.slot(id) else { return };
        let unconfirmed: Vec<ColliderId> = candidates
            .iter()
            .copied()
            .filter(|&other| {
                !mover.has_hit_with(other)
                    && self.slot(other).is_some_and(|p| p.has_hit_with(id))
            })
            .collect();
        for other in unconfirmed {
            if let Some(partner) = self.slot_mut(other) {
                partner.remove_hit(id);
                partner.touches.reset();
            }
            touched.push(other);
        }
    }

    fn invoke_callback(&mut self, id: ColliderId, hit: &Hit) {
        let Some(mut callback) = self.slot_mut(id).and_then(Collider::take_callback) else {
            return;
        };
        callback(id, hit);
        if let Some(c) = self.slot_mut(id) {
            c.restore_callback(callback);
        }
    }
}
