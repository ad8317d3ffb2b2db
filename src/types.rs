use glam::Vec2;

use crate::error::ColliderError;

/// User-defined opaque key carried on a collider (e.g., pack your entity id).
pub type ColKey = u64;

/// Stable arena handle for a collider. Handles are never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderId(pub u32);

impl ColliderId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned box stored as center + half extents (`half` is never negative).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Aabb {
    pub pos: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, half: Vec2) -> Self {
        Self { pos, half: half.abs() }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.half
    }

    /// Bound covering this box at its start and at `pos + delta`.
    ///
    /// Centered on the midpoint of the path, grown by half the absolute
    /// displacement on each axis.
    pub fn swept(&self, delta: Vec2) -> Self {
        Self {
            pos: self.pos + delta * 0.5,
            half: self.half + delta.abs() * 0.5,
        }
    }
}

/// Collision capability tag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionType {
    /// Stops at the first blocking contact.
    Solid,
    /// Stops along the contact normal, keeps moving along the surface.
    #[default]
    Slide,
    /// Reports contacts but never blocks and never sets touch flags.
    Sensor,
}

impl CollisionType {
    #[inline]
    pub fn is_sensor(self) -> bool {
        matches!(self, CollisionType::Sensor)
    }
}

/// Narrowphase result for a box moving against another box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sweep {
    /// Fraction in [0,1] of the displacement at which contact begins.
    pub toi: f32,
    /// Axis-aligned unit normal pointing from the target toward the mover.
    pub normal: Vec2,
    /// Contact point on the mover's leading face.
    pub point: Vec2,
    /// Mover center at the time of impact.
    pub position: Vec2,
    /// The boxes already overlapped before moving.
    pub started_overlapping: bool,
}

/// A contact stored in a collider's hit list, seen from that collider.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    /// Partner collider.
    pub other: ColliderId,
    pub normal: Vec2,
    pub toi: f32,
    pub point: Vec2,
}

impl Hit {
    pub(crate) fn from_sweep(other: ColliderId, sweep: &Sweep) -> Self {
        Self {
            other,
            normal: sweep.normal,
            toi: sweep.toi,
            point: sweep.point,
        }
    }

    /// The same contact seen from the partner's side.
    pub(crate) fn reciprocal(&self, this: ColliderId) -> Self {
        Self {
            other: this,
            normal: -self.normal,
            toi: self.toi,
            point: self.point,
        }
    }
}

/// Directional contact flags derived from the hit list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Touches {
    pub top: bool,
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
}

impl Touches {
    pub fn any(&self) -> bool {
        self.top || self.left || self.right || self.bottom
    }

    pub(crate) fn reset(&mut self) {
        *self = Touches::default();
    }

    /// OR the side a contact normal faces into the flags.
    pub(crate) fn accumulate(&mut self, normal: Vec2) {
        if normal.x > 0.0 {
            self.left = true;
        } else if normal.x < 0.0 {
            self.right = true;
        }
        if normal.y > 0.0 {
            self.top = true;
        } else if normal.y < 0.0 {
            self.bottom = true;
        }
    }
}

/// Contact recorded during a step, seen from `a` (the mover).
#[derive(Copy, Clone, Debug)]
pub struct CollisionEvent {
    pub a: ColliderId,
    pub b: ColliderId,
    pub a_key: Option<ColKey>,
    pub b_key: Option<ColKey>,
    pub sweep: Sweep,
}

/// World-level configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Grid cell size in world units.
    pub cell_size: f32,
    /// Penetration slop below which contacts are treated as grazing.
    pub contact_epsilon: f32,
    /// Maximum number of events buffered per step; extra are dropped.
    pub max_events: usize,
    /// Most grid cells a single collider (or its swept path) may occupy.
    pub max_grid_cells: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            contact_epsilon: 1e-4,
            max_events: 1024,
            max_grid_cells: 4096,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ColliderError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ColliderError::TypeMismatch {
                param: "cell_size",
                expected: "positive finite number",
            });
        }
        if !self.contact_epsilon.is_finite() || self.contact_epsilon < 0.0 {
            return Err(ColliderError::TypeMismatch {
                param: "contact_epsilon",
                expected: "non-negative finite number",
            });
        }
        if self.max_grid_cells == 0 {
            return Err(ColliderError::TypeMismatch {
                param: "max_grid_cells",
                expected: "positive integer",
            });
        }
        Ok(())
    }
}

/// Debug statistics for the current grid.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub colliders: usize,
    pub cells: usize,
    /// Colliders queued for the next step.
    pub dynamic: usize,
    /// Sum of per-cell pair counts (n*(n-1)/2), counts duplicates across cells.
    pub candidate_pairs: usize,
    /// Unique pairs encountered when deduplicated across cells.
    pub unique_pairs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swept_bound_covers_start_and_end() {
        let b = Aabb::new(Vec2::new(0.0, 0.0), Vec2::splat(5.0));
        let s = b.swept(Vec2::new(20.0, -4.0));
        assert_eq!(s.pos, Vec2::new(10.0, -2.0));
        assert_eq!(s.half, Vec2::new(15.0, 7.0));
        assert_eq!(s.min(), Vec2::new(-5.0, -9.0));
        assert_eq!(s.max(), Vec2::new(25.0, 5.0));
    }

    #[test]
    fn test_aabb_new_normalizes_negative_half() {
        let b = Aabb::new(Vec2::ZERO, Vec2::new(-2.0, 3.0));
        assert_eq!(b.half, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_touches_accumulate_each_side() {
        let mut t = Touches::default();
        t.accumulate(Vec2::new(1.0, 0.0));
        assert!(t.left && !t.right && !t.top && !t.bottom);
        t.accumulate(Vec2::new(0.0, -1.0));
        assert!(t.left && t.bottom);
        t.accumulate(Vec2::new(-1.0, 0.0));
        t.accumulate(Vec2::new(0.0, 1.0));
        assert!(t.left && t.right && t.top && t.bottom);
        t.reset();
        assert!(!t.any());
    }

    #[test]
    fn test_reciprocal_hit_flips_normal() {
        let h = Hit {
            other: ColliderId(2),
            normal: Vec2::new(-1.0, 0.0),
            toi: 0.5,
            point: Vec2::new(15.0, 0.0),
        };
        let r = h.reciprocal(ColliderId(1));
        assert_eq!(r.other, ColliderId(1));
        assert_eq!(r.normal, Vec2::new(1.0, 0.0));
        assert_eq!(r.point, h.point);
    }

    #[test]
    fn test_config_validation() {
        assert!(WorldConfig::default().validate().is_ok());
        let bad = WorldConfig { cell_size: 0.0, ..Default::default() };
        assert!(matches!(
            bad.validate(),
            Err(ColliderError::TypeMismatch { param: "cell_size", .. })
        ));
        let bad = WorldConfig { contact_epsilon: f32::NAN, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = WorldConfig { max_grid_cells: 0, ..Default::default() };
        assert!(matches!(
            bad.validate(),
            Err(ColliderError::TypeMismatch { param: "max_grid_cells", .. })
        ));
    }
}
