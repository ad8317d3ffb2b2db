use glam::Vec2;

use crate::api::SweepApi;
use crate::types::*;

/// Narrowphase primitive tests for axis-aligned boxes.
pub struct Narrowphase;

impl Narrowphase {
    /// Point on the mover's face along `normal`, clamped into the target's extent.
    fn contact_point(center: Vec2, half: Vec2, normal: Vec2, target: &Aabb) -> Vec2 {
        let mut point = center.clamp(target.min(), target.max());
        if normal.x != 0.0 {
            point.x = center.x - normal.x * half.x;
        } else if normal.y != 0.0 {
            point.y = center.y - normal.y * half.y;
        }
        point
    }

    /// Which face of the inflated target `origin` rests on, within `eps`:
    /// -1 on the min face, +1 on the max face.
    fn flush_side(origin: f32, min: f32, max: f32, eps: f32) -> Option<f32> {
        if (origin - min).abs() <= eps {
            Some(-1.0)
        } else if (max - origin).abs() <= eps {
            Some(1.0)
        } else {
            None
        }
    }
}

impl SweepApi for Narrowphase {
    fn overlap_point_aabb(p: Vec2, aabb: &Aabb) -> bool {
        let min = aabb.min();
        let max = aabb.max();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    fn overlap_aabb_aabb(a: &Aabb, b: &Aabb, eps: f32) -> Option<Sweep> {
        let d = b.pos - a.pos;
        let ox = (a.half.x + b.half.x) - d.x.abs();
        let oy = (a.half.y + b.half.y) - d.y.abs();
        if ox <= eps || oy <= eps {
            return None;
        }

        // Axis of minimum penetration, pointing from B into A
        let normal = if ox <= oy {
            Vec2::new(if d.x >= 0.0 { -1.0 } else { 1.0 }, 0.0)
        } else {
            Vec2::new(0.0, if d.y >= 0.0 { -1.0 } else { 1.0 })
        };

        Some(Sweep {
            toi: 0.0,
            normal,
            point: Self::contact_point(a.pos, a.half, normal, b),
            position: a.pos,
            started_overlapping: true,
        })
    }

    fn sweep_aabb_aabb(moving: &Aabb, delta: Vec2, target: &Aabb, eps: f32) -> Option<Sweep> {
        if delta == Vec2::ZERO {
            return Self::overlap_aabb_aabb(moving, target, eps);
        }

        // Slab test of the mover's center against the target inflated by the mover
        let expand = moving.half + target.half;
        let min = target.pos - expand;
        let max = target.pos + expand;
        let origin = moving.pos;

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut n_enter = Vec2::ZERO;

        // An axis without motion must already overlap; resting flush on it
        // is a touching contact that does not restrict the other axis.
        let mut flush = Vec2::ZERO;

        // X axis
        if delta.x == 0.0 {
            match Self::flush_side(origin.x, min.x, max.x, eps) {
                Some(side) => flush.x = side,
                None if origin.x <= min.x || origin.x >= max.x => return None,
                None => {}
            }
        } else {
            let inv = 1.0 / delta.x;
            let mut t1 = (min.x - origin.x) * inv;
            let mut t2 = (max.x - origin.x) * inv;
            let mut nx = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                nx = 1.0;
            }
            if t1 > t_near {
                t_near = t1;
                n_enter = Vec2::new(nx, 0.0);
            }
            if t2 < t_far {
                t_far = t2;
            }
        }

        // Y axis
        if delta.y == 0.0 {
            match Self::flush_side(origin.y, min.y, max.y, eps) {
                Some(side) => flush.y = side,
                None if origin.y <= min.y || origin.y >= max.y => return None,
                None => {}
            }
        } else {
            let inv = 1.0 / delta.y;
            let mut t1 = (min.y - origin.y) * inv;
            let mut t2 = (max.y - origin.y) * inv;
            let mut ny = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                ny = 1.0;
            }
            if t1 > t_near {
                t_near = t1;
                n_enter = Vec2::new(0.0, ny);
            }
            if t2 < t_far {
                t_far = t2;
            }
        }

        if t_near > t_far || t_near >= 1.0 {
            return None;
        }
        // Distance travelled inside the target during this move; zero when
        // separating from a flush contact.
        let inside = (t_far.min(1.0) - t_near.max(0.0)) * delta.length();
        if inside <= eps {
            return None;
        }

        if flush != Vec2::ZERO {
            // Sliding along the face: touching, but never blocking
            let toi = t_near.max(0.0);
            let position = origin + delta * toi;
            return Some(Sweep {
                toi,
                normal: flush,
                point: Self::contact_point(position, moving.half, flush, target),
                position,
                started_overlapping: false,
            });
        }

        if let Some(mut overlap) = Self::overlap_aabb_aabb(moving, target, eps) {
            overlap.point = Self::contact_point(origin, moving.half, overlap.normal, target);
            return Some(overlap);
        }

        let toi = t_near.max(0.0);
        let position = origin + delta * toi;
        Some(Sweep {
            toi,
            normal: n_enter,
            point: Self::contact_point(position, moving.half, n_enter, target),
            position,
            started_overlapping: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f32 = 1e-4;

    fn boxed(x: f32, y: f32, hx: f32, hy: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(hx, hy))
    }

    #[test]
    fn test_overlap_point_aabb() {
        let b = boxed(0.0, 0.0, 1.0, 2.0);
        assert!(Narrowphase::overlap_point_aabb(Vec2::new(0.0, 0.0), &b));
        assert!(Narrowphase::overlap_point_aabb(Vec2::new(1.0, 2.0), &b));
        assert!(!Narrowphase::overlap_point_aabb(Vec2::new(1.1, 0.0), &b));
    }

    #[test]
    fn test_overlap_aabb_aabb_min_axis_normal() {
        let a = boxed(0.0, 0.0, 5.0, 5.0);
        let b = boxed(4.0, 1.0, 5.0, 5.0);
        let o = Narrowphase::overlap_aabb_aabb(&a, &b, EPS).unwrap();
        assert_eq!(o.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(o.toi, 0.0);
        assert!(o.started_overlapping);
        assert_relative_eq!(o.point.x, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_overlap_aabb_aabb_flush_is_not_overlap() {
        let a = boxed(0.0, 0.0, 5.0, 5.0);
        let b = boxed(10.0, 0.0, 5.0, 5.0);
        assert!(Narrowphase::overlap_aabb_aabb(&a, &b, EPS).is_none());
    }

    #[test]
    fn test_sweep_head_on() {
        let a = boxed(0.0, 0.0, 5.0, 5.0);
        let b = boxed(20.0, 0.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::new(20.0, 0.0), &b, EPS).unwrap();
        assert_relative_eq!(s.toi, 0.5, epsilon = 1e-5);
        assert_eq!(s.normal, Vec2::new(-1.0, 0.0));
        assert_relative_eq!(s.position.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(s.point.x, 15.0, epsilon = 1e-5);
        assert!(!s.started_overlapping);
    }

    #[test]
    fn test_sweep_vertical_normal() {
        let a = boxed(0.0, -20.0, 5.0, 5.0);
        let b = boxed(0.0, 0.0, 5.0, 5.0);
        // Moving down (+y) onto B: contact on A's bottom, normal points up (-y)
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::new(0.0, 20.0), &b, EPS).unwrap();
        assert_eq!(s.normal, Vec2::new(0.0, -1.0));
        assert_relative_eq!(s.toi, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_sweep_stops_short() {
        let a = boxed(0.0, 0.0, 5.0, 5.0);
        let b = boxed(20.0, 0.0, 5.0, 5.0);
        assert!(Narrowphase::sweep_aabb_aabb(&a, Vec2::new(9.0, 0.0), &b, EPS).is_none());
    }

    #[test]
    fn test_sweep_arriving_flush_is_not_a_hit() {
        let a = boxed(0.0, 0.0, 5.0, 5.0);
        let b = boxed(20.0, 0.0, 5.0, 5.0);
        assert!(Narrowphase::sweep_aabb_aabb(&a, Vec2::new(10.0, 0.0), &b, EPS).is_none());
    }

    #[test]
    fn test_sweep_tunnels_nothing() {
        // Thin wall, fast mover: the path crosses the wall entirely within one step
        let a = boxed(0.0, 0.0, 1.0, 1.0);
        let wall = boxed(50.0, 0.0, 0.5, 10.0);
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::new(200.0, 0.0), &wall, EPS).unwrap();
        assert_relative_eq!(s.toi, 48.5 / 200.0, epsilon = 1e-5);
        assert_eq!(s.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_sweep_separating_from_flush() {
        let a = boxed(10.0, 0.0, 5.0, 5.0);
        let b = boxed(20.0, 0.0, 5.0, 5.0);
        assert!(Narrowphase::sweep_aabb_aabb(&a, Vec2::new(-1010.0, 0.0), &b, EPS).is_none());
    }

    #[test]
    fn test_sweep_pushing_into_flush() {
        let a = boxed(10.0, 0.0, 5.0, 5.0);
        let b = boxed(20.0, 0.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::new(4.0, 0.0), &b, EPS).unwrap();
        assert_eq!(s.toi, 0.0);
        assert_eq!(s.normal, Vec2::new(-1.0, 0.0));
        assert!(!s.started_overlapping);
    }

    #[test]
    fn test_sweep_sliding_along_face() {
        // Resting on top of B and moving sideways keeps the contact
        let a = boxed(0.0, -10.0, 5.0, 5.0);
        let b = boxed(0.0, 0.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::new(3.0, 0.0), &b, EPS).unwrap();
        assert_eq!(s.toi, 0.0);
        assert_eq!(s.normal, Vec2::new(0.0, -1.0));
        assert_eq!(s.position, a.pos);
        assert!(!s.started_overlapping);
        // Perpendicular to the motion, so it cannot stop it
        assert_eq!(s.normal.dot(Vec2::new(3.0, 0.0)), 0.0);

        // Hanging under B, and beside a wall
        let under = boxed(2.0, 10.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&under, Vec2::new(-4.0, 0.0), &b, EPS).unwrap();
        assert_eq!(s.normal, Vec2::new(0.0, 1.0));
        let beside = boxed(-10.0, 0.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&beside, Vec2::new(0.0, 6.0), &b, EPS).unwrap();
        assert_eq!(s.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_sweep_sliding_off_the_face() {
        let b = boxed(0.0, 0.0, 5.0, 5.0);
        // Flush height but past the edge for the whole move
        let a = boxed(20.0, -10.0, 5.0, 5.0);
        assert!(Narrowphase::sweep_aabb_aabb(&a, Vec2::new(5.0, 0.0), &b, EPS).is_none());
        // Hovering one unit above the face
        let a = boxed(0.0, -11.0, 5.0, 5.0);
        assert!(Narrowphase::sweep_aabb_aabb(&a, Vec2::new(3.0, 0.0), &b, EPS).is_none());
    }

    #[test]
    fn test_sweep_started_overlapping() {
        let a = boxed(12.0, 0.0, 5.0, 5.0);
        let b = boxed(20.0, 0.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::new(-100.0, 0.0), &b, EPS).unwrap();
        assert!(s.started_overlapping);
        assert_eq!(s.toi, 0.0);
        assert_eq!(s.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_sweep_zero_delta_uses_overlap() {
        let a = boxed(0.0, 0.0, 5.0, 5.0);
        let b = boxed(4.0, 0.0, 5.0, 5.0);
        let s = Narrowphase::sweep_aabb_aabb(&a, Vec2::ZERO, &b, EPS).unwrap();
        assert!(s.started_overlapping);
        let far = boxed(40.0, 0.0, 5.0, 5.0);
        assert!(Narrowphase::sweep_aabb_aabb(&a, Vec2::ZERO, &far, EPS).is_none());
    }
}
