//! # Update Kernel
//!
//! The per-boid transition applied once per frame. [`FlockKernel::update`]
//! reads a boid and the full frame snapshot and returns the boid's next state.
//! It never writes to the snapshot, so every executor can share one snapshot
//! between all boids of a frame.
//!
//! ## Stages
//!
//! Applied in order, each stage reading the velocity left by the previous one:
//!
//! 1. **Neighbor scan**: bounding-box prefilter, then close neighbors feed the
//!    separation accumulator and visible neighbors the position/velocity sums
//! 2. **Cohesion and alignment** toward the neighbor averages
//! 3. **Separation** away from close neighbors
//! 4. **Edge avoidance** near the viewport margins
//! 5. **Speed clamp** into `[min_speed, max_speed]`
//! 6. **Color drift** by horizontal heading
//! 7. **Integration**, one Euler step per frame
//!
//! The accumulation order over the snapshot is fixed, so the result is
//! bit-identical whichever executor schedules the call.

use super::boid::{Boid, Color};
use crate::config::{EdgeMargins, FlockRules};

/// Neighbor accumulators gathered in the scan stage
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NeighborSummary {
    pub close_dx: f64,
    pub close_dy: f64,
    pub position_sum_x: f64,
    pub position_sum_y: f64,
    pub velocity_sum_x: f64,
    pub velocity_sum_y: f64,
    pub near_count: u32,
}

/// Flocking rules bound to a viewport
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlockKernel {
    pub rules: FlockRules,
    pub edges: EdgeMargins,
}

impl FlockKernel {
    pub fn new(rules: FlockRules, edges: EdgeMargins) -> Self {
        Self { rules, edges }
    }

    /// Computes `boid`'s next state against the frame `snapshot`.
    ///
    /// `snapshot` may contain `boid` itself; entries with a matching id are
    /// skipped.
    pub fn update(&self, boid: &Boid, snapshot: &[Boid]) -> Boid {
        let rules = &self.rules;
        let neighbors = self.scan_neighbors(boid, snapshot);

        let mut next = *boid;
        let mut vx = boid.velocity.x;
        let mut vy = boid.velocity.y;

        if neighbors.near_count > 0 {
            let n = neighbors.near_count as f64;
            let avg_x = neighbors.position_sum_x / n;
            let avg_y = neighbors.position_sum_y / n;
            let avg_vx = neighbors.velocity_sum_x / n;
            let avg_vy = neighbors.velocity_sum_y / n;

            vx = vx + (avg_x - boid.position.x) * rules.centering_factor
                + (avg_vx - vx) * rules.matching_factor;
            vy = vy + (avg_y - boid.position.y) * rules.centering_factor
                + (avg_vy - vy) * rules.matching_factor;
        }

        vx += neighbors.close_dx * rules.avoid_factor;
        vy += neighbors.close_dy * rules.avoid_factor;

        let (vx, vy) = self.avoid_edges(boid.position.x, boid.position.y, vx, vy);
        let (vx, vy) = clamp_speed(vx, vy, rules.min_speed, rules.max_speed);

        next.velocity.x = vx;
        next.velocity.y = vy;
        next.color = drift_color(boid.color, vx);
        next.position.x += vx;
        next.position.y += vy;
        next
    }

    /// Scans `snapshot` for boids influencing `boid`, excluding `boid` itself
    pub fn scan_neighbors(&self, boid: &Boid, snapshot: &[Boid]) -> NeighborSummary {
        let rules = &self.rules;
        let close_range_sq = rules.close_range_squared();
        let visible_range_sq = rules.visible_range_squared();
        let mut summary = NeighborSummary::default();

        for other in snapshot {
            if other == boid {
                continue;
            }

            let dx = boid.position.x - other.position.x;
            let dy = boid.position.y - other.position.y;
            if dx.abs() >= rules.max_range || dy.abs() >= rules.max_range {
                continue;
            }

            let distance_sq = dx * dx + dy * dy;
            if distance_sq < close_range_sq {
                summary.close_dx += dx;
                summary.close_dy += dy;
            } else if distance_sq < visible_range_sq {
                summary.position_sum_x += other.position.x;
                summary.position_sum_y += other.position.y;
                summary.velocity_sum_x += other.velocity.x;
                summary.velocity_sum_y += other.velocity.y;
                summary.near_count += 1;
            }
        }

        summary
    }

    fn avoid_edges(&self, x: f64, y: f64, mut vx: f64, mut vy: f64) -> (f64, f64) {
        let turn = self.rules.turn_factor;
        if x < self.edges.low {
            vx += turn;
        }
        if x > self.edges.high_x {
            vx -= turn;
        }
        if y < self.edges.low {
            vy += turn;
        }
        if y > self.edges.high_y {
            vy -= turn;
        }
        (vx, vy)
    }
}

/// Rescales `(vx, vy)` into `[min_speed, max_speed]`.
///
/// A zero velocity has no direction to rescale; it becomes `(min_speed, 0)`.
pub fn clamp_speed(vx: f64, vy: f64, min_speed: f64, max_speed: f64) -> (f64, f64) {
    let speed = (vx * vx + vy * vy).sqrt();
    if speed == 0.0 {
        (min_speed, 0.0)
    } else if speed < min_speed {
        ((vx / speed) * min_speed, (vy / speed) * min_speed)
    } else if speed > max_speed {
        ((vx / speed) * max_speed, (vy / speed) * max_speed)
    } else {
        (vx, vy)
    }
}

/// Shifts red/green toward the boid's horizontal heading
pub fn drift_color(color: Color, vx: f64) -> Color {
    let grow = |c: u8| (c as f64 * 1.01 + 1.0) as i32;
    let fade = |c: u8| (c as f64 * 0.99 - 1.0) as i32;

    let mut next = color;
    if vx > 0.0 {
        next.r = grow(color.r).min(255) as u8;
        next.g = fade(color.g).max(0) as u8;
    } else {
        next.g = grow(color.g).min(255) as u8;
        next.r = fade(color.r).max(0) as u8;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector2;

    fn boid(id: u32, x: f64, y: f64, vx: f64, vy: f64) -> Boid {
        Boid::new(id, Vector2::new(x, y), Vector2::new(vx, vy), Color::new(255, 0, 127))
    }

    #[test]
    fn test_single_boid_has_no_neighbors() {
        let kernel = FlockKernel::default();
        let me = boid(0, 500.0, 500.0, 1.0, 0.0);
        let summary = kernel.scan_neighbors(&me, &[me]);
        assert_eq!(summary, NeighborSummary::default());
        assert_eq!(summary.near_count, 0);
    }

    #[test]
    fn test_self_is_excluded_by_id_not_position() {
        let kernel = FlockKernel::default();
        let me = boid(0, 500.0, 500.0, 1.0, 0.0);
        // Same spot, different id: counts as a close neighbor with zero offset
        let twin = boid(1, 500.0, 500.0, -1.0, 0.0);
        let summary = kernel.scan_neighbors(&me, &[me, twin]);
        assert_eq!(summary.near_count, 0);
        assert_eq!((summary.close_dx, summary.close_dy), (0.0, 0.0));

        // Moved self in the snapshot still matches by id
        let mut stale_self = me;
        stale_self.position = Vector2::new(510.0, 500.0);
        let summary = kernel.scan_neighbors(&me, &[stale_self]);
        assert_eq!(summary, NeighborSummary::default());
    }

    #[test]
    fn test_close_boids_push_apart() {
        let kernel = FlockKernel::default();
        let a = boid(0, 100.0, 100.0, 0.0, 0.0);
        let b = boid(1, 102.0, 100.0, 0.0, 0.0);
        let snapshot = [a, b];

        let next_a = kernel.update(&a, &snapshot);
        let next_b = kernel.update(&b, &snapshot);
        assert!(next_a.velocity.x < 0.0);
        assert!(next_b.velocity.x > 0.0);
        assert_eq!(next_a.velocity.x, -1.0);
        assert_eq!(next_b.velocity.x, 1.0);
    }

    #[test]
    fn test_edge_avoidance_then_min_speed() {
        let kernel = FlockKernel::default();
        let me = boid(0, 40.0, 500.0, 0.0, 0.0);
        let next = kernel.update(&me, &[me]);
        // +TURN_FACTOR pushed right, then rescaled to min speed
        assert_eq!(next.velocity.x, 1.0);
        assert_eq!(next.velocity.y, 0.0);
        assert_eq!(next.position.x, 41.0);
    }

    #[test]
    fn test_low_y_edge_then_min_speed() {
        let kernel = FlockKernel::default();
        assert_eq!(kernel.avoid_edges(500.0, 40.0, 0.0, 0.0), (0.0, 0.2));

        let me = boid(0, 500.0, 40.0, 0.0, 0.0);
        let next = kernel.update(&me, &[me]);
        // +TURN_FACTOR pushed down, then rescaled to min speed
        assert_eq!(next.velocity.x, 0.0);
        assert_eq!(next.velocity.y, 1.0);
        assert_eq!(next.position.y, 41.0);
    }

    #[test]
    fn test_each_edge_turns_inward() {
        let kernel = FlockKernel::default();
        assert_eq!(kernel.avoid_edges(40.0, 500.0, 0.0, 0.0), (0.2, 0.0));
        assert_eq!(kernel.avoid_edges(1880.0, 500.0, 0.0, 0.0), (-0.2, 0.0));
        assert_eq!(kernel.avoid_edges(500.0, 40.0, 0.0, 0.0), (0.0, 0.2));
        assert_eq!(kernel.avoid_edges(500.0, 1040.0, 0.0, 0.0), (0.0, -0.2));
        assert_eq!(kernel.avoid_edges(40.0, 40.0, 0.0, 0.0), (0.2, 0.2));
        assert_eq!(kernel.avoid_edges(1880.0, 1040.0, 0.0, 0.0), (-0.2, -0.2));
        // Inside the margins nothing changes
        assert_eq!(kernel.avoid_edges(500.0, 500.0, 1.1, -0.3), (1.1, -0.3));
    }

    #[test]
    fn test_edges_follow_configuration() {
        let edges = EdgeMargins::for_viewport(800.0, 600.0, 20.0);
        let kernel = FlockKernel::new(FlockRules::default(), edges);
        assert_eq!(kernel.avoid_edges(790.0, 300.0, 0.0, 0.0), (-0.2, 0.0));
        // 40 is inside the configured margin, unlike the default 50
        assert_eq!(kernel.avoid_edges(40.0, 300.0, 0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_max_speed_clamp_preserves_direction() {
        let kernel = FlockKernel::default();
        let me = boid(0, 500.0, 500.0, 2.0, 0.0);
        let next = kernel.update(&me, &[me]);
        assert_eq!((next.velocity.x, next.velocity.y), (1.6, 0.0));
        assert_eq!(next.position, Vector2::new(501.6, 500.0));
    }

    #[test]
    fn test_zero_speed_gets_min_speed_heading() {
        assert_eq!(clamp_speed(0.0, 0.0, 1.0, 1.6), (1.0, 0.0));

        let kernel = FlockKernel::default();
        let me = boid(0, 500.0, 500.0, 0.0, 0.0);
        let next = kernel.update(&me, &[me]);
        assert!(next.velocity.x.is_finite() && next.velocity.y.is_finite());
        assert_eq!(next.speed(), 1.0);
    }

    #[test]
    fn test_speed_within_limits_untouched() {
        assert_eq!(clamp_speed(1.2, 0.0, 1.0, 1.6), (1.2, 0.0));
    }

    #[test]
    fn test_alignment_matches_neighbor_velocity() {
        let kernel = FlockKernel::default();
        let me = boid(0, 500.0, 500.0, 1.2, 0.0);
        let other = boid(1, 510.0, 500.0, 0.0, 1.2);
        let next = kernel.update(&me, &[me, other]);
        // vx: 1.2 + (0 - 1.2) * 0.05, vy: 0 + 1.2 * 0.05
        assert!((next.velocity.x - 1.14).abs() < 1e-12);
        assert!((next.velocity.y - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_prefilter_excludes_far_boids() {
        let kernel = FlockKernel::default();
        let me = boid(0, 500.0, 500.0, 1.2, 0.0);
        // Inside 35 in x but outside the 40 box in y
        let other = boid(1, 510.0, 545.0, 0.0, 1.2);
        let summary = kernel.scan_neighbors(&me, &[me, other]);
        assert_eq!(summary.near_count, 0);
    }

    #[test]
    fn test_cohesion_term_is_tunable() {
        let rules = FlockRules::default()
            .with_centering_factor(0.01)
            .with_matching_factor(0.0);
        let kernel = FlockKernel::new(rules, EdgeMargins::default());
        let me = boid(0, 500.0, 500.0, 1.2, 0.0);
        let other = boid(1, 500.0, 520.0, 1.2, 0.0);
        let next = kernel.update(&me, &[me, other]);
        // Steered toward the neighbor at +y
        assert!((next.velocity.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_color_drift() {
        assert_eq!(drift_color(Color::new(0, 255, 127), 1.0), Color::new(1, 251, 127));
        assert_eq!(drift_color(Color::new(255, 0, 127), 1.0), Color::new(255, 0, 127));
        assert_eq!(drift_color(Color::new(255, 0, 127), -1.0), Color::new(251, 1, 127));
        // vx == 0 counts as not heading right
        assert_eq!(drift_color(Color::new(10, 10, 127), 0.0), Color::new(8, 11, 127));
    }

    #[test]
    fn test_update_is_deterministic() {
        let kernel = FlockKernel::default();
        let snapshot: Vec<Boid> = (0..20)
            .map(|i| boid(i, 500.0 + i as f64 * 2.5, 500.0 - i as f64 * 1.5, 0.3, -0.7))
            .collect();
        for me in &snapshot {
            let a = kernel.update(me, &snapshot);
            let b = kernel.update(me, &snapshot);
            assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
            assert_eq!(a.velocity.y.to_bits(), b.velocity.y.to_bits());
            assert_eq!(a.color, b.color);
        }
    }
}
