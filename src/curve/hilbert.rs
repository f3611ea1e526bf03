use glam::{Affine2, Vec2};

/// Default cap on recursion depth. At depth 10 the strip already has
/// 1,048,576 vertices.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Hard ceiling for any configured cap. At depth 12 the RGBA color buffer
/// is 4^12 * 16 bytes, exactly wgpu's default 256 MiB `max_buffer_size`;
/// one level more does not fit.
pub const DEPTH_CEILING: u32 = 12;

/// The depth-1 figure: an open square traced as `|‾|`.
pub fn base_square() -> Vec<Vec2> {
    vec![
        Vec2::new(-1.0, -1.0),
        Vec2::new(-1.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, -1.0),
    ]
}

/// Number of strip vertices at `depth` (`4^depth`).
pub fn vertex_count(depth: u32) -> usize {
    4usize.pow(depth)
}

/// The four per-quadrant maps, in strip order: bottom-left, top-left,
/// top-right, bottom-right.
///
/// The bottom quadrants mirror the previous level in x and turn it a quarter
/// so that the strip enters and leaves each sub-square at the right corner.
pub fn quadrant_transforms() -> [Affine2; 4] {
    let scale = Affine2::from_scale(Vec2::splat(0.5));
    let flip_x = Affine2::from_scale(Vec2::new(-1.0, 1.0));

    let bottom_left = scale
        * Affine2::from_translation(Vec2::new(-2.0, -2.0))
        * Affine2::from_angle(270.0_f32.to_radians())
        * flip_x;
    let top_left = scale * Affine2::from_translation(Vec2::new(-2.0, 2.0));
    let top_right = scale * Affine2::from_translation(Vec2::new(2.0, 2.0));
    let bottom_right = scale
        * Affine2::from_translation(Vec2::new(2.0, -2.0))
        * Affine2::from_angle(90.0_f32.to_radians())
        * flip_x;

    [bottom_left, top_left, top_right, bottom_right]
}

/// One subdivision step: every quadrant map applied to every point, results
/// concatenated in quadrant order. Output is exactly four times the input.
pub fn subdivide(points: &[Vec2]) -> Vec<Vec2> {
    let mut next = Vec::with_capacity(points.len() * 4);
    for xform in quadrant_transforms() {
        next.extend(points.iter().map(|&p| xform.transform_point2(p)));
    }
    next
}

/// Outcome of a depth change request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthChange {
    Increased(u32),
    Decreased(u32),
    /// Already at depth 1; nothing changed.
    AtMinimum,
    /// Already at the configured cap; nothing changed.
    AtMaximum(u32),
}

/// Current recursion depth and the strip points derived from it.
///
/// `revision` bumps every time the point list is replaced, so the renderer
/// can tell when its uploaded copy is stale.
#[derive(Clone, Debug)]
pub struct CurveState {
    depth: u32,
    max_depth: u32,
    points: Vec<Vec2>,
    revision: u64,
}

impl CurveState {
    /// `max_depth` is clamped to `1..=DEPTH_CEILING`.
    pub fn new(max_depth: u32) -> Self {
        if max_depth > DEPTH_CEILING {
            log::warn!("max_depth {max_depth} exceeds {DEPTH_CEILING}; capping");
        }
        Self {
            depth: 1,
            max_depth: max_depth.clamp(1, DEPTH_CEILING),
            points: base_square(),
            revision: 0,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Go one level deeper, subdividing the current points once.
    pub fn increase(&mut self) -> DepthChange {
        if self.depth >= self.max_depth {
            return DepthChange::AtMaximum(self.max_depth);
        }
        self.depth += 1;
        self.replace_points(subdivide(&self.points));
        DepthChange::Increased(self.depth)
    }

    /// Go one level up. There is no inverse of `subdivide`, so the strip is
    /// rebuilt from the base square.
    pub fn decrease(&mut self) -> DepthChange {
        if self.depth == 1 {
            return DepthChange::AtMinimum;
        }
        let target = self.depth - 1;
        self.reset();
        while self.depth < target {
            self.depth += 1;
            self.replace_points(subdivide(&self.points));
        }
        DepthChange::Decreased(target)
    }

    /// Back to depth 1 and the base square.
    pub fn reset(&mut self) {
        self.depth = 1;
        self.replace_points(base_square());
    }

    fn replace_points(&mut self, points: Vec<Vec2>) {
        debug_assert_eq!(points.len(), vertex_count(self.depth));
        self.points = points;
        self.revision += 1;
    }
}

impl Default for CurveState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_points_eq(actual: &[Vec2], expected: &[[f32; 2]]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                a.abs_diff_eq(Vec2::from(*e), 1e-5),
                "point {i}: got {a:?}, expected {e:?}"
            );
        }
    }

    #[test]
    fn test_point_count_is_power_of_four() {
        let mut curve = CurveState::new(7);
        assert_eq!(curve.points().len(), 4);
        for d in 2..=7 {
            assert_eq!(curve.increase(), DepthChange::Increased(d));
            assert_eq!(curve.points().len(), 4usize.pow(d));
            assert_eq!(curve.points().len(), vertex_count(curve.depth()));
        }
    }

    #[test]
    fn test_subdivide_quadruples() {
        let mut points = base_square();
        for _ in 0..5 {
            let next = subdivide(&points);
            assert_eq!(next.len(), points.len() * 4);
            points = next;
        }
    }

    #[test]
    fn test_depth_two_is_hilbert_order_two() {
        let mut curve = CurveState::default();
        curve.increase();
        assert_points_eq(
            curve.points(),
            &[
                [-1.5, -1.5], [-0.5, -1.5], [-0.5, -0.5], [-1.5, -0.5],
                [-1.5, 0.5], [-1.5, 1.5], [-0.5, 1.5], [-0.5, 0.5],
                [0.5, 0.5], [0.5, 1.5], [1.5, 1.5], [1.5, 0.5],
                [1.5, -0.5], [0.5, -0.5], [0.5, -1.5], [1.5, -1.5],
            ],
        );
    }

    #[test]
    fn test_consecutive_points_are_grid_neighbours() {
        // Every segment of a Hilbert strip has the same length at a given depth.
        let mut curve = CurveState::default();
        for _ in 0..3 {
            curve.increase();
        }
        let points = curve.points();
        let step = points[0].distance(points[1]);
        for pair in points.windows(2) {
            let d = pair[0].distance(pair[1]);
            assert!((d - step).abs() < 1e-4, "segment {d} != {step}");
        }
    }

    #[test]
    fn test_points_stay_inside_extent() {
        let mut curve = CurveState::new(8);
        while let DepthChange::Increased(_) = curve.increase() {}
        assert!(curve.points().iter().all(|p| p.abs().max_element() < 2.0));
    }

    #[test]
    fn test_reset_yields_base_square() {
        let mut curve = CurveState::default();
        for _ in 0..4 {
            curve.increase();
        }
        curve.reset();
        assert_eq!(curve.depth(), 1);
        assert_eq!(curve.points(), base_square().as_slice());
    }

    #[test]
    fn test_decrease_at_minimum_is_noop() {
        let mut curve = CurveState::default();
        let before = curve.points().to_vec();
        let revision = curve.revision();
        assert_eq!(curve.decrease(), DepthChange::AtMinimum);
        assert_eq!(curve.depth(), 1);
        assert_eq!(curve.points(), before.as_slice());
        assert_eq!(curve.revision(), revision);
    }

    #[test]
    fn test_increase_at_maximum_is_noop() {
        let mut curve = CurveState::new(2);
        curve.increase();
        let revision = curve.revision();
        assert_eq!(curve.increase(), DepthChange::AtMaximum(2));
        assert_eq!(curve.depth(), 2);
        assert_eq!(curve.points().len(), 16);
        assert_eq!(curve.revision(), revision);
    }

    #[test]
    fn test_up_then_down_restores_length() {
        let mut curve = CurveState::default();
        for d in 1..6 {
            assert_eq!(curve.depth(), d);
            let len = curve.points().len();
            curve.increase();
            assert_eq!(curve.decrease(), DepthChange::Decreased(d));
            assert_eq!(curve.points().len(), len);
            assert_eq!(curve.points().len(), 4usize.pow(d));
            curve.increase();
        }
    }

    #[test]
    fn test_decrease_recomputes_from_base() {
        let mut curve = CurveState::default();
        curve.increase();
        curve.increase();
        curve.decrease();
        let mut expected = base_square();
        expected = subdivide(&expected);
        assert_eq!(curve.points(), expected.as_slice());
    }

    #[test]
    fn test_max_depth_floor() {
        let curve = CurveState::new(0);
        assert_eq!(curve.max_depth(), 1);
    }

    #[test]
    fn test_oversized_max_depth_is_clamped() {
        for requested in [DEPTH_CEILING + 1, 16, u32::MAX] {
            let curve = CurveState::new(requested);
            assert_eq!(curve.max_depth(), DEPTH_CEILING);
        }
        assert_eq!(CurveState::new(DEPTH_CEILING).max_depth(), DEPTH_CEILING);
    }
}
