//! Piecewise linear track

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A track made of straight paths between consecutive nodes.
///
/// The first and last paths extend indefinitely past their end nodes. With
/// fewer than two distinct nodes the track is the X axis.
#[derive(Debug, Clone, Default)]
pub struct Track {
    paths: Vec<Path>,
}

/// Position of a point relative to the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Distance along the track of the nearest point on it
    pub dist_m: f64,

    /// Signed distance from the track, positive to the left
    pub offset_m: f64,
}

#[derive(Debug, Clone)]
struct Path {
    start: [f64; 2],

    /// Unit direction from start to end node
    dir: [f64; 2],

    length_m: f64,

    /// Distance along the track of the start node
    start_dist_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Track {
    /// Build a track through the given `[x, y]` nodes, in meters.
    ///
    /// Repeated nodes are skipped.
    pub fn new(nodes: &[[f64; 2]]) -> Self {
        let mut paths = Vec::new();
        let mut start_dist_m = 0.0;

        for pair in nodes.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
            let length_m = dx.hypot(dy);

            if length_m <= 0.0 {
                continue;
            }

            paths.push(Path {
                start: a,
                dir: [dx / length_m, dy / length_m],
                length_m,
                start_dist_m,
            });
            start_dist_m += length_m;
        }

        Self { paths }
    }

    /// Project a point onto the nearest path of the track.
    pub fn project(&self, x_m: f64, y_m: f64) -> TrackPoint {
        if self.paths.is_empty() {
            return TrackPoint {
                dist_m: x_m,
                offset_m: y_m,
            };
        }

        let last = self.paths.len() - 1;
        let mut nearest: Option<(f64, TrackPoint)> = None;

        for (i, path) in self.paths.iter().enumerate() {
            let (rx, ry) = (x_m - path.start[0], y_m - path.start[1]);

            // Distance along this path, open ended on the outer paths
            let mut t = rx * path.dir[0] + ry * path.dir[1];
            if i != 0 {
                t = t.max(0.0);
            }
            if i != last {
                t = t.min(path.length_m);
            }

            let gap_m = (rx - t * path.dir[0]).hypot(ry - t * path.dir[1]);

            if nearest.map_or(true, |(g, _)| gap_m < g) {
                nearest = Some((
                    gap_m,
                    TrackPoint {
                        dist_m: path.start_dist_m + t,
                        offset_m: path.dir[0] * ry - path.dir[1] * rx,
                    },
                ));
            }
        }

        match nearest {
            Some((_, p)) => p,
            None => TrackPoint {
                dist_m: x_m,
                offset_m: y_m,
            },
        }
    }

    /// Total length between the first and last nodes.
    pub fn length_m(&self) -> f64 {
        self.paths
            .last()
            .map_or(0.0, |p| p.start_dist_m + p.length_m)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn assert_point(p: TrackPoint, dist_m: f64, offset_m: f64) {
        assert!((p.dist_m - dist_m).abs() < 1e-12, "{:?}", p);
        assert!((p.offset_m - offset_m).abs() < 1e-12, "{:?}", p);
    }

    #[test]
    fn test_default_is_x_axis() {
        let track = Track::new(&[]);
        assert_point(track.project(1.5, -0.2), 1.5, -0.2);
        assert_eq!(track.length_m(), 0.0);

        // A single node or repeated nodes have no paths either
        let track = Track::new(&[[1.0, 1.0], [1.0, 1.0]]);
        assert_point(track.project(0.3, 0.1), 0.3, 0.1);
    }

    #[test]
    fn test_corner() {
        let track = Track::new(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert_eq!(track.length_m(), 2.0);

        assert_point(track.project(0.5, 0.1), 0.5, 0.1);

        // Right of the second path, which heads along +Y
        assert_point(track.project(1.2, 0.5), 1.5, -0.2);

        // Open ended before the first node and after the last
        assert_point(track.project(-0.5, -0.05), -0.5, -0.05);
        assert_point(track.project(1.0, 1.5), 2.5, 0.0);
    }
}
