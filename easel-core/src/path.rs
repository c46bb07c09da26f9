//! Stroke geometry shared by every renderer.
//!
//! Freehand input arrives as a raw point sequence. Short paths become a
//! plain polyline; longer paths are smoothed by emitting quadratic
//! curves control-pointed at each captured point and ending at the
//! midpoint to the next one. This midpoint heuristic is intentionally
//! simple (not a spline fit) and must be reproduced exactly by all
//! renderers so strokes look the same in every export tier.

use std::fmt::Write;

use crate::element::Point;

/// Minimum bounding-box padding around a stroke, in pixels.
const MIN_PADDING: f64 = 10.0;

/// One command of an encoded stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Move the pen without drawing.
    MoveTo(Point),
    /// Straight segment to a point.
    LineTo(Point),
    /// Quadratic curve through a control point.
    QuadTo {
        /// Control point.
        ctrl: Point,
        /// End point.
        to: Point,
    },
}

/// Axis-aligned bounding box of a stroke, padded for brush width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathBounds {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl PathBounds {
    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A stroke encoded as drawing commands plus its padded bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePath {
    /// Ordered drawing commands, starting with a move.
    pub commands: Vec<PathCommand>,
    /// Bounding box padded by `max(brush_size, 10)` on every side.
    pub bounds: PathBounds,
}

impl StrokePath {
    /// Render the commands as SVG path data, translated so `origin`
    /// becomes `(0, 0)`. Pass the bounds origin to get a local frame, or
    /// `Point::new(0.0, 0.0)` for canvas coordinates.
    #[must_use]
    pub fn to_svg_data(&self, origin: Point) -> String {
        let mut data = String::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    let _ = write!(data, "M {} {}", p.x - origin.x, p.y - origin.y);
                }
                PathCommand::LineTo(p) => {
                    let _ = write!(data, " L {} {}", p.x - origin.x, p.y - origin.y);
                }
                PathCommand::QuadTo { ctrl, to } => {
                    let _ = write!(
                        data,
                        " Q {} {} {} {}",
                        ctrl.x - origin.x,
                        ctrl.y - origin.y,
                        to.x - origin.x,
                        to.y - origin.y
                    );
                }
            }
        }
        data
    }

    /// Flatten the stroke into a polyline, sampling each quadratic
    /// segment at `steps` evenly spaced parameters. Used by backends
    /// whose path operators cannot express curves.
    #[must_use]
    pub fn flatten(&self, steps: u32) -> Vec<Point> {
        let steps = steps.max(1);
        let mut points = Vec::new();
        let mut cursor = Point::new(0.0, 0.0);

        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => {
                    points.push(p);
                    cursor = p;
                }
                PathCommand::QuadTo { ctrl, to } => {
                    for step in 1..=steps {
                        let t = f64::from(step) / f64::from(steps);
                        let u = 1.0 - t;
                        points.push(Point::new(
                            u * u * cursor.x + 2.0 * u * t * ctrl.x + t * t * to.x,
                            u * u * cursor.y + 2.0 * u * t * ctrl.y + t * t * to.y,
                        ));
                    }
                    cursor = to;
                }
            }
        }
        points
    }
}

/// Encode a captured point sequence into stable stroke geometry.
///
/// Fewer than three points produce a straight polyline. Three or more
/// produce the midpoint-smoothed quadratic chain: a curve through each
/// interior point ending at the midpoint toward its successor, then one
/// final curve through the second-to-last point into the last.
///
/// Returns `None` for paths with fewer than two points; the validator
/// rejects those before they reach a renderer.
#[must_use]
pub fn encode(points: &[Point], brush_size: f64) -> Option<StrokePath> {
    if points.len() < 2 {
        return None;
    }

    let mut commands = Vec::with_capacity(points.len());
    commands.push(PathCommand::MoveTo(points[0]));

    if points.len() < 3 {
        for point in &points[1..] {
            commands.push(PathCommand::LineTo(*point));
        }
    } else {
        for i in 1..points.len() - 2 {
            let mid = Point::new(
                (points[i].x + points[i + 1].x) / 2.0,
                (points[i].y + points[i + 1].y) / 2.0,
            );
            commands.push(PathCommand::QuadTo {
                ctrl: points[i],
                to: mid,
            });
        }
        commands.push(PathCommand::QuadTo {
            ctrl: points[points.len() - 2],
            to: points[points.len() - 1],
        });
    }

    Some(StrokePath {
        commands,
        bounds: bounds_of(points, brush_size),
    })
}

/// Min/max over all points, expanded by `max(brush_size, 10)` per side.
fn bounds_of(points: &[Point], brush_size: f64) -> PathBounds {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    let padding = brush_size.max(MIN_PADDING);
    PathBounds {
        min_x: min_x - padding,
        min_y: min_y - padding,
        max_x: max_x + padding,
        max_y: max_y + padding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_single_point_rejected() {
        assert!(encode(&pts(&[(1.0, 1.0)]), 3.0).is_none());
        assert!(encode(&[], 3.0).is_none());
    }

    #[test]
    fn test_two_points_straight_line() {
        let stroke = encode(&pts(&[(0.0, 0.0), (10.0, 10.0)]), 3.0).expect("encode");
        assert_eq!(stroke.commands.len(), 2);
        assert!(matches!(stroke.commands[0], PathCommand::MoveTo(_)));
        assert!(matches!(stroke.commands[1], PathCommand::LineTo(_)));
    }

    #[test]
    fn test_three_or_more_points_quadratics_only() {
        let stroke = encode(
            &pts(&[(0.0, 0.0), (10.0, 5.0), (20.0, 0.0), (30.0, 5.0), (40.0, 0.0)]),
            3.0,
        )
        .expect("encode");

        assert!(matches!(stroke.commands[0], PathCommand::MoveTo(_)));
        for command in &stroke.commands[1..] {
            assert!(
                matches!(command, PathCommand::QuadTo { .. }),
                "smoothed paths must contain no straight segments: {command:?}"
            );
        }
    }

    #[test]
    fn test_midpoint_control_points() {
        let stroke = encode(&pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]), 3.0).expect("encode");
        // One interior curve landing through the second-to-last point.
        assert_eq!(stroke.commands.len(), 2);
        match stroke.commands[1] {
            PathCommand::QuadTo { ctrl, to } => {
                assert!((ctrl.x - 10.0).abs() < f64::EPSILON);
                assert!((to.x - 20.0).abs() < f64::EPSILON);
            }
            other => panic!("expected quadratic, got {other:?}"),
        }
    }

    #[test]
    fn test_bounds_padding() {
        let stroke = encode(&pts(&[(10.0, 10.0), (30.0, 40.0)]), 3.0).expect("encode");
        // Brush 3 is below the 10px floor.
        assert!((stroke.bounds.min_x - 0.0).abs() < f64::EPSILON);
        assert!((stroke.bounds.min_y - 0.0).abs() < f64::EPSILON);
        assert!((stroke.bounds.max_x - 40.0).abs() < f64::EPSILON);
        assert!((stroke.bounds.max_y - 50.0).abs() < f64::EPSILON);

        let wide = encode(&pts(&[(20.0, 20.0), (30.0, 30.0)]), 16.0).expect("encode");
        assert!((wide.bounds.min_x - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_svg_data_local_frame() {
        let stroke = encode(&pts(&[(10.0, 10.0), (20.0, 20.0)]), 3.0).expect("encode");
        let origin = Point::new(stroke.bounds.min_x, stroke.bounds.min_y);
        let data = stroke.to_svg_data(origin);
        assert_eq!(data, "M 10 10 L 20 20");
    }

    #[test]
    fn test_flatten_follows_curve_endpoints() {
        let stroke = encode(&pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]), 3.0).expect("encode");
        let flat = stroke.flatten(8);
        let last = flat.last().expect("points");
        assert!((last.x - 20.0).abs() < 1e-9);
        assert!(last.y.abs() < 1e-9);
    }
}
