//! Douglas-Peucker line simplification.

use crate::point::Point;

/// Simplifies a sequence of points with the Douglas-Peucker algorithm.
///
/// The point with the largest orthogonal distance to the chord between the first and the last points is found.
/// If that distance is not less than `tolerance`, both halves around it are simplified recursively. Otherwise the
/// whole range is replaced with its end points.
///
/// For polygon rings (`is_polygon == true`) the top level call keeps the farthest point even when it is within
/// tolerance, so a ring never collapses into a two point segment. Nested calls do not do this.
///
/// The output only contains points of the input, and the first and the last points are always kept. Sequences of
/// less than three points are returned as is.
pub fn simplify(points: &[Point], tolerance: f64, is_polygon: bool) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    simplify_range(points, tolerance, is_polygon)
}

fn simplify_range(points: &[Point], tolerance: f64, keep_farthest: bool) -> Vec<Point> {
    let last = points.len() - 1;
    if last < 2 {
        return points.to_vec();
    }

    let first_point = points[0];
    let last_point = points[last];

    let mut max_distance = -1.0;
    let mut split = 1;
    for (index, point) in points.iter().enumerate().take(last).skip(1) {
        let distance = orthogonal_distance(point, &first_point, &last_point);
        if distance > max_distance {
            max_distance = distance;
            split = index;
        }
    }

    if max_distance >= tolerance {
        let mut result = simplify_range(&points[..=split], tolerance, false);
        // The split point starts the second half as well.
        result.pop();
        result.extend(simplify_range(&points[split..], tolerance, false));
        result
    } else if keep_farthest {
        vec![first_point, points[split], last_point]
    } else {
        vec![first_point, last_point]
    }
}

/// Distance from `point` to the line through `start` and `end`. If `start` and `end` are the same point, the
/// distance between the points is returned.
fn orthogonal_distance(point: &Point, start: &Point, end: &Point) -> f64 {
    let chord = *end - *start;
    let to_point = *point - *start;
    let chord_length = chord.norm();
    if chord_length == 0.0 {
        return to_point.norm();
    }

    chord.perp(&to_point).abs() / chord_length
}
