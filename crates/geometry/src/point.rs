//! Point helpers shared by the landmark geometry functions

/// A normalized 2D landmark, x and y in [0, 1].
pub type Point2 = (f32, f32);

/// Euclidean distance between two points.
pub fn euclidean_dist(a: Point2, b: Point2) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Centroid of the landmarks selected by `indices`.
/// Returns `None` when any index is out of bounds or `indices` is empty.
pub fn average_point(landmarks: &[Point2], indices: &[usize]) -> Option<Point2> {
    if indices.is_empty() {
        return None;
    }
    let mut sum_x = 0.0f32;
    let mut sum_y = 0.0f32;
    for &idx in indices {
        let (x, y) = *landmarks.get(idx)?;
        sum_x += x;
        sum_y += y;
    }
    let n = indices.len() as f32;
    Some((sum_x / n, sum_y / n))
}

/// Check whether a value falls inside an inclusive range.
/// A missing value stays missing rather than failing the check.
pub fn in_range(value: Option<f32>, range: (f32, f32)) -> Option<bool> {
    value.map(|v| range.0 <= v && v <= range.1)
}
