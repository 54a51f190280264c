use crate::heatmap::types::{Circle, TransformedPoint};

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Euclidean distance between two points.
pub fn distance(a: TransformedPoint, b: TransformedPoint) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Circle centred on the centroid of `members` that reaches the farthest
/// member, widened by `padding`.
pub fn enclosing_circle(members: &[TransformedPoint], padding: f64) -> Circle {
    let xs: Vec<f64> = members.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = members.iter().map(|p| p.y).collect();
    let center = TransformedPoint {
        x: mean(&xs),
        y: mean(&ys),
    };

    let radius = members
        .iter()
        .map(|p| distance(*p, center))
        .fold(0.0, f64::max);

    Circle {
        cx: center.x,
        cy: center.y,
        r: radius + padding,
    }
}
