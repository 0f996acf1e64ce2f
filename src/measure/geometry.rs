use crate::pose::Keypoint;

/// 2点間のユークリッド距離（ピクセル）
pub fn distance(a: &Keypoint, b: &Keypoint) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// 楕円周のラマヌジャン近似
///
/// C = π(a+b)(1 + 3h / (10 + √(4 − 3h)))、h = (a−b)² / (a+b)²
/// 半軸 a, b は同一単位であればよい（cm でも px でも）。
pub fn ellipse_circumference(a: f32, b: f32) -> f32 {
    let sum = a + b;
    if sum <= 0.0 {
        return 0.0;
    }
    let diff = a - b;
    let h = (diff * diff) / (sum * sum);
    std::f32::consts::PI * sum * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_distance() {
        let a = Keypoint::new(0.0, 0.0, 1.0);
        let b = Keypoint::new(3.0, 4.0, 1.0);
        assert!(approx_eq(distance(&a, &b), 5.0, 1e-6));
    }

    #[test]
    fn test_distance_same_point() {
        let a = Keypoint::new(7.0, 7.0, 1.0);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_circle_case() {
        // a == b は円: C = 2πr
        let c = ellipse_circumference(10.0, 10.0);
        assert!(approx_eq(c, 2.0 * std::f32::consts::PI * 10.0, 1e-3));
    }

    #[test]
    fn test_ellipse_symmetry() {
        let c1 = ellipse_circumference(12.0, 8.0);
        let c2 = ellipse_circumference(8.0, 12.0);
        assert!(approx_eq(c1, c2, 1e-6));
    }

    #[test]
    fn test_ellipse_known_value() {
        // a=15, b=10 のラマヌジャン近似は約 79.27
        let c = ellipse_circumference(15.0, 10.0);
        assert!(approx_eq(c, 79.27, 0.05), "circumference was {}", c);
    }

    #[test]
    fn test_degenerate_axes() {
        assert_eq!(ellipse_circumference(0.0, 0.0), 0.0);
    }
}
