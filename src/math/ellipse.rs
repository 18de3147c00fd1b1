use nalgebra::Vector2;

/// Newton iterations allowed when projecting onto the ellipse
const MAX_ITERATIONS: usize = 32;

/// Axis-aligned ellipse `(x/a)^2 + (y/b)^2 = 1` centered at the origin.
///
/// Used to clamp a two axis swing against a cone limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    a: f32,
    b: f32,
}

impl Ellipse {
    /// Creates an ellipse with half axes `a` (along x) and `b` (along y)
    pub fn new(a: f32, b: f32) -> Self {
        debug_assert!(a > 0.0 && b > 0.0, "ellipse half axes must be positive");
        Self { a, b }
    }

    /// Returns true if the point lies inside or on the ellipse
    pub fn is_inside(&self, point: Vector2<f32>) -> bool {
        (point.x / self.a).powi(2) + (point.y / self.b).powi(2) <= 1.0
    }

    /// Returns the point on the ellipse closest to `point`.
    ///
    /// Solves `g(t) = (a x / (t + a^2))^2 + (b y / (t + b^2))^2 - 1 = 0` with Newton-Raphson,
    /// the closest point then being `(a^2 x / (t + a^2), b^2 y / (t + b^2))`.
    pub fn closest_point(&self, point: Vector2<f32>) -> Vector2<f32> {
        let a_sq = self.a * self.a;
        let b_sq = self.b * self.b;

        let mut t = 0.0f32;
        for _ in 0..MAX_ITERATIONS {
            let t_plus_a_sq = t + a_sq;
            let t_plus_b_sq = t + b_sq;
            let gt = (self.a * point.x / t_plus_a_sq).powi(2)
                + (self.b * point.y / t_plus_b_sq).powi(2)
                - 1.0;
            if gt.abs() < 1.0e-6 {
                break;
            }

            let gt_prime = -2.0
                * (a_sq * point.x * point.x / t_plus_a_sq.powi(3)
                    + b_sq * point.y * point.y / t_plus_b_sq.powi(3));
            if gt_prime == 0.0 {
                break;
            }
            t -= gt / gt_prime;
        }

        Vector2::new(a_sq * point.x / (t + a_sq), b_sq * point.y / (t + b_sq))
    }
}
