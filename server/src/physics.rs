use serde::Serialize;

///Represents a vector in 2D world space.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f64,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen coordinates.
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector.
    /// Zero-length and non-finite vectors normalize to zero.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 || !mag.is_finite() {
            Vector2::ZERO
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f64) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the euclidean distance between two points.
    pub fn distance(&self, other: &Vector2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    ///Returns the point clamped into `[0, width] x [0, height]`, each axis independently.
    pub fn clamp_to_bounds(&self, width: f64, height: f64) -> Vector2 {
        Vector2 {
            x: self.x.clamp(0.0, width),
            y: self.y.clamp(0.0, height),
        }
    }
}

///True when two circles strictly overlap. Touching circles do not.
pub fn circles_overlap(a: &Vector2, ra: f64, b: &Vector2, rb: f64) -> bool {
    a.distance(b) < ra + rb
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_magnitude() {
        assert_eq!(Vector2::new(3.0, 4.0).magnitude(), 5.0);
        assert_eq!(Vector2::ZERO.magnitude(), 0.0);
    }

    #[test]
    fn test_normalize_unit_length() {
        let n = Vector2::new(3.0, -4.0).normalize();
        assert_approx_eq!(n.x, 0.6, 1e-12);
        assert_approx_eq!(n.y, -0.8, 1e-12);
        assert_approx_eq!(n.magnitude(), 1.0, 1e-12);
    }

    #[test]
    fn test_normalize_zero_and_nan() {
        assert_eq!(Vector2::ZERO.normalize(), Vector2::ZERO);
        assert_eq!(Vector2::new(f64::NAN, 1.0).normalize(), Vector2::ZERO);
        assert_eq!(Vector2::new(f64::INFINITY, 0.0).normalize(), Vector2::ZERO);
    }

    #[test]
    fn test_scale_and_add() {
        let v = Vector2::new(1.0, 2.0).scale(3.0).add(&Vector2::new(0.5, -1.0));
        assert_eq!(v, Vector2::new(3.5, 5.0));
    }

    #[test]
    fn test_distance() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(6.0, 8.0);
        assert_eq!(a.distance(&b), 10.0);
        assert_eq!(b.distance(&a), 10.0);
    }

    #[test]
    fn test_clamp_is_per_axis() {
        let clamped = Vector2::new(-3.0, 2500.0).clamp_to_bounds(2000.0, 2000.0);
        assert_eq!(clamped, Vector2::new(0.0, 2000.0));

        let inside = Vector2::new(10.0, 20.0).clamp_to_bounds(2000.0, 2000.0);
        assert_eq!(inside, Vector2::new(10.0, 20.0));
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        let a = Vector2::new(0.0, 0.0);
        assert!(circles_overlap(&a, 10.0, &Vector2::new(19.0, 0.0), 10.0));
        assert!(!circles_overlap(&a, 10.0, &Vector2::new(20.0, 0.0), 10.0));
        assert!(!circles_overlap(&a, 10.0, &Vector2::new(50.0, 0.0), 10.0));
    }
}
