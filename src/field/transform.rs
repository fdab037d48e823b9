//! Player-relative reprojection

use super::observation::Observation;

/// Moves absolute positions into the player's frame.
///
/// Client coordinates grow downward; display coordinates grow upward, so the
/// vertical offset is negated. Velocities pass through untouched: their
/// vertical flip is carried by the negative y gain in the vector aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    pub origin_x: f64,
    pub origin_y: f64,
}

impl CoordinateTransformer {
    pub fn new(origin_x: f64, origin_y: f64) -> Self {
        Self { origin_x, origin_y }
    }

    pub fn to_player_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.origin_x, -(y - self.origin_y))
    }

    pub fn apply(&self, observation: &Observation) -> Observation {
        let (x, y) = self.to_player_frame(observation.x, observation.y);
        Observation {
            x,
            y,
            ..*observation
        }
    }

    pub fn apply_all(&self, observations: &[Observation]) -> Vec<Observation> {
        observations.iter().map(|o| self.apply(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_vertical_offset() {
        let t = CoordinateTransformer::new(100.0, 200.0);
        assert_eq!(t.to_player_frame(110.0, 190.0), (10.0, 10.0));
        assert_eq!(t.to_player_frame(90.0, 230.0), (-10.0, -30.0));
    }

    #[test]
    fn keeps_weight_and_velocity() {
        let t = CoordinateTransformer::new(0.0, 0.0);
        let obs = Observation::new(5.0, 5.0, 10.0).with_velocity(1.0, 2.0);
        let moved = t.apply(&obs);
        assert_eq!((moved.x, moved.y), (5.0, -5.0));
        assert_eq!(moved.weight, 10.0);
        assert_eq!(moved.velocity, Some((1.0, 2.0)));
    }
}
