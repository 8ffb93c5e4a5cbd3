//! Bounded box spaces of observations and actions.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A box in `R^n` given by elementwise lower and upper bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    /// Lower bounds.
    pub low: Vec<f32>,

    /// Upper bounds.
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// Creates a box space.
    ///
    /// `low` and `high` must have the same length.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        debug_assert_eq!(low.len(), high.len());
        Self { low, high }
    }

    /// A box with identical bounds `[low, high]` in each of `dim` coordinates.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self::new(vec![low; dim], vec![high; dim])
    }

    /// Dimensionality of the space.
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Returns `true` if `x` has the dimension of the space and lies inside it.
    pub fn contains(&self, x: &[f32]) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }

    /// Samples a point uniformly inside the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f32> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(lo, hi)| lo + (hi - lo) * rng.gen::<f32>())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sample_is_contained() {
        let space = BoxSpace::new(vec![-1.0, 0.0], vec![1.0, 5.0]);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let x = space.sample(&mut rng);
            assert!(space.contains(&x));
        }
        assert!(!space.contains(&[0.0]));
        assert!(!space.contains(&[2.0, 1.0]));
    }
}
