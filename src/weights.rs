//! Randomly initialized weights for the input layer, the intermediate layer
//! pool, and the output layer.
//!
//! The intermediate pool is always sampled at [`MAX_LAYERS`] entries; the
//! forward pass uses only a prefix, so changing the active layer count never
//! touches the weights.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::info;

use crate::error::{CppnError, CppnResult};
use crate::grid::NUM_SPATIAL_FEATURES;

pub const MAX_LAYERS: usize = 10;
pub const NUM_LATENT_FEATURES: usize = 2;
pub const NUM_INPUT_FEATURES: usize = NUM_SPATIAL_FEATURES + NUM_LATENT_FEATURES;
pub const NUM_OUTPUT_CHANNELS: usize = 3;

/// Samples farther than this many standard deviations from the mean are redrawn.
const TRUNCATION_STDEVS: f32 = 2.0;

pub type WeightMatrix = Array2<f32>;

/// One complete, shape-consistent set of network weights.
#[derive(Debug, Clone)]
pub struct WeightSet {
    hidden_width: usize,
    stdev: f32,
    input: WeightMatrix,
    intermediate: [WeightMatrix; MAX_LAYERS],
    output: WeightMatrix,
}

impl WeightSet {
    fn sample(rng: &mut StdRng, hidden_width: usize, stdev: f32) -> Self {
        let input = truncated_normal(rng, (NUM_INPUT_FEATURES, hidden_width), stdev);
        let intermediate =
            std::array::from_fn(|_| truncated_normal(rng, (hidden_width, hidden_width), stdev));
        let output = truncated_normal(rng, (hidden_width, NUM_OUTPUT_CHANNELS), stdev);
        Self {
            hidden_width,
            stdev,
            input,
            intermediate,
            output,
        }
    }

    pub fn hidden_width(&self) -> usize {
        self.hidden_width
    }

    pub fn stdev(&self) -> f32 {
        self.stdev
    }

    pub fn input(&self) -> &WeightMatrix {
        &self.input
    }

    /// The full pool in layer order, always [`MAX_LAYERS`] long.
    pub fn intermediate(&self) -> &[WeightMatrix] {
        &self.intermediate
    }

    pub fn output(&self) -> &WeightMatrix {
        &self.output
    }
}

/// Owns the current [`WeightSet`] and the random stream it is drawn from.
#[derive(Debug)]
pub struct WeightStore {
    rng: StdRng,
    current: Option<WeightSet>,
}

impl Default for WeightStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightStore {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            current: None,
        }
    }

    /// Reproducible weights. Successive regenerations still differ because
    /// they continue the same stream.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            current: None,
        }
    }

    /// Replaces every matrix with a freshly sampled set.
    ///
    /// Arguments are validated before anything is sampled. The previous set is
    /// dropped as soon as the new one is installed, so readers see either the
    /// old set or the new one, never a mix.
    pub fn regenerate(&mut self, hidden_width: usize, stdev: f32) -> CppnResult<()> {
        if hidden_width == 0 {
            return Err(CppnError::invalid("hidden_width", "must be > 0"));
        }
        if !stdev.is_finite() || stdev <= 0.0 {
            return Err(CppnError::invalid(
                "weight_stdev",
                format!("must be a positive finite number, got {stdev}"),
            ));
        }

        let next = WeightSet::sample(&mut self.rng, hidden_width, stdev);
        self.current = Some(next);
        info!(hidden_width, stdev, pool = MAX_LAYERS, "regenerated weights");
        Ok(())
    }

    pub fn current(&self) -> Option<&WeightSet> {
        self.current.as_ref()
    }
}

fn truncated_normal(rng: &mut StdRng, shape: (usize, usize), stdev: f32) -> WeightMatrix {
    Array2::from_shape_simple_fn(shape, || {
        loop {
            let z: f32 = rng.sample(StandardNormal);
            if z.abs() <= TRUNCATION_STDEVS {
                return z * stdev;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_produces_expected_shapes() {
        let mut store = WeightStore::with_seed(7);
        store.regenerate(30, 0.6).expect("regenerate should succeed");
        let set = store.current().expect("weights should exist");

        assert_eq!(set.input().dim(), (NUM_INPUT_FEATURES, 30));
        assert_eq!(set.intermediate().len(), MAX_LAYERS);
        for matrix in set.intermediate() {
            assert_eq!(matrix.dim(), (30, 30));
        }
        assert_eq!(set.output().dim(), (30, NUM_OUTPUT_CHANNELS));
    }

    #[test]
    fn successive_regenerations_differ_but_keep_shapes() {
        let mut store = WeightStore::with_seed(11);
        store.regenerate(8, 1.0).expect("first regenerate");
        let first = store.current().cloned().expect("first set");
        store.regenerate(8, 1.0).expect("second regenerate");
        let second = store.current().expect("second set");

        assert_eq!(first.input().dim(), second.input().dim());
        assert_eq!(first.output().dim(), second.output().dim());
        assert_ne!(first.input(), second.input());
    }

    #[test]
    fn width_change_replaces_every_matrix() {
        let mut store = WeightStore::with_seed(3);
        store.regenerate(4, 0.5).expect("regenerate");
        store.regenerate(12, 0.5).expect("regenerate wider");
        let set = store.current().expect("weights");

        assert_eq!(set.hidden_width(), 12);
        assert_eq!(set.input().dim(), (NUM_INPUT_FEATURES, 12));
        assert!(set.intermediate().iter().all(|m| m.dim() == (12, 12)));
        assert_eq!(set.output().dim(), (12, NUM_OUTPUT_CHANNELS));
    }

    #[test]
    fn samples_stay_within_truncation_bounds() {
        let mut store = WeightStore::with_seed(99);
        store.regenerate(64, 0.6).expect("regenerate");
        let set = store.current().expect("weights");
        let bound = 0.6 * TRUNCATION_STDEVS + 1e-6;

        let all = set
            .intermediate()
            .iter()
            .chain([set.input(), set.output()])
            .flat_map(|m| m.iter().copied());
        for value in all {
            assert!(value.abs() <= bound, "{value} escaped the truncation bound");
        }
    }

    #[test]
    fn same_seed_reproduces_weights() {
        let mut a = WeightStore::with_seed(42);
        let mut b = WeightStore::with_seed(42);
        a.regenerate(6, 0.6).expect("regenerate a");
        b.regenerate(6, 0.6).expect("regenerate b");
        assert_eq!(
            a.current().expect("a").output(),
            b.current().expect("b").output()
        );
    }

    #[test]
    fn invalid_arguments_leave_previous_weights_untouched() {
        let mut store = WeightStore::with_seed(5);
        store.regenerate(6, 0.6).expect("regenerate");
        let before = store.current().cloned().expect("weights");

        assert!(store.regenerate(0, 0.6).is_err());
        assert!(store.regenerate(6, 0.0).is_err());
        assert!(store.regenerate(6, -1.0).is_err());
        assert!(store.regenerate(6, f32::NAN).is_err());

        let after = store.current().expect("weights");
        assert_eq!(before.input(), after.input());
    }
}
