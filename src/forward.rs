//! Forward pass of the pattern network.
//!
//! Input rows are `(x, y, r, z1, z2)`: the static coordinate grid with the two
//! latent scalars broadcast across every pixel. The hidden layers are plain
//! matrix products followed by the selected activation; the output layer is
//! squashed through a sigmoid so every channel lands in `[0, 1]`. No other
//! normalization happens; weight spread and depth are the contrast controls.

use ndarray::{s, Array2, ArrayView3};

use crate::activation::Activation;
use crate::error::{CppnError, CppnResult};
use crate::grid::{CoordinateGrid, NUM_SPATIAL_FEATURES};
use crate::weights::{WeightSet, NUM_INPUT_FEATURES, NUM_OUTPUT_CHANNELS};

/// Per-pixel RGB values in `[0, 1]`, one row per pixel in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    resolution: usize,
    values: Array2<f32>,
}

impl OutputTensor {
    pub fn from_values(resolution: usize, values: Array2<f32>) -> CppnResult<Self> {
        let expected = (resolution * resolution, NUM_OUTPUT_CHANNELS);
        if values.dim() != expected {
            return Err(CppnError::ShapeMismatch {
                context: "output tensor",
                expected,
                actual: values.dim(),
            });
        }
        Ok(Self { resolution, values })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Flat `resolution² x 3` view.
    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// `resolution x resolution x 3` view; pixel `(i, j)` is grid row `i * resolution + j`.
    pub fn image_view(&self) -> CppnResult<ArrayView3<'_, f32>> {
        let size = self.resolution;
        self.values
            .view()
            .into_shape((size, size, NUM_OUTPUT_CHANNELS))
            .map_err(|_| CppnError::ShapeMismatch {
                context: "output reshape",
                expected: (size * size, NUM_OUTPUT_CHANNELS),
                actual: self.values.dim(),
            })
    }

    pub fn pixel(&self, row: usize, col: usize) -> [f32; 3] {
        let values = self.values.row(row * self.resolution + col);
        [values[0], values[1], values[2]]
    }
}

/// Runs one frame through the network.
///
/// `num_layers` selects how many entries of the intermediate pool are applied,
/// starting at index 0.
pub fn compute_frame(
    grid: &CoordinateGrid,
    latents: (f32, f32),
    weights: &WeightSet,
    activation: Activation,
    num_layers: usize,
) -> CppnResult<OutputTensor> {
    let pool = weights.intermediate();
    if num_layers > pool.len() {
        return Err(CppnError::invalid(
            "layers",
            format!("{num_layers} exceeds the pool of {} layers", pool.len()),
        ));
    }
    check_shapes(weights, num_layers)?;

    let pixels = grid.rows();
    let mut input = Array2::<f32>::zeros((pixels, NUM_INPUT_FEATURES));
    input
        .slice_mut(s![.., ..NUM_SPATIAL_FEATURES])
        .assign(grid.features());
    input.column_mut(NUM_SPATIAL_FEATURES).fill(latents.0);
    input.column_mut(NUM_SPATIAL_FEATURES + 1).fill(latents.1);

    let mut hidden = input.dot(weights.input());
    hidden.mapv_inplace(|x| activation.apply(x));

    for layer in &pool[..num_layers] {
        hidden = hidden.dot(layer);
        hidden.mapv_inplace(|x| activation.apply(x));
    }

    let mut output = hidden.dot(weights.output());
    output.mapv_inplace(sigmoid);

    OutputTensor::from_values(grid.resolution(), output)
}

fn check_shapes(weights: &WeightSet, num_layers: usize) -> CppnResult<()> {
    let width = weights.hidden_width();
    let require = |context: &'static str, matrix: &Array2<f32>, expected: (usize, usize)| {
        if matrix.dim() == expected {
            Ok(())
        } else {
            Err(CppnError::ShapeMismatch {
                context,
                expected,
                actual: matrix.dim(),
            })
        }
    };

    require("input layer", weights.input(), (NUM_INPUT_FEATURES, width))?;
    for layer in &weights.intermediate()[..num_layers] {
        require("intermediate layer", layer, (width, width))?;
    }
    require("output layer", weights.output(), (width, NUM_OUTPUT_CHANNELS))
}

#[inline(always)]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
