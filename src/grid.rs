//! Static per-pixel spatial features fed to the first network layer.

use ndarray::Array2;

use crate::error::{CppnError, CppnResult};

/// x, y, r
pub const NUM_SPATIAL_FEATURES: usize = 3;

/// Row `i * resolution + j` holds `(x, y, r)` for pixel row `i`, column `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    resolution: usize,
    features: Array2<f32>,
}

impl CoordinateGrid {
    pub fn build(resolution: usize) -> CppnResult<Self> {
        if resolution == 0 {
            return Err(CppnError::invalid("resolution", "must be > 0"));
        }

        let mut features = Array2::<f32>::zeros((resolution * resolution, NUM_SPATIAL_FEATURES));
        for i in 0..resolution {
            let y = unit_span(i, resolution);
            for j in 0..resolution {
                let x = unit_span(j, resolution);
                let mut row = features.row_mut(i * resolution + j);
                row[0] = x;
                row[1] = y;
                row[2] = (x * x + y * y).sqrt();
            }
        }

        Ok(Self {
            resolution,
            features,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }
}

/// Maps `index` in `0..len` linearly onto `[-1, 1]`. A single sample sits at the center.
fn unit_span(index: usize, len: usize) -> f32 {
    if len < 2 {
        return 0.0;
    }
    (index as f32 / (len - 1) as f32) * 2.0 - 1.0
}
