//! The network as the host sees it: one object holding the coordinate grid,
//! the weights, the latent clock, and the render configuration, mutated only
//! through validating setters between frames.

use tracing::{debug, info};

use crate::activation::Activation;
use crate::error::{CppnError, CppnResult};
use crate::forward::{compute_frame, OutputTensor};
use crate::frame::{render, PixelBuffer};
use crate::grid::CoordinateGrid;
use crate::latent::{scale_from_speed, LatentClock};
use crate::weights::{WeightStore, MAX_LAYERS};

/// Values read once per frame by the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub activation: Activation,
    pub num_layers: usize,
    pub resolution: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            activation: Activation::Tanh,
            num_layers: 2,
            resolution: 128,
        }
    }
}

#[derive(Debug)]
pub struct Cppn {
    config: RenderConfig,
    grid: CoordinateGrid,
    weights: WeightStore,
    clock: LatentClock,
}

impl Cppn {
    /// Builds the grid for `config.resolution`. Weights stay empty until
    /// [`Cppn::generate_weights`] is called.
    pub fn new(config: RenderConfig, weights: WeightStore, clock: LatentClock) -> CppnResult<Self> {
        check_layers(config.num_layers)?;
        let grid = CoordinateGrid::build(config.resolution)?;
        Ok(Self {
            config,
            grid,
            weights,
            clock,
        })
    }

    pub fn config(&self) -> RenderConfig {
        self.config
    }

    pub fn clock(&self) -> &LatentClock {
        &self.clock
    }

    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    pub fn generate_weights(&mut self, hidden_width: usize, stdev: f32) -> CppnResult<()> {
        self.weights.regenerate(hidden_width, stdev)
    }

    pub fn set_activation(&mut self, activation: Activation) {
        self.config.activation = activation;
    }

    pub fn set_activation_name(&mut self, name: &str) -> CppnResult<()> {
        self.config.activation = name.parse()?;
        Ok(())
    }

    pub fn set_num_layers(&mut self, num_layers: usize) -> CppnResult<()> {
        check_layers(num_layers)?;
        self.config.num_layers = num_layers;
        Ok(())
    }

    pub fn set_z1_scale(&mut self, scale: f32) -> CppnResult<()> {
        self.clock.set_z1_scale(scale)
    }

    pub fn set_z2_scale(&mut self, scale: f32) -> CppnResult<()> {
        self.clock.set_z2_scale(scale)
    }

    /// Speed controls run from slow to fast; see [`scale_from_speed`].
    pub fn set_z1_speed(&mut self, speed: f32) -> CppnResult<()> {
        self.clock.set_z1_scale(scale_from_speed(speed))
    }

    pub fn set_z2_speed(&mut self, speed: f32) -> CppnResult<()> {
        self.clock.set_z2_scale(scale_from_speed(speed))
    }

    /// Rebuilds the coordinate grid. A no-op when the resolution is unchanged.
    pub fn set_resolution(&mut self, resolution: usize) -> CppnResult<()> {
        if resolution == self.config.resolution {
            return Ok(());
        }
        self.grid = CoordinateGrid::build(resolution)?;
        self.config.resolution = resolution;
        info!(resolution, "rebuilt coordinate grid");
        Ok(())
    }

    /// Advances the latent clock and runs the network once.
    pub fn step(&mut self) -> CppnResult<OutputTensor> {
        let weights = self
            .weights
            .current()
            .ok_or_else(|| CppnError::invalid("weights", "generate weights before rendering"))?;
        let latents = self.clock.tick();
        debug!(z1 = latents.0, z2 = latents.1, "computing frame");
        compute_frame(
            &self.grid,
            latents,
            weights,
            self.config.activation,
            self.config.num_layers,
        )
    }

    pub fn render_frame(&mut self) -> CppnResult<PixelBuffer> {
        let output = self.step()?;
        Ok(render(&output))
    }
}

fn check_layers(num_layers: usize) -> CppnResult<()> {
    if num_layers == 0 || num_layers > MAX_LAYERS {
        return Err(CppnError::invalid(
            "layers",
            format!("must be within 1..={MAX_LAYERS}, got {num_layers}"),
        ));
    }
    Ok(())
}
