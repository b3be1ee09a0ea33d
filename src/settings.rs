//! Render settings loaded from YAML, with `key=value` overrides from the
//! command line applied on top.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::cppn::{Cppn, RenderConfig};
use crate::latent::{scale_from_speed, LatentClock, SPEED_SCALE_CEILING};
use crate::weights::{WeightStore, MAX_LAYERS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSettings {
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    #[serde(default = "default_hidden_width")]
    pub hidden_width: usize,
    #[serde(default = "default_weight_stdev")]
    pub weight_stdev: f32,
    #[serde(default = "default_layers")]
    pub layers: usize,
    #[serde(default = "default_activation")]
    pub activation: String,
    #[serde(default = "default_speed")]
    pub z1_speed: f32,
    #[serde(default = "default_speed")]
    pub z2_speed: f32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub frames: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            hidden_width: default_hidden_width(),
            weight_stdev: default_weight_stdev(),
            layers: default_layers(),
            activation: default_activation(),
            z1_speed: default_speed(),
            z2_speed: default_speed(),
            seed: None,
            fps: default_fps(),
            frames: None,
        }
    }
}

fn default_resolution() -> usize {
    128
}

fn default_hidden_width() -> usize {
    30
}

fn default_weight_stdev() -> f32 {
    0.6
}

fn default_layers() -> usize {
    2
}

fn default_activation() -> String {
    Activation::Tanh.name().to_owned()
}

fn default_speed() -> f32 {
    1.0
}

fn default_fps() -> u32 {
    30
}

impl RenderSettings {
    /// Reads `path` when given; otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|error| {
            let location = error
                .location()
                .map(|location| format!("line {}, column {}", location.line(), location.column()))
                .unwrap_or_else(|| "unknown location".to_owned());
            anyhow!("failed to parse settings yaml at {}: {}", location, error)
        })
    }

    pub fn apply_override(&mut self, raw: &str) -> Result<()> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("override '{raw}' must look like key=value"))?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            bail!("override '{raw}' has an empty key");
        }

        match key {
            "resolution" => self.resolution = parse_value(key, value)?,
            "hidden_width" => self.hidden_width = parse_value(key, value)?,
            "weight_stdev" => self.weight_stdev = parse_value(key, value)?,
            "layers" => self.layers = parse_value(key, value)?,
            "activation" => self.activation = value.to_owned(),
            "z1_speed" => self.z1_speed = parse_value(key, value)?,
            "z2_speed" => self.z2_speed = parse_value(key, value)?,
            "seed" => self.seed = Some(parse_value(key, value)?),
            "fps" => self.fps = parse_value(key, value)?,
            "frames" => self.frames = Some(parse_value(key, value)?),
            other => bail!("unknown setting '{other}'"),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            bail!("resolution must be > 0");
        }
        if self.hidden_width == 0 {
            bail!("hidden_width must be > 0");
        }
        if !self.weight_stdev.is_finite() || self.weight_stdev <= 0.0 {
            bail!("weight_stdev must be > 0, got {}", self.weight_stdev);
        }
        if self.layers == 0 || self.layers > MAX_LAYERS {
            bail!("layers must be within 1..={MAX_LAYERS}, got {}", self.layers);
        }
        self.activation_kind()?;
        for (field, speed) in [("z1_speed", self.z1_speed), ("z2_speed", self.z2_speed)] {
            if !speed.is_finite() || speed >= SPEED_SCALE_CEILING {
                bail!(
                    "{field} must be below {SPEED_SCALE_CEILING}, got {speed} (scale would not be positive)"
                );
            }
        }
        if self.fps == 0 {
            bail!("fps must be > 0");
        }
        if self.frames == Some(0) {
            bail!("frames must be > 0 when set");
        }
        Ok(())
    }

    pub fn activation_kind(&self) -> Result<Activation> {
        Ok(self.activation.parse::<Activation>()?)
    }

    pub fn render_config(&self) -> Result<RenderConfig> {
        Ok(RenderConfig {
            activation: self.activation_kind()?,
            num_layers: self.layers,
            resolution: self.resolution,
        })
    }

    /// A network with weights already generated, ready to render.
    pub fn build_cppn(&self) -> Result<Cppn> {
        self.validate()?;
        let weights = match self.seed {
            Some(seed) => WeightStore::with_seed(seed),
            None => WeightStore::new(),
        };
        let clock = LatentClock::new(
            scale_from_speed(self.z1_speed),
            scale_from_speed(self.z2_speed),
        )?;
        let mut cppn = Cppn::new(self.render_config()?, weights, clock)?;
        cppn.generate_weights(self.hidden_width, self.weight_stdev)?;
        Ok(cppn)
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|error| anyhow!("invalid value '{value}' for '{key}': {error}"))
}
