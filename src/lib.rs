//! cppn-art - animated imagery from a randomly weighted compositional pattern
//! producing network.
//!
//! Every frame feeds a per-pixel `(x, y, r)` grid plus two slowly drifting
//! latent scalars through a small feed-forward network and maps the sigmoid
//! output to RGBA bytes.

pub mod activation;
pub mod cppn;
pub mod encoding;
pub mod error;
pub mod forward;
pub mod frame;
pub mod grid;
pub mod latent;
pub mod scheduler;
pub mod settings;
pub mod sink;
pub mod weights;

pub use activation::Activation;
pub use cppn::{Cppn, RenderConfig};
pub use error::{CppnError, CppnResult};
pub use frame::{DisplaySurface, PixelBuffer};
pub use scheduler::{AnimationScheduler, FrameHost, FramePacer, SchedulerState, StopHandle};
pub use settings::RenderSettings;
