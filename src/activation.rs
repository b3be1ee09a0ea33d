use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::CppnError;

/// Element-wise nonlinearity applied after every hidden matrix multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Tanh,
    Sin,
    Relu,
    Step,
}

impl Activation {
    pub const ALL: [Activation; 4] = [Self::Tanh, Self::Sin, Self::Relu, Self::Step];

    pub fn name(self) -> &'static str {
        match self {
            Self::Tanh => "tanh",
            Self::Sin => "sin",
            Self::Relu => "relu",
            Self::Step => "step",
        }
    }

    #[inline(always)]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Tanh => x.tanh(),
            Self::Sin => x.sin(),
            Self::Relu => x.max(0.0),
            Self::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl FromStr for Activation {
    type Err = CppnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|activation| activation.name() == name)
            .ok_or_else(|| {
                CppnError::invalid(
                    "activation",
                    format!("unknown activation '{name}' (expected tanh, sin, relu, or step)"),
                )
            })
    }
}

impl Display for Activation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
