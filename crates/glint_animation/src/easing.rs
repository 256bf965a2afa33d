//! Easing curves

use std::fmt;
use std::str::FromStr;

/// Maps linear progress `t` in `[0, 1]` onto eased progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Easing {
    #[default]
    Linear,
    CubicIn,
    CubicOut,
    CubicInOut,
}

fn cubic_in(t: f32) -> f32 {
    t * t * t
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::CubicIn => cubic_in(t),
            Easing::CubicOut => 1.0 - cubic_in(1.0 - t),
            Easing::CubicInOut => {
                if t < 0.5 {
                    cubic_in(2.0 * t) / 2.0
                } else {
                    1.0 - cubic_in(2.0 * (1.0 - t)) / 2.0
                }
            }
        }
    }

    /// Name used by the binding layer
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::CubicIn => "cubicIn",
            Easing::CubicOut => "cubicOut",
            Easing::CubicInOut => "cubicInOut",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Easing::Linear),
            "cubicIn" => Ok(Easing::CubicIn),
            "cubicOut" => Ok(Easing::CubicOut),
            "cubicInOut" => Ok(Easing::CubicInOut),
            other => Err(format!("unknown easing `{other}`")),
        }
    }
}
