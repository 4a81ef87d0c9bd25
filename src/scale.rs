//! Color scale and colormap policy.
//!
//! Resolution never fails: it only computes the nominal scale. Whether a scale
//! suits a mode is checked separately by [`check_scale`] / [`enforce_scale`] so
//! each caller can pick its own policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrbitalError;
use crate::modes::RenderMode;

/// Diverging palette used by default and by the `sample` preset.
pub const DEFAULT_COLORMAP: &str = "RdYlBu_r";
/// Warm sequential palette behind the `sample_density` preset.
pub const DENSITY_PRESET_COLORMAP: &str = "YlOrRd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Log,
    Symlog,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Log => "log",
            Scale::Symlog => "symlog",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's scale choice before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleRequest {
    Auto,
    #[default]
    Linear,
    Log,
    Symlog,
}

impl FromStr for ScaleRequest {
    type Err = OrbitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ScaleRequest::Auto),
            "linear" => Ok(ScaleRequest::Linear),
            "log" => Ok(ScaleRequest::Log),
            "symlog" => Ok(ScaleRequest::Symlog),
            other => Err(OrbitalError::UnsupportedScale(other.to_string())),
        }
    }
}

/// `auto` becomes log for density-like modes and symlog otherwise; explicit
/// requests pass through unchanged.
pub fn resolve_scale(mode: RenderMode, requested: ScaleRequest) -> Scale {
    match requested {
        ScaleRequest::Auto if mode.is_density_like() => Scale::Log,
        ScaleRequest::Auto => Scale::Symlog,
        ScaleRequest::Linear => Scale::Linear,
        ScaleRequest::Log => Scale::Log,
        ScaleRequest::Symlog => Scale::Symlog,
    }
}

/// Log cannot show signed data; symlog is meaningless for a density.
pub fn check_scale(mode: RenderMode, scale: Scale) -> Result<(), OrbitalError> {
    let incompatible = match scale {
        Scale::Log => mode.is_signed(),
        Scale::Symlog => mode == RenderMode::Density,
        Scale::Linear => false,
    };
    if incompatible {
        Err(OrbitalError::IncompatibleScale { scale, mode })
    } else {
        Ok(())
    }
}

/// What a caller does with an incompatible scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleEnforcement {
    Reject,
    /// density + symlog -> linear, signed + log -> symlog.
    Coerce,
}

pub fn enforce_scale(
    mode: RenderMode,
    scale: Scale,
    enforcement: ScaleEnforcement,
) -> Result<Scale, OrbitalError> {
    match (check_scale(mode, scale), enforcement) {
        (Ok(()), _) => Ok(scale),
        (Err(err), ScaleEnforcement::Reject) => Err(err),
        (Err(_), ScaleEnforcement::Coerce) => {
            let coerced = if scale == Scale::Log {
                Scale::Symlog
            } else {
                Scale::Linear
            };
            log::warn!("scale {scale} cannot represent {mode}; using {coerced}");
            Ok(coerced)
        }
    }
}

/// Colormap name from the user's choice. `sample` and `sample_density` are
/// presets; anything else passes through. Density plots draw from the upper
/// half of whatever map this returns.
pub fn resolve_colormap(_mode: RenderMode, requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some("sample") => DEFAULT_COLORMAP.to_string(),
        Some("sample_density") => DENSITY_PRESET_COLORMAP.to_string(),
        Some(name) => name.to_string(),
        None => DEFAULT_COLORMAP.to_string(),
    }
}
