//! Render modes and the conversion of complex psi into displayable fields.
//!
//! - density: |psi|^2
//! - real: Re(psi)
//! - imag: Im(psi)
//! - real_imag: Re(psi) and Im(psi) side by side
//!
//! `radial_distribution` and `spherical_harmonic` are not slice fields; they
//! select dedicated profiles and are rejected by [`evaluate_mode`].

use std::fmt;
use std::str::FromStr;

use ndarray::{Array, Dimension, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::OrbitalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Density,
    Real,
    Imag,
    RealImag,
    RadialDistribution,
    SphericalHarmonic,
}

impl RenderMode {
    pub const ALL: [RenderMode; 6] = [
        RenderMode::Density,
        RenderMode::Real,
        RenderMode::Imag,
        RenderMode::RealImag,
        RenderMode::RadialDistribution,
        RenderMode::SphericalHarmonic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Density => "density",
            RenderMode::Real => "real",
            RenderMode::Imag => "imag",
            RenderMode::RealImag => "real_imag",
            RenderMode::RadialDistribution => "radial_distribution",
            RenderMode::SphericalHarmonic => "spherical_harmonic",
        }
    }

    /// Modes whose values can be negative.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            RenderMode::Real | RenderMode::Imag | RenderMode::RealImag | RenderMode::SphericalHarmonic
        )
    }

    /// Modes that display a probability density.
    pub fn is_density_like(self) -> bool {
        matches!(self, RenderMode::Density | RenderMode::RadialDistribution)
    }

    /// Modes that evaluate psi on a planar slice.
    pub fn is_slice_field(self) -> bool {
        matches!(
            self,
            RenderMode::Density | RenderMode::Real | RenderMode::Imag | RenderMode::RealImag
        )
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = OrbitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| OrbitalError::UnsupportedMode(s.to_string()))
    }
}

/// Real-valued data derived from psi.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeData<D: Dimension> {
    Scalar(Array<f64, D>),
    RealImag {
        real: Array<f64, D>,
        imag: Array<f64, D>,
    },
}

impl<D: Dimension> ModeData<D> {
    /// One comparable field: the scalar itself, or hypot(re, im) for pairs.
    pub fn magnitude(&self) -> Array<f64, D> {
        match self {
            ModeData::Scalar(field) => field.clone(),
            ModeData::RealImag { real, imag } => {
                Zip::from(real).and(imag).map_collect(|&re, &im| re.hypot(im))
            }
        }
    }
}

/// Convert complex psi into the field(s) for a named mode.
pub fn evaluate_mode<D: Dimension>(
    psi: &Array<Complex64, D>,
    mode: &str,
) -> Result<ModeData<D>, OrbitalError> {
    evaluate_render_mode(psi, mode.parse()?)
}

pub fn evaluate_render_mode<D: Dimension>(
    psi: &Array<Complex64, D>,
    mode: RenderMode,
) -> Result<ModeData<D>, OrbitalError> {
    match mode {
        RenderMode::Density => Ok(ModeData::Scalar(psi.mapv(|c| c.norm_sqr()))),
        RenderMode::Real => Ok(ModeData::Scalar(psi.mapv(|c| c.re))),
        RenderMode::Imag => Ok(ModeData::Scalar(psi.mapv(|c| c.im))),
        RenderMode::RealImag => Ok(ModeData::RealImag {
            real: psi.mapv(|c| c.re),
            imag: psi.mapv(|c| c.im),
        }),
        RenderMode::RadialDistribution | RenderMode::SphericalHarmonic => {
            Err(OrbitalError::UnsupportedMode(mode.to_string()))
        }
    }
}
