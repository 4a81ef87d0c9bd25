//! Planar slices through 3D space and the cartesian to spherical mapping the
//! analytic wavefunction needs.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array, Array1, Array2, Dimension, Zip};
use serde::{Deserialize, Serialize};

use crate::constants::BOHR_RADIUS;
use crate::error::OrbitalError;

/// The axis held constant by a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    X,
    Y,
    Z,
}

impl Plane {
    /// Candidate order for automatic selection; earlier planes win ties.
    pub const PRIORITY: [Plane; 3] = [Plane::Z, Plane::X, Plane::Y];

    pub fn as_str(self) -> &'static str {
        match self {
            Plane::X => "x",
            Plane::Y => "y",
            Plane::Z => "z",
        }
    }

    /// Labels of the two free axes, in (u, v) order.
    pub fn free_axis_labels(self) -> (&'static str, &'static str) {
        match self {
            Plane::X => ("Y", "Z"),
            Plane::Y => ("X", "Z"),
            Plane::Z => ("X", "Y"),
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plane {
    type Err = OrbitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x" => Ok(Plane::X),
            "y" => Ok(Plane::Y),
            "z" => Ok(Plane::Z),
            other => Err(OrbitalError::UnsupportedPlane(other.to_string())),
        }
    }
}

/// 2D slice geometry with its 3D embedding.
///
/// `u`/`v` are display coordinates in units of a0; `x`/`y`/`z` are the matching
/// physical coordinates in metres. Row `i`, column `j` holds `u = axis[j]`,
/// `v = axis[i]`.
#[derive(Debug, Clone)]
pub struct SliceGrid {
    pub plane: Plane,
    pub value_a0: f64,
    pub axis: Array1<f64>,
    pub u: Array2<f64>,
    pub v: Array2<f64>,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
    pub u_label: &'static str,
    pub v_label: &'static str,
    pub plane_label: String,
}

impl SliceGrid {
    /// Spherical coordinates (r, theta, phi) of every grid node.
    pub fn spherical(&self) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        spherical_unchecked(&self.x, &self.y, &self.z)
    }
}

/// Build a `points x points` lattice over [-extent_a0, extent_a0]^2 on the two
/// free axes, with the fixed axis held at `value_a0`.
pub fn build_plane_grid(
    plane: Plane,
    value_a0: f64,
    extent_a0: f64,
    points: usize,
) -> Result<SliceGrid, OrbitalError> {
    if !(extent_a0.is_finite() && extent_a0 > 0.0) {
        return Err(OrbitalError::InvalidGrid(format!(
            "extent must be positive, got {extent_a0}"
        )));
    }
    if points < 2 {
        return Err(OrbitalError::InvalidGrid(format!(
            "at least 2 points per axis are required, got {points}"
        )));
    }
    if !value_a0.is_finite() {
        return Err(OrbitalError::InvalidGrid(format!(
            "plane value must be finite, got {value_a0}"
        )));
    }

    let axis = Array1::linspace(-extent_a0, extent_a0, points);
    let u = Array2::from_shape_fn((points, points), |(_, j)| axis[j]);
    let v = Array2::from_shape_fn((points, points), |(i, _)| axis[i]);
    let fixed = Array2::from_elem((points, points), value_a0 * BOHR_RADIUS);
    let u_m = &u * BOHR_RADIUS;
    let v_m = &v * BOHR_RADIUS;

    let (x, y, z) = match plane {
        Plane::X => (fixed, u_m, v_m),
        Plane::Y => (u_m, fixed, v_m),
        Plane::Z => (u_m, v_m, fixed),
    };
    let (u_label, v_label) = plane.free_axis_labels();

    Ok(SliceGrid {
        plane,
        value_a0,
        axis,
        u,
        v,
        x,
        y,
        z,
        u_label,
        v_label,
        plane_label: format!("{plane}={value_a0} a0"),
    })
}

/// Convert cartesian coordinates to (r, theta, phi).
///
/// theta lies in [0, pi] and is defined as 0 at the origin; phi = atan2(y, x).
pub fn cartesian_to_spherical<D: Dimension>(
    x: &Array<f64, D>,
    y: &Array<f64, D>,
    z: &Array<f64, D>,
) -> Result<(Array<f64, D>, Array<f64, D>, Array<f64, D>), OrbitalError> {
    if x.shape() != y.shape() || x.shape() != z.shape() {
        return Err(OrbitalError::ShapeMismatch);
    }
    Ok(spherical_unchecked(x, y, z))
}

fn spherical_unchecked<D: Dimension>(
    x: &Array<f64, D>,
    y: &Array<f64, D>,
    z: &Array<f64, D>,
) -> (Array<f64, D>, Array<f64, D>, Array<f64, D>) {
    let r = Zip::from(x)
        .and(y)
        .and(z)
        .map_collect(|&x, &y, &z| (x * x + y * y + z * z).sqrt());
    let theta = Zip::from(&r).and(z).map_collect(|&r, &z| {
        let safe_r = if r == 0.0 { 1.0 } else { r };
        let theta = (z / safe_r).clamp(-1.0, 1.0).acos();
        if r == 0.0 {
            0.0
        } else {
            theta
        }
    });
    let phi = Zip::from(y).and(x).map_collect(|&y, &x| y.atan2(x));
    (r, theta, phi)
}

/// theta/phi lattice for spherical-harmonic maps: rows sweep theta over [0, pi],
/// columns sweep phi over [-pi, pi].
#[derive(Debug, Clone)]
pub struct AngleGrid {
    pub theta: Array2<f64>,
    pub phi: Array2<f64>,
}

pub fn angle_grid(points: usize) -> Result<AngleGrid, OrbitalError> {
    if points < 2 {
        return Err(OrbitalError::InvalidGrid(format!(
            "at least 2 points per axis are required, got {points}"
        )));
    }
    let theta_axis = Array1::linspace(0.0, PI, points);
    let phi_axis = Array1::linspace(-PI, PI, points);
    Ok(AngleGrid {
        theta: Array2::from_shape_fn((points, points), |(i, _)| theta_axis[i]),
        phi: Array2::from_shape_fn((points, points), |(_, j)| phi_axis[j]),
    })
}
