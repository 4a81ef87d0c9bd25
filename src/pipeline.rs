//! Glue between the pieces: slice evaluation, harmonic maps and output naming,
//! shared by the CLI and the web service.

use ndarray::Ix2;

use crate::error::OrbitalError;
use crate::modes::{evaluate_render_mode, ModeData, RenderMode};
use crate::physics::{spherical_harmonic, wavefunction};
use crate::quantum_numbers::QuantumNumbers;
use crate::slicing::{angle_grid, AngleGrid, SliceGrid};

/// psi on a slice grid, converted for `mode`.
pub fn evaluate_slice(
    qn: QuantumNumbers,
    mode: RenderMode,
    grid: &SliceGrid,
) -> Result<ModeData<Ix2>, OrbitalError> {
    let (r, theta, phi) = grid.spherical();
    let psi = wavefunction(qn, &r, &theta, &phi);
    evaluate_render_mode(&psi, mode)
}

/// Re/Im of Y_l^m over a `points x points` theta/phi lattice.
pub fn spherical_harmonic_map(
    qn: QuantumNumbers,
    points: usize,
) -> Result<(AngleGrid, ModeData<Ix2>), OrbitalError> {
    let grid = angle_grid(points)?;
    let ylm = spherical_harmonic(qn.l(), qn.m(), &grid.theta, &grid.phi)?;
    let data = ModeData::RealImag {
        real: ylm.mapv(|c| c.re),
        imag: ylm.mapv(|c| c.im),
    };
    Ok((grid, data))
}

/// Descriptive PNG name, e.g. `orbital_n2_l1_m0_real_z0p0.png`. `plane` is a
/// free-form tag so profile modes can pass `r` or `angles`.
pub fn default_output_name(
    qn: QuantumNumbers,
    mode: RenderMode,
    plane: &str,
    value_a0: f64,
) -> String {
    let value_tag = format!("{value_a0:?}").replace('-', "m").replace('.', "p");
    format!(
        "orbital_n{}_l{}_m{}_{mode}_{plane}{value_tag}.png",
        qn.n(),
        qn.l(),
        qn.m()
    )
}
