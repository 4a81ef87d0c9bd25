//! Analytic hydrogen orbitals for 2D visualization.
//!
//! Evaluates psi_{n,l,m}(r, theta, phi) = R_{n,l}(r) * Y_l^m(theta, phi) in closed
//! form and derives what a renderer needs: slice grids, displayable fields,
//! an automatic viewing extent, an automatic slice plane and the color scale.
//!
//! Extents and plane values crossing this API are in units of the Bohr radius;
//! coordinates passed to the wavefunction are in metres.

pub mod auto_settings;
pub mod constants;
pub mod error;
pub mod modes;
pub mod physics;
pub mod pipeline;
pub mod quantum_numbers;
pub mod render;
pub mod scale;
pub mod slicing;

pub use auto_settings::{auto_extent_a0, auto_plane_and_value, decide, Overrides, RenderDecision};
pub use error::OrbitalError;
pub use modes::{evaluate_mode, evaluate_render_mode, ModeData, RenderMode};
pub use physics::{hydrogen_wavefunction, radial_distribution, radial_wavefunction, spherical_harmonic};
pub use quantum_numbers::{parse_quantum_numbers, QuantumNumbers};
pub use scale::{
    check_scale, enforce_scale, resolve_colormap, resolve_scale, Scale, ScaleEnforcement,
    ScaleRequest,
};
pub use slicing::{angle_grid, build_plane_grid, cartesian_to_spherical, AngleGrid, Plane, SliceGrid};
