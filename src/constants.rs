//! Physical constants and numerical defaults.
//!
//! Lengths are SI metres unless a name ends in `_A0`, in which case the value
//! is a dimensionless multiple of the Bohr radius.

/// Bohr radius in metres.
pub const BOHR_RADIUS: f64 = 5.291_772_109_03e-11;

/// Default number of samples per grid axis.
pub const DEFAULT_POINTS: usize = 401;

/// Smallest grid the CLI accepts; coarser grids give unusable contours.
pub const MIN_CLI_POINTS: usize = 25;

/// Grid resolution used when scoring candidate slice planes.
pub const AUTO_PLANE_POINTS: usize = 121;

/// Radial samples used by the extent heuristic.
pub const EXTENT_SCAN_POINTS: usize = 12_000;

/// The extent scan covers [0, EXTENT_SCAN_FACTOR * n^2 * a0].
pub const EXTENT_SCAN_FACTOR: f64 = 12.0;

pub const DEFAULT_COVERAGE: f64 = 0.99;
pub const MIN_COVERAGE: f64 = 0.95;
pub const MAX_COVERAGE: f64 = 0.999;

pub const DENSITY_EXTENT_MARGIN: f64 = 1.15;
pub const SUPPORT_EXTENT_MARGIN: f64 = 1.25;
pub const NODE_EXTENT_MARGIN: f64 = 1.8;

/// Fraction of the peak |R| still treated as visible support.
pub const SUPPORT_CUTOFF: f64 = 2e-3;

/// Extent used when the radial function has no measurable amplitude.
pub const FALLBACK_EXTENT_A0: f64 = 6.0;

/// Support radius assumed when no sample clears the cutoff.
pub const FALLBACK_SUPPORT_A0: f64 = 4.0;

pub const MIN_AUTO_EXTENT_A0: f64 = 4.0;

/// Percentile of |field| used as the peak term when scoring planes.
pub const PLANE_SCORE_PERCENTILE: f64 = 99.5;
