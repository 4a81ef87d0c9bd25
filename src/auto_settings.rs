//! Automatic viewing parameters, so most orbitals render well without manual
//! plane/value/range tuning. Manual overrides always take precedence in
//! [`decide`].

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTO_PLANE_POINTS, BOHR_RADIUS, DEFAULT_COVERAGE, DENSITY_EXTENT_MARGIN,
    EXTENT_SCAN_FACTOR, EXTENT_SCAN_POINTS, FALLBACK_EXTENT_A0, FALLBACK_SUPPORT_A0,
    MAX_COVERAGE, MIN_AUTO_EXTENT_A0, MIN_COVERAGE, NODE_EXTENT_MARGIN,
    PLANE_SCORE_PERCENTILE, SUPPORT_CUTOFF, SUPPORT_EXTENT_MARGIN,
};
use crate::error::OrbitalError;
use crate::modes::{evaluate_render_mode, RenderMode};
use crate::physics::{radial_values, wavefunction};
use crate::quantum_numbers::QuantumNumbers;
use crate::scale::{enforce_scale, resolve_scale, Scale, ScaleEnforcement, ScaleRequest};
use crate::slicing::{build_plane_grid, Plane};

/// Suggested half-range in units of a0.
///
/// Density-like modes cover `coverage` of the radial probability (clamped to
/// [0.95, 0.999]); signed modes frame the visible radial amplitude and keep the
/// outermost radial node in view.
pub fn auto_extent_a0(qn: QuantumNumbers, mode: RenderMode, coverage: f64) -> f64 {
    let coverage = if coverage.is_nan() {
        DEFAULT_COVERAGE
    } else {
        coverage.clamp(MIN_COVERAGE, MAX_COVERAGE)
    };

    let n = qn.n() as f64;
    let r_max = EXTENT_SCAN_FACTOR * n * n * BOHR_RADIUS;
    let r = Array1::linspace(0.0, r_max, EXTENT_SCAN_POINTS);
    let radial = radial_values(qn, &r);

    let (raw_extent, max_extent) = if mode.is_density_like() {
        (
            coverage_extent_a0(&r, &radial, coverage),
            f64::max(10.0, 8.0 * n),
        )
    } else {
        (
            support_extent_a0(&r, &radial),
            f64::max(10.0, (6.0 + 2.0 * qn.l() as f64) * n),
        )
    };

    let extent = raw_extent.clamp(MIN_AUTO_EXTENT_A0, max_extent);
    log::debug!(
        "auto extent for {} ({mode}): raw {raw_extent:.3} a0 -> {extent:.3} a0",
        qn.label()
    );
    extent
}

/// Smallest radius enclosing `coverage` of r^2 |R|^2, with a margin.
fn coverage_extent_a0(r: &Array1<f64>, radial: &Array1<f64>, coverage: f64) -> f64 {
    let len = r.len();
    let mut cumulative = vec![0.0; len];
    let mut total = 0.0;
    for i in 1..len {
        let dr = r[i] - r[i - 1];
        let d0 = r[i - 1] * r[i - 1] * radial[i - 1] * radial[i - 1];
        let d1 = r[i] * r[i] * radial[i] * radial[i];
        total += 0.5 * (d0 + d1) * dr;
        cumulative[i] = total;
    }
    let total = if total > 0.0 { total } else { 1.0 };

    let idx = cumulative
        .iter()
        .position(|&c| c / total >= coverage)
        .unwrap_or(len)
        .clamp(1, len - 1);
    DENSITY_EXTENT_MARGIN * r[idx] / BOHR_RADIUS
}

/// Extent from the outermost visible amplitude and the outermost radial node.
fn support_extent_a0(r: &Array1<f64>, radial: &Array1<f64>) -> f64 {
    let peak = radial
        .iter()
        .filter(|v| !v.is_nan())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if peak <= 0.0 {
        return FALLBACK_EXTENT_A0;
    }

    let cutoff = peak * SUPPORT_CUTOFF;
    let len = radial.len();
    let support_radius = (0..len)
        .rev()
        .find(|&i| radial[i].abs() >= cutoff)
        .map(|i| r[i])
        .unwrap_or(FALLBACK_SUPPORT_A0 * BOHR_RADIUS);

    let last_node = (0..len.saturating_sub(1))
        .rev()
        .find(|&i| sign(radial[i]) * sign(radial[i + 1]) < 0.0)
        .map(|i| r[i]);

    match last_node {
        Some(node) => {
            f64::max(SUPPORT_EXTENT_MARGIN * support_radius, NODE_EXTENT_MARGIN * node) / BOHR_RADIUS
        }
        None => SUPPORT_EXTENT_MARGIN * support_radius / BOHR_RADIUS,
    }
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Pick the central plane (x=0, y=0 or z=0) with the strongest non-trivial
/// signal for `mode`. Candidates are scored in parallel; ties go to the earlier
/// plane in z, x, y order.
pub fn auto_plane_and_value(
    qn: QuantumNumbers,
    mode: RenderMode,
    extent_a0: f64,
) -> Result<(Plane, f64), OrbitalError> {
    if !mode.is_slice_field() {
        return Err(OrbitalError::UnsupportedMode(mode.to_string()));
    }

    let scores = Plane::PRIORITY
        .as_slice()
        .par_iter()
        .map(|&plane| plane_score(qn, mode, plane, extent_a0))
        .collect::<Result<Vec<f64>, OrbitalError>>()?;

    let mut best_plane = Plane::Z;
    let mut best_score = -1.0;
    for (&plane, score) in Plane::PRIORITY.iter().zip(scores) {
        log::debug!("plane {plane}=0 scores {score:.6e} for {} ({mode})", qn.label());
        if score > best_score {
            best_score = score;
            best_plane = plane;
        }
    }

    Ok((best_plane, 0.0))
}

/// 99.5th percentile of |field| plus its standard deviation.
fn plane_score(
    qn: QuantumNumbers,
    mode: RenderMode,
    plane: Plane,
    extent_a0: f64,
) -> Result<f64, OrbitalError> {
    let grid = build_plane_grid(plane, 0.0, extent_a0, AUTO_PLANE_POINTS)?;
    let (r, theta, phi) = grid.spherical();
    let psi = wavefunction(qn, &r, &theta, &phi);
    let field = evaluate_render_mode(&psi, mode)?.magnitude();

    Ok(percentile_abs(&field, PLANE_SCORE_PERCENTILE) + std_dev(&field))
}

/// Linearly interpolated percentile of |values|, ignoring NaN.
fn percentile_abs(values: &Array2<f64>, q: f64) -> f64 {
    let mut sorted: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| v.abs())
        .collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Population standard deviation, ignoring NaN.
fn std_dev(values: &Array2<f64>) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    let count = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / count;
    (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count).sqrt()
}

/// Viewing parameters handed to the rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderDecision {
    pub plane: Plane,
    pub value_a0: f64,
    pub extent_a0: f64,
    pub scale: Scale,
}

/// Manual choices that replace the heuristics when present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub plane: Option<Plane>,
    pub value_a0: Option<f64>,
    pub extent_a0: Option<f64>,
    pub scale: ScaleRequest,
}

/// Combine overrides with the heuristics into one [`RenderDecision`].
///
/// Modes without a planar slice (radial distribution, spherical harmonic)
/// skip plane selection and report `z` unless a plane was given.
pub fn decide(
    qn: QuantumNumbers,
    mode: RenderMode,
    overrides: &Overrides,
    enforcement: ScaleEnforcement,
) -> Result<RenderDecision, OrbitalError> {
    let extent_a0 = match overrides.extent_a0 {
        Some(extent) if extent.is_finite() && extent > 0.0 => extent,
        Some(extent) => {
            return Err(OrbitalError::InvalidGrid(format!(
                "range must be positive, got {extent}"
            )))
        }
        None => auto_extent_a0(qn, mode, DEFAULT_COVERAGE),
    };

    let (plane, auto_value) = match overrides.plane {
        Some(plane) => (plane, 0.0),
        None if mode.is_slice_field() => auto_plane_and_value(qn, mode, extent_a0)?,
        None => (Plane::Z, 0.0),
    };

    let scale = enforce_scale(mode, resolve_scale(mode, overrides.scale), enforcement)?;

    Ok(RenderDecision {
        plane,
        value_a0: overrides.value_a0.unwrap_or(auto_value),
        extent_a0,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn qn(n: i64, l: i64, m: i64) -> QuantumNumbers {
        QuantumNumbers::new(n, l, m).unwrap()
    }

    fn extent(n: i64, l: i64, mode: RenderMode) -> f64 {
        auto_extent_a0(qn(n, l, 0), mode, DEFAULT_COVERAGE)
    }

    #[test]
    fn test_auto_extent_is_positive_and_grows_with_n() {
        let e1 = extent(1, 0, RenderMode::Real);
        let e3 = extent(3, 1, RenderMode::Real);
        assert!(e1 > 0.0);
        assert!(e3 > e1);
    }

    #[test]
    fn test_auto_extent_for_3s_real_is_not_excessive() {
        assert!(extent(3, 0, RenderMode::Real) <= 20.0);
    }

    #[test]
    fn test_auto_extent_for_4d_real_allows_wider_view() {
        assert!(extent(4, 2, RenderMode::Real) >= 28.0);
    }

    #[test]
    fn test_auto_extent_density_1s_covers_probability() {
        // 99% of the 1s probability lies within ~4.2 a0.
        let e = extent(1, 0, RenderMode::Density);
        assert!(e > 4.6 && e < 5.1, "extent = {e}");
        assert_eq!(e, extent(1, 0, RenderMode::RadialDistribution));
    }

    #[test]
    fn test_auto_extent_clamps_coverage() {
        let state = qn(2, 0, 0);
        assert_eq!(
            auto_extent_a0(state, RenderMode::Density, 0.5),
            auto_extent_a0(state, RenderMode::Density, 0.95)
        );
        assert_eq!(
            auto_extent_a0(state, RenderMode::Density, 1.0),
            auto_extent_a0(state, RenderMode::Density, 0.999)
        );
    }

    #[test]
    fn test_auto_extent_nan_coverage_uses_default() {
        for state in [qn(1, 0, 0), qn(3, 1, 0)] {
            assert_eq!(
                auto_extent_a0(state, RenderMode::Density, f64::NAN),
                auto_extent_a0(state, RenderMode::Density, DEFAULT_COVERAGE)
            );
        }
    }

    #[test]
    fn test_auto_extent_stays_within_bounds() {
        for n in 1..=8 {
            for l in 0..n {
                for mode in [RenderMode::Density, RenderMode::Real, RenderMode::RealImag] {
                    let e = extent(n, l, mode);
                    assert!(e.is_finite());
                    assert!(e >= MIN_AUTO_EXTENT_A0);
                    let widest = f64::max(8.0, 6.0 + 2.0 * l as f64) * n as f64;
                    assert!(e <= f64::max(10.0, widest));
                }
            }
        }
    }

    #[test]
    fn test_degenerate_radial_profiles_use_fallbacks() {
        let r = Array1::linspace(0.0, 10.0 * BOHR_RADIUS, 11);
        let zeros = Array1::zeros(11);
        assert_eq!(support_extent_a0(&r, &zeros), FALLBACK_EXTENT_A0);
        let e = coverage_extent_a0(&r, &zeros, 0.99);
        assert!((e - DENSITY_EXTENT_MARGIN * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_support_extent_prefers_outer_node() {
        let r = Array1::linspace(0.0, 10.0 * BOHR_RADIUS, 11);
        let radial = array![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 0.0, 0.0];
        // Node between 6 and 7 a0, support ends at 8 a0.
        let e = support_extent_a0(&r, &radial);
        assert!((e - f64::max(1.25 * 8.0, 1.8 * 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_auto_plane_avoids_degenerate_slice_for_2p_m0_real() {
        let (plane, value) = auto_plane_and_value(qn(2, 1, 0), RenderMode::Real, 8.0).unwrap();
        assert!(plane == Plane::X || plane == Plane::Y);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_auto_plane_ties_go_to_z() {
        let (plane, _) = auto_plane_and_value(qn(1, 0, 0), RenderMode::Density, 6.0).unwrap();
        assert_eq!(plane, Plane::Z);
    }

    #[test]
    fn test_auto_plane_rejects_profile_modes() {
        assert!(matches!(
            auto_plane_and_value(qn(2, 1, 0), RenderMode::RadialDistribution, 8.0),
            Err(OrbitalError::UnsupportedMode(_))
        ));
        assert!(matches!(
            auto_plane_and_value(qn(2, 1, 0), RenderMode::Real, 0.0),
            Err(OrbitalError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_percentile_and_std() {
        let values = Array2::from_shape_vec((2, 2), vec![-4.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(percentile_abs(&values, 100.0), 4.0);
        assert_eq!(percentile_abs(&values, 0.0), 1.0);
        assert!((percentile_abs(&values, 50.0) - 2.5).abs() < 1e-12);
        assert!((std_dev(&values) - 2.692582403567252).abs() < 1e-12);
    }

    #[test]
    fn test_decide_honours_overrides() {
        let overrides = Overrides {
            plane: Some(Plane::Y),
            value_a0: Some(1.5),
            extent_a0: Some(12.0),
            scale: ScaleRequest::Auto,
        };
        let decision = decide(qn(3, 2, 1), RenderMode::Real, &overrides, ScaleEnforcement::Reject)
            .unwrap();
        assert_eq!(
            decision,
            RenderDecision {
                plane: Plane::Y,
                value_a0: 1.5,
                extent_a0: 12.0,
                scale: Scale::Symlog,
            }
        );
    }

    #[test]
    fn test_decide_fills_in_heuristics() {
        let state = qn(2, 1, 0);
        let decision =
            decide(state, RenderMode::Real, &Overrides::default(), ScaleEnforcement::Reject)
                .unwrap();
        assert_eq!(decision.extent_a0, auto_extent_a0(state, RenderMode::Real, 0.99));
        assert_ne!(decision.plane, Plane::Z);
        assert_eq!(decision.value_a0, 0.0);
        assert_eq!(decision.scale, Scale::Linear);
    }

    #[test]
    fn test_decide_scale_policy() {
        let overrides = Overrides {
            scale: ScaleRequest::Symlog,
            ..Overrides::default()
        };
        let state = qn(1, 0, 0);
        assert!(matches!(
            decide(state, RenderMode::Density, &overrides, ScaleEnforcement::Reject),
            Err(OrbitalError::IncompatibleScale { .. })
        ));
        let decision =
            decide(state, RenderMode::Density, &overrides, ScaleEnforcement::Coerce).unwrap();
        assert_eq!(decision.scale, Scale::Linear);

        let bad_range = Overrides {
            extent_a0: Some(-2.0),
            ..Overrides::default()
        };
        assert!(matches!(
            decide(state, RenderMode::Real, &bad_range, ScaleEnforcement::Reject),
            Err(OrbitalError::InvalidGrid(_))
        ));
    }
}
