//! Hydrogen atom wavefunction evaluation.
//!
//! psi_{n,l,m}(r, theta, phi) = R_{n,l}(r) * Y_l^m(theta, phi), evaluated from the
//! closed-form expressions with generalized Laguerre and associated Legendre
//! polynomials. Radii are in metres.

use std::f64::consts::PI;

use ndarray::{Array, Array1, Dimension, Zip};
use num_complex::Complex64;

use crate::constants::BOHR_RADIUS;
use crate::error::OrbitalError;
use crate::quantum_numbers::QuantumNumbers;

/// R_{n,l}(r) over an array of radii (metres).
///
/// R = N * exp(-rho/2) * rho^l * L_{n-l-1}^{2l+1}(rho), with rho = 2r / (n a0) and
/// N = (2 / (n a0))^(3/2) * sqrt((n-l-1)! / (2n (n+l)!)).
pub fn radial_wavefunction<D: Dimension>(
    n: u32,
    l: u32,
    r: &Array<f64, D>,
) -> Result<Array<f64, D>, OrbitalError> {
    let qn = QuantumNumbers::new(n.into(), l.into(), 0)?;
    Ok(radial_values(qn, r))
}

pub(crate) fn radial_values<D: Dimension>(qn: QuantumNumbers, r: &Array<f64, D>) -> Array<f64, D> {
    let norm = radial_normalization(qn.n(), qn.l());
    r.mapv(|r| radial_at(norm, qn.n(), qn.l(), r))
}

/// Complex spherical harmonic Y_l^m(theta, phi) with Condon-Shortley phase.
pub fn spherical_harmonic<D: Dimension>(
    l: u32,
    m: i32,
    theta: &Array<f64, D>,
    phi: &Array<f64, D>,
) -> Result<Array<Complex64, D>, OrbitalError> {
    // The smallest shell that can host this l is enough to validate (l, m).
    QuantumNumbers::new(i64::from(l) + 1, l.into(), m.into())?;
    if theta.shape() != phi.shape() {
        return Err(OrbitalError::ShapeMismatch);
    }
    let norm = harmonic_normalization(l, m.unsigned_abs());
    Ok(Zip::from(theta)
        .and(phi)
        .map_collect(|&theta, &phi| harmonic_at(norm, l, m, theta, phi)))
}

/// Full hydrogen wavefunction psi_{n,l,m} on matching (r, theta, phi) arrays.
pub fn hydrogen_wavefunction<D: Dimension>(
    n: u32,
    l: u32,
    m: i32,
    r: &Array<f64, D>,
    theta: &Array<f64, D>,
    phi: &Array<f64, D>,
) -> Result<Array<Complex64, D>, OrbitalError> {
    let qn = QuantumNumbers::new(n.into(), l.into(), m.into())?;
    if r.shape() != theta.shape() || r.shape() != phi.shape() {
        return Err(OrbitalError::ShapeMismatch);
    }
    Ok(wavefunction(qn, r, theta, phi))
}

/// Same as [`hydrogen_wavefunction`] for an already validated state and
/// equally shaped inputs.
pub(crate) fn wavefunction<D: Dimension>(
    qn: QuantumNumbers,
    r: &Array<f64, D>,
    theta: &Array<f64, D>,
    phi: &Array<f64, D>,
) -> Array<Complex64, D> {
    let (n, l, m) = (qn.n(), qn.l(), qn.m());
    let radial_norm = radial_normalization(n, l);
    let angular_norm = harmonic_normalization(l, m.unsigned_abs());

    Zip::from(r)
        .and(theta)
        .and(phi)
        .par_map_collect(|&r, &theta, &phi| {
            radial_at(radial_norm, n, l, r) * harmonic_at(angular_norm, l, m, theta, phi)
        })
}

/// Radial probability distribution P(r) = r^2 |R_{n,l}(r)|^2 sampled uniformly on
/// [0, extent_a0 * a0]. Returns (r in units of a0, P(r) per metre).
pub fn radial_distribution(
    qn: QuantumNumbers,
    extent_a0: f64,
    points: usize,
) -> Result<(Array1<f64>, Array1<f64>), OrbitalError> {
    if !(extent_a0.is_finite() && extent_a0 > 0.0) {
        return Err(OrbitalError::InvalidGrid(format!(
            "extent must be positive, got {extent_a0}"
        )));
    }
    if points < 2 {
        return Err(OrbitalError::InvalidGrid(format!(
            "at least 2 points are required, got {points}"
        )));
    }

    let r = Array1::linspace(0.0, extent_a0 * BOHR_RADIUS, points);
    let radial = radial_values(qn, &r);
    let prob = Zip::from(&r)
        .and(&radial)
        .map_collect(|&r, &radial| r * r * radial * radial);
    Ok((r / BOHR_RADIUS, prob))
}

fn radial_normalization(n: u32, l: u32) -> f64 {
    let n_f = n as f64;
    let prefactor = (2.0 / (n_f * BOHR_RADIUS)).powf(1.5);
    prefactor * (factorial_ratio(n - l - 1, n + l) / (2.0 * n_f)).sqrt()
}

fn radial_at(norm: f64, n: u32, l: u32, r: f64) -> f64 {
    let rho = 2.0 * r / (n as f64 * BOHR_RADIUS);
    let exp_part = (-rho / 2.0).exp();
    let rho_power = rho.powi(l as i32);
    let poly = laguerre_polynomial(rho, n - l - 1, 2 * l + 1);

    norm * exp_part * rho_power * poly
}

fn harmonic_normalization(l: u32, m_abs: u32) -> f64 {
    let l_f = l as f64;
    ((2.0 * l_f + 1.0) / (4.0 * PI) * factorial_ratio(l - m_abs, l + m_abs)).sqrt()
}

fn harmonic_at(norm: f64, l: u32, m: i32, theta: f64, phi: f64) -> Complex64 {
    let m_abs = m.unsigned_abs();
    let legendre = associated_legendre(theta.cos(), l, m_abs);
    let positive = Complex64::from_polar(norm * legendre, m_abs as f64 * phi);

    if m >= 0 {
        positive
    } else {
        // Y_l^{-|m|} = (-1)^|m| conj(Y_l^{|m|})
        let sign = if m_abs % 2 == 0 { 1.0 } else { -1.0 };
        sign * positive.conj()
    }
}

/// `lo! / hi!` for `lo <= hi`, built by incremental division so that no
/// factorial is ever formed.
pub fn factorial_ratio(lo: u32, hi: u32) -> f64 {
    debug_assert!(lo <= hi);
    (lo + 1..=hi).fold(1.0, |ratio, k| ratio / k as f64)
}

/// Associated Legendre function P_l^m(x), including the Condon-Shortley phase (-1)^m.
pub fn associated_legendre(x: f64, l: u32, m: u32) -> f64 {
    if m > l {
        return 0.0;
    }
    if m == 0 {
        return legendre_polynomial(x, l);
    }

    // P_m^m = (-1)^m (2m-1)!! (1-x^2)^(m/2)
    let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
    let mut pmm = 1.0;
    let mut odd = 1.0;
    for _ in 0..m {
        pmm *= -odd * somx2;
        odd += 2.0;
    }
    if l == m {
        return pmm;
    }

    let m_f = m as f64;
    let mut pm1m = x * (2.0 * m_f + 1.0) * pmm;
    if l == m + 1 {
        return pm1m;
    }

    for i in (m + 2)..=l {
        let i_f = i as f64;
        let pn = ((2.0 * i_f - 1.0) * x * pm1m - (i_f + m_f - 1.0) * pmm) / (i_f - m_f);
        pmm = pm1m;
        pm1m = pn;
    }

    pm1m
}

/// Legendre polynomial P_l(x)
pub fn legendre_polynomial(x: f64, l: u32) -> f64 {
    match l {
        0 => 1.0,
        1 => x,
        _ => {
            let mut p0 = 1.0;
            let mut p1 = x;

            for i in 2..=l {
                let i_f = i as f64;
                let p_new = ((2.0 * i_f - 1.0) * x * p1 - (i_f - 1.0) * p0) / i_f;
                p0 = p1;
                p1 = p_new;
            }

            p1
        }
    }
}

/// Generalized Laguerre polynomial L^alpha_k(x)
pub fn laguerre_polynomial(x: f64, k: u32, alpha: u32) -> f64 {
    if k == 0 {
        return 1.0;
    }

    let alpha_f = alpha as f64;
    let mut l0 = 1.0;
    let mut l1 = 1.0 + alpha_f - x;

    for i in 2..=k {
        let i_f = i as f64;
        let l_new = ((2.0 * i_f - 1.0 + alpha_f - x) * l1 - (i_f - 1.0 + alpha_f) * l0) / i_f;
        l0 = l1;
        l1 = l_new;
    }

    l1
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test]
    fn test_factorial_ratio_matches_direct_factorials() {
        fn factorial(n: u32) -> f64 {
            (1..=n as u128).product::<u128>() as f64
        }
        for n in 1..=15u32 {
            for l in 0..n {
                let direct = factorial(n - l - 1) / factorial(n + l);
                let ratio = factorial_ratio(n - l - 1, n + l);
                assert!(((ratio - direct) / direct).abs() < 1e-12, "n={n} l={l}");
            }
        }
        assert_eq!(factorial_ratio(4, 4), 1.0);
        // Large spans underflow towards zero instead of overflowing.
        assert!(factorial_ratio(0, 400).is_finite());
    }

    #[test]
    fn test_laguerre_low_orders() {
        let x = 1.7;
        assert!(close(laguerre_polynomial(x, 1, 3), 4.0 - x, 1e-12));
        let expected = (x * x - 2.0 * 5.0 * x + 4.0 * 5.0) / 2.0;
        assert!(close(laguerre_polynomial(x, 2, 3), expected, 1e-12));
    }

    #[test]
    fn test_associated_legendre_condon_shortley() {
        let x: f64 = 0.4;
        let s = (1.0 - x * x).sqrt();
        assert!(close(associated_legendre(x, 1, 1), -s, 1e-12));
        assert!(close(associated_legendre(x, 2, 1), -3.0 * x * s, 1e-12));
        assert!(close(associated_legendre(x, 2, 2), 3.0 * s * s, 1e-12));
        assert!(close(associated_legendre(x, 3, 0), 0.5 * (5.0 * x.powi(3) - 3.0 * x), 1e-12));
        assert_eq!(associated_legendre(x, 1, 2), 0.0);
    }

    #[test]
    fn test_radial_matches_closed_forms() {
        let a0 = BOHR_RADIUS;
        let r = array![0.0, 0.5 * a0, 1.0 * a0, 3.0 * a0];

        let r10 = radial_wavefunction(1, 0, &r).unwrap();
        for (value, &ri) in r10.iter().zip(r.iter()) {
            let expected = 2.0 * a0.powf(-1.5) * (-ri / a0).exp();
            assert!(((value - expected) / expected).abs() < 1e-12);
        }

        let r21 = radial_wavefunction(2, 1, &r).unwrap();
        assert_eq!(r21[0], 0.0);
        for (value, &ri) in r21.iter().zip(r.iter()).skip(1) {
            let expected = a0.powf(-1.5) / 24f64.sqrt() * (ri / a0) * (-ri / (2.0 * a0)).exp();
            assert!(((value - expected) / expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_radial_normalization_1s() {
        let points = 30_001;
        let r = Array1::linspace(0.0, 30.0 * BOHR_RADIUS, points);
        let radial = radial_wavefunction(1, 0, &r).unwrap();
        let dr = r[1] - r[0];
        let density: Vec<f64> = r
            .iter()
            .zip(radial.iter())
            .map(|(r, rad)| r * r * rad * rad)
            .collect();
        let integral: f64 = density.windows(2).map(|w| 0.5 * (w[0] + w[1]) * dr).sum();
        assert!((integral - 1.0).abs() < 1e-3, "integral = {integral}");
    }

    #[test]
    fn test_spherical_harmonic_reference_values() {
        let theta = array![0.3, PI / 2.0];
        let phi = array![1.1, 0.0];

        let y00 = spherical_harmonic(0, 0, &theta, &phi).unwrap();
        assert!(close(y00[0].re, 1.0 / (4.0 * PI).sqrt(), 1e-12));
        assert_eq!(y00[0].im, 0.0);

        let y11 = spherical_harmonic(1, 1, &theta, &phi).unwrap();
        assert!(close(y11[1].re, -(3.0 / (8.0 * PI)).sqrt(), 1e-12));

        let y10 = spherical_harmonic(1, 0, &theta, &phi).unwrap();
        assert!(close(y10[0].re, (3.0 / (4.0 * PI)).sqrt() * 0.3f64.cos(), 1e-12));
    }

    #[test]
    fn test_m_zero_states_are_real() {
        let a0 = BOHR_RADIUS;
        let r = array![0.0, 0.3 * a0, 1.2 * a0, 7.5 * a0];
        let theta = array![0.0, PI / 4.0, PI / 2.0, 2.9];
        let phi = array![0.0, 0.3, 2.1, -3.0];

        for n in 1..=5u32 {
            for l in 0..n {
                let psi = hydrogen_wavefunction(n, l, 0, &r, &theta, &phi).unwrap();
                assert!(psi.iter().all(|c| c.im.abs() <= 1e-12 * c.norm().max(1.0)));
            }
        }
    }

    #[test]
    fn test_negative_m_is_phased_conjugate() {
        let a0 = BOHR_RADIUS;
        let r = array![0.4 * a0, 2.0 * a0, 9.0 * a0];
        let theta = array![0.2, 1.3, 2.6];
        let phi = array![-2.5, 0.7, 3.0];

        for n in 2..=4u32 {
            for l in 1..n {
                for m in 1..=l as i32 {
                    let pos = hydrogen_wavefunction(n, l, m, &r, &theta, &phi).unwrap();
                    let neg = hydrogen_wavefunction(n, l, -m, &r, &theta, &phi).unwrap();
                    let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
                    for (p, q) in pos.iter().zip(neg.iter()) {
                        let expected = sign * p.conj();
                        assert!((q - expected).norm() <= 1e-12 * p.norm().max(1e-30));
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_states_are_rejected() {
        let r = array![1.0e-11];
        let angles = array![0.5];
        assert!(matches!(
            radial_wavefunction(2, 2, &r),
            Err(OrbitalError::InvalidQuantumNumbers(_))
        ));
        assert!(matches!(
            spherical_harmonic(1, 2, &angles, &angles),
            Err(OrbitalError::InvalidQuantumNumbers(_))
        ));
        assert!(matches!(
            hydrogen_wavefunction(0, 0, 0, &r, &angles, &angles),
            Err(OrbitalError::InvalidQuantumNumbers(_))
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let r = array![1.0e-11, 2.0e-11];
        let angles = array![0.5];
        assert_eq!(
            hydrogen_wavefunction(1, 0, 0, &r, &angles, &angles),
            Err(OrbitalError::ShapeMismatch)
        );
    }

    #[test]
    fn test_radial_distribution_profile() {
        let qn = QuantumNumbers::new(1, 0, 0).unwrap();
        let (r_a0, prob) = radial_distribution(qn, 10.0, 1001).unwrap();
        assert_eq!(r_a0.len(), 1001);
        assert!(close(r_a0[1000], 10.0, 1e-12));
        assert_eq!(prob[0], 0.0);
        // 1s peaks at the Bohr radius.
        let peak = prob
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| r_a0[i])
            .unwrap();
        assert!((peak - 1.0).abs() < 0.02);
        assert!(radial_distribution(qn, 0.0, 10).is_err());
        assert!(radial_distribution(qn, 5.0, 1).is_err());
    }
}
