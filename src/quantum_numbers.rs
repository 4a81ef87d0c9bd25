//! Hydrogen quantum numbers (n, l, m) and their validation.
//!
//! n: principal quantum number (1, 2, 3, ...)
//! l: orbital angular momentum (0 to n-1)
//! m: magnetic quantum number (-l to l)

use serde::{Deserialize, Serialize};

use crate::error::OrbitalError;

const ORBITAL_LETTERS: &[char] = &['s', 'p', 'd', 'f', 'g', 'h', 'i', 'k', 'l', 'm', 'n'];

/// A validated (n, l, m) triple. Only constructible through [`QuantumNumbers::new`]
/// or [`parse_quantum_numbers`], so holding one means the hydrogenic constraints hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QuantumNumbers {
    n: u32,
    l: u32,
    m: i32,
}

impl QuantumNumbers {
    pub fn new(n: i64, l: i64, m: i64) -> Result<Self, OrbitalError> {
        if n < 1 {
            return Err(invalid("Principal quantum number n must be >= 1."));
        }
        if l < 0 {
            return Err(invalid("Angular momentum quantum number l must be >= 0."));
        }
        if l > n - 1 {
            return Err(invalid(
                "Angular momentum quantum number l must satisfy l <= n - 1.",
            ));
        }
        if !(-l..=l).contains(&m) {
            return Err(invalid("Magnetic quantum number m must satisfy |m| <= l."));
        }
        let n = u32::try_from(n).map_err(|_| invalid("Principal quantum number n is too large."))?;
        let l = u32::try_from(l).map_err(|_| invalid("Angular momentum quantum number l is too large."))?;
        let m = i32::try_from(m).map_err(|_| invalid("Magnetic quantum number m is too large."))?;
        Ok(QuantumNumbers { n, l, m })
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn m(&self) -> i32 {
        self.m
    }

    /// Spectroscopic label such as `1s`, `2p` or `4f`.
    pub fn label(&self) -> String {
        match ORBITAL_LETTERS.get(self.l as usize) {
            Some(letter) => format!("{}{}", self.n, letter),
            None => format!("{}[l={}]", self.n, self.l),
        }
    }
}

impl<'de> Deserialize<'de> for QuantumNumbers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            n: i64,
            #[serde(default)]
            l: i64,
            #[serde(default)]
            m: i64,
        }
        let raw = Raw::deserialize(deserializer)?;
        QuantumNumbers::new(raw.n, raw.l, raw.m).map_err(serde::de::Error::custom)
    }
}

fn invalid(message: &str) -> OrbitalError {
    OrbitalError::InvalidQuantumNumbers(message.to_string())
}

/// Parse one to three positional values `n [l] [m]`; omitted values default to 0.
pub fn parse_quantum_numbers(values: &[i64]) -> Result<QuantumNumbers, OrbitalError> {
    if values.is_empty() || values.len() > 3 {
        return Err(invalid("Please provide 1 to 3 quantum numbers: n [l] [m]."));
    }
    let at = |i: usize| values.get(i).copied().unwrap_or(0);
    QuantumNumbers::new(at(0), at(1), at(2))
}
