// src/core/state.rs

use super::constants::basis_constants::MAX_SPS;
use super::error::BasisError;
use std::fmt;

/// Integer width needed to encode a configuration index of the full space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasisType {
    U32,
    U64,
}

impl fmt::Display for BasisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisType::U32 => write!(f, "uint32"),
            BasisType::U64 => write!(f, "uint64"),
        }
    }
}

/// Site parameters shared by every transform acting on a state encoding.
///
/// A configuration of `l` sites with `sps` states per site is the base-`sps` integer whose
/// digit at position `l-1-i` holds the local state of site `i`, so site 0 is the most
/// significant digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteParams {
    l: usize,
    sps: u64,
    /// `powers[i] = sps^(l-1-i)`, the place value of site `i`.
    powers: Vec<u64>,
    full_dim: u64,
}

impl SiteParams {
    /// Builds the site parameters, failing when `sps^l` does not fit the state encoding.
    pub fn new(l: usize, sps: usize) -> Result<Self, BasisError> {
        if l == 0 {
            return Err(BasisError::config("L", "L must be a positive integer"));
        }
        if sps < 2 {
            return Err(BasisError::config("sps", "invalid value for sps, sps >= 2."));
        }
        if sps > MAX_SPS {
            return Err(BasisError::config("sps", format!("sps = {} exceeds the supported maximum {}", sps, MAX_SPS)));
        }
        let sps = sps as u64;
        let full_dim = u32::try_from(l)
            .ok()
            .and_then(|exp| sps.checked_pow(exp))
            .ok_or_else(|| BasisError::config("L", format!("sps^L = {}^{} does not fit a 64 bit state encoding", sps, l)))?;
        let mut powers = vec![1u64; l];
        for i in (0..l.saturating_sub(1)).rev() {
            powers[i] = powers[i + 1] * sps;
        }
        Ok(Self { l, sps, powers, full_dim })
    }

    pub fn l(&self) -> usize {
        self.l
    }

    pub fn sps(&self) -> usize {
        self.sps as usize
    }

    /// Dimension `sps^L` of the full Hilbert space.
    pub fn full_dim(&self) -> u64 {
        self.full_dim
    }

    /// Smallest integer width able to encode every configuration.
    pub fn basis_type(&self) -> BasisType {
        if self.full_dim <= u32::MAX as u64 + 1 { BasisType::U32 } else { BasisType::U64 }
    }

    /// Local state of `site` in the configuration `state`.
    #[inline]
    pub fn digit(&self, state: u64, site: usize) -> u64 {
        (state / self.powers[site]) % self.sps
    }

    /// Returns `state` with the local state of `site` replaced by `value`.
    #[inline]
    pub fn with_digit(&self, state: u64, site: usize, value: u64) -> u64 {
        let old = self.digit(state, site);
        state - old * self.powers[site] + value * self.powers[site]
    }

    /// Local states ordered by site.
    pub fn digits(&self, state: u64) -> Vec<u64> {
        (0..self.l).map(|i| self.digit(state, i)).collect()
    }

    /// Inverse of [`SiteParams::digits`].
    pub fn from_digits(&self, digits: &[u64]) -> u64 {
        digits.iter().zip(self.powers.iter()).map(|(d, p)| d * p).sum()
    }

    /// Total number of particles (sum of local occupations).
    pub fn particle_count(&self, state: u64) -> usize {
        (0..self.l).map(|i| self.digit(state, i) as usize).sum()
    }

    /// Parses a configuration written site by site (site 0 first), e.g. `"0110"`.
    pub fn state_to_int(&self, s: &str) -> Result<u64, BasisError> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != self.l {
            return Err(BasisError::argument("state", format!("state string '{}' must have exactly L = {} sites", s, self.l)));
        }
        let mut digits = Vec::with_capacity(self.l);
        for c in chars {
            match c.to_digit(36) {
                Some(d) if (d as u64) < self.sps => digits.push(d as u64),
                _ => {
                    return Err(BasisError::argument("state", format!("character '{}' is not a local state for sps = {}", c, self.sps)));
                }
            }
        }
        Ok(self.from_digits(&digits))
    }

    /// Writes a configuration site by site, the inverse of [`SiteParams::state_to_int`].
    pub fn int_to_state(&self, state: u64) -> String {
        self.digits(state)
            .into_iter()
            .map(|d| std::char::from_digit(d as u32, 36).unwrap_or('?'))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_zero_is_most_significant() -> Result<(), BasisError> {
        let pars = SiteParams::new(4, 2)?;
        assert_eq!(pars.state_to_int("1000")?, 8);
        assert_eq!(pars.int_to_state(1), "0001");
        assert_eq!(pars.digit(0b0100, 1), 1);
        Ok(())
    }

    #[test]
    fn test_spin_one_digits() -> Result<(), BasisError> {
        let pars = SiteParams::new(3, 3)?;
        let s = pars.state_to_int("210")?;
        assert_eq!(s, 2 * 9 + 3);
        assert_eq!(pars.digits(s), vec![2, 1, 0]);
        assert_eq!(pars.particle_count(s), 3);
        assert_eq!(pars.with_digit(s, 2, 2), s + 2);
        Ok(())
    }

    #[test]
    fn test_overflow_is_configuration_error() {
        let err = SiteParams::new(65, 2).unwrap_err();
        assert_eq!(err.parameter(), Some("L"));
        assert!(SiteParams::new(64, 2).is_err()); // 2^64 overflows u64
        assert_eq!(SiteParams::new(32, 2).map(|p| p.basis_type()), Ok(BasisType::U32));
    }

    #[test]
    fn test_local_dimension_limits() -> Result<(), BasisError> {
        assert_eq!(SiteParams::new(2, 37).unwrap_err().parameter(), Some("sps"));
        assert_eq!(SiteParams::new(2, 1).unwrap_err().parameter(), Some("sps"));
        let pars = SiteParams::new(2, MAX_SPS)?;
        assert_eq!(pars.int_to_state(pars.full_dim() - 1), "zz");
        assert_eq!(pars.state_to_int("z0")?, 35 * 36);
        Ok(())
    }
}
