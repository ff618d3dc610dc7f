// src/symmetry_check.rs

//! Checks an operator expansion against the symmetries of a basis.

use crate::basis::Basis;
use crate::core::constants::basis_constants::NORM_TOLERANCE;
use num_complex::Complex64;
use std::collections::BTreeMap;
use std::fmt;

/// `coupling · opstr`, with `opstr[j]` acting on `sites[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTerm {
    pub opstr: String,
    pub coupling: Complex64,
    pub sites: Vec<usize>,
}

impl OperatorTerm {
    pub fn new(opstr: &str, coupling: impl Into<Complex64>, sites: &[usize]) -> Self {
        Self { opstr: opstr.to_string(), coupling: coupling.into(), sites: sites.to_vec() }
    }
}

impl fmt::Display for OperatorTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {}", self.opstr, self.sites, self.coupling)
    }
}

/// Terms of an expansion that break one symmetry.
///
/// `odd` terms map onto themselves with the opposite sign, `missing` terms have no partner.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryViolation {
    pub symmetry: &'static str,
    pub odd: Vec<OperatorTerm>,
    pub missing: Vec<OperatorTerm>,
}

type Key = Vec<(usize, char)>;

/// Sorts by site (stable within a site), drops identities and sums equal terms.
fn canonicalize(terms: &[OperatorTerm]) -> BTreeMap<Key, Complex64> {
    let mut out: BTreeMap<Key, Complex64> = BTreeMap::new();
    for term in terms {
        let mut key: Key = term.sites.iter().copied().zip(term.opstr.chars()).filter(|&(_, c)| c != 'I').collect();
        key.sort_by_key(|&(site, _)| site);
        *out.entry(key).or_default() += term.coupling;
    }
    out.retain(|_, c| c.norm() > NORM_TOLERANCE);
    out
}

fn to_term(key: &Key, coupling: Complex64) -> OperatorTerm {
    OperatorTerm {
        opstr: key.iter().map(|&(_, c)| c).collect(),
        coupling,
        sites: key.iter().map(|&(s, _)| s).collect(),
    }
}

/// Image of a local operator under a flip: `+ <-> -`, `y` and `z` change sign.
fn flip_char(c: char) -> Option<(char, f64)> {
    match c {
        '+' => Some(('-', 1.0)),
        '-' => Some(('+', 1.0)),
        'x' => Some(('x', 1.0)),
        'y' => Some(('y', -1.0)),
        'z' => Some(('z', -1.0)),
        _ => None,
    }
}

/// One symmetry transform acting on single-site operators.
struct SiteMap<'a> {
    name: &'static str,
    /// Whether odd terms are reported separately.
    odd: bool,
    map: Box<dyn Fn(usize, char) -> Option<(usize, char, f64)> + 'a>,
}

impl SiteMap<'_> {
    fn image(&self, key: &Key) -> Option<(Key, f64)> {
        let mut sign = 1.0;
        let mut image = Vec::with_capacity(key.len());
        for &(site, c) in key {
            let (s, c, f) = (self.map)(site, c)?;
            sign *= f;
            image.push((s, c));
        }
        image.sort_by_key(|&(site, _)| site);
        Some((image, sign))
    }

    fn check(&self, terms: &BTreeMap<Key, Complex64>) -> Option<SymmetryViolation> {
        let mut odd = Vec::new();
        let mut missing = Vec::new();
        for (key, &coupling) in terms {
            let Some((image, sign)) = self.image(key) else {
                missing.push(to_term(key, coupling));
                continue;
            };
            let expected = coupling * sign;
            match terms.get(&image) {
                Some(&c) if (c - expected).norm() < NORM_TOLERANCE => {}
                Some(&c) if self.odd && (c + expected).norm() < NORM_TOLERANCE => odd.push(to_term(key, coupling)),
                _ => missing.push(to_term(key, coupling)),
            }
        }
        if odd.is_empty() && missing.is_empty() {
            None
        } else {
            Some(SymmetryViolation { symmetry: self.name, odd, missing })
        }
    }
}

impl Basis {
    /// Lists the terms of `terms` that break a symmetry the basis was built with.
    ///
    /// An empty result means the summed operator commutes with every active symmetry.
    pub fn check_symm(&self, terms: &[OperatorTerm]) -> Vec<SymmetryViolation> {
        let l = self.l();
        let blocks = self.blocks();
        let a = blocks.a;
        let terms = canonicalize(terms);

        let mut maps: Vec<SiteMap<'_>> = Vec::new();
        if blocks.kblock.is_some() && a < l {
            maps.push(SiteMap { name: "T symm", odd: false, map: Box::new(move |s, c| Some(((s + a) % l, c, 1.0))) });
        }
        if blocks.pblock.is_some() {
            maps.push(SiteMap { name: "P symm", odd: false, map: Box::new(move |s, c| Some((l - 1 - s, c, 1.0))) });
        }
        let flip_on = |keep: fn(usize) -> bool| {
            move |s: usize, c: char| {
                if keep(s) { flip_char(c).map(|(c, f)| (s, c, f)) } else { Some((s, c, 1.0)) }
            }
        };
        if blocks.zblock.is_some() {
            maps.push(SiteMap { name: "Z/C symm", odd: true, map: Box::new(flip_on(|_| true)) });
        }
        if blocks.zablock.is_some() {
            maps.push(SiteMap { name: "ZA/CA symm", odd: true, map: Box::new(flip_on(|s| s % 2 == 0)) });
        }
        if blocks.zbblock.is_some() {
            maps.push(SiteMap { name: "ZB/CB symm", odd: true, map: Box::new(flip_on(|s| s % 2 == 1)) });
        }
        if blocks.pzblock.is_some() {
            maps.push(SiteMap {
                name: "PZ/PC symm",
                odd: false,
                map: Box::new(move |s, c| flip_char(c).map(|(c, f)| (l - 1 - s, c, f))),
            });
        }

        let violations: Vec<SymmetryViolation> = maps.iter().filter_map(|m| m.check(&terms)).collect();
        for v in &violations {
            log::warn!("{}: {} odd and {} missing terms", v.symmetry, v.odd.len(), v.missing.len());
        }
        violations
    }
}
