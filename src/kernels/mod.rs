// src/kernels/mod.rs

//! Representative enumeration and operator matrix elements for every symmetry sector.
//!
//! The basis engine treats this layer as a provider: given a [`Sector`] it estimates the
//! reduced dimension, fills the representative arrays together with the auxiliary `N`/`M`
//! integers, and computes matrix elements of operator strings between basis states.
//!
//! `N` holds the translation period `R` of the representative (signed by the parity branch in
//! sectors with a reflection), or `|H|·|stabilizer|` when no translation is active. `M` holds
//! the packed translation offsets `m` with `g·s = T^m s` for the point-group elements `g` that
//! keep the orbit of `s` (`-1` when none does).

use crate::bitops::{BitOps, LocalSpinOps};
use crate::core::constants::basis_constants::{IMAG_TOLERANCE, NORM_TOLERANCE, PI};
use crate::core::{BasisError, Sector, SiteParams, Transform};
use num_complex::Complex64;
use num_traits::{One, Zero};
use std::collections::HashMap;

/// Result code of [`BasisKernels::apply_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Ok,
    UnrecognizedChar(char),
    RealComplexMismatch,
    SiteOutOfRange(usize),
}

/// Output arrays filled by [`BasisKernels::enumerate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorArrays {
    pub basis: Vec<u64>,
    pub n: Vec<i32>,
    pub m: Vec<i32>,
}

impl SectorArrays {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { basis: Vec::with_capacity(capacity), n: Vec::with_capacity(capacity), m: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.basis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basis.is_empty()
    }

    fn push(&mut self, state: u64, n: i32, m: i32) {
        self.basis.push(state);
        self.n.push(n);
        self.m.push(m);
    }
}

/// Sector, site parameters and unit cell shared by the enumeration and operator routines.
#[derive(Debug, Clone)]
pub struct SectorContext<'a> {
    pub sector: &'a Sector,
    pub pars: &'a SiteParams,
    pub a: usize,
    group: Vec<(Transform, i8)>,
}

impl<'a> SectorContext<'a> {
    pub fn new(sector: &'a Sector, pars: &'a SiteParams, a: usize) -> Self {
        Self { sector, pars, a, group: sector.point_group() }
    }

    /// Number of unit cells `L/a`.
    pub fn lc(&self) -> usize {
        self.pars.l() / self.a
    }

    /// Translation steps of the orbit sum: `L/a` in momentum sectors, else one.
    pub fn steps(&self) -> usize {
        if self.sector.momentum().is_some() { self.lc() } else { 1 }
    }

    pub fn point_group(&self) -> &[(Transform, i8)] {
        &self.group
    }
}

/// Operator arguments bound to a basis, in binding order `N`, `M`, representatives, `L`,
/// site parameters. The sector, unit cell and normalizations complete the tuple.
#[derive(Debug, Clone, Copy)]
pub struct OpArgs<'a> {
    pub n: Option<&'a [i32]>,
    pub m: Option<&'a [i32]>,
    pub basis: &'a [u64],
    pub l: usize,
    pub pars: &'a SiteParams,
    pub sector: &'a Sector,
    pub a: usize,
    pub norms: &'a [f64],
}

/// Matrix-element buffers. Slot `i` (and `Ns + i` for a second branch) belongs to column `i`;
/// untouched slots keep a NaN matrix element.
#[derive(Debug, Clone, PartialEq)]
pub struct OpBuffers {
    pub me: Vec<Complex64>,
    pub row: Vec<usize>,
    pub col: Vec<usize>,
}

impl OpBuffers {
    pub fn new(len: usize) -> Self {
        Self { me: vec![Complex64::new(f64::NAN, f64::NAN); len], row: vec![0; len], col: vec![0; len] }
    }
}

/// Character `C(r)` of the `r`-th translation step.
///
/// Reflection sectors use the real branches `cos(kr)` (`N > 0`) and `-sin(kr)` (`N < 0`),
/// every other momentum sector uses `exp(ikr)`. Sectors without translation have `C = 1`.
pub fn character(sector: &Sector, r: usize, negative_branch: bool, lc: usize) -> Complex64 {
    let Some(kb) = sector.momentum() else {
        return Complex64::one();
    };
    let kr = 2.0 * PI * (kb * r) as f64 / lc as f64;
    if sector.has_parity_branch() {
        if negative_branch { Complex64::new(-kr.sin(), 0.0) } else { Complex64::new(kr.cos(), 0.0) }
    } else if kb == 0 {
        Complex64::one()
    } else if 2 * kb == lc {
        if r % 2 == 0 { Complex64::one() } else { -Complex64::one() }
    } else {
        Complex64::from_polar(1.0, kr)
    }
}

/// Whether `sin(k)` vanishes for momentum `kb` on `lc` unit cells, decided exactly.
pub fn momentum_is_real(kb: usize, lc: usize) -> bool {
    (2 * kb) % lc == 0
}

/// Basis/Op enumeration provider.
pub trait BasisKernels: Send + Sync {
    /// Bit operations used to move states along their orbits.
    fn bitops(&self) -> &dyn BitOps;

    /// Local space family; only bases of the same family can be appended.
    fn family(&self) -> &str {
        self.bitops().family()
    }

    /// Fails with a configuration error when the sector needs a transform the bit operations
    /// do not provide.
    fn check_supported(&self, sector: &Sector) -> Result<(), BasisError> {
        let ops = self.bitops();
        if sector.momentum().is_some() && !ops.supports_shift() {
            return Err(BasisError::config(
                "kblock",
                format!("the '{}' bit operations do not implement translations", ops.family()),
            ));
        }
        for (transform, _) in sector.point_group() {
            if !ops.supports(transform) {
                return Err(BasisError::config(
                    transform.block_name(),
                    format!("the '{}' bit operations do not implement {:?}", ops.family(), transform),
                ));
            }
        }
        Ok(())
    }

    /// Upper bound on the number of basis states of the sector.
    fn estimate_size(&self, ctx: &SectorContext<'_>, particles: Option<usize>) -> usize;

    /// Appends the representatives of the sector in ascending order and returns how many were
    /// written.
    fn enumerate(&self, ctx: &SectorContext<'_>, particles: Option<usize>, out: &mut SectorArrays) -> usize;

    /// Fills `out` with the matrix elements of `coupling · opstr` acting on the sites `indx`.
    fn apply_op(
        &self,
        args: &OpArgs<'_>,
        opstr: &str,
        indx: &[usize],
        coupling: Complex64,
        real_output: bool,
        out: &mut OpBuffers,
    ) -> OpStatus;
}

/// Orbit data of a representative candidate.
struct Orbit {
    period: usize,
    /// Offset `m` with `g·s = T^m s`, per point-group element.
    offsets: Vec<Option<usize>>,
}

/// Kernels that scan the state space and walk each orbit with the given bit operations.
#[derive(Debug, Clone, Default)]
pub struct OrbitKernels<B: BitOps = LocalSpinOps> {
    ops: B,
}

impl OrbitKernels<LocalSpinOps> {
    pub fn new() -> Self {
        Self { ops: LocalSpinOps }
    }
}

impl<B: BitOps> OrbitKernels<B> {
    pub fn with_bitops(ops: B) -> Self {
        Self { ops }
    }

    /// Distinct states `T^r s` for `r` below the translation period.
    fn translations(&self, ctx: &SectorContext<'_>, s: u64) -> Vec<u64> {
        let mut orbit = vec![s];
        if ctx.sector.momentum().is_none() {
            return orbit;
        }
        let mut x = self.ops.shift_state(s, ctx.a, ctx.pars);
        while x != s {
            orbit.push(x);
            x = self.ops.shift_state(x, ctx.a, ctx.pars);
        }
        orbit
    }

    /// Smallest encoding in the orbit of `s` under the full symmetry group.
    pub fn representative(&self, ctx: &SectorContext<'_>, s: u64) -> u64 {
        let mut best = s;
        for x in self.translations(ctx, s) {
            best = best.min(x);
            for &(t, _) in ctx.point_group() {
                best = best.min(self.ops.apply_state(t, x, ctx.pars));
            }
        }
        best
    }

    /// Orbit data of `s`, or `None` when `s` is not the smallest state of its orbit.
    fn classify(&self, ctx: &SectorContext<'_>, s: u64) -> Option<Orbit> {
        let orbit = self.translations(ctx, s);
        let mut offsets = Vec::with_capacity(ctx.point_group().len());
        for &(t, _) in ctx.point_group() {
            if orbit.iter().any(|&x| self.ops.apply_state(t, x, ctx.pars) < s) {
                return None;
            }
            let image = self.ops.apply_state(t, s, ctx.pars);
            offsets.push(orbit.iter().position(|&x| x == image));
        }
        if orbit.iter().any(|&x| x < s) {
            return None;
        }
        Some(Orbit { period: orbit.len(), offsets })
    }

    /// Pushes the basis states carried by the representative `s`.
    fn push_states(&self, ctx: &SectorContext<'_>, s: u64, orbit: &Orbit, out: &mut SectorArrays) {
        let lc = ctx.lc();
        let period = orbit.period as i32;
        let stride = (ctx.pars.l() + 1) as i32;
        let group = ctx.point_group();
        let offset = |i: usize| orbit.offsets[i];
        let kb = ctx.sector.momentum().unwrap_or(0);
        let cos_km = |m: usize| (2.0 * PI * (kb * m) as f64 / lc as f64).cos();
        let corr = |chi: i8, m: Option<usize>| m.map_or(1.0, |m| 1.0 + f64::from(chi) * cos_km(m));
        let pack = |m1: Option<usize>, m2: Option<usize>, c: i32| {
            m1.unwrap_or(0) as i32 + stride * m2.unwrap_or(0) as i32 + stride * stride * c
        };

        if let Some(kb) = ctx.sector.momentum() {
            if (kb * orbit.period) % lc != 0 {
                return;
            }
        }

        match *ctx.sector {
            Sector::Full => out.push(s, 1, -1),
            Sector::Parity { .. }
            | Sector::Flip { .. }
            | Sector::FlipA { .. }
            | Sector::FlipB { .. }
            | Sector::ParityFlip { .. }
            | Sector::ParityAndFlip { .. }
            | Sector::FlipAAndFlipB { .. } => {
                let compatible = group.iter().zip(&orbit.offsets).all(|(&(_, chi), m)| m.is_none() || chi == 1);
                if compatible {
                    let stabilizer = 1 + orbit.offsets.iter().filter(|m| m.is_some()).count();
                    out.push(s, ((group.len() + 1) * stabilizer) as i32, -1);
                }
            }
            Sector::Translation { .. } => out.push(s, period, -1),
            Sector::TranslationFlip { .. } | Sector::TranslationFlipA { .. } | Sector::TranslationFlipB { .. } => {
                if corr(group[0].1, offset(0)) > NORM_TOLERANCE {
                    out.push(s, period, offset(0).map_or(-1, |m| m as i32));
                }
            }
            Sector::TranslationParity { .. } | Sector::TranslationParityFlip { .. } => {
                let chi = group[0].1;
                let m = offset(0);
                let packed = m.map_or(-1, |m| m as i32);
                let factor = |sigma: i8| m.map_or(1.0, |m| 1.0 + f64::from(sigma * chi) * cos_km(m));
                self.push_branches(ctx, s, period, packed, m.is_none(), factor, out);
            }
            Sector::TranslationParityAndFlip { p, z, .. } => {
                // group order: Z, P, PZ
                let (mz, mp, mpz) = (offset(0), offset(1), offset(2));
                let (case, m1, m2) = match (mp, mz, mpz) {
                    (None, None, None) => (1, None, None),
                    (Some(_), None, _) => (2, mp, None),
                    (None, Some(_), _) => (3, None, mz),
                    (None, None, Some(_)) => (4, mpz, None),
                    (Some(_), Some(_), _) => (5, mp, mz),
                };
                let flip = |m: Option<usize>| corr(z, m);
                let factor = |sigma: i8| match case {
                    2 => corr(sigma * p, m1),
                    3 => flip(m2),
                    4 => corr(sigma * p * z, m1),
                    5 => corr(sigma * p, m1) * flip(m2),
                    _ => 1.0,
                };
                let independent = case == 1 || case == 3;
                self.push_branches(ctx, s, period, pack(m1, m2, case), independent, factor, out);
            }
            Sector::TranslationFlipAAndFlipB { za, zb, .. } => {
                // group order: ZA, ZB, Z
                let (ma, mb, mz) = (offset(0), offset(1), offset(2));
                let (case, m1, m2) = match (ma, mb, mz) {
                    (None, None, None) => (1, None, None),
                    (Some(_), None, _) => (2, ma, None),
                    (None, Some(_), _) => (3, mb, None),
                    (None, None, Some(_)) => (4, mz, None),
                    (Some(_), Some(_), _) => (5, ma, mb),
                };
                let factor = match case {
                    2 => corr(za, m1),
                    3 => corr(zb, m1),
                    4 => corr(za * zb, m1),
                    5 => corr(za, m1) * corr(zb, m2),
                    _ => 1.0,
                };
                if factor > NORM_TOLERANCE {
                    out.push(s, period, pack(m1, m2, case));
                }
            }
        }
    }

    /// Pushes the cosine and sine branches of a reflection sector.
    ///
    /// At `sin k = 0` only the cosine branch exists. When the reflection keeps the
    /// translation orbit the two branches are parallel and only the first non-vanishing one
    /// is kept.
    #[allow(clippy::too_many_arguments)]
    fn push_branches(
        &self,
        ctx: &SectorContext<'_>,
        s: u64,
        period: i32,
        packed: i32,
        independent: bool,
        factor: impl Fn(i8) -> f64,
        out: &mut SectorArrays,
    ) {
        let kb = ctx.sector.momentum().unwrap_or(0);
        if momentum_is_real(kb, ctx.lc()) {
            if factor(1) > NORM_TOLERANCE {
                out.push(s, period, packed);
            }
            return;
        }
        for sigma in [1i8, -1] {
            if factor(sigma) > NORM_TOLERANCE {
                out.push(s, i32::from(sigma) * period, packed);
                if !independent {
                    return;
                }
            }
        }
    }

    /// Applies `opstr` right to left on a single state.
    fn act(&self, opstr: &str, indx: &[usize], state: u64, pars: &SiteParams) -> Result<Option<(u64, Complex64)>, OpStatus> {
        let sps = pars.sps() as u64;
        let spin = (sps as f64 - 1.0) / 2.0;
        let mut s = state;
        let mut amp = Complex64::one();
        for (c, &site) in opstr.chars().rev().zip(indx.iter().rev()) {
            if site >= pars.l() {
                return Err(OpStatus::SiteOutOfRange(site));
            }
            let n = pars.digit(s, site);
            let m = n as f64 - spin;
            match c {
                'I' => {}
                'z' => amp *= m,
                'n' => amp *= n as f64,
                '+' => {
                    if n + 1 >= sps {
                        return Ok(None);
                    }
                    amp *= (spin * (spin + 1.0) - m * (m + 1.0)).sqrt();
                    s = pars.with_digit(s, site, n + 1);
                }
                '-' => {
                    if n == 0 {
                        return Ok(None);
                    }
                    amp *= (spin * (spin + 1.0) - m * (m - 1.0)).sqrt();
                    s = pars.with_digit(s, site, n - 1);
                }
                'x' if sps == 2 => {
                    amp *= 0.5;
                    s = pars.with_digit(s, site, 1 - n);
                }
                'y' if sps == 2 => {
                    amp *= if n == 0 { Complex64::new(0.0, -0.5) } else { Complex64::new(0.0, 0.5) };
                    s = pars.with_digit(s, site, 1 - n);
                }
                other => return Err(OpStatus::UnrecognizedChar(other)),
            }
            if amp.is_zero() {
                return Ok(None);
            }
        }
        Ok(Some((s, amp)))
    }

    /// Orbit sum of `state` with the characters of one basis state, divided by `norm`.
    fn expand(&self, ctx: &SectorContext<'_>, state: u64, negative_branch: bool, norm: f64) -> HashMap<u64, Complex64> {
        let lc = ctx.lc();
        let mut out: HashMap<u64, Complex64> = HashMap::new();
        let mut x = state;
        for r in 0..ctx.steps() {
            let c = character(ctx.sector, r, negative_branch, lc) / norm;
            *out.entry(x).or_insert_with(Complex64::zero) += c;
            for &(t, chi) in ctx.point_group() {
                *out.entry(self.ops.apply_state(t, x, ctx.pars)).or_insert_with(Complex64::zero) += c * f64::from(chi);
            }
            x = self.ops.shift_state(x, ctx.a, ctx.pars);
        }
        out
    }
}

/// Number of configurations of `l` sites with `sps` local states holding `np` particles.
fn sector_dimension(l: usize, sps: usize, np: usize) -> u64 {
    let mut ways = vec![0u64; np + 1];
    ways[0] = 1;
    for _ in 0..l {
        let mut next = vec![0u64; np + 1];
        for (total, &w) in ways.iter().enumerate() {
            for d in 0..sps.min(np + 1 - total) {
                next[total + d] = next[total + d].saturating_add(w);
            }
        }
        ways = next;
    }
    ways[np]
}

/// Number of unconstrained states fixed by `T^shift ∘ h`: one free local state per site cycle
/// when the cycle carries an even number of flips, the flip-invariant local states otherwise.
fn fixed_states(pars: &SiteParams, shift: usize, h: Option<Transform>) -> u64 {
    let (l, sps) = (pars.l(), pars.sps() as u64);
    let reflects = matches!(h, Some(Transform::Reflect | Transform::ReflectFlip));
    let flipped = |i: usize| match h {
        Some(Transform::FlipAll | Transform::ReflectFlip) => true,
        Some(Transform::FlipSublatticeA) => i % 2 == 0,
        Some(Transform::FlipSublatticeB) => i % 2 == 1,
        _ => false,
    };
    let image = |i: usize| (if reflects { l - 1 - i } else { i } + shift) % l;

    let mut visited = vec![false; l];
    let mut count: u64 = 1;
    for start in 0..l {
        if visited[start] {
            continue;
        }
        let mut flips = 0;
        let mut i = start;
        while !visited[i] {
            visited[i] = true;
            flips += usize::from(flipped(i));
            i = image(i);
        }
        count = count.saturating_mul(if flips % 2 == 0 { sps } else { sps % 2 });
    }
    count
}

impl<B: BitOps> BasisKernels for OrbitKernels<B> {
    fn bitops(&self) -> &dyn BitOps {
        &self.ops
    }

    /// Burnside count of the orbits among the candidates, doubled where a representative can
    /// carry both parity branches. Only the elements that keep the particle number are counted,
    /// and their fixed points are bounded by the unconstrained count and by the candidates.
    fn estimate_size(&self, ctx: &SectorContext<'_>, particles: Option<usize>) -> usize {
        let pars = ctx.pars;
        let candidates = match particles {
            Some(np) => sector_dimension(pars.l(), pars.sps(), np),
            None => pars.full_dim(),
        };
        let half_filled = particles.is_none_or(|np| 2 * np == pars.l() * (pars.sps() - 1));
        let keeps_particles = |t: Transform| match t {
            Transform::Reflect => true,
            Transform::FlipAll | Transform::ReflectFlip => half_filled,
            Transform::FlipSublatticeA | Transform::FlipSublatticeB => particles.is_none(),
        };
        let mut elements: Vec<Option<Transform>> = vec![None];
        elements.extend(ctx.point_group().iter().map(|&(t, _)| t).filter(|&t| keeps_particles(t)).map(Some));

        let mut fixed: u128 = 0;
        for r in 0..ctx.steps() {
            for &h in &elements {
                fixed += u128::from(fixed_states(pars, r * ctx.a, h).min(candidates));
            }
        }
        let order = (ctx.steps() * elements.len()) as u128;
        let branches = match ctx.sector.momentum() {
            Some(kb) if ctx.sector.has_parity_branch() && !momentum_is_real(kb, ctx.lc()) => 2,
            _ => 1,
        };
        let bound = (fixed.div_ceil(order) * branches).min(u128::from(candidates));
        usize::try_from(bound).unwrap_or(usize::MAX)
    }

    fn enumerate(&self, ctx: &SectorContext<'_>, particles: Option<usize>, out: &mut SectorArrays) -> usize {
        let before = out.len();
        for s in 0..ctx.pars.full_dim() {
            if particles.is_some_and(|np| ctx.pars.particle_count(s) != np) {
                continue;
            }
            if let Some(orbit) = self.classify(ctx, s) {
                self.push_states(ctx, s, &orbit, out);
            }
        }
        out.len() - before
    }

    fn apply_op(
        &self,
        args: &OpArgs<'_>,
        opstr: &str,
        indx: &[usize],
        coupling: Complex64,
        real_output: bool,
        out: &mut OpBuffers,
    ) -> OpStatus {
        let ctx = SectorContext::new(args.sector, args.pars, args.a);
        let ns = args.basis.len();
        let negative = |i: usize| args.n.is_some_and(|n| n[i] < 0);

        for (i, &s) in args.basis.iter().enumerate() {
            let (t, amp) = match self.act(opstr, indx, s, args.pars) {
                Ok(Some(hit)) => hit,
                Ok(None) => continue,
                Err(status) => return status,
            };
            let amp = amp * coupling;

            let targets: Vec<(usize, Complex64)> = if matches!(args.sector, Sector::Full) {
                match args.basis.binary_search(&t) {
                    Ok(j) => vec![(j, Complex64::one())],
                    Err(_) => continue,
                }
            } else {
                let rep = self.representative(&ctx, t);
                let start = args.basis.partition_point(|&b| b < rep);
                let end = args.basis.partition_point(|&b| b <= rep);
                if start == end {
                    continue;
                }
                let image = self.expand(&ctx, t, negative(i), args.norms[i]);
                (start..end)
                    .map(|j| {
                        let target = self.expand(&ctx, rep, negative(j), args.norms[j]);
                        let overlap: Complex64 = target
                            .iter()
                            .filter_map(|(x, e)| image.get(x).map(|v| e.conj() * v))
                            .sum();
                        (j, overlap)
                    })
                    .collect()
            };

            for (slot, (j, overlap)) in targets.into_iter().enumerate() {
                if overlap.norm() < NORM_TOLERANCE {
                    continue;
                }
                let me = amp * overlap;
                if real_output && me.im.abs() > IMAG_TOLERANCE {
                    return OpStatus::RealComplexMismatch;
                }
                let k = slot * ns + i;
                if k < out.me.len() {
                    out.me[k] = me;
                    out.row[k] = j;
                    out.col[k] = i;
                }
            }
        }
        OpStatus::Ok
    }
}
