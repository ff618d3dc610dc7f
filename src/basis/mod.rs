// src/basis/mod.rs

//! Symmetry-reduced bases of 1-D chains.
//!
//! A [`Basis`] is built once by [`BasisBuilder`] from the chain length, the local dimension, an
//! optional particle number (or a set of particle-number sectors) and the requested
//! [`SymmetryBlocks`]. The builder validates the blocks, selects the [`Sector`], and lets the
//! enumeration kernels fill the representative and auxiliary arrays.

pub mod embed;
pub mod entanglement;
pub mod norms;
pub mod op;

use crate::core::constants::basis_constants::MAXPRINT;
use crate::core::{BasisError, BasisType, Sector, SiteParams, SymmetryBlocks};
use crate::kernels::{BasisKernels, OpArgs, OrbitKernels, SectorArrays, SectorContext};
use std::fmt;
use std::sync::Arc;

/// Particle-number request of a [`BasisBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Particles {
    Any,
    Fixed(usize),
    Sectors(Vec<usize>),
    UpTo(usize),
}

/// The symmetry-reduced basis.
///
/// Representatives are sorted ascending. In momentum sectors combined with a reflection, one
/// representative may carry two basis states (cosine and sine branch); those are adjacent, the
/// cosine branch first.
#[derive(Clone)]
pub struct Basis {
    l: usize,
    sps: usize,
    ns: usize,
    basis_type: BasisType,
    representatives: Vec<u64>,
    sector: Sector,
    n: Option<Vec<i32>>,
    m: Option<Vec<i32>>,
    conserved: String,
    unique_me: bool,
    blocks: SymmetryBlocks,
    pars: SiteParams,
    particle_numbers: Option<Vec<usize>>,
    kernels: Arc<dyn BasisKernels>,
}

impl Basis {
    /// Builds the basis of a single particle-number sector (or of the whole space).
    fn make_block(
        pars: &SiteParams,
        particles: Option<usize>,
        blocks: &SymmetryBlocks,
        count_particles: bool,
        check_particles: bool,
        kernels: Arc<dyn BasisKernels>,
    ) -> Result<Self, BasisError> {
        let l = pars.l();
        let resolved = blocks.resolve(l, pars.sps(), particles, check_particles)?;
        let sector = Sector::select(&resolved);
        kernels.check_supported(&sector)?;

        let ctx = SectorContext::new(&sector, pars, resolved.a);
        let estimate = kernels.estimate_size(&ctx, particles);
        let mut arrays = SectorArrays::with_capacity(estimate);
        let ns = kernels.enumerate(&ctx, particles, &mut arrays);
        let SectorArrays { mut basis, mut n, mut m } = arrays;
        basis.truncate(ns);
        basis.shrink_to_fit();
        n.truncate(ns);
        n.shrink_to_fit();
        m.truncate(ns);
        m.shrink_to_fit();

        log::debug!(
            "sector '{}' (L = {}, sps = {}, Np = {:?}): {} of {} estimated states",
            sector.name(),
            l,
            pars.sps(),
            particles,
            ns,
            estimate
        );

        let mut conserved = String::new();
        if particles.is_some() {
            conserved.push('N');
        }
        if !sector.label().is_empty() {
            if !conserved.is_empty() {
                conserved.push_str(" & ");
            }
            conserved.push_str(sector.label());
        }

        let particle_numbers =
            count_particles.then(|| basis.iter().map(|&s| particles.unwrap_or_else(|| pars.particle_count(s))).collect());

        Ok(Basis {
            l,
            sps: pars.sps(),
            ns,
            basis_type: pars.basis_type(),
            n: sector.uses_n().then_some(n),
            m: sector.uses_m().then_some(m),
            representatives: basis,
            unique_me: !sector.has_parity_branch(),
            sector,
            conserved,
            blocks: resolved,
            pars: pars.clone(),
            particle_numbers,
            kernels,
        })
    }

    /// Concatenates `other` into this basis and restores the ascending order.
    ///
    /// Both bases must come from the same kernel family with the same local dimension, chain
    /// length and resolved symmetry blocks.
    pub fn append(&mut self, other: &Basis) -> Result<(), BasisError> {
        if self.kernels.family() != other.kernels.family() || self.sps != other.sps || !self.sector.same_kind(&other.sector) {
            return Err(BasisError::config("basis", "can only append basis objects of the same type"));
        }
        if self.l != other.l {
            return Err(BasisError::config("L", "appending incompatible system sizes"));
        }
        if self.blocks != other.blocks {
            return Err(BasisError::config("blocks", "appending incompatible blocks"));
        }

        let total = self.ns + other.ns;
        let mut representatives = std::mem::take(&mut self.representatives);
        representatives.extend_from_slice(&other.representatives);
        let mut order: Vec<usize> = (0..total).collect();
        order.sort_by_key(|&i| representatives[i]);
        let permute = |values: &[i32]| -> Vec<i32> { order.iter().map(|&i| values[i]).collect() };

        if let (Some(n), Some(other_n)) = (self.n.as_mut(), other.n.as_ref()) {
            n.extend_from_slice(other_n);
            *n = permute(n);
        }
        if let (Some(m), Some(other_m)) = (self.m.as_mut(), other.m.as_ref()) {
            m.extend_from_slice(other_m);
            *m = permute(m);
        }
        if self.particle_numbers.is_some() || other.particle_numbers.is_some() {
            let counts = |basis: &Basis| -> Vec<usize> {
                basis
                    .particle_numbers
                    .clone()
                    .unwrap_or_else(|| basis.representatives.iter().map(|&s| basis.pars.particle_count(s)).collect())
            };
            let mut numbers = counts(self);
            numbers.extend(counts(other));
            self.particle_numbers = Some(order.iter().map(|&i| numbers[i]).collect());
        }
        self.representatives = order.iter().map(|&i| representatives[i]).collect();
        self.ns = total;

        log::debug!("appended {} states to sector '{}': Ns = {}", other.ns, self.sector.name(), self.ns);
        Ok(())
    }

    /// Number of basis states.
    pub fn ns(&self) -> usize {
        self.ns
    }

    /// Chain length.
    pub fn l(&self) -> usize {
        self.l
    }

    /// States per site.
    pub fn sps(&self) -> usize {
        self.sps
    }

    pub fn basis_type(&self) -> BasisType {
        self.basis_type
    }

    /// Conserved quantities, e.g. `"N & T & P"`.
    pub fn conserved(&self) -> &str {
        &self.conserved
    }

    pub fn representatives(&self) -> &[u64] {
        &self.representatives
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.representatives.iter()
    }

    pub fn get(&self, i: usize) -> Option<u64> {
        self.representatives.get(i).copied()
    }

    /// Index of the first basis state whose representative is `state`.
    pub fn index(&self, state: u64) -> Result<usize, BasisError> {
        let i = self.representatives.partition_point(|&s| s < state);
        match self.representatives.get(i) {
            Some(&s) if s == state => Ok(i),
            _ => Err(BasisError::argument("s", "s must be representive state in basis")),
        }
    }

    /// Same as [`Basis::index`] with the state written as a digit string, site 0 first.
    pub fn index_of(&self, state: &str) -> Result<usize, BasisError> {
        self.index(self.pars.state_to_int(state)?)
    }

    pub fn state_to_int(&self, state: &str) -> Result<u64, BasisError> {
        self.pars.state_to_int(state)
    }

    pub fn int_to_state(&self, state: u64) -> String {
        self.pars.int_to_state(state)
    }

    /// Resolved symmetry blocks, derived eigenvalues included.
    pub fn blocks(&self) -> &SymmetryBlocks {
        &self.blocks
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    /// Signed orbit sizes, present whenever a symmetry is active.
    pub fn n(&self) -> Option<&[i32]> {
        self.n.as_deref()
    }

    /// Packed orbit structure, present in momentum sectors with a point group.
    pub fn m(&self) -> Option<&[i32]> {
        self.m.as_deref()
    }

    /// `false` when an operator can produce two matrix elements per column.
    pub fn unique_me(&self) -> bool {
        self.unique_me
    }

    /// Particle number of every basis state, when the builder counted them.
    pub fn particle_numbers(&self) -> Option<&[usize]> {
        self.particle_numbers.as_deref()
    }

    pub fn site_params(&self) -> &SiteParams {
        &self.pars
    }

    pub fn kernels(&self) -> &Arc<dyn BasisKernels> {
        &self.kernels
    }

    /// Characters accepted in operator strings.
    pub fn allowed_ops(&self) -> Vec<char> {
        let mut ops = vec!['I', 'z', 'n', '+', '-'];
        if self.sps == 2 {
            ops.extend(['x', 'y']);
        }
        ops
    }

    /// Binds the operator arguments: `N`, `M`, representatives, `L` and site parameters.
    pub fn op_args<'a>(&'a self, norms: &'a [f64]) -> OpArgs<'a> {
        OpArgs {
            n: self.n.as_deref(),
            m: self.m.as_deref(),
            basis: &self.representatives,
            l: self.l,
            pars: &self.pars,
            sector: &self.sector,
            a: self.blocks.a,
            norms,
        }
    }

    /// Human-readable description, listing at most `MAXPRINT` states.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Debug for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Basis")
            .field("l", &self.l)
            .field("sps", &self.sps)
            .field("ns", &self.ns)
            .field("sector", &self.sector)
            .field("blocks", &self.blocks)
            .field("family", &self.kernels.family())
            .finish()
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symm = match self.conserved.len() {
            0 => "no symmetry",
            1 => "symmetry",
            _ => "symmetries",
        };
        writeln!(f, "1d basis for chain of L = {} containing {} states", self.l, self.ns)?;
        writeln!(f, "\t{}: {}", symm, self.conserved)?;
        writeln!(f, "\tquantum numbers: {}", self.blocks)?;
        writeln!(f, "\tlattice spacing: a = {}", self.blocks.a)?;
        writeln!(f)?;
        writeln!(f, "reference states:")?;

        let width = self.ns.max(1).to_string().len();
        let line = |f: &mut fmt::Formatter<'_>, i: usize| -> fmt::Result {
            let digits: Vec<String> = self.pars.digits(self.representatives[i]).iter().map(u64::to_string).collect();
            writeln!(f, "\t{:>width$}.  |{}>", i, digits.join(" "), width = width)
        };
        if self.ns > MAXPRINT {
            let half = MAXPRINT / 2;
            for i in 0..half {
                line(f, i)?;
            }
            writeln!(f, "\t{:>width$}", ":", width = width)?;
            for i in self.ns - half..self.ns {
                line(f, i)?;
            }
        } else {
            for i in 0..self.ns {
                line(f, i)?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Basis {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.representatives.iter()
    }
}

//-------------------------------------------------------------------------
// Basis Builder
//-------------------------------------------------------------------------

/// Method-chaining constructor for [`Basis`].
///
/// ```
/// use symbasis::BasisBuilder;
/// let basis = BasisBuilder::new(4).kblock(0).build().unwrap();
/// assert_eq!(basis.ns(), 6);
/// ```
#[derive(Clone)]
pub struct BasisBuilder {
    l: usize,
    sps: usize,
    particles: Particles,
    count_particles: bool,
    blocks: SymmetryBlocks,
    kernels: Arc<dyn BasisKernels>,
}

impl BasisBuilder {
    /// Starts a spin-1/2 chain of `l` sites without symmetries.
    pub fn new(l: usize) -> Self {
        Self {
            l,
            sps: 2,
            particles: Particles::Any,
            count_particles: false,
            blocks: SymmetryBlocks::default(),
            kernels: Arc::new(OrbitKernels::new()),
        }
    }

    /// States per site.
    pub fn sps(mut self, sps: usize) -> Self {
        self.sps = sps;
        self
    }

    /// Fixes the particle number (magnetization sector).
    pub fn particles(mut self, np: usize) -> Self {
        self.particles = Particles::Fixed(np);
        self
    }

    /// Builds one sub-basis per particle number and merges them.
    pub fn particle_sectors<I>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.particles = Particles::Sectors(sectors.into_iter().collect());
        self
    }

    /// Merges the particle sectors `0..=np` and counts the particles of every state.
    pub fn max_particles(mut self, np: usize) -> Self {
        self.particles = Particles::UpTo(np);
        self
    }

    /// Stores the particle number of every basis state.
    pub fn count_particles(mut self, count: bool) -> Self {
        self.count_particles = count;
        self
    }

    pub fn kblock(mut self, k: i64) -> Self {
        self.blocks.kblock = Some(k);
        self
    }

    pub fn pblock(mut self, p: i8) -> Self {
        self.blocks.pblock = Some(p);
        self
    }

    pub fn zblock(mut self, z: i8) -> Self {
        self.blocks.zblock = Some(z);
        self
    }

    pub fn zablock(mut self, za: i8) -> Self {
        self.blocks.zablock = Some(za);
        self
    }

    pub fn zbblock(mut self, zb: i8) -> Self {
        self.blocks.zbblock = Some(zb);
        self
    }

    pub fn pzblock(mut self, pz: i8) -> Self {
        self.blocks.pzblock = Some(pz);
        self
    }

    /// Translation unit cell `a`.
    pub fn unit_cell(mut self, a: usize) -> Self {
        self.blocks.a = a;
        self
    }

    /// Replaces all symmetry blocks at once.
    pub fn blocks(mut self, blocks: SymmetryBlocks) -> Self {
        self.blocks = blocks;
        self
    }

    /// Enumeration kernels to use instead of [`OrbitKernels`].
    pub fn kernels(mut self, kernels: Arc<dyn BasisKernels>) -> Self {
        self.kernels = kernels;
        self
    }

    /// Validates the configuration and enumerates the basis.
    pub fn build(self) -> Result<Basis, BasisError> {
        let pars = SiteParams::new(self.l, self.sps)?;
        match self.particles {
            Particles::Any => {
                Basis::make_block(&pars, None, &self.blocks, self.count_particles, true, self.kernels)
            }
            Particles::Fixed(np) => {
                Basis::make_block(&pars, Some(np), &self.blocks, self.count_particles, true, self.kernels)
            }
            Particles::Sectors(sectors) => {
                build_sectors(&pars, sectors, &self.blocks, self.count_particles, self.kernels)
            }
            Particles::UpTo(np) => {
                let flips = [("zblock", self.blocks.zblock), ("zAblock", self.blocks.zablock), ("zBblock", self.blocks.zbblock)];
                if let Some((name, _)) = flips.iter().find(|(_, block)| block.is_some()) {
                    return Err(BasisError::config(
                        name,
                        "spin inversion symmetry not compatible with particle conserving photon_basis",
                    ));
                }
                let np = np.min(self.l * (self.sps - 1));
                build_sectors(&pars, (0..=np).collect(), &self.blocks, true, self.kernels)
            }
        }
    }
}

impl fmt::Debug for BasisBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasisBuilder")
            .field("l", &self.l)
            .field("sps", &self.sps)
            .field("particles", &self.particles)
            .field("count_particles", &self.count_particles)
            .field("blocks", &self.blocks)
            .finish()
    }
}

/// Builds one sub-basis per particle number, then folds them together with [`Basis::append`].
fn build_sectors(
    pars: &SiteParams,
    mut sectors: Vec<usize>,
    blocks: &SymmetryBlocks,
    count_particles: bool,
    kernels: Arc<dyn BasisKernels>,
) -> Result<Basis, BasisError> {
    sectors.sort_unstable();
    sectors.dedup();
    if sectors.is_empty() {
        return Err(BasisError::config("Np", "at least one particle-number sector is required"));
    }
    if blocks.zablock.is_some() || blocks.zbblock.is_some() {
        let name = if blocks.zablock.is_some() { "zAblock" } else { "zBblock" };
        return Err(BasisError::config(name, "zA/cA and zB/cB symmetries incompatible with magnetisation/particle symmetry"));
    }
    if blocks.zblock.is_some() || blocks.pzblock.is_some() {
        let name = if blocks.zblock.is_some() { "zblock" } else { "pzblock" };
        let max = pars.l() * (pars.sps() - 1);
        if let Some(np) = sectors.iter().find(|&&np| np <= max && sectors.binary_search(&(max - np)).is_err()) {
            return Err(BasisError::config(
                name,
                format!("particle sectors must be closed under Np -> {} - Np, {} has no partner", max, np),
            ));
        }
    }

    let sub_bases = sectors
        .iter()
        .map(|&np| Basis::make_block(pars, Some(np), blocks, count_particles, false, Arc::clone(&kernels)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut iter = sub_bases.into_iter();
    let Some(mut merged) = iter.next() else {
        return Err(BasisError::config("Np", "at least one particle-number sector is required"));
    };
    for sub in iter {
        merged.append(&sub)?;
    }
    Ok(merged)
}
