// tests/basis_tests.rs

// Import necessary types from the symbasis crate
use symbasis::{Basis, BasisBuilder, BasisError, BitOps, LocalSpinOps, OrbitKernels, Sector, SiteParams, Transform};

use std::collections::BTreeSet;
use std::sync::Arc;

// Bit operations that delegate to `LocalSpinOps` but refuse the listed capabilities
struct RestrictedOps {
    reflection: bool,
    shift: bool,
}

impl BitOps for RestrictedOps {
    fn family(&self) -> &str {
        LocalSpinOps.family()
    }

    fn supports(&self, transform: Transform) -> bool {
        self.reflection || !matches!(transform, Transform::Reflect | Transform::ReflectFlip)
    }

    fn supports_shift(&self) -> bool {
        self.shift
    }

    fn shift_state(&self, state: u64, a: usize, pars: &SiteParams) -> u64 {
        LocalSpinOps.shift_state(state, a, pars)
    }

    fn reflect_state(&self, state: u64, pars: &SiteParams) -> u64 {
        LocalSpinOps.reflect_state(state, pars)
    }

    fn flip_all_state(&self, state: u64, pars: &SiteParams) -> u64 {
        LocalSpinOps.flip_all_state(state, pars)
    }

    fn flip_sublattice_a_state(&self, state: u64, pars: &SiteParams) -> u64 {
        LocalSpinOps.flip_sublattice_a_state(state, pars)
    }

    fn flip_sublattice_b_state(&self, state: u64, pars: &SiteParams) -> u64 {
        LocalSpinOps.flip_sublattice_b_state(state, pars)
    }
}

// Helper: builder whose kernels use `RestrictedOps`
fn restricted(builder: BasisBuilder, reflection: bool, shift: bool) -> BasisBuilder {
    builder.kernels(Arc::new(OrbitKernels::with_bitops(RestrictedOps { reflection, shift })))
}

// Helper: digits of `state` with site 0 first
fn digits(state: u64, l: usize, sps: u64) -> Vec<u64> {
    let mut out = vec![0; l];
    let mut x = state;
    for i in (0..l).rev() {
        out[i] = x % sps;
        x /= sps;
    }
    out
}

// Helper: number of momentum-`kb` orbits under translation by `a`, counted by rotating digit strings
fn brute_force_orbits(l: usize, sps: u64, a: usize, kb: usize, np: Option<u64>) -> usize {
    let lc = l / a;
    let mut seen = BTreeSet::new();
    let mut count = 0;
    for state in 0..sps.pow(l as u32) {
        let d = digits(state, l, sps);
        if np.is_some_and(|np| d.iter().sum::<u64>() != np) {
            continue;
        }
        let orbit: BTreeSet<Vec<u64>> = (0..lc)
            .map(|r| {
                let mut rotated = d.clone();
                rotated.rotate_right(r * a);
                rotated
            })
            .collect();
        let Some(min) = orbit.iter().next().cloned() else { continue };
        if seen.insert(min) && (kb * orbit.len()) % lc == 0 {
            count += 1;
        }
    }
    count
}

// Helper: builds a basis and returns its size
fn ns(builder: BasisBuilder) -> Result<usize, BasisError> {
    Ok(builder.build()?.ns())
}

// Helper: checks that the representatives are sorted ascending (repeats allowed)
fn check_sorted(basis: &Basis) {
    let reps = basis.representatives();
    assert!(reps.windows(2).all(|w| w[0] <= w[1]), "representatives not sorted: {:?}", reps);
}

#[test]
fn test_full_space_dimension() -> Result<(), BasisError> {
    assert_eq!(ns(BasisBuilder::new(4))?, 16);
    assert_eq!(ns(BasisBuilder::new(3).sps(3))?, 27);
    assert_eq!(ns(BasisBuilder::new(4).kblock(0))?, 6);
    Ok(())
}

#[test]
fn test_translation_matches_orbit_count() -> Result<(), BasisError> {
    for (l, sps, a) in [(6, 2, 1), (8, 2, 2), (4, 3, 1)] {
        for kb in 0..l / a {
            let basis = BasisBuilder::new(l).sps(sps as usize).unit_cell(a).kblock(kb as i64).build()?;
            assert_eq!(basis.ns(), brute_force_orbits(l, sps, a, kb, None), "L={} sps={} a={} k={}", l, sps, a, kb);
            check_sorted(&basis);
        }
    }
    let basis = BasisBuilder::new(8).particles(3).kblock(2).build()?;
    assert_eq!(basis.ns(), brute_force_orbits(8, 2, 1, 2, Some(3)));
    Ok(())
}

#[test]
fn test_momentum_sectors_partition_the_space() -> Result<(), BasisError> {
    let l = 8;
    let mut total = 0;
    for kb in 0..l {
        total += ns(BasisBuilder::new(l).particles(4).kblock(kb as i64))?;
    }
    assert_eq!(total, 70);
    Ok(())
}

#[test]
fn test_point_group_sectors_partition_the_space() -> Result<(), BasisError> {
    let l = 6;
    let full = 1 << l;
    assert_eq!(ns(BasisBuilder::new(l).pblock(1))? + ns(BasisBuilder::new(l).pblock(-1))?, full);
    assert_eq!(ns(BasisBuilder::new(l).zblock(1))? + ns(BasisBuilder::new(l).zblock(-1))?, full);
    assert_eq!(ns(BasisBuilder::new(l).pzblock(1))? + ns(BasisBuilder::new(l).pzblock(-1))?, full);

    let mut total = 0;
    for (x, y) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        total += ns(BasisBuilder::new(l).pblock(x).zblock(y))?;
        assert!(ns(BasisBuilder::new(l).zablock(x).zbblock(y))? > 0);
    }
    assert_eq!(total, full);

    let mut total = 0;
    for (x, y) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        total += ns(BasisBuilder::new(l).zablock(x).zbblock(y))?;
    }
    assert_eq!(total, full);
    Ok(())
}

#[test]
fn test_translation_with_point_group_splits_momentum_sectors() -> Result<(), BasisError> {
    let l = 6;
    for kb in 0..l as i64 {
        let t = ns(BasisBuilder::new(l).kblock(kb))?;
        // reflection pairs k with -k outside k = 0, pi
        let self_conjugate = kb == 0 || 2 * kb == l as i64;
        let expected = if self_conjugate { t } else { 2 * t };

        let p = ns(BasisBuilder::new(l).kblock(kb).pblock(1))? + ns(BasisBuilder::new(l).kblock(kb).pblock(-1))?;
        assert_eq!(p, expected, "T & P at k={}", kb);
        let pz = ns(BasisBuilder::new(l).kblock(kb).pzblock(1))? + ns(BasisBuilder::new(l).kblock(kb).pzblock(-1))?;
        assert_eq!(pz, expected, "T & PZ at k={}", kb);
        let z = ns(BasisBuilder::new(l).kblock(kb).zblock(1))? + ns(BasisBuilder::new(l).kblock(kb).zblock(-1))?;
        assert_eq!(z, t, "T & Z at k={}", kb);

        let mut pzs = 0;
        for (p, z) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
            pzs += ns(BasisBuilder::new(l).kblock(kb).pblock(p).zblock(z))?;
        }
        assert_eq!(pzs, expected, "T & P & Z at k={}", kb);
    }
    Ok(())
}

#[test]
fn test_sublattice_flips_with_translation() -> Result<(), BasisError> {
    let (l, a) = (8, 2);
    for kb in 0..(l / a) as i64 {
        let t = ns(BasisBuilder::new(l).unit_cell(a).kblock(kb))?;
        let mut za = 0;
        let mut zab = 0;
        for x in [1, -1] {
            za += ns(BasisBuilder::new(l).unit_cell(a).kblock(kb).zablock(x))?;
            for y in [1, -1] {
                zab += ns(BasisBuilder::new(l).unit_cell(a).kblock(kb).zablock(x).zbblock(y))?;
            }
        }
        assert_eq!(za, t, "T & ZA at k={}", kb);
        assert_eq!(zab, t, "T & ZA & ZB at k={}", kb);
    }
    Ok(())
}

#[test]
fn test_sector_selection() -> Result<(), BasisError> {
    let basis = BasisBuilder::new(6).kblock(7).pblock(1).build()?;
    assert!(matches!(basis.sector(), Sector::TranslationParity { k: 1, p: 1 }));
    assert!(!basis.unique_me());

    let basis = BasisBuilder::new(6).pblock(-1).zblock(1).build()?;
    assert!(matches!(basis.sector(), Sector::ParityAndFlip { p: -1, z: 1 }));
    assert_eq!(basis.blocks().pzblock, Some(-1));
    Ok(())
}

#[test]
fn test_particle_sectors_merge_sorted() -> Result<(), BasisError> {
    let merged = BasisBuilder::new(6).particle_sectors([4, 2]).kblock(0).count_particles(true).build()?;
    let two = BasisBuilder::new(6).particles(2).kblock(0).build()?;
    let four = BasisBuilder::new(6).particles(4).kblock(0).build()?;
    assert_eq!(merged.ns(), two.ns() + four.ns());
    check_sorted(&merged);

    let counts = merged.particle_numbers().unwrap_or_default();
    for (s, np) in merged.iter().zip(counts) {
        assert_eq!(digits(*s, 6, 2).iter().sum::<u64>() as usize, *np);
    }
    Ok(())
}

#[test]
fn test_configuration_errors_name_the_parameter() {
    let cases = [
        (BasisBuilder::new(4).pblock(2), "pblock"),
        (BasisBuilder::new(4).particles(1).zblock(1), "zblock"),
        (BasisBuilder::new(6).unit_cell(3).kblock(0).zablock(1), "a"),
        (BasisBuilder::new(4).particles(2).zbblock(1), "zBblock"),
        (BasisBuilder::new(4).max_particles(2).zblock(1), "zblock"),
    ];
    for (builder, parameter) in cases {
        match builder.build() {
            Err(err @ BasisError::Configuration { .. }) => assert_eq!(err.parameter(), Some(parameter)),
            other => panic!("expected a configuration error for {}, got {:?}", parameter, other),
        }
    }
}

#[test]
fn test_display_lists_reference_states() -> Result<(), BasisError> {
    let basis = BasisBuilder::new(4).particles(2).kblock(0).build()?;
    let text = basis.to_string();
    assert!(text.contains("|0 0 1 1>"));
    assert!(text.contains("|0 1 0 1>"));

    let large = BasisBuilder::new(8).build()?;
    assert!(large.to_string().contains(':'));
    Ok(())
}

#[test]
fn test_unsupported_transforms_are_refused() -> Result<(), BasisError> {
    let cases = [
        (restricted(BasisBuilder::new(6).pblock(1), false, true), "pblock"),
        (restricted(BasisBuilder::new(6).kblock(1).pblock(-1), false, true), "pblock"),
        (restricted(BasisBuilder::new(6).kblock(0), true, false), "kblock"),
        (restricted(BasisBuilder::new(6).kblock(0).zblock(1), true, false), "kblock"),
    ];
    for (builder, parameter) in cases {
        match builder.build() {
            Err(err @ BasisError::Configuration { .. }) => assert_eq!(err.parameter(), Some(parameter)),
            other => panic!("expected {} to be refused, got {:?}", parameter, other),
        }
    }

    // sectors that need neither capability still build
    let basis = restricted(BasisBuilder::new(6).zblock(1), false, false).build()?;
    assert_eq!(basis.ns(), ns(BasisBuilder::new(6).zblock(1))?);
    Ok(())
}
