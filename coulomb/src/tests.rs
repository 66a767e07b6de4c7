use super::*;
use approx::assert_relative_eq;
use dwconsts::*;
use std::{fs, path::PathBuf, sync::Arc};
use tempdir::TempDir;
use vector3::*;

// coarse supercell sampling, enough for smooth test densities

const TEST_NYQUIST_FACTOR: f64 = 2.5;

fn cubic(a: f64) -> Lattice {
    Lattice::new(&[a, 0.0, 0.0], &[0.0, a, 0.0], &[0.0, 0.0, a])
}

fn isolated_params(border_width: f64) -> CoulombTruncationParams {
    CoulombTruncationParams {
        geometry: TruncationGeometry::Isolated,
        border_width,
        ..Default::default()
    }
}

fn spherical_params(rc: f64) -> CoulombTruncationParams {
    CoulombTruncationParams {
        geometry: TruncationGeometry::Spherical,
        rc,
        ..Default::default()
    }
}

// 1/2 int int rho(r) rho(r') v(r - r') for a normalized gaussian of width s,
// from the half-space kernel; exact value 1 / (2 sqrt(pi) s)

fn gaussian_self_energy(latt: &Lattice, grid: &FFTGrid, coulomb: &dyn Coulomb, s: f64) -> f64 {
    let ggt = latt.get_reciprocal_metric_tensor();

    let rho: Vec<c64> = (0..grid.get_n_half())
        .map(|i| {
            let g2 = ggt.quadratic_form(&grid.half_space_miller(i).to_f64().to_array());
            c64::new((-0.5 * g2 * s * s).exp(), 0.0)
        })
        .collect();

    let mut phi = rho.clone();

    coulomb.apply(&mut phi);

    let mut energy = 0.0;

    for (i, (r, p)) in rho.iter().zip(phi.iter()).enumerate() {
        let w = if grid.half_space_miller(i).z == 0 { 1.0 } else { 2.0 };

        energy += w * (r.conj() * p).re;
    }

    0.5 * energy / latt.volume()
}

#[test]
fn test_truncation_geometry_from_str() {
    assert_eq!(
        "isolated".parse::<TruncationGeometry>().unwrap(),
        TruncationGeometry::Isolated
    );
    assert_eq!(
        "spherical".parse::<TruncationGeometry>().unwrap(),
        TruncationGeometry::Spherical
    );

    match "slab".parse::<TruncationGeometry>() {
        Err(CoulombError::UnknownTruncation(s)) => assert_eq!(s, "slab"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_spherical_kernel_small_g() {
    let rc = 3.0;

    assert_relative_eq!(spherical_kernel(0.0, rc), TWOPI * rc * rc);
    assert_relative_eq!(spherical_kernel(1E-8, rc), TWOPI * rc * rc, max_relative = 1E-6);

    // first zero at |G| rc = 2 pi

    assert_relative_eq!(spherical_kernel((TWOPI / rc).powi(2), rc), 0.0, epsilon = 1E-12);
}

#[test]
fn test_spherical_radius() {
    let latt = cubic(8.0);
    let grid = FFTGrid::from_size(8, 8, 8);

    let coulomb = CoulombSpherical::new(&latt, &grid, &spherical_params(0.0)).unwrap();
    assert_relative_eq!(coulomb.get_rc(), 4.0, epsilon = 1E-12);

    let coulomb = CoulombSpherical::new(&latt, &grid, &spherical_params(2.5)).unwrap();
    assert_eq!(coulomb.get_rc(), 2.5);

    match CoulombSpherical::new(&latt, &grid, &spherical_params(4.5)) {
        Err(CoulombError::RadiusTooLarge { rc, max }) => {
            assert_eq!(rc, 4.5);
            assert_relative_eq!(max, 4.0, epsilon = 1E-12);
        }
        _ => panic!("radius beyond the in-radius accepted"),
    }

    assert!(matches!(
        CoulombSpherical::new(&latt, &grid, &spherical_params(-1.0)),
        Err(CoulombError::NegativeRadius(_))
    ));
}

#[test]
fn test_spherical_gaussian_self_energy() {
    let latt = cubic(8.0);
    let grid = FFTGrid::from_size(32, 32, 32);

    let coulomb = new(&latt, &grid, &spherical_params(4.0)).unwrap();

    assert_eq!(coulomb.name(), "spherical");

    let s = 0.4;
    let energy = gaussian_self_energy(&latt, &grid, coulomb.as_ref(), s);

    assert_relative_eq!(energy, 1.0 / (2.0 * PI.sqrt() * s), max_relative = 1E-7);
}

#[test]
fn test_isolated_gaussian_self_energy() {
    let latt = cubic(8.0);
    let grid = FFTGrid::from_size(32, 32, 32);

    for &(border_width, s) in [(2.0, 0.4), (1.0, 0.6)].iter() {
        let coulomb =
            CoulombIsolated::build(&latt, &grid, &isolated_params(border_width), TEST_NYQUIST_FACTOR)
                .unwrap();

        assert!(!coulomb.is_from_cache());
        assert_eq!(coulomb.get_kernel().len(), grid.get_n_half());

        let energy = gaussian_self_energy(&latt, &grid, &coulomb, s);

        assert_relative_eq!(energy, 1.0 / (2.0 * PI.sqrt() * s), max_relative = 1E-5);
    }
}

#[test]
fn test_isolated_kernel_is_real() {
    let latt = Lattice::new(&[6.0, 0.3, -0.2], &[0.8, 6.0, 0.4], &[-0.5, 0.7, 6.0]);
    let grid = FFTGrid::from_size(12, 12, 12);

    let coulomb =
        CoulombIsolated::build(&latt, &grid, &isolated_params(1.4), TEST_NYQUIST_FACTOR).unwrap();

    let residual = coulomb.get_imag_residual().unwrap();

    assert!(residual < 1E-10, "relative imaginary part {:e}", residual);

    // kernel(G) = kernel(-G) on the self-conjugate plane m.z = 0

    for i in 0..grid.get_n_half() {
        let m = grid.half_space_miller(i);

        if m.z != 0 {
            continue;
        }

        let j = grid.half_space_index(&Vector3i32::new(-m.x, -m.y, 0));

        assert_relative_eq!(
            coulomb.get_kernel()[i],
            coulomb.get_kernel()[j],
            epsilon = 1E-9,
            max_relative = 1E-10
        );
    }
}

#[test]
fn test_isolated_border_width_checks() {
    let latt = cubic(8.0);
    let grid = FFTGrid::from_size(8, 8, 8);

    match new(&latt, &grid, &isolated_params(2.5)) {
        Err(CoulombError::BorderWidthTooLarge { border_width, max }) => {
            assert_eq!(border_width, 2.5);
            assert_relative_eq!(max, 2.0, epsilon = 1E-12);
        }
        _ => panic!("border width beyond half the in-radius accepted"),
    }

    assert!(matches!(
        new(&latt, &grid, &isolated_params(0.0)),
        Err(CoulombError::NonPositiveBorderWidth(_))
    ));
}

#[test]
fn test_kernel_file_roundtrip() {
    let dir = TempDir::new("coulomb").unwrap();
    let path = dir.path().join("kernel.bin");

    let latt = cubic(6.0);
    let grid = FFTGrid::from_size(12, 12, 12);

    let mut params = isolated_params(1.5);
    params.filename = Some(path.clone());

    let built = CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();

    assert!(!built.is_from_cache());

    let size = fs::metadata(&path).unwrap().len() as usize;
    assert_eq!(size, 9 * 8 + 3 * 4 + 8 + grid.get_n_half() * 8);

    // served from the file, no supercell computation

    let loaded = CoulombIsolated::new(&latt, &grid, &params).unwrap();

    assert!(loaded.is_from_cache());
    assert_eq!(loaded.get_kernel(), built.get_kernel());
}

#[test]
fn test_kernel_file_mismatch_recomputes() {
    let dir = TempDir::new("coulomb").unwrap();
    let path = dir.path().join("kernel.bin");

    let latt = cubic(6.0);
    let grid = FFTGrid::from_size(12, 12, 12);

    let mut params = isolated_params(1.5);
    params.filename = Some(path.clone());

    CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();

    // different border width

    params.border_width = 1.4;

    let other = CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();
    assert!(!other.is_from_cache());

    // the file now holds the new kernel

    let reread = CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();
    assert!(reread.is_from_cache());

    // different sample count

    let grid2 = FFTGrid::from_size(12, 12, 10);

    let other = CoulombIsolated::build(&latt, &grid2, &params, TEST_NYQUIST_FACTOR).unwrap();
    assert!(!other.is_from_cache());

    // different lattice

    let latt2 = cubic(6.5);

    let other = CoulombIsolated::build(&latt2, &grid2, &params, TEST_NYQUIST_FACTOR).unwrap();
    assert!(!other.is_from_cache());
}

#[test]
fn test_truncated_kernel_file_recomputes() {
    let dir = TempDir::new("coulomb").unwrap();
    let path = dir.path().join("kernel.bin");

    let latt = cubic(6.0);
    let grid = FFTGrid::from_size(12, 12, 12);

    let mut params = isolated_params(1.5);
    params.filename = Some(path.clone());

    let built = CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

    let rebuilt = CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();

    assert!(!rebuilt.is_from_cache());
    assert_eq!(rebuilt.get_kernel(), built.get_kernel());
}

#[test]
fn test_unwritable_kernel_file_keeps_kernel() {
    let dir = TempDir::new("coulomb").unwrap();
    let path = dir.path().join("missing").join("kernel.bin");

    let latt = cubic(6.0);
    let grid = FFTGrid::from_size(12, 12, 12);

    let mut params = isolated_params(1.5);
    params.filename = Some(path.clone());

    let coulomb = CoulombIsolated::build(&latt, &grid, &params, TEST_NYQUIST_FACTOR).unwrap();

    assert_eq!(coulomb.get_kernel().len(), grid.get_n_half());
    assert!(!path.exists());

    assert!(matches!(
        coulomb.save_kernel(&path),
        Err(CoulombError::CacheWrite(_))
    ));
}

#[test]
fn test_point_charges_through_kernel() {
    let latt = cubic(10.0);
    let grid = FFTGrid::from_size(8, 8, 8);

    let coulomb = new(&latt, &grid, &spherical_params(3.0)).unwrap();

    let mut charges = vec![
        PointCharge::new(Vector3f64::new(0.0, 0.0, 0.0), 1.0),
        PointCharge::new(Vector3f64::new(0.0, 0.0, 0.2), -1.0),
    ];

    let energy = coulomb.energy_and_grad(&mut charges).unwrap();

    assert_relative_eq!(energy, -0.5, epsilon = 1E-12);

    let mut charges = vec![
        PointCharge::new(Vector3f64::new(0.0, 0.0, 0.0), 1.0),
        PointCharge::new(Vector3f64::new(0.0, 0.0, 0.35), -1.0),
    ];

    assert!(matches!(
        coulomb.energy_and_grad(&mut charges),
        Err(CoulombError::Ewald(EwaldError::CutoffViolation { .. }))
    ));
}

#[test]
fn test_kernel_cache() {
    let latt = cubic(8.0);
    let grid = FFTGrid::from_size(8, 8, 8);

    let mut cache = KernelCache::new();

    assert!(cache.is_empty());

    let k1 = cache.get(&latt, &grid, &spherical_params(3.0)).unwrap();
    let k2 = cache.get(&latt, &grid, &spherical_params(3.0)).unwrap();

    assert!(Arc::ptr_eq(&k1, &k2));
    assert_eq!(cache.len(), 1);

    cache.get(&latt, &grid, &spherical_params(2.0)).unwrap();
    cache
        .get(&latt, &FFTGrid::from_size(8, 8, 10), &spherical_params(3.0))
        .unwrap();

    assert_eq!(cache.len(), 3);

    // a different kernel file is a different entry

    let mut params = spherical_params(3.0);
    params.filename = Some(PathBuf::from("kernel.bin"));

    let k4 = cache.get(&latt, &grid, &params).unwrap();

    assert!(!Arc::ptr_eq(&k1, &k4));
    assert_eq!(cache.len(), 4);

    // a new lattice drops everything built for the old one

    let k3 = cache.get(&cubic(9.0), &grid, &spherical_params(3.0)).unwrap();

    assert_eq!(cache.len(), 1);
    assert!(!Arc::ptr_eq(&k1, &k3));

    cache.invalidate();

    assert!(cache.is_empty());

    // failures are not cached

    assert!(cache.get(&latt, &grid, &spherical_params(5.0)).is_err());
    assert!(cache.is_empty());
}
