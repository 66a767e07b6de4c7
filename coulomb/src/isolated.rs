use crate::{kernel_file, Coulomb, CoulombError, CoulombTruncationParams, PointCharge};

use dwconsts::*;
use dwfft3d::DWFFT3D;
use ewald::{EwaldIsolated, Truncation};
use fftgrid::FFTGrid;
use lattice::Lattice;
use log::{debug, info, warn};
use num_traits::Zero;
use rayon::prelude::*;
use std::path::Path;
use types::c64;
use vector3::*;
use wignerseitz::WignerSeitz;

// gaussian width relative to the border width

const SIGMA_PER_BORDER_WIDTH: f64 = 0.1;

// lower bound on the supercell Nyquist frequency, in units of 1/sigma

pub(crate) const NYQUIST_FACTOR: f64 = 10.0;

// exp(-x) below e^-50 is dropped from the smoothed shape function

const GAUSSIAN_EXPONENT_MAX: f64 = 50.0;

/// Coulomb kernel truncated on the Wigner-Seitz cell, smoothed over a border
/// of finite width inside the cell boundary.
pub struct CoulombIsolated {
    latt: Lattice,
    grid: FFTGrid,
    ws: WignerSeitz,
    border_width: f64,
    kernel: Vec<f64>,
    from_cache: bool,

    // max |Im| of the downsampled kernel relative to its G = 0 long-range part
    imag_residual: Option<f64>,
}

impl CoulombIsolated {
    pub fn new(
        latt: &Lattice,
        grid: &FFTGrid,
        params: &CoulombTruncationParams,
    ) -> Result<CoulombIsolated, CoulombError> {
        Self::build(latt, grid, params, NYQUIST_FACTOR)
    }

    pub(crate) fn build(
        latt: &Lattice,
        grid: &FFTGrid,
        params: &CoulombTruncationParams,
        nyquist_factor: f64,
    ) -> Result<CoulombIsolated, CoulombError> {
        let ws = WignerSeitz::new(latt);

        let border_width = params.border_width;

        if let Some(path) = params.filename.as_deref() {
            if let Some(kernel) = kernel_file::load(path, latt, grid, border_width) {
                return Ok(CoulombIsolated {
                    latt: latt.clone(),
                    grid: grid.clone(),
                    ws,
                    border_width,
                    kernel,
                    from_cache: true,
                    imag_residual: None,
                });
            }
        }

        let (kernel, imag_residual) =
            compute_kernel(latt, grid, &ws, border_width, nyquist_factor)?;

        let coulomb = CoulombIsolated {
            latt: latt.clone(),
            grid: grid.clone(),
            ws,
            border_width,
            kernel,
            from_cache: false,
            imag_residual: Some(imag_residual),
        };

        if let Some(path) = params.filename.as_deref() {
            if let Err(e) = coulomb.save_kernel(path) {
                warn!("{} ('{}'); keeping the kernel in memory", e, path.display());
            }
        }

        Ok(coulomb)
    }

    pub fn save_kernel(&self, path: &Path) -> Result<(), CoulombError> {
        info!("saving isolated coulomb kernel to '{}'", path.display());

        kernel_file::save(path, &self.latt, &self.grid, self.border_width, &self.kernel)?;

        Ok(())
    }

    /// Kernel at the half-space reciprocal-space points of the grid.
    pub fn get_kernel(&self) -> &[f64] {
        &self.kernel
    }

    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    /// None for a kernel read from file.
    pub(crate) fn get_imag_residual(&self) -> Option<f64> {
        self.imag_residual
    }

    pub fn get_border_width(&self) -> f64 {
        self.border_width
    }

    pub fn get_wigner_seitz(&self) -> &WignerSeitz {
        &self.ws
    }
}

impl Coulomb for CoulombIsolated {
    fn apply(&self, rhog: &mut [c64]) {
        assert_eq!(rhog.len(), self.kernel.len());

        rhog.par_iter_mut()
            .zip(self.kernel.par_iter())
            .for_each(|(v, k)| *v *= *k);
    }

    fn energy_and_grad(&self, charges: &mut [PointCharge]) -> Result<f64, CoulombError> {
        let truncation = Truncation::WignerSeitz {
            border_width: self.border_width,
        };

        let energy = EwaldIsolated::new(&self.ws, truncation).energy_and_grad(charges)?;

        Ok(energy)
    }

    fn name(&self) -> &'static str {
        "isolated"
    }
}

fn alloc_zeroed(n: usize, gb: f64) -> Result<Vec<c64>, CoulombError> {
    let mut v = Vec::new();

    v.try_reserve_exact(n)
        .map_err(|_| CoulombError::InsufficientMemory { gb })?;

    v.resize(n, c64::zero());

    Ok(v)
}

fn compute_kernel(
    latt: &Lattice,
    grid: &FFTGrid,
    ws: &WignerSeitz,
    border_width: f64,
    nyquist_factor: f64,
) -> Result<(Vec<f64>, f64), CoulombError> {
    // gauss-smoothing parameter

    if border_width <= 0.0 {
        return Err(CoulombError::NonPositiveBorderWidth(border_width));
    }

    let max_border_width = 0.5 * ws.in_radius();

    if border_width > max_border_width {
        return Err(CoulombError::BorderWidthTooLarge {
            border_width,
            max: max_border_width,
        });
    }

    let sigma = SIGMA_PER_BORDER_WIDTH * border_width;

    info!(
        "selecting gaussian width {} bohrs (for border width {} bohrs)",
        sigma, border_width
    );

    // 2x2x2 supercell

    let mut latt_sup = latt.clone();
    latt_sup.scaled_by(2.0);

    let gnyq = nyquist_factor / sigma;

    let mut size_sup = [0usize; 3];

    for (k, n) in size_sup.iter_mut().enumerate() {
        let len = latt_sup.get_vector(k).norm2();

        let nk = 2 * (gnyq * len / TWOPI).ceil() as usize;

        *n = fftgrid::get_even_fftwn(nk.max(2 * grid.get_size()[k]));
    }

    let grid_sup = FFTGrid::from_size(size_sup[0], size_sup[1], size_sup[2]);

    info!("setting up 2x2x2 supercell: sample count = {}", grid_sup);

    let nr_sup = grid_sup.get_ntot();
    let ng_sup = grid_sup.get_n_half();

    let gb = utility::size_in_gb::<c64>(ng_sup);

    // one buffer, half-space coefficients or the packed real field

    let mut data = alloc_zeroed(ng_sup, gb)?;

    let fft = DWFFT3D::new(size_sup[0], size_sup[1], size_sup[2]);

    // smoothed theta function of the Wigner-Seitz cell

    info!("computing truncation shape function");

    let simplices = ws.get_simplices_3d();
    let blatt_sup = latt_sup.reciprocal();
    let vol_prefac = 1.0 / latt_sup.volume().abs();
    let half_sigma_sq = 0.5 * sigma * sigma;

    data.par_iter_mut().enumerate().for_each(|(i, v)| {
        let g = blatt_sup.frac_to_cart(&grid_sup.half_space_miller(i).to_f64());

        let exponent = half_sigma_sq * g.norm_squared();

        // real by inversion symmetry of the cell

        *v = if exponent > GAUSSIAN_EXPONENT_MAX {
            c64::zero()
        } else {
            let theta: f64 = simplices.iter().map(|s| s.get_tilde(&g).re).sum();

            c64::new(vol_prefac * theta * (-exponent).exp(), 0.0)
        };
    });

    fft.c2r(&mut data);

    // multiply by the long-ranged erf(r)/r of the minimal image

    info!("applying truncation to coulomb kernel");

    let rtr_sup = latt_sup.get_metric_tensor();
    let a = 0.5f64.sqrt() / sigma;
    let dv = latt_sup.volume().abs() / nr_sup as f64;

    let n3_sup = size_sup[2];
    let nh_sup = grid_sup.get_n3_half();

    // scaling invariance: the cell's restriction acts on supercell lattice coordinates

    let weight = |i: usize| {
        let x = ws.restrict(&grid_sup.real_space_frac(i));

        let ar = a * rtr_sup.quadratic_form(&x.to_array()).sqrt();

        dv * a * special::erf_by_x(ar)
    };

    data.par_chunks_mut(nh_sup).enumerate().for_each(|(row, line)| {
        let (pairs, padding) = line.split_at_mut(nh_sup - 1);

        for (k, v) in pairs.iter_mut().enumerate() {
            let i = row * n3_sup + 2 * k;

            v.re *= weight(i);
            v.im *= weight(i + 1);
        }

        padding[0] = c64::zero();
    });

    fft.r2c(&mut data);

    // downsample to the cell's sample count, adding the short-ranged erfc(r)/r

    let ggt = latt.get_reciprocal_metric_tensor();

    let norm = data[0].norm();

    let (kernel, imag): (Vec<f64>, Vec<f64>) = (0..grid.get_n_half())
        .into_par_iter()
        .map(|i| {
            let m = grid.half_space_miller(i);

            let isup = grid_sup.half_space_index(&Vector3i32::new(2 * m.x, 2 * m.y, 2 * m.z));

            let g2 = ggt.quadratic_form(&m.to_f64().to_array());

            let short_range = if g2 > 0.0 {
                (1.0 - (-half_sigma_sq * g2).exp()) / g2
            } else {
                half_sigma_sq
            };

            (data[isup].re + FOURPI * short_range, data[isup].im.abs())
        })
        .unzip();

    // real up to roundoff

    let imag_residual = imag.into_iter().fold(0.0, f64::max) / norm;

    if imag_residual > EPS8 {
        warn!(
            "isolated coulomb kernel has relative imaginary part {:e}",
            imag_residual
        );
    } else {
        debug!(
            "isolated coulomb kernel relative imaginary part {:e}",
            imag_residual
        );
    }

    Ok((kernel, imag_residual))
}
