use crate::{Coulomb, CoulombError, CoulombTruncationParams, PointCharge};

use dwconsts::*;
use ewald::{EwaldIsolated, Truncation};
use fftgrid::FFTGrid;
use lattice::Lattice;
use log::info;
use rayon::prelude::*;
use types::c64;
use wignerseitz::WignerSeitz;

/// Fourier transform of 1/r truncated at `rc`:
///
///   4 pi (1 - cos(|G| rc)) / G^2, with 2 pi rc^2 at G = 0
pub fn spherical_kernel(g2: f64, rc: f64) -> f64 {
    if g2 > 0.0 {
        FOURPI * (1.0 - (g2.sqrt() * rc).cos()) / g2
    } else {
        TWOPI * rc * rc
    }
}

/// Coulomb interaction cut off sharply at a sphere inside the Wigner-Seitz cell.
pub struct CoulombSpherical {
    g2: Vec<f64>,
    ws: WignerSeitz,
    rc: f64,
}

impl CoulombSpherical {
    pub fn new(
        latt: &Lattice,
        grid: &FFTGrid,
        params: &CoulombTruncationParams,
    ) -> Result<CoulombSpherical, CoulombError> {
        let ws = WignerSeitz::new(latt);

        let rc_max = ws.in_radius();

        if params.rc < 0.0 {
            return Err(CoulombError::NegativeRadius(params.rc));
        }

        if params.rc > rc_max {
            return Err(CoulombError::RadiusTooLarge {
                rc: params.rc,
                max: rc_max,
            });
        }

        let rc = if params.rc == 0.0 { rc_max } else { params.rc };

        info!("initialized spherical truncation of radius {} bohrs", rc);

        Ok(CoulombSpherical {
            g2: grid.get_half_space_g2(&latt.get_reciprocal_metric_tensor()),
            ws,
            rc,
        })
    }

    pub fn get_rc(&self) -> f64 {
        self.rc
    }

    pub fn get_wigner_seitz(&self) -> &WignerSeitz {
        &self.ws
    }
}

impl Coulomb for CoulombSpherical {
    fn apply(&self, rhog: &mut [c64]) {
        assert_eq!(rhog.len(), self.g2.len());

        let rc = self.rc;

        rhog.par_iter_mut()
            .zip(self.g2.par_iter())
            .for_each(|(v, &g2)| *v *= spherical_kernel(g2, rc));
    }

    fn energy_and_grad(&self, charges: &mut [PointCharge]) -> Result<f64, CoulombError> {
        let truncation = Truncation::Spherical { rc: self.rc };

        let energy = EwaldIsolated::new(&self.ws, truncation).energy_and_grad(charges)?;

        Ok(energy)
    }

    fn name(&self) -> &'static str {
        "spherical"
    }
}
