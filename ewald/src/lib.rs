//! Pairwise point-charge energy and forces for a truncated (isolated) cell.
//!
//! With the Coulomb interaction truncated at the Wigner-Seitz boundary (or at a
//! sphere of radius Rc inside it) every pair interacts through exactly one image,
//! so no reciprocal-space lattice sum is required.

use lattice::Lattice;
use log::debug;
use thiserror::Error;
use vector3::*;
use wignerseitz::WignerSeitz;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EwaldError {
    #[error("separation between charges {i} and {j} lies in the truncation border")]
    BorderViolation { i: usize, j: usize },

    #[error("charges {i} and {j} are separated by r = {r} >= Rc = {rc} bohrs")]
    CutoffViolation { i: usize, j: usize, r: f64, rc: f64 },
}

/// Position in lattice coordinates, charge, and an accumulator for -dE/dpos.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCharge {
    pub pos: Vector3f64,
    pub z: f64,
    pub force: Vector3f64,
}

impl PointCharge {
    pub fn new(pos: Vector3f64, z: f64) -> PointCharge {
        PointCharge {
            pos,
            z,
            force: Vector3f64::zeros(),
        }
    }

    /// `force` is covariant (dE/dx for x in lattice coordinates); F_cart = R^-T F.
    pub fn get_cartesian_force(&self, latt: &Lattice) -> Vector3f64 {
        let mut rt_inv = latt.as_matrix().transpose();
        rt_inv.inv();

        let mut f = [0.0; 3];
        rt_inv.action(&self.force.to_array(), &mut f);

        Vector3f64::from_array(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Truncation {
    /// Pairs may not come within `border_width` of the Wigner-Seitz boundary.
    WignerSeitz { border_width: f64 },

    /// Pairs must be closer than `rc`.
    Spherical { rc: f64 },
}

pub struct EwaldIsolated<'a> {
    ws: &'a WignerSeitz,
    truncation: Truncation,
}

impl<'a> EwaldIsolated<'a> {
    pub fn new(ws: &'a WignerSeitz, truncation: Truncation) -> EwaldIsolated<'a> {
        EwaldIsolated { ws, truncation }
    }

    pub fn get_truncation(&self) -> Truncation {
        self.truncation
    }

    /// Total energy of all pairs. Forces are added to `charges[i].force`;
    /// positions are replaced by images consistent with charge 0.
    pub fn energy_and_grad(&self, charges: &mut [PointCharge]) -> Result<f64, EwaldError> {
        if charges.is_empty() {
            return Ok(0.0);
        }

        // move every charge into the Wigner-Seitz cell centered on charge 0

        let pos0 = charges[0].pos;

        for pc in charges.iter_mut() {
            pc.pos = pos0 + self.ws.restrict(&(pc.pos - pos0));
        }

        let rtr = self.ws.get_metric_tensor();

        let mut energy = 0.0;

        for i in 0..charges.len() {
            for j in 0..i {
                let x = charges[i].pos - charges[j].pos;

                let r2 = rtr.quadratic_form(&x.to_array());
                let r = r2.sqrt();

                match self.truncation {
                    Truncation::WignerSeitz { border_width } => {
                        if self.ws.boundary_distance(&x) <= border_width {
                            return Err(EwaldError::BorderViolation { i, j });
                        }
                    }

                    Truncation::Spherical { rc } => {
                        if r >= rc {
                            return Err(EwaldError::CutoffViolation { i, j, r, rc });
                        }
                    }
                }

                let de = charges[i].z * charges[j].z / r;

                let mut rtr_x = [0.0; 3];
                rtr.action(&x.to_array(), &mut rtr_x);

                let df = Vector3f64::from_array(rtr_x) * (de / r2);

                energy += de;

                charges[i].force += df;
                charges[j].force -= df;
            }
        }

        debug!(
            "isolated point-charge energy = {:.12} for {} charges",
            energy,
            charges.len()
        );

        Ok(energy)
    }
}
