//! Truncated Coulomb interaction for isolated systems.
//!
//! A kernel is built once per lattice, sample count and truncation geometry and
//! then applied as a pointwise multiplier to half-space reciprocal-space data.
//! Point-charge energies and forces use the same truncation.

mod isolated;
pub use isolated::CoulombIsolated;
mod spherical;
pub use spherical::*;
mod kernel_cache;
pub use kernel_cache::KernelCache;
mod kernel_file;

pub use ewald::{EwaldError, PointCharge};

use fftgrid::FFTGrid;
use lattice::Lattice;
use std::{fmt, io, path::PathBuf, str::FromStr};
use thiserror::Error;
use types::c64;

#[derive(Debug, Error)]
pub enum CoulombError {
    #[error("border width {border_width} bohrs must be less than half the Wigner-Seitz cell in-radius = {max} bohrs")]
    BorderWidthTooLarge { border_width: f64, max: f64 },

    #[error("border width {0} bohrs must be positive")]
    NonPositiveBorderWidth(f64),

    #[error("spherical truncation radius {rc} exceeds Wigner-Seitz cell in-radius of {max} bohrs")]
    RadiusTooLarge { rc: f64, max: f64 },

    #[error("spherical truncation radius {0} bohrs must not be negative")]
    NegativeRadius(f64),

    #[error("insufficient memory (need {gb:.1}GB); hint: try increasing border width")]
    InsufficientMemory { gb: f64 },

    #[error("could not write coulomb kernel file: {0}")]
    CacheWrite(#[from] io::Error),

    #[error("unknown coulomb truncation '{0}'")]
    UnknownTruncation(String),

    #[error(transparent)]
    Ewald(#[from] EwaldError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncationGeometry {
    Isolated,
    Spherical,
}

impl FromStr for TruncationGeometry {
    type Err = CoulombError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isolated" => Ok(TruncationGeometry::Isolated),
            "spherical" => Ok(TruncationGeometry::Spherical),
            other => Err(CoulombError::UnknownTruncation(other.to_string())),
        }
    }
}

impl fmt::Display for TruncationGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TruncationGeometry::Isolated => write!(f, "isolated"),
            TruncationGeometry::Spherical => write!(f, "spherical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoulombTruncationParams {
    pub geometry: TruncationGeometry,

    /// Isolated geometry: width of the smoothing region inside the
    /// Wigner-Seitz boundary, bohr.
    pub border_width: f64,

    /// Spherical geometry: truncation radius, bohr; 0 selects the in-radius.
    pub rc: f64,

    /// Precomputed kernel file (isolated geometry only).
    pub filename: Option<PathBuf>,
}

impl Default for CoulombTruncationParams {
    fn default() -> Self {
        CoulombTruncationParams {
            geometry: TruncationGeometry::Isolated,
            border_width: 1.0,
            rc: 0.0,
            filename: None,
        }
    }
}

pub trait Coulomb: Send + Sync {
    /// Multiplies half-space reciprocal-space coefficients by the kernel.
    fn apply(&self, rhog: &mut [c64]);

    /// Interaction energy of the point charges; -dE/dpos is added to their forces.
    fn energy_and_grad(&self, charges: &mut [PointCharge]) -> Result<f64, CoulombError>;

    fn name(&self) -> &'static str;
}

pub fn new(
    latt: &Lattice,
    grid: &FFTGrid,
    params: &CoulombTruncationParams,
) -> Result<Box<dyn Coulomb>, CoulombError> {
    let coulomb: Box<dyn Coulomb> = match params.geometry {
        TruncationGeometry::Isolated => Box::new(CoulombIsolated::new(latt, grid, params)?),
        TruncationGeometry::Spherical => Box::new(CoulombSpherical::new(latt, grid, params)?),
    };

    Ok(coulomb)
}

#[cfg(test)]
mod tests;
