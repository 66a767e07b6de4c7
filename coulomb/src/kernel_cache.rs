use crate::{Coulomb, CoulombError, CoulombTruncationParams, TruncationGeometry};

use fftgrid::FFTGrid;
use lattice::Lattice;
use log::debug;
use std::{collections::HashMap, path::PathBuf, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KernelKey {
    geometry: TruncationGeometry,
    length_bits: u64,
    size: [usize; 3],
    filename: Option<PathBuf>,
}

impl KernelKey {
    fn new(grid: &FFTGrid, params: &CoulombTruncationParams) -> KernelKey {
        let length = match params.geometry {
            TruncationGeometry::Isolated => params.border_width,
            TruncationGeometry::Spherical => params.rc,
        };

        KernelKey {
            geometry: params.geometry,
            length_bits: length.to_bits(),
            size: grid.get_size(),
            filename: params.filename.clone(),
        }
    }
}

/// Kernels built on first request and shared afterwards, all for one lattice.
#[derive(Default)]
pub struct KernelCache {
    latt: Option<Lattice>,
    kernels: HashMap<KernelKey, Arc<dyn Coulomb>>,
}

impl KernelCache {
    pub fn new() -> KernelCache {
        KernelCache::default()
    }

    /// Cached kernel for `params` on `grid`; a lattice different from the one
    /// of the cached kernels drops them all first.
    pub fn get(
        &mut self,
        latt: &Lattice,
        grid: &FFTGrid,
        params: &CoulombTruncationParams,
    ) -> Result<Arc<dyn Coulomb>, CoulombError> {
        if self.latt.as_ref() != Some(latt) {
            self.invalidate();
            self.latt = Some(latt.clone());
        }

        let key = KernelKey::new(grid, params);

        if let Some(coulomb) = self.kernels.get(&key) {
            return Ok(Arc::clone(coulomb));
        }

        debug!("building {} coulomb kernel for grid {}", params.geometry, grid);

        let coulomb: Arc<dyn Coulomb> = Arc::from(crate::new(latt, grid, params)?);

        self.kernels.insert(key, Arc::clone(&coulomb));

        Ok(coulomb)
    }

    pub fn invalidate(&mut self) {
        if !self.kernels.is_empty() {
            debug!("dropping {} cached coulomb kernels", self.kernels.len());
        }

        self.kernels.clear();
        self.latt = None;
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}
