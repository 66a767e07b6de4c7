//! Sample counts of a regular grid over the unit cell, and the layout of its
//! real-space and half-space (Hermitian) reciprocal-space arrays.
//!
//! Real space: `n1 x n2 x n3` values, index `(i1 * n2 + i2) * n3 + i3`.
//!
//! Reciprocal space: only `i3 <= n3/2` is stored, `n1 x n2 x (n3/2 + 1)` values,
//! index `(i1 * n2 + i2) * (n3/2 + 1) + i3`. The coefficient at -G is the complex
//! conjugate of the one at G.

use lattice::Lattice;
use matrix::Matrix;
use rayon::prelude::*;
use std::{f64::consts, fmt};
use vector3::*;

const PARALLEL_MIN_LEN: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FFTGrid {
    n1: usize,
    n2: usize,
    n3: usize,
}

impl FFTGrid {
    pub fn get_ntot(&self) -> usize {
        self.n1 * self.n2 * self.n3
    }

    pub fn get_n1(&self) -> usize {
        self.n1
    }

    pub fn get_n2(&self) -> usize {
        self.n2
    }

    pub fn get_n3(&self) -> usize {
        self.n3
    }

    pub fn get_size(&self) -> [usize; 3] {
        [self.n1, self.n2, self.n3]
    }

    /// Stored extent of the last axis in the half-space layout.
    pub fn get_n3_half(&self) -> usize {
        self.n3 / 2 + 1
    }

    /// Number of stored reciprocal-space points.
    pub fn get_n_half(&self) -> usize {
        self.n1 * self.n2 * self.get_n3_half()
    }

    pub fn from_size(n1: usize, n2: usize, n3: usize) -> FFTGrid {
        assert!(n1 > 0 && n2 > 0 && n3 > 0, "empty FFT grid");

        FFTGrid { n1, n2, n3 }
    }

    pub fn new(latt: &Lattice, ecutrho: f64) -> FFTGrid {
        let gmax = (2.0 * ecutrho).sqrt();

        let twopi = 2.0 * consts::PI;

        let mut n1 = (2.0 * gmax * latt.get_vector_a().norm2() / twopi).ceil() as usize;
        let mut n2 = (2.0 * gmax * latt.get_vector_b().norm2() / twopi).ceil() as usize;
        let mut n3 = (2.0 * gmax * latt.get_vector_c().norm2() / twopi).ceil() as usize;

        n1 = get_fftwn(n1.max(1));
        n2 = get_fftwn(n2.max(1));
        n3 = get_fftwn(n3.max(1));

        FFTGrid { n1, n2, n3 }
    }

    /// Signed Miller index of the half-space point stored at `i`.
    pub fn half_space_miller(&self, i: usize) -> Vector3i32 {
        let nh = self.get_n3_half();

        let i3 = i % nh;
        let i2 = (i / nh) % self.n2;
        let i1 = i / (nh * self.n2);

        Vector3i32::new(
            utility::fft_n2i(i1, self.n1),
            utility::fft_n2i(i2, self.n2),
            i3 as i32,
        )
    }

    /// Storage index of a half-space Miller index (`miller.z` in `0..=n3/2`).
    pub fn half_space_index(&self, miller: &Vector3i32) -> usize {
        debug_assert!(miller.z >= 0 && (miller.z as usize) < self.get_n3_half());

        let i1 = utility::fft_i2n(miller.x, self.n1);
        let i2 = utility::fft_i2n(miller.y, self.n2);

        (i1 * self.n2 + i2) * self.get_n3_half() + miller.z as usize
    }

    /// Lattice coordinates of the real-space point stored at `i`.
    pub fn real_space_frac(&self, i: usize) -> Vector3f64 {
        let i3 = i % self.n3;
        let i2 = (i / self.n3) % self.n2;
        let i1 = i / (self.n3 * self.n2);

        Vector3f64::new(
            i1 as f64 / self.n1 as f64,
            i2 as f64 / self.n2 as f64,
            i3 as f64 / self.n3 as f64,
        )
    }

    /// |G|^2 at every half-space point, from the reciprocal metric G^T G.
    pub fn get_half_space_g2(&self, ggt: &Matrix<f64>) -> Vec<f64> {
        let g2 = |i: usize| ggt.quadratic_form(&self.half_space_miller(i).to_f64().to_array());

        let n = self.get_n_half();

        if n >= PARALLEL_MIN_LEN && rayon::current_num_threads() > 1 {
            (0..n).into_par_iter().map(g2).collect()
        } else {
            (0..n).map(g2).collect()
        }
    }
}

impl fmt::Display for FFTGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let outstr = format!("{} x {} x {}", self.n1, self.n2, self.n3);

        write!(f, "{}", outstr)
    }
}

/// Smallest n' >= n accepted by the transform engine.
pub fn get_fftwn(n: usize) -> usize {
    let mut tn = n;

    while !is_fftw_ok(tn) {
        tn += 1;
    }

    tn
}

/// Smallest even n' >= n accepted by the transform engine.
pub fn get_even_fftwn(n: usize) -> usize {
    let mut tn = n + n % 2;

    while !is_fftw_ok(tn) {
        tn += 2;
    }

    tn
}

pub fn is_fftw_ok(n_to_check: usize) -> bool {
    const FACTORS: [usize; 6] = [2, 3, 5, 7, 11, 13];

    if n_to_check == 0 {
        return false;
    }

    let mut tn = n_to_check;

    for fi in FACTORS.iter() {
        while tn % fi == 0 {
            tn /= fi;
        }
    }

    tn == 1
}
