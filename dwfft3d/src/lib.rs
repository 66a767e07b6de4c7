//! Unnormalized 3D discrete Fourier transforms of real fields, axis 3 fastest.
//!
//! forward : f(G) = sum_r f(r) exp(-i G.r)
//! backward: f(r) = sum_G f(G) exp(+i G.r)
//!
//! Both directions work in place on one buffer of `n1 * n2 * (n3/2 + 1)` complex
//! values. In reciprocal space it holds the half-space coefficients (`i3 <= n3/2`).
//! In real space each row along axis 3 is packed two values per slot: the value
//! at `i3` sits in the real part (even `i3`) or imaginary part (odd `i3`) of slot
//! `i3/2`, and slot `n3/2` is padding. `n3` must be even.

use num_traits::Zero;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};
use std::{f64::consts, sync::Arc};
use types::c64;

pub struct DWFFT3D {
    n1: usize,
    n2: usize,
    n3: usize,
    plan_fwd: [Arc<dyn Fft<f64>>; 3],
    plan_bwd: [Arc<dyn Fft<f64>>; 3],

    // exp(-2 pi i k / n3), k = 0..=n3/2
    twiddle: Vec<c64>,
}

impl DWFFT3D {
    pub fn new(n1: usize, n2: usize, n3: usize) -> DWFFT3D {
        assert!(
            n3 > 0 && n3 % 2 == 0,
            "real-field transforms need an even n3, got {}",
            n3
        );

        let m = n3 / 2;

        let mut planner = FftPlanner::<f64>::new();

        let plan_fwd = [
            planner.plan_fft_forward(n1),
            planner.plan_fft_forward(n2),
            planner.plan_fft_forward(m),
        ];

        let plan_bwd = [
            planner.plan_fft_inverse(n1),
            planner.plan_fft_inverse(n2),
            planner.plan_fft_inverse(m),
        ];

        let twiddle = (0..=m)
            .map(|k| c64::from_polar(1.0, -2.0 * consts::PI * k as f64 / n3 as f64))
            .collect();

        DWFFT3D {
            n1,
            n2,
            n3,
            plan_fwd,
            plan_bwd,
            twiddle,
        }
    }

    pub fn get_ntot(&self) -> usize {
        self.n1 * self.n2 * self.n3
    }

    /// Buffer length for both directions.
    pub fn get_n_half(&self) -> usize {
        self.n1 * self.n2 * (self.n3 / 2 + 1)
    }

    /// Half-space coefficients -> packed real field.
    pub fn c2r(&self, data: &mut [c64]) {
        assert_eq!(data.len(), self.get_n_half());

        self.transform_axes_12(&self.plan_bwd, data);

        let m = self.n3 / 2;

        data.par_chunks_mut(m + 1).for_each(|line| {
            let x = line.to_vec();

            // even samples in the real parts, odd samples in the imaginary parts

            for k in 0..m {
                let xc = x[m - k].conj();

                let fe = x[k] + xc;
                let fo = (x[k] - xc) * self.twiddle[k].conj();

                line[k] = fe + c64::new(-fo.im, fo.re);
            }

            line[m] = c64::zero();

            self.plan_bwd[2].process(&mut line[..m]);
        });
    }

    /// Packed real field -> half-space coefficients.
    pub fn r2c(&self, data: &mut [c64]) {
        assert_eq!(data.len(), self.get_n_half());

        let m = self.n3 / 2;

        data.par_chunks_mut(m + 1).for_each(|line| {
            self.plan_fwd[2].process(&mut line[..m]);

            let z = line[..m].to_vec();

            for k in 0..=m {
                let zk = z[k % m];
                let zc = z[(m - k) % m].conj();

                let even = (zk + zc) * 0.5;
                let odd = (zk - zc) * c64::new(0.0, -0.5);

                line[k] = even + self.twiddle[k] * odd;
            }
        });

        self.transform_axes_12(&self.plan_fwd, data);
    }

    fn transform_axes_12(&self, plans: &[Arc<dyn Fft<f64>>; 3], data: &mut [c64]) {
        let (n1, n2) = (self.n1, self.n2);
        let nh = self.n3 / 2 + 1;

        // axis 2, stride nh within each i1 slab

        data.par_chunks_mut(n2 * nh).for_each(|slab| {
            let mut line = vec![c64::zero(); n2];

            for i3 in 0..nh {
                for i2 in 0..n2 {
                    line[i2] = slab[i2 * nh + i3];
                }

                plans[1].process(&mut line);

                for i2 in 0..n2 {
                    slab[i2 * nh + i3] = line[i2];
                }
            }
        });

        // axis 1, stride n2 * nh; one i2 plane of columns at a time

        let stride = n2 * nh;

        let mut columns = vec![c64::zero(); n1 * nh];

        for i2 in 0..n2 {
            for i1 in 0..n1 {
                for i3 in 0..nh {
                    columns[i3 * n1 + i1] = data[i1 * stride + i2 * nh + i3];
                }
            }

            columns
                .par_chunks_mut(n1)
                .for_each(|col| plans[0].process(col));

            for i1 in 0..n1 {
                for i3 in 0..nh {
                    data[i1 * stride + i2 * nh + i3] = columns[i3 * n1 + i1];
                }
            }
        }
    }
}
