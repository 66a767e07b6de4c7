use num_traits::Zero;
use types::c64;

pub fn erf(x: f64) -> f64 {
    libm::erf(x)
}

pub fn erfc(x: f64) -> f64 {
    libm::erfc(x)
}

// below this |x| erf(x)/x is evaluated from its Taylor series

pub const ERF_BY_X_SERIES_CUTOFF: f64 = dwconsts::EPS1;

/// erf(x)/x, finite at x = 0 where it equals 2/sqrt(pi).
pub fn erf_by_x(x: f64) -> f64 {
    if x.abs() < ERF_BY_X_SERIES_CUTOFF {
        let x2 = x * x;
        let x4 = x2 * x2;
        let x6 = x2 * x4;
        let x8 = x4 * x4;
        let x10 = x2 * x8;
        let x12 = x4 * x8;

        dwconsts::TWO_OVER_SQRTPI
            * (1.0 - x2 / 3.0 + x4 / 10.0 - x6 / 42.0 + x8 / 216.0 - x10 / 1320.0
                + x12 / 9360.0)

        // 2/sqrt(pi) * (1 - x**2/3 + x**4/10 - x**6/42 + x**8/216 - x**10/1320 + x**12/9360 + O(x**14))
    } else {
        erf(x) / x
    }
}

// nodes closer than this fall back to the scaled matrix exponential

const DIVIDED_DIFFERENCE_MIN_GAP: f64 = dwconsts::EPS1;

/// Divided difference exp[z0, z1, ..., zn] of the exponential over the given nodes.
///
/// For distinct, well separated nodes this is
///
///   sum_j exp(z_j) / prod_{k != j} (z_j - z_k)
///
/// and it tends to exp^(n)(z)/n! as all nodes merge into z.
pub fn exp_divided_difference(z: &[c64]) -> c64 {
    assert!(!z.is_empty());

    let n = z.len();

    let mut min_gap = f64::MAX;

    for j in 0..n {
        for k in 0..j {
            min_gap = min_gap.min((z[j] - z[k]).norm());
        }
    }

    if min_gap >= DIVIDED_DIFFERENCE_MIN_GAP {
        exp_divided_difference_direct(z)
    } else {
        exp_divided_difference_matrix(z)
    }
}

fn exp_divided_difference_direct(z: &[c64]) -> c64 {
    let mut sum = c64::zero();

    for (j, &zj) in z.iter().enumerate() {
        let mut denom = c64::new(1.0, 0.0);

        for (k, &zk) in z.iter().enumerate() {
            if k != j {
                denom *= zj - zk;
            }
        }

        sum += zj.exp() / denom;
    }

    sum
}

// exp[z0..zn] is the top-right entry of exp(Z), Z = diag(z) + superdiagonal of ones.
// exp(Z) is evaluated by scaling and squaring a Taylor series about the mean node.

fn exp_divided_difference_matrix(z: &[c64]) -> c64 {
    const TAYLOR_ORDER: usize = 18;

    let n = z.len();

    let center = z.iter().sum::<c64>() / n as f64;

    let norm = z.iter().map(|x| (x - center).norm()).fold(0.0, f64::max) + 1.0;

    let mut nsquare = 0;
    let mut scale = 1.0;

    while norm * scale > 0.5 {
        nsquare += 1;
        scale *= 0.5;
    }

    let mut a = vec![c64::zero(); n * n];

    for j in 0..n {
        a[j * n + j] = (z[j] - center) * scale;

        if j + 1 < n {
            a[j * n + j + 1] = c64::new(scale, 0.0);
        }
    }

    let mut e = identity(n);
    let mut term = identity(n);

    for k in 1..=TAYLOR_ORDER {
        term = matmul(&term, &a, n);
        term.iter_mut().for_each(|x| *x /= k as f64);

        e.iter_mut().zip(term.iter()).for_each(|(x, t)| *x += t);
    }

    for _ in 0..nsquare {
        e = matmul(&e, &e, n);
    }

    e[n - 1] * center.exp()
}

fn identity(n: usize) -> Vec<c64> {
    let mut m = vec![c64::zero(); n * n];

    for j in 0..n {
        m[j * n + j] = c64::new(1.0, 0.0);
    }

    m
}

// row-major n x n

fn matmul(a: &[c64], b: &[c64], n: usize) -> Vec<c64> {
    let mut c = vec![c64::zero(); n * n];

    for i in 0..n {
        for k in 0..n {
            let aik = a[i * n + k];

            if aik.is_zero() {
                continue;
            }

            for j in 0..n {
                c[i * n + j] += aik * b[k * n + j];
            }
        }
    }

    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exp_divided_difference_coincident_nodes() {
        // exp[z, z, z, z] = exp(z) / 3!

        let z = c64::new(0.3, -1.2);

        let dd = exp_divided_difference(&[z, z, z, z]);

        let expected = z.exp() / 6.0;

        assert_relative_eq!(dd.re, expected.re, epsilon = 1E-14);
        assert_relative_eq!(dd.im, expected.im, epsilon = 1E-14);

        assert_relative_eq!(exp_divided_difference(&[c64::zero(); 4]).re, 1.0 / 6.0, epsilon = 1E-15);
    }

    #[test]
    fn test_exp_divided_difference_branches_agree() {
        let nodes = [
            c64::new(0.0, 0.0),
            c64::new(0.0, -0.7),
            c64::new(0.0, 1.9),
            c64::new(0.0, -3.4),
        ];

        let direct = exp_divided_difference_direct(&nodes);
        let matrix = exp_divided_difference_matrix(&nodes);

        assert_relative_eq!(direct.re, matrix.re, epsilon = 1E-12);
        assert_relative_eq!(direct.im, matrix.im, epsilon = 1E-12);
    }

    #[test]
    fn test_exp_divided_difference_two_nodes() {
        let a = c64::new(0.0, 0.5);
        let b = c64::new(0.0, -2.0);

        let dd = exp_divided_difference(&[a, b]);
        let expected = (a.exp() - b.exp()) / (a - b);

        assert_relative_eq!(dd.re, expected.re, epsilon = 1E-14);
        assert_relative_eq!(dd.im, expected.im, epsilon = 1E-14);
    }

    #[test]
    fn test_erf_by_x_limit() {
        assert_eq!(erf_by_x(0.0), dwconsts::TWO_OVER_SQRTPI);
        assert!(erf_by_x(0.0).is_finite());
        assert!(erf_by_x(1E-300).is_finite());
    }

    #[test]
    fn test_erf_by_x_continuous_at_crossover() {
        let below = erf_by_x(ERF_BY_X_SERIES_CUTOFF * (1.0 - 1E-12));
        let above = erf_by_x(ERF_BY_X_SERIES_CUTOFF);

        assert_relative_eq!(below, above, max_relative = 1E-13);
    }

    #[test]
    fn test_erf_by_x_matches_direct() {
        for &x in [0.05, -0.05, 0.2, 1.0, 3.0, -2.5].iter() {
            assert_relative_eq!(erf_by_x(x), erf(x) / x, max_relative = 1E-13);
        }
    }

    #[test]
    fn test_erfc() {
        assert_relative_eq!(erf(0.5) + erfc(0.5), 1.0, epsilon = 1E-15);
    }
}
