use crate::Matrix;

use nalgebra::DMatrix;

impl Matrix<f64> {
    pub fn action(&self, vin: &[f64], vout: &mut [f64]) {
        vout.iter_mut().for_each(|x| *x = 0.0);

        for i in 0..self.ncol {
            for j in 0..self.nrow {
                vout[j] += self[[j, i]] * vin[i];
            }
        }
    }

    /// In-place inverse; panics on a singular matrix.
    pub fn inv(&mut self) {
        assert_eq!(self.nrow, self.ncol, "Matrix::inv requires a square matrix");

        let mat = DMatrix::<f64>::from_column_slice(self.nrow, self.ncol, self.as_slice());

        match mat.try_inverse() {
            Some(inv) => self.data.copy_from_slice(inv.as_slice()),
            None => panic!("Matrix::inv of a singular {}x{} matrix", self.nrow, self.ncol),
        }
    }

    // v^T M v
    pub fn quadratic_form(&self, v: &[f64]) -> f64 {
        assert_eq!(v.len(), self.ncol);

        let mut s = 0.0;

        for i in 0..self.ncol {
            for j in 0..self.nrow {
                s += v[j] * self[[j, i]] * v[i];
            }
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_cols(cols: [[f64; 3]; 3]) -> Matrix<f64> {
        let mut m = Matrix::<f64>::new(3, 3);

        for (i, c) in cols.iter().enumerate() {
            m.set_col(i, c);
        }

        m
    }

    #[test]
    fn test_matrix_inverse() {
        let mut m = from_cols([[2.0, 0.1, 0.0], [0.0, 3.0, 0.2], [0.3, 0.0, 4.0]]);
        let m0 = m.clone();

        m.inv();

        // M^-1 (M e_k) = e_k

        for k in 0..3 {
            let mut e = [0.0; 3];
            e[k] = 1.0;

            let mut me = [0.0; 3];
            m0.action(&e, &mut me);

            let mut back = [0.0; 3];
            m.action(&me, &mut back);

            for (x, y) in e.iter().zip(back.iter()) {
                assert!((x - y).abs() < 1E-12);
            }
        }
    }

    #[test]
    #[should_panic(expected = "singular")]
    fn test_singular_inverse_panics() {
        let mut m = from_cols([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]]);

        m.inv();
    }

    #[test]
    fn test_matrix_action_and_transpose() {
        let m = from_cols([[1.0, 0.0, 0.0], [2.0, 1.0, 0.0], [3.0, 4.0, 5.0]]);

        assert_eq!(m.transpose()[[2, 0]], 3.0);
        assert_eq!(m[[0, 2]], 3.0);

        let mut v = [0.0; 3];
        m.action(&[1.0, 1.0, 1.0], &mut v);
        assert_eq!(v, [6.0, 5.0, 5.0]);

        assert_eq!(m.quadratic_form(&[1.0, 0.0, 1.0]), 9.0);
    }
}
