use matrix::*;
use vector3::*;

use std::{f64::consts, fmt};

/// Simulation cell; the columns of `data` are the lattice vectors a, b, c.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lattice {
    data: Matrix<f64>,
}

impl Lattice {
    pub fn new(a: &[f64], b: &[f64], c: &[f64]) -> Lattice {
        let mut data = Matrix::<f64>::new(3, 3);

        data.set_col(0, a);
        data.set_col(1, b);
        data.set_col(2, c);

        Lattice { data }
    }

    /// R^T R, the metric for lengths of vectors given in lattice coordinates.
    pub fn get_metric_tensor(&self) -> Matrix<f64> {
        let mut g = Matrix::<f64>::new(3, 3);

        let v = [
            self.get_vector_a(),
            self.get_vector_b(),
            self.get_vector_c(),
        ];

        for i in 0..3 {
            for j in 0..3 {
                g[[i, j]] = v[i].dot_product(&v[j]);
            }
        }

        g
    }

    /// G^T G of the reciprocal lattice, the metric for Miller indices.
    pub fn get_reciprocal_metric_tensor(&self) -> Matrix<f64> {
        self.reciprocal().get_metric_tensor()
    }

    pub fn as_matrix(&self) -> &Matrix<f64> {
        &self.data
    }

    // ( a x b ) . c
    pub fn volume(&self) -> f64 {
        let a = self.get_vector_a();
        let b = self.get_vector_b();
        let c = self.get_vector_c();

        a.cross_product(&b).dot_product(&c)
    }

    // ra = 2 x PI x (b x c) / volume
    // rb = 2 x PI x (c x a) / volume
    // rc = 2 x PI x (a x b) / volume
    pub fn reciprocal(&self) -> Lattice {
        let factor = 2.0 * consts::PI / self.volume();

        let a = self.get_vector_a();
        let b = self.get_vector_b();
        let c = self.get_vector_c();

        let blatt_a = b.cross_product(&c) * factor;
        let blatt_b = c.cross_product(&a) * factor;
        let blatt_c = a.cross_product(&b) * factor;

        Lattice::new(&blatt_a.to_vec(), &blatt_b.to_vec(), &blatt_c.to_vec())
    }

    pub fn get_vector_a(&self) -> Vector3f64 {
        self.get_vector(0)
    }

    pub fn get_vector_b(&self) -> Vector3f64 {
        self.get_vector(1)
    }

    pub fn get_vector_c(&self) -> Vector3f64 {
        self.get_vector(2)
    }

    pub fn get_vector(&self, i: usize) -> Vector3f64 {
        let v = self.data.get_col(i);

        Vector3f64::new(v[0], v[1], v[2])
    }

    pub fn scaled_by(&mut self, f: f64) {
        self.data.as_mut_slice().iter_mut().for_each(|v| *v *= f);
    }

    pub fn frac_to_cart(&self, pos_f: &Vector3f64) -> Vector3f64 {
        let mut pos_c = [0.0; 3];

        self.data.action(&pos_f.to_array(), &mut pos_c);

        Vector3f64::from_array(pos_c)
    }

    /// |R x|^2 for x in lattice coordinates.
    pub fn frac_length_squared(&self, pos_f: &Vector3f64) -> f64 {
        self.frac_to_cart(pos_f).norm_squared()
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let a = self.get_vector_a();
        let b = self.get_vector_b();
        let c = self.get_vector_c();

        write!(f,
               "{}\n{:25.16}\t{:25.16}\t{:25.16}\n{:25.16}\t{:25.16}\t{:25.16}\n{:25.16}\t{:25.16}\t{:25.16}", "Lattice",
               a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lattice() {
        let latt = Lattice::new(&[1.0, 0.1, 0.0], &[0.0, 1.0, 0.2], &[0.0, 0.3, 1.0]);

        let mut latt_1 = latt.clone();
        latt_1.scaled_by(2.0);

        assert_relative_eq!(latt_1.volume(), 8.0 * latt.volume(), epsilon = 1E-12);

        // a_i . b_j = 2 pi delta_ij

        let blatt = latt.reciprocal();

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 2.0 * consts::PI } else { 0.0 };

                assert_relative_eq!(
                    latt.get_vector(i).dot_product(&blatt.get_vector(j)),
                    expected,
                    epsilon = 1E-12
                );
            }
        }
    }

    #[test]
    fn test_frac_to_cart() {
        let latt = Lattice::new(&[1.0, 0.1, 0.0], &[0.0, 1.0, 0.2], &[0.0, 0.3, 1.0]);

        let pos_f = Vector3f64::new(0.2, 0.3, 0.4);

        let pos_c = latt.frac_to_cart(&pos_f);

        assert!((pos_c - Vector3f64::new(0.2, 0.44, 0.46)).max_abs() < 1E-12);

        let rtr = latt.get_metric_tensor();

        assert_relative_eq!(
            rtr.quadratic_form(&pos_f.to_array()),
            latt.frac_length_squared(&pos_f),
            epsilon = 1E-12
        );
    }

    #[test]
    fn test_reciprocal_metric() {
        let latt = Lattice::new(&[4.0, 0.0, 0.0], &[0.0, 5.0, 0.0], &[0.0, 0.0, 8.0]);

        let ggt = latt.get_reciprocal_metric_tensor();

        assert_relative_eq!(ggt[[0, 0]], (2.0 * consts::PI / 4.0).powi(2), epsilon = 1E-12);
        assert_relative_eq!(ggt[[2, 2]], (2.0 * consts::PI / 8.0).powi(2), epsilon = 1E-12);
        assert_eq!(ggt[[0, 1]], 0.0);
    }
}
