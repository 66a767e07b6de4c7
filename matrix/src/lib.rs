use num_traits::identities::Zero;
use std::fmt;
use std::ops::{Index, IndexMut};

mod matrix_f64;

/// Dense column-major matrix; element `[[row, col]]` lives at `data[col * nrow + row]`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Matrix<T> {
    nrow: usize,
    ncol: usize,
    data: Vec<T>,
}

impl<T: Zero + Copy> Matrix<T> {
    pub fn new(nrow: usize, ncol: usize) -> Matrix<T> {
        Matrix {
            nrow,
            ncol,
            data: vec![T::zero(); nrow * ncol],
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get_col(&self, icol: usize) -> &[T] {
        &self.data[icol * self.nrow..(icol + 1) * self.nrow]
    }

    pub fn set_col(&mut self, icol: usize, v: &[T]) {
        assert_eq!(v.len(), self.nrow);

        self.data[icol * self.nrow..(icol + 1) * self.nrow].copy_from_slice(v);
    }

    pub fn transpose(&self) -> Matrix<T> {
        let mut mat = Matrix::<T>::new(self.ncol, self.nrow);

        for i in 0..self.ncol {
            for j in 0..self.nrow {
                mat[[i, j]] = self[[j, i]];
            }
        }

        mat
    }
}

impl<T> Index<[usize; 2]> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: [usize; 2]) -> &T {
        &self.data[idx[1] * self.nrow + idx[0]]
    }
}

impl<T> IndexMut<[usize; 2]> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut T {
        &mut self.data[idx[1] * self.nrow + idx[0]]
    }
}

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for j in 0..self.nrow {
            for i in 0..self.ncol {
                write!(f, "{:20.12} ", self[[j, i]])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
