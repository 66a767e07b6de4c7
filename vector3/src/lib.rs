mod vector3_f64;
pub use vector3_f64::*;

mod vector3_i32;
pub use vector3_i32::*;

///////////////////////////////////////////////////

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: num_traits::identities::Zero + Copy> Vector3<T> {
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Self {
        Vector3 { x, y, z }
    }

    #[inline]
    pub fn zeros() -> Vector3<T> {
        Vector3 {
            x: T::zero(),
            y: T::zero(),
            z: T::zero(),
        }
    }

    #[inline]
    pub fn from_array(v: [T; 3]) -> Self {
        Vector3 {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }

    #[inline]
    pub fn to_array(&self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_vec(&self) -> Vec<T> {
        vec![self.x, self.y, self.z]
    }

    #[inline]
    pub fn set_zeros(&mut self) {
        self.x = T::zero();
        self.y = T::zero();
        self.z = T::zero();
    }
}
