use types::c64;
use vector3::*;

/// Tetrahedron with cartesian vertices.
#[derive(Debug, Clone)]
pub struct Simplex {
    v: [Vector3f64; 4],
    volume: f64,
}

impl Simplex {
    pub fn new(v: [Vector3f64; 4]) -> Simplex {
        let e1 = v[1] - v[0];
        let e2 = v[2] - v[0];
        let e3 = v[3] - v[0];

        let volume = e1.cross_product(&e2).dot_product(&e3).abs() / 6.0;

        Simplex { v, volume }
    }

    pub fn get_vertices(&self) -> &[Vector3f64; 4] {
        &self.v
    }

    pub fn get_volume(&self) -> f64 {
        self.volume
    }

    /// Fourier transform of the indicator function,
    ///
    ///   int_T exp(-i G.r) d^3r = 3! V exp[-i G.v0, -i G.v1, -i G.v2, -i G.v3]
    ///
    /// with exp[...] the divided difference of the exponential.
    pub fn get_tilde(&self, g: &Vector3f64) -> c64 {
        let z = [
            c64::new(0.0, -g.dot_product(&self.v[0])),
            c64::new(0.0, -g.dot_product(&self.v[1])),
            c64::new(0.0, -g.dot_product(&self.v[2])),
            c64::new(0.0, -g.dot_product(&self.v[3])),
        ];

        6.0 * self.volume * special::exp_divided_difference(&z)
    }
}
