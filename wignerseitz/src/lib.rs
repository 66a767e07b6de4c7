//! Wigner-Seitz cell of a lattice: minimal-image restriction, distance to the
//! cell boundary, in-radius, and a tetrahedral tessellation of the cell.
//!
//! Points handed to `restrict` and `boundary_distance` are in lattice
//! (fractional) coordinates; vertices and simplices are cartesian.

mod simplex;
pub use simplex::Simplex;

use dwconsts::*;
use lattice::Lattice;
use log::debug;
use matrix::Matrix;
use std::fmt;
use vector3::*;

// relative tolerance for plane membership and vertex de-duplication

const GEOM_TOL: f64 = EPS8;

// restriction tolerance in units of the plane coordinate x . eqn

const RESTRICT_TOL: f64 = EPS10;

const MAX_REDUCE_ITER: usize = 1000;

/// One facet: the perpendicular bisector plane between the origin and the
/// lattice point `img`.
#[derive(Debug, Clone)]
pub struct Face {
    img: Vector3i32,
    eqn: Vector3f64,
    length: f64,
    vertices: Vec<Vector3f64>,
}

impl Face {
    /// Cartesian length of `img`.
    pub fn get_length(&self) -> f64 {
        self.length
    }

    /// Cartesian vertices in cyclic order.
    pub fn get_vertices(&self) -> &[Vector3f64] {
        &self.vertices
    }

    pub fn get_center(&self) -> Vector3f64 {
        let n = self.vertices.len() as f64;

        self.vertices
            .iter()
            .fold(Vector3f64::zeros(), |acc, v| acc + *v)
            / n
    }
}

#[derive(Debug, Clone)]
pub struct WignerSeitz {
    latt: Lattice,
    rtr: Matrix<f64>,
    faces: Vec<Face>,
    face_half: Vec<usize>,
    vertices: Vec<Vector3f64>,
}

impl WignerSeitz {
    pub fn new(latt: &Lattice) -> WignerSeitz {
        assert!(
            latt.volume().abs() > EPS12,
            "Wigner-Seitz cell of a singular lattice"
        );

        let rtr = latt.get_metric_tensor();

        let neighbors = find_voronoi_relevant(latt);

        let scale = neighbors
            .iter()
            .map(|img| latt.frac_to_cart(&img.to_f64()).norm2())
            .fold(0.0, f64::max);

        let normals: Vec<Vector3f64> = neighbors
            .iter()
            .map(|img| latt.frac_to_cart(&img.to_f64()))
            .collect();

        let vertices = find_vertices(&normals, scale);

        let mut faces = Vec::with_capacity(neighbors.len());

        for (img, a) in neighbors.iter().zip(normals.iter()) {
            let a2 = a.norm_squared();

            let on_plane: Vec<Vector3f64> = vertices
                .iter()
                .filter(|v| (v.dot_product(a) - 0.5 * a2).abs() <= GEOM_TOL * scale * scale)
                .cloned()
                .collect();

            if on_plane.len() < 3 {
                continue;
            }

            let mut eqn = [0.0; 3];
            rtr.action(&img.to_f64().to_array(), &mut eqn);

            faces.push(Face {
                img: *img,
                eqn: Vector3f64::from_array(eqn) / a2,
                length: a2.sqrt(),
                vertices: order_around_normal(on_plane, a),
            });
        }

        let face_half = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| is_positive(&f.img))
            .map(|(i, _)| i)
            .collect();

        let ws = WignerSeitz {
            latt: latt.clone(),
            rtr,
            faces,
            face_half,
            vertices,
        };

        debug!("{}", ws);

        ws
    }

    pub fn get_lattice(&self) -> &Lattice {
        &self.latt
    }

    /// R^T R
    pub fn get_metric_tensor(&self) -> &Matrix<f64> {
        &self.rtr
    }

    pub fn get_faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn get_vertices(&self) -> &[Vector3f64] {
        &self.vertices
    }

    /// Whether `x` (lattice coordinates) lies inside the cell or on its boundary.
    pub fn contains(&self, x: &Vector3f64) -> bool {
        self.face_half
            .iter()
            .all(|&iface| x.dot_product(&self.faces[iface].eqn).abs() <= 0.5 + RESTRICT_TOL)
    }

    /// Image of `x` (lattice coordinates) inside the Wigner-Seitz cell.
    /// Points already in the cell are returned unchanged.
    pub fn restrict(&self, x: &Vector3f64) -> Vector3f64 {
        if self.contains(x) {
            return *x;
        }

        let mut xws = *x - x.round();

        loop {
            let mut changed = false;

            for &iface in self.face_half.iter() {
                let f = &self.faces[iface];

                let d = xws.dot_product(&f.eqn);

                if d > 0.5 + RESTRICT_TOL {
                    xws -= f.img.to_f64() * (d - 0.5).ceil();
                    changed = true;
                } else if d < -0.5 - RESTRICT_TOL {
                    xws += f.img.to_f64() * (-0.5 - d).ceil();
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        xws
    }

    /// Cartesian distance from `x` (lattice coordinates) to the nearest facet plane;
    /// negative when `x` lies outside the cell.
    pub fn boundary_distance(&self, x: &Vector3f64) -> f64 {
        self.face_half
            .iter()
            .map(|&iface| {
                let f = &self.faces[iface];

                f.length * (0.5 - x.dot_product(&f.eqn).abs())
            })
            .fold(f64::MAX, f64::min)
    }

    /// Radius of the largest sphere about the origin inside the cell.
    pub fn in_radius(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| 0.5 * f.length)
            .fold(f64::MAX, f64::min)
    }

    /// Radius of the smallest sphere about the origin containing the cell.
    pub fn circumradius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.norm2())
            .fold(0.0, f64::max)
    }

    /// Tetrahedra (origin, face center, consecutive face vertices) filling the cell.
    pub fn get_simplices_3d(&self) -> Vec<Simplex> {
        let mut simplices = Vec::new();

        for f in self.faces.iter() {
            let center = f.get_center();

            let nv = f.vertices.len();

            for k in 0..nv {
                simplices.push(Simplex::new([
                    Vector3f64::zeros(),
                    center,
                    f.vertices[k],
                    f.vertices[(k + 1) % nv],
                ]));
            }
        }

        simplices
    }

    pub fn volume(&self) -> f64 {
        self.get_simplices_3d().iter().map(|s| s.get_volume()).sum()
    }
}

impl fmt::Display for WignerSeitz {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Wigner-Seitz cell: {} faces, {} vertices, in-radius = {:.6}, circumradius = {:.6}",
            self.faces.len(),
            self.vertices.len(),
            self.in_radius(),
            self.circumradius()
        )?;

        for face in self.faces.iter() {
            writeln!(
                f,
                "   face {:>4} {:>4} {:>4} : {} vertices",
                face.img.x,
                face.img.y,
                face.img.z,
                face.vertices.len()
            )?;
        }

        Ok(())
    }
}

fn is_positive(v: &Vector3i32) -> bool {
    if v.x != 0 {
        v.x > 0
    } else if v.y != 0 {
        v.y > 0
    } else {
        v.z > 0
    }
}

// Pairwise size reduction of the basis; returns the columns of T (lattice
// coordinates of the reduced vectors).

fn reduce_basis(latt: &Lattice) -> [Vector3i32; 3] {
    let mut basis = [latt.get_vector_a(), latt.get_vector_b(), latt.get_vector_c()];

    let mut t = [
        Vector3i32::new(1, 0, 0),
        Vector3i32::new(0, 1, 0),
        Vector3i32::new(0, 0, 1),
    ];

    for _ in 0..MAX_REDUCE_ITER {
        let mut changed = false;

        for i in 0..3 {
            for j in 0..3 {
                if i == j {
                    continue;
                }

                let mu = basis[i].dot_product(&basis[j]) / basis[j].norm_squared();

                if mu.abs() > 0.5 + GEOM_TOL {
                    let m = mu.round();
                    let mi = m as i32;

                    basis[i] = basis[i] - basis[j] * m;
                    t[i] = t[i] - Vector3i32::new(mi * t[j].x, mi * t[j].y, mi * t[j].z);

                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    t
}

fn combine(t: &[Vector3i32; 3], n: [i32; 3]) -> Vector3i32 {
    let mut v = Vector3i32::zeros();

    for k in 0..3 {
        v.x += n[k] * t[k].x;
        v.y += n[k] * t[k].y;
        v.z += n[k] * t[k].z;
    }

    v
}

// A lattice vector a bounds the cell with a facet iff +a and -a are the only
// shortest vectors of the coset a + 2L.

fn find_voronoi_relevant(latt: &Lattice) -> Vec<Vector3i32> {
    const NCAND: i32 = 2;
    const NCOSET: i32 = 3;

    let t = reduce_basis(latt);

    let len2 = |n: [i32; 3]| latt.frac_length_squared(&combine(&t, n).to_f64());

    let mut relevant = Vec::new();
    let mut relevant_len2 = Vec::new();

    for i in -NCAND..=NCAND {
        for j in -NCAND..=NCAND {
            for k in -NCAND..=NCAND {
                if i == 0 && j == 0 && k == 0 {
                    continue;
                }

                let a2 = len2([i, j, k]);

                let mut shortest = true;

                'coset: for p in -NCOSET..=NCOSET {
                    for q in -NCOSET..=NCOSET {
                        for r in -NCOSET..=NCOSET {
                            if (p - i) % 2 != 0 || (q - j) % 2 != 0 || (r - k) % 2 != 0 {
                                continue;
                            }

                            if (p == i && q == j && r == k) || (p == -i && q == -j && r == -k) {
                                continue;
                            }

                            if len2([p, q, r]) <= a2 * (1.0 + GEOM_TOL) {
                                shortest = false;
                                break 'coset;
                            }
                        }
                    }
                }

                if shortest {
                    relevant.push(combine(&t, [i, j, k]));
                    relevant_len2.push(a2);
                }
            }
        }
    }

    // nearest neighbors first

    utility::argsort(&relevant_len2)
        .into_iter()
        .map(|i| relevant[i])
        .collect()
}

// Vertices are the intersections of three bisector planes a.x = |a|^2/2 that
// violate none of the others.

fn find_vertices(normals: &[Vector3f64], scale: f64) -> Vec<Vector3f64> {
    let n = normals.len();

    let mut vertices: Vec<Vector3f64> = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (ai, aj, ak) = (normals[i], normals[j], normals[k]);

                let det = ai.dot_product(&aj.cross_product(&ak));

                if det.abs() <= GEOM_TOL * ai.norm2() * aj.norm2() * ak.norm2() {
                    continue;
                }

                let x = (aj.cross_product(&ak) * (0.5 * ai.norm_squared())
                    + ak.cross_product(&ai) * (0.5 * aj.norm_squared())
                    + ai.cross_product(&aj) * (0.5 * ak.norm_squared()))
                    / det;

                let inside = normals
                    .iter()
                    .all(|b| x.dot_product(b) <= 0.5 * b.norm_squared() + GEOM_TOL * scale * scale);

                if !inside {
                    continue;
                }

                let duplicate = vertices
                    .iter()
                    .any(|v| (*v - x).norm2() <= GEOM_TOL * scale);

                if !duplicate {
                    vertices.push(x);
                }
            }
        }
    }

    vertices
}

fn order_around_normal(vertices: Vec<Vector3f64>, normal: &Vector3f64) -> Vec<Vector3f64> {
    let n = vertices.len() as f64;

    let center = vertices
        .iter()
        .fold(Vector3f64::zeros(), |acc, v| acc + *v)
        / n;

    let u = vertices[0] - center;
    let u = u / u.norm2();

    let w = normal.cross_product(&u);
    let w = w / w.norm2();

    let angles: Vec<f64> = vertices
        .iter()
        .map(|v| {
            let d = *v - center;
            d.dot_product(&w).atan2(d.dot_product(&u))
        })
        .collect();

    utility::argsort(&angles)
        .into_iter()
        .map(|i| vertices[i])
        .collect()
}
