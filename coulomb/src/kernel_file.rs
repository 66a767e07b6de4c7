// Binary kernel file, native endian, no version tag:
//
//   9 x f64   lattice matrix, column major
//   3 x i32   sample counts
//   1 x f64   border width
//   n x f64   kernel at the half-space reciprocal-space points

use fftgrid::FFTGrid;
use lattice::Lattice;
use log::info;
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

struct Header {
    latt: [f64; 9],
    size: [i32; 3],
    border_width: f64,
}

fn read_f64<R: Read>(reader: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];

    reader.read_exact(&mut buf)?;

    Ok(f64::from_ne_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];

    reader.read_exact(&mut buf)?;

    Ok(i32::from_ne_bytes(buf))
}

fn read_header<R: Read>(reader: &mut R) -> io::Result<Header> {
    let mut latt = [0.0; 9];

    for v in latt.iter_mut() {
        *v = read_f64(reader)?;
    }

    let mut size = [0; 3];

    for n in size.iter_mut() {
        *n = read_i32(reader)?;
    }

    let border_width = read_f64(reader)?;

    Ok(Header {
        latt,
        size,
        border_width,
    })
}

fn read_payload<R: Read>(reader: &mut R, n: usize) -> io::Result<Vec<f64>> {
    let mut bytes = vec![0u8; n * 8];

    reader.read_exact(&mut bytes)?;

    let kernel = bytes
        .chunks_exact(8)
        .map(|b| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(b);
            f64::from_ne_bytes(buf)
        })
        .collect();

    Ok(kernel)
}

fn sample_counts(grid: &FFTGrid) -> [i32; 3] {
    let [n1, n2, n3] = grid.get_size();

    [n1 as i32, n2 as i32, n3 as i32]
}

/// Kernel stored in `path` if its header matches exactly; None otherwise.
pub(crate) fn load(
    path: &Path,
    latt: &Lattice,
    grid: &FFTGrid,
    border_width: f64,
) -> Option<Vec<f64>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => {
            info!(
                "could not open precomputed coulomb kernel file '{}' (computing it now)",
                path.display()
            );
            return None;
        }
    };

    let mut reader = BufReader::new(file);

    let header = match read_header(&mut reader) {
        Ok(h) => h,
        Err(_) => {
            info!(
                "error reading precomputed coulomb kernel from '{}' (computing it now)",
                path.display()
            );
            return None;
        }
    };

    if header.latt[..] != *latt.as_matrix().as_slice() {
        info!(
            "precomputed coulomb kernel file '{}' has different lattice vectors (recomputing it now)",
            path.display()
        );
        return None;
    }

    if header.size != sample_counts(grid) {
        info!(
            "precomputed coulomb kernel file '{}' has different sample count (recomputing it now)",
            path.display()
        );
        return None;
    }

    if header.border_width != border_width {
        info!(
            "precomputed coulomb kernel file '{}' has different border width (recomputing it now)",
            path.display()
        );
        return None;
    }

    match read_payload(&mut reader, grid.get_n_half()) {
        Ok(kernel) => {
            info!(
                "successfully read precomputed coulomb kernel from '{}'",
                path.display()
            );
            Some(kernel)
        }
        Err(_) => {
            info!(
                "error reading precomputed coulomb kernel from '{}' (computing it now)",
                path.display()
            );
            None
        }
    }
}

pub(crate) fn save(
    path: &Path,
    latt: &Lattice,
    grid: &FFTGrid,
    border_width: f64,
    kernel: &[f64],
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    for v in latt.as_matrix().as_slice() {
        writer.write_all(&v.to_ne_bytes())?;
    }

    for n in sample_counts(grid).iter() {
        writer.write_all(&n.to_ne_bytes())?;
    }

    writer.write_all(&border_width.to_ne_bytes())?;

    for v in kernel {
        writer.write_all(&v.to_ne_bytes())?;
    }

    writer.flush()
}
