use crate::{read_file_data_to_vec, ControlError};

use coulomb::PointCharge;
use vector3::*;

/// Point charges, one per line as `x y z Z` with x, y, z in lattice coordinates.
pub fn read_charges(inpfile: &str) -> Result<Vec<PointCharge>, ControlError> {
    let lines = read_file_data_to_vec(inpfile)?;

    parse_charges(&lines)
}

pub fn parse_charges<S: AsRef<str>>(lines: &[S]) -> Result<Vec<PointCharge>, ControlError> {
    let mut charges = Vec::new();

    for line in lines.iter() {
        let line = line.as_ref().split('#').next().unwrap_or("").trim();

        if line.is_empty() {
            continue;
        }

        let s: Vec<&str> = line.split_whitespace().collect();

        let invalid = || ControlError::InvalidValue {
            key: "point charge".to_string(),
            value: line.to_string(),
        };

        if s.len() != 4 {
            return Err(invalid());
        }

        let mut v = [0.0; 4];

        for (vi, si) in v.iter_mut().zip(s.iter()) {
            *vi = si.parse().map_err(|_| invalid())?;
        }

        charges.push(PointCharge::new(Vector3f64::new(v[0], v[1], v[2]), v[3]));
    }

    Ok(charges)
}
