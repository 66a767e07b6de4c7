mod charges;
pub use charges::*;

use coulomb::{CoulombTruncationParams, TruncationGeometry};
use dwconsts::*;
use fftgrid::FFTGrid;
use lattice::Lattice;
use log::warn;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
    str::FromStr,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("unknown parameter : {0}")]
    UnknownKey(String),

    #[error("invalid value for '{key}' : {value}")]
    InvalidValue { key: String, value: String },

    #[error("missing required parameter '{0}'")]
    MissingKey(&'static str),
}

#[derive(Debug)]
pub struct Control {
    lattice_a: Option<[f64; 3]>,
    lattice_b: Option<[f64; 3]>,
    lattice_c: Option<[f64; 3]>,

    fft_size: Option<[usize; 3]>,
    ecut_rho: f64, // hartree

    truncation: TruncationGeometry,
    border_width: f64, // bohr
    rc: f64,           // bohr, 0 => Wigner-Seitz in-radius

    kernel_file: Option<String>,
    charges_file: Option<String>,
}

impl Default for Control {
    fn default() -> Self {
        let params = CoulombTruncationParams::default();

        Control {
            lattice_a: None,
            lattice_b: None,
            lattice_c: None,
            fft_size: None,
            ecut_rho: 0.0,
            truncation: params.geometry,
            border_width: params.border_width,
            rc: params.rc,
            kernel_file: None,
            charges_file: None,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ControlError> {
    value.parse().map_err(|_| ControlError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_triple<T: FromStr + Copy + Default>(
    key: &str,
    value: &str,
) -> Result<[T; 3], ControlError> {
    let s: Vec<&str> = value.split_whitespace().collect();

    if s.len() != 3 {
        return Err(ControlError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    let mut v = [T::default(); 3];

    for (vi, si) in v.iter_mut().zip(s.iter()) {
        *vi = parse_value(key, si)?;
    }

    Ok(v)
}

impl Control {
    pub fn new() -> Control {
        Control::default()
    }

    pub fn get_lattice(&self) -> Lattice {
        let a = self.lattice_a.unwrap_or_default();
        let b = self.lattice_b.unwrap_or_default();
        let c = self.lattice_c.unwrap_or_default();

        Lattice::new(&a, &b, &c)
    }

    pub fn get_fft_size(&self) -> Option<[usize; 3]> {
        self.fft_size
    }

    pub fn get_ecutrho(&self) -> f64 {
        self.ecut_rho
    }

    pub fn get_truncation(&self) -> TruncationGeometry {
        self.truncation
    }

    pub fn get_border_width(&self) -> f64 {
        self.border_width
    }

    pub fn get_rc(&self) -> f64 {
        self.rc
    }

    pub fn get_kernel_file(&self) -> Option<&str> {
        self.kernel_file.as_deref()
    }

    pub fn get_charges_file(&self) -> Option<&str> {
        self.charges_file.as_deref()
    }

    /// Sample counts from `fft_size`, or from `ecut_rho` and the lattice.
    pub fn get_grid(&self) -> FFTGrid {
        match self.fft_size {
            Some([n1, n2, n3]) => FFTGrid::from_size(n1, n2, n3),
            None => FFTGrid::new(&self.get_lattice(), self.ecut_rho),
        }
    }

    pub fn truncation_params(&self) -> CoulombTruncationParams {
        CoulombTruncationParams {
            geometry: self.truncation,
            border_width: self.border_width,
            rc: self.rc,
            filename: self.kernel_file.as_ref().map(PathBuf::from),
        }
    }

    pub fn read_file(&mut self, inpfile: &str) -> Result<(), ControlError> {
        let lines = read_file_data_to_vec(inpfile)?;

        self.parse_lines(&lines)
    }

    pub fn parse_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), ControlError> {
        for line in lines.iter() {
            let line = line.as_ref();

            // '#' starts a comment

            let line = line.split('#').next().unwrap_or("").trim();

            if line.is_empty() {
                continue;
            }

            let s: Vec<&str> = line.splitn(2, '=').map(|x| x.trim()).collect();

            if s.len() != 2 {
                return Err(ControlError::UnknownKey(line.to_string()));
            }

            let (key, value) = (s[0], s[1]);

            match key {
                "lattice_a" => {
                    self.lattice_a = Some(parse_triple(key, value)?);
                }

                "lattice_b" => {
                    self.lattice_b = Some(parse_triple(key, value)?);
                }

                "lattice_c" => {
                    self.lattice_c = Some(parse_triple(key, value)?);
                }

                "fft_size" => {
                    let n: [usize; 3] = parse_triple(key, value)?;

                    if n.iter().any(|&ni| ni == 0) {
                        return Err(ControlError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        });
                    }

                    self.fft_size = Some(n);
                }

                "ecut_rho" => {
                    self.ecut_rho = parse_value(key, value)?;
                }

                "truncation" => {
                    self.truncation = value.to_lowercase().parse().map_err(|_| {
                        ControlError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        }
                    })?;
                }

                "border_width" => {
                    self.border_width = parse_value(key, value)?;
                }

                "rc" => {
                    self.rc = parse_value(key, value)?;
                }

                "kernel_file" => {
                    self.kernel_file = Some(value.to_string());
                }

                "charges_file" => {
                    self.charges_file = Some(value.to_string());
                }

                _ => {
                    return Err(ControlError::UnknownKey(line.to_string()));
                }
            }
        }

        if self.lattice_a.is_none() {
            return Err(ControlError::MissingKey("lattice_a"));
        }

        if self.lattice_b.is_none() {
            return Err(ControlError::MissingKey("lattice_b"));
        }

        if self.lattice_c.is_none() {
            return Err(ControlError::MissingKey("lattice_c"));
        }

        let latt = self.get_lattice();

        let volume = latt.volume().abs();
        let scale = (0..3).map(|k| latt.get_vector(k).norm2()).product::<f64>();

        if volume <= EPS12.max(EPS8 * scale) {
            return Err(ControlError::InvalidValue {
                key: "lattice".to_string(),
                value: format!("singular cell (volume = {:e})", volume),
            });
        }

        if self.fft_size.is_none() && self.ecut_rho <= 0.0 {
            return Err(ControlError::MissingKey("fft_size or ecut_rho"));
        }

        if self.fft_size.is_some() && self.ecut_rho > 0.0 {
            warn!("both fft_size and ecut_rho are given; ecut_rho is ignored");
        }

        Ok(())
    }

    pub fn display(&self) {
        const OUT_WIDTH1: usize = 28;
        const OUT_WIDTH2: usize = 18;

        println!("   {:-^80}", " control parameters ");
        println!();

        println!(
            "   {:<width1$} = {:>width2$}",
            "fft_size",
            self.get_grid().to_string(),
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        if self.fft_size.is_none() {
            println!(
                "   {:<width1$} = {:>width2$.3} Ha",
                "ecut_rho",
                self.get_ecutrho(),
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }

        println!(
            "   {:<width1$} = {:>width2$}",
            "truncation",
            self.get_truncation().to_string(),
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        match self.truncation {
            TruncationGeometry::Isolated => {
                println!(
                    "   {:<width1$} = {:>width2$.3} bohr",
                    "border_width",
                    self.get_border_width(),
                    width1 = OUT_WIDTH1,
                    width2 = OUT_WIDTH2
                );
            }

            TruncationGeometry::Spherical => {
                println!(
                    "   {:<width1$} = {:>width2$.3} bohr",
                    "rc",
                    self.get_rc(),
                    width1 = OUT_WIDTH1,
                    width2 = OUT_WIDTH2
                );
            }
        }

        println!(
            "   {:<width1$} = {:>width2$}",
            "kernel_file",
            self.get_kernel_file().unwrap_or("none"),
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        println!(
            "   {:<width1$} = {:>width2$}",
            "charges_file",
            self.get_charges_file().unwrap_or("none"),
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        println!();
    }
}

pub(crate) fn read_file_data_to_vec(inpfile: &str) -> Result<Vec<String>, ControlError> {
    let file = File::open(inpfile).map_err(|source| ControlError::Io {
        path: inpfile.to_string(),
        source,
    })?;

    BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<String>>>()
        .map_err(|source| ControlError::Io {
            path: inpfile.to_string(),
            source,
        })
}
