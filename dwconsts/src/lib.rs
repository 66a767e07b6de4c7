use std::f64;

// units : energy

pub const RY_TO_EV: f64 = 13.605698066;
pub const HA_TO_EV: f64 = 2.0 * RY_TO_EV;

// units : force

pub const FORCE_HA_TO_EV: f64 = 51.42208619083232;

// pi

pub const PI: f64 = f64::consts::PI;
pub const TWOPI: f64 = 2.0 * f64::consts::PI;
pub const FOURPI: f64 = 4.0 * f64::consts::PI;

// 2/sqrt(pi), the x -> 0 limit of erf(x)/x

pub const TWO_OVER_SQRTPI: f64 = f64::consts::FRAC_2_SQRT_PI;

// numerical convergence

pub const EPS1: f64 = 1E-1;
pub const EPS8: f64 = 1E-8;
pub const EPS10: f64 = 1E-10;
pub const EPS12: f64 = 1E-12;
pub const EPS14: f64 = 1E-14;
