//! Physical constants used throughout, in SI units (CODATA 2018).

/// Planck constant [J s]
pub const H: f64 = 6.62607015e-34;

/// Bohr magneton [J / T]
pub const MU_B: f64 = 9.2740100783e-24;

/// Speed of light in vacuum [m / s]
pub const C: f64 = 299792458.0;
