//! Pluggable sources of frequency shift between a driving field and a
//! transition.
//!
//! Zeeman splitting and Doppler shift are independent and additive to first
//! order, so any number of providers can be attached to a
//! [`RateEquation`][crate::rate::RateEquation]; their values are summed into
//! the field-vs-transition frequency mismatch.

use rustc_hash::FxHashMap as HashMap;
use crate::constants::{ H, MU_B };
use crate::error::{ Error, Result };
use crate::transition::State;

/// A stateless source of frequency shift for a particular transition.
///
/// Implementations must be pure functions of `(ground, excited)` beyond
/// their constructor parameters.
pub trait Detuning {
    /// Get the frequency shift in Hz (no 2π) to add to the detuning of a
    /// field driving the `ground` → `excited` transition.
    fn detuning(&self, ground: &State, excited: &State) -> Result<f64>;
}

/// Differential Zeeman shift between the two sublevels of a transition in a
/// uniform magnetic field.
#[derive(Clone, Debug)]
pub struct ZeemanDetuning {
    /// Landé g-factor per hyperfine label.
    pub g_factors: HashMap<String, f64>,
    /// Magnetic field magnitude in Tesla.
    pub b_field: f64,
}

impl ZeemanDetuning {
    /// Create a new provider from a g-factor table and field magnitude.
    pub fn new(g_factors: HashMap<String, f64>, b_field: f64) -> Self {
        Self { g_factors, b_field }
    }

    fn g_factor(&self, state: &State) -> Result<f64> {
        self.g_factors.get(&state.hyperfine).copied()
            .ok_or_else(|| Error::MissingGFactor(state.hyperfine.clone()))
    }
}

impl Detuning for ZeemanDetuning {
    /// Returns `μ_B (g_e m_e - g_g m_g) B / h` in Hz.
    fn detuning(&self, ground: &State, excited: &State) -> Result<f64> {
        let gs_det: f64
            = MU_B * self.g_factor(ground)? * f64::from(ground.m)
            * self.b_field / H;
        let es_det: f64
            = MU_B * self.g_factor(excited)? * f64::from(excited.m)
            * self.b_field / H;
        Ok(es_det - gs_det)
    }
}

/// First-order Doppler shift of a field as seen by a moving atom.
///
/// Sign convention: the shift is `-velocity / wavelength`, for a field
/// propagating *against* the velocity axis. An atom moving toward the source
/// (negative velocity) therefore sees a positive detuning. Callers must keep
/// their velocity sign consistent with the field propagation direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DopplerDetuning {
    /// Field vacuum wavelength in meters.
    pub wavelength: f64,
    /// Atom velocity along the propagation axis in m/s.
    pub velocity: f64,
}

impl DopplerDetuning {
    /// Create a new provider from a wavelength and a velocity.
    pub fn new(wavelength: f64, velocity: f64) -> Self {
        Self { wavelength, velocity }
    }
}

impl Detuning for DopplerDetuning {
    fn detuning(&self, _ground: &State, _excited: &State) -> Result<f64> {
        Ok(-self.velocity / self.wavelength)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use super::*;

    fn state(label: &str) -> State { State::parse(label).unwrap() }

    #[test]
    fn zeeman_sodium_d2() {
        // Sodium D2 line; reference value from PhysRevLett.48.596 p.598
        let det = ZeemanDetuning::new(
            [("G".to_string(), 0.5), ("E".to_string(), 2.0 / 3.0)]
                .into_iter().collect(),
            0.06,
        );
        let shift = det.detuning(&state("G2"), &state("E3")).unwrap();
        assert_eq!((shift / 1e6).round(), 840.0);
    }

    #[test]
    fn zeeman_missing_g_factor() {
        let det = ZeemanDetuning::new(
            [("G".to_string(), 0.5)].into_iter().collect(),
            0.06,
        );
        assert_eq!(
            det.detuning(&state("G2"), &state("E3")),
            Err(Error::MissingGFactor("E".to_string())),
        );
    }

    #[test]
    fn doppler_sodium_d2() {
        // Sodium D2 line; reference value from PhysRevLett.48.596 p.597
        let det = DopplerDetuning::new(589.158e-9, -1000.0);
        let shift = det.detuning(&state("G2"), &state("E3")).unwrap();
        assert_eq!((shift / 1e6).round(), 1697.0);
    }

    #[test]
    fn detunings_are_additive() {
        let zeeman = ZeemanDetuning::new(
            [("G".to_string(), 0.5), ("E".to_string(), 2.0 / 3.0)]
                .into_iter().collect(),
            0.06,
        );
        let doppler = DopplerDetuning::new(589.158e-9, -1000.0);
        let providers: Vec<Box<dyn Detuning>>
            = vec![Box::new(zeeman.clone()), Box::new(doppler)];
        let total: f64
            = providers.iter()
            .map(|d| d.detuning(&state("G2"), &state("E3")).unwrap())
            .sum();
        let expected
            = zeeman.detuning(&state("G2"), &state("E3")).unwrap()
            + doppler.detuning(&state("G2"), &state("E3")).unwrap();
        assert_approx_eq!(total, expected, 1e-9);
    }
}
