//! Radiation fields driving the atom, and the effective scattering rate they
//! produce on a given transition.

use crate::constants::C;
use crate::detuning::Detuning;
use crate::error::Result;
use crate::transition::Transition;

/// How a field's absolute optical frequency is specified.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldFrequency {
    /// Absolute frequency in Hz.
    Frequency(f64),
    /// Vacuum wavelength in meters, converted via c/λ.
    Wavelength(f64),
    /// Offset in Hz from a reference frequency in Hz.
    Detuned {
        /// Reference frequency in Hz.
        reference: f64,
        /// Offset from the reference in Hz; positive is blue.
        offset: f64,
    },
}

impl FieldFrequency {
    /// Resolve to an absolute frequency in Hz.
    pub fn frequency(self) -> f64 {
        match self {
            Self::Frequency(f) => f,
            Self::Wavelength(wl) => C / wl,
            Self::Detuned { reference, offset } => reference + offset,
        }
    }
}

/// One monochromatic or quasi-monochromatic beam component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RadiationField {
    /// Optical frequency of the field.
    pub frequency: FieldFrequency,
    /// Polarization selection rule: the field drives only transitions whose
    /// `delta_m` equals this value (σ+/σ−/π ↔ +1/−1/0).
    pub delta_m: i32,
    /// Field intensity normalized to the saturation intensity, I/I_sat.
    pub normalized_intensity: f64,
}

impl RadiationField {
    /// Create a new field component.
    pub fn new(frequency: FieldFrequency, delta_m: i32, normalized_intensity: f64)
        -> Self
    {
        Self { frequency, delta_m, normalized_intensity }
    }
}

/// A collection of [`RadiationField`]s making up the aggregate radiation
/// environment of the atom.
///
/// Collection order is irrelevant; per-transition contributions are summed
/// over all components.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RadiationFieldProfile {
    /// Field components.
    pub fields: Vec<RadiationField>,
}

impl RadiationFieldProfile {
    /// Create a new profile from a list of field components.
    pub fn new(fields: Vec<RadiationField>) -> Self { Self { fields } }

    /// Compute the total effective scattering rate driven on one transition,
    /// in Hz.
    ///
    /// Only fields whose `delta_m` matches the transition's contribute; all
    /// others contribute exactly zero regardless of intensity or detuning.
    /// Each matching field with saturation ratio `s` and total detuning `δ`
    /// (field-vs-transition mismatch plus the sum of all `detunings`
    /// evaluated on the transition's states) adds the saturated-Lorentzian
    /// ```text
    /// π γ s / (1 + s + (2 δ / γ)²)
    /// ```
    /// where the `1 + s` term encodes saturation broadening. An undriven
    /// transition yields 0.0, not an error.
    pub fn effective_rate(
        &self,
        transition: &Transition,
        base_frequency: f64,
        detunings: &[Box<dyn Detuning>],
        gamma: f64,
    ) -> Result<f64>
    {
        let mut provider_shift: f64 = 0.0;
        for det in detunings.iter() {
            provider_shift
                += det.detuning(&transition.ground, &transition.excited)?;
        }
        let mut total: f64 = 0.0;
        for field in self.fields.iter() {
            if field.delta_m != transition.delta_m { continue; }
            let det = base_frequency - field.frequency.frequency()
                + provider_shift;
            let s = field.normalized_intensity;
            total += std::f64::consts::PI * gamma * s
                / (1.0 + s + (2.0 * det / gamma).powi(2));
        }
        Ok(total)
    }
}

impl FromIterator<RadiationField> for RadiationFieldProfile {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = RadiationField>
    {
        Self { fields: iter.into_iter().collect() }
    }
}
