//! Rate-equation modeling of optical pumping in multilevel atoms.
//!
//! Builds the generator matrix for the ground-state population dynamics of a
//! multilevel atom driven by one or more (quasi-)monochromatic laser fields:
//! ```text
//! d/dt G = M G
//! ```
//! where `G` is the vector of ground-sublevel populations. A
//! [`TransitionProfile`][transition::TransitionProfile] describes the
//! hyperfine sublevels and allowed dipole transitions, a
//! [`RadiationFieldProfile`][field::RadiationFieldProfile] describes the
//! applied fields, and [`Detuning`][detuning::Detuning] providers contribute
//! frequency shifts (Zeeman, Doppler). A [`RateEquation`][rate::RateEquation]
//! combines the three into `M`.
//!
//! Time integration of the populations is left to the caller.

pub mod constants;
pub mod error;
pub mod transition;
pub mod detuning;
pub mod field;
pub mod rate;

pub use error::{ Error, Result };
pub use transition::{ State, Transition, TransitionGroupLabel, TransitionProfile };
pub use detuning::{ Detuning, ZeemanDetuning, DopplerDetuning };
pub use field::{ FieldFrequency, RadiationField, RadiationFieldProfile };
pub use rate::RateEquation;
