//! Assembly of the optical-pumping generator matrix over ground-state
//! populations.

use itertools::Itertools;
use ndarray as nd;
use rustc_hash::FxHashMap as HashMap;
use crate::detuning::Detuning;
use crate::error::Result;
use crate::field::RadiationFieldProfile;
use crate::transition::{ State, TransitionProfile };

/// Builder for the generator matrix of the ground-state population rate
/// equations.
///
/// The populations evolve as
/// ```text
/// d/dt G_n = In_n - Out_n
/// In_n  = Σ_{j≠n} G_j Σ_k R_jk β_jk β_nk
/// Out_n = G_n Σ_k R_nk β_nk (1 - β_nk)
/// ```
/// with `j` running over ground states, `k` over excited states, `R_jk` the
/// effective scattering rate of the `j → k` transition under the full field
/// and detuning environment, and `β_jk` its branching ratio.
///
/// The per-channel pump terms `R_jk β_jk` are precomputed once at
/// construction; the cache is never invalidated short of reconstruction, so
/// shared read access from multiple threads is safe.
pub struct RateEquation<'a> {
    profile: &'a TransitionProfile,
    fields: &'a RadiationFieldProfile,
    detunings: Vec<Box<dyn Detuning>>,
    pump_terms: HashMap<State, HashMap<State, f64>>,
}

impl<'a> RateEquation<'a> {
    /// Create a new builder, eagerly computing the pump-term table.
    ///
    /// Fails if the profile's frequency table lacks an entry for some
    /// transition group, or if a detuning provider fails on some transition
    /// (e.g. a missing g-factor).
    pub fn new(
        profile: &'a TransitionProfile,
        fields: &'a RadiationFieldProfile,
        detunings: Vec<Box<dyn Detuning>>,
    ) -> Result<Self>
    {
        let mut pump_terms: HashMap<State, HashMap<State, f64>>
            = HashMap::default();
        for es in profile.excited_states() {
            let mut terms: HashMap<State, f64> = HashMap::default();
            for trans in profile.excited_to_ground(es)? {
                let base_freq = profile.frequency(&trans.group)?;
                let rate = fields.effective_rate(
                    trans, base_freq, &detunings, profile.gamma())?;
                terms.insert(trans.ground.clone(), rate * trans.strength);
            }
            pump_terms.insert(es.clone(), terms);
        }
        Ok(Self { profile, fields, detunings, pump_terms })
    }

    /// Get a reference to the transition profile.
    pub fn profile(&self) -> &TransitionProfile { self.profile }

    /// Get a reference to the radiation-field profile.
    pub fn fields(&self) -> &RadiationFieldProfile { self.fields }

    /// Get the attached detuning providers.
    pub fn detunings(&self) -> &[Box<dyn Detuning>] { &self.detunings }

    fn pump_term(&self, es: &State, gs: &State) -> f64 {
        self.pump_terms.get(es)
            .and_then(|terms| terms.get(gs))
            .copied()
            .unwrap_or(0.0)
    }

    /// Compute one element of the generator matrix, in Hz.
    ///
    /// For `gs1 ≠ gs2` this is the "in"-flux rate from `gs2` into `gs1`
    /// through every excited state reachable from `gs1`; for `gs1 == gs2` it
    /// is the negated "out"-flux rate of population excited from `gs1` and
    /// lost to other ground states. A `gs2` unreachable from any such
    /// excited state contributes zero.
    ///
    /// Fails if `gs1` is not a declared ground state of the profile.
    pub fn matrix_element(&self, gs1: &State, gs2: &State) -> Result<f64> {
        let gs1_to_es = self.profile.ground_to_excited(gs1)?;
        let elem: f64
            = if gs1 != gs2 {
                gs1_to_es.iter()
                    .map(|t| self.pump_term(&t.excited, gs2) * t.strength)
                    .sum()
            } else {
                -gs1_to_es.iter()
                    .map(|t| self.pump_term(&t.excited, gs1) * (1.0 - t.strength))
                    .sum::<f64>()
            };
        Ok(elem)
    }

    /// Compute the full generator matrix `M` of `d/dt G = M G`, with rows
    /// and columns following the profile's declared ground-state order.
    pub fn build_matrix(&self) -> nd::Array2<f64> {
        let ground_states = self.profile.ground_states();
        let n = ground_states.len();
        let mut mat: nd::Array2<f64> = nd::Array2::zeros((n, n));
        let iter
            = ground_states.iter().enumerate()
            .cartesian_product(ground_states.iter().enumerate());
        for ((i, gs1), (j, gs2)) in iter {
            mat[[i, j]] = match self.matrix_element(gs1, gs2) {
                Ok(elem) => elem,
                Err(err) => panic!("unexpected adjacency error: {}", err),
            };
        }
        mat
    }
}
