//! Definitions to describe hyperfine sublevels and the allowed dipole
//! transitions between them.
//!
//! A [`TransitionProfile`] is built once from declarative data (state lists,
//! raw relative dipole strengths, a reference frequency per transition group,
//! and the natural linewidth) and is read-only afterwards. Construction
//! normalizes every transition strength to the branching ratio of its decay
//! channel, so that the strengths of all transitions terminating on a given
//! excited state sum to exactly 1.

use std::fmt;
use std::sync::OnceLock;
use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashMap as HashMap;
use crate::constants::C;
use crate::error::{ Error, Result };

/// Relative tolerance for the per-excited-state strength-sum consistency
/// check. Raw strength tables are typically small integers, for which the
/// sums compare exactly; the tolerance only absorbs representation noise in
/// pre-scaled inputs.
const STRENGTH_SUM_RELTOL: f64 = 1e-9;

fn state_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^-,]+),?(-?\d+)$").unwrap())
}

fn group_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)->(.+)$").unwrap())
}

/* States *********************************************************************/

/// A single magnetic sublevel of a hyperfine manifold.
///
/// Identity is structural: two states with equal fields are the same state,
/// and states are used directly as map keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct State {
    /// Hyperfine manifold label, e.g. `"G"` or `"E1"`.
    pub hyperfine: String,
    /// Magnetic (Zeeman) quantum number.
    pub m: i32,
}

impl State {
    /// Create a new state from its parts.
    pub fn new<L>(hyperfine: L, m: i32) -> Self
    where L: Into<String>
    {
        Self { hyperfine: hyperfine.into(), m }
    }

    /// Parse a state from a label of the form `"<hyperfine><signed-int>"` or
    /// `"<hyperfine>,<signed-int>"`.
    ///
    /// The comma form disambiguates hyperfine labels ending in a digit:
    /// `"G-2"` is `(G, -2)` while `"E1,3"` is `(E1, +3)`.
    pub fn parse(label: &str) -> Result<Self> {
        let caps = state_label_regex().captures(label)
            .ok_or_else(|| Error::Parse(label.to_string()))?;
        let m: i32 = caps[2].parse()
            .map_err(|_| Error::Parse(label.to_string()))?;
        Ok(Self { hyperfine: caps[1].to_string(), m })
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hyperfine.ends_with(|c: char| c.is_ascii_digit()) {
            write!(f, "{},{}", self.hyperfine, self.m)
        } else {
            write!(f, "{}{}", self.hyperfine, self.m)
        }
    }
}

/// Identifies the family of transitions connecting one ground hyperfine
/// manifold to one excited hyperfine manifold.
///
/// All transitions in a group share a single reference optical frequency in
/// the profile's frequency table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransitionGroupLabel {
    /// Ground-manifold hyperfine label.
    pub ground: String,
    /// Excited-manifold hyperfine label.
    pub excited: String,
}

impl TransitionGroupLabel {
    /// Create a new group label from its parts.
    pub fn new<L>(ground: L, excited: L) -> Self
    where L: Into<String>
    {
        Self { ground: ground.into(), excited: excited.into() }
    }

    /// Parse a group label of the form `"<ground>-><excited>"`.
    pub fn parse(label: &str) -> Result<Self> {
        let caps = group_label_regex().captures(label)
            .ok_or_else(|| Error::Parse(label.to_string()))?;
        Ok(Self { ground: caps[1].to_string(), excited: caps[2].to_string() })
    }
}

impl fmt::Display for TransitionGroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.ground, self.excited)
    }
}

/* Transitions ****************************************************************/

/// A single allowed dipole transition between a ground and an excited
/// sublevel.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Ground sublevel.
    pub ground: State,
    /// Excited sublevel.
    pub excited: State,
    /// Group (manifold pair) this transition belongs to.
    pub group: TransitionGroupLabel,
    /// Magnetic-number change `excited.m - ground.m`; ±1 or 0 for a dipole
    /// transition.
    pub delta_m: i32,
    /// Relative dipole matrix element squared. Unnormalized on input;
    /// replaced by the branching ratio at profile construction.
    pub strength: f64,
}

impl Transition {
    /// Create a transition between two states, deriving `delta_m` and the
    /// group label.
    pub fn from_states(ground: State, excited: State, strength: f64) -> Self {
        let group = TransitionGroupLabel::new(
            ground.hyperfine.clone(),
            excited.hyperfine.clone(),
        );
        let delta_m = excited.m - ground.m;
        Self { ground, excited, group, delta_m, strength }
    }

    /// Create a transition from two state labels, e.g.
    /// `Transition::new("G-2", "E-3", 60.0)`.
    pub fn new(ground: &str, excited: &str, strength: f64) -> Result<Self> {
        Ok(Self::from_states(State::parse(ground)?, State::parse(excited)?, strength))
    }
}

/* Profile ********************************************************************/

/// The full set of sublevels and normalized transitions of an atom, together
/// with per-group reference frequencies and the natural linewidth.
///
/// Transitions are stored once; the excited→ground and ground→excited
/// adjacency maps hold indices into that single arena and are derived at
/// construction. There is no mutation API.
#[derive(Clone, Debug)]
pub struct TransitionProfile {
    ground_states: Vec<State>,
    excited_states: Vec<State>,
    transitions: Vec<Transition>,
    exc_to_gnd: IndexMap<State, Vec<usize>>,
    gnd_to_exc: IndexMap<State, Vec<usize>>,
    frequencies: HashMap<TransitionGroupLabel, f64>,
    gamma: f64,
}

impl TransitionProfile {
    /// Create a new profile from declarative data.
    ///
    /// `frequencies` maps each transition group to its reference optical
    /// frequency in Hz (no 2π); `gamma` is the natural linewidth in Hz (no
    /// 2π) and must be strictly positive.
    ///
    /// Transition strengths are normalized so that all transitions
    /// terminating on a given excited state sum to 1. For a cycling
    /// transition the normalized strength is therefore 1, which makes the
    /// caller's pumping intensity naturally that of the cycling transition.
    /// The raw sums are required to be equal across all excited states
    /// (a partial check of the Steck sum-rule symmetry, sodium numbers
    /// eqn. 40); unequal sums fail construction.
    pub fn new(
        ground_states: Vec<State>,
        excited_states: Vec<State>,
        transitions: Vec<Transition>,
        frequencies: HashMap<TransitionGroupLabel, f64>,
        gamma: f64,
    ) -> Result<Self>
    {
        if gamma <= 0.0 {
            return Err(Error::InvalidParameter(
                format!("natural linewidth must be positive, got {}", gamma)));
        }
        let mut transitions = transitions;
        let exc_to_gnd = Self::normalize(&mut transitions)?;
        let gnd_to_exc = Self::build_gnd_to_exc(&transitions, &exc_to_gnd);
        Ok(Self {
            ground_states,
            excited_states,
            transitions,
            exc_to_gnd,
            gnd_to_exc,
            frequencies,
            gamma,
        })
    }

    /// Like [`Self::new`], but with per-group vacuum wavelengths in meters
    /// instead of frequencies.
    pub fn from_wavelengths(
        ground_states: Vec<State>,
        excited_states: Vec<State>,
        transitions: Vec<Transition>,
        wavelengths: HashMap<TransitionGroupLabel, f64>,
        gamma: f64,
    ) -> Result<Self>
    {
        let frequencies: HashMap<TransitionGroupLabel, f64>
            = wavelengths.into_iter()
            .map(|(group, wavelength)| (group, C / wavelength))
            .collect();
        Self::new(ground_states, excited_states, transitions, frequencies, gamma)
    }

    // Group transitions by excited state and rescale each group's strengths
    // by the group's raw sum, verifying that all raw sums agree.
    fn normalize(transitions: &mut [Transition])
        -> Result<IndexMap<State, Vec<usize>>>
    {
        let mut exc_to_gnd: IndexMap<State, Vec<usize>> = IndexMap::new();
        for (k, trans) in transitions.iter().enumerate() {
            exc_to_gnd.entry(trans.excited.clone()).or_default().push(k);
        }
        let mut strength_sum: Option<f64> = None;
        for (excited, group) in exc_to_gnd.iter() {
            let sum: f64
                = group.iter().map(|&k| transitions[k].strength).sum();
            if sum <= 0.0 {
                return Err(Error::InvalidParameter(
                    format!("non-positive strength sum for excited state {}",
                        excited)));
            }
            match strength_sum {
                None => { strength_sum = Some(sum); },
                Some(first) => {
                    if (sum - first).abs() > STRENGTH_SUM_RELTOL * first.abs() {
                        return Err(Error::InconsistentTransitionStrength {
                            excited: excited.clone(),
                        });
                    }
                },
            }
            for &k in group.iter() {
                transitions[k].strength /= sum;
            }
        }
        Ok(exc_to_gnd)
    }

    // Rebuilt from the normalized arena so both indices reference the same
    // transitions, walking excited groups in first-seen order.
    fn build_gnd_to_exc(
        transitions: &[Transition],
        exc_to_gnd: &IndexMap<State, Vec<usize>>,
    ) -> IndexMap<State, Vec<usize>>
    {
        let mut gnd_to_exc: IndexMap<State, Vec<usize>> = IndexMap::new();
        for &k in exc_to_gnd.values().flatten() {
            gnd_to_exc.entry(transitions[k].ground.clone()).or_default().push(k);
        }
        gnd_to_exc
    }

    /// Get the declared ground states, in construction order.
    ///
    /// This order fixes the row/column assignment of the generator matrix
    /// built by [`RateEquation`][crate::rate::RateEquation].
    pub fn ground_states(&self) -> &[State] { &self.ground_states }

    /// Get the declared excited states, in construction order.
    pub fn excited_states(&self) -> &[State] { &self.excited_states }

    /// Get all transitions, with normalized strengths.
    pub fn transitions(&self) -> &[Transition] { &self.transitions }

    /// Get the natural linewidth in Hz (no 2π).
    pub fn gamma(&self) -> f64 { self.gamma }

    /// Look up the reference frequency of a transition group in Hz.
    pub fn frequency(&self, group: &TransitionGroupLabel) -> Result<f64> {
        self.frequencies.get(group).copied()
            .ok_or_else(|| Error::MissingFrequency(group.clone()))
    }

    /// Get all transitions leaving a declared ground state.
    ///
    /// A declared ground state with no transitions yields an empty list; a
    /// state never declared as a ground state of this profile is an error.
    pub fn ground_to_excited(&self, gs: &State) -> Result<Vec<&Transition>> {
        if !self.ground_states.contains(gs) {
            return Err(Error::UnknownState(gs.clone()));
        }
        Ok(
            self.gnd_to_exc.get(gs)
                .map(|group| {
                    group.iter().map(|&k| &self.transitions[k]).collect()
                })
                .unwrap_or_default()
        )
    }

    /// Get all transitions terminating on a declared excited state.
    ///
    /// A declared excited state with no transitions yields an empty list; a
    /// state never declared as an excited state of this profile is an error.
    pub fn excited_to_ground(&self, es: &State) -> Result<Vec<&Transition>> {
        if !self.excited_states.contains(es) {
            return Err(Error::UnknownState(es.clone()));
        }
        Ok(
            self.exc_to_gnd.get(es)
                .map(|group| {
                    group.iter().map(|&k| &self.transitions[k]).collect()
                })
                .unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use super::*;

    fn state(label: &str) -> State { State::parse(label).unwrap() }

    fn transition(g: &str, e: &str, strength: f64) -> Transition {
        Transition::new(g, e, strength).unwrap()
    }

    // 87Rb D2 line, Fg=2 -> Fe=3; raw strengths from Metcalf, Appendix D.
    fn rb87_d2() -> TransitionProfile {
        TransitionProfile::new(
            ["G2", "G1", "G0", "G-1", "G-2"]
                .into_iter().map(state).collect(),
            ["E3", "E2", "E1", "E0", "E-1", "E-2", "E-3"]
                .into_iter().map(state).collect(),
            vec![
                transition("G-2", "E-3", 60.0),
                transition("G-2", "E-2", 20.0),
                transition("G-2", "E-1",  4.0),
                transition("G-1", "E-2", 40.0),
                transition("G-1", "E-1", 32.0),
                transition("G-1", "E0",  12.0),
                transition("G0",  "E-1", 24.0),
                transition("G0",  "E0",  36.0),
                transition("G0",  "E1",  24.0),
                transition("G1",  "E0",  12.0),
                transition("G1",  "E1",  32.0),
                transition("G1",  "E2",  40.0),
                transition("G2",  "E1",   4.0),
                transition("G2",  "E2",  20.0),
                transition("G2",  "E3",  60.0),
            ],
            [(TransitionGroupLabel::parse("G->E").unwrap(), 384.2304844685e12)]
                .into_iter().collect(),
            6.0666e6,
        )
        .unwrap()
    }

    #[test]
    fn parse_state_label() {
        assert_eq!(state("G1"), State::new("G", 1));
        assert_eq!(state("G-2"), State::new("G", -2));
        assert_eq!(state("E1,3"), State::new("E1", 3));
        assert_eq!(state("E1,-2"), State::new("E1", -2));
    }

    #[test]
    fn parse_state_label_malformed() {
        assert_eq!(State::parse("G"), Err(Error::Parse("G".to_string())));
        assert!(State::parse("").is_err());
        assert!(State::parse("1,").is_err());
    }

    #[test]
    fn parse_group_label() {
        assert_eq!(
            TransitionGroupLabel::parse("G->E").unwrap(),
            TransitionGroupLabel::new("G", "E"),
        );
        assert!(TransitionGroupLabel::parse("G-E").is_err());
        assert!(TransitionGroupLabel::parse("G->").is_err());
    }

    #[test]
    fn derived_transition_fields() {
        let t = transition("G-2", "E-1", 4.0);
        assert_eq!(t.ground, State::new("G", -2));
        assert_eq!(t.excited, State::new("E", -1));
        assert_eq!(t.group, TransitionGroupLabel::new("G", "E"));
        assert_eq!(t.delta_m, 1);
    }

    #[test]
    fn excited_to_ground_map() {
        let profile = rb87_d2();
        let has = |trans: &[&Transition], g: &str, e: &str| {
            trans.iter()
                .any(|t| t.ground == state(g) && t.excited == state(e))
        };

        let e2 = profile.excited_to_ground(&state("E2")).unwrap();
        assert_eq!(e2.len(), 2);
        assert!(has(&e2, "G1", "E2"));
        assert!(has(&e2, "G2", "E2"));

        let e0 = profile.excited_to_ground(&state("E0")).unwrap();
        assert_eq!(e0.len(), 3);
        assert!(has(&e0, "G-1", "E0"));
        assert!(has(&e0, "G0", "E0"));
        assert!(has(&e0, "G1", "E0"));
    }

    #[test]
    fn ground_to_excited_map() {
        let profile = rb87_d2();
        let has = |trans: &[&Transition], g: &str, e: &str| {
            trans.iter()
                .any(|t| t.ground == state(g) && t.excited == state(e))
        };

        let g0 = profile.ground_to_excited(&state("G0")).unwrap();
        assert_eq!(g0.len(), 3);
        assert!(has(&g0, "G0", "E-1"));
        assert!(has(&g0, "G0", "E0"));
        assert!(has(&g0, "G0", "E1"));

        let gm2 = profile.ground_to_excited(&state("G-2")).unwrap();
        assert_eq!(gm2.len(), 3);
        assert!(has(&gm2, "G-2", "E-3"));
        assert!(has(&gm2, "G-2", "E-2"));
        assert!(has(&gm2, "G-2", "E-1"));
    }

    #[test]
    fn normalization_to_unity() {
        let profile = rb87_d2();
        for es in profile.excited_states() {
            let sum: f64
                = profile.excited_to_ground(es).unwrap()
                .iter().map(|t| t.strength).sum();
            assert_approx_eq!(sum, 1.0, 1e-12);
        }
    }

    #[test]
    fn normalization_numbers() {
        let profile = rb87_d2();
        let strength = |g: &str, e: &str| -> f64 {
            profile.ground_to_excited(&state(g)).unwrap()
                .iter().find(|t| t.excited == state(e)).unwrap()
                .strength
        };

        assert_approx_eq!(strength("G-2", "E-3"), 1.0, 1e-15);
        assert_approx_eq!(strength("G-2", "E-2"), 1.0 / 3.0, 1e-15);
        assert_approx_eq!(strength("G-2", "E-1"), 1.0 / 15.0, 1e-15);

        assert_approx_eq!(strength("G-1", "E-2"), 2.0 / 3.0, 1e-15);
        assert_approx_eq!(strength("G-1", "E-1"), 8.0 / 15.0, 1e-15);
        assert_approx_eq!(strength("G-1", "E0"), 1.0 / 5.0, 1e-15);

        assert_approx_eq!(strength("G0", "E-1"), 2.0 / 5.0, 1e-15);
        assert_approx_eq!(strength("G0", "E0"), 3.0 / 5.0, 1e-15);
        assert_approx_eq!(strength("G0", "E1"), 2.0 / 5.0, 1e-15);

        assert_approx_eq!(strength("G1", "E0"), 1.0 / 5.0, 1e-15);
        assert_approx_eq!(strength("G1", "E1"), 8.0 / 15.0, 1e-15);
        assert_approx_eq!(strength("G1", "E2"), 2.0 / 3.0, 1e-15);

        assert_approx_eq!(strength("G2", "E1"), 1.0 / 15.0, 1e-15);
        assert_approx_eq!(strength("G2", "E2"), 1.0 / 3.0, 1e-15);
        assert_approx_eq!(strength("G2", "E3"), 1.0, 1e-15);
    }

    #[test]
    fn inconsistent_strength_sums() {
        let res = TransitionProfile::new(
            vec![state("G0"), state("G1")],
            vec![state("E0"), state("E1")],
            vec![
                transition("G0", "E0", 3.0),
                transition("G1", "E0", 1.0),
                transition("G1", "E1", 5.0),
            ],
            [(TransitionGroupLabel::parse("G->E").unwrap(), 384.0e12)]
                .into_iter().collect(),
            6.0e6,
        );
        assert_eq!(
            res.err(),
            Some(Error::InconsistentTransitionStrength { excited: state("E1") }),
        );
    }

    #[test]
    fn nonpositive_gamma() {
        let res = TransitionProfile::new(
            vec![state("G0")],
            vec![state("E1")],
            vec![transition("G0", "E1", 1.0)],
            [(TransitionGroupLabel::parse("G->E").unwrap(), 384.0e12)]
                .into_iter().collect(),
            0.0,
        );
        assert!(matches!(res, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn unknown_state_vs_empty() {
        let profile = TransitionProfile::new(
            vec![state("G0"), state("G1")],
            vec![state("E1")],
            vec![transition("G0", "E1", 1.0)],
            [(TransitionGroupLabel::parse("G->E").unwrap(), 384.0e12)]
                .into_iter().collect(),
            6.0e6,
        )
        .unwrap();

        // declared but transitionless: fine, empty
        assert!(profile.ground_to_excited(&state("G1")).unwrap().is_empty());
        // never declared: error
        assert_eq!(
            profile.ground_to_excited(&state("G7")),
            Err(Error::UnknownState(state("G7"))),
        );
        assert_eq!(
            profile.excited_to_ground(&state("G0")),
            Err(Error::UnknownState(state("G0"))),
        );
    }

    #[test]
    fn wavelength_construction_matches_frequency() {
        let by_freq = rb87_d2();
        let by_wl = TransitionProfile::from_wavelengths(
            by_freq.ground_states().to_vec(),
            by_freq.excited_states().to_vec(),
            vec![transition("G2", "E3", 60.0)],
            [(TransitionGroupLabel::parse("G->E").unwrap(), 780.241209686e-9)]
                .into_iter().collect(),
            6.0666e6,
        )
        .unwrap();
        let group = TransitionGroupLabel::parse("G->E").unwrap();
        let f0 = by_freq.frequency(&group).unwrap();
        let f1 = by_wl.frequency(&group).unwrap();
        // c / 780.241209686 nm = 384.2304844685 THz
        assert_approx_eq!(f0, f1, 1e3);
    }
}
