//! Crate-wide error definitions.

use crate::transition::{ State, TransitionGroupLabel };

/// Everything that can go wrong while building a profile or a rate equation.
///
/// All variants are deterministic consequences of the declarative input, so
/// none of them is retryable; construction either succeeds completely or
/// fails with one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Returned when a state or transition-group label fails to parse.
    #[error("cannot parse label {0:?}")]
    Parse(String),

    /// Returned when the raw transition strengths terminating on different
    /// excited states sum to different totals, violating the dipole sum-rule
    /// symmetry assumed of the input data.
    #[error("inconsistent transition strength sum for excited state {excited}")]
    InconsistentTransitionStrength {
        /// The excited state whose strength sum disagrees with the rest.
        excited: State,
    },

    /// Returned when an adjacency query names a state that was never declared
    /// in the profile.
    #[error("state {0} is not declared in this profile")]
    UnknownState(State),

    /// Returned for non-physical construction parameters.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Returned when a Zeeman provider has no g-factor for a state's
    /// hyperfine label.
    #[error("no g-factor given for hyperfine level {0:?}")]
    MissingGFactor(String),

    /// Returned when the profile's frequency table has no entry for a
    /// transition's group.
    #[error("no reference frequency given for transition group {0}")]
    MissingFrequency(TransitionGroupLabel),
}

pub type Result<T> = std::result::Result<T, Error>;
