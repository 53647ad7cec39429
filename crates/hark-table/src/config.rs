//! Table construction parameters.

use std::error::Error;
use std::fmt;

// ── TableConfigError ───────────────────────────────────────────────

/// Errors detected during [`TableBuildConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum TableConfigError {
    /// `max_rounds` is zero.
    ZeroRounds,
    /// `accept_ratio` is NaN, infinite or below 1.
    InvalidAcceptRatio {
        /// The invalid value.
        value: f64,
    },
    /// `accept_slack` is NaN, infinite or negative.
    InvalidAcceptSlack {
        /// The invalid value.
        value: f64,
    },
    /// `detour_factor` is NaN, infinite or not above 1.
    InvalidDetourFactor {
        /// The invalid value.
        value: f64,
    },
    /// `task_count` is `Some(0)`.
    ZeroTasks,
}

impl fmt::Display for TableConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroRounds => write!(f, "max_rounds must be at least 1"),
            Self::InvalidAcceptRatio { value } => {
                write!(f, "accept_ratio must be finite and >= 1, got {value}")
            }
            Self::InvalidAcceptSlack { value } => {
                write!(f, "accept_slack must be finite and >= 0, got {value}")
            }
            Self::InvalidDetourFactor { value } => {
                write!(f, "detour_factor must be finite and > 1, got {value}")
            }
            Self::ZeroTasks => write!(f, "task_count must be at least 1"),
        }
    }
}

impl Error for TableConfigError {}

// ── TableBuildConfig ───────────────────────────────────────────────

/// Configuration for [`TableBuilder`](crate::TableBuilder).
#[derive(Clone, Debug, PartialEq)]
pub struct TableBuildConfig {
    /// Path searches per leaf pair.
    pub max_rounds: usize,
    /// A later round is accepted only if its distance is at most this
    /// multiple of the previous accepted round.
    pub accept_ratio: f64,
    /// A later round is accepted only if it is at most this many units
    /// longer than the previous accepted round.
    pub accept_slack: f64,
    /// Factor applied to the weights of a found route before the next round.
    pub detour_factor: f64,
    /// Number of parallel tasks. `None` uses the hardware parallelism.
    pub task_count: Option<usize>,
}

impl Default for TableBuildConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            accept_ratio: 1.1,
            accept_slack: 128.0,
            detour_factor: 3.0,
            task_count: None,
        }
    }
}

impl TableBuildConfig {
    /// Whether a round of `distance` may follow an accepted round of
    /// `previous`.
    pub fn accepts(&self, previous: f64, distance: f64) -> bool {
        distance <= previous * self.accept_ratio && distance - previous <= self.accept_slack
    }

    /// Check the configuration, returning the first violated constraint.
    pub fn validate(&self) -> Result<(), TableConfigError> {
        if self.max_rounds == 0 {
            return Err(TableConfigError::ZeroRounds);
        }
        if !self.accept_ratio.is_finite() || self.accept_ratio < 1.0 {
            return Err(TableConfigError::InvalidAcceptRatio {
                value: self.accept_ratio,
            });
        }
        if !self.accept_slack.is_finite() || self.accept_slack < 0.0 {
            return Err(TableConfigError::InvalidAcceptSlack {
                value: self.accept_slack,
            });
        }
        if !self.detour_factor.is_finite() || self.detour_factor <= 1.0 {
            return Err(TableConfigError::InvalidDetourFactor {
                value: self.detour_factor,
            });
        }
        if self.task_count == Some(0) {
            return Err(TableConfigError::ZeroTasks);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TableBuildConfig::default().validate().is_ok());
    }

    #[test]
    fn acceptance_needs_both_bounds() {
        let cfg = TableBuildConfig::default();
        assert!(cfg.accepts(100.0, 110.0));
        assert!(!cfg.accepts(100.0, 111.0));
        // Within 10% but more than 128 units longer.
        assert!(!cfg.accepts(2000.0, 2150.0));
        assert!(cfg.accepts(2000.0, 2128.0));
    }

    #[test]
    fn invalid_values_rejected() {
        let bad = [
            TableBuildConfig {
                max_rounds: 0,
                ..Default::default()
            },
            TableBuildConfig {
                accept_ratio: f64::NAN,
                ..Default::default()
            },
            TableBuildConfig {
                detour_factor: 1.0,
                ..Default::default()
            },
            TableBuildConfig {
                task_count: Some(0),
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn errors_carry_the_offending_value() {
        let cfg = TableBuildConfig {
            detour_factor: 0.5,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(TableConfigError::InvalidDetourFactor { value: 0.5 })
        );
        let cfg = TableBuildConfig {
            accept_slack: -1.0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(TableConfigError::InvalidAcceptSlack { value: -1.0 })
        );
        assert_eq!(
            TableBuildConfig {
                max_rounds: 0,
                ..Default::default()
            }
            .validate(),
            Err(TableConfigError::ZeroRounds)
        );
    }
}
