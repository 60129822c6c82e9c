use std::env;

use crate::compare::DEFAULT_EPSILON;
use crate::error::HarnessError;
use crate::printer::DEFAULT_RENDER_CAP;

/// Environment variable overriding [`Config::epsilon`].
pub const EPSILON_VAR: &str = "TABLETEST_EPSILON";
/// Environment variable overriding [`Config::render_cap`].
pub const RENDER_CAP_VAR: &str = "TABLETEST_RENDER_CAP";

/// Knobs for a [`Harness`](crate::Harness).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Largest absolute difference at which two floats still compare equal.
    pub epsilon: f64,
    /// Characters of a value printed in failure logs before truncation.
    pub render_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            render_cap: DEFAULT_RENDER_CAP,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_render_cap(mut self, render_cap: usize) -> Self {
        self.render_cap = render_cap;
        self
    }

    /// Defaults, overridden by `TABLETEST_EPSILON` and `TABLETEST_RENDER_CAP`
    /// when set.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HarnessError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(EPSILON_VAR) {
            let epsilon: f64 = raw.trim().parse().map_err(|e| HarnessError::Config {
                key: EPSILON_VAR,
                reason: format!("{raw:?}: {e}"),
            })?;
            if !(epsilon.is_finite() && epsilon > 0.0) {
                return Err(HarnessError::Config {
                    key: EPSILON_VAR,
                    reason: format!("{raw:?}: must be a positive finite number"),
                });
            }
            config.epsilon = epsilon;
        }
        if let Some(raw) = lookup(RENDER_CAP_VAR) {
            let cap: usize = raw.trim().parse().map_err(|e| HarnessError::Config {
                key: RENDER_CAP_VAR,
                reason: format!("{raw:?}: {e}"),
            })?;
            if cap == 0 {
                return Err(HarnessError::Config {
                    key: RENDER_CAP_VAR,
                    reason: "must be at least 1".to_owned(),
                });
            }
            config.render_cap = cap;
        }
        Ok(config)
    }
}
