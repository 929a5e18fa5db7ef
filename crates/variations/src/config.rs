//! Engine configuration.

use serde::{Deserialize, Serialize};

use varmatrix_core::{DomainError, DomainResult};

/// Environment variable overriding [`MatrixConfig::max_variations`].
pub const MAX_VARIATIONS_ENV: &str = "VARMATRIX_MAX_VARIATIONS";

/// Business limits applied by [`crate::VariationMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Upper bound on variations per product; `add_variation` ignores calls
    /// past it.
    pub max_variations: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self { max_variations: 2 }
    }
}

impl MatrixConfig {
    /// Read overrides from the process environment, falling back to defaults.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`MatrixConfig::from_env`], with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_VARIATIONS_ENV) {
            let max = raw.trim().parse::<usize>().map_err(|e| {
                DomainError::validation(format!("{MAX_VARIATIONS_ENV}=`{raw}`: {e}"))
            })?;
            if max == 0 {
                return Err(DomainError::validation(format!(
                    "{MAX_VARIATIONS_ENV} must be at least 1"
                )));
            }
            config.max_variations = max;
        }

        Ok(config)
    }
}
