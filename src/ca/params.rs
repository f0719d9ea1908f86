use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters of the coordinate ascent method
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Number of independent restarts
    pub num_restarts: usize,
    /// Maximum number of passes over all coordinates per restart
    pub num_max_iterations: usize,
    /// Initial step of the line search
    pub step_base: f64,
    /// Factor by which the step shrinks after an unsuccessful round
    pub step_scale: f64,
    /// Number of line search rounds per coordinate
    pub num_line_search_steps: usize,
    /// Minimum relative improvement for accepting a step
    pub tolerance: f64,
    /// L1-normalize the weights after every accepted step
    pub normalize: bool,
    /// Draw initial weights at random instead of uniformly
    pub init_random: bool,
    /// Seed of the initial weights (restart `r` uses `seed + r`)
    pub seed: u64,
    /// Suppress progress output
    pub quiet: bool,
}

impl Params {
    const DEFAULT_NUM_RESTARTS: usize = 5;
    const DEFAULT_NUM_MAX_ITERATIONS: usize = 25;
    const DEFAULT_STEP_BASE: f64 = 0.05;
    const DEFAULT_STEP_SCALE: f64 = 2.0;
    const DEFAULT_NUM_LINE_SEARCH_STEPS: usize = 8;
    const DEFAULT_TOLERANCE: f64 = 0.001;
    const DEFAULT_SEED: u64 = 42;

    /// Creates a new [`Params`] struct with default parameter values.
    pub fn new() -> Self {
        Params {
            num_restarts: Self::DEFAULT_NUM_RESTARTS,
            num_max_iterations: Self::DEFAULT_NUM_MAX_ITERATIONS,
            step_base: Self::DEFAULT_STEP_BASE,
            step_scale: Self::DEFAULT_STEP_SCALE,
            num_line_search_steps: Self::DEFAULT_NUM_LINE_SEARCH_STEPS,
            tolerance: Self::DEFAULT_TOLERANCE,
            normalize: true,
            init_random: false,
            seed: Self::DEFAULT_SEED,
            quiet: false,
        }
    }

    /// Sets the number of restarts.
    pub fn with_num_restarts(mut self, num_restarts: usize) -> Self {
        self.num_restarts = num_restarts;
        self
    }

    /// Sets the maximum number of passes per restart.
    pub fn with_num_max_iterations(mut self, num_max_iterations: usize) -> Self {
        self.num_max_iterations = num_max_iterations;
        self
    }

    /// Sets the initial line search step.
    pub fn with_step_base(mut self, step_base: f64) -> Self {
        self.step_base = step_base;
        self
    }

    /// Sets the minimum relative improvement.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enables or disables L1 normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Draws initial weights at random from `seed`.
    pub fn with_random_init(mut self, seed: u64) -> Self {
        self.init_random = true;
        self.seed = seed;
        self
    }

    /// Suppresses progress output.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Checks that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |parameter: &'static str, reason: String| {
            Err(Error::InvalidConfiguration { parameter, reason })
        };
        if self.num_restarts == 0 {
            return invalid("num_restarts", "must be at least 1".to_string());
        }
        if self.num_max_iterations == 0 {
            return invalid("num_max_iterations", "must be at least 1".to_string());
        }
        if self.num_line_search_steps == 0 {
            return invalid("num_line_search_steps", "must be at least 1".to_string());
        }
        if !(self.step_base.is_finite() && self.step_base > 0.0) {
            return invalid("step_base", format!("must be positive, got {}", self.step_base));
        }
        if !(self.step_scale.is_finite() && self.step_scale > 1.0) {
            return invalid(
                "step_scale",
                format!("must be greater than 1, got {}", self.step_scale),
            );
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return invalid(
                "tolerance",
                format!("must be non-negative, got {}", self.tolerance),
            );
        }
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Params::new().validate().is_ok());
    }

    #[test]
    fn out_of_range_parameters() {
        let cases = [
            (Params::new().with_num_restarts(0), "num_restarts"),
            (Params::new().with_num_max_iterations(0), "num_max_iterations"),
            (Params::new().with_step_base(0.0), "step_base"),
            (Params::new().with_step_base(-1.0), "step_base"),
            (Params::new().with_tolerance(f64::NAN), "tolerance"),
            (Params::new().with_tolerance(-0.1), "tolerance"),
            (
                Params {
                    step_scale: 1.0,
                    ..Params::new()
                },
                "step_scale",
            ),
            (
                Params {
                    step_scale: f64::INFINITY,
                    ..Params::new()
                },
                "step_scale",
            ),
            (
                Params {
                    num_line_search_steps: 0,
                    ..Params::new()
                },
                "num_line_search_steps",
            ),
        ];
        for (params, name) in cases {
            assert!(matches!(
                params.validate(),
                Err(Error::InvalidConfiguration { parameter, .. }) if parameter == name
            ));
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: Params = serde_json::from_str(r#"{"num_restarts": 2, "quiet": true}"#).unwrap();
        assert_eq!(params.num_restarts, 2);
        assert!(params.quiet);
        assert_eq!(params.step_base, Params::new().step_base);
    }
}
