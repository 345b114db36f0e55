use crate::error::{PostProcError, Result};
use crate::linalg::pcg::{DEFAULT_MAX_ITERATIONS, DEFAULT_PRECISION};

use json::JsonValue;

/// Run-time options of a [PostProcessor](crate::PostProcessor)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostProcessorConfig {
    /// Interpolate smoothed nodal flux values inside elements (otherwise report the raw element value)
    pub smoothing: bool,
    /// Relative residual at which the mask solve is considered converged
    pub solver_precision: f64,
    /// Iteration cap of the mask solve
    pub solver_max_iterations: usize,
}

impl Default for PostProcessorConfig {
    fn default() -> Self {
        Self {
            smoothing: true,
            solver_precision: DEFAULT_PRECISION,
            solver_max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl PostProcessorConfig {
    /// Parse a configuration from a JSON string. Missing keys keep their default values.
    ///
    /// ```JSON
    /// {
    ///     "smoothing": true,
    ///     "solver_precision": 1e-8,
    ///     "solver_max_iterations": 10000
    /// }
    /// ```
    pub fn from_json(source: impl AsRef<str>) -> Result<Self> {
        let parsed =
            json::parse(source.as_ref()).map_err(|e| PostProcError::InvalidConfig(e.to_string()))?;

        if !parsed.is_object() {
            return Err(PostProcError::InvalidConfig(
                "configuration must be a JSON object".to_string(),
            ));
        }

        let mut config = Self::default();

        if let Some(smoothing) = optional(&parsed, "smoothing", JsonValue::as_bool)? {
            config.smoothing = smoothing;
        }
        if let Some(precision) = optional(&parsed, "solver_precision", JsonValue::as_f64)? {
            if precision <= 0.0 {
                return Err(PostProcError::InvalidConfig(
                    "solver_precision must be positive".to_string(),
                ));
            }
            config.solver_precision = precision;
        }
        if let Some(max_iterations) =
            optional(&parsed, "solver_max_iterations", JsonValue::as_usize)?
        {
            config.solver_max_iterations = max_iterations;
        }

        Ok(config)
    }

    pub fn to_json(&self) -> JsonValue {
        json::object! {
            "smoothing": self.smoothing,
            "solver_precision": self.solver_precision,
            "solver_max_iterations": self.solver_max_iterations,
        }
    }
}

fn optional<T>(
    parsed: &JsonValue,
    key: &str,
    extract: impl Fn(&JsonValue) -> Option<T>,
) -> Result<Option<T>> {
    let value = &parsed[key];
    if value.is_null() {
        Ok(None)
    } else {
        extract(value)
            .map(Some)
            .ok_or_else(|| PostProcError::InvalidConfig(format!("'{}' has the wrong type", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_missing_keys() {
        let config = PostProcessorConfig::from_json("{}").unwrap();
        assert_eq!(config, PostProcessorConfig::default());
    }

    #[test]
    fn parse_all_keys() {
        let config = PostProcessorConfig::from_json(
            r#"{ "smoothing": false, "solver_precision": 1e-10, "solver_max_iterations": 250 }"#,
        )
        .unwrap();

        assert!(!config.smoothing);
        assert!((config.solver_precision - 1e-10).abs() < 1e-22);
        assert_eq!(config.solver_max_iterations, 250);

        let round_trip = PostProcessorConfig::from_json(config.to_json().dump()).unwrap();
        assert_eq!(round_trip.smoothing, config.smoothing);
        assert_eq!(round_trip.solver_max_iterations, config.solver_max_iterations);
        assert!((round_trip.solver_precision - config.solver_precision).abs() < 1e-22);
    }

    #[test]
    fn bad_configurations() {
        assert!(PostProcessorConfig::from_json("not json").is_err());
        assert!(PostProcessorConfig::from_json("[1, 2]").is_err());
        assert!(PostProcessorConfig::from_json(r#"{ "smoothing": 3 }"#).is_err());
        assert!(PostProcessorConfig::from_json(r#"{ "solver_precision": -1.0 }"#).is_err());
        assert!(PostProcessorConfig::from_json(r#"{ "solver_max_iterations": -5 }"#).is_err());
    }
}
