use super::config::{ScoringConfig, TbtNormalization};
use super::factors::Metric;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let weights = &config.weights;
    let named_weights = Metric::ALL
        .iter()
        .map(|m| (m.as_str().replace('-', "_"), weights.weight(*m)))
        .chain(std::iter::once((
            "total_blocking_time".to_string(),
            weights.total_blocking_time,
        )));

    for (name, weight) in named_weights {
        if !weight.is_finite() {
            errors.push(format!("scoring.weights.{}: must be a finite number", name));
        } else if weight < 0.0 {
            errors.push(format!("scoring.weights.{}: must be non-negative", name));
        }
    }

    if let TbtNormalization::FixedThreshold {
        acceptable_limit_ms,
        max_considered_ms,
    } = config.tbt_normalization
    {
        let prefix = "scoring.tbt_normalization.fixed_threshold";
        if !acceptable_limit_ms.is_finite() || acceptable_limit_ms <= 0.0 {
            errors.push(format!(
                "{}.acceptable_limit_ms: must be a positive number, got {}",
                prefix, acceptable_limit_ms
            ));
        }
        if !max_considered_ms.is_finite() || max_considered_ms <= 0.0 {
            errors.push(format!(
                "{}.max_considered_ms: must be a positive number, got {}",
                prefix, max_considered_ms
            ));
        }
        if acceptable_limit_ms >= max_considered_ms {
            errors.push(format!(
                "{}: acceptable_limit_ms ({}) must be below max_considered_ms ({})",
                prefix, acceptable_limit_ms, max_considered_ms
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
