use serde::{Deserialize, Serialize};

/// How scores are rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Ties away from zero (2.345 -> 2.35, -2.345 -> -2.35).
    #[default]
    HalfUp,
    /// Ties to the even neighbour (2.345 -> 2.34).
    HalfEven,
}

impl Rounding {
    /// Round to two decimal places.
    pub fn apply(&self, value: f64) -> f64 {
        let scaled = value * 100.0;
        let rounded = match self {
            Rounding::HalfUp => scaled.round(),
            Rounding::HalfEven => scaled.round_ties_even(),
        };
        // avoid "-0.00"
        if rounded == 0.0 {
            0.0
        } else {
            rounded / 100.0
        }
    }
}

/// Scoring configuration.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   rounding: half_even
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Rounding mode for per-indicator scores (default: half_up)
    #[serde(default)]
    pub rounding: Rounding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.rounding, Rounding::HalfUp);
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig {
            rounding: Rounding::HalfEven,
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config.rounding, Rounding::HalfUp);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "rounding: half_up\nbase_score: 100\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_half_up() {
        assert_eq!(Rounding::HalfUp.apply(3.3333), 3.33);
        assert_eq!(Rounding::HalfUp.apply(6.6666), 6.67);
        assert_eq!(Rounding::HalfUp.apply(-3.0), -3.0);
        assert_eq!(Rounding::HalfUp.apply(0.125), 0.13);
    }

    #[test]
    fn test_half_even() {
        assert_eq!(Rounding::HalfEven.apply(0.125), 0.12);
        assert_eq!(Rounding::HalfEven.apply(0.135), 0.14);
    }

    #[test]
    fn test_no_negative_zero() {
        let r = Rounding::HalfUp.apply(-0.001);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }
}
