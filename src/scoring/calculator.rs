use serde::Serialize;
use std::fmt;

use super::config::Rounding;
use crate::model::{Indicator, IndicatorKind};

/// Presentation hint derived from a score's sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreClass {
    Penalty,
    Positive,
    Neutral,
}

impl ScoreClass {
    pub fn of(score: f64) -> Self {
        if score < 0.0 {
            ScoreClass::Penalty
        } else if score > 0.0 {
            ScoreClass::Positive
        } else {
            ScoreClass::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreClass::Penalty => "penalty",
            ScoreClass::Positive => "positive",
            ScoreClass::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ScoreClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score one raw value.
///
/// `peers` are the raw values of every forestry for the same indicator and
/// period; only Normal indicators look at them. An unknown indicator scores 0.
pub fn calculate_score<I>(
    value: f64,
    indicator: Option<&Indicator>,
    peers: I,
    rounding: Rounding,
) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let Some(indicator) = indicator else {
        return 0.0;
    };

    let score = match indicator.kind {
        IndicatorKind::Penalty => -value.abs(),
        IndicatorKind::Bonus => value.abs(),
        IndicatorKind::Normal => {
            let peak = peak_positive(peers);
            if peak > 0.0 {
                value / peak * indicator.max_weight
            } else {
                0.0
            }
        }
    };

    rounding.apply(score)
}

/// `max(0, max(peers))`. NaN peers are ignored.
fn peak_positive<I>(peers: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    peers
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(kind: IndicatorKind, max_weight: f64) -> Indicator {
        Indicator {
            id: 1,
            section_id: 1,
            name: "Test indicator".to_string(),
            max_weight,
            unit: None,
            description: None,
            kind,
            is_active: true,
        }
    }

    #[test]
    fn test_normal_scales_against_peer_max() {
        let ind = indicator(IndicatorKind::Normal, 10.0);
        let peers = [50.0, 100.0, 0.0];
        assert_eq!(calculate_score(50.0, Some(&ind), peers, Rounding::HalfUp), 5.0);
        assert_eq!(calculate_score(100.0, Some(&ind), peers, Rounding::HalfUp), 10.0);
        assert_eq!(calculate_score(0.0, Some(&ind), peers, Rounding::HalfUp), 0.0);
    }

    #[test]
    fn test_normal_rounds_to_two_decimals() {
        let ind = indicator(IndicatorKind::Normal, 10.0);
        let score = calculate_score(1.0, Some(&ind), [3.0], Rounding::HalfUp);
        assert_eq!(score, 3.33);
    }

    #[test]
    fn test_normal_all_peers_non_positive() {
        let ind = indicator(IndicatorKind::Normal, 10.0);
        assert_eq!(calculate_score(-5.0, Some(&ind), [-5.0, -1.0, 0.0], Rounding::HalfUp), 0.0);
        assert_eq!(calculate_score(0.0, Some(&ind), [0.0], Rounding::HalfUp), 0.0);
    }

    #[test]
    fn test_normal_negative_value_with_positive_peak() {
        let ind = indicator(IndicatorKind::Normal, 10.0);
        let score = calculate_score(-20.0, Some(&ind), [-20.0, 40.0], Rounding::HalfUp);
        assert_eq!(score, -5.0);
        assert_eq!(ScoreClass::of(score), ScoreClass::Penalty);
    }

    #[test]
    fn test_normal_no_peers() {
        let ind = indicator(IndicatorKind::Normal, 10.0);
        assert_eq!(calculate_score(0.0, Some(&ind), std::iter::empty(), Rounding::HalfUp), 0.0);
    }

    #[test]
    fn test_penalty_ignores_weight_and_sign() {
        let ind = indicator(IndicatorKind::Penalty, 5.0);
        assert_eq!(calculate_score(3.0, Some(&ind), [3.0], Rounding::HalfUp), -3.0);
        assert_eq!(calculate_score(-3.0, Some(&ind), [3.0], Rounding::HalfUp), -3.0);
        assert_eq!(calculate_score(0.0, Some(&ind), std::iter::empty(), Rounding::HalfUp), 0.0);
    }

    #[test]
    fn test_bonus_is_non_negative() {
        let ind = indicator(IndicatorKind::Bonus, 5.0);
        assert_eq!(calculate_score(2.5, Some(&ind), std::iter::empty(), Rounding::HalfUp), 2.5);
        assert_eq!(calculate_score(-2.5, Some(&ind), std::iter::empty(), Rounding::HalfUp), 2.5);
    }

    #[test]
    fn test_unknown_indicator_scores_zero() {
        assert_eq!(calculate_score(100.0, None, [100.0], Rounding::HalfUp), 0.0);
    }

    #[test]
    fn test_sign_invariants_over_range() {
        let penalty = indicator(IndicatorKind::Penalty, 5.0);
        let bonus = indicator(IndicatorKind::Bonus, 5.0);
        for v in [-1000.0, -1.5, -0.004, 0.0, 0.004, 1.5, 1000.0] {
            assert!(calculate_score(v, Some(&penalty), [v], Rounding::HalfUp) <= 0.0);
            assert!(calculate_score(v, Some(&bonus), [v], Rounding::HalfUp) >= 0.0);
        }
    }

    #[test]
    fn test_nan_peer_ignored() {
        let ind = indicator(IndicatorKind::Normal, 10.0);
        assert_eq!(calculate_score(5.0, Some(&ind), [f64::NAN, 10.0], Rounding::HalfUp), 5.0);
    }

    #[test]
    fn test_score_class() {
        assert_eq!(ScoreClass::of(-0.01), ScoreClass::Penalty);
        assert_eq!(ScoreClass::of(0.01), ScoreClass::Positive);
        assert_eq!(ScoreClass::of(0.0), ScoreClass::Neutral);
        assert_eq!(ScoreClass::Penalty.to_string(), "penalty");
    }
}
