//! Parlay slip: the legs a user has pinned from prop recommendations.

use crate::domain::PropLeg;
use serde::{Deserialize, Serialize};

/// A pinned leg together with the game it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipLeg {
    pub game_id: String,
    pub leg: PropLeg,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParlaySlip {
    legs: Vec<SlipLeg>,
}

impl ParlaySlip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a leg. Returns false if the same bet is already on the slip.
    pub fn pin(&mut self, game_id: impl Into<String>, leg: PropLeg) -> bool {
        if self.legs.iter().any(|l| l.leg.same_bet(&leg)) {
            return false;
        }
        self.legs.push(SlipLeg {
            game_id: game_id.into(),
            leg,
        });
        true
    }

    pub fn unpin(&mut self, index: usize) -> Option<SlipLeg> {
        if index < self.legs.len() {
            Some(self.legs.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.legs.clear();
    }

    pub fn legs(&self) -> &[SlipLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Product of every leg's decimal odds. `None` when the slip is empty or
    /// any leg is unpriced (no odds, or odds of 0).
    pub fn combined_decimal_odds(&self) -> Option<f64> {
        if self.legs.is_empty() {
            return None;
        }
        self.legs
            .iter()
            .map(|l| l.leg.odds.and_then(american_to_decimal))
            .try_fold(1.0, |acc, odds| odds.map(|o| acc * o))
    }

    pub fn combined_american_odds(&self) -> Option<i32> {
        self.combined_decimal_odds().and_then(decimal_to_american)
    }
}

/// `None` for a price of 0, which has no decimal equivalent.
pub fn american_to_decimal(odds: i32) -> Option<f64> {
    match odds {
        0 => None,
        o if o > 0 => Some(1.0 + f64::from(o) / 100.0),
        o => Some(1.0 + 100.0 / f64::from(o).abs()),
    }
}

/// `None` unless `decimal` is finite and above 1.0.
pub fn decimal_to_american(decimal: f64) -> Option<i32> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return None;
    }
    let american = if decimal >= 2.0 {
        (decimal - 1.0) * 100.0
    } else {
        -100.0 / (decimal - 1.0)
    };
    Some(american.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(player: &str, odds: Option<i32>) -> PropLeg {
        PropLeg {
            player: player.to_string(),
            team: "KC".to_string(),
            market: "Anytime TD".to_string(),
            line: None,
            pick: "Yes".to_string(),
            odds,
            confidence: 0.5,
            rationale: String::new(),
        }
    }

    #[test]
    fn test_pin_rejects_duplicates() {
        let mut slip = ParlaySlip::new();
        assert!(slip.pin("kc-lv", leg("T. Kelce", Some(120))));
        assert!(!slip.pin("kc-lv", leg("t. kelce", Some(130))));
        assert!(slip.pin("kc-lv", leg("I. Pacheco", Some(-110))));
        assert_eq!(slip.len(), 2);
    }

    #[test]
    fn test_unpin_and_clear() {
        let mut slip = ParlaySlip::new();
        slip.pin("kc-lv", leg("A", Some(100)));
        slip.pin("kc-lv", leg("B", Some(100)));
        assert!(slip.unpin(5).is_none());
        let removed = slip.unpin(0).expect("index 0 exists");
        assert_eq!(removed.leg.player, "A");
        assert_eq!(slip.legs()[0].leg.player, "B");
        slip.clear();
        assert!(slip.is_empty());
    }

    #[test]
    fn test_odds_conversion() {
        let plus = american_to_decimal(150).expect("priced");
        let minus = american_to_decimal(-200).expect("priced");
        assert!((plus - 2.5).abs() < 1e-9);
        assert!((minus - 1.5).abs() < 1e-9);
        assert_eq!(decimal_to_american(2.5), Some(150));
        assert_eq!(decimal_to_american(1.5), Some(-200));
    }

    #[test]
    fn test_zero_and_even_money_prices_are_unpriced() {
        assert_eq!(american_to_decimal(0), None);
        assert_eq!(decimal_to_american(1.0), None);
        assert_eq!(decimal_to_american(0.5), None);
        assert_eq!(decimal_to_american(f64::NAN), None);

        let mut slip = ParlaySlip::new();
        slip.pin("kc-lv", leg("A", Some(0)));
        slip.pin("kc-lv", leg("B", Some(-110)));
        assert_eq!(slip.combined_decimal_odds(), None);
        assert_eq!(slip.combined_american_odds(), None);
    }

    #[test]
    fn test_combined_odds() {
        let mut slip = ParlaySlip::new();
        assert_eq!(slip.combined_decimal_odds(), None);

        // two -110 legs pay roughly +264
        slip.pin("kc-lv", leg("A", Some(-110)));
        slip.pin("kc-lv", leg("B", Some(-110)));
        let decimal = slip.combined_decimal_odds().expect("priced legs");
        assert!((decimal - 3.6446).abs() < 1e-3);
        assert_eq!(slip.combined_american_odds(), Some(264));

        slip.pin("buf-mia", leg("C", None));
        assert_eq!(slip.combined_decimal_odds(), None);
    }
}
