//! On-target signal for calories and macros
//!
//! Deviation is `|actual/target × 100 − 100|`, banded green (≤5%), amber
//! (≤10%) or red.

use serde::{Deserialize, Serialize};

use crate::models::Nutrition;

pub const GREEN_MAX_PCT: f64 = 5.0;
pub const AMBER_MAX_PCT: f64 = 10.0;
/// Allowed distance from the calorie target, in kcal
pub const CALORIE_TOLERANCE_KCAL: f64 = 100.0;

/// Percentage deviation of `actual` from `target`; 0 without a positive target
pub fn deviation_pct(actual: f64, target: f64) -> f64 {
    if !target.is_finite() || target <= 0.0 || !actual.is_finite() {
        return 0.0;
    }
    (actual / target * 100.0 - 100.0).abs()
}

/// Whether `actual` kcal lies within ±100 kcal of `target`
pub fn within_calorie_tolerance(actual: f64, target: f64) -> bool {
    (actual - target).abs() <= CALORIE_TOLERANCE_KCAL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceBand {
    Green,
    Amber,
    Red,
}

impl ToleranceBand {
    pub fn classify(deviation_pct: f64) -> Self {
        if deviation_pct <= GREEN_MAX_PCT {
            ToleranceBand::Green
        } else if deviation_pct <= AMBER_MAX_PCT {
            ToleranceBand::Amber
        } else {
            ToleranceBand::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToleranceBand::Green => "green",
            ToleranceBand::Amber => "amber",
            ToleranceBand::Red => "red",
        }
    }
}

/// Actual vs. target for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroStatus {
    pub actual: f64,
    pub target: f64,
    pub deviation_pct: f64,
    pub band: ToleranceBand,
    pub on_target: bool,
}

impl MacroStatus {
    pub fn new(actual: f64, target: f64) -> Self {
        let deviation = deviation_pct(actual, target);
        let band = ToleranceBand::classify(deviation);
        Self {
            actual,
            target,
            deviation_pct: (deviation * 10.0).round() / 10.0,
            band,
            on_target: band == ToleranceBand::Green,
        }
    }
}

/// Status of all four tracked metrics for a day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayStatus {
    pub calories: MacroStatus,
    pub protein: MacroStatus,
    pub carbs: MacroStatus,
    pub fat: MacroStatus,
    /// Calories within ±100 kcal
    pub within_calorie_tolerance: bool,
}

impl DayStatus {
    pub fn new(actual: &Nutrition, target: &Nutrition) -> Self {
        Self {
            calories: MacroStatus::new(actual.calories, target.calories),
            protein: MacroStatus::new(actual.protein, target.protein),
            carbs: MacroStatus::new(actual.carbs, target.carbs),
            fat: MacroStatus::new(actual.fat, target.fat),
            within_calorie_tolerance: within_calorie_tolerance(actual.calories, target.calories),
        }
    }

    /// Worst band over the four metrics
    pub fn overall(&self) -> ToleranceBand {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .map(|s| s.band)
            .max_by_key(|band| match band {
                ToleranceBand::Green => 0,
                ToleranceBand::Amber => 1,
                ToleranceBand::Red => 2,
            })
            .unwrap_or(ToleranceBand::Green)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banding_scenarios() {
        let near = deviation_pct(2150.0, 2200.0);
        assert!((near - 2.2727).abs() < 1e-3);
        assert_eq!(ToleranceBand::classify(near), ToleranceBand::Green);

        let far = deviation_pct(1950.0, 2200.0);
        assert!((far - 11.3636).abs() < 1e-3);
        assert_eq!(ToleranceBand::classify(far), ToleranceBand::Red);

        assert_eq!(ToleranceBand::classify(deviation_pct(2050.0, 2200.0)), ToleranceBand::Amber);
    }

    #[test]
    fn test_zero_target_is_neutral() {
        assert_eq!(deviation_pct(150.0, 0.0), 0.0);
        assert_eq!(deviation_pct(150.0, -10.0), 0.0);
        assert_eq!(deviation_pct(150.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_calorie_tolerance() {
        assert!(within_calorie_tolerance(2300.0, 2200.0));
        assert!(within_calorie_tolerance(2100.0, 2200.0));
        assert!(!within_calorie_tolerance(2301.0, 2200.0));
    }

    #[test]
    fn test_day_status() {
        let target = Nutrition::new(2200.0, 150.0, 250.0, 70.0);
        let actual = Nutrition::new(2150.0, 150.0, 200.0, 75.0);
        let status = DayStatus::new(&actual, &target);
        assert!(status.calories.on_target);
        assert_eq!(status.carbs.band, ToleranceBand::Red);
        assert_eq!(status.fat.band, ToleranceBand::Amber);
        assert_eq!(status.overall(), ToleranceBand::Red);
        assert!(status.within_calorie_tolerance);
        assert_eq!(status.calories.deviation_pct, 2.3);
    }
}
