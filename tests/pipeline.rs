//! End-to-end scaling through the public API

use mealscale::models::{
    ActivityLevel, CustomAmounts, FitnessGoal, IngredientLookup, NutritionPlan,
    NutritionPlanCreate, UserProfile, Weekday, WeeklyPlan,
};
use mealscale::nutrition::{compute_scaling_factor, scale_week, ScaledDay, ScalingOptions};

const WEEK: &str = r#"{
    "maandag": {
        "breakfast": {"ingredients": [
            {"name": "Eieren", "unit": "stuk (60g)", "amount": 3,
             "caloriesPer100g": 143, "proteinPer100g": 13, "carbsPer100g": 1, "fatPer100g": 10},
            {"name": "Volkorenbrood", "unit": "snee (35g)", "amount": 2,
             "caloriesPer100g": 240, "proteinPer100g": 10, "carbsPer100g": 41, "fatPer100g": 3}
        ]},
        "lunch": {"ingredients": [
            {"name": "Kwark", "unit": "g", "amount": 250,
             "caloriesPer100g": 60, "proteinPer100g": 9, "carbsPer100g": 4, "fatPer100g": 0.2}
        ]},
        "dinner": {"ingredients": [
            {"name": "Kipfilet", "unit": "g", "amount": 200,
             "caloriesPer100g": 110, "proteinPer100g": 23, "carbsPer100g": 0, "fatPer100g": 1.5},
            {"name": "Rijst", "unit": "g", "amount": 120,
             "caloriesPer100g": 350, "proteinPer100g": 7, "carbsPer100g": 77, "fatPer100g": 1},
            {"name": "Olijfolie", "unit": "el", "amount": 1,
             "caloriesPer100g": 884, "proteinPer100g": 0, "carbsPer100g": 0, "fatPer100g": 100}
        ]}
    },
    "dinsdag": {
        "dinner": {"ingredients": [
            {"name": "Rundergehakt", "unit": "g", "amount": 250,
             "caloriesPer100g": 250, "proteinPer100g": 26, "carbsPer100g": 0, "fatPer100g": 17},
            {"name": "Aardappelen", "unit": "g", "amount": 300,
             "caloriesPer100g": 77, "proteinPer100g": 2, "carbsPer100g": 17, "fatPer100g": 0.1}
        ]}
    }
}"#;

/// Lines authored above their category caps
const ABOVE_CAPS: &str = r#"{
    "woensdag": {
        "breakfast": {"ingredients": [
            {"name": "Eieren", "unit": "stuk (60g)", "amount": 4,
             "caloriesPer100g": 143, "proteinPer100g": 13, "carbsPer100g": 1, "fatPer100g": 10},
            {"name": "Halfvolle melk", "unit": "ml", "amount": 500,
             "caloriesPer100g": 46, "proteinPer100g": 3.5, "carbsPer100g": 4.7, "fatPer100g": 1.5}
        ]},
        "dinner": {"ingredients": [
            {"name": "Kipfilet", "unit": "g", "amount": 200,
             "caloriesPer100g": 110, "proteinPer100g": 23, "carbsPer100g": 0, "fatPer100g": 1.5},
            {"name": "Roomboter", "unit": "g", "amount": 60,
             "caloriesPer100g": 740, "proteinPer100g": 0.7, "carbsPer100g": 0.6, "fatPer100g": 82}
        ]}
    }
}"#;

fn cap_for(name: &str) -> Option<f64> {
    match name {
        "Eieren" => Some(3.0),
        "Roomboter" => Some(50.0),
        "Halfvolle melk" => Some(400.0),
        _ => None,
    }
}

fn week() -> WeeklyPlan {
    serde_json::from_str(WEEK).unwrap()
}

fn plan() -> NutritionPlan {
    NutritionPlan::from_create(
        1,
        NutritionPlanCreate {
            name: "Standaard".to_string(),
            target_calories: 2860.0,
            target_protein: 200.0,
            target_carbs: 300.0,
            target_fat: 90.0,
            ..Default::default()
        },
    )
}

fn profiles() -> Vec<UserProfile> {
    vec![
        UserProfile::default(),
        UserProfile::new(70.0, ActivityLevel::Sedentary, FitnessGoal::Cut),
        UserProfile::new(85.0, ActivityLevel::Moderate, FitnessGoal::Maintain),
        UserProfile::new(120.0, ActivityLevel::VeryActive, FitnessGoal::Bulk),
        UserProfile::new(0.0, ActivityLevel::Moderate, FitnessGoal::Maintain),
    ]
}

#[test]
fn reference_profile_keeps_authored_amounts() {
    let options = ScalingOptions {
        reconcile: false,
        ..Default::default()
    };
    let scaled = scale_week(
        &week(),
        &UserProfile::default(),
        &plan(),
        &CustomAmounts::new(),
        &IngredientLookup::new(),
        &options,
    );
    assert_eq!(scaled.scaling_factor, 1.0);
    assert_eq!(scaled.days.len(), 2);
    for day in &scaled.days {
        for line in day.lines() {
            assert_eq!(line.amount, line.baseline_amount, "{}", line.name);
        }
    }
}

#[test]
fn factor_is_clamped() {
    let factors: Vec<f64> = profiles().iter().map(compute_scaling_factor).collect();
    assert_eq!(factors[1], 0.5);
    assert_eq!(factors[3], 1.5);
    assert!(factors.iter().all(|f| (0.5..=1.5).contains(f)));
}

#[test]
fn guardrails_hold_for_every_profile() {
    let week = week();
    for profile in profiles() {
        let scaled = scale_week(
            &week,
            &profile,
            &plan(),
            &CustomAmounts::new(),
            &IngredientLookup::new(),
            &ScalingOptions::default(),
        );
        for day in &scaled.days {
            for line in day.lines() {
                let base = line.baseline_amount;
                assert!(line.amount >= base * 0.4 - 1e-9, "{} shrank to {}", line.name, line.amount);
                assert!(line.amount <= base * 1.6 + 1e-9, "{} grew to {}", line.name, line.amount);
                if line.name == "Eieren" {
                    assert!(line.amount <= 3.0);
                    assert_eq!(line.amount.fract(), 0.0);
                }
            }
        }
    }
}

#[test]
fn larger_users_never_get_less() {
    let week = week();
    let scale = |profile: &UserProfile| {
        scale_week(
            &week,
            profile,
            &plan(),
            &CustomAmounts::new(),
            &IngredientLookup::new(),
            &ScalingOptions {
                reconcile: false,
                ..Default::default()
            },
        )
    };
    let small = scale(&UserProfile::new(70.0, ActivityLevel::Sedentary, FitnessGoal::Cut));
    let large = scale(&UserProfile::new(120.0, ActivityLevel::VeryActive, FitnessGoal::Bulk));

    for (s, l) in small.days.iter().zip(&large.days) {
        for (a, b) in s.lines().zip(l.lines()) {
            assert!(a.amount <= b.amount, "{}: {} > {}", a.name, a.amount, b.amount);
        }
    }
}

#[test]
fn reconciling_does_not_worsen_calories() {
    let profile = UserProfile::new(85.0, ActivityLevel::Moderate, FitnessGoal::Maintain);
    let run = |reconcile| {
        scale_week(
            &week(),
            &profile,
            &plan(),
            &CustomAmounts::new(),
            &IngredientLookup::new(),
            &ScalingOptions {
                reconcile,
                ..Default::default()
            },
        )
    };
    let raw = run(false);
    let reconciled = run(true);

    let gap = |d: &ScaledDay| (d.totals.calories - d.targets.calories).abs();
    for (before, after) in raw.days.iter().zip(&reconciled.days) {
        if gap(before) <= 100.0 {
            assert!(gap(after) <= 100.0, "{:?} left the calorie band", after.day);
        } else {
            assert!(gap(after) <= gap(before) + 1e-9, "{:?} moved away from target", after.day);
        }
        assert_eq!(after.status.within_calorie_tolerance, gap(after) <= 100.0);
    }
    assert_eq!(reconciled.days[0].day, Weekday::Maandag);
}

#[test]
fn category_caps_hold_when_authored_above_them() {
    let week: WeeklyPlan = serde_json::from_str(ABOVE_CAPS).unwrap();
    for profile in profiles() {
        let factor = compute_scaling_factor(&profile);
        for reconcile in [false, true] {
            let scaled = scale_week(
                &week,
                &profile,
                &plan(),
                &CustomAmounts::new(),
                &IngredientLookup::new(),
                &ScalingOptions {
                    reconcile,
                    ..Default::default()
                },
            );
            for line in scaled.days.iter().flat_map(|d| d.lines()) {
                let Some(cap) = cap_for(&line.name) else { continue };
                if !reconcile && factor != 1.0 {
                    assert!(line.amount <= cap, "{} at {} (factor {})", line.name, line.amount, factor);
                } else {
                    assert!(
                        line.amount == line.baseline_amount || line.amount <= cap,
                        "{} at {} (factor {})",
                        line.name,
                        line.amount,
                        factor
                    );
                }
                if line.name == "Eieren" {
                    assert_eq!(line.amount.fract(), 0.0);
                }
            }
        }
    }
}
