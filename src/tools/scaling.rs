//! Scaling MCP Tools
//!
//! Load everything the engine needs from the database and run it.

use chrono::Utc;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    CustomAmounts, IngredientLookup, Nutrition, NutritionPlan, UserProfile, WeeklyPlan,
};
use crate::nutrition::{
    self, compute_scaling_factor, ScaledDay, ScaledWeek, ScalingOptions,
};

use super::plans::parse_weekday;
use super::profiles::profile_or_default;

/// Response for compute_targets
#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub plan_id: i64,
    pub profile: UserProfile,
    pub scaling_factor: f64,
    pub targets: Nutrition,
}

/// Response for scale_day
#[derive(Debug, Serialize)]
pub struct ScaleDayResponse {
    pub plan_id: i64,
    pub plan_name: String,
    pub generated_at: String,
    #[serde(flatten)]
    pub day: ScaledDay,
}

/// Response for scale_week
#[derive(Debug, Serialize)]
pub struct ScaleWeekResponse {
    pub plan_id: i64,
    pub plan_name: String,
    pub generated_at: String,
    #[serde(flatten)]
    pub week: ScaledWeek,
}

/// Who to scale for: a stored profile, an inline one, or the reference
#[derive(Debug, Default)]
pub struct ScalingRequest<'a> {
    pub email: Option<&'a str>,
    pub profile: Option<UserProfile>,
    pub reconcile: Option<bool>,
    pub balance_macros: Option<bool>,
}

impl ScalingRequest<'_> {
    fn options(&self) -> ScalingOptions {
        let mut options = ScalingOptions::default();
        if let Some(reconcile) = self.reconcile {
            options.reconcile = reconcile;
        }
        if let Some(balance) = self.balance_macros {
            options.reconcile_options.balance_macros = balance;
        }
        options
    }

    fn profile(&self, db: &Database) -> Result<UserProfile, String> {
        match &self.profile {
            Some(profile) => Ok(profile.clone()),
            None => profile_or_default(db, self.email),
        }
    }
}

struct Inputs {
    profile: UserProfile,
    plan: NutritionPlan,
    weekly: WeeklyPlan,
    overrides: CustomAmounts,
    lookup: IngredientLookup,
}

fn load_inputs(db: &Database, plan_id: i64, request: &ScalingRequest) -> Result<Inputs, String> {
    let profile = request.profile(db)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = NutritionPlan::get_by_id(&conn, plan_id)
        .map_err(|e| format!("Failed to get plan: {}", e))?
        .ok_or_else(|| format!("Nutrition plan {} not found", plan_id))?;
    let weekly = WeeklyPlan::load(&conn, plan_id).map_err(|e| format!("Failed to load weekly plan: {}", e))?;
    let lookup = IngredientLookup::load(&conn).map_err(|e| format!("Failed to load ingredient lookup: {}", e))?;
    let overrides = match request.email {
        Some(email) => CustomAmounts::load(&conn, email, plan_id)
            .map_err(|e| format!("Failed to load custom amounts: {}", e))?,
        None => CustomAmounts::new(),
    };

    Ok(Inputs {
        profile,
        plan,
        weekly,
        overrides,
        lookup,
    })
}

/// Personalized daily targets for a plan
pub fn compute_targets(db: &Database, plan_id: i64, request: &ScalingRequest) -> Result<TargetsResponse, String> {
    let profile = request.profile(db)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let plan = NutritionPlan::get_by_id(&conn, plan_id)
        .map_err(|e| format!("Failed to get plan: {}", e))?
        .ok_or_else(|| format!("Nutrition plan {} not found", plan_id))?;

    Ok(TargetsResponse {
        plan_id,
        scaling_factor: compute_scaling_factor(&profile),
        targets: nutrition::compute_targets(&profile, &plan),
        profile,
    })
}

/// Scale one day of a plan
pub fn scale_day(db: &Database, plan_id: i64, day: &str, request: &ScalingRequest) -> Result<ScaleDayResponse, String> {
    let weekday = parse_weekday(day)?;
    let inputs = load_inputs(db, plan_id, request)?;
    let day_plan = inputs
        .weekly
        .day(weekday)
        .ok_or_else(|| format!("Plan {} has no meals for {}", plan_id, weekday.as_str()))?;

    let scaled = nutrition::scale_day(
        day_plan,
        weekday,
        &inputs.profile,
        &inputs.plan,
        &inputs.overrides,
        &inputs.lookup,
        &request.options(),
    );
    tracing::info!(
        plan_id,
        day = weekday.as_str(),
        calories = scaled.totals.calories.round(),
        target = scaled.targets.calories,
        "day scaled"
    );

    Ok(ScaleDayResponse {
        plan_id,
        plan_name: inputs.plan.name,
        generated_at: Utc::now().to_rfc3339(),
        day: scaled,
    })
}

/// Scale every day of a plan
pub fn scale_week(db: &Database, plan_id: i64, request: &ScalingRequest) -> Result<ScaleWeekResponse, String> {
    let inputs = load_inputs(db, plan_id, request)?;
    if inputs.weekly.days.is_empty() {
        return Err(format!("Plan {} has no weekly content; import it first", plan_id));
    }

    let week = nutrition::scale_week(
        &inputs.weekly,
        &inputs.profile,
        &inputs.plan,
        &inputs.overrides,
        &inputs.lookup,
        &request.options(),
    );
    tracing::info!(plan_id, days = week.days.len(), factor = week.scaling_factor, "week scaled");

    Ok(ScaleWeekResponse {
        plan_id,
        plan_name: inputs.plan.name,
        generated_at: Utc::now().to_rfc3339(),
        week,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, FitnessGoal, NutritionPlanCreate};
    use crate::tools::{plans, profiles};

    const WEEK: &str = r#"{
        "maandag": {
            "breakfast": {
                "ingredients": [
                    {"name": "Havermout", "unit": "g", "amount": 80,
                     "caloriesPer100g": 370, "proteinPer100g": 13, "carbsPer100g": 60, "fatPer100g": 7},
                    {"name": "Eieren", "unit": "stuks", "amount": 3, "unitWeightGrams": 60,
                     "caloriesPer100g": 143, "proteinPer100g": 13, "carbsPer100g": 1, "fatPer100g": 10}
                ]
            },
            "dinner": {
                "ingredients": [
                    {"name": "Kipfilet", "unit": "g", "amount": 200,
                     "caloriesPer100g": 110, "proteinPer100g": 23, "carbsPer100g": 0, "fatPer100g": 1.5},
                    {"name": "Rijst", "unit": "g", "amount": 150,
                     "caloriesPer100g": 350, "proteinPer100g": 7, "carbsPer100g": 77, "fatPer100g": 1}
                ]
            }
        }
    }"#;

    fn seed(db: &Database) -> i64 {
        let plan = plans::create_nutrition_plan(
            db,
            NutritionPlanCreate {
                name: "Standaard".to_string(),
                target_calories: 2000.0,
                target_protein: 200.0,
                target_carbs: 200.0,
                target_fat: 65.0,
                ..Default::default()
            },
        )
        .unwrap();
        plans::import_weekly_plan(db, plan.id, WEEK).unwrap();
        plan.id
    }

    fn without_reconcile<'a>(email: Option<&'a str>) -> ScalingRequest<'a> {
        ScalingRequest {
            email,
            reconcile: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_profile_scales_to_baseline() {
        let db = Database::in_memory().unwrap();
        let plan_id = seed(&db);

        let result = scale_day(&db, plan_id, "monday", &without_reconcile(None)).unwrap();
        assert_eq!(result.day.scaling_factor, 1.0);
        for line in result.day.lines() {
            assert_eq!(line.amount, line.baseline_amount);
        }
    }

    #[test]
    fn test_heavy_profile_respects_egg_cap() {
        let db = Database::in_memory().unwrap();
        let plan_id = seed(&db);
        profiles::set_user_profile(
            &db,
            "heavy@example.com",
            UserProfile::new(120.0, ActivityLevel::VeryActive, FitnessGoal::Bulk),
        )
        .unwrap();

        let week = scale_week(
            &db,
            plan_id,
            &ScalingRequest {
                email: Some("heavy@example.com"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(week.week.scaling_factor, 1.5);
        let monday = &week.week.days[0];
        let eggs = monday.lines().find(|l| l.name == "Eieren").unwrap();
        assert!(eggs.amount <= 3.0);
        let rice = monday.lines().find(|l| l.name == "Rijst").unwrap();
        assert!(rice.amount > rice.baseline_amount);
        assert!(rice.amount <= rice.baseline_amount * 1.6);
    }

    #[test]
    fn test_custom_amount_is_used_as_baseline() {
        let db = Database::in_memory().unwrap();
        let plan_id = seed(&db);
        plans::set_custom_amount(&db, "me@example.com", plan_id, "maandag", "breakfast", "havermout", 100.0)
            .unwrap();

        let result = scale_day(&db, plan_id, "maandag", &without_reconcile(Some("me@example.com"))).unwrap();
        let oats = result.day.lines().find(|l| l.name == "Havermout").unwrap();
        assert!(oats.custom);
        assert_eq!(oats.baseline_amount, 100.0);
        assert_eq!(oats.amount, 100.0);

        plans::clear_custom_amounts(&db, "me@example.com", plan_id, None).unwrap();
        let result = scale_day(&db, plan_id, "maandag", &without_reconcile(Some("me@example.com"))).unwrap();
        let oats = result.day.lines().find(|l| l.name == "Havermout").unwrap();
        assert!(!oats.custom);
        assert_eq!(oats.amount, 80.0);
    }

    #[test]
    fn test_targets_follow_plan_ratios() {
        let db = Database::in_memory().unwrap();
        let plan_id = seed(&db);

        let result = compute_targets(&db, plan_id, &ScalingRequest::default()).unwrap();
        assert_eq!(result.scaling_factor, 1.0);
        // 2860 kcal against a 2000 kcal plan
        assert_eq!(result.targets.calories, 2860.0);
        assert_eq!(result.targets.protein, 286.0);
    }

    #[test]
    fn test_inline_profile_wins_over_stored() {
        let db = Database::in_memory().unwrap();
        let plan_id = seed(&db);
        profiles::set_user_profile(&db, "me@example.com", UserProfile::default()).unwrap();

        let request = ScalingRequest {
            email: Some("me@example.com"),
            profile: Some(UserProfile::new(70.0, ActivityLevel::Sedentary, FitnessGoal::Cut)),
            reconcile: Some(false),
            ..Default::default()
        };
        let result = scale_day(&db, plan_id, "maandag", &request).unwrap();
        assert_eq!(result.day.scaling_factor, 0.5);
        let targets = compute_targets(&db, plan_id, &request).unwrap();
        assert_eq!(targets.profile.weight, 70.0);
    }

    #[test]
    fn test_missing_plan_and_day_are_errors() {
        let db = Database::in_memory().unwrap();
        let plan_id = seed(&db);

        assert!(scale_day(&db, plan_id + 100, "maandag", &ScalingRequest::default()).is_err());
        assert!(scale_day(&db, plan_id, "zondag", &ScalingRequest::default()).is_err());
        assert!(scale_day(&db, plan_id, "someday", &ScalingRequest::default()).is_err());
    }
}
