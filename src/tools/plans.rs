//! Nutrition Plan MCP Tools
//!
//! Plans, their weekly content, the ingredient lookup and custom amounts.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    CustomAmount, CustomAmounts, LookupEntry, MealSlot, NutritionPlan, NutritionPlanCreate,
    Weekday, WeeklyPlan,
};

/// Summary of a plan for list results
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub id: i64,
    pub name: String,
    pub goal: Option<String>,
    pub target_calories: f64,
}

impl From<&NutritionPlan> for PlanSummary {
    fn from(plan: &NutritionPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name.clone(),
            goal: plan.goal.clone(),
            target_calories: plan.target_calories,
        }
    }
}

/// Response for list_nutrition_plans
#[derive(Debug, Serialize)]
pub struct ListPlansResponse {
    pub plans: Vec<PlanSummary>,
    pub total: usize,
}

/// Plan detail with a count of its weekly content
#[derive(Debug, Serialize)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: NutritionPlan,
    pub days: usize,
    pub ingredient_lines: usize,
}

/// Response for import_weekly_plan
#[derive(Debug, Serialize)]
pub struct ImportWeeklyPlanResponse {
    pub success: bool,
    pub plan_id: i64,
    pub days: usize,
    pub ingredient_lines: usize,
}

/// Response for deletions and clears
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub removed: usize,
}

/// Response for list_ingredients
#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub items: Vec<LookupEntry>,
    pub total: usize,
}

fn validate_percentages(data: &NutritionPlanCreate) -> Result<(), String> {
    let set = [data.protein_pct, data.carbs_pct, data.fat_pct];
    let count = set.iter().filter(|p| p.is_some()).count();
    if count != 0 && count != 3 {
        return Err("protein_pct, carbs_pct and fat_pct must be given together".to_string());
    }
    if set.iter().flatten().any(|p| *p < 0.0 || *p > 100.0) {
        return Err("percentages must be between 0 and 100".to_string());
    }
    Ok(())
}

fn validate_plan(data: &NutritionPlanCreate) -> Result<(), String> {
    if data.name.trim().is_empty() {
        return Err("Plan name cannot be empty".to_string());
    }
    let targets = [data.target_calories, data.target_protein, data.target_carbs, data.target_fat];
    if targets.iter().any(|t| *t < 0.0) {
        return Err("targets cannot be negative".to_string());
    }
    validate_percentages(data)
}

fn validate_week(weekly: &WeeklyPlan) -> Result<(), String> {
    for day in weekly.days.values() {
        for meal in day.meals.values() {
            if let Some(line) = meal.ingredients.iter().find(|i| !i.amount.is_finite() || i.amount < 0.0) {
                return Err(format!("Ingredient '{}' has an invalid amount", line.name));
            }
        }
    }
    Ok(())
}

/// Create a new nutrition plan
pub fn create_nutrition_plan(db: &Database, data: NutritionPlanCreate) -> Result<NutritionPlan, String> {
    validate_plan(&data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let plan = NutritionPlan::create(&conn, &data)
        .map_err(|e| format!("Failed to create plan: {}", e))?;
    tracing::info!(plan_id = plan.id, name = %plan.name, "nutrition plan created");
    Ok(plan)
}

/// Get a plan with a summary of its weekly content
pub fn get_nutrition_plan(db: &Database, id: i64) -> Result<Option<PlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let Some(plan) = NutritionPlan::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get plan: {}", e))?
    else {
        return Ok(None);
    };
    let weekly = WeeklyPlan::load(&conn, id).map_err(|e| format!("Failed to load weekly plan: {}", e))?;

    Ok(Some(PlanDetail {
        days: weekly.days.len(),
        ingredient_lines: weekly.days.values().map(|d| d.ingredient_count()).sum(),
        plan,
    }))
}

/// List all plans
pub fn list_nutrition_plans(db: &Database) -> Result<ListPlansResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let plans = NutritionPlan::list(&conn).map_err(|e| format!("Failed to list plans: {}", e))?;
    let summaries: Vec<PlanSummary> = plans.iter().map(PlanSummary::from).collect();
    let total = summaries.len();
    Ok(ListPlansResponse { plans: summaries, total })
}

/// Delete a plan together with its weekly content and overrides
pub fn delete_nutrition_plan(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = NutritionPlan::delete(&conn, id).map_err(|e| format!("Failed to delete plan: {}", e))?;
    if !deleted {
        return Err(format!("Nutrition plan {} not found", id));
    }
    Ok(DeleteResponse { success: true, removed: 1 })
}

/// Replace a plan's weekly content with the given JSON week
pub fn import_weekly_plan(db: &Database, plan_id: i64, week_json: &str) -> Result<ImportWeeklyPlanResponse, String> {
    let weekly: WeeklyPlan =
        serde_json::from_str(week_json).map_err(|e| format!("Invalid weekly plan: {}", e))?;
    validate_week(&weekly)?;

    db.with_conn_mut(|conn| {
        if NutritionPlan::get_by_id(conn, plan_id)?.is_none() {
            return Err(crate::db::DbError::NotFound(format!("nutrition plan {}", plan_id)));
        }
        WeeklyPlan::save(conn, plan_id, &weekly)
    })
    .map(|inserted| {
        tracing::info!(plan_id, lines = inserted, "weekly plan imported");
        ImportWeeklyPlanResponse {
            success: true,
            plan_id,
            days: weekly.days.len(),
            ingredient_lines: inserted,
        }
    })
    .map_err(|e| format!("Failed to import weekly plan: {}", e))
}

/// Create a plan and its weekly content in one transaction
pub fn create_plan_with_week(
    db: &Database,
    data: NutritionPlanCreate,
    weekly: &WeeklyPlan,
) -> Result<(NutritionPlan, ImportWeeklyPlanResponse), String> {
    validate_plan(&data)?;
    validate_week(weekly)?;

    let (plan, inserted) = db
        .with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let plan = NutritionPlan::create(&tx, &data)?;
            let inserted = WeeklyPlan::write(&tx, plan.id, weekly)?;
            tx.commit()?;
            Ok((plan, inserted))
        })
        .map_err(|e| format!("Failed to import plan: {}", e))?;

    tracing::info!(plan_id = plan.id, lines = inserted, "plan imported with weekly content");
    let response = ImportWeeklyPlanResponse {
        success: true,
        plan_id: plan.id,
        days: weekly.days.len(),
        ingredient_lines: inserted,
    };
    Ok((plan, response))
}

/// Get a plan's weekly content, optionally a single day
pub fn get_weekly_plan(db: &Database, plan_id: i64, day: Option<&str>) -> Result<WeeklyPlan, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut weekly = WeeklyPlan::load(&conn, plan_id).map_err(|e| format!("Failed to load weekly plan: {}", e))?;

    if let Some(day) = day {
        let weekday = parse_weekday(day)?;
        weekly.days.retain(|d, _| *d == weekday);
    }
    Ok(weekly)
}

/// Insert or replace a canonical ingredient
pub fn upsert_ingredient(db: &Database, entry: LookupEntry) -> Result<LookupEntry, String> {
    if entry.name.trim().is_empty() {
        return Err("Ingredient name cannot be empty".to_string());
    }
    let densities = [
        entry.calories_per_100g,
        entry.protein_per_100g,
        entry.carbs_per_100g,
        entry.fat_per_100g,
    ];
    if densities.iter().any(|v| *v < 0.0) {
        return Err("per-100g values cannot be negative".to_string());
    }
    if entry.unit_weight_grams.is_some_and(|w| w <= 0.0) {
        return Err("unit_weight_grams must be greater than 0".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    LookupEntry::upsert(&conn, &entry).map_err(|e| format!("Failed to save ingredient: {}", e))
}

/// List canonical ingredients, optionally filtered by name
pub fn list_ingredients(db: &Database, query: Option<&str>, limit: i64) -> Result<ListIngredientsResponse, String> {
    let limit = limit.clamp(1, 500);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let items = LookupEntry::list(&conn, query, limit).map_err(|e| format!("Failed to list ingredients: {}", e))?;
    let total = items.len();
    Ok(ListIngredientsResponse { items, total })
}

/// Store a user's own baseline amount for one line
pub fn set_custom_amount(
    db: &Database,
    email: &str,
    plan_id: i64,
    day: &str,
    slot: &str,
    ingredient: &str,
    amount: f64,
) -> Result<CustomAmount, String> {
    if !amount.is_finite() || amount < 0.0 {
        return Err("amount cannot be negative".to_string());
    }
    if ingredient.trim().is_empty() {
        return Err("ingredient cannot be empty".to_string());
    }
    let entry = CustomAmount {
        day: parse_weekday(day)?,
        slot: parse_slot(slot)?,
        ingredient: ingredient.trim().to_string(),
        amount,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    if NutritionPlan::get_by_id(&conn, plan_id)
        .map_err(|e| format!("Failed to get plan: {}", e))?
        .is_none()
    {
        return Err(format!("Nutrition plan {} not found", plan_id));
    }
    CustomAmounts::set(&conn, email, plan_id, &entry)
        .map_err(|e| format!("Failed to save custom amount: {}", e))?;
    Ok(entry)
}

/// Remove a user's custom amounts for a plan, or for one day of it
pub fn clear_custom_amounts(db: &Database, email: &str, plan_id: i64, day: Option<&str>) -> Result<DeleteResponse, String> {
    let day = day.map(parse_weekday).transpose()?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let removed = CustomAmounts::clear(&conn, email, plan_id, day)
        .map_err(|e| format!("Failed to clear custom amounts: {}", e))?;
    Ok(DeleteResponse { success: true, removed })
}

pub(crate) fn parse_weekday(day: &str) -> Result<Weekday, String> {
    Weekday::parse(day).ok_or_else(|| format!("Unknown day '{}'. Use maandag..zondag or monday..sunday", day))
}

pub(crate) fn parse_slot(slot: &str) -> Result<MealSlot, String> {
    MealSlot::parse(slot).ok_or_else(|| {
        format!(
            "Unknown meal slot '{}'. Use breakfast, morning-snack, lunch, lunch-snack, dinner or evening-snack",
            slot
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: &str = r#"{
        "maandag": {"lunch": {"ingredients": [
            {"name": "Kwark", "unit": "g", "amount": 250, "caloriesPer100g": 60}
        ]}}
    }"#;

    fn plan_data() -> NutritionPlanCreate {
        NutritionPlanCreate {
            name: "Standaard".to_string(),
            target_calories: 2000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_plan_with_week() {
        let db = Database::in_memory().unwrap();
        let weekly: WeeklyPlan = serde_json::from_str(WEEK).unwrap();
        let (plan, response) = create_plan_with_week(&db, plan_data(), &weekly).unwrap();
        assert_eq!(response.ingredient_lines, 1);

        let detail = get_nutrition_plan(&db, plan.id).unwrap().unwrap();
        assert_eq!(detail.days, 1);
        assert_eq!(detail.ingredient_lines, 1);
    }

    #[test]
    fn test_invalid_week_creates_no_plan() {
        let db = Database::in_memory().unwrap();
        let mut weekly: WeeklyPlan = serde_json::from_str(WEEK).unwrap();
        for day in weekly.days.values_mut() {
            for meal in day.meals.values_mut() {
                meal.ingredients[0].amount = -1.0;
            }
        }
        assert!(create_plan_with_week(&db, plan_data(), &weekly).is_err());
        assert_eq!(list_nutrition_plans(&db).unwrap().total, 0);
    }

    #[test]
    fn test_partial_percentages_rejected() {
        let db = Database::in_memory().unwrap();
        let data = NutritionPlanCreate {
            protein_pct: Some(30.0),
            ..plan_data()
        };
        assert!(create_nutrition_plan(&db, data).is_err());
    }
}
