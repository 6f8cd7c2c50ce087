//! MealScale MCP Server Implementation
//!
//! Implements the MCP server with all MealScale tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    ActivityLevel, FitnessGoal, Gender, LookupEntry, NutritionPlanCreate, UserProfile,
    DEFAULT_WEIGHT_KG,
};
use crate::nutrition::Category;
use crate::tools::scaling::ScalingRequest;
use crate::tools::status::StatusTracker;
use crate::tools::{plans, profiles, scaling};

/// MealScale MCP Service
#[derive(Clone)]
pub struct MealScaleService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<MealScaleService>,
}

impl MealScaleService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Body for a lookup that found nothing
fn not_found_body(error: &str, key: &str, value: serde_json::Value) -> String {
    let mut body = serde_json::Map::new();
    body.insert("error".to_string(), serde_json::Value::from(error));
    body.insert(key.to_string(), value);
    serde_json::Value::Object(body).to_string()
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetUserProfileParams {
    /// User's email address (identifies the profile)
    pub email: String,
    /// Body weight in kg (default 100)
    pub weight: Option<f64>,
    /// Height in cm
    pub height: Option<f64>,
    /// Age in years
    pub age: Option<u32>,
    /// male or female
    pub gender: Option<String>,
    /// sedentary, moderate or very_active (default moderate)
    pub activity_level: Option<String>,
    /// cut, maintain or bulk (default maintain)
    pub fitness_goal: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUserProfileParams {
    /// User's email address
    pub email: String,
}

// ============================================================================
// Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateNutritionPlanParams {
    /// Plan name
    pub name: String,
    /// Goal tag, e.g. "bulk" or "carnivore"
    pub goal: Option<String>,
    /// Baseline daily kcal at 100 kg
    #[serde(default)]
    pub target_calories: f64,
    /// Baseline protein grams
    #[serde(default)]
    pub target_protein: f64,
    /// Baseline carb grams
    #[serde(default)]
    pub target_carbs: f64,
    /// Baseline fat grams
    #[serde(default)]
    pub target_fat: f64,
    /// Protein percentage of calories (give all three or none)
    pub protein_pct: Option<f64>,
    pub carbs_pct: Option<f64>,
    pub fat_pct: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlanIdParams {
    /// Nutrition plan ID
    pub plan_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportWeeklyPlanParams {
    /// Nutrition plan ID to attach the week to (existing content is replaced)
    pub plan_id: i64,
    /// The week as a JSON object: day -> meal slot -> {ingredients, nutrition}
    pub week: serde_json::Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetWeeklyPlanParams {
    /// Nutrition plan ID
    pub plan_id: i64,
    /// Only this day (maandag..zondag or monday..sunday)
    pub day: Option<String>,
}

// ============================================================================
// Ingredient Lookup Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpsertIngredientParams {
    /// Ingredient name (matched case-insensitively against plan lines)
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
    /// Grams per piece/slice/handful
    pub unit_weight_grams: Option<f64>,
    /// egg, cheese, dairy, meat, fat, carb or other
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIngredientsParams {
    /// Name fragment to filter on
    pub query: Option<String>,
    /// Maximum results (default 100)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 { 100 }

// ============================================================================
// Custom Amount Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetCustomAmountParams {
    /// User's email address
    pub email: String,
    /// Nutrition plan ID
    pub plan_id: i64,
    /// Day name
    pub day: String,
    /// Meal slot: breakfast, morning-snack, lunch, lunch-snack, dinner, evening-snack
    pub slot: String,
    /// Ingredient name as it appears in the plan
    pub ingredient: String,
    /// The user's own baseline amount, in the line's unit
    pub amount: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ClearCustomAmountsParams {
    /// User's email address
    pub email: String,
    /// Nutrition plan ID
    pub plan_id: i64,
    /// Only clear this day (default all days)
    pub day: Option<String>,
}

// ============================================================================
// Scaling Parameter Structs
// ============================================================================

/// Ad-hoc profile for scaling without a stored one
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct InlineProfileParams {
    /// Body weight in kg; when set, overrides the stored profile
    pub weight: Option<f64>,
    /// sedentary, moderate or very_active (used with weight)
    pub activity_level: Option<String>,
    /// cut, maintain or bulk (used with weight)
    pub fitness_goal: Option<String>,
}

impl InlineProfileParams {
    fn profile(&self) -> Option<UserProfile> {
        let weight = self.weight?;
        Some(UserProfile::new(
            weight,
            self.activity_level.as_deref().map(ActivityLevel::from_str).unwrap_or_default(),
            self.fitness_goal.as_deref().map(FitnessGoal::from_str).unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComputeTargetsParams {
    /// Nutrition plan ID
    pub plan_id: i64,
    /// Stored profile to use (reference profile when omitted)
    pub email: Option<String>,
    #[serde(flatten)]
    pub inline: InlineProfileParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScaleDayParams {
    /// Nutrition plan ID
    pub plan_id: i64,
    /// Day name
    pub day: String,
    /// Stored profile and custom amounts to use (reference profile when omitted)
    pub email: Option<String>,
    /// Run the reconciler after scaling (default true)
    pub reconcile: Option<bool>,
    /// Balance protein/carbs/fat as well as calories (default true)
    pub balance_macros: Option<bool>,
    #[serde(flatten)]
    pub inline: InlineProfileParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScaleWeekParams {
    /// Nutrition plan ID
    pub plan_id: i64,
    /// Stored profile and custom amounts to use (reference profile when omitted)
    pub email: Option<String>,
    /// Run the reconciler after scaling (default true)
    pub reconcile: Option<bool>,
    /// Balance protein/carbs/fat as well as calories (default true)
    pub balance_macros: Option<bool>,
    #[serde(flatten)]
    pub inline: InlineProfileParams,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MealScaleService {
    // --- Status ---

    #[tool(description = "Get the current status of the MealScale service including build info, database status, and process information")]
    async fn mealscale_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        to_json(&status)
    }

    #[tool(description = "Get instructions for creating plans and scaling them to a user. Call this when starting a session or when unsure how the scaling tools fit together.")]
    fn scaling_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::SCALING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(SCALING_INSTRUCTIONS)]))
    }

    // --- Profiles ---

    #[tool(description = "Create or replace a user's profile (weight, activity level, goal). Missing fields use defaults: 100 kg, moderate, maintain.")]
    fn set_user_profile(&self, Parameters(p): Parameters<SetUserProfileParams>) -> Result<CallToolResult, McpError> {
        let profile = UserProfile {
            weight: p.weight.unwrap_or(DEFAULT_WEIGHT_KG),
            height: p.height.unwrap_or(0.0),
            age: p.age.unwrap_or(0),
            gender: p.gender.as_deref().map(Gender::from_str).unwrap_or_default(),
            activity_level: p.activity_level.as_deref().map(ActivityLevel::from_str).unwrap_or_default(),
            fitness_goal: p.fitness_goal.as_deref().map(FitnessGoal::from_str).unwrap_or_default(),
        };
        let result = profiles::set_user_profile(&self.database, &p.email, profile)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a user's profile with their daily calories and scaling factor")]
    fn get_user_profile(&self, Parameters(p): Parameters<GetUserProfileParams>) -> Result<CallToolResult, McpError> {
        let result = profiles::get_user_profile(&self.database, &p.email)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(profile) => to_json(&profile),
            None => Ok(CallToolResult::success(vec![Content::text(not_found_body(
                "Profile not found",
                "email",
                serde_json::json!(p.email),
            ))])),
        }
    }

    // --- Plans ---

    #[tool(description = "Create a nutrition plan with baseline targets for the 100 kg reference person")]
    fn create_nutrition_plan(&self, Parameters(p): Parameters<CreateNutritionPlanParams>) -> Result<CallToolResult, McpError> {
        let data = NutritionPlanCreate {
            name: p.name, goal: p.goal,
            target_calories: p.target_calories, target_protein: p.target_protein,
            target_carbs: p.target_carbs, target_fat: p.target_fat,
            protein_pct: p.protein_pct, carbs_pct: p.carbs_pct, fat_pct: p.fat_pct,
        };
        let result = plans::create_nutrition_plan(&self.database, data)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a nutrition plan with a summary of its weekly content")]
    fn get_nutrition_plan(&self, Parameters(p): Parameters<PlanIdParams>) -> Result<CallToolResult, McpError> {
        let result = plans::get_nutrition_plan(&self.database, p.plan_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(plan) => to_json(&plan),
            None => Ok(CallToolResult::success(vec![Content::text(not_found_body(
                "Nutrition plan not found",
                "id",
                serde_json::json!(p.plan_id),
            ))])),
        }
    }

    #[tool(description = "List all nutrition plans")]
    fn list_nutrition_plans(&self) -> Result<CallToolResult, McpError> {
        let result = plans::list_nutrition_plans(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a nutrition plan with its weekly content and custom amounts")]
    fn delete_nutrition_plan(&self, Parameters(p): Parameters<PlanIdParams>) -> Result<CallToolResult, McpError> {
        let result = plans::delete_nutrition_plan(&self.database, p.plan_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Import (replace) a plan's weekly meals. See scaling_instructions for the JSON layout.")]
    fn import_weekly_plan(&self, Parameters(p): Parameters<ImportWeeklyPlanParams>) -> Result<CallToolResult, McpError> {
        let week_json = p.week.to_string();
        let result = plans::import_weekly_plan(&self.database, p.plan_id, &week_json)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a plan's baseline weekly meals, or a single day")]
    fn get_weekly_plan(&self, Parameters(p): Parameters<GetWeeklyPlanParams>) -> Result<CallToolResult, McpError> {
        let result = plans::get_weekly_plan(&self.database, p.plan_id, p.day.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    // --- Ingredient Lookup ---

    #[tool(description = "Create or replace a canonical ingredient. Its per-100g values and category override matching plan lines during scaling.")]
    fn upsert_ingredient(&self, Parameters(p): Parameters<UpsertIngredientParams>) -> Result<CallToolResult, McpError> {
        let entry = LookupEntry {
            name: p.name,
            calories_per_100g: p.calories_per_100g,
            protein_per_100g: p.protein_per_100g,
            carbs_per_100g: p.carbs_per_100g,
            fat_per_100g: p.fat_per_100g,
            unit_weight_grams: p.unit_weight_grams,
            category: p.category.as_deref().map(Category::from_str),
        };
        let result = plans::upsert_ingredient(&self.database, entry)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List canonical ingredients, optionally filtered by name")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = plans::list_ingredients(&self.database, p.query.as_deref(), p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Custom Amounts ---

    #[tool(description = "Set a user's own baseline amount for one ingredient on one day and meal. It replaces the plan amount before scaling.")]
    fn set_custom_amount(&self, Parameters(p): Parameters<SetCustomAmountParams>) -> Result<CallToolResult, McpError> {
        let result = plans::set_custom_amount(&self.database, &p.email, p.plan_id, &p.day, &p.slot, &p.ingredient, p.amount)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove a user's custom amounts for a plan, or for one day of it")]
    fn clear_custom_amounts(&self, Parameters(p): Parameters<ClearCustomAmountsParams>) -> Result<CallToolResult, McpError> {
        let result = plans::clear_custom_amounts(&self.database, &p.email, p.plan_id, p.day.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    // --- Scaling ---

    #[tool(description = "Compute a user's daily calorie and macro targets on a plan, plus their scaling factor")]
    fn compute_targets(&self, Parameters(p): Parameters<ComputeTargetsParams>) -> Result<CallToolResult, McpError> {
        let request = ScalingRequest {
            email: p.email.as_deref(),
            profile: p.inline.profile(),
            ..Default::default()
        };
        let result = scaling::compute_targets(&self.database, p.plan_id, &request)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Scale one day of a plan to a user: per-ingredient amounts, per-meal and day totals, targets and green/amber/red status")]
    fn scale_day(&self, Parameters(p): Parameters<ScaleDayParams>) -> Result<CallToolResult, McpError> {
        let request = ScalingRequest {
            email: p.email.as_deref(),
            profile: p.inline.profile(),
            reconcile: p.reconcile,
            balance_macros: p.balance_macros,
        };
        let result = scaling::scale_day(&self.database, p.plan_id, &p.day, &request)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Scale every day of a plan to a user, with the average daily totals")]
    fn scale_week(&self, Parameters(p): Parameters<ScaleWeekParams>) -> Result<CallToolResult, McpError> {
        let request = ScalingRequest {
            email: p.email.as_deref(),
            profile: p.inline.profile(),
            reconcile: p.reconcile,
            balance_macros: p.balance_macros,
        };
        let result = scaling::scale_week(&self.database, p.plan_id, &request)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MealScaleService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mealscale".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("MealScale".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MealScale - personalizes weekly meal plans written for a 100 kg reference person. \
                 IMPORTANT: Call scaling_instructions first. \
                 Profiles: set_user_profile/get_user_profile. \
                 Plans: create/get/list/delete_nutrition_plan, import_weekly_plan, get_weekly_plan. \
                 Ingredients: upsert_ingredient, list_ingredients. \
                 Custom amounts: set_custom_amount, clear_custom_amounts. \
                 Scaling: compute_targets, scale_day, scale_week."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_body_escapes_values() {
        let email = r#"a"b\c@example.com"#;
        let body = not_found_body("Profile not found", "email", serde_json::json!(email));
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["error"], "Profile not found");
        assert_eq!(parsed["email"], email);

        let body = not_found_body("Nutrition plan not found", "id", serde_json::json!(7));
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["id"], 7);
    }

    #[test]
    fn test_inline_profile_needs_weight() {
        let params: ScaleDayParams = serde_json::from_str(
            r#"{"plan_id": 1, "day": "maandag", "weight": 70, "activity_level": "sedentary", "fitness_goal": "cut"}"#,
        )
        .unwrap();
        let profile = params.inline.profile().unwrap();
        assert_eq!(profile.weight, 70.0);
        assert_eq!(profile.activity_level, ActivityLevel::Sedentary);
        assert_eq!(profile.fitness_goal, FitnessGoal::Cut);

        let params: ScaleWeekParams =
            serde_json::from_str(r#"{"plan_id": 1, "activity_level": "sedentary"}"#).unwrap();
        assert!(params.inline.profile().is_none());
    }
}
