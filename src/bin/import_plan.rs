//! Utility to load a plan file into the database
//!
//! The file holds the plan fields plus a `week` object:
//!
//! ```json
//! { "name": "Bulk", "goal": "bulk", "target_calories": 3200,
//!   "target_protein": 200, "target_carbs": 380, "target_fat": 95,
//!   "week": { "maandag": { "breakfast": { "ingredients": [ ... ] } } } }
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use mealscale::db::{self, Database};
use mealscale::models::{NutritionPlanCreate, WeeklyPlan};
use mealscale::tools::plans::create_plan_with_week;

#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(flatten)]
    plan: NutritionPlanCreate,
    #[serde(default)]
    week: WeeklyPlan,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(file) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: import_plan <plan.json>");
        std::process::exit(2);
    };

    let raw = std::fs::read_to_string(&file)?;
    let PlanFile { plan, week } = serde_json::from_str(&raw)?;

    let db_path = db::default_database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Database path: {}", db_path.display());
    let database = Database::open(&db_path)?;

    let (created, imported) = create_plan_with_week(&database, plan, &week)?;

    println!("Imported plan:");
    println!("  ID: {}", created.id);
    println!("  Name: {}", created.name);
    println!("  Days: {}", imported.days);
    println!("  Ingredient lines: {}", imported.ingredient_lines);

    Ok(())
}
