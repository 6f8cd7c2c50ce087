//! Data models
//!
//! Plan, profile and lookup records, with their SQLite persistence.

mod custom_amount;
mod lookup;
mod nutrition;
mod plan;
mod profile;
mod weekly_plan;

pub use custom_amount::{CustomAmount, CustomAmounts};
pub use lookup::{IngredientLookup, LookupEntry};
pub use nutrition::Nutrition;
pub use plan::{NutritionPlan, NutritionPlanCreate};
pub use profile::{ActivityLevel, FitnessGoal, Gender, StoredProfile, UserProfile, DEFAULT_WEIGHT_KG};
pub use weekly_plan::{DayPlan, Ingredient, IngredientRecord, Meal, MealSlot, Weekday, WeeklyPlan};
