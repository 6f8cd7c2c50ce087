//! Weekly meal plan model
//!
//! Seven days of six meal slots, each holding ingredient lines authored for
//! the 100 kg reference person.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::category::Category;
use crate::nutrition::converter::parse_unit;
use crate::nutrition::units::UnitKind;
use super::Nutrition;

/// Day of the week, keyed by its Dutch name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    #[serde(alias = "monday")]
    Maandag,
    #[serde(alias = "tuesday")]
    Dinsdag,
    #[serde(alias = "wednesday")]
    Woensdag,
    #[serde(alias = "thursday")]
    Donderdag,
    #[serde(alias = "friday")]
    Vrijdag,
    #[serde(alias = "saturday")]
    Zaterdag,
    #[serde(alias = "sunday")]
    Zondag,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Maandag,
        Weekday::Dinsdag,
        Weekday::Woensdag,
        Weekday::Donderdag,
        Weekday::Vrijdag,
        Weekday::Zaterdag,
        Weekday::Zondag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Maandag => "maandag",
            Weekday::Dinsdag => "dinsdag",
            Weekday::Woensdag => "woensdag",
            Weekday::Donderdag => "donderdag",
            Weekday::Vrijdag => "vrijdag",
            Weekday::Zaterdag => "zaterdag",
            Weekday::Zondag => "zondag",
        }
    }

    /// Parse a Dutch or English day name
    pub fn parse(s: &str) -> Option<Self> {
        let day = match s.trim().to_lowercase().as_str() {
            "maandag" | "monday" | "ma" | "mon" => Weekday::Maandag,
            "dinsdag" | "tuesday" | "di" | "tue" => Weekday::Dinsdag,
            "woensdag" | "wednesday" | "wo" | "wed" => Weekday::Woensdag,
            "donderdag" | "thursday" | "do" | "thu" => Weekday::Donderdag,
            "vrijdag" | "friday" | "vr" | "fri" => Weekday::Vrijdag,
            "zaterdag" | "saturday" | "za" | "sat" => Weekday::Zaterdag,
            "zondag" | "sunday" | "zo" | "sun" => Weekday::Zondag,
            _ => return None,
        };
        Some(day)
    }
}

/// One of the six fixed meal slots of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealSlot {
    #[serde(alias = "ontbijt")]
    Breakfast,
    #[serde(alias = "morning_snack", alias = "ochtendsnack")]
    MorningSnack,
    #[serde(alias = "middageten")]
    Lunch,
    #[serde(alias = "lunch_snack", alias = "afternoon-snack", alias = "middagsnack")]
    LunchSnack,
    #[serde(alias = "diner", alias = "avondeten")]
    Dinner,
    #[serde(alias = "evening_snack", alias = "avondsnack")]
    EveningSnack,
}

impl MealSlot {
    pub const ALL: [MealSlot; 6] = [
        MealSlot::Breakfast,
        MealSlot::MorningSnack,
        MealSlot::Lunch,
        MealSlot::LunchSnack,
        MealSlot::Dinner,
        MealSlot::EveningSnack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::MorningSnack => "morning-snack",
            MealSlot::Lunch => "lunch",
            MealSlot::LunchSnack => "lunch-snack",
            MealSlot::Dinner => "dinner",
            MealSlot::EveningSnack => "evening-snack",
        }
    }

    /// Parse a slot key, accepting snake_case and Dutch names
    pub fn parse(s: &str) -> Option<Self> {
        let slot = match s.trim().to_lowercase().replace('_', "-").as_str() {
            "breakfast" | "ontbijt" => MealSlot::Breakfast,
            "morning-snack" | "ochtendsnack" => MealSlot::MorningSnack,
            "lunch" | "middageten" => MealSlot::Lunch,
            "lunch-snack" | "afternoon-snack" | "middagsnack" => MealSlot::LunchSnack,
            "dinner" | "diner" | "avondeten" => MealSlot::Dinner,
            "evening-snack" | "avondsnack" => MealSlot::EveningSnack,
            _ => return None,
        };
        Some(slot)
    }
}

/// An ingredient line inside a meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IngredientRecord")]
pub struct Ingredient {
    pub name: String,
    pub unit: UnitKind,
    pub amount: f64,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_weight_grams: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Wire form of an ingredient, with a free-text unit
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub unit: String,
    pub amount: f64,
    #[serde(default, alias = "caloriesPer100g")]
    pub calories_per_100g: f64,
    #[serde(default, alias = "proteinPer100g")]
    pub protein_per_100g: f64,
    #[serde(default, alias = "carbsPer100g")]
    pub carbs_per_100g: f64,
    #[serde(default, alias = "fatPer100g")]
    pub fat_per_100g: f64,
    #[serde(default, alias = "unitWeightGrams")]
    pub unit_weight_grams: Option<f64>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl From<IngredientRecord> for Ingredient {
    fn from(record: IngredientRecord) -> Self {
        let parsed = parse_unit(&record.unit);
        Self {
            name: record.name.trim().to_string(),
            unit: parsed.kind,
            amount: record.amount,
            calories_per_100g: record.calories_per_100g,
            protein_per_100g: record.protein_per_100g,
            carbs_per_100g: record.carbs_per_100g,
            fat_per_100g: record.fat_per_100g,
            unit_weight_grams: record.unit_weight_grams.or(parsed.gram_weight),
            category: record.category,
        }
    }
}

impl Ingredient {
    pub fn new(name: &str, unit: UnitKind, amount: f64, per_100g: Nutrition) -> Self {
        Self {
            name: name.to_string(),
            unit,
            amount,
            calories_per_100g: per_100g.calories,
            protein_per_100g: per_100g.protein,
            carbs_per_100g: per_100g.carbs,
            fat_per_100g: per_100g.fat,
            unit_weight_grams: None,
            category: None,
        }
    }

    pub fn with_unit_weight(mut self, grams: f64) -> Self {
        self.unit_weight_grams = Some(grams);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Macro densities per 100 g
    pub fn per_100g(&self) -> Nutrition {
        Nutrition {
            calories: self.calories_per_100g,
            protein: self.protein_per_100g,
            carbs: self.carbs_per_100g,
            fat: self.fat_per_100g,
        }
    }
}

/// A meal: ingredient lines plus the author's optional baseline total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

/// The meals of one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayPlan {
    pub meals: BTreeMap<MealSlot, Meal>,
}

impl DayPlan {
    pub fn meal(&self, slot: MealSlot) -> Option<&Meal> {
        self.meals.get(&slot)
    }

    pub fn ingredient_count(&self) -> usize {
        self.meals.values().map(|m| m.ingredients.len()).sum()
    }
}

/// A full week of day plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyPlan {
    pub days: BTreeMap<Weekday, DayPlan>,
}

impl WeeklyPlan {
    pub fn day(&self, weekday: Weekday) -> Option<&DayPlan> {
        self.days.get(&weekday)
    }

    /// Load a plan's weekly content; days without rows are absent
    pub fn load(conn: &Connection, plan_id: i64) -> DbResult<Self> {
        let mut plan = WeeklyPlan::default();

        let mut stmt = conn.prepare(
            r#"
            SELECT day, slot, name, unit, amount,
                   calories_per_100g, protein_per_100g, carbs_per_100g, fat_per_100g,
                   unit_weight_grams, category
            FROM plan_ingredients
            WHERE plan_id = ?1
            ORDER BY day, slot, position
            "#,
        )?;
        let rows = stmt.query_map([plan_id], |row| {
            let day: String = row.get(0)?;
            let slot: String = row.get(1)?;
            let unit: String = row.get(3)?;
            let category: Option<String> = row.get(10)?;
            let ingredient = Ingredient {
                name: row.get(2)?,
                unit: UnitKind::parse(&unit),
                amount: row.get(4)?,
                calories_per_100g: row.get(5)?,
                protein_per_100g: row.get(6)?,
                carbs_per_100g: row.get(7)?,
                fat_per_100g: row.get(8)?,
                unit_weight_grams: row.get(9)?,
                category: category.as_deref().map(Category::from_str),
            };
            Ok((day, slot, ingredient))
        })?;

        for row in rows {
            let (day, slot, ingredient) = row?;
            if let Some(meal) = plan.meal_entry(&day, &slot) {
                meal.ingredients.push(ingredient);
            }
        }

        let mut stmt = conn.prepare(
            "SELECT day, slot, calories, protein, carbs, fat FROM plan_meal_nutrition WHERE plan_id = ?1",
        )?;
        let rows = stmt.query_map([plan_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                Nutrition {
                    calories: row.get(2)?,
                    protein: row.get(3)?,
                    carbs: row.get(4)?,
                    fat: row.get(5)?,
                },
            ))
        })?;

        for row in rows {
            let (day, slot, nutrition) = row?;
            if let Some(meal) = plan.meal_entry(&day, &slot) {
                meal.nutrition = Some(nutrition);
            }
        }

        Ok(plan)
    }

    fn meal_entry(&mut self, day: &str, slot: &str) -> Option<&mut Meal> {
        let (Some(weekday), Some(slot)) = (Weekday::parse(day), MealSlot::parse(slot)) else {
            tracing::warn!(day, slot, "skipping stored meal with unknown day or slot");
            return None;
        };
        Some(
            self.days
                .entry(weekday)
                .or_default()
                .meals
                .entry(slot)
                .or_default(),
        )
    }

    /// Replace a plan's weekly content
    pub fn save(conn: &mut Connection, plan_id: i64, plan: &WeeklyPlan) -> DbResult<usize> {
        let tx = conn.transaction()?;
        let inserted = Self::write(&tx, plan_id, plan)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Replace a plan's weekly content inside the caller's transaction
    pub fn write(tx: &Transaction, plan_id: i64, plan: &WeeklyPlan) -> DbResult<usize> {
        tx.execute("DELETE FROM plan_ingredients WHERE plan_id = ?1", [plan_id])?;
        tx.execute("DELETE FROM plan_meal_nutrition WHERE plan_id = ?1", [plan_id])?;

        let mut inserted = 0;
        {
            let mut insert_ingredient = tx.prepare(
                r#"
                INSERT INTO plan_ingredients (
                    plan_id, day, slot, position, name, unit, amount,
                    calories_per_100g, protein_per_100g, carbs_per_100g, fat_per_100g,
                    unit_weight_grams, category
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;
            let mut insert_nutrition = tx.prepare(
                r#"
                INSERT INTO plan_meal_nutrition (plan_id, day, slot, calories, protein, carbs, fat)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;

            for (weekday, day_plan) in &plan.days {
                for (slot, meal) in &day_plan.meals {
                    for (position, ing) in meal.ingredients.iter().enumerate() {
                        insert_ingredient.execute(params![
                            plan_id,
                            weekday.as_str(),
                            slot.as_str(),
                            position as i64,
                            ing.name,
                            ing.unit.as_str(),
                            ing.amount,
                            ing.calories_per_100g,
                            ing.protein_per_100g,
                            ing.carbs_per_100g,
                            ing.fat_per_100g,
                            ing.unit_weight_grams,
                            ing.category.map(|c| c.as_str()),
                        ])?;
                        inserted += 1;
                    }
                    if let Some(n) = &meal.nutrition {
                        insert_nutrition.execute(params![
                            plan_id,
                            weekday.as_str(),
                            slot.as_str(),
                            n.calories,
                            n.protein,
                            n.carbs,
                            n.fat,
                        ])?;
                    }
                }
            }
        }

        Ok(inserted)
    }
}
