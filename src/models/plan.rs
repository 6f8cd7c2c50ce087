//! Nutrition plan model
//!
//! Plan-level targets authored for the 100 kg reference person.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A nutrition plan with its baseline targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
    pub id: i64,
    pub name: String,
    pub goal: Option<String>,
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbs: f64,
    pub target_fat: f64,
    pub protein_pct: Option<f64>,
    pub carbs_pct: Option<f64>,
    pub fat_pct: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new nutrition plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionPlanCreate {
    pub name: String,
    pub goal: Option<String>,
    #[serde(default)]
    pub target_calories: f64,
    #[serde(default)]
    pub target_protein: f64,
    #[serde(default)]
    pub target_carbs: f64,
    #[serde(default)]
    pub target_fat: f64,
    pub protein_pct: Option<f64>,
    pub carbs_pct: Option<f64>,
    pub fat_pct: Option<f64>,
}

impl NutritionPlan {
    /// In-memory plan, for callers that do not go through the database
    pub fn from_create(id: i64, data: NutritionPlanCreate) -> Self {
        Self {
            id,
            name: data.name,
            goal: data.goal,
            target_calories: data.target_calories,
            target_protein: data.target_protein,
            target_carbs: data.target_carbs,
            target_fat: data.target_fat,
            protein_pct: data.protein_pct,
            carbs_pct: data.carbs_pct,
            fat_pct: data.fat_pct,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// Explicit macro split, only when all three percentages are set
    pub fn macro_percentages(&self) -> Option<(f64, f64, f64)> {
        match (self.protein_pct, self.carbs_pct, self.fat_pct) {
            (Some(p), Some(c), Some(f)) if p + c + f > 0.0 => Some((p, c, f)),
            _ => None,
        }
    }

    /// Zero-carb style plan, recognized by name or goal tag
    pub fn is_carnivore(&self) -> bool {
        const MARKERS: [&str; 4] = ["carnivo", "zero carb", "zero-carb", "nul koolhydraat"];
        let name = self.name.to_lowercase();
        let goal = self.goal.as_deref().unwrap_or("").to_lowercase();
        MARKERS
            .iter()
            .any(|marker| name.contains(marker) || goal.contains(marker))
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            goal: row.get("goal")?,
            target_calories: row.get("target_calories")?,
            target_protein: row.get("target_protein")?,
            target_carbs: row.get("target_carbs")?,
            target_fat: row.get("target_fat")?,
            protein_pct: row.get("protein_pct")?,
            carbs_pct: row.get("carbs_pct")?,
            fat_pct: row.get("fat_pct")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new plan
    pub fn create(conn: &Connection, data: &NutritionPlanCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO nutrition_plans (
                name, goal, target_calories, target_protein, target_carbs, target_fat,
                protein_pct, carbs_pct, fat_pct
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                data.name,
                data.goal,
                data.target_calories,
                data.target_protein,
                data.target_carbs,
                data.target_fat,
                data.protein_pct,
                data.carbs_pct,
                data.fat_pct,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| crate::db::DbError::NotFound(format!("nutrition plan {}", id)))
    }

    /// Get a plan by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrition_plans WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all plans by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrition_plans ORDER BY name ASC")?;
        let plans = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// Delete a plan and (by cascade) its weekly content and overrides
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM nutrition_plans WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
