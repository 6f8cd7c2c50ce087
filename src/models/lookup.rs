//! Canonical ingredient lookup
//!
//! An authoritative name → macro density table. When a plan line's name is
//! found here, the entry's densities, unit weight and category replace the
//! values embedded in the line.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::category::Category;
use super::{Ingredient, Nutrition};

/// One canonical ingredient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
    pub unit_weight_grams: Option<f64>,
    pub category: Option<Category>,
}

impl LookupEntry {
    pub fn per_100g(&self) -> Nutrition {
        Nutrition {
            calories: self.calories_per_100g,
            protein: self.protein_per_100g,
            carbs: self.carbs_per_100g,
            fat: self.fat_per_100g,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let category: Option<String> = row.get("category")?;
        Ok(Self {
            name: row.get("name")?,
            calories_per_100g: row.get("calories_per_100g")?,
            protein_per_100g: row.get("protein_per_100g")?,
            carbs_per_100g: row.get("carbs_per_100g")?,
            fat_per_100g: row.get("fat_per_100g")?,
            unit_weight_grams: row.get("unit_weight_grams")?,
            category: category.as_deref().map(Category::from_str),
        })
    }

    /// Insert or replace an entry, keyed by normalized name
    pub fn upsert(conn: &Connection, entry: &LookupEntry) -> DbResult<Self> {
        let key = ingredient_key(&entry.name);
        conn.execute(
            r#"
            INSERT INTO ingredient_lookup (
                name_key, name, calories_per_100g, protein_per_100g, carbs_per_100g, fat_per_100g,
                unit_weight_grams, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(name_key) DO UPDATE SET
                name = excluded.name,
                calories_per_100g = excluded.calories_per_100g,
                protein_per_100g = excluded.protein_per_100g,
                carbs_per_100g = excluded.carbs_per_100g,
                fat_per_100g = excluded.fat_per_100g,
                unit_weight_grams = excluded.unit_weight_grams,
                category = excluded.category,
                updated_at = datetime('now')
            "#,
            params![
                key,
                entry.name.trim(),
                entry.calories_per_100g,
                entry.protein_per_100g,
                entry.carbs_per_100g,
                entry.fat_per_100g,
                entry.unit_weight_grams,
                entry.category.map(|c| c.as_str()),
            ],
        )?;

        Self::get_by_name(conn, &key)?
            .ok_or_else(|| crate::db::DbError::NotFound(format!("ingredient {}", entry.name)))
    }

    /// Get an entry by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredient_lookup WHERE name_key = ?1")?;

        let result = stmt.query_row([ingredient_key(name)], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List entries, optionally filtered by a name fragment
    pub fn list(conn: &Connection, query: Option<&str>, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", ingredient_key(query.unwrap_or("")));
        let mut stmt = conn.prepare(
            "SELECT * FROM ingredient_lookup WHERE name_key LIKE ?1 ORDER BY name ASC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// In-memory lookup table handed to the scaling pipeline
#[derive(Debug, Clone, Default)]
pub struct IngredientLookup {
    entries: HashMap<String, LookupEntry>,
}

impl IngredientLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: LookupEntry) {
        self.entries.insert(ingredient_key(&entry.name), entry);
    }

    pub fn get(&self, name: &str) -> Option<&LookupEntry> {
        self.entries.get(&ingredient_key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of `ingredient` with canonical densities applied, if known
    pub fn resolve(&self, ingredient: &Ingredient) -> Ingredient {
        let Some(entry) = self.get(&ingredient.name) else {
            return ingredient.clone();
        };
        Ingredient {
            calories_per_100g: entry.calories_per_100g,
            protein_per_100g: entry.protein_per_100g,
            carbs_per_100g: entry.carbs_per_100g,
            fat_per_100g: entry.fat_per_100g,
            unit_weight_grams: entry.unit_weight_grams.or(ingredient.unit_weight_grams),
            category: entry.category.or(ingredient.category),
            ..ingredient.clone()
        }
    }

    /// Load the whole table from the database
    pub fn load(conn: &Connection) -> DbResult<Self> {
        let mut stmt = conn.prepare("SELECT * FROM ingredient_lookup")?;
        let entries = stmt
            .query_map([], LookupEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut lookup = Self::new();
        for entry in entries {
            lookup.insert(entry);
        }
        Ok(lookup)
    }
}

impl FromIterator<LookupEntry> for IngredientLookup {
    fn from_iter<I: IntoIterator<Item = LookupEntry>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for entry in iter {
            lookup.insert(entry);
        }
        lookup
    }
}

/// Normalized ingredient name: lowercase, single spaces
pub(crate) fn ingredient_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
