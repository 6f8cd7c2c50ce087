//! Per-user custom ingredient amounts
//!
//! A custom amount replaces a line's authored baseline before scaling. They
//! are stored per user and plan, keyed by day, slot and ingredient name.

use std::collections::HashMap;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::lookup::ingredient_key;
use super::{MealSlot, Weekday};

/// One stored override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAmount {
    pub day: Weekday,
    pub slot: MealSlot,
    pub ingredient: String,
    pub amount: f64,
}

/// Overrides keyed by (day, slot, ingredient name)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomAmounts {
    amounts: HashMap<(Weekday, MealSlot, String), f64>,
}

impl CustomAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: Weekday, slot: MealSlot, ingredient: &str, amount: f64) {
        self.amounts.insert((day, slot, ingredient_key(ingredient)), amount);
    }

    /// Override for a line, ignoring negative or non-finite values
    pub fn get(&self, day: Weekday, slot: MealSlot, ingredient: &str) -> Option<f64> {
        self.amounts
            .get(&(day, slot, ingredient_key(ingredient)))
            .copied()
            .filter(|a| a.is_finite() && *a >= 0.0)
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Load the overrides a user holds for a plan
    pub fn load(conn: &Connection, email: &str, plan_id: i64) -> DbResult<Self> {
        let mut stmt = conn.prepare(
            "SELECT day, slot, ingredient, amount FROM custom_amounts WHERE email = ?1 AND plan_id = ?2",
        )?;
        let rows = stmt.query_map(params![normalize_email(email), plan_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut amounts = Self::new();
        for row in rows {
            let (day, slot, ingredient, amount) = row?;
            match (Weekday::parse(&day), MealSlot::parse(&slot)) {
                (Some(day), Some(slot)) => amounts.insert(day, slot, &ingredient, amount),
                _ => tracing::warn!(%day, %slot, "ignoring custom amount with unknown day or slot"),
            }
        }
        Ok(amounts)
    }

    /// Store an override
    pub fn set(conn: &Connection, email: &str, plan_id: i64, entry: &CustomAmount) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO custom_amounts (email, plan_id, day, slot, ingredient, amount)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(email, plan_id, day, slot, ingredient) DO UPDATE SET
                amount = excluded.amount,
                updated_at = datetime('now')
            "#,
            params![
                normalize_email(email),
                plan_id,
                entry.day.as_str(),
                entry.slot.as_str(),
                ingredient_key(&entry.ingredient),
                entry.amount,
            ],
        )?;
        Ok(())
    }

    /// Remove overrides; with `day` set only that day's are removed
    pub fn clear(conn: &Connection, email: &str, plan_id: i64, day: Option<Weekday>) -> DbResult<usize> {
        let removed = match day {
            Some(day) => conn.execute(
                "DELETE FROM custom_amounts WHERE email = ?1 AND plan_id = ?2 AND day = ?3",
                params![normalize_email(email), plan_id, day.as_str()],
            )?,
            None => conn.execute(
                "DELETE FROM custom_amounts WHERE email = ?1 AND plan_id = ?2",
                params![normalize_email(email), plan_id],
            )?,
        };
        Ok(removed)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
