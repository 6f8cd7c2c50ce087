//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USER PROFILES
        -- Personal data scaling is computed against
        -- ============================================
        CREATE TABLE user_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,          -- lowercased, trimmed
            weight REAL NOT NULL DEFAULT 100,    -- kg
            height REAL NOT NULL DEFAULT 0,      -- cm
            age INTEGER NOT NULL DEFAULT 0,
            gender TEXT NOT NULL DEFAULT 'male',
            activity_level TEXT NOT NULL DEFAULT 'moderate',
            fitness_goal TEXT NOT NULL DEFAULT 'maintain',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- NUTRITION PLANS
        -- Baseline targets for the 100 kg reference
        -- ============================================
        CREATE TABLE nutrition_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            goal TEXT,
            target_calories REAL NOT NULL DEFAULT 0,
            target_protein REAL NOT NULL DEFAULT 0,   -- grams
            target_carbs REAL NOT NULL DEFAULT 0,     -- grams
            target_fat REAL NOT NULL DEFAULT 0,       -- grams
            protein_pct REAL,                         -- nullable, all three or none
            carbs_pct REAL,
            fat_pct REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_nutrition_plans_name ON nutrition_plans(name);

        -- ============================================
        -- PLAN INGREDIENTS
        -- Ingredient lines per plan, day and meal slot
        -- ============================================
        CREATE TABLE plan_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL REFERENCES nutrition_plans(id) ON DELETE CASCADE,
            day TEXT NOT NULL,                   -- "maandag".."zondag"
            slot TEXT NOT NULL,                  -- "breakfast".."evening-snack"
            position INTEGER NOT NULL,           -- order inside the meal
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            amount REAL NOT NULL,
            calories_per_100g REAL NOT NULL DEFAULT 0,
            protein_per_100g REAL NOT NULL DEFAULT 0,
            carbs_per_100g REAL NOT NULL DEFAULT 0,
            fat_per_100g REAL NOT NULL DEFAULT 0,
            unit_weight_grams REAL,              -- discrete units only
            category TEXT                        -- overrides name classification
        );

        CREATE INDEX idx_plan_ingredients_plan ON plan_ingredients(plan_id, day, slot);

        -- ============================================
        -- PLAN MEAL NUTRITION
        -- Author's per-meal totals at the baseline
        -- ============================================
        CREATE TABLE plan_meal_nutrition (
            plan_id INTEGER NOT NULL REFERENCES nutrition_plans(id) ON DELETE CASCADE,
            day TEXT NOT NULL,
            slot TEXT NOT NULL,
            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,
            carbs REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (plan_id, day, slot)
        );

        -- ============================================
        -- INGREDIENT LOOKUP
        -- Canonical per-100g densities by name
        -- ============================================
        CREATE TABLE ingredient_lookup (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name_key TEXT NOT NULL UNIQUE,       -- lowercased, whitespace-collapsed
            name TEXT NOT NULL,
            calories_per_100g REAL NOT NULL DEFAULT 0,
            protein_per_100g REAL NOT NULL DEFAULT 0,
            carbs_per_100g REAL NOT NULL DEFAULT 0,
            fat_per_100g REAL NOT NULL DEFAULT 0,
            unit_weight_grams REAL,
            category TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- CUSTOM AMOUNTS
        -- Per-user baseline overrides
        -- ============================================
        CREATE TABLE custom_amounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            plan_id INTEGER NOT NULL REFERENCES nutrition_plans(id) ON DELETE CASCADE,
            day TEXT NOT NULL,
            slot TEXT NOT NULL,
            ingredient TEXT NOT NULL,            -- lowercased ingredient name
            amount REAL NOT NULL CHECK(amount >= 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(email, plan_id, day, slot, ingredient)
        );

        CREATE INDEX idx_custom_amounts_user_plan ON custom_amounts(email, plan_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
