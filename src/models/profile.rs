//! User profile model
//!
//! The personal data the scaling engine personalizes against, plus its
//! persisted form keyed by email.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Body weight assumed when a profile has none
pub const DEFAULT_WEIGHT_KG: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" | "vrouw" | "v" => Gender::Female,
            _ => Gender::Male,
        }
    }
}

/// Daily activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Moderate,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    /// Lenient parse; anything unknown is moderate
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "sedentary" | "sedentair" | "low" | "laag" | "zittend" => ActivityLevel::Sedentary,
            "very_active" | "veryactive" | "zeer_actief" | "high" | "hoog" | "active"
            | "actief" => ActivityLevel::VeryActive,
            _ => ActivityLevel::Moderate,
        }
    }

    /// Multiplier on `weight × 22` for maintenance calories
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.1,
            ActivityLevel::Moderate => 1.3,
            ActivityLevel::VeryActive => 1.6,
        }
    }
}

impl From<String> for ActivityLevel {
    fn from(s: String) -> Self {
        ActivityLevel::from_str(&s)
    }
}

/// Body-composition goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FitnessGoal {
    Cut,
    #[default]
    Maintain,
    Bulk,
}

impl FitnessGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessGoal::Cut => "cut",
            FitnessGoal::Maintain => "maintain",
            FitnessGoal::Bulk => "bulk",
        }
    }

    /// Lenient parse; anything unknown is maintain
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "cut" | "lose" | "lose_weight" | "afvallen" | "droogtrainen" => FitnessGoal::Cut,
            "bulk" | "gain" | "gain_weight" | "aankomen" | "spiermassa" => FitnessGoal::Bulk,
            _ => FitnessGoal::Maintain,
        }
    }

    /// Daily kcal added to maintenance
    pub fn calorie_adjustment(&self) -> f64 {
        match self {
            FitnessGoal::Cut => -500.0,
            FitnessGoal::Maintain => 0.0,
            FitnessGoal::Bulk => 400.0,
        }
    }
}

impl From<String> for FitnessGoal {
    fn from(s: String) -> Self {
        FitnessGoal::from_str(&s)
    }
}

/// Personal data used for target and scaling calculations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub weight: f64, // kg
    #[serde(default)]
    pub height: f64, // cm
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub fitness_goal: FitnessGoal,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT_KG,
            height: 0.0,
            age: 0,
            gender: Gender::default(),
            activity_level: ActivityLevel::default(),
            fitness_goal: FitnessGoal::default(),
        }
    }
}

impl UserProfile {
    pub fn new(weight: f64, activity_level: ActivityLevel, fitness_goal: FitnessGoal) -> Self {
        Self {
            weight,
            activity_level,
            fitness_goal,
            ..Default::default()
        }
    }

    /// Weight used in calculations; missing or invalid weights become 100 kg
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            DEFAULT_WEIGHT_KG
        }
    }
}

/// A profile as persisted for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: i64,
    pub email: String,
    pub profile: UserProfile,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            profile: UserProfile {
                weight: row.get("weight")?,
                height: row.get("height")?,
                age: row.get("age")?,
                gender: Gender::from_str(row.get::<_, String>("gender")?.as_str()),
                activity_level: ActivityLevel::from_str(
                    row.get::<_, String>("activity_level")?.as_str(),
                ),
                fitness_goal: FitnessGoal::from_str(row.get::<_, String>("fitness_goal")?.as_str()),
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get a profile by email (case-insensitive)
    pub fn get_by_email(conn: &Connection, email: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profiles WHERE email = ?1")?;

        let result = stmt.query_row([normalize_email(email)], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace the profile for an email
    pub fn upsert(conn: &Connection, email: &str, profile: &UserProfile) -> DbResult<Self> {
        let email = normalize_email(email);
        conn.execute(
            r#"
            INSERT INTO user_profiles (email, weight, height, age, gender, activity_level, fitness_goal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(email) DO UPDATE SET
                weight = excluded.weight,
                height = excluded.height,
                age = excluded.age,
                gender = excluded.gender,
                activity_level = excluded.activity_level,
                fitness_goal = excluded.fitness_goal,
                updated_at = datetime('now')
            "#,
            params![
                email,
                profile.weight,
                profile.height,
                profile.age,
                profile.gender.as_str(),
                profile.activity_level.as_str(),
                profile.fitness_goal.as_str(),
            ],
        )?;

        Self::get_by_email(conn, &email)?
            .ok_or_else(|| crate::db::DbError::NotFound(format!("profile for {}", email)))
    }

    /// List all stored profiles ordered by email
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profiles ORDER BY email ASC")?;
        let profiles = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
