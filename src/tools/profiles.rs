//! User Profile MCP Tools
//!
//! Store and read the profiles scaling is personalized against.

use serde::Serialize;

use crate::db::Database;
use crate::models::{ActivityLevel, FitnessGoal, Gender, StoredProfile, UserProfile};
use crate::nutrition::{compute_scaling_factor, user_ttm};

/// Profile detail with the derived energy figures
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub weight: f64,
    pub height: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub fitness_goal: FitnessGoal,
    /// Maintenance plus goal adjustment, kcal
    pub daily_calories: f64,
    pub scaling_factor: f64,
    pub updated_at: String,
}

impl From<StoredProfile> for ProfileResponse {
    fn from(stored: StoredProfile) -> Self {
        let daily_calories = user_ttm(&stored.profile).round();
        let scaling_factor = (compute_scaling_factor(&stored.profile) * 1000.0).round() / 1000.0;
        Self {
            id: stored.id,
            email: stored.email,
            weight: stored.profile.weight,
            height: stored.profile.height,
            age: stored.profile.age,
            gender: stored.profile.gender,
            activity_level: stored.profile.activity_level,
            fitness_goal: stored.profile.fitness_goal,
            daily_calories,
            scaling_factor,
            updated_at: stored.updated_at,
        }
    }
}

/// Create or replace a user's profile
pub fn set_user_profile(db: &Database, email: &str, profile: UserProfile) -> Result<ProfileResponse, String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err("A valid email is required".to_string());
    }
    if !profile.weight.is_finite() || profile.weight < 0.0 {
        return Err("weight cannot be negative".to_string());
    }
    if !profile.height.is_finite() || profile.height < 0.0 {
        return Err("height cannot be negative".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = StoredProfile::upsert(&conn, email, &profile)
        .map_err(|e| format!("Failed to save profile: {}", e))?;

    tracing::info!(email = %stored.email, weight = stored.profile.weight, "profile saved");
    Ok(stored.into())
}

/// Get a user's profile
pub fn get_user_profile(db: &Database, email: &str) -> Result<Option<ProfileResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = StoredProfile::get_by_email(&conn, email)
        .map_err(|e| format!("Failed to get profile: {}", e))?;
    Ok(stored.map(ProfileResponse::from))
}

/// Profile used for scaling: the stored one, or defaults when none is stored
pub fn profile_or_default(db: &Database, email: Option<&str>) -> Result<UserProfile, String> {
    let Some(email) = email else {
        return Ok(UserProfile::default());
    };
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = StoredProfile::get_by_email(&conn, email)
        .map_err(|e| format!("Failed to get profile: {}", e))?;
    match stored {
        Some(stored) => Ok(stored.profile),
        None => {
            tracing::debug!(email, "no stored profile, using defaults");
            Ok(UserProfile::default())
        }
    }
}
