//! MealScale Library
//!
//! Scales weekly meal plans written for a 100 kg reference person to an
//! individual's weight, activity level and goal.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
