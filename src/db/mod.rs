//! Database module
//!
//! Handles SQLite connection and migrations.

use std::path::PathBuf;

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// Environment variable overriding the database location
pub const DATABASE_PATH_ENV: &str = "MEALSCALE_DATABASE_PATH";

/// Get the database path from environment or use default
pub fn default_database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(root) = path.parent().and_then(|p| p.parent()) {
                    path = root.to_path_buf();
                }
            }

            path.push("data");
            path.push("mealscale.db");
            path
        })
}
