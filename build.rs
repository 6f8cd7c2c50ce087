//! Build script for MealScale
//!
//! Bumps the local build counter and embeds it with a UTC timestamp.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn read_counter(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let counter = Path::new(COUNTER_FILE);
    let build = read_counter(counter) + 1;
    if let Err(e) = fs::write(counter, build.to_string()) {
        println!("cargo:warning=could not persist build number: {}", e);
    }

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=MEALSCALE_BUILD_NUMBER={}", build);
    println!("cargo:rustc-env=MEALSCALE_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:warning=MealScale Build #{} at {}", build, timestamp);
}
