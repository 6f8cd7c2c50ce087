//! MealScale Status Tool
//!
//! Runtime status of the service, plus the usage guide handed to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Scaling workflow instructions for AI assistants
pub const SCALING_INSTRUCTIONS: &str = r#"
# MealScale Instructions

MealScale personalizes weekly meal plans. Every plan is written for a
100 kg, moderately active person on a maintenance goal; MealScale scales the
ingredient amounts to a specific user and reports how close each day lands to
that user's calorie and macro targets.

---

## Typical Workflow

1. **Store the user's profile** with `set_user_profile`
   - `email` identifies the user
   - `weight` (kg), `activity_level` (sedentary, moderate, very_active),
     `fitness_goal` (cut, maintain, bulk); height, age and gender are optional
2. **Pick a plan** with `list_nutrition_plans` / `get_nutrition_plan`
3. **Check the targets** with `compute_targets`
4. **Scale** a day with `scale_day` or the whole week with `scale_week`

Missing profile fields never fail: weight defaults to 100 kg, activity to
moderate and goal to maintain.

---

## Creating Plans

1. `create_nutrition_plan` with name, optional goal and baseline targets
   - Either absolute grams (`target_protein`, `target_carbs`, `target_fat`
     with `target_calories`) or a percentage split (`protein_pct`,
     `carbs_pct`, `fat_pct`; all three or none)
   - Plans named or tagged "carnivore"/"zero carb" fall back to a 35/5/60
     split when they carry no targets
2. `import_weekly_plan` with the plan ID and the week as JSON:

```json
{
  "maandag": {
    "breakfast": {
      "ingredients": [
        {"name": "Havermout", "unit": "g", "amount": 80,
         "calories_per_100g": 370, "protein_per_100g": 13,
         "carbs_per_100g": 60, "fat_per_100g": 7}
      ],
      "nutrition": {"calories": 296, "protein": 10.4, "carbs": 48, "fat": 5.6}
    }
  }
}
```

- Days: maandag .. zondag (English names are accepted)
- Slots: breakfast, morning-snack, lunch, lunch-snack, dinner, evening-snack
- Units: g, ml, per_100g, per_30g, tablespoon/el, teaspoon/tl, cup/kop,
  piece/stuk, slice/plakje, handful/handje. A gram weight may be attached to
  discrete units: `"stuk (60g)"`
- `nutrition` is optional; when present it is the author's total for the meal
- An optional `category` (egg, cheese, dairy, meat, fat, carb, other)
  overrides the name-based classification

---

## How Scaling Works

- Scaling factor = user calories / 2860, clamped to 0.5 .. 1.5
- Grams, ml and portions round to whole units, spoons to halves, cups to
  one decimal
- Pieces, slices and handfuls stay whole: rounded up when scaling up,
  rounded down (but never below 1) when scaling down
- Category limits: max 3 eggs, 50 g fat, 120 g cheese, 400 ml dairy,
  75..600 g meat, at least 50 g of a carb staple
- No ingredient moves below 40% or above 160% of its baseline amount
- Afterwards calories are redistributed over the adjustable (non-piece)
  ingredients, and protein/carbs/fat are balanced through their typical
  sources

Each day reports a status per metric: green (within 5%), amber (within
10%) or red.

---

## Ingredient Lookup

`upsert_ingredient` stores canonical per-100g values for an ingredient name.
When a plan line matches (case-insensitive), the lookup values replace the
line's own values during scaling.

## Custom Amounts

`set_custom_amount` stores a user's own baseline for one ingredient on one
day and meal. It replaces the plan's amount before scaling.
`clear_custom_amounts` removes them for a whole plan or one day.
"#;

/// Runtime status of the MealScale service
#[derive(Debug, Clone, Serialize)]
pub struct MealScaleStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> MealScaleStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MealScaleStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/mealscale.db"));
        let status = tracker.get_status();
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }
}
