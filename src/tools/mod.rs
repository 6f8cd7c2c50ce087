//! MealScale Tools module
//!
//! Tool implementations behind the MCP server.

pub mod plans;
pub mod profiles;
pub mod scaling;
pub mod status;
