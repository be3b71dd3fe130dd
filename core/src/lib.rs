pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod goals;
pub mod models;
pub mod service;
pub mod stats;
pub mod units;

pub use error::{GoalWarning, NutritionError, Result};
pub use goals::NutritionPolicy;
pub use service::NutritionService;
