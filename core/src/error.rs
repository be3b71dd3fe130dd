use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::{FoodId, MealId};

/// Hard failures raised by the nutrition engine and the service layer.
///
/// Every variant aborts the single computation it occurs in; callers never
/// receive a partial total alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    #[error("Invalid quantity {quantity}: must be a finite, non-negative number")]
    InvalidQuantity { quantity: f64 },

    #[error("Unit '{unit}' cannot be converted to serving unit '{serving_unit}'")]
    UnsupportedUnit { unit: String, serving_unit: String },

    #[error("Unknown food {0}")]
    UnknownFood(FoodId),

    #[error("Invalid serving size: {0}")]
    InvalidServing(String),

    #[error("Invalid food: {0}")]
    InvalidFood(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid nutrition policy: {0}")]
    InvalidPolicy(&'static str),

    #[error("Meal {0} not found")]
    UnknownMeal(MealId),

    #[error("Meal {meal} has no item at position {index}")]
    UnknownItem { meal: MealId, index: usize },

    #[error("Food {0} is referenced by logged meals and cannot be deleted")]
    FoodInUse(FoodId),

    #[error("Unsupported journal version {0}")]
    UnsupportedVersion(u32),

    #[error("{day_count} days from {start} run past the last representable date")]
    DateOutOfRange { start: NaiveDate, day_count: u32 },
}

pub type Result<T> = std::result::Result<T, NutritionError>;

/// A string did not name any variant of one of the closed enumerations
/// (meal type, sex, activity level, goal direction).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} '{value}'. Must be one of: {expected}")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Non-fatal findings reported next to a successful goal computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum GoalWarning {
    /// Protein and fat allocations exceed the energy goal; the carbohydrate
    /// target was clamped to zero.
    CarbohydrateUnderflow { shortfall_kcal: f64 },
}

impl fmt::Display for GoalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CarbohydrateUnderflow { shortfall_kcal } => write!(
                f,
                "Protein and fat targets exceed the energy goal by {shortfall_kcal:.0} kcal; \
                 carbohydrate target clamped to 0g"
            ),
        }
    }
}
