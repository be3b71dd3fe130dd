use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NutritionError, ParseKindError, Result};

/// Current on-disk format of [`Journal`].
pub const JOURNAL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(pub Uuid);

impl FoodId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for FoodId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealId(pub Uuid);

impl MealId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MealId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

// --- Nutrients ---

/// Energy and macronutrients, plus the optional secondary nutrients a catalog
/// entry may carry. Secondary nutrients stay `None` until some contribution
/// actually reports them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientVector {
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
}

impl NutrientVector {
    pub const ZERO: Self = Self {
        energy_kcal: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
        fiber_g: None,
        sugar_g: None,
        sodium_mg: None,
    };

    #[must_use]
    pub fn new(energy_kcal: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            energy_kcal,
            protein_g,
            carbs_g,
            fat_g,
            ..Self::ZERO
        }
    }

    /// Component-wise scale by a serving multiplier.
    #[must_use]
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            energy_kcal: self.energy_kcal * multiplier,
            protein_g: self.protein_g * multiplier,
            carbs_g: self.carbs_g * multiplier,
            fat_g: self.fat_g * multiplier,
            fiber_g: self.fiber_g.map(|v| v * multiplier),
            sugar_g: self.sugar_g.map(|v| v * multiplier),
            sodium_mg: self.sodium_mg.map(|v| v * multiplier),
        }
    }

    #[must_use]
    pub fn macros(&self) -> Macros {
        Macros {
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
        }
    }

    /// True when nothing has contributed to this vector.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

fn add_optional(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

impl Add for NutrientVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            energy_kcal: self.energy_kcal + rhs.energy_kcal,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
            fiber_g: add_optional(self.fiber_g, rhs.fiber_g),
            sugar_g: add_optional(self.sugar_g, rhs.sugar_g),
            sodium_mg: add_optional(self.sodium_mg, rhs.sodium_mg),
        }
    }
}

impl AddAssign for NutrientVector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for NutrientVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a NutrientVector> for NutrientVector {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Protein, carbohydrate, and fat in grams.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Macros {
    #[must_use]
    pub fn minus(&self, other: &Macros) -> Macros {
        Macros {
            protein_g: self.protein_g - other.protein_g,
            carbs_g: self.carbs_g - other.carbs_g,
            fat_g: self.fat_g - other.fat_g,
        }
    }
}

// --- Food catalog ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Serving {
    pub amount: f64,
    pub unit: String,
}

impl Serving {
    #[must_use]
    pub fn new(amount: f64, unit: &str) -> Self {
        Self {
            amount,
            unit: unit.to_string(),
        }
    }
}

impl fmt::Display for Serving {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.fract() == 0.0 {
            write!(f, "{:.0}{}", self.amount, self.unit)
        } else {
            write!(f, "{}{}", self.amount, self.unit)
        }
    }
}

/// A named household measure with a known size, e.g. `1 piece = 50 g`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<FoodId>,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving: Serving,
    pub nutrients: NutrientVector,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub portions: Vec<Portion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density_g_per_ml: Option<f64>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

fn first_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFood {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving: Serving,
    pub nutrients: NutrientVector,
    pub portions: Vec<Portion>,
    pub density_g_per_ml: Option<f64>,
    pub source: String,
}

impl From<&Food> for NewFood {
    fn from(food: &Food) -> Self {
        Self {
            name: food.name.clone(),
            brand: food.brand.clone(),
            barcode: food.barcode.clone(),
            serving: food.serving.clone(),
            nutrients: food.nutrients,
            portions: food.portions.clone(),
            density_g_per_ml: food.density_g_per_ml,
            source: food.source.clone(),
        }
    }
}

// --- Meals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Other,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
        MealType::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Other => "other",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        MealType::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| ParseKindError {
                kind: "meal type",
                value: s.to_string(),
                expected: "breakfast, lunch, dinner, snack, other",
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub food_id: FoodId,
    pub quantity: f64,
    pub unit: String,
}

impl MealItem {
    #[must_use]
    pub fn new(food_id: FoodId, quantity: f64, unit: &str) -> Self {
        Self {
            food_id,
            quantity,
            unit: unit.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    pub meal_type: MealType,
    pub consumed_at: DateTime<Utc>,
    pub items: Vec<MealItem>,
    /// Cached projection of `items`; only ever written by `refresh_totals`.
    #[serde(default)]
    pub totals: NutrientVector,
}

impl Meal {
    #[must_use]
    pub fn new(meal_type: MealType, consumed_at: DateTime<Utc>) -> Self {
        Self {
            id: MealId::random(),
            meal_type,
            consumed_at,
            items: Vec::new(),
            totals: NutrientVector::ZERO,
        }
    }

    /// Calendar day of consumption as seen from `tz`.
    #[must_use]
    pub fn local_date(&self, tz: &FixedOffset) -> NaiveDate {
        self.consumed_at.with_timezone(tz).date_naive()
    }
}

// --- Profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(ParseKindError {
                kind: "sex",
                value: s.to_string(),
                expected: "male, female",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl FromStr for ActivityLevel {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            _ => Err(ParseKindError {
                kind: "activity level",
                value: s.to_string(),
                expected: "sedentary, light, moderate, active, very_active",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalDirection {
    Lose,
    Maintain,
    Gain,
}

impl FromStr for GoalDirection {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lose" => Ok(GoalDirection::Lose),
            "maintain" => Ok(GoalDirection::Maintain),
            "gain" => Ok(GoalDirection::Gain),
            _ => Err(ParseKindError {
                kind: "goal",
                value: s.to_string(),
                expected: "lose, maintain, gain",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biometrics {
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: GoalDirection,
}

impl Biometrics {
    /// Age in completed years on `on`, or `None` if `on` precedes the birth date.
    #[must_use]
    pub fn age_on(&self, on: NaiveDate) -> Option<u32> {
        on.years_since(self.date_of_birth)
    }

    /// Check the ranges the energy equation is valid for and return the age
    /// used for the calculation.
    pub fn validate(&self, on: NaiveDate) -> Result<u32> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 || self.weight_kg > 300.0 {
            return Err(NutritionError::InvalidProfile(
                "weight must be between 0 and 300 kg".to_string(),
            ));
        }
        if !self.height_cm.is_finite() || self.height_cm <= 0.0 || self.height_cm > 300.0 {
            return Err(NutritionError::InvalidProfile(
                "height must be between 0 and 300 cm".to_string(),
            ));
        }
        match self.age_on(on) {
            Some(age) if (10..=120).contains(&age) => Ok(age),
            Some(age) => Err(NutritionError::InvalidProfile(format!(
                "age must be between 10 and 120 years (got {age})"
            ))),
            None => Err(NutritionError::InvalidProfile(format!(
                "date of birth {} is after {on}",
                self.date_of_birth
            ))),
        }
    }
}

/// Stored daily targets. Every field is already rounded to a whole kcal or gram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionGoals {
    pub baseline_kcal: f64,
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub computed_on: NaiveDate,
}

impl NutritionGoals {
    #[must_use]
    pub fn macros(&self) -> Macros {
        Macros {
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub biometrics: Biometrics,
    pub goals: NutritionGoals,
}

// --- Derived stats ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealTypeSubtotal {
    pub meal_type: MealType,
    pub meal_count: usize,
    pub totals: NutrientVector,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub meal_count: usize,
    pub totals: NutrientVector,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub by_meal_type: Vec<MealTypeSubtotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_goal_kcal: Option<f64>,
    /// Goal minus eaten; negative on an over-goal day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_kcal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_macros: Option<Macros>,
}

impl DailyStat {
    #[must_use]
    pub fn weekday(&self) -> chrono::Weekday {
        self.date.weekday()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: usize,
    pub logged_days: usize,
    pub totals: NutrientVector,
    /// Mean over logged days only; zero when nothing was logged.
    pub daily_average: NutrientVector,
}

// --- Journal (export / import) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            version: JOURNAL_VERSION,
            exported_at: None,
            foods: Vec::new(),
            meals: Vec::new(),
            profile: None,
        }
    }
}

// --- Validation ---

/// A logged quantity must be finite and non-negative; zero is allowed.
pub fn validate_quantity(quantity: f64) -> Result<()> {
    if quantity.is_finite() && quantity >= 0.0 {
        Ok(())
    } else {
        Err(NutritionError::InvalidQuantity { quantity })
    }
}

pub fn validate_serving(serving: &Serving) -> Result<()> {
    if !serving.amount.is_finite() || serving.amount <= 0.0 {
        return Err(NutritionError::InvalidServing(format!(
            "amount must be greater than 0 (got {})",
            serving.amount
        )));
    }
    if serving.unit.trim().is_empty() {
        return Err(NutritionError::InvalidServing(
            "unit must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_nutrient(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(NutritionError::InvalidFood(format!(
            "{name} must be a non-negative number"
        )))
    }
}

/// Validate food data: name must not be empty, nutrients must be non-negative,
/// serving and portion sizes must be positive.
pub fn validate_food_data(food: &NewFood) -> Result<()> {
    if food.name.trim().is_empty() {
        return Err(NutritionError::InvalidFood(
            "food name must not be empty".to_string(),
        ));
    }
    validate_serving(&food.serving)?;
    let n = &food.nutrients;
    check_nutrient("energy_kcal", n.energy_kcal)?;
    check_nutrient("protein_g", n.protein_g)?;
    check_nutrient("carbs_g", n.carbs_g)?;
    check_nutrient("fat_g", n.fat_g)?;
    for (name, value) in [
        ("fiber_g", n.fiber_g),
        ("sugar_g", n.sugar_g),
        ("sodium_mg", n.sodium_mg),
    ] {
        if let Some(v) = value {
            check_nutrient(name, v)?;
        }
    }
    for portion in &food.portions {
        if portion.name.trim().is_empty() {
            return Err(NutritionError::InvalidFood(
                "portion name must not be empty".to_string(),
            ));
        }
        if !portion.amount.is_finite() || portion.amount <= 0.0 {
            return Err(NutritionError::InvalidFood(format!(
                "portion '{}' must have an amount greater than 0",
                portion.name
            )));
        }
    }
    if food
        .density_g_per_ml
        .is_some_and(|d| !d.is_finite() || d <= 0.0)
    {
        return Err(NutritionError::InvalidFood(
            "density_g_per_ml must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_food() -> NewFood {
        NewFood {
            name: "Chicken Breast".to_string(),
            brand: None,
            barcode: None,
            serving: Serving::new(100.0, "g"),
            nutrients: NutrientVector::new(165.0, 31.0, 0.0, 3.6),
            portions: vec![],
            density_g_per_ml: None,
            source: "manual".to_string(),
        }
    }

    #[test]
    fn test_valid_meal_types() {
        assert_eq!("breakfast".parse::<MealType>().unwrap(), MealType::Breakfast);
        assert_eq!("lunch".parse::<MealType>().unwrap(), MealType::Lunch);
        assert_eq!("dinner".parse::<MealType>().unwrap(), MealType::Dinner);
        assert_eq!("snack".parse::<MealType>().unwrap(), MealType::Snack);
        assert_eq!("other".parse::<MealType>().unwrap(), MealType::Other);
    }

    #[test]
    fn test_invalid_meal_type() {
        assert!("brunch".parse::<MealType>().is_err());
        assert!("".parse::<MealType>().is_err());
    }

    #[test]
    fn test_meal_type_case_insensitive() {
        assert_eq!(" Lunch ".parse::<MealType>().unwrap(), MealType::Lunch);
        assert_eq!("BREAKFAST".parse::<MealType>().unwrap(), MealType::Breakfast);
    }

    #[test]
    fn test_parse_activity_levels() {
        assert_eq!(
            "very-active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::VeryActive
        );
        assert_eq!(
            "Moderate".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::Moderate
        );
        let err = "couch".parse::<ActivityLevel>().unwrap_err();
        assert!(err.to_string().contains("sedentary"));
    }

    #[test]
    fn test_parse_sex_and_goal() {
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("gain".parse::<GoalDirection>().unwrap(), GoalDirection::Gain);
        assert!("bulk".parse::<GoalDirection>().is_err());
    }

    #[test]
    fn test_nutrient_vector_scale() {
        let mut n = NutrientVector::new(50.0, 1.0, 10.0, 0.5);
        n.fiber_g = Some(2.0);
        let scaled = n.scale(2.0);
        assert!((scaled.energy_kcal - 100.0).abs() < f64::EPSILON);
        assert!((scaled.carbs_g - 20.0).abs() < f64::EPSILON);
        assert_eq!(scaled.fiber_g, Some(4.0));
        assert_eq!(scaled.sugar_g, None);
    }

    #[test]
    fn test_nutrient_vector_add_keeps_unknown_secondaries() {
        let mut a = NutrientVector::new(10.0, 1.0, 1.0, 1.0);
        a.sodium_mg = Some(100.0);
        let b = NutrientVector::new(20.0, 2.0, 2.0, 2.0);
        let sum = a + b;
        assert!((sum.energy_kcal - 30.0).abs() < f64::EPSILON);
        assert_eq!(sum.sodium_mg, Some(100.0));
        assert_eq!(sum.fiber_g, None);
    }

    #[test]
    fn test_nutrient_vector_sum_empty_is_zero() {
        let total: NutrientVector = Vec::<NutrientVector>::new().iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0.0).is_ok());
        assert!(validate_quantity(150.0).is_ok());
        assert!(matches!(
            validate_quantity(-1.0),
            Err(NutritionError::InvalidQuantity { .. })
        ));
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_quantity(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_food_data_valid() {
        assert!(validate_food_data(&sample_food()).is_ok());
    }

    #[test]
    fn test_validate_food_data_empty_name() {
        let mut food = sample_food();
        food.name = "  ".to_string();
        assert!(validate_food_data(&food).is_err());
    }

    #[test]
    fn test_validate_food_data_negative_calories() {
        let mut food = sample_food();
        food.nutrients.energy_kcal = -50.0;
        assert!(validate_food_data(&food).is_err());
    }

    #[test]
    fn test_validate_food_data_zero_serving() {
        let mut food = sample_food();
        food.serving.amount = 0.0;
        assert!(matches!(
            validate_food_data(&food),
            Err(NutritionError::InvalidServing(_))
        ));
    }

    #[test]
    fn test_validate_food_data_bad_portion() {
        let mut food = sample_food();
        food.portions.push(Portion {
            name: "piece".to_string(),
            amount: -5.0,
            unit: "g".to_string(),
        });
        assert!(validate_food_data(&food).is_err());
    }

    #[test]
    fn test_biometrics_age_and_validation() {
        let bio = Biometrics {
            sex: Sex::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            height_cm: 165.0,
            weight_kg: 60.0,
            activity_level: ActivityLevel::Light,
            goal: GoalDirection::Maintain,
        };
        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(bio.validate(before_birthday).unwrap(), 33);
        assert_eq!(bio.validate(on_birthday).unwrap(), 34);

        let mut heavy = bio.clone();
        heavy.weight_kg = 400.0;
        assert!(heavy.validate(on_birthday).is_err());

        let unborn = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
        assert!(bio.validate(unborn).is_err());
    }

    #[test]
    fn test_meal_local_date_respects_offset() {
        let at = DateTime::parse_from_rfc3339("2024-03-10T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let meal = Meal::new(MealType::Dinner, at);
        let utc = FixedOffset::east_opt(0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            meal.local_date(&utc),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert_eq!(
            meal.local_date(&plus_two),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_journal_roundtrip_defaults() {
        let json = r#"{"version":1}"#;
        let journal: Journal = serde_json::from_str(json).unwrap();
        assert!(journal.foods.is_empty());
        assert!(journal.meals.is_empty());
        assert!(journal.profile.is_none());
    }
}
