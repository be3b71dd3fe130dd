//! Unit conversion: turns a logged `quantity unit` pair into a multiplier
//! against a food's canonical serving.

use crate::error::{NutritionError, Result};
use crate::models::{Food, Portion, Serving, validate_quantity, validate_serving};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    /// Base unit: gram.
    Mass,
    /// Base unit: milliliter.
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Milligram,
    Gram,
    Kilogram,
    Ounce,
    Pound,
    Milliliter,
    Liter,
    Teaspoon,
    Tablespoon,
    Cup,
    FluidOunce,
}

impl Unit {
    /// Recognize a unit name (case-insensitive, surrounding whitespace ignored).
    #[must_use]
    pub fn parse(unit: &str) -> Option<Unit> {
        let lower = normalize_unit(unit);
        match lower.as_str() {
            "mg" | "milligram" | "milligrams" => Some(Unit::Milligram),
            "g" | "gram" | "grams" => Some(Unit::Gram),
            "kg" | "kilogram" | "kilograms" => Some(Unit::Kilogram),
            "oz" | "ounce" | "ounces" => Some(Unit::Ounce),
            "lb" | "lbs" | "pound" | "pounds" => Some(Unit::Pound),
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Some(Unit::Milliliter)
            }
            "l" | "liter" | "liters" | "litre" | "litres" => Some(Unit::Liter),
            "tsp" | "teaspoon" | "teaspoons" => Some(Unit::Teaspoon),
            "tbsp" | "tablespoon" | "tablespoons" => Some(Unit::Tablespoon),
            "cup" | "cups" => Some(Unit::Cup),
            "fl oz" | "floz" | "fluid ounce" | "fluid ounces" => Some(Unit::FluidOunce),
            _ => None,
        }
    }

    #[must_use]
    pub fn family(self) -> UnitFamily {
        match self {
            Unit::Milligram | Unit::Gram | Unit::Kilogram | Unit::Ounce | Unit::Pound => {
                UnitFamily::Mass
            }
            Unit::Milliliter
            | Unit::Liter
            | Unit::Teaspoon
            | Unit::Tablespoon
            | Unit::Cup
            | Unit::FluidOunce => UnitFamily::Volume,
        }
    }

    /// Size of one of this unit in its family's base unit (g or ml).
    #[must_use]
    pub fn base_amount(self) -> f64 {
        match self {
            Unit::Milligram => 0.001,
            Unit::Gram | Unit::Milliliter => 1.0,
            Unit::Kilogram | Unit::Liter => 1000.0,
            Unit::Ounce => 28.35,
            Unit::Pound => 453.592,
            Unit::Teaspoon => 5.0,
            Unit::Tablespoon => 15.0,
            Unit::Cup => 240.0,
            Unit::FluidOunce => 29.5735,
        }
    }
}

#[must_use]
pub fn normalize_unit(unit: &str) -> String {
    unit.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_serving_unit(unit: &str) -> bool {
    matches!(unit, "serving" | "servings")
}

/// Amount of base unit (g or ml) in one `unit`, using the food's own portion
/// table when the name is not a standard unit.
fn resolve_base(unit: &str, portions: &[Portion]) -> Option<(UnitFamily, f64)> {
    if let Some(u) = Unit::parse(unit) {
        return Some((u.family(), u.base_amount()));
    }
    let portion = find_portion(unit, portions)?;
    let u = Unit::parse(&portion.unit)?;
    Some((u.family(), portion.amount * u.base_amount()))
}

fn find_portion<'a>(unit: &str, portions: &'a [Portion]) -> Option<&'a Portion> {
    portions.iter().find(|p| {
        let name = normalize_unit(&p.name);
        name == unit || format!("{name}s") == unit || format!("{name}es") == unit
    })
}

fn unsupported(unit: &str, serving: &Serving) -> NutritionError {
    NutritionError::UnsupportedUnit {
        unit: unit.trim().to_string(),
        serving_unit: serving.unit.clone(),
    }
}

/// Serving multiplier for `quantity unit` against `serving`, with no
/// food-specific portions or density available.
pub fn convert(quantity: f64, unit: &str, serving: &Serving) -> Result<f64> {
    multiplier(quantity, unit, serving, &[], None)
}

/// Serving multiplier for `quantity unit` of `food`. The food's portion table
/// and density open count→mass and mass↔volume paths that plain `convert`
/// rejects.
pub fn convert_for_food(quantity: f64, unit: &str, food: &Food) -> Result<f64> {
    multiplier(
        quantity,
        unit,
        &food.serving,
        &food.portions,
        food.density_g_per_ml,
    )
}

fn multiplier(
    quantity: f64,
    unit: &str,
    serving: &Serving,
    portions: &[Portion],
    density_g_per_ml: Option<f64>,
) -> Result<f64> {
    validate_quantity(quantity)?;
    validate_serving(serving)?;

    let item_unit = normalize_unit(unit);
    let serving_unit = normalize_unit(&serving.unit);

    let result = if item_unit == serving_unit {
        quantity / serving.amount
    } else if is_serving_unit(&item_unit) {
        quantity
    } else if let Some(portion) = find_portion(&item_unit, portions)
        .filter(|p| normalize_unit(&p.unit) == serving_unit)
    {
        // Portion expressed directly in the serving's own (possibly non-standard) unit.
        quantity * portion.amount / serving.amount
    } else {
        let (item_family, item_base) =
            resolve_base(&item_unit, portions).ok_or_else(|| unsupported(unit, serving))?;
        let (serving_family, serving_base) =
            resolve_base(&serving_unit, portions).ok_or_else(|| unsupported(unit, serving))?;

        let amount = quantity * item_base;
        let amount_in_serving_family = match (item_family, serving_family) {
            (UnitFamily::Mass, UnitFamily::Mass) | (UnitFamily::Volume, UnitFamily::Volume) => {
                amount
            }
            (UnitFamily::Mass, UnitFamily::Volume) => {
                amount / density_g_per_ml.ok_or_else(|| unsupported(unit, serving))?
            }
            (UnitFamily::Volume, UnitFamily::Mass) => {
                amount * density_g_per_ml.ok_or_else(|| unsupported(unit, serving))?
            }
        };
        amount_in_serving_family / (serving.amount * serving_base)
    };

    if result.is_finite() {
        Ok(result)
    } else {
        Err(NutritionError::InvalidQuantity { quantity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn grams(amount: f64) -> Serving {
        Serving::new(amount, "g")
    }

    #[test]
    fn test_same_unit_divides_by_serving() {
        let m = convert(200.0, "g", &grams(100.0)).unwrap();
        assert!((m - 2.0).abs() < EPS);
    }

    #[test]
    fn test_same_unit_is_case_and_space_insensitive() {
        let m = convert(50.0, "  G ", &grams(100.0)).unwrap();
        assert!((m - 0.5).abs() < EPS);
        let m = convert(2.0, "Slice", &Serving::new(1.0, "slice")).unwrap();
        assert!((m - 2.0).abs() < EPS);
    }

    #[test]
    fn test_mass_units_convert_through_grams() {
        let m = convert(0.25, "kg", &grams(100.0)).unwrap();
        assert!((m - 2.5).abs() < EPS);
        let m = convert(500.0, "mg", &grams(1.0)).unwrap();
        assert!((m - 0.5).abs() < EPS);
        let m = convert(1.0, "lb", &grams(453.592)).unwrap();
        assert!((m - 1.0).abs() < EPS);
    }

    #[test]
    fn test_volume_units_convert_through_milliliters() {
        let m = convert(1.5, "l", &Serving::new(250.0, "ml")).unwrap();
        assert!((m - 6.0).abs() < EPS);
        let m = convert(2.0, "tbsp", &Serving::new(15.0, "ml")).unwrap();
        assert!((m - 2.0).abs() < EPS);
        let m = convert(1.0, "cup", &Serving::new(1.0, "l")).unwrap();
        assert!((m - 0.24).abs() < EPS);
    }

    #[test]
    fn test_zero_quantity_is_valid() {
        let m = convert(0.0, "kg", &grams(100.0)).unwrap();
        assert!(m.abs() < EPS);
    }

    #[test]
    fn test_invalid_quantities_rejected() {
        for q in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                convert(q, "g", &grams(100.0)),
                Err(NutritionError::InvalidQuantity { .. })
            ));
        }
    }

    #[test]
    fn test_cross_family_without_density_fails() {
        let err = convert(100.0, "ml", &grams(100.0)).unwrap_err();
        assert_eq!(
            err,
            NutritionError::UnsupportedUnit {
                unit: "ml".to_string(),
                serving_unit: "g".to_string()
            }
        );
    }

    #[test]
    fn test_piece_against_grams_fails() {
        assert!(matches!(
            convert(1.0, "piece", &grams(100.0)),
            Err(NutritionError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_unknown_unit_fails() {
        assert!(matches!(
            convert(1.0, "handful", &grams(100.0)),
            Err(NutritionError::UnsupportedUnit { .. })
        ));
        assert!(matches!(
            convert(1.0, "", &grams(100.0)),
            Err(NutritionError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_servings_pseudo_unit() {
        let m = convert(1.5, "servings", &grams(30.0)).unwrap();
        assert!((m - 1.5).abs() < EPS);
    }

    #[test]
    fn test_invalid_serving_rejected() {
        assert!(matches!(
            convert(1.0, "g", &grams(0.0)),
            Err(NutritionError::InvalidServing(_))
        ));
    }

    #[test]
    fn test_portion_opens_count_to_mass() {
        let portions = vec![Portion {
            name: "piece".to_string(),
            amount: 50.0,
            unit: "g".to_string(),
        }];
        let m = multiplier(3.0, "pieces", &grams(100.0), &portions, None).unwrap();
        assert!((m - 1.5).abs() < EPS);
    }

    #[test]
    fn test_serving_in_portion_unit() {
        let portions = vec![Portion {
            name: "egg".to_string(),
            amount: 60.0,
            unit: "g".to_string(),
        }];
        let m = multiplier(120.0, "g", &Serving::new(1.0, "egg"), &portions, None).unwrap();
        assert!((m - 2.0).abs() < EPS);
    }

    #[test]
    fn test_density_bridges_mass_and_volume() {
        // Milk-ish: 1.03 g/ml, serving 100 ml
        let m = multiplier(103.0, "g", &Serving::new(100.0, "ml"), &[], Some(1.03)).unwrap();
        assert!((m - 1.0).abs() < EPS);
        let m = multiplier(200.0, "ml", &grams(100.0), &[], Some(0.5)).unwrap();
        assert!((m - 1.0).abs() < EPS);
    }
}
