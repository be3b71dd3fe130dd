//! Meal and day totals.

use tracing::{debug, warn};

use crate::catalog::FoodLookup;
use crate::error::{NutritionError, Result};
use crate::models::{Meal, MealItem, NutrientVector};
use crate::units::convert_for_food;

/// Nutrients contributed by a single item.
pub fn item_nutrients(item: &MealItem, catalog: &dyn FoodLookup) -> Result<NutrientVector> {
    let food = catalog
        .lookup(item.food_id)
        .ok_or(NutritionError::UnknownFood(item.food_id))?;
    let multiplier = convert_for_food(item.quantity, &item.unit, food)?;
    Ok(food.nutrients.scale(multiplier))
}

/// Sum of every item's scaled contribution. The first invalid item aborts the
/// whole aggregation; no partial total is returned.
pub fn aggregate_meal(items: &[MealItem], catalog: &dyn FoodLookup) -> Result<NutrientVector> {
    let mut total = NutrientVector::ZERO;
    for (index, item) in items.iter().enumerate() {
        match item_nutrients(item, catalog) {
            Ok(contribution) => total += contribution,
            Err(e) => {
                warn!(index, food_id = %item.food_id, error = %e, "rejecting meal item");
                return Err(e);
            }
        }
    }
    debug!(
        items = items.len(),
        energy_kcal = total.energy_kcal,
        "aggregated meal"
    );
    Ok(total)
}

/// Sum of the meals' cached totals. Items are not revisited.
#[must_use]
pub fn aggregate_day<'a, I>(meals: I) -> NutrientVector
where
    I: IntoIterator<Item = &'a Meal>,
{
    meals.into_iter().map(|m| m.totals).sum()
}

impl Meal {
    /// Recompute the cached totals from the current items. On error the
    /// previous snapshot is left untouched.
    pub fn refresh_totals(&mut self, catalog: &dyn FoodLookup) -> Result<&NutrientVector> {
        self.totals = aggregate_meal(&self.items, catalog)?;
        Ok(&self.totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{FoodId, MealType, NewFood, Serving};
    use chrono::Utc;

    const EPS: f64 = 1e-9;

    fn food(name: &str, serving: Serving, nutrients: NutrientVector) -> NewFood {
        NewFood {
            name: name.to_string(),
            brand: None,
            barcode: None,
            serving,
            nutrients,
            portions: vec![],
            density_g_per_ml: None,
            source: "manual".to_string(),
        }
    }

    #[test]
    fn test_single_item_scales_by_multiplier() {
        let mut catalog = Catalog::new();
        let carrot = catalog
            .insert(&food(
                "Carrot",
                Serving::new(100.0, "g"),
                NutrientVector::new(50.0, 1.0, 10.0, 0.2),
            ))
            .unwrap();

        let items = vec![MealItem::new(carrot.id, 200.0, "g")];
        let total = aggregate_meal(&items, &catalog).unwrap();
        assert!((total.energy_kcal - 100.0).abs() < EPS);
        assert!((total.carbs_g - 20.0).abs() < EPS);
    }

    #[test]
    fn test_heterogeneous_units_sum_per_item() {
        let mut catalog = Catalog::new();
        let rice = catalog
            .insert(&food(
                "Rice",
                Serving::new(100.0, "g"),
                NutrientVector::new(130.0, 2.7, 28.0, 0.3),
            ))
            .unwrap();
        let milk = catalog
            .insert(&food(
                "Milk",
                Serving::new(250.0, "ml"),
                NutrientVector::new(160.0, 8.0, 12.0, 8.0),
            ))
            .unwrap();

        let items = vec![
            MealItem::new(rice.id, 0.15, "kg"),
            MealItem::new(milk.id, 0.5, "l"),
        ];
        let total = aggregate_meal(&items, &catalog).unwrap();
        // 1.5 servings of rice + 2 servings of milk
        assert!((total.energy_kcal - (195.0 + 320.0)).abs() < 1e-6);
        assert!((total.protein_g - (4.05 + 16.0)).abs() < 1e-6);
    }

    #[test]
    fn test_unsupported_unit_aborts_meal() {
        let mut catalog = Catalog::new();
        let bread = catalog
            .insert(&food(
                "Bread",
                Serving::new(100.0, "g"),
                NutrientVector::new(250.0, 9.0, 49.0, 3.2),
            ))
            .unwrap();
        let items = vec![
            MealItem::new(bread.id, 50.0, "g"),
            MealItem::new(bread.id, 1.0, "piece"),
        ];
        assert!(matches!(
            aggregate_meal(&items, &catalog),
            Err(NutritionError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_unknown_food_aborts_meal() {
        let catalog = Catalog::new();
        let missing = FoodId::random();
        let items = vec![MealItem::new(missing, 1.0, "g")];
        assert_eq!(
            aggregate_meal(&items, &catalog).unwrap_err(),
            NutritionError::UnknownFood(missing)
        );
    }

    #[test]
    fn test_empty_meal_is_zero() {
        let catalog = Catalog::new();
        assert!(aggregate_meal(&[], &catalog).unwrap().is_zero());
    }

    #[test]
    fn test_refresh_totals_keeps_snapshot_on_error() {
        let mut catalog = Catalog::new();
        let egg = catalog
            .insert(&food(
                "Egg",
                Serving::new(50.0, "g"),
                NutrientVector::new(70.0, 6.0, 0.5, 5.0),
            ))
            .unwrap();
        let mut meal = Meal::new(MealType::Breakfast, Utc::now());
        meal.items.push(MealItem::new(egg.id, 100.0, "g"));
        meal.refresh_totals(&catalog).unwrap();
        assert!((meal.totals.energy_kcal - 140.0).abs() < EPS);

        meal.items.push(MealItem::new(egg.id, -1.0, "g"));
        assert!(meal.refresh_totals(&catalog).is_err());
        assert!((meal.totals.energy_kcal - 140.0).abs() < EPS);
    }

    #[test]
    fn test_aggregate_day_sums_cached_totals() {
        let now = Utc::now();
        let mut a = Meal::new(MealType::Lunch, now);
        a.totals = NutrientVector::new(500.0, 30.0, 50.0, 20.0);
        let mut b = Meal::new(MealType::Dinner, now);
        b.totals = NutrientVector::new(700.0, 40.0, 60.0, 30.0);

        let total = aggregate_day(&[a, b]);
        assert!((total.energy_kcal - 1200.0).abs() < EPS);
        assert!((total.fat_g - 50.0).abs() < EPS);
        assert!(aggregate_day(&[] as &[Meal]).is_zero());
    }
}
