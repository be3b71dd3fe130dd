use anyhow::Result;
use chrono::FixedOffset;

use nosh_core::NutritionService;
use nosh_core::models::{Meal, MealItem, MealType};

use super::helpers::{consumed_at, format_nutrients, parse_date, parse_quantity, short_id};
use super::{find_food_id, resolve_food};
use crate::store::JournalStore;

pub(crate) fn format_item(quantity: f64, unit: &str) -> String {
    let sep = if unit.chars().count() > 2 { " " } else { "" };
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}{sep}{unit}")
    } else {
        format!("{quantity}{sep}{unit}")
    }
}

pub(crate) struct LogRequest {
    pub food: Option<String>,
    pub food_id: Option<String>,
    pub quantity: String,
    pub meal: String,
    pub date: Option<String>,
}

pub(crate) fn cmd_log(
    svc: &mut NutritionService,
    store: &JournalStore,
    tz: &FixedOffset,
    request: LogRequest,
    json: bool,
) -> Result<()> {
    let meal_type: MealType = request.meal.parse()?;
    let (quantity, unit) = parse_quantity(&request.quantity)?;
    let date = parse_date(request.date, tz)?;

    let food = match (&request.food_id, &request.food) {
        (Some(id), _) => {
            let id = find_food_id(svc, id)?;
            svc.food(id).cloned()
        }
        (None, Some(query)) => Some(resolve_food(svc, query, json)?.clone()),
        (None, None) => None,
    };
    let food = food.ok_or_else(|| anyhow::anyhow!("Give a food name or --food-id"))?;

    let at = consumed_at(date, tz)?;
    let meal: Meal = svc
        .log_item(meal_type, at, MealItem::new(food.id, quantity, &unit), tz)?
        .clone();
    store.persist(svc)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let name = &food.name;
        let item = format_item(quantity, &unit);
        let meal_id = short_id(meal.id);
        let totals = format_nutrients(&meal.totals);
        println!("Logged: {name} {item} for {meal_type} on {date}");
        println!("  {meal_type} [{meal_id}] now {totals}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_item() {
        assert_eq!(format_item(200.0, "g"), "200g");
        assert_eq!(format_item(1.5, "ml"), "1.5ml");
        assert_eq!(format_item(2.0, "pieces"), "2 pieces");
        assert_eq!(format_item(1.0, "serving"), "1 serving");
    }
}
