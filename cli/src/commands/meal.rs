use anyhow::{Result, bail};

use nosh_core::NutritionService;
use nosh_core::models::MealId;

use super::find_meal_id;
use super::helpers::{format_nutrients, json_error, parse_quantity, short_id};
use super::log::format_item;
use crate::store::JournalStore;

/// Items are numbered from 1 on screen.
fn item_index(item: usize) -> Result<usize> {
    match item.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("Item numbers start at 1"),
    }
}

pub(crate) fn cmd_update(
    svc: &mut NutritionService,
    store: &JournalStore,
    meal_id: &str,
    item: usize,
    quantity: &str,
    json: bool,
) -> Result<()> {
    let meal_id = find_meal_id(svc, meal_id)?;
    let index = item_index(item)?;
    let (amount, unit) = parse_quantity(quantity)?;

    let meal = svc.update_item(meal_id, index, amount, &unit)?.clone();
    store.persist(svc)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let quantity = format_item(amount, &unit);
        let totals = format_nutrients(&meal.totals);
        let id = short_id(meal_id);
        println!("Updated item {item} of {} [{id}] to {quantity}: {totals}", meal.meal_type);
    }
    Ok(())
}

pub(crate) fn cmd_remove(
    svc: &mut NutritionService,
    store: &JournalStore,
    meal_id: &str,
    item: usize,
    json: bool,
) -> Result<()> {
    let meal_id = find_meal_id(svc, meal_id)?;
    let index = item_index(item)?;

    let remaining = svc.remove_item(meal_id, index)?.cloned();
    store.persist(svc)?;

    let id = short_id(meal_id);
    match (&remaining, json) {
        (Some(meal), true) => println!("{}", serde_json::to_string_pretty(meal)?),
        (None, true) => println!("{}", serde_json::json!({ "deleted": meal_id })),
        (Some(meal), false) => {
            let totals = format_nutrients(&meal.totals);
            println!("Removed item {item} from {} [{id}]: {totals}", meal.meal_type);
        }
        (None, false) => println!("Removed item {item}; meal {id} is now empty and was deleted"),
    }
    Ok(())
}

pub(crate) fn cmd_delete(
    svc: &mut NutritionService,
    store: &JournalStore,
    meal_id: &str,
    json: bool,
) -> Result<()> {
    let id: MealId = match find_meal_id(svc, meal_id) {
        Ok(id) => id,
        Err(e) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            std::process::exit(2);
        }
    };

    let meal = svc.delete_meal(id)?;
    store.persist(svc)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": meal.id }));
    } else {
        let items = meal.items.len();
        println!("Deleted {} [{}] with {items} item(s)", meal.meal_type, short_id(meal.id));
    }
    Ok(())
}
