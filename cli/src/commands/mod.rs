mod food;
mod helpers;
mod journal;
mod log;
mod meal;
mod profile;
mod summary;

use anyhow::Result;
use std::process;

use nosh_core::NutritionService;
use nosh_core::models::{Food, FoodId, MealId};

use helpers::{json_error, match_id_prefix, print_food_table, prompt_choice};

pub(crate) use food::{FoodFields, cmd_food_add, cmd_food_delete, cmd_food_list, cmd_food_revise};
pub(crate) use helpers::parse_utc_offset;
pub(crate) use journal::{cmd_export, cmd_import};
pub(crate) use log::{LogRequest, cmd_log};
pub(crate) use meal::{cmd_delete, cmd_remove, cmd_update};
pub(crate) use profile::{ProfileFields, cmd_goals, cmd_profile_set, cmd_profile_show};
pub(crate) use summary::{cmd_history, cmd_summary, cmd_week};

/// Any stored food version, by id or unique id prefix.
pub(super) fn find_food_id(svc: &NutritionService, id: &str) -> Result<FoodId> {
    match_id_prefix("food", id, svc.catalog().iter().map(|f| f.id))
}

pub(super) fn find_meal_id(svc: &NutritionService, id: &str) -> Result<MealId> {
    match_id_prefix("meal", id, svc.meals().iter().map(|m| m.id))
}

/// Resolve a food name against the catalog, prompting when several current
/// foods match. Exits with status 2 when nothing matches.
pub(super) fn resolve_food<'a>(
    svc: &'a NutritionService,
    food_query: &str,
    json: bool,
) -> Result<&'a Food> {
    let mut all = svc.list_foods(Some(food_query));

    if all.is_empty() {
        if json {
            println!(
                "{}",
                json_error(&format!("No food found for '{food_query}'"))
            );
        } else {
            eprintln!("No food found for '{food_query}'");
        }
        process::exit(2);
    }

    let query = food_query.trim();
    let exact: Vec<usize> = all
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name.eq_ignore_ascii_case(query))
        .map(|(i, _)| i)
        .collect();
    if let [i] = exact.as_slice() {
        return Ok(all.swap_remove(*i));
    }

    if all.len() == 1 {
        return Ok(all.swap_remove(0));
    }

    print_food_table(&all);
    let idx = prompt_choice(all.len())?;
    Ok(all.swap_remove(idx))
}
