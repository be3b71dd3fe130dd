use anyhow::{Result, bail};
use clap::Args;
use std::process;

use nosh_core::NutritionService;
use nosh_core::models::{NewFood, NutrientVector, Portion, Serving};

use super::find_food_id;
use super::helpers::{parse_portion, parse_quantity, print_food_table, short_id};
use crate::store::JournalStore;

/// Food fields shared by `food add` and `food revise`. On revise, anything
/// left out keeps its current value.
#[derive(Args, Debug, Default)]
pub(crate) struct FoodFields {
    /// Canonical serving the nutrients refer to (e.g. "100g", "250 ml", "1 slice")
    #[arg(long)]
    pub serving: Option<String>,
    /// Energy per serving (kcal)
    #[arg(long)]
    pub calories: Option<f64>,
    /// Protein per serving (g)
    #[arg(long)]
    pub protein: Option<f64>,
    /// Carbohydrate per serving (g)
    #[arg(long)]
    pub carbs: Option<f64>,
    /// Fat per serving (g)
    #[arg(long)]
    pub fat: Option<f64>,
    /// Fiber per serving (g)
    #[arg(long)]
    pub fiber: Option<f64>,
    /// Sugar per serving (g)
    #[arg(long)]
    pub sugar: Option<f64>,
    /// Sodium per serving (mg)
    #[arg(long)]
    pub sodium: Option<f64>,
    /// Brand name
    #[arg(long)]
    pub brand: Option<String>,
    /// Barcode (EAN/UPC)
    #[arg(long)]
    pub barcode: Option<String>,
    /// Named portion, repeatable (e.g. --portion piece=50g --portion slice=30g)
    #[arg(long = "portion", value_name = "NAME=SIZE")]
    pub portions: Vec<String>,
    /// Density in g/ml, lets mass and volume units convert into each other
    #[arg(long)]
    pub density: Option<f64>,
}

impl FoodFields {
    /// Overlay these fields on `base`.
    fn apply(self, base: &mut NewFood) -> Result<()> {
        if let Some(serving) = self.serving {
            let (amount, unit) = parse_quantity(&serving)?;
            if unit == "serving" {
                bail!("Serving needs a unit, e.g. '100g' or '1 slice'");
            }
            base.serving = Serving::new(amount, &unit);
        }
        let n = &mut base.nutrients;
        if let Some(v) = self.calories {
            n.energy_kcal = v;
        }
        if let Some(v) = self.protein {
            n.protein_g = v;
        }
        if let Some(v) = self.carbs {
            n.carbs_g = v;
        }
        if let Some(v) = self.fat {
            n.fat_g = v;
        }
        n.fiber_g = self.fiber.or(n.fiber_g);
        n.sugar_g = self.sugar.or(n.sugar_g);
        n.sodium_mg = self.sodium.or(n.sodium_mg);
        if self.brand.is_some() {
            base.brand = self.brand;
        }
        if self.barcode.is_some() {
            base.barcode = self.barcode;
        }
        if !self.portions.is_empty() {
            base.portions = self
                .portions
                .iter()
                .map(|p| {
                    let (name, amount, unit) = parse_portion(p)?;
                    Ok(Portion { name, amount, unit })
                })
                .collect::<Result<_>>()?;
        }
        if self.density.is_some() {
            base.density_g_per_ml = self.density;
        }
        Ok(())
    }
}

pub(crate) fn cmd_food_add(
    svc: &mut NutritionService,
    store: &JournalStore,
    name: &str,
    fields: FoodFields,
    json: bool,
) -> Result<()> {
    if fields.calories.is_none() {
        bail!("--calories is required when adding a food");
    }
    let mut new_food = NewFood {
        name: name.to_string(),
        brand: None,
        barcode: None,
        serving: Serving::new(100.0, "g"),
        nutrients: NutrientVector::ZERO,
        portions: Vec::new(),
        density_g_per_ml: None,
        source: "manual".to_string(),
    };
    fields.apply(&mut new_food)?;

    if let Some(code) = new_food.barcode.as_deref() {
        if let Some(existing) = svc.catalog().by_barcode(code) {
            bail!(
                "Barcode {code} already belongs to '{}' ({}). Use `nosh food revise` instead",
                existing.name,
                short_id(existing.id)
            );
        }
    }

    let food = svc.insert_food(&new_food)?;
    store.persist(svc)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = short_id(food.id);
        let serving = &food.serving;
        println!("Added food: {name} per {serving} (id: {id})");
    }

    Ok(())
}

pub(crate) fn cmd_food_revise(
    svc: &mut NutritionService,
    store: &JournalStore,
    id: &str,
    name: Option<String>,
    fields: FoodFields,
    json: bool,
) -> Result<()> {
    let id = find_food_id(svc, id)?;
    let current = svc
        .catalog()
        .latest(id)
        .filter(|f| f.id == id)
        .map(NewFood::from);
    let Some(mut edited) = current else {
        bail!("Food {} has a newer version; revise that one", short_id(id));
    };
    if let Some(name) = name {
        edited.name = name;
    }
    fields.apply(&mut edited)?;

    let food = svc.revise_food(id, &edited)?;
    store.persist(svc)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let version = food.version;
        let new_id = short_id(food.id);
        let old_id = short_id(id);
        println!("Revised food: {name} v{version} (id: {new_id}, replaces {old_id})");
    }

    Ok(())
}

pub(crate) fn cmd_food_delete(
    svc: &mut NutritionService,
    store: &JournalStore,
    id: &str,
    json: bool,
) -> Result<()> {
    let id = find_food_id(svc, id)?;
    let food = svc.delete_food(id)?;
    store.persist(svc)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": food.id }));
    } else {
        let name = &food.name;
        println!("Deleted food: {name} ({})", short_id(food.id));
    }
    Ok(())
}

pub(crate) fn cmd_food_list(svc: &NutritionService, search: Option<&str>, json: bool) -> Result<()> {
    let foods = svc.list_foods(search);

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }

    Ok(())
}
