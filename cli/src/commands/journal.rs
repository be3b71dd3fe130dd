use std::path::Path;

use anyhow::{Context, Result};

use nosh_core::NutritionService;

use crate::store::{JournalStore, read_journal};

pub fn cmd_export(svc: &NutritionService, output: Option<&Path>) -> Result<()> {
    let journal = svc.export();
    let json = serde_json::to_string_pretty(&journal)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!(
                "Exported {} foods and {} meals to {}",
                journal.foods.len(),
                journal.meals.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Replace the journal with the contents of `path`. The file is checked in
/// full before anything is written.
pub fn cmd_import(
    svc: &mut NutritionService,
    store: &JournalStore,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let journal = read_journal(path)?;

    let mut staged = svc.clone();
    let summary = staged
        .import(journal)
        .with_context(|| format!("Rejected import from {}", path.display()))?;

    if !dry_run {
        *svc = staged;
        store.persist(svc)?;
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dry_run": dry_run,
                "foods": summary.foods,
                "meals": summary.meals,
                "items": summary.items,
                "profile": summary.profile,
            })
        );
    } else {
        if dry_run {
            println!("Dry run - no changes made.\n");
        } else {
            println!("Import complete.\n");
        }
        println!("  Foods:   {}", summary.foods);
        println!("  Meals:   {}", summary.meals);
        println!("  Items:   {}", summary.items);
        println!("  Profile: {}", if summary.profile { "yes" } else { "no" });
    }

    Ok(())
}
