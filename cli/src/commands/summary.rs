use anyhow::{Context, Result};
use chrono::{Datelike, Days, Duration, FixedOffset, NaiveDate};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::NutritionService;
use nosh_core::catalog::FoodLookup;
use nosh_core::models::{DailyStat, PeriodSummary};

use super::helpers::{format_nutrients, no_neg_zero, parse_date, short_id, today};
use super::log::format_item;

pub(crate) fn cmd_summary(
    svc: &NutritionService,
    tz: &FixedOffset,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, tz)?;
    let stat = svc.daily_stat(date, tz);

    if json {
        #[derive(Serialize)]
        struct Summary<'a> {
            #[serde(flatten)]
            stat: &'a DailyStat,
            meals: Vec<&'a nosh_core::models::Meal>,
        }
        let summary = Summary {
            stat: &stat,
            meals: svc.meals_on(date, tz),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if stat.meal_count == 0 {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ({}) ===\n", stat.weekday());

    for meal in svc.meals_on(date, tz) {
        let meal_label = meal.meal_type.as_str().to_uppercase();
        let id = short_id(meal.id);
        let sub_cal = no_neg_zero(meal.totals.energy_kcal);
        println!("  {meal_label} [{id}] ({sub_cal:.0} kcal)");
        for (i, item) in meal.items.iter().enumerate() {
            let n = i + 1;
            let name = svc
                .catalog()
                .lookup(item.food_id)
                .map_or("?", |f| f.name.as_str());
            let quantity = format_item(item.quantity, &item.unit);
            println!("    {n}. {name}  {quantity}");
        }
        println!();
    }

    println!("  TOTAL: {}", format_nutrients(&stat.totals));

    if let (Some(goal), Some(remaining), Some(macros)) = (
        stat.energy_goal_kcal,
        stat.remaining_kcal,
        stat.remaining_macros,
    ) {
        if let Some(goals) = svc.goals() {
            let (pg, cg, fg) = (goals.protein_g, goals.carbs_g, goals.fat_g);
            println!("  TARGET: {goal:.0} kcal | P:{pg:.0}g C:{cg:.0}g F:{fg:.0}g");
        }
        let rp = no_neg_zero(macros.protein_g);
        let rc = no_neg_zero(macros.carbs_g);
        let rf = no_neg_zero(macros.fat_g);
        let remaining = no_neg_zero(remaining);
        println!("  REMAINING: {remaining:.0} kcal | P:{rp:.0}g C:{rc:.0}g F:{rf:.0}g");
    }

    Ok(())
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Day")]
    weekday: String,
    #[tabled(rename = "Meals")]
    meals: usize,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Protein")]
    protein: String,
    #[tabled(rename = "Carbs")]
    carbs: String,
    #[tabled(rename = "Fat")]
    fat: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
}

fn day_rows(days: &[DailyStat]) -> Vec<DayRow> {
    days.iter()
        .map(|s| {
            let cal = no_neg_zero(s.totals.energy_kcal);
            let p = no_neg_zero(s.totals.protein_g);
            let c = no_neg_zero(s.totals.carbs_g);
            let f = no_neg_zero(s.totals.fat_g);
            DayRow {
                date: s.date.to_string(),
                weekday: s.weekday().to_string(),
                meals: s.meal_count,
                calories: format!("{cal:.0}"),
                protein: format!("{p:.0}g"),
                carbs: format!("{c:.0}g"),
                fat: format!("{f:.0}g"),
                remaining: s
                    .remaining_kcal
                    .map_or_else(|| "-".to_string(), |r| format!("{:.0}", no_neg_zero(r))),
            }
        })
        .collect()
}

fn print_days(days: &[DailyStat], summary: &PeriodSummary) {
    let rows = day_rows(days);
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let logged = summary.logged_days;
    let total = summary.days;
    println!(
        "  Logged {logged}/{total} days, average {}",
        format_nutrients(&summary.daily_average)
    );
}

#[derive(Serialize)]
struct Report<'a> {
    days: &'a [DailyStat],
    summary: &'a PeriodSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    streak: Option<u32>,
}

/// First day of a `days`-long window ending on `today`.
pub(crate) fn history_start(today: NaiveDate, days: u32) -> Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .with_context(|| format!("{days} days before {today} is out of range"))
}

pub(crate) fn cmd_history(
    svc: &NutritionService,
    tz: &FixedOffset,
    days: u32,
    json: bool,
) -> Result<()> {
    let today = today(tz);
    let start = history_start(today, days)?;
    let mut stats = svc.days(start, days, tz)?;
    let summary = nosh_core::stats::period_summary(&stats);
    let streak = svc.logging_streak(today, tz);
    // most recent first, as a history reads
    stats.reverse();

    if json {
        let report = Report {
            days: &stats,
            summary: &summary,
            streak: Some(streak),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if summary.logged_days == 0 {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    print_days(&stats, &summary);
    println!("  Logging streak: {streak} day(s)");
    Ok(())
}

/// Monday of the week containing `date`.
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub(crate) fn cmd_week(
    svc: &NutritionService,
    tz: &FixedOffset,
    start: Option<String>,
    json: bool,
) -> Result<()> {
    let start = match start {
        Some(s) => parse_date(Some(s), tz)?,
        None => week_start(today(tz)),
    };
    let stats = svc.weekly_stat(start, tz)?;
    let summary = nosh_core::stats::period_summary(&stats);

    if json {
        let report = Report {
            days: &stats,
            summary: &summary,
            streak: None,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if summary.logged_days == 0 {
        let end = start + Duration::days(6);
        eprintln!("No entries between {start} and {end}");
        process::exit(2);
    }

    println!("=== Week of {start} ===\n");
    print_days(&stats, &summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosh_core::models::NutrientVector;

    #[test]
    fn test_week_start_is_monday() {
        let wed = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let mon = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(week_start(wed), mon);
        assert_eq!(week_start(mon), mon);
        let sun = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        assert_eq!(week_start(sun), mon);
    }

    #[test]
    fn test_history_start() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let week_ago = NaiveDate::from_ymd_opt(2024, 6, 6).unwrap();
        assert_eq!(history_start(today, 7).unwrap(), week_ago);
        assert_eq!(history_start(today, 1).unwrap(), today);
        assert_eq!(history_start(today, 0).unwrap(), today);
        assert!(history_start(today, 200_000_000).is_err());
    }

    #[test]
    fn test_day_rows_format() {
        let stat = DailyStat {
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            meal_count: 2,
            totals: NutrientVector::new(1850.4, 120.2, 180.0, -0.0),
            by_meal_type: vec![],
            energy_goal_kcal: Some(2000.0),
            remaining_kcal: Some(149.6),
            remaining_macros: None,
        };
        let rows = day_rows(&[stat]);
        assert_eq!(rows[0].weekday, "Mon");
        assert_eq!(rows[0].calories, "1850");
        assert_eq!(rows[0].fat, "0g");
        assert_eq!(rows[0].remaining, "150");
    }

    #[test]
    fn test_day_rows_without_goal() {
        let stat = DailyStat {
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            meal_count: 0,
            totals: NutrientVector::ZERO,
            by_meal_type: vec![],
            energy_goal_kcal: None,
            remaining_kcal: None,
            remaining_macros: None,
        };
        assert_eq!(day_rows(&[stat])[0].remaining, "-");
    }
}
