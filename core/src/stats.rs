//! Read-side reports over stored meals: daily and multi-day statistics.
//!
//! Everything here is a pure function of its arguments. Meals are bucketed by
//! the calendar day their timestamp falls on in the caller-supplied offset;
//! nothing is inferred from the machine's clock or zone.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, Duration, FixedOffset, NaiveDate};

use crate::aggregate::aggregate_day;
use crate::error::{NutritionError, Result};
use crate::models::{
    DailyStat, Meal, MealType, MealTypeSubtotal, NutrientVector, NutritionGoals, PeriodSummary,
};

fn build_daily_stat(date: NaiveDate, meals: &[&Meal], goals: Option<&NutritionGoals>) -> DailyStat {
    let totals = aggregate_day(meals.iter().copied());

    let mut by_meal_type = Vec::new();
    for meal_type in MealType::ALL {
        let of_type: Vec<&Meal> = meals
            .iter()
            .copied()
            .filter(|m| m.meal_type == meal_type)
            .collect();
        if of_type.is_empty() {
            continue;
        }
        by_meal_type.push(MealTypeSubtotal {
            meal_type,
            meal_count: of_type.len(),
            totals: aggregate_day(of_type),
        });
    }

    DailyStat {
        date,
        meal_count: meals.len(),
        totals,
        by_meal_type,
        energy_goal_kcal: goals.map(|g| g.energy_kcal),
        remaining_kcal: goals.map(|g| g.energy_kcal - totals.energy_kcal),
        remaining_macros: goals.map(|g| g.macros().minus(&totals.macros())),
    }
}

/// Totals for `date`. A day with no meals yields zero totals and the full
/// goal as remaining.
#[must_use]
pub fn daily_stat(
    meals: &[Meal],
    date: NaiveDate,
    goals: Option<&NutritionGoals>,
    tz: &FixedOffset,
) -> DailyStat {
    let of_day: Vec<&Meal> = meals.iter().filter(|m| m.local_date(tz) == date).collect();
    build_daily_stat(date, &of_day, goals)
}

/// One entry per day in `[start, start + day_count)`, ascending. Days without
/// meals are zero-filled, never skipped. A range running past
/// `NaiveDate::MAX` is refused rather than cut short.
pub fn weekly_stat(
    meals: &[Meal],
    start: NaiveDate,
    day_count: u32,
    goals: Option<&NutritionGoals>,
    tz: &FixedOffset,
) -> Result<Vec<DailyStat>> {
    if day_count > 0 && start.checked_add_days(Days::new(u64::from(day_count - 1))).is_none() {
        return Err(NutritionError::DateOutOfRange { start, day_count });
    }

    let mut by_day: BTreeMap<NaiveDate, Vec<&Meal>> = BTreeMap::new();
    for meal in meals {
        by_day.entry(meal.local_date(tz)).or_default().push(meal);
    }

    Ok(start
        .iter_days()
        .take(day_count as usize)
        .map(|date| {
            let of_day = by_day.get(&date).map_or(&[][..], Vec::as_slice);
            build_daily_stat(date, of_day, goals)
        })
        .collect())
}

/// Sum and per-logged-day average over a run of daily stats.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn period_summary(days: &[DailyStat]) -> PeriodSummary {
    let logged: Vec<&DailyStat> = days.iter().filter(|d| d.meal_count > 0).collect();
    let totals: NutrientVector = days.iter().map(|d| d.totals).sum();
    let daily_average = if logged.is_empty() {
        NutrientVector::ZERO
    } else {
        totals.scale(1.0 / logged.len() as f64)
    };

    PeriodSummary {
        start: days.iter().map(|d| d.date).min(),
        end: days.iter().map(|d| d.date).max(),
        days: days.len(),
        logged_days: logged.len(),
        totals,
        daily_average,
    }
}

/// Consecutive days with at least one meal, counting back from `today`. If
/// nothing is logged yet today the streak may still run through yesterday.
#[must_use]
pub fn logging_streak(meals: &[Meal], today: NaiveDate, tz: &FixedOffset) -> u32 {
    let logged: BTreeSet<NaiveDate> = meals.iter().map(|m| m.local_date(tz)).collect();

    let yesterday = today - Duration::days(1);
    let mut day = if logged.contains(&today) {
        today
    } else if logged.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while logged.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}
