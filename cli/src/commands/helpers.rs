use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::models::{Food, NutrientVector};

/// Parse `±HH:MM` (or `Z`) into a fixed offset; `None` means the machine's
/// current local offset.
pub(crate) fn parse_utc_offset(s: Option<&str>) -> Result<FixedOffset> {
    let Some(s) = s else {
        return Ok(Local::now().offset().fix());
    };
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let invalid = || format!("Invalid UTC offset '{s}'. Use ±HH:MM, e.g. +02:00 or -05:30");
    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => bail!(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let two_digits = |part: &str| {
        (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !two_digits(hours) || !two_digits(minutes) {
        bail!(invalid());
    }
    let hours: i32 = hours.parse().with_context(invalid)?;
    let minutes: i32 = minutes.parse().with_context(invalid)?;
    if !(0..60).contains(&minutes) {
        bail!(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).with_context(invalid)
}

pub(crate) fn today(tz: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

pub(crate) fn parse_date(date_str: Option<String>, tz: &FixedOffset) -> Result<NaiveDate> {
    let today = today(tz);
    match date_str {
        None => Ok(today),
        Some(s) => match s.as_str() {
            "today" => Ok(today),
            "yesterday" => Ok(today - chrono::Duration::days(1)),
            "tomorrow" => Ok(today + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Timestamp recorded for an item logged on `date`: now if that is today,
/// otherwise local noon of that day.
pub(crate) fn consumed_at(date: NaiveDate, tz: &FixedOffset) -> Result<DateTime<Utc>> {
    if date == today(tz) {
        return Ok(Utc::now());
    }
    let noon = date.and_hms_opt(12, 0, 0).context("Invalid time of day")?;
    tz.from_local_datetime(&noon)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("No local noon on {date}"))
}

/// Parse a logged quantity into `(amount, unit)`.
/// Accepts: "200g", "200 g", "0.5 kg", "2 pieces", "1 cup", or a bare number,
/// which counts servings.
pub(crate) fn parse_quantity(s: &str) -> Result<(f64, String)> {
    let s = s.trim();

    if let Ok(amount) = s.parse::<f64>() {
        return Ok((check_amount(amount, s)?, "serving".to_string()));
    }

    let (amount, unit) = split_number_unit(s).with_context(|| {
        format!("Invalid quantity '{s}'. Use '200g', '500 ml', '2 pieces', etc.")
    })?;
    Ok((check_amount(amount, s)?, unit.to_string()))
}

fn check_amount(amount: f64, s: &str) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        bail!("Quantity must be a non-negative number (got '{s}')");
    }
    Ok(amount)
}

/// Split "500ml", "2.5 tbsp" or "1 fl oz" into (500.0, "ml"), (2.5, "tbsp"),
/// (1.0, "fl oz").
fn split_number_unit(s: &str) -> Option<(f64, &str)> {
    let idx = s.find(|c: char| c.is_alphabetic())?;
    if idx == 0 {
        return None;
    }
    let (num_part, unit_part) = s.split_at(idx);
    let qty: f64 = num_part.trim().parse().ok()?;
    let unit = unit_part.trim();
    if unit.is_empty() {
        return None;
    }
    Some((qty, unit))
}

/// Parse `name=amount unit`, e.g. `piece=50g` or `slice=30 ml`.
pub(crate) fn parse_portion(s: &str) -> Result<(String, f64, String)> {
    let (name, size) = s
        .split_once('=')
        .with_context(|| format!("Invalid portion '{s}'. Use name=amount unit, e.g. piece=50g"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Portion name must not be empty in '{s}'");
    }
    let (amount, unit) = split_number_unit(size.trim())
        .with_context(|| format!("Invalid portion size '{size}'. Use e.g. 50g or 30 ml"))?;
    Ok((name.to_string(), amount, unit.to_string()))
}

/// Resolve a unique id prefix (case-insensitive) against `ids`.
pub(crate) fn match_id_prefix<T: Copy + Display>(
    kind: &str,
    prefix: &str,
    ids: impl IntoIterator<Item = T>,
) -> Result<T> {
    let needle = prefix.trim().to_lowercase();
    if needle.is_empty() {
        bail!("Empty {kind} id");
    }
    let matches: Vec<T> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No {kind} with id '{prefix}'"),
        _ => bail!("Ambiguous {kind} id '{prefix}' ({} matches)", matches.len()),
    }
}

pub(crate) fn short_id(id: impl Display) -> String {
    id.to_string().chars().take(8).collect()
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_food_table(foods: &[&Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Brand")]
        brand: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "Ver")]
        version: u32,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: short_id(f.id),
            name: truncate(&f.name, 35),
            brand: f
                .brand
                .as_deref()
                .map(|b| truncate(b, 20))
                .unwrap_or_default(),
            serving: f.serving.to_string(),
            calories: format!("{:.0}", f.nutrients.energy_kcal),
            protein: format!("{:.1}", f.nutrients.protein_g),
            carbs: format!("{:.1}", f.nutrients.carbs_g),
            fat: format!("{:.1}", f.nutrients.fat_g),
            version: f.version,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(5..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// One-line `kcal | P C F` rendering used across commands.
pub(crate) fn format_nutrients(n: &NutrientVector) -> String {
    let cal = no_neg_zero(n.energy_kcal);
    let p = no_neg_zero(n.protein_g);
    let c = no_neg_zero(n.carbs_g);
    let f = no_neg_zero(n.fat_g);
    format!("{cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g")
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
