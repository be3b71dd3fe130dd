use anyhow::{Context, Result, bail};
use chrono::{FixedOffset, NaiveDate};
use clap::Args;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::models::{ActivityLevel, Biometrics, GoalDirection, NutritionGoals, Sex};
use nosh_core::{GoalWarning, NutritionService};

use super::helpers::{json_error, parse_date, today};
use crate::store::JournalStore;

const KG_PER_LB: f64 = 0.453_592;
const CM_PER_IN: f64 = 2.54;

/// Biometric fields for `profile set`. Every field is required the first time;
/// afterwards only the ones given change.
#[derive(Args, Debug, Default)]
pub(crate) struct ProfileFields {
    /// male or female
    #[arg(long)]
    pub sex: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub born: Option<String>,
    /// Height (e.g. "175", "175cm", "69in")
    #[arg(long)]
    pub height: Option<String>,
    /// Body weight (e.g. "70", "70kg", "154lb")
    #[arg(long)]
    pub weight: Option<String>,
    /// sedentary, light, moderate, active, very-active
    #[arg(long)]
    pub activity: Option<String>,
    /// lose, maintain, gain
    #[arg(long)]
    pub goal: Option<String>,
}

fn parse_measure(s: &str, kind: &str, units: &[(&str, f64)]) -> Result<f64> {
    let s = s.trim().to_lowercase();
    let (number, factor) = units
        .iter()
        .find_map(|(suffix, factor)| s.strip_suffix(suffix).map(|n| (n.trim(), *factor)))
        .unwrap_or((s.as_str(), 1.0));
    let value: f64 = number
        .parse()
        .with_context(|| format!("Invalid {kind} '{s}'"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("{kind} must be greater than 0");
    }
    Ok(value * factor)
}

pub(crate) fn parse_weight_kg(s: &str) -> Result<f64> {
    parse_measure(
        s,
        "weight",
        &[("kg", 1.0), ("lbs", KG_PER_LB), ("lb", KG_PER_LB)],
    )
}

pub(crate) fn parse_height_cm(s: &str) -> Result<f64> {
    parse_measure(s, "height", &[("cm", 1.0), ("in", CM_PER_IN)])
}

impl ProfileFields {
    fn is_empty(&self) -> bool {
        self.sex.is_none()
            && self.born.is_none()
            && self.height.is_none()
            && self.weight.is_none()
            && self.activity.is_none()
            && self.goal.is_none()
    }

    fn into_biometrics(self, current: Option<&Biometrics>, tz: &FixedOffset) -> Result<Biometrics> {
        let missing = |field: &str| {
            anyhow::anyhow!("--{field} is required the first time a profile is set")
        };

        let sex: Sex = match (self.sex, current) {
            (Some(s), _) => s.parse()?,
            (None, Some(c)) => c.sex,
            (None, None) => return Err(missing("sex")),
        };
        let date_of_birth: NaiveDate = match (self.born, current) {
            (Some(s), _) => parse_date(Some(s), tz)?,
            (None, Some(c)) => c.date_of_birth,
            (None, None) => return Err(missing("born")),
        };
        let height_cm = match (self.height, current) {
            (Some(s), _) => parse_height_cm(&s)?,
            (None, Some(c)) => c.height_cm,
            (None, None) => return Err(missing("height")),
        };
        let weight_kg = match (self.weight, current) {
            (Some(s), _) => parse_weight_kg(&s)?,
            (None, Some(c)) => c.weight_kg,
            (None, None) => return Err(missing("weight")),
        };
        let activity_level: ActivityLevel = match (self.activity, current) {
            (Some(s), _) => s.parse()?,
            (None, Some(c)) => c.activity_level,
            (None, None) => return Err(missing("activity")),
        };
        let goal: GoalDirection = match (self.goal, current) {
            (Some(s), _) => s.parse()?,
            (None, Some(c)) => c.goal,
            (None, None) => return Err(missing("goal")),
        };

        Ok(Biometrics {
            sex,
            date_of_birth,
            height_cm,
            weight_kg,
            activity_level,
            goal,
        })
    }
}

fn report_warning(warning: Option<GoalWarning>) {
    if let Some(w) = warning {
        eprintln!("Warning: {w}");
    }
}

pub(crate) fn cmd_profile_set(
    svc: &mut NutritionService,
    store: &JournalStore,
    tz: &FixedOffset,
    fields: ProfileFields,
    json: bool,
) -> Result<()> {
    if fields.is_empty() {
        bail!("Nothing to set. Provide at least one of --sex, --born, --height, --weight, --activity, --goal");
    }
    let current = svc.profile().map(|p| p.biometrics.clone());
    let biometrics = fields.into_biometrics(current.as_ref(), tz)?;

    let warning = svc.set_profile(biometrics, today(tz))?;
    store.persist(svc)?;

    let goals = svc
        .goals()
        .context("Profile was saved without goals")?;
    if json {
        #[derive(Serialize)]
        struct ProfileUpdate<'a> {
            goals: &'a NutritionGoals,
            #[serde(skip_serializing_if = "Option::is_none")]
            warning: Option<GoalWarning>,
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&ProfileUpdate { goals, warning })?
        );
    } else {
        println!("Profile saved.");
        print_goals(goals);
        report_warning(warning);
    }
    Ok(())
}

fn no_profile(json: bool) -> ! {
    let message = "No profile set. Use `nosh profile set` to create one.";
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn cmd_profile_show(svc: &NutritionService, tz: &FixedOffset, json: bool) -> Result<()> {
    let Some(profile) = svc.profile() else {
        no_profile(json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }

    let b = &profile.biometrics;
    let sex = match b.sex {
        Sex::Male => "male",
        Sex::Female => "female",
    };
    let age = b
        .age_on(today(tz))
        .map_or_else(|| "?".to_string(), |a| a.to_string());
    println!("  Sex:       {sex}");
    println!("  Born:      {} (age {age})", b.date_of_birth);
    println!("  Height:    {:.0} cm", b.height_cm);
    println!("  Weight:    {:.1} kg", b.weight_kg);
    println!("  Activity:  {:?}", b.activity_level);
    println!("  Goal:      {:?}", b.goal);
    println!();
    print_goals(&profile.goals);
    Ok(())
}

pub(crate) fn cmd_goals(
    svc: &mut NutritionService,
    store: &JournalStore,
    tz: &FixedOffset,
    refresh: bool,
    json: bool,
) -> Result<()> {
    if svc.profile().is_none() {
        no_profile(json);
    }

    let mut warning = None;
    if refresh {
        let policy = svc.policy().clone();
        warning = svc.set_policy(policy, today(tz))?;
        store.persist(svc)?;
    }

    let goals = svc.goals().context("Profile has no goals")?;
    if json {
        println!("{}", serde_json::to_string_pretty(goals)?);
    } else {
        print_goals(goals);
        report_warning(warning);
    }
    Ok(())
}

fn print_goals(goals: &NutritionGoals) {
    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "Target")]
        name: &'static str,
        #[tabled(rename = "Daily")]
        value: String,
        #[tabled(rename = "kcal")]
        kcal: String,
    }

    let rows = vec![
        GoalRow {
            name: "Baseline (TDEE)",
            value: format!("{:.0} kcal", goals.baseline_kcal),
            kcal: format!("{:.0}", goals.baseline_kcal),
        },
        GoalRow {
            name: "Energy",
            value: format!("{:.0} kcal", goals.energy_kcal),
            kcal: format!("{:.0}", goals.energy_kcal),
        },
        GoalRow {
            name: "Protein",
            value: format!("{:.0}g", goals.protein_g),
            kcal: format!("{:.0}", goals.protein_g * 4.0),
        },
        GoalRow {
            name: "Carbs",
            value: format!("{:.0}g", goals.carbs_g),
            kcal: format!("{:.0}", goals.carbs_g * 4.0),
        },
        GoalRow {
            name: "Fat",
            value: format!("{:.0}g", goals.fat_g),
            kcal: format!("{:.0}", goals.fat_g * 9.0),
        },
    ];

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("  computed on {}", goals.computed_on);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_parse_weight() {
        assert!((parse_weight_kg("70").unwrap() - 70.0).abs() < f64::EPSILON);
        assert!((parse_weight_kg("70kg").unwrap() - 70.0).abs() < f64::EPSILON);
        assert!((parse_weight_kg("100 lb").unwrap() - 45.3592).abs() < 1e-9);
        assert!((parse_weight_kg("100lbs").unwrap() - 45.3592).abs() < 1e-9);
        assert!(parse_weight_kg("0").is_err());
        assert!(parse_weight_kg("-0").is_err());
        assert!(parse_weight_kg("heavy").is_err());
    }

    #[test]
    fn test_parse_height() {
        assert!((parse_height_cm("175").unwrap() - 175.0).abs() < f64::EPSILON);
        assert!((parse_height_cm("175 cm").unwrap() - 175.0).abs() < f64::EPSILON);
        assert!((parse_height_cm("70in").unwrap() - 177.8).abs() < 1e-9);
        assert!(parse_height_cm("-5").is_err());
    }

    #[test]
    fn test_first_profile_needs_every_field() {
        let fields = ProfileFields {
            sex: Some("male".to_string()),
            weight: Some("70".to_string()),
            ..ProfileFields::default()
        };
        let err = fields.into_biometrics(None, &utc()).unwrap_err();
        assert!(err.to_string().contains("--born"));
    }

    #[test]
    fn test_update_overlays_current() {
        let current = Biometrics {
            sex: Sex::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            height_cm: 165.0,
            weight_kg: 60.0,
            activity_level: ActivityLevel::Light,
            goal: GoalDirection::Maintain,
        };
        let fields = ProfileFields {
            weight: Some("58kg".to_string()),
            goal: Some("lose".to_string()),
            ..ProfileFields::default()
        };
        let updated = fields.into_biometrics(Some(&current), &utc()).unwrap();
        assert!((updated.weight_kg - 58.0).abs() < f64::EPSILON);
        assert_eq!(updated.goal, GoalDirection::Lose);
        assert_eq!(updated.sex, Sex::Female);
        assert_eq!(updated.activity_level, ActivityLevel::Light);
    }

    #[test]
    fn test_invalid_enum_values_rejected() {
        let fields = ProfileFields {
            activity: Some("couch".to_string()),
            ..ProfileFields::default()
        };
        let current = Biometrics {
            sex: Sex::Male,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: ActivityLevel::Light,
            goal: GoalDirection::Maintain,
        };
        assert!(fields.into_biometrics(Some(&current), &utc()).is_err());
    }
}
