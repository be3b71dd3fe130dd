//! Daily energy and macro targets from biometrics.
//!
//! Baseline expenditure uses the Mifflin-St Jeor basal rate scaled by an
//! activity multiplier:
//!
//! `BMR = 10 x kg + 6.25 x cm - 5 x age + s` where `s` is +5 (male) or -161 (female)
//!
//! Mifflin, M.D., et al. (1990). A new predictive equation for resting energy
//! expenditure. *American Journal of Clinical Nutrition*, 51(2), 241-247.
//!
//! Every coefficient lives in [`NutritionPolicy`], so alternate policies can be
//! substituted without touching the algorithm.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GoalWarning, NutritionError, Result};
use crate::models::{ActivityLevel, Biometrics, GoalDirection, NutritionGoals, Sex, UserProfile};

/// Mifflin-St Jeor coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmrCoefficients {
    pub weight_coef: f64,
    pub height_coef: f64,
    pub age_coef: f64,
    pub male_constant: f64,
    pub female_constant: f64,
}

impl Default for BmrCoefficients {
    fn default() -> Self {
        Self {
            weight_coef: 10.0,
            height_coef: 6.25,
            age_coef: -5.0,
            male_constant: 5.0,
            female_constant: -161.0,
        }
    }
}

/// Multipliers applied to the basal rate, one per activity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityMultipliers {
    pub sedentary: f64,
    pub light: f64,
    pub moderate: f64,
    pub active: f64,
    pub very_active: f64,
}

impl Default for ActivityMultipliers {
    fn default() -> Self {
        Self {
            sedentary: 1.2,
            light: 1.375,
            moderate: 1.55,
            active: 1.725,
            very_active: 1.9,
        }
    }
}

impl ActivityMultipliers {
    #[must_use]
    pub fn factor(&self, level: ActivityLevel) -> f64 {
        match level {
            ActivityLevel::Sedentary => self.sedentary,
            ActivityLevel::Light => self.light,
            ActivityLevel::Moderate => self.moderate,
            ActivityLevel::Active => self.active,
            ActivityLevel::VeryActive => self.very_active,
        }
    }

    fn in_order(&self) -> [f64; 5] {
        [
            self.sedentary,
            self.light,
            self.moderate,
            self.active,
            self.very_active,
        ]
    }
}

/// kcal per gram of each macronutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyDensity {
    pub protein_kcal_per_g: f64,
    pub carbs_kcal_per_g: f64,
    pub fat_kcal_per_g: f64,
}

impl Default for EnergyDensity {
    fn default() -> Self {
        Self {
            protein_kcal_per_g: 4.0,
            carbs_kcal_per_g: 4.0,
            fat_kcal_per_g: 9.0,
        }
    }
}

/// Immutable set of constants the goal calculator works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionPolicy {
    pub bmr: BmrCoefficients,
    pub activity_multipliers: ActivityMultipliers,
    /// Floor applied to the basal rate before the activity multiplier.
    pub min_bmr_kcal: f64,
    pub deficit_kcal: f64,
    pub surplus_kcal: f64,
    pub protein_g_per_kg: f64,
    /// Share of the energy goal allocated to fat, in `[0, 1)`.
    pub fat_energy_fraction: f64,
    pub energy_density: EnergyDensity,
}

impl Default for NutritionPolicy {
    fn default() -> Self {
        Self {
            bmr: BmrCoefficients::default(),
            activity_multipliers: ActivityMultipliers::default(),
            min_bmr_kcal: 1000.0,
            deficit_kcal: 500.0,
            surplus_kcal: 300.0,
            protein_g_per_kg: 2.0,
            fat_energy_fraction: 0.25,
            energy_density: EnergyDensity::default(),
        }
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl NutritionPolicy {
    pub fn validate(&self) -> Result<()> {
        let b = &self.bmr;
        if ![
            b.weight_coef,
            b.height_coef,
            b.age_coef,
            b.male_constant,
            b.female_constant,
        ]
        .iter()
        .all(|v| v.is_finite())
        {
            return Err(NutritionError::InvalidPolicy("BMR coefficients must be finite"));
        }

        let factors = self.activity_multipliers.in_order();
        if !factors.iter().all(|f| f.is_finite() && *f > 1.0) {
            return Err(NutritionError::InvalidPolicy(
                "activity multipliers must be greater than 1.0",
            ));
        }
        if !factors.windows(2).all(|w| w[0] < w[1]) {
            return Err(NutritionError::InvalidPolicy(
                "activity multipliers must increase from sedentary to very_active",
            ));
        }

        if !non_negative(self.min_bmr_kcal)
            || !non_negative(self.deficit_kcal)
            || !non_negative(self.surplus_kcal)
        {
            return Err(NutritionError::InvalidPolicy(
                "BMR floor and goal offsets must be non-negative",
            ));
        }
        if self.min_bmr_kcal * self.activity_multipliers.sedentary <= self.deficit_kcal {
            return Err(NutritionError::InvalidPolicy(
                "deficit must leave a positive energy goal at the BMR floor",
            ));
        }
        if !non_negative(self.protein_g_per_kg) {
            return Err(NutritionError::InvalidPolicy(
                "protein per kg must be non-negative",
            ));
        }
        if !(0.0..1.0).contains(&self.fat_energy_fraction) {
            return Err(NutritionError::InvalidPolicy(
                "fat energy fraction must be in [0, 1)",
            ));
        }
        let d = &self.energy_density;
        if ![d.protein_kcal_per_g, d.carbs_kcal_per_g, d.fat_kcal_per_g]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
        {
            return Err(NutritionError::InvalidPolicy(
                "energy densities must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Signed kcal adjustment for a goal direction.
    #[must_use]
    pub fn goal_offset(&self, goal: GoalDirection) -> f64 {
        match goal {
            GoalDirection::Lose => -self.deficit_kcal,
            GoalDirection::Maintain => 0.0,
            GoalDirection::Gain => self.surplus_kcal,
        }
    }
}

/// Goals plus any non-fatal warning raised while computing them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalOutcome {
    pub goals: NutritionGoals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<GoalWarning>,
}

/// Basal metabolic rate (kcal/day), floored at the policy minimum.
#[must_use]
pub fn basal_metabolic_rate(biometrics: &Biometrics, age: u32, policy: &NutritionPolicy) -> f64 {
    let b = &policy.bmr;
    let sex_constant = match biometrics.sex {
        Sex::Male => b.male_constant,
        Sex::Female => b.female_constant,
    };
    let bmr = b.weight_coef * biometrics.weight_kg
        + b.height_coef * biometrics.height_cm
        + b.age_coef * f64::from(age)
        + sex_constant;
    bmr.max(policy.min_bmr_kcal)
}

/// Derive daily targets for `biometrics` as of `on`.
///
/// Carbohydrate is whatever energy protein and fat leave over, computed from
/// unrounded values and rounded once at the end.
pub fn compute_goals(
    biometrics: &Biometrics,
    policy: &NutritionPolicy,
    on: NaiveDate,
) -> Result<GoalOutcome> {
    policy.validate()?;
    let age = biometrics.validate(on)?;

    let bmr = basal_metabolic_rate(biometrics, age, policy);
    let baseline = bmr * policy.activity_multipliers.factor(biometrics.activity_level);
    let energy = baseline + policy.goal_offset(biometrics.goal);

    let density = &policy.energy_density;
    let protein_g = biometrics.weight_kg * policy.protein_g_per_kg;
    let fat_kcal = energy * policy.fat_energy_fraction;
    let fat_g = fat_kcal / density.fat_kcal_per_g;

    let remainder_kcal = energy - protein_g * density.protein_kcal_per_g - fat_kcal;
    let (carbs_g, warning) = if remainder_kcal < 0.0 {
        let warning = GoalWarning::CarbohydrateUnderflow {
            shortfall_kcal: -remainder_kcal,
        };
        warn!(shortfall_kcal = -remainder_kcal, "{warning}");
        (0.0, Some(warning))
    } else {
        (remainder_kcal / density.carbs_kcal_per_g, None)
    };

    let goals = NutritionGoals {
        baseline_kcal: baseline.round(),
        energy_kcal: energy.round(),
        protein_g: protein_g.round(),
        carbs_g: carbs_g.round(),
        fat_g: fat_g.round(),
        computed_on: on,
    };
    debug!(
        age,
        bmr,
        baseline_kcal = goals.baseline_kcal,
        energy_kcal = goals.energy_kcal,
        "computed nutrition goals"
    );
    Ok(GoalOutcome { goals, warning })
}

impl UserProfile {
    /// Build a profile with goals derived from `biometrics`.
    pub fn new(
        biometrics: Biometrics,
        policy: &NutritionPolicy,
        on: NaiveDate,
    ) -> Result<(Self, Option<GoalWarning>)> {
        let outcome = compute_goals(&biometrics, policy, on)?;
        Ok((
            Self {
                biometrics,
                goals: outcome.goals,
            },
            outcome.warning,
        ))
    }

    /// Replace the biometrics. Goals are recomputed when anything changed;
    /// on error the profile is left as it was.
    pub fn update_biometrics(
        &mut self,
        biometrics: Biometrics,
        policy: &NutritionPolicy,
        on: NaiveDate,
    ) -> Result<Option<GoalWarning>> {
        if biometrics == self.biometrics {
            return Ok(None);
        }
        let outcome = compute_goals(&biometrics, policy, on)?;
        self.biometrics = biometrics;
        self.goals = outcome.goals;
        Ok(outcome.warning)
    }

    /// Recompute goals from the stored biometrics, e.g. after a policy change.
    pub fn refresh_goals(
        &mut self,
        policy: &NutritionPolicy,
        on: NaiveDate,
    ) -> Result<Option<GoalWarning>> {
        let outcome = compute_goals(&self.biometrics, policy, on)?;
        self.goals = outcome.goals;
        Ok(outcome.warning)
    }
}
