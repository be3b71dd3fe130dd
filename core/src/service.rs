use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{aggregate_meal, item_nutrients};
use crate::catalog::{Catalog, FoodLookup};
use crate::error::{GoalWarning, NutritionError, Result};
use crate::goals::NutritionPolicy;
use crate::models::{
    Biometrics, DailyStat, Food, FoodId, JOURNAL_VERSION, Journal, Meal, MealId, MealItem,
    MealType, NewFood, NutritionGoals, PeriodSummary, UserProfile, validate_food_data,
    validate_quantity,
};
use crate::stats;

/// Counts reported after a journal import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub foods: usize,
    pub meals: usize,
    pub items: usize,
    pub profile: bool,
}

/// Owns the catalog, logged meals, and profile, and keeps every cached meal
/// total consistent with its items.
///
/// Mutations are all-or-nothing: a failing operation leaves the service
/// exactly as it was.
#[derive(Debug, Clone)]
pub struct NutritionService {
    catalog: Catalog,
    meals: Vec<Meal>,
    profile: Option<UserProfile>,
    policy: NutritionPolicy,
}

impl NutritionService {
    pub fn new(policy: NutritionPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            catalog: Catalog::new(),
            meals: Vec::new(),
            profile: None,
            policy,
        })
    }

    /// Open a service over a stored journal.
    pub fn from_journal(journal: Journal, policy: NutritionPolicy) -> Result<Self> {
        let mut svc = Self::new(policy)?;
        svc.import(journal)?;
        Ok(svc)
    }

    #[must_use]
    pub fn policy(&self) -> &NutritionPolicy {
        &self.policy
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    // --- Foods ---

    pub fn insert_food(&mut self, food: &NewFood) -> Result<Food> {
        let food = self.catalog.insert(food)?;
        debug!(food_id = %food.id, name = %food.name, "inserted food");
        Ok(food)
    }

    /// Store an edited version of a food. Meals logged against the old version
    /// keep their totals.
    pub fn revise_food(&mut self, id: FoodId, food: &NewFood) -> Result<Food> {
        let food = self.catalog.revise(id, food)?;
        debug!(previous = %id, food_id = %food.id, version = food.version, "revised food");
        Ok(food)
    }

    /// Remove a food that no meal item references.
    pub fn delete_food(&mut self, id: FoodId) -> Result<Food> {
        if self.catalog.lookup(id).is_none() {
            return Err(NutritionError::UnknownFood(id));
        }
        if self
            .meals
            .iter()
            .flat_map(|m| &m.items)
            .any(|item| item.food_id == id)
        {
            return Err(NutritionError::FoodInUse(id));
        }
        self.catalog
            .remove(id)
            .ok_or(NutritionError::UnknownFood(id))
    }

    #[must_use]
    pub fn food(&self, id: FoodId) -> Option<&Food> {
        self.catalog.lookup(id)
    }

    #[must_use]
    pub fn list_foods(&self, search: Option<&str>) -> Vec<&Food> {
        self.catalog.search(search)
    }

    // --- Meals ---

    #[must_use]
    pub fn meal(&self, id: MealId) -> Option<&Meal> {
        self.meals.iter().find(|m| m.id == id)
    }

    /// Meals whose local day is `date`, in consumption order.
    #[must_use]
    pub fn meals_on(&self, date: NaiveDate, tz: &FixedOffset) -> Vec<&Meal> {
        let mut meals: Vec<&Meal> = self
            .meals
            .iter()
            .filter(|m| m.local_date(tz) == date)
            .collect();
        meals.sort_by_key(|m| m.consumed_at);
        meals
    }

    fn meal_index(&self, id: MealId) -> Result<usize> {
        self.meals
            .iter()
            .position(|m| m.id == id)
            .ok_or(NutritionError::UnknownMeal(id))
    }

    /// Append an item to the `meal_type` meal of the local day `consumed_at`
    /// falls on, creating that meal if needed. The item is rejected, and
    /// nothing changes, if it cannot be converted.
    pub fn log_item(
        &mut self,
        meal_type: MealType,
        consumed_at: DateTime<Utc>,
        item: MealItem,
        tz: &FixedOffset,
    ) -> Result<&Meal> {
        item_nutrients(&item, &self.catalog)?;

        let date = consumed_at.with_timezone(tz).date_naive();
        let existing = self
            .meals
            .iter()
            .position(|m| m.meal_type == meal_type && m.local_date(tz) == date);

        let index = match existing {
            Some(index) => {
                let mut meal = self.meals[index].clone();
                meal.items.push(item);
                meal.refresh_totals(&self.catalog)?;
                self.meals[index] = meal;
                index
            }
            None => {
                let mut meal = Meal::new(meal_type, consumed_at);
                meal.items.push(item);
                meal.refresh_totals(&self.catalog)?;
                self.meals.push(meal);
                self.meals.len() - 1
            }
        };

        let meal = &self.meals[index];
        debug!(
            meal_id = %meal.id,
            meal_type = %meal.meal_type,
            %date,
            items = meal.items.len(),
            "logged item"
        );
        Ok(meal)
    }

    /// Change the quantity and unit of one item.
    pub fn update_item(
        &mut self,
        meal_id: MealId,
        index: usize,
        quantity: f64,
        unit: &str,
    ) -> Result<&Meal> {
        validate_quantity(quantity)?;
        let meal_index = self.meal_index(meal_id)?;
        let mut meal = self.meals[meal_index].clone();
        let item = meal
            .items
            .get_mut(index)
            .ok_or(NutritionError::UnknownItem {
                meal: meal_id,
                index,
            })?;
        item.quantity = quantity;
        item.unit = unit.to_string();
        meal.refresh_totals(&self.catalog)?;
        self.meals[meal_index] = meal;
        Ok(&self.meals[meal_index])
    }

    /// Remove one item. A meal left without items is deleted and `None` is
    /// returned in its place.
    pub fn remove_item(&mut self, meal_id: MealId, index: usize) -> Result<Option<&Meal>> {
        let meal_index = self.meal_index(meal_id)?;
        let mut meal = self.meals[meal_index].clone();
        if index >= meal.items.len() {
            return Err(NutritionError::UnknownItem {
                meal: meal_id,
                index,
            });
        }
        meal.items.remove(index);
        if meal.items.is_empty() {
            self.meals.remove(meal_index);
            debug!(%meal_id, "removed last item, meal deleted");
            return Ok(None);
        }
        meal.refresh_totals(&self.catalog)?;
        self.meals[meal_index] = meal;
        Ok(Some(&self.meals[meal_index]))
    }

    pub fn delete_meal(&mut self, meal_id: MealId) -> Result<Meal> {
        let index = self.meal_index(meal_id)?;
        Ok(self.meals.remove(index))
    }

    /// Recompute every cached meal total from its items. Either all totals
    /// are replaced or, on the first failing meal, none are.
    pub fn refresh_all_totals(&mut self) -> Result<()> {
        let totals = self
            .meals
            .iter()
            .map(|m| aggregate_meal(&m.items, &self.catalog))
            .collect::<Result<Vec<_>>>()?;
        for (meal, total) in self.meals.iter_mut().zip(totals) {
            meal.totals = total;
        }
        debug!(meals = self.meals.len(), "refreshed meal totals");
        Ok(())
    }

    // --- Profile & goals ---

    /// Create or update the profile; goals are recomputed as of `on`.
    pub fn set_profile(
        &mut self,
        biometrics: Biometrics,
        on: NaiveDate,
    ) -> Result<Option<GoalWarning>> {
        match &mut self.profile {
            Some(profile) => profile.update_biometrics(biometrics, &self.policy, on),
            None => {
                let (profile, warning) = UserProfile::new(biometrics, &self.policy, on)?;
                self.profile = Some(profile);
                Ok(warning)
            }
        }
    }

    /// Swap in a new policy and recompute the profile's goals with it.
    pub fn set_policy(
        &mut self,
        policy: NutritionPolicy,
        on: NaiveDate,
    ) -> Result<Option<GoalWarning>> {
        policy.validate()?;
        let warning = match &self.profile {
            Some(profile) => {
                let mut profile = profile.clone();
                let warning = profile.refresh_goals(&policy, on)?;
                self.profile = Some(profile);
                warning
            }
            None => None,
        };
        self.policy = policy;
        Ok(warning)
    }

    #[must_use]
    pub fn goals(&self) -> Option<&NutritionGoals> {
        self.profile.as_ref().map(|p| &p.goals)
    }

    // --- Reports ---

    #[must_use]
    pub fn daily_stat(&self, date: NaiveDate, tz: &FixedOffset) -> DailyStat {
        stats::daily_stat(&self.meals, date, self.goals(), tz)
    }

    /// Seven consecutive days starting at `start`.
    pub fn weekly_stat(&self, start: NaiveDate, tz: &FixedOffset) -> Result<Vec<DailyStat>> {
        self.days(start, 7, tz)
    }

    /// `day_count` consecutive days starting at `start`.
    pub fn days(
        &self,
        start: NaiveDate,
        day_count: u32,
        tz: &FixedOffset,
    ) -> Result<Vec<DailyStat>> {
        stats::weekly_stat(&self.meals, start, day_count, self.goals(), tz)
    }

    pub fn period_summary(
        &self,
        start: NaiveDate,
        day_count: u32,
        tz: &FixedOffset,
    ) -> Result<PeriodSummary> {
        Ok(stats::period_summary(&self.days(start, day_count, tz)?))
    }

    #[must_use]
    pub fn logging_streak(&self, today: NaiveDate, tz: &FixedOffset) -> u32 {
        stats::logging_streak(&self.meals, today, tz)
    }

    // --- Export / Import ---

    #[must_use]
    pub fn export(&self) -> Journal {
        let mut meals = self.meals.clone();
        meals.sort_by_key(|m| m.consumed_at);
        Journal {
            version: JOURNAL_VERSION,
            exported_at: Some(Utc::now()),
            foods: self.catalog.to_vec(),
            meals,
            profile: self.profile.clone(),
        }
    }

    /// Replace the current state with `journal`. Foods and items are
    /// validated and every meal total is recomputed against the imported
    /// catalog; any failure leaves the service untouched.
    pub fn import(&mut self, journal: Journal) -> Result<ImportSummary> {
        if journal.version == 0 || journal.version > JOURNAL_VERSION {
            return Err(NutritionError::UnsupportedVersion(journal.version));
        }
        for food in &journal.foods {
            validate_food_data(&NewFood::from(food))?;
        }
        let catalog = Catalog::from_foods(journal.foods)?;

        let mut meals = journal.meals;
        let mut items = 0;
        for meal in &mut meals {
            for item in &meal.items {
                validate_quantity(item.quantity)?;
            }
            items += meal.items.len();
            meal.refresh_totals(&catalog)?;
        }

        let summary = ImportSummary {
            foods: catalog.len(),
            meals: meals.len(),
            items,
            profile: journal.profile.is_some(),
        };
        self.catalog = catalog;
        self.meals = meals;
        self.profile = journal.profile;
        info!(
            foods = summary.foods,
            meals = summary.meals,
            "imported journal"
        );
        Ok(summary)
    }
}
