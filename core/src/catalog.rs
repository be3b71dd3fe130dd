use std::collections::HashMap;

use chrono::Utc;

use crate::error::{NutritionError, Result};
use crate::models::{Food, FoodId, NewFood, validate_food_data};

/// Read-only access to food catalog entries by identity.
///
/// Implemented by whatever the persistence layer keeps foods in; the engine
/// only ever resolves references through this trait.
pub trait FoodLookup: Send + Sync {
    fn lookup(&self, id: FoodId) -> Option<&Food>;
}

impl FoodLookup for HashMap<FoodId, Food> {
    fn lookup(&self, id: FoodId) -> Option<&Food> {
        self.get(&id)
    }
}

/// Versioned in-memory food catalog.
///
/// Entries are never edited in place: `revise` adds a new version that
/// supersedes the old one, and the old version stays resolvable so that meal
/// items logged against it keep their meaning.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    foods: HashMap<FoodId, Food>,
    superseded_by: HashMap<FoodId, FoodId>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from stored entries, restoring the version chain.
    ///
    /// Every `supersedes` link must name another stored entry, no entry may be
    /// superseded twice, and no chain may loop back on itself.
    pub fn from_foods(foods: Vec<Food>) -> Result<Self> {
        let mut catalog = Self::new();
        for food in foods {
            let id = food.id;
            if catalog.foods.insert(id, food).is_some() {
                return Err(NutritionError::InvalidFood(format!(
                    "food {id} appears more than once"
                )));
            }
        }

        for food in catalog.foods.values() {
            let Some(previous) = food.supersedes else {
                continue;
            };
            if previous == food.id {
                return Err(NutritionError::InvalidFood(format!(
                    "food {previous} supersedes itself"
                )));
            }
            if !catalog.foods.contains_key(&previous) {
                return Err(NutritionError::InvalidFood(format!(
                    "food {} supersedes unknown food {previous}",
                    food.id
                )));
            }
            if let Some(other) = catalog.superseded_by.insert(previous, food.id) {
                return Err(NutritionError::InvalidFood(format!(
                    "food {previous} is superseded by both {other} and {}",
                    food.id
                )));
            }
        }

        if let Some(id) = catalog
            .foods
            .keys()
            .find(|id| catalog.chain_end(**id).is_none())
        {
            return Err(NutritionError::InvalidFood(format!(
                "food {id} is part of a revision cycle"
            )));
        }
        Ok(catalog)
    }

    fn put(&mut self, food: Food) {
        if let Some(previous) = food.supersedes {
            self.superseded_by.insert(previous, food.id);
        }
        self.foods.insert(food.id, food);
    }

    pub fn insert(&mut self, food: &NewFood) -> Result<Food> {
        validate_food_data(food)?;
        let entry = build_entry(food, 1, None);
        self.put(entry.clone());
        Ok(entry)
    }

    /// Record an edited version of `id`. Only the newest version of a chain can
    /// be revised.
    pub fn revise(&mut self, id: FoodId, food: &NewFood) -> Result<Food> {
        let version = self
            .foods
            .get(&id)
            .ok_or(NutritionError::UnknownFood(id))?
            .version;
        if let Some(newer) = self.superseded_by.get(&id) {
            return Err(NutritionError::InvalidFood(format!(
                "food {id} was already revised as {newer}"
            )));
        }
        validate_food_data(food)?;
        let entry = build_entry(food, version + 1, Some(id));
        self.put(entry.clone());
        Ok(entry)
    }

    /// Remove an entry. Callers are responsible for checking it is unreferenced.
    pub fn remove(&mut self, id: FoodId) -> Option<Food> {
        let food = self.foods.remove(&id)?;
        self.superseded_by.remove(&id);
        if let Some(previous) = food.supersedes {
            self.superseded_by.remove(&previous);
        }
        Some(food)
    }

    /// Newest version in the chain that `id` belongs to.
    #[must_use]
    pub fn latest(&self, id: FoodId) -> Option<&Food> {
        self.foods.get(&self.chain_end(id)?)
    }

    /// Follow `superseded_by` links from `id`. `None` if the walk outlasts the
    /// number of stored entries, which only a cycle can do.
    fn chain_end(&self, id: FoodId) -> Option<FoodId> {
        let mut current = id;
        for _ in 0..=self.foods.len() {
            match self.superseded_by.get(&current) {
                Some(next) => current = *next,
                None => return Some(current),
            }
        }
        None
    }

    #[must_use]
    pub fn is_current(&self, id: FoodId) -> bool {
        self.foods.contains_key(&id) && !self.superseded_by.contains_key(&id)
    }

    #[must_use]
    pub fn by_barcode(&self, barcode: &str) -> Option<&Food> {
        self.current()
            .find(|f| f.barcode.as_deref() == Some(barcode))
    }

    /// Current versions whose name or brand contains `query`, sorted by name.
    #[must_use]
    pub fn search(&self, query: Option<&str>) -> Vec<&Food> {
        let needle = query.map(str::to_lowercase);
        let mut found: Vec<&Food> = self
            .current()
            .filter(|f| match &needle {
                None => true,
                Some(q) => {
                    f.name.to_lowercase().contains(q)
                        || f.brand.as_ref().is_some_and(|b| b.to_lowercase().contains(q))
                }
            })
            .collect();
        found.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        found
    }

    fn current(&self) -> impl Iterator<Item = &Food> {
        self.foods
            .values()
            .filter(|f| !self.superseded_by.contains_key(&f.id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// Every stored version, current or superseded, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Food> {
        self.foods.values()
    }

    /// All stored versions, oldest first, for export.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Food> {
        let mut foods: Vec<Food> = self.iter().cloned().collect();
        foods.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.version.cmp(&b.version))
                .then(a.id.cmp(&b.id))
        });
        foods
    }
}

impl FoodLookup for Catalog {
    fn lookup(&self, id: FoodId) -> Option<&Food> {
        self.foods.get(&id)
    }
}

fn build_entry(food: &NewFood, version: u32, supersedes: Option<FoodId>) -> Food {
    Food {
        id: FoodId::random(),
        version,
        supersedes,
        name: food.name.trim().to_string(),
        brand: food.brand.clone(),
        barcode: food.barcode.clone(),
        serving: food.serving.clone(),
        nutrients: food.nutrients,
        portions: food.portions.clone(),
        density_g_per_ml: food.density_g_per_ml,
        source: food.source.clone(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutrientVector, Serving};

    fn sample_food() -> NewFood {
        NewFood {
            name: "Test Food".to_string(),
            brand: Some("Brand".to_string()),
            barcode: Some("1234567890".to_string()),
            serving: Serving::new(100.0, "g"),
            nutrients: NutrientVector::new(100.0, 10.0, 20.0, 5.0),
            portions: vec![],
            density_g_per_ml: None,
            source: "manual".to_string(),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut catalog = Catalog::new();
        let food = catalog.insert(&sample_food()).unwrap();
        assert_eq!(food.version, 1);
        assert_eq!(catalog.lookup(food.id).unwrap().name, "Test Food");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_insert_rejects_invalid_food() {
        let mut catalog = Catalog::new();
        let mut bad = sample_food();
        bad.name = String::new();
        assert!(catalog.insert(&bad).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_revise_keeps_old_version() {
        let mut catalog = Catalog::new();
        let v1 = catalog.insert(&sample_food()).unwrap();
        let mut edited = sample_food();
        edited.nutrients.energy_kcal = 120.0;
        let v2 = catalog.revise(v1.id, &edited).unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.supersedes, Some(v1.id));
        assert!((catalog.lookup(v1.id).unwrap().nutrients.energy_kcal - 100.0).abs() < 0.01);
        assert_eq!(catalog.latest(v1.id).unwrap().id, v2.id);
        assert!(!catalog.is_current(v1.id));
        assert!(catalog.is_current(v2.id));
    }

    #[test]
    fn test_revise_only_newest_version() {
        let mut catalog = Catalog::new();
        let v1 = catalog.insert(&sample_food()).unwrap();
        catalog.revise(v1.id, &sample_food()).unwrap();
        assert!(catalog.revise(v1.id, &sample_food()).is_err());
    }

    #[test]
    fn test_revise_unknown_food() {
        let mut catalog = Catalog::new();
        let id = FoodId::random();
        assert_eq!(
            catalog.revise(id, &sample_food()).unwrap_err(),
            NutritionError::UnknownFood(id)
        );
    }

    #[test]
    fn test_search_and_barcode_only_current() {
        let mut catalog = Catalog::new();
        let v1 = catalog.insert(&sample_food()).unwrap();
        let v2 = catalog.revise(v1.id, &sample_food()).unwrap();
        let mut other = sample_food();
        other.name = "Apple".to_string();
        other.barcode = None;
        other.brand = None;
        catalog.insert(&other).unwrap();

        let all = catalog.search(None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Apple");

        let by_brand = catalog.search(Some("bRaNd"));
        assert_eq!(by_brand.len(), 1);
        assert_eq!(by_brand[0].id, v2.id);

        assert_eq!(catalog.by_barcode("1234567890").unwrap().id, v2.id);
        assert!(catalog.by_barcode("0000").is_none());
    }

    #[test]
    fn test_from_foods_restores_chain() {
        let mut catalog = Catalog::new();
        let v1 = catalog.insert(&sample_food()).unwrap();
        let v2 = catalog.revise(v1.id, &sample_food()).unwrap();

        let restored = Catalog::from_foods(catalog.to_vec()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.latest(v1.id).unwrap().id, v2.id);
    }

    fn stored(name: &str) -> Food {
        let mut food = build_entry(&sample_food(), 1, None);
        food.name = name.to_string();
        food
    }

    #[test]
    fn test_from_foods_rejects_revision_cycle() {
        let mut a = stored("A");
        let mut b = stored("B");
        a.supersedes = Some(b.id);
        b.supersedes = Some(a.id);
        let err = Catalog::from_foods(vec![a, b]).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidFood(ref m) if m.contains("cycle")));
    }

    #[test]
    fn test_from_foods_rejects_broken_links() {
        let mut own = stored("Self");
        own.supersedes = Some(own.id);
        assert!(Catalog::from_foods(vec![own]).is_err());

        let mut dangling = stored("Dangling");
        dangling.supersedes = Some(FoodId::random());
        assert!(Catalog::from_foods(vec![dangling]).is_err());

        let base = stored("Base");
        let mut left = stored("Left");
        let mut right = stored("Right");
        left.supersedes = Some(base.id);
        right.supersedes = Some(base.id);
        assert!(Catalog::from_foods(vec![base.clone(), left, right]).is_err());

        assert!(Catalog::from_foods(vec![base.clone(), base]).is_err());
    }

    #[test]
    fn test_latest_stops_on_cycle() {
        let mut catalog = Catalog::new();
        let a = catalog.insert(&sample_food()).unwrap();
        let b = catalog.insert(&sample_food()).unwrap();
        catalog.superseded_by.insert(a.id, b.id);
        catalog.superseded_by.insert(b.id, a.id);
        assert!(catalog.latest(a.id).is_none());
    }

    #[test]
    fn test_hashmap_lookup() {
        let mut catalog = Catalog::new();
        let food = catalog.insert(&sample_food()).unwrap();
        let map: HashMap<FoodId, Food> = [(food.id, food.clone())].into_iter().collect();
        assert_eq!(map.lookup(food.id), Some(&food));
        assert!(map.lookup(FoodId::random()).is_none());
    }
}
