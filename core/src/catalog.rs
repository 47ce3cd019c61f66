use crate::error::{Mutation, Result, WriteOutcome};
use crate::models::{FoodItem, NewFoodItem, new_id, seed_catalog, validate_new_food};
use crate::store::{CATALOG_KEY, Store, load_json, save_json};

/// The shared, append-only set of known foods.
#[derive(Debug)]
pub struct FoodCatalog {
    foods: Vec<FoodItem>,
    loading: bool,
}

impl Default for FoodCatalog {
    fn default() -> Self {
        Self {
            foods: seed_catalog(),
            loading: true,
        }
    }
}

impl FoodCatalog {
    /// Read the catalog from the store. A missing catalog is seeded and written
    /// back at once; an unreadable one falls back to the seed list in memory only.
    pub fn load(&mut self, store: &dyn Store) {
        match load_json::<Vec<FoodItem>>(store, CATALOG_KEY) {
            Ok(Some(foods)) => self.foods = foods,
            Ok(None) => {
                self.foods = seed_catalog();
                tracing::info!(count = self.foods.len(), "seeding food catalog");
                if let Err(err) = save_json(store, CATALOG_KEY, &self.foods) {
                    tracing::warn!(error = %format!("{err:#}"), "failed to persist seed catalog");
                }
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load food catalog; using defaults");
                self.foods = seed_catalog();
            }
        }
        self.loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn list(&self) -> &[FoodItem] {
        &self.foods
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FoodItem> {
        self.foods.iter().find(|f| f.id == id)
    }

    pub fn add(&mut self, store: &dyn Store, candidate: NewFoodItem) -> Result<Mutation<FoodItem>> {
        validate_new_food(&candidate)?;
        let food = FoodItem {
            id: new_id(),
            name: candidate.name.trim().to_string(),
            sugar_content: candidate.sugar_content,
            is_healthy: candidate.is_healthy,
        };
        self.foods.push(food.clone());
        tracing::debug!(id = %food.id, name = %food.name, "added catalog food");

        let write = WriteOutcome::from_save(CATALOG_KEY, save_json(store, CATALOG_KEY, &self.foods));
        Ok(Mutation::new(food, write))
    }

    /// Foods whose name contains `query`, ignoring case. A blank query matches all.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&FoodItem> {
        search(&self.foods, query)
    }

    /// Search, then optionally keep only healthy foods.
    #[must_use]
    pub fn browse(&self, query: &str, healthy_only: bool) -> Vec<&FoodItem> {
        let found = self.search(query);
        if healthy_only {
            filter_healthy(found)
        } else {
            found
        }
    }
}

#[must_use]
pub fn search<'a>(foods: &'a [FoodItem], query: &str) -> Vec<&'a FoodItem> {
    let needle = query.trim().to_lowercase();
    foods
        .iter()
        .filter(|f| needle.is_empty() || f.name.to_lowercase().contains(&needle))
        .collect()
}

#[must_use]
pub fn filter_healthy<'a>(foods: impl IntoIterator<Item = &'a FoodItem>) -> Vec<&'a FoodItem> {
    foods.into_iter().filter(|f| f.is_healthy).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn loaded(store: &MemoryStore) -> FoodCatalog {
        let mut catalog = FoodCatalog::default();
        catalog.load(store);
        catalog
    }

    fn honey() -> NewFoodItem {
        NewFoodItem {
            name: "Honey".to_string(),
            sugar_content: 17.0,
            is_healthy: false,
        }
    }

    #[test]
    fn test_first_load_seeds_and_persists() {
        let store = MemoryStore::new();
        let catalog = FoodCatalog::default();
        assert!(catalog.is_loading());

        let catalog = loaded(&store);
        assert!(!catalog.is_loading());
        assert_eq!(catalog.list().len(), 14);

        let stored: Vec<FoodItem> = serde_json::from_str(&store.raw(CATALOG_KEY).unwrap()).unwrap();
        assert_eq!(stored, catalog.list());
    }

    #[test]
    fn test_existing_catalog_is_not_reseeded() {
        let store = MemoryStore::new();
        let mut catalog = loaded(&store);
        let _ = catalog.add(&store, honey()).unwrap();

        let reloaded = loaded(&store);
        assert_eq!(reloaded.list().len(), 15);
        assert_eq!(reloaded.list()[14].name, "Honey");
    }

    #[test]
    fn test_corrupt_catalog_falls_back_without_overwrite() {
        let store = MemoryStore::new();
        store.save(CATALOG_KEY, "not json").unwrap();

        let catalog = loaded(&store);
        assert_eq!(catalog.list().len(), 14);
        assert_eq!(store.raw(CATALOG_KEY).as_deref(), Some("not json"));
    }

    #[test]
    fn test_unreadable_store_falls_back_to_seed() {
        let store = MemoryStore::new();
        store.set_fail_reads(true);
        let catalog = loaded(&store);
        assert_eq!(catalog.list().len(), 14);
        assert!(!catalog.is_loading());
    }

    #[test]
    fn test_add_assigns_fresh_id_and_appends() {
        let store = MemoryStore::new();
        let mut catalog = loaded(&store);

        let added = catalog.add(&store, honey()).unwrap();
        assert!(added.write.is_persisted());
        let food = added.value;
        assert!(catalog.list().iter().filter(|f| f.id == food.id).count() == 1);
        assert_eq!(catalog.list().last().unwrap(), &food);
        assert_eq!(catalog.get(&food.id).unwrap().name, "Honey");
    }

    #[test]
    fn test_add_rejects_invalid_candidate() {
        let store = MemoryStore::new();
        let mut catalog = loaded(&store);

        let blank = NewFoodItem {
            name: "   ".to_string(),
            ..honey()
        };
        assert!(catalog.add(&store, blank).unwrap_err().is_validation());

        let negative = NewFoodItem {
            sugar_content: -1.0,
            ..honey()
        };
        assert!(catalog.add(&store, negative).is_err());
        assert_eq!(catalog.list().len(), 14);
    }

    #[test]
    fn test_add_keeps_food_when_write_fails() {
        let store = MemoryStore::new();
        let mut catalog = loaded(&store);
        store.set_fail_writes(true);

        let added = catalog.add(&store, honey()).unwrap();
        assert!(!added.write.is_persisted());
        assert_eq!(catalog.list().len(), 15);

        let stored: Vec<FoodItem> = serde_json::from_str(&store.raw(CATALOG_KEY).unwrap()).unwrap();
        assert_eq!(stored.len(), 14);
    }

    #[test]
    fn test_search_chocolate_case_insensitive() {
        let store = MemoryStore::new();
        let catalog = loaded(&store);

        let names: Vec<&str> = catalog.search("choc").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Chocolate Bar", "Chocolate bars"]);
        assert_eq!(catalog.search("CHOC").len(), 2);
    }

    #[test]
    fn test_search_empty_query_returns_all_in_order() {
        let store = MemoryStore::new();
        let catalog = loaded(&store);
        let all = catalog.search("");
        assert_eq!(all.len(), 14);
        assert_eq!(all[0].name, "Apple");
        assert_eq!(all[13].name, "Cupcakes");
        assert!(catalog.search("pizza").is_empty());
    }

    #[test]
    fn test_filter_healthy() {
        let seed = seed_catalog();
        let healthy = filter_healthy(&seed);
        assert_eq!(healthy.len(), 6);
        assert!(healthy.iter().all(|f| f.is_healthy));
    }

    #[test]
    fn test_browse_combines_search_and_filter() {
        let store = MemoryStore::new();
        let catalog = loaded(&store);
        let names: Vec<&str> = catalog
            .browse("an", true)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["Banana", "Orange"]);
        assert_eq!(catalog.browse("an", false).len(), 3);
    }

    #[test]
    fn test_list_is_idempotent() {
        let store = MemoryStore::new();
        let catalog = loaded(&store);
        assert_eq!(catalog.list().to_vec(), catalog.list().to_vec());
    }
}
