use chrono::Utc;

use crate::error::{Mutation, Result, WriteOutcome};
use crate::limits::total;
use crate::models::{FoodItem, SugarEntry, new_id, validate_foods};
use crate::store::{ENTRIES_KEY, Store, load_json, save_json};

/// Append-only history of submitted intake records.
#[derive(Debug)]
pub struct IntakeLedger {
    entries: Vec<SugarEntry>,
    loading: bool,
}

impl Default for IntakeLedger {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            loading: true,
        }
    }
}

impl IntakeLedger {
    pub fn load(&mut self, store: &dyn Store) {
        self.entries = match load_json(store, ENTRIES_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load entries; starting empty");
                Vec::new()
            }
        };
        self.loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Entries in the order they were submitted.
    #[must_use]
    pub fn list(&self) -> &[SugarEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SugarEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Newest first. Entries sharing a timestamp keep their submission order.
    #[must_use]
    pub fn sorted_by_date_desc(&self) -> Vec<&SugarEntry> {
        let mut sorted: Vec<&SugarEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    /// Record `foods` as a new entry dated now. The total is fixed at this point.
    pub fn add_entry(&mut self, store: &dyn Store, foods: Vec<FoodItem>) -> Result<Mutation<SugarEntry>> {
        validate_foods(&foods)?;
        let entry = SugarEntry {
            id: new_id(),
            date: Utc::now(),
            total_sugar: total(&foods),
            foods,
        };
        self.entries.push(entry.clone());
        tracing::debug!(id = %entry.id, total = entry.total_sugar, "recorded intake entry");

        let write = WriteOutcome::from_save(ENTRIES_KEY, save_json(store, ENTRIES_KEY, &self.entries));
        Ok(Mutation::new(entry, write))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::seed_catalog;
    use crate::store::MemoryStore;

    fn loaded(store: &MemoryStore) -> IntakeLedger {
        let mut ledger = IntakeLedger::default();
        ledger.load(store);
        ledger
    }

    fn foods(names: &[&str]) -> Vec<FoodItem> {
        let seed = seed_catalog();
        names
            .iter()
            .map(|n| seed.iter().find(|f| f.name == *n).unwrap().clone())
            .collect()
    }

    #[test]
    fn test_empty_on_first_load() {
        let store = MemoryStore::new();
        let ledger = IntakeLedger::default();
        assert!(ledger.is_loading());
        let ledger = loaded(&store);
        assert!(!ledger.is_loading());
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_add_entry_computes_total() {
        let store = MemoryStore::new();
        let mut ledger = loaded(&store);

        let before = Utc::now();
        let entry = ledger
            .add_entry(&store, foods(&["Apple", "Banana", "Apple"]))
            .unwrap()
            .into_result()
            .unwrap();
        let after = Utc::now();

        assert!((entry.total_sugar - 34.0).abs() < f64::EPSILON);
        assert_eq!(entry.foods.len(), 3);
        assert_eq!(entry.foods[0].name, "Apple");
        assert_eq!(entry.foods[2].name, "Apple");
        assert!(entry.date >= before && entry.date <= after);
        assert_eq!(ledger.get(&entry.id), Some(&entry));
    }

    #[test]
    fn test_add_entry_rejects_empty() {
        let store = MemoryStore::new();
        let mut ledger = loaded(&store);
        let err = ledger.add_entry(&store, Vec::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(ledger.list().is_empty());
        assert!(store.raw(ENTRIES_KEY).is_none());
    }

    #[test]
    fn test_entries_survive_reload() {
        let store = MemoryStore::new();
        let mut ledger = loaded(&store);
        let first = ledger.add_entry(&store, foods(&["Carrot"])).unwrap().value;
        let second = ledger.add_entry(&store, foods(&["Candy", "Donuts"])).unwrap().value;

        let reloaded = loaded(&store);
        assert_eq!(reloaded.list(), &[first, second]);
    }

    #[test]
    fn test_entry_is_a_snapshot() {
        let store = MemoryStore::new();
        let mut ledger = loaded(&store);
        let mut apple = foods(&["Apple"]);
        let entry = ledger.add_entry(&store, apple.clone()).unwrap().value;

        apple[0].sugar_content = 99.0;
        assert!((ledger.get(&entry.id).unwrap().total_sugar - 10.0).abs() < f64::EPSILON);
        assert!((ledger.get(&entry.id).unwrap().foods[0].sugar_content - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_write_failure_keeps_entry_in_memory() {
        let store = MemoryStore::new();
        let mut ledger = loaded(&store);
        store.set_fail_writes(true);

        let m = ledger.add_entry(&store, foods(&["Apple"])).unwrap();
        assert!(!m.write.is_persisted());
        assert_eq!(ledger.list().len(), 1);
        assert!(store.raw(ENTRIES_KEY).is_none());
    }

    #[test]
    fn test_overflowing_total_is_rejected_and_history_survives() {
        let store = MemoryStore::new();
        let mut ledger = loaded(&store);
        let first = ledger.add_entry(&store, foods(&["Apple"])).unwrap().value;

        let big = FoodItem {
            sugar_content: 1e308,
            ..foods(&["Candy"]).remove(0)
        };
        let err = ledger.add_entry(&store, vec![big.clone(), big]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ledger.list(), std::slice::from_ref(&first));

        let reloaded = loaded(&store);
        assert_eq!(reloaded.list(), &[first]);
    }

    #[test]
    fn test_corrupt_entries_load_as_empty() {
        let store = MemoryStore::new();
        store.save(ENTRIES_KEY, "[{\"broken\":").unwrap();
        let ledger = loaded(&store);
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_sorted_by_date_desc_is_stable() {
        let at = |h: u32| Utc.with_ymd_and_hms(2024, 6, 15, h, 0, 0).unwrap();
        let entry = |id: &str, h: u32| SugarEntry {
            id: id.to_string(),
            date: at(h),
            foods: foods(&["Apple"]),
            total_sugar: 10.0,
        };
        let ledger = IntakeLedger {
            entries: vec![entry("a", 8), entry("b", 12), entry("c", 8), entry("d", 20)],
            loading: false,
        };

        let ids: Vec<&str> = ledger.sorted_by_date_desc().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);

        let order: Vec<&str> = ledger.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }
}
