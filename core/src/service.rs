use std::path::Path;

use serde::Serialize;

use crate::catalog::FoodCatalog;
use crate::db::Database;
use crate::error::{Mutation, Result, SugarError};
use crate::ledger::IntakeLedger;
use crate::limits::{Gauge, LimitEngine, LimitWarning};
use crate::models::{DailyLimit, FoodItem, MealPlan, NewFoodItem, SugarEntry, SugarStatus, User};
use crate::plans::MealPlans;
use crate::selection::Selection;
use crate::session::Session;
use crate::store::Store;

/// An entry paired with its status under the limit in force right now.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: SugarEntry,
    pub status: SugarStatus,
    pub percentage: f64,
}

/// Owns the store and every component built on it. This is the one object a
/// front end holds on to.
pub struct SugarService {
    store: Box<dyn Store>,
    catalog: FoodCatalog,
    ledger: IntakeLedger,
    plans: MealPlans,
    limits: LimitEngine,
    session: Session,
}

impl SugarService {
    /// Wrap `store` without reading it yet; every component reports loading
    /// until [`SugarService::load`] runs.
    pub fn new(store: Box<dyn Store>) -> Self {
        Self {
            store,
            catalog: FoodCatalog::default(),
            ledger: IntakeLedger::default(),
            plans: MealPlans::default(),
            limits: LimitEngine::default(),
            session: Session::default(),
        }
    }

    pub fn with_store(store: Box<dyn Store>) -> Self {
        let mut svc = Self::new(store);
        svc.load();
        svc
    }

    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::with_store(Box::new(db)))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_store(Box::new(db)))
    }

    /// Read every collection from the store. Missing or unreadable keys fall
    /// back to defaults, so this never fails.
    pub fn load(&mut self) {
        let store = self.store.as_ref();
        self.session.load(store);
        self.limits.load(store);
        self.catalog.load(store);
        self.ledger.load(store);
        self.plans.load(store);
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.catalog.is_loading()
            || self.ledger.is_loading()
            || self.plans.is_loading()
            || self.limits.is_loading()
            || self.session.is_loading()
    }

    #[must_use]
    pub fn catalog(&self) -> &FoodCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn ledger(&self) -> &IntakeLedger {
        &self.ledger
    }

    #[must_use]
    pub fn plans(&self) -> &MealPlans {
        &self.plans
    }

    #[must_use]
    pub fn limits(&self) -> &LimitEngine {
        &self.limits
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn daily_limit(&self) -> DailyLimit {
        self.limits.get_limit()
    }

    // --- Catalog ---

    pub fn add_food(&mut self, candidate: NewFoodItem) -> Result<Mutation<FoodItem>> {
        self.catalog.add(self.store.as_ref(), candidate)
    }

    /// Look up catalog foods by id, keeping the order (and repeats) of `ids`.
    pub fn foods_by_ids(&self, ids: &[String]) -> Result<Vec<FoodItem>> {
        ids.iter()
            .map(|id| {
                self.catalog
                    .get(id)
                    .cloned()
                    .ok_or_else(|| SugarError::validation(format!("Food with id {id} not found")))
            })
            .collect()
    }

    // --- Ledger ---

    pub fn add_entry(&mut self, foods: Vec<FoodItem>) -> Result<Mutation<SugarEntry>> {
        self.ledger.add_entry(self.store.as_ref(), foods)
    }

    /// Submit the selection as today's intake. The selection is emptied once the
    /// entry exists, even if writing it back failed; on a validation error it is
    /// left as it was.
    pub fn submit_entry(&mut self, selection: &mut Selection) -> Result<Mutation<SugarEntry>> {
        let foods = selection.take();
        match self.ledger.add_entry(self.store.as_ref(), foods.clone()) {
            Ok(m) => Ok(m),
            Err(err) => {
                selection.restore(foods);
                Err(err)
            }
        }
    }

    /// Newest entries first, each classified against the current limit.
    #[must_use]
    pub fn history(&self) -> Vec<EntryView> {
        self.ledger
            .sorted_by_date_desc()
            .into_iter()
            .map(|e| self.entry_view(e))
            .collect()
    }

    #[must_use]
    pub fn entry_view(&self, entry: &SugarEntry) -> EntryView {
        let gauge = self.limits.gauge(entry.total_sugar);
        EntryView {
            entry: entry.clone(),
            status: gauge.status,
            percentage: gauge.percentage,
        }
    }

    // --- Meal plans ---

    pub fn add_plan(&mut self, name: &str, foods: Vec<FoodItem>) -> Result<Mutation<MealPlan>> {
        self.plans.add_plan(self.store.as_ref(), name, foods)
    }

    /// Same contract as [`SugarService::submit_entry`], for a named plan.
    pub fn save_plan(&mut self, name: &str, selection: &mut Selection) -> Result<Mutation<MealPlan>> {
        let foods = selection.take();
        match self.plans.add_plan(self.store.as_ref(), name, foods.clone()) {
            Ok(m) => Ok(m),
            Err(err) => {
                selection.restore(foods);
                Err(err)
            }
        }
    }

    // --- Limit ---

    pub fn set_limit(&mut self, grams: f64) -> Result<Mutation<DailyLimit>> {
        self.limits.set_limit(self.store.as_ref(), grams)
    }

    #[must_use]
    pub fn gauge(&self, total: f64) -> Gauge {
        self.limits.gauge(total)
    }

    #[must_use]
    pub fn check_addition(&self, current_total: f64, food: &FoodItem) -> Option<LimitWarning> {
        self.limits.warning_for(current_total, food)
    }

    // --- Session ---

    pub fn login(&mut self, email: &str, password: &str) -> Result<Mutation<User>> {
        self.session.login(self.store.as_ref(), email, password)
    }

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<Mutation<User>> {
        self.session
            .register(self.store.as_ref(), username, email, password)
    }

    pub fn logout(&mut self) -> Mutation<Option<User>> {
        self.session.logout(self.store.as_ref())
    }
}
