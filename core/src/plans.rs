use chrono::Utc;

use crate::error::{Mutation, Result, WriteOutcome};
use crate::limits::total;
use crate::models::{FoodItem, MealPlan, new_id, validate_foods, validate_plan_name};
use crate::store::{MEAL_PLANS_KEY, Store, load_json, save_json};

/// Saved meal plans. Independent of the ledger: saving a plan logs nothing.
#[derive(Debug)]
pub struct MealPlans {
    plans: Vec<MealPlan>,
    loading: bool,
}

impl Default for MealPlans {
    fn default() -> Self {
        Self {
            plans: Vec::new(),
            loading: true,
        }
    }
}

impl MealPlans {
    pub fn load(&mut self, store: &dyn Store) {
        self.plans = match load_json(store, MEAL_PLANS_KEY) {
            Ok(plans) => plans.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load meal plans; starting empty");
                Vec::new()
            }
        };
        self.loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn list(&self) -> &[MealPlan] {
        &self.plans
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MealPlan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn add_plan(
        &mut self,
        store: &dyn Store,
        name: &str,
        foods: Vec<FoodItem>,
    ) -> Result<Mutation<MealPlan>> {
        let name = validate_plan_name(name)?;
        validate_foods(&foods)?;
        let plan = MealPlan {
            id: new_id(),
            name,
            total_sugar: total(&foods),
            foods,
            date: Utc::now(),
        };
        self.plans.push(plan.clone());
        tracing::debug!(id = %plan.id, name = %plan.name, total = plan.total_sugar, "saved meal plan");

        let write = WriteOutcome::from_save(MEAL_PLANS_KEY, save_json(store, MEAL_PLANS_KEY, &self.plans));
        Ok(Mutation::new(plan, write))
    }
}
