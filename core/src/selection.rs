use serde::Serialize;

use crate::limits::{LimitWarning, limit_warning, total};
use crate::models::{DailyLimit, FoodItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    Empty,
    Composing,
}

/// Foods picked for an entry or a plan that has not been submitted yet.
/// Duplicates are allowed and order is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    foods: Vec<FoodItem>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        if self.foods.is_empty() {
            SelectionState::Empty
        } else {
            SelectionState::Composing
        }
    }

    #[must_use]
    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        total(&self.foods)
    }

    /// Advisory check before [`Selection::add`]. The caller decides whether to
    /// add anyway.
    #[must_use]
    pub fn check(&self, food: &FoodItem, limit: DailyLimit) -> Option<LimitWarning> {
        limit_warning(self.total(), food, limit)
    }

    pub fn add(&mut self, food: FoodItem) {
        self.foods.push(food);
    }

    pub fn remove(&mut self, index: usize) -> Option<FoodItem> {
        (index < self.foods.len()).then(|| self.foods.remove(index))
    }

    /// Hand the foods over for submission, leaving the selection empty.
    pub fn take(&mut self) -> Vec<FoodItem> {
        std::mem::take(&mut self.foods)
    }

    /// Put foods back after a submission was rejected.
    pub(crate) fn restore(&mut self, foods: Vec<FoodItem>) {
        self.foods = foods;
    }
}

impl FromIterator<FoodItem> for Selection {
    fn from_iter<I: IntoIterator<Item = FoodItem>>(iter: I) -> Self {
        Self {
            foods: iter.into_iter().collect(),
        }
    }
}
