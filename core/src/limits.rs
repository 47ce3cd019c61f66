use serde::Serialize;

use crate::error::{Mutation, Result, WriteOutcome};
use crate::models::{DailyLimit, FoodItem, SugarStatus};
use crate::store::{DAILY_LIMIT_KEY, Store};

/// Below this fraction of the limit a total is classified as [`SugarStatus::Under`].
pub const UNDER_FRACTION: f64 = 0.5;

/// Holds the current daily limit. Status labels are never stored; they are
/// computed against whatever limit is current when asked.
#[derive(Debug)]
pub struct LimitEngine {
    limit: DailyLimit,
    loading: bool,
}

impl Default for LimitEngine {
    fn default() -> Self {
        Self {
            limit: DailyLimit::default(),
            loading: true,
        }
    }
}

impl LimitEngine {
    pub fn load(&mut self, store: &dyn Store) {
        self.limit = match store.load(DAILY_LIMIT_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(value = %raw, error = %err, "ignoring stored daily limit");
                DailyLimit::default()
            }),
            Ok(None) => DailyLimit::default(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load daily limit; using default");
                DailyLimit::default()
            }
        };
        self.loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn get_limit(&self) -> DailyLimit {
        self.limit
    }

    pub fn set_limit(&mut self, store: &dyn Store, grams: f64) -> Result<Mutation<DailyLimit>> {
        let limit = DailyLimit::new(grams)?;
        self.limit = limit;
        tracing::debug!(%limit, "daily limit changed");
        let write = WriteOutcome::from_save(DAILY_LIMIT_KEY, store.save(DAILY_LIMIT_KEY, &limit.to_string()));
        Ok(Mutation::new(limit, write))
    }

    /// The advisory warning for adding `food` on top of `current_total`, if any.
    #[must_use]
    pub fn warning_for(&self, current_total: f64, food: &FoodItem) -> Option<LimitWarning> {
        limit_warning(current_total, food, self.limit)
    }

    #[must_use]
    pub fn gauge(&self, total: f64) -> Gauge {
        Gauge::new(total, self.limit)
    }
}

#[must_use]
pub fn total(foods: &[FoodItem]) -> f64 {
    foods.iter().map(|f| f.sugar_content).sum()
}

/// Share of the limit consumed, clamped to `0..=100`.
#[must_use]
pub fn percentage(total: f64, limit: DailyLimit) -> f64 {
    (total / limit.grams() * 100.0).clamp(0.0, 100.0)
}

#[must_use]
pub fn classify(total: f64, limit: DailyLimit) -> SugarStatus {
    let limit = limit.grams();
    if total > limit {
        SugarStatus::Over
    } else if total < limit * UNDER_FRACTION {
        SugarStatus::Under
    } else {
        SugarStatus::Good
    }
}

#[must_use]
pub fn would_exceed(current_total: f64, candidate_sugar: f64, limit: DailyLimit) -> bool {
    current_total + candidate_sugar > limit.grams()
}

/// Raised when an unhealthy food would push a running total past the limit.
/// Healthy foods never warn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitWarning {
    pub food_name: String,
    pub current_total: f64,
    pub projected_total: f64,
    pub limit: DailyLimit,
}

impl std::fmt::Display for LimitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Adding {} ({:.1}g -> {:.1}g) would exceed your daily sugar limit of {}g. Consider a healthier alternative.",
            self.food_name, self.current_total, self.projected_total, self.limit
        )
    }
}

#[must_use]
pub fn limit_warning(current_total: f64, food: &FoodItem, limit: DailyLimit) -> Option<LimitWarning> {
    if food.is_healthy || !would_exceed(current_total, food.sugar_content, limit) {
        return None;
    }
    Some(LimitWarning {
        food_name: food.name.clone(),
        current_total,
        projected_total: current_total + food.sugar_content,
        limit,
    })
}

/// A total rendered against the current limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gauge {
    pub total: f64,
    pub limit: DailyLimit,
    pub percentage: f64,
    pub status: SugarStatus,
}

impl Gauge {
    #[must_use]
    pub fn new(total: f64, limit: DailyLimit) -> Self {
        Self {
            total,
            limit,
            percentage: percentage(total, limit),
            status: classify(total, limit),
        }
    }
}
