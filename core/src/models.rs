use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SugarError};

/// Foods at or below this many grams of sugar count as healthy when the flag is
/// derived instead of supplied.
pub const HEALTHY_SUGAR_MAX_G: f64 = 5.0;

pub const DEFAULT_DAILY_LIMIT_G: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub sugar_content: f64,
    pub is_healthy: bool,
}

impl FoodItem {
    /// Build an ad-hoc food typed in while composing a selection. It never enters
    /// the catalog, and its healthiness is derived from the sugar value.
    pub fn inline(name: &str, sugar_text: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SugarError::validation("Food name must not be empty"));
        }
        let sugar_content = parse_sugar_content(sugar_text)?;
        Ok(Self {
            id: new_id(),
            name: name.to_string(),
            sugar_content,
            is_healthy: sugar_content <= HEALTHY_SUGAR_MAX_G,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodItem {
    pub name: String,
    pub sugar_content: f64,
    pub is_healthy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SugarEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub foods: Vec<FoodItem>,
    pub total_sugar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    pub name: String,
    pub foods: Vec<FoodItem>,
    pub total_sugar: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Three-band status of a sugar total relative to the daily limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SugarStatus {
    Under,
    Good,
    Over,
}

impl SugarStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Under => "under",
            Self::Good => "good",
            Self::Over => "over",
        }
    }
}

impl std::fmt::Display for SugarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The configured daily sugar threshold in grams. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DailyLimit(f64);

impl DailyLimit {
    pub fn new(grams: f64) -> Result<Self> {
        if !grams.is_finite() || grams <= 0.0 {
            return Err(SugarError::validation(
                "Please enter a valid number greater than 0",
            ));
        }
        Ok(Self(grams))
    }

    #[must_use]
    pub fn grams(self) -> f64 {
        self.0
    }
}

impl Default for DailyLimit {
    fn default() -> Self {
        Self(DEFAULT_DAILY_LIMIT_G)
    }
}

impl std::fmt::Display for DailyLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DailyLimit {
    type Err = SugarError;

    fn from_str(s: &str) -> Result<Self> {
        let grams: f64 = s
            .trim()
            .parse()
            .map_err(|_| SugarError::validation(format!("Invalid daily limit '{s}'")))?;
        Self::new(grams)
    }
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parse a user-typed sugar amount such as `"12"`, `"12.5"` or `"12g"`.
pub fn parse_sugar_content(text: &str) -> Result<f64> {
    let trimmed = text.trim().trim_end_matches('g').trim();
    if trimmed.is_empty() {
        return Err(SugarError::validation("Please fill in all fields"));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| SugarError::validation("Sugar content must be a number"))?;
    validate_sugar_content(value)?;
    Ok(value)
}

pub fn validate_sugar_content(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SugarError::validation("Sugar content must be a number"));
    }
    if value < 0.0 {
        return Err(SugarError::validation("Sugar content must not be negative"));
    }
    Ok(())
}

pub fn validate_new_food(food: &NewFoodItem) -> Result<()> {
    if food.name.trim().is_empty() {
        return Err(SugarError::validation("Food name must not be empty"));
    }
    validate_sugar_content(food.sugar_content)
}

pub fn validate_foods(foods: &[FoodItem]) -> Result<()> {
    if foods.is_empty() {
        return Err(SugarError::validation("Please add at least one food item"));
    }
    for food in foods {
        validate_sugar_content(food.sugar_content)?;
    }
    let total: f64 = foods.iter().map(|f| f.sugar_content).sum();
    if !total.is_finite() {
        return Err(SugarError::validation("Total sugar content is too large"));
    }
    Ok(())
}

/// Trim a meal plan name, rejecting one that is blank.
pub fn validate_plan_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SugarError::validation(
            "Please enter a name for your meal plan",
        ));
    }
    Ok(trimmed.to_string())
}

/// The catalog installed on first run.
#[must_use]
pub fn seed_catalog() -> Vec<FoodItem> {
    const SEED: &[(&str, &str, f64, bool)] = &[
        ("1", "Apple", 10.0, true),
        ("2", "Banana", 14.0, true),
        ("3", "Orange", 9.0, true),
        ("4", "Chocolate Bar", 24.0, false),
        ("5", "Soda (330ml)", 35.0, false),
        ("6", "Greek Yogurt", 5.0, true),
        ("7", "Ice Cream", 28.0, false),
        ("8", "Carrot", 3.0, true),
        ("9", "Candy", 20.0, false),
        ("10", "Donuts", 25.0, false),
        ("11", "Whole Grain Bread", 2.0, true),
        ("12", "Sweetened iced tea", 28.0, false),
        ("13", "Chocolate bars", 38.0, false),
        ("14", "Cupcakes", 50.0, false),
    ];
    SEED.iter()
        .map(|&(id, name, sugar_content, is_healthy)| FoodItem {
            id: id.to_string(),
            name: name.to_string(),
            sugar_content,
            is_healthy,
        })
        .collect()
}
