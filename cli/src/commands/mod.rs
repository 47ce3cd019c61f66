mod food;
mod helpers;
mod history;
mod limit;
mod log;
mod plan;
mod session;

use anyhow::{Result, bail};

use sugarwise_core::SugarService;
use sugarwise_core::limits::LimitWarning;
use sugarwise_core::models::FoodItem;
use sugarwise_core::selection::Selection;

use helpers::{confirm, parse_custom_food, print_food_table, prompt_choice};

pub(crate) use food::{cmd_food_add, cmd_food_list};
pub(crate) use history::{cmd_history, cmd_show};
pub(crate) use limit::{cmd_limit_set, cmd_limit_show};
pub(crate) use log::{cmd_check, cmd_log};
pub(crate) use plan::{cmd_plan_create, cmd_plan_list};
pub(crate) use session::{cmd_login, cmd_logout, cmd_register, cmd_whoami};

/// Resolve a food name (or catalog id) against the catalog. An exact name
/// wins; otherwise a single substring match is taken and several prompt.
pub(super) fn resolve_food(svc: &SugarService, query: &str) -> Result<FoodItem> {
    let catalog = svc.catalog();
    if let Some(food) = catalog.get(query.trim()) {
        return Ok(food.clone());
    }
    if let Some(food) = catalog
        .list()
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(query.trim()))
    {
        return Ok(food.clone());
    }

    let matches = catalog.search(query);
    match matches.as_slice() {
        [] => bail!("No food found for '{query}'. Add it with `sugarwise food add`"),
        [only] => Ok((*only).clone()),
        _ => {
            print_food_table(&matches);
            let idx = prompt_choice(matches.len())?;
            Ok(matches[idx].clone())
        }
    }
}

/// How [`compose_selection`] treats the advisory limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LimitCheck {
    /// Add every food without checking.
    Off,
    /// Add every food and return the warnings raised along the way.
    Collect,
    /// Show each warning and ask. Only an explicit "no" drops the food.
    Ask,
}

/// Resolve the requested foods and build a selection from them in order.
/// Warnings never drop a food on their own.
pub(super) fn compose_selection(
    svc: &SugarService,
    foods: &[String],
    custom: &[String],
    check: LimitCheck,
) -> Result<(Selection, Vec<LimitWarning>)> {
    let mut picked = Vec::with_capacity(foods.len() + custom.len());
    for query in foods {
        picked.push(resolve_food(svc, query)?);
    }
    for arg in custom {
        picked.push(parse_custom_food(arg)?);
    }

    let limit = svc.daily_limit();
    let mut selection = Selection::new();
    let mut warnings = Vec::new();
    for food in picked {
        if check != LimitCheck::Off {
            if let Some(warning) = selection.check(&food, limit) {
                if check == LimitCheck::Ask {
                    eprintln!("Warning: {warning}");
                    if !confirm("Add it anyway?", true)? {
                        eprintln!("Skipped {}", food.name);
                        continue;
                    }
                }
                warnings.push(warning);
            }
        }
        selection.add(food);
    }
    Ok((selection, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> SugarService {
        let mut svc = SugarService::open_in_memory().unwrap();
        let _ = svc.login("sam@example.com", "pw").unwrap();
        svc
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_resolve_food_by_id_name_and_substring() {
        let svc = logged_in();
        assert_eq!(resolve_food(&svc, "2").unwrap().name, "Banana");
        assert_eq!(resolve_food(&svc, "chocolate bar").unwrap().name, "Chocolate Bar");
        assert_eq!(resolve_food(&svc, "soda").unwrap().name, "Soda (330ml)");
        assert!(resolve_food(&svc, "pizza").is_err());
    }

    #[test]
    fn test_compose_without_check_keeps_every_food() {
        let svc = logged_in();
        let (selection, warnings) =
            compose_selection(&svc, &names(&["Apple", "Banana", "Soda"]), &[], LimitCheck::Off).unwrap();
        assert_eq!(selection.len(), 3);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_compose_collects_warnings_without_dropping() {
        let svc = logged_in();
        let custom = vec!["Fudge=30".to_string()];
        let (selection, warnings) = compose_selection(
            &svc,
            &names(&["Apple", "Banana", "Soda"]),
            &custom,
            LimitCheck::Collect,
        )
        .unwrap();
        let picked: Vec<&str> = selection.foods().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(picked, vec!["Apple", "Banana", "Soda (330ml)", "Fudge"]);
        let warned: Vec<&str> = warnings.iter().map(|w| w.food_name.as_str()).collect();
        assert_eq!(warned, vec!["Soda (330ml)", "Fudge"]);
    }

    #[test]
    fn test_log_json_records_every_requested_food() {
        let mut svc = logged_in();
        cmd_log(&mut svc, &names(&["Apple", "Banana", "Soda"]), &[], true).unwrap();

        let entries = svc.ledger().list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].foods.len(), 3);
        assert!((entries[0].total_sugar - 59.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plan_json_keeps_warned_food() {
        let mut svc = logged_in();
        cmd_plan_create(&mut svc, "Treats", &names(&["Apple", "Banana", "Soda"]), &[], false, true)
            .unwrap();

        let plans = svc.plans().list();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].foods.len(), 3);
        assert!(svc.ledger().list().is_empty());
    }
}
