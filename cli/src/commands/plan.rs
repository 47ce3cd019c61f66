use anyhow::Result;
use serde::Serialize;
use std::process;

use sugarwise_core::SugarService;
use sugarwise_core::limits::LimitWarning;
use sugarwise_core::models::MealPlan;

use super::{LimitCheck, compose_selection};
use super::helpers::{food_names, print_plan_table, report_write, require_session};

pub(crate) fn cmd_plan_list(svc: &SugarService, json: bool) -> Result<()> {
    let plans = svc.plans().list();

    if json {
        println!("{}", serde_json::to_string_pretty(plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        eprintln!("No meal plans yet. Use `sugarwise plan create <name> <food>...` to save one.");
        process::exit(2);
    }

    print_plan_table(plans);
    Ok(())
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    #[serde(flatten)]
    plan: &'a MealPlan,
    warnings: &'a [LimitWarning],
}

/// Save a named plan. Nothing is logged to the ledger. Foods that push the
/// plan past the daily limit are kept and reported.
pub(crate) fn cmd_plan_create(
    svc: &mut SugarService,
    name: &str,
    foods: &[String],
    custom: &[String],
    force: bool,
    json: bool,
) -> Result<()> {
    require_session(svc)?;
    let check = if force || json {
        LimitCheck::Collect
    } else {
        LimitCheck::Ask
    };
    let (mut selection, warnings) = compose_selection(svc, foods, custom, check)?;

    let mutation = svc.save_plan(name, &mut selection)?;
    report_write(&mutation);
    let plan = mutation.value;

    if json {
        let output = PlanOutput {
            plan: &plan,
            warnings: &warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if check == LimitCheck::Collect {
            for warning in &warnings {
                eprintln!("Warning: {warning}");
            }
        }
        let name = &plan.name;
        let names = food_names(&plan.foods);
        let total = plan.total_sugar;
        println!("Saved meal plan '{name}': {names} ({total:.1}g sugar)");
    }
    Ok(())
}
