use anyhow::{Result, bail};

use sugarwise_core::SugarService;

use super::helpers::{food_names, report_write, require_session};
use super::{LimitCheck, compose_selection, resolve_food};

/// Compose today's intake from catalog names and inline foods, then submit it.
/// The daily limit is not consulted here; `check` and `plan create` do that.
pub(crate) fn cmd_log(
    svc: &mut SugarService,
    foods: &[String],
    custom: &[String],
    json: bool,
) -> Result<()> {
    require_session(svc)?;
    let (mut selection, _) = compose_selection(svc, foods, custom, LimitCheck::Off)?;

    let mutation = svc.submit_entry(&mut selection)?;
    report_write(&mutation);
    let entry = mutation.value;

    if json {
        let view = svc.entry_view(&entry);
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let gauge = svc.gauge(entry.total_sugar);
    let names = food_names(&entry.foods);
    let total = entry.total_sugar;
    let limit = gauge.limit;
    let pct = gauge.percentage;
    let status = gauge.status;
    println!("Logged: {names}");
    println!("  Total: {total:.1}g of {limit}g ({pct:.0}%), {status}");
    Ok(())
}

/// Dry run of the advisory check: would adding `food` on top of
/// `current_total` cross the limit?
pub(crate) fn cmd_check(svc: &SugarService, current_total: f64, food: &str, json: bool) -> Result<()> {
    if !current_total.is_finite() || current_total < 0.0 {
        bail!("Current total must be a non-negative number");
    }
    let food = resolve_food(svc, food)?;
    let warning = svc.check_addition(current_total, &food);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "food": food,
                "warning": warning,
                "message": warning.as_ref().map(ToString::to_string),
            }))?
        );
    } else if let Some(warning) = warning {
        println!("Warning: {warning}");
    } else {
        let name = &food.name;
        println!("OK: {name} fits within your daily limit");
    }
    Ok(())
}
