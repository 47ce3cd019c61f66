use anyhow::Result;

use sugarwise_core::SugarService;

use super::helpers::{report_write, require_session};

pub(crate) fn cmd_limit_show(svc: &SugarService, json: bool) -> Result<()> {
    let limit = svc.daily_limit();

    if json {
        println!("{}", serde_json::json!({ "dailyLimit": limit }));
    } else {
        println!("Daily sugar limit: {limit}g");
    }
    Ok(())
}

pub(crate) fn cmd_limit_set(svc: &mut SugarService, grams: f64, json: bool) -> Result<()> {
    require_session(svc)?;
    let mutation = svc.set_limit(grams)?;
    report_write(&mutation);
    let limit = mutation.value;

    if json {
        println!("{}", serde_json::json!({ "dailyLimit": limit }));
    } else {
        println!("Daily sugar limit set to {limit}g");
    }
    Ok(())
}
